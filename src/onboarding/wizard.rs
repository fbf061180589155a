//! WizardController: step navigation over the persisted draft.
//!
//! Every mutation is written to the draft slot before it is applied in
//! memory, so a failed write leaves the controller exactly as it was.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::draft::{OnboardingDraft, StepFields};
use super::model::Profile;
use super::schema::{self, FieldErrors};
use super::state::{IntakeStep, TOTAL_STEPS};
use super::storage::DraftStore;
use crate::error::{DatabaseError, IntakeError};

/// What the presentation layer needs to render the active step.
#[derive(Debug, Clone, Serialize)]
pub struct StepView {
    pub step: IntakeStep,
    pub ordinal: u8,
    pub total_steps: u8,
    pub progress_percent: u8,
    /// Current values for the step: previous answers or form defaults.
    pub values: StepFields,
    /// Errors from the last rejected attempt to leave this step.
    pub errors: FieldErrors,
    pub submitting: bool,
    pub can_go_back: bool,
}

/// Drives the four intake steps and owns the in-memory copy of the draft.
pub struct WizardController {
    drafts: DraftStore,
    step: IntakeStep,
    draft: OnboardingDraft,
    errors: FieldErrors,
    submitting: bool,
    /// Inserted by an earlier submit whose session write failed.
    unrecorded: Option<Profile>,
}

impl WizardController {
    /// Restore the wizard from the draft slot (or start fresh).
    pub async fn load(drafts: DraftStore) -> Result<Self, DatabaseError> {
        let (step, draft) = drafts.load().await?;
        debug!(%step, "Onboarding wizard loaded");
        Ok(Self {
            drafts,
            step,
            draft,
            errors: FieldErrors::new(),
            submitting: false,
            unrecorded: None,
        })
    }

    pub fn current_step(&self) -> IntakeStep {
        self.step
    }

    /// The answers merged so far.
    pub fn aggregate(&self) -> &OnboardingDraft {
        &self.draft
    }

    pub fn field_errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn view(&self) -> StepView {
        StepView {
            step: self.step,
            ordinal: self.step.ordinal(),
            total_steps: TOTAL_STEPS,
            progress_percent: self.step.progress_percent(),
            values: StepFields::seeded(self.step, &self.draft),
            errors: self.errors.clone(),
            submitting: self.submitting,
            can_go_back: self.step.previous().is_some() && !self.submitting,
        }
    }

    /// Validate the active step's candidate values and, if they pass, merge
    /// them into the draft and move forward one step.
    ///
    /// On the final step this is a no-op; completion goes through the
    /// profile submitter instead.
    pub async fn next(&mut self, candidate: StepFields) -> Result<IntakeStep, IntakeError> {
        if self.submitting {
            return Err(IntakeError::SubmissionInFlight);
        }
        if candidate.step() != self.step {
            return Err(IntakeError::StepMismatch {
                expected: self.step,
                got: candidate.step(),
            });
        }
        let Some(next) = self.step.next() else {
            debug!(step = %self.step, "next() on final step ignored");
            return Ok(self.step);
        };

        if let Err(errors) = schema::validate(self.step, &candidate) {
            debug!(step = %self.step, failed = errors.len(), "Step validation failed");
            self.errors = errors.clone();
            return Err(IntakeError::Validation(errors));
        }

        let merged = self.draft.merged(&candidate);
        self.drafts.save(next, &merged).await?;

        self.draft = merged;
        self.step = next;
        self.errors = FieldErrors::new();
        info!(step = %next, "Onboarding advanced");
        Ok(next)
    }

    /// Move back one step without validating or touching the draft.
    pub async fn previous(&mut self) -> Result<IntakeStep, IntakeError> {
        if self.submitting {
            return Err(IntakeError::SubmissionInFlight);
        }
        let Some(previous) = self.step.previous() else {
            return Ok(self.step);
        };

        self.drafts.save(previous, &self.draft).await?;

        self.step = previous;
        self.errors = FieldErrors::new();
        info!(step = %previous, "Onboarding went back");
        Ok(previous)
    }

    /// Empty the draft and return to step 1.
    ///
    /// The in-memory state is reset first. If the slot cannot be cleared,
    /// an empty draft is written over it instead; only if that also fails is
    /// the storage error returned.
    pub async fn reset(&mut self) -> Result<(), DatabaseError> {
        self.step = IntakeStep::default();
        self.draft = OnboardingDraft::default();
        self.errors = FieldErrors::new();
        self.unrecorded = None;
        if let Err(e) = self.drafts.clear().await {
            warn!(error = %e, "Clearing draft slot failed, overwriting with an empty draft");
            self.drafts.save(self.step, &self.draft).await?;
        }
        info!("Onboarding draft reset");
        Ok(())
    }

    pub(crate) fn record_errors(&mut self, errors: FieldErrors) {
        self.errors = errors;
    }

    pub(crate) fn set_submitting(&mut self, submitting: bool) {
        self.submitting = submitting;
    }

    pub(crate) fn take_unrecorded(&mut self) -> Option<Profile> {
        self.unrecorded.take()
    }

    pub(crate) fn set_unrecorded(&mut self, profile: Profile) {
        self.unrecorded = Some(profile);
    }
}
