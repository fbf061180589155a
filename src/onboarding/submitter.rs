//! ProfileSubmitter: turns the finished draft into a stored profile.
//!
//! The wizard lock is held only while preparing and while finalizing. The
//! record-store call runs in a spawned task with the lock released and the
//! wizard's `submitting` flag set, so navigation and a second submit are
//! refused rather than queued.

use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::draft::{FieldValue, OnboardingDraft, StepFields};
use super::gate::Redirect;
use super::model::{NewProfile, Profile, ProfileId};
use super::schema;
use super::state::IntakeStep;
use super::storage::SessionStore;
use super::wizard::WizardController;
use crate::error::{DatabaseError, SubmissionError};
use crate::store::ProfileStore;

/// A successful submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Submission {
    pub profile_id: ProfileId,
    pub redirect: Redirect,
}

pub struct ProfileSubmitter {
    profiles: Arc<dyn ProfileStore>,
    session: SessionStore,
}

impl ProfileSubmitter {
    pub fn new(profiles: Arc<dyn ProfileStore>, session: SessionStore) -> Self {
        Self { profiles, session }
    }

    /// Validate the final step's candidate values, coerce the whole draft and
    /// insert it.
    ///
    /// On success the session slot holds the new id and the wizard is reset.
    /// On any failure the draft, the session slot and the wizard step are
    /// left as they were. Once the insert is dispatched it runs to completion
    /// in its own task, even if the caller stops waiting.
    pub async fn submit(
        &self,
        wizard: &Arc<RwLock<WizardController>>,
        candidate: StepFields,
    ) -> Result<Submission, SubmissionError> {
        let (profile, already_stored) = {
            let mut w = wizard.write().await;
            if w.is_submitting() {
                return Err(SubmissionError::AlreadySubmitting);
            }

            let step = w.current_step();
            if !step.is_final() || candidate.step() != step {
                return Err(SubmissionError::NotOnFinalStep { step });
            }
            if let Err(errors) = schema::validate(step, &candidate) {
                w.record_errors(errors.clone());
                return Err(SubmissionError::Validation(errors));
            }

            let aggregate = w.aggregate().merged(&candidate);
            let profile = check_complete(&aggregate).and_then(|()| coerce(&aggregate));
            let profile = match profile {
                Ok(profile) => profile,
                Err(e) => {
                    error!(error = %e, "Draft passed step validation but cannot be submitted");
                    return Err(e);
                }
            };

            let already_stored = w.take_unrecorded().filter(|stored| stored.fields == profile);
            w.set_submitting(true);
            (profile, already_stored)
        };

        let task = tokio::spawn(complete_submission(
            Arc::clone(&self.profiles),
            self.session.clone(),
            Arc::clone(wizard),
            profile,
            already_stored,
        ));

        match task.await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "Submission task failed");
                wizard.write().await.set_submitting(false);
                Err(SubmissionError::Transport(DatabaseError::Query(format!(
                    "insert_profile: {e}"
                ))))
            }
        }
    }
}

/// Insert (unless an earlier attempt already did), record the session and
/// reset the wizard. Clears the `submitting` flag on every path.
async fn complete_submission(
    profiles: Arc<dyn ProfileStore>,
    session: SessionStore,
    wizard: Arc<RwLock<WizardController>>,
    profile: NewProfile,
    already_stored: Option<Profile>,
) -> Result<Submission, SubmissionError> {
    let inserted = match already_stored {
        Some(stored) => {
            info!(profile_id = %stored.id, "Reusing profile inserted by an earlier attempt");
            Ok(stored)
        }
        None => profiles.insert_profile(&profile).await,
    };

    let mut w = wizard.write().await;
    w.set_submitting(false);

    let stored = match inserted {
        Ok(stored) => stored,
        Err(e) => {
            warn!(error = %e, "Profile insert failed; draft kept for retry");
            return Err(SubmissionError::Transport(e));
        }
    };

    if let Err(e) = session.set(stored.id).await {
        error!(profile_id = %stored.id, error = %e, "Profile created but session not recorded");
        w.set_unrecorded(stored);
        return Err(SubmissionError::Session(e));
    }
    if let Err(e) = w.reset().await {
        warn!(profile_id = %stored.id, error = %e, "Profile created but draft slot not cleared");
    }

    info!(profile_id = %stored.id, "Profile created");
    Ok(Submission {
        profile_id: stored.id,
        redirect: Redirect::PostIntake,
    })
}

/// Every required field across all steps must carry a value.
pub fn check_complete(draft: &OnboardingDraft) -> Result<(), SubmissionError> {
    for step in IntakeStep::ALL {
        for field in schema::schema(step).required_fields() {
            let present = match draft.value(field) {
                Some(FieldValue::Text(text)) => !text.trim().is_empty(),
                Some(FieldValue::List(items)) => !items.is_empty(),
                None => false,
            };
            if !present {
                return Err(SubmissionError::MissingField { field });
            }
        }
    }
    Ok(())
}

/// Convert the string-typed draft into a typed profile.
pub fn coerce(draft: &OnboardingDraft) -> Result<NewProfile, SubmissionError> {
    Ok(NewProfile {
        name: required(&draft.name, "name")?.to_string(),
        age: optional(&draft.age, "age")?,
        sex: optional(&draft.sex, "sex")?,
        height_cm: optional(&draft.height_cm, "height_cm")?,
        weight_kg: optional_decimal(&draft.weight_kg, "weight_kg")?,

        fitness_goal: parse(required(&draft.fitness_goal, "fitness_goal")?, "fitness_goal")?,
        experience_level: parse(
            required(&draft.experience_level, "experience_level")?,
            "experience_level",
        )?,
        days_per_week: parse(required(&draft.days_per_week, "days_per_week")?, "days_per_week")?,
        session_duration: parse(
            required(&draft.session_duration, "session_duration")?,
            "session_duration",
        )?,
        equipment: parse_list(required_list(&draft.equipment, "equipment")?, "equipment")?,
        constraints: parse_list(optional_list(&draft.constraints), "constraints")?,
        workout_style: parse(required(&draft.workout_style, "workout_style")?, "workout_style")?,

        dietary_style: parse(required(&draft.dietary_style, "dietary_style")?, "dietary_style")?,
        allergens: parse_list(optional_list(&draft.allergens), "allergens")?,
        favorite_ingredients: required_list(&draft.favorite_ingredients, "favorite_ingredients")?
            .to_vec(),
        disliked_ingredients: optional_list(&draft.disliked_ingredients).to_vec(),
        meals_per_day: parse(required(&draft.meals_per_day, "meals_per_day")?, "meals_per_day")?,
        meal_prep_time: parse(required(&draft.meal_prep_time, "meal_prep_time")?, "meal_prep_time")?,
        cooking_tools: parse_list(
            required_list(&draft.cooking_tools, "cooking_tools")?,
            "cooking_tools",
        )?,
    })
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, SubmissionError> {
    match value.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(SubmissionError::MissingField { field }),
    }
}

fn required_list<'a>(
    value: &'a Option<Vec<String>>,
    field: &'static str,
) -> Result<&'a [String], SubmissionError> {
    match value.as_deref() {
        Some(items) if !items.is_empty() => Ok(items),
        _ => Err(SubmissionError::MissingField { field }),
    }
}

fn optional_list(value: &Option<Vec<String>>) -> &[String] {
    value.as_deref().unwrap_or_default()
}

fn parse<T>(raw: &str, field: &'static str) -> Result<T, SubmissionError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse().map_err(|e: T::Err| SubmissionError::Coercion {
        field,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Empty or absent maps to `None`.
fn optional<T>(value: &Option<String>, field: &'static str) -> Result<Option<T>, SubmissionError>
where
    T: FromStr,
    T::Err: Display,
{
    match value.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => parse(text, field).map(Some),
        _ => Ok(None),
    }
}

fn optional_decimal(
    value: &Option<String>,
    field: &'static str,
) -> Result<Option<f64>, SubmissionError> {
    let parsed: Option<f64> = optional(value, field)?;
    match parsed {
        Some(n) if !n.is_finite() || n < 0.0 => Err(SubmissionError::Coercion {
            field,
            value: n.to_string(),
            reason: "not a non-negative finite number".to_string(),
        }),
        other => Ok(other),
    }
}

fn parse_list<T>(items: &[String], field: &'static str) -> Result<Vec<T>, SubmissionError>
where
    T: FromStr,
    T::Err: Display,
{
    items.iter().map(|item| parse(item, field)).collect()
}
