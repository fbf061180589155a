//! Durable intake slots: the draft (form data + step) and the session.
//!
//! Both live in the settings table. The draft slot is versioned; anything
//! that does not match the current format is discarded rather than migrated.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::draft::OnboardingDraft;
use super::model::{settings_keys, ProfileId};
use super::state::IntakeStep;
use crate::error::DatabaseError;
use crate::store::SettingsStore;

/// Current draft slot format.
pub const DRAFT_FORMAT_VERSION: u32 = 1;

/// What the draft slot holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftSnapshot {
    pub version: u32,
    /// 1-based step ordinal.
    pub step: u8,
    #[serde(default)]
    pub form_data: OnboardingDraft,
}

impl DraftSnapshot {
    pub fn new(step: IntakeStep, form_data: OnboardingDraft) -> Self {
        Self {
            version: DRAFT_FORMAT_VERSION,
            step: step.ordinal(),
            form_data,
        }
    }

    /// Decode a stored value, rejecting unknown versions and out-of-range
    /// steps. The step is clamped to the furthest step the draft reaches.
    fn decode(value: serde_json::Value) -> Result<(IntakeStep, OnboardingDraft), String> {
        let snapshot: DraftSnapshot =
            serde_json::from_value(value).map_err(|e| format!("unreadable draft: {e}"))?;
        if snapshot.version != DRAFT_FORMAT_VERSION {
            return Err(format!("unsupported draft version {}", snapshot.version));
        }
        let step = IntakeStep::from_ordinal(snapshot.step)
            .ok_or_else(|| format!("step {} out of range", snapshot.step))?;
        let step = step.min(snapshot.form_data.furthest_reachable());
        Ok((step, snapshot.form_data))
    }
}

/// The draft slot.
#[derive(Clone)]
pub struct DraftStore {
    settings: Arc<dyn SettingsStore>,
    user_id: String,
}

impl DraftStore {
    pub fn new(settings: Arc<dyn SettingsStore>, user_id: impl Into<String>) -> Self {
        Self {
            settings,
            user_id: user_id.into(),
        }
    }

    /// Load the persisted draft, or an empty draft at step 1 if there is
    /// none or it cannot be used.
    pub async fn load(&self) -> Result<(IntakeStep, OnboardingDraft), DatabaseError> {
        let stored = self
            .settings
            .get_setting(&self.user_id, settings_keys::ONBOARDING_DRAFT)
            .await?;

        let Some(value) = stored else {
            return Ok((IntakeStep::default(), OnboardingDraft::default()));
        };

        match DraftSnapshot::decode(value) {
            Ok(restored) => Ok(restored),
            Err(reason) => {
                tracing::warn!(user_id = %self.user_id, %reason, "Discarding stored onboarding draft");
                Ok((IntakeStep::default(), OnboardingDraft::default()))
            }
        }
    }

    pub async fn save(&self, step: IntakeStep, draft: &OnboardingDraft) -> Result<(), DatabaseError> {
        let snapshot = DraftSnapshot::new(step, draft.clone());
        let value = serde_json::to_value(&snapshot)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;
        self.settings
            .set_setting(&self.user_id, settings_keys::ONBOARDING_DRAFT, &value)
            .await
    }

    pub async fn clear(&self) -> Result<(), DatabaseError> {
        self.settings
            .delete_setting(&self.user_id, settings_keys::ONBOARDING_DRAFT)
            .await?;
        Ok(())
    }
}

/// The session slot: identifier of the most recently created profile.
#[derive(Clone)]
pub struct SessionStore {
    settings: Arc<dyn SettingsStore>,
    user_id: String,
}

impl SessionStore {
    pub fn new(settings: Arc<dyn SettingsStore>, user_id: impl Into<String>) -> Self {
        Self {
            settings,
            user_id: user_id.into(),
        }
    }

    /// The stored profile id. An unreadable value is reported as absent.
    pub async fn get(&self) -> Result<Option<ProfileId>, DatabaseError> {
        let stored = self
            .settings
            .get_setting(&self.user_id, settings_keys::SESSION)
            .await?;

        Ok(stored.and_then(|value| match serde_json::from_value::<ProfileId>(value) {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(user_id = %self.user_id, error = %e, "Ignoring unreadable session id");
                None
            }
        }))
    }

    pub async fn set(&self, id: ProfileId) -> Result<(), DatabaseError> {
        let value =
            serde_json::to_value(id).map_err(|e| DatabaseError::Serialization(e.to_string()))?;
        self.settings
            .set_setting(&self.user_id, settings_keys::SESSION, &value)
            .await
    }

    pub async fn clear(&self) -> Result<(), DatabaseError> {
        self.settings
            .delete_setting(&self.user_id, settings_keys::SESSION)
            .await?;
        Ok(())
    }
}
