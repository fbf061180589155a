//! Gate for views that depend on a finished intake.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::model::Profile;
use super::storage::SessionStore;
use crate::store::ProfileStore;

/// Abstract navigation signal issued by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Redirect {
    /// Onboarding is not done; send the user into the wizard.
    IntakeFlow,
    /// A profile was just created; leave the wizard.
    PostIntake,
}

/// Outcome of entering a dependent view.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileAccess {
    Ready(Profile),
    Redirect(Redirect),
}

pub struct ProfileGate {
    session: SessionStore,
    profiles: Arc<dyn ProfileStore>,
}

impl ProfileGate {
    pub fn new(session: SessionStore, profiles: Arc<dyn ProfileStore>) -> Self {
        Self { session, profiles }
    }

    /// Resolve the session's profile. Any failure along the way counts as
    /// onboarding not completed.
    pub async fn resolve(&self) -> ProfileAccess {
        let not_done = ProfileAccess::Redirect(Redirect::IntakeFlow);

        let id = match self.session.get().await {
            Ok(Some(id)) => id,
            Ok(None) => return not_done,
            Err(e) => {
                warn!(error = %e, "Session lookup failed");
                return not_done;
            }
        };

        match self.profiles.get_profile(id).await {
            Ok(Some(profile)) => ProfileAccess::Ready(profile),
            Ok(None) => {
                warn!(profile_id = %id, "Session points at a missing profile");
                not_done
            }
            Err(e) => {
                warn!(profile_id = %id, error = %e, "Profile lookup failed");
                not_done
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use uuid::Uuid;

    use super::*;
    use crate::error::DatabaseError;
    use crate::onboarding::fixtures;
    use crate::onboarding::model::{NewProfile, ProfileId, settings_keys};
    use crate::store::LibSqlBackend;

    struct BrokenProfiles;

    #[async_trait]
    impl ProfileStore for BrokenProfiles {
        async fn insert_profile(&self, _profile: &NewProfile) -> Result<Profile, DatabaseError> {
            Err(DatabaseError::Query("insert_profile: offline".to_string()))
        }

        async fn get_profile(&self, _id: ProfileId) -> Result<Option<Profile>, DatabaseError> {
            Err(DatabaseError::Query("get_profile: offline".to_string()))
        }
    }

    fn sample_profile() -> NewProfile {
        use crate::onboarding::model::*;
        NewProfile {
            name: "Alex".to_string(),
            age: None,
            sex: None,
            height_cm: None,
            weight_kg: None,
            fitness_goal: FitnessGoal::FatLoss,
            experience_level: ExperienceLevel::Beginner,
            days_per_week: 3,
            session_duration: 45,
            equipment: vec![Equipment::Dumbbells],
            constraints: vec![],
            workout_style: WorkoutStyle::Mixed,
            dietary_style: DietaryStyle::None,
            allergens: vec![],
            favorite_ingredients: vec!["chicken".to_string()],
            disliked_ingredients: vec![],
            meals_per_day: 3,
            meal_prep_time: 30,
            cooking_tools: vec![CookingTool::Stove],
        }
    }

    #[tokio::test]
    async fn no_session_redirects() {
        let backend = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        let gate = ProfileGate::new(SessionStore::new(backend.clone(), "default"), backend);
        assert_eq!(gate.resolve().await, ProfileAccess::Redirect(Redirect::IntakeFlow));
    }

    #[tokio::test]
    async fn stored_profile_is_ready() {
        let backend = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        let session = SessionStore::new(backend.clone(), "default");
        let profile = backend.insert_profile(&sample_profile()).await.unwrap();
        session.set(profile.id).await.unwrap();

        let gate = ProfileGate::new(session, backend);
        assert_eq!(gate.resolve().await, ProfileAccess::Ready(profile));
    }

    #[tokio::test]
    async fn dangling_session_redirects() {
        let backend = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        let session = SessionStore::new(backend.clone(), "default");
        session.set(ProfileId(Uuid::new_v4())).await.unwrap();

        let gate = ProfileGate::new(session, backend);
        assert_eq!(gate.resolve().await, ProfileAccess::Redirect(Redirect::IntakeFlow));
    }

    #[tokio::test]
    async fn unreadable_session_redirects() {
        let settings = fixtures::memory_settings().await;
        settings
            .set_setting("default", settings_keys::SESSION, &serde_json::json!("garbage"))
            .await
            .unwrap();
        let backend = Arc::new(LibSqlBackend::new_memory().await.unwrap());

        let gate = ProfileGate::new(SessionStore::new(settings, "default"), backend);
        assert_eq!(gate.resolve().await, ProfileAccess::Redirect(Redirect::IntakeFlow));
    }

    #[tokio::test]
    async fn store_error_redirects() {
        let settings = fixtures::memory_settings().await;
        let session = SessionStore::new(settings, "default");
        session.set(ProfileId(Uuid::new_v4())).await.unwrap();

        let gate = ProfileGate::new(session, Arc::new(BrokenProfiles));
        assert_eq!(gate.resolve().await, ProfileAccess::Redirect(Redirect::IntakeFlow));
    }

    #[test]
    fn redirect_serializes_snake_case() {
        assert_eq!(serde_json::to_value(Redirect::IntakeFlow).unwrap(), "intake_flow");
        assert_eq!(serde_json::to_value(Redirect::PostIntake).unwrap(), "post_intake");
    }
}
