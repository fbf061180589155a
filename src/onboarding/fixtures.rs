//! Canned step answers shared by the onboarding unit tests.

use std::sync::Arc;

use super::draft::{StepFields, StepFourFields, StepOneFields, StepThreeFields, StepTwoFields};
use super::storage::DraftStore;
use crate::store::{LibSqlBackend, SettingsStore};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn basics() -> StepFields {
    StepFields::Basics(StepOneFields {
        name: "Alex".into(),
        ..Default::default()
    })
}

pub fn training() -> StepFields {
    StepFields::Training(StepTwoFields {
        fitness_goal: "fat_loss".into(),
        experience_level: "beginner".into(),
        days_per_week: "3".into(),
        session_duration: "45".into(),
        workout_style: "mixed".into(),
    })
}

pub fn equipment() -> StepFields {
    StepFields::Equipment(StepThreeFields {
        equipment: strings(&["dumbbells"]),
        constraints: vec![],
    })
}

pub fn nutrition_fields() -> StepFourFields {
    StepFourFields {
        dietary_style: "none".into(),
        allergens: vec![],
        favorite_ingredients: strings(&["chicken"]),
        disliked_ingredients: vec![],
        meals_per_day: "3".into(),
        meal_prep_time: "30".into(),
        cooking_tools: strings(&["stove"]),
    }
}

pub fn nutrition() -> StepFields {
    StepFields::Nutrition(nutrition_fields())
}

pub async fn memory_settings() -> Arc<dyn SettingsStore> {
    Arc::new(LibSqlBackend::new_memory().await.unwrap())
}

pub async fn draft_store() -> DraftStore {
    DraftStore::new(memory_settings().await, "default")
}
