//! Profile data model and the closed value sets used by the intake steps.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A token that is not a member of the closed set it was parsed against.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{value:?} is not a valid {set}")]
pub struct UnknownValue {
    pub set: &'static str,
    pub value: String,
}

/// Declares a closed set of snake_case tokens as an enum with `VALUES`,
/// `as_str`, `Display` and `FromStr`.
macro_rules! closed_set {
    ($(#[$meta:meta])* $name:ident as $label:literal { $($variant:ident => $token:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every token in the set, in presentation order.
            pub const VALUES: &'static [&'static str] = &[$($token),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $token),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownValue;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($token => Ok(Self::$variant),)+
                    other => Err(UnknownValue {
                        set: $label,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

closed_set!(
    /// Self-reported sex. Optional on the profile.
    Sex as "sex" {
        Male => "male",
        Female => "female",
        Other => "other",
    }
);

closed_set!(
    /// Primary training objective.
    FitnessGoal as "fitness goal" {
        FatLoss => "fat_loss",
        MuscleGain => "muscle_gain",
        Maintenance => "maintenance",
        Strength => "strength",
        Endurance => "endurance",
        Mobility => "mobility",
    }
);

closed_set!(
    ExperienceLevel as "experience level" {
        Beginner => "beginner",
        Intermediate => "intermediate",
        Advanced => "advanced",
    }
);

closed_set!(
    WorkoutStyle as "workout style" {
        Hiit => "hiit",
        Bodybuilding => "bodybuilding",
        Powerlifting => "powerlifting",
        Pilates => "pilates",
        Running => "running",
        Mixed => "mixed",
    }
);

closed_set!(
    /// Training equipment the user has access to.
    Equipment as "equipment option" {
        None => "none",
        Dumbbells => "dumbbells",
        Barbell => "barbell",
        FullGym => "full_gym",
        Bands => "bands",
        Kettlebells => "kettlebells",
    }
);

closed_set!(
    /// Physical limitations that restrict exercise selection.
    Constraint as "constraint" {
        KneeIssues => "knee_issues",
        LowBack => "low_back",
        Shoulder => "shoulder",
        PregnancyPostpartum => "pregnancy_postpartum",
    }
);

closed_set!(
    DietaryStyle as "dietary style" {
        None => "none",
        HighProtein => "high_protein",
        LowCarb => "low_carb",
        Vegetarian => "vegetarian",
        Vegan => "vegan",
        Pescatarian => "pescatarian",
    }
);

closed_set!(
    Allergen as "allergen" {
        Nuts => "nuts",
        Dairy => "dairy",
        Gluten => "gluten",
        Shellfish => "shellfish",
        Eggs => "eggs",
    }
);

closed_set!(
    CookingTool as "cooking tool" {
        Microwave => "microwave",
        AirFryer => "air_fryer",
        Stove => "stove",
        Oven => "oven",
        SlowCooker => "slow_cooker",
    }
);

/// Options offered by the select inputs. Validation only requires a
/// non-empty selection; these drive the presentation layer.
pub mod options {
    pub const DAYS_PER_WEEK: &[u32] = &[2, 3, 4, 5, 6];
    pub const SESSION_DURATION_MINUTES: &[u32] = &[20, 30, 45, 60, 75, 90];
    pub const MEALS_PER_DAY: &[u32] = &[2, 3, 4, 5];
    pub const MEAL_PREP_MINUTES: &[u32] = &[15, 30, 45, 60];
}

/// Identifier assigned by the record store when a profile is inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(pub Uuid);

impl std::fmt::Display for ProfileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ProfileId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A fully typed profile ready for insertion. Carries no identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProfile {
    pub name: String,
    pub age: Option<u32>,
    pub sex: Option<Sex>,
    pub height_cm: Option<u32>,
    pub weight_kg: Option<f64>,

    pub fitness_goal: FitnessGoal,
    pub experience_level: ExperienceLevel,
    pub days_per_week: u32,
    pub session_duration: u32,
    pub equipment: Vec<Equipment>,
    pub constraints: Vec<Constraint>,
    pub workout_style: WorkoutStyle,

    pub dietary_style: DietaryStyle,
    pub allergens: Vec<Allergen>,
    pub favorite_ingredients: Vec<String>,
    pub disliked_ingredients: Vec<String>,
    pub meals_per_day: u32,
    pub meal_prep_time: u32,
    pub cooking_tools: Vec<CookingTool>,
}

/// A persisted profile as returned by the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    #[serde(flatten)]
    pub fields: NewProfile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Settings keys for the durable intake slots.
pub mod settings_keys {
    /// Draft form data plus current step index.
    pub const ONBOARDING_DRAFT: &str = "onboarding_draft";
    /// Identifier of the most recently created profile.
    pub const SESSION: &str = "session";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_serde() {
        for token in FitnessGoal::VALUES {
            let goal: FitnessGoal = token.parse().unwrap();
            let json = serde_json::to_string(&goal).unwrap();
            assert_eq!(format!("\"{goal}\""), json);
        }
        for token in CookingTool::VALUES {
            let tool: CookingTool = token.parse().unwrap();
            assert_eq!(serde_json::to_value(tool).unwrap(), *token);
        }
    }

    #[test]
    fn unknown_token_is_rejected() {
        let err = "treadmill".parse::<Equipment>().unwrap_err();
        assert_eq!(err.set, "equipment option");
        assert_eq!(err.value, "treadmill");
        assert!("Fat_Loss".parse::<FitnessGoal>().is_err());
    }

    #[test]
    fn glossary_sets_are_complete() {
        assert_eq!(FitnessGoal::VALUES.len(), 6);
        assert_eq!(Equipment::VALUES.len(), 6);
        assert_eq!(DietaryStyle::VALUES.len(), 6);
        assert_eq!(CookingTool::VALUES.len(), 5);
        assert_eq!(Constraint::VALUES.len(), 4);
        assert_eq!(Allergen::VALUES.len(), 5);
        assert_eq!(Sex::VALUES.len(), 3);
    }

    #[test]
    fn profile_flattens_fields() {
        let profile = Profile {
            id: ProfileId(Uuid::new_v4()),
            fields: NewProfile {
                name: "Alex".to_string(),
                age: None,
                sex: Some(Sex::Other),
                height_cm: None,
                weight_kg: Some(70.5),
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
            },
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["name"], "Alex");
        assert_eq!(json["fitness_goal"], "fat_loss");
        assert_eq!(json["days_per_week"], 3);
        assert_eq!(json["id"], profile.id.to_string());

        let parsed: Profile = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, profile);
    }

    #[test]
    fn profile_id_parses_from_string() {
        let id = ProfileId(Uuid::new_v4());
        let parsed: ProfileId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<ProfileId>().is_err());
    }
}
