//! Per-step candidate fields and the accumulated onboarding draft.
//!
//! Everything here is string-typed: values arrive from text inputs and
//! selects and stay as text until the submitter coerces them.

use serde::{Deserialize, Serialize};

use super::state::IntakeStep;

/// Step 1: who the user is.
///
/// Optional fields use an empty string for "not provided".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepOneFields {
    pub name: String,
    pub age: String,
    pub sex: String,
    pub height_cm: String,
    pub weight_kg: String,
}

/// Step 2: training goals and schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepTwoFields {
    pub fitness_goal: String,
    pub experience_level: String,
    pub days_per_week: String,
    pub session_duration: String,
    pub workout_style: String,
}

/// Step 3: equipment and physical constraints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepThreeFields {
    pub equipment: Vec<String>,
    pub constraints: Vec<String>,
}

/// Step 4: nutrition preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepFourFields {
    pub dietary_style: String,
    pub allergens: Vec<String>,
    pub favorite_ingredients: Vec<String>,
    pub disliked_ingredients: Vec<String>,
    pub meals_per_day: String,
    pub meal_prep_time: String,
    pub cooking_tools: Vec<String>,
}

/// Which free-text ingredient list an edit applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngredientList {
    Favorite,
    Disliked,
}

impl StepFourFields {
    fn list_mut(&mut self, list: IngredientList) -> &mut Vec<String> {
        match list {
            IngredientList::Favorite => &mut self.favorite_ingredients,
            IngredientList::Disliked => &mut self.disliked_ingredients,
        }
    }

    /// Append a trimmed ingredient. Blank input is ignored; duplicates are kept.
    pub fn add_ingredient(&mut self, list: IngredientList, raw: &str) -> bool {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return false;
        }
        self.list_mut(list).push(trimmed.to_string());
        true
    }

    /// Remove the ingredient at `index`, returning it if it existed.
    pub fn remove_ingredient(&mut self, list: IngredientList, index: usize) -> Option<String> {
        let items = self.list_mut(list);
        (index < items.len()).then(|| items.remove(index))
    }
}

/// Toggle a token in a multi-select list, keeping tokens distinct.
///
/// Returns `true` if the token is selected afterwards.
pub fn toggle_selection(list: &mut Vec<String>, token: &str) -> bool {
    if let Some(pos) = list.iter().position(|t| t == token) {
        list.remove(pos);
        false
    } else {
        list.push(token.to_string());
        true
    }
}

/// Raw candidate values for one step, as supplied by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum StepFields {
    Basics(StepOneFields),
    Training(StepTwoFields),
    Equipment(StepThreeFields),
    Nutrition(StepFourFields),
}

/// A borrowed view of one candidate field, for rule evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    List(&'a [String]),
}

impl StepFields {
    /// The step these fields belong to.
    pub fn step(&self) -> IntakeStep {
        match self {
            Self::Basics(_) => IntakeStep::Basics,
            Self::Training(_) => IntakeStep::Training,
            Self::Equipment(_) => IntakeStep::Equipment,
            Self::Nutrition(_) => IntakeStep::Nutrition,
        }
    }

    /// Look up a field by name. `None` if the field does not belong to this step.
    pub fn value(&self, field: &str) -> Option<FieldValue<'_>> {
        use FieldValue::{List, Text};
        let value = match (self, field) {
            (Self::Basics(f), "name") => Text(&f.name),
            (Self::Basics(f), "age") => Text(&f.age),
            (Self::Basics(f), "sex") => Text(&f.sex),
            (Self::Basics(f), "height_cm") => Text(&f.height_cm),
            (Self::Basics(f), "weight_kg") => Text(&f.weight_kg),

            (Self::Training(f), "fitness_goal") => Text(&f.fitness_goal),
            (Self::Training(f), "experience_level") => Text(&f.experience_level),
            (Self::Training(f), "days_per_week") => Text(&f.days_per_week),
            (Self::Training(f), "session_duration") => Text(&f.session_duration),
            (Self::Training(f), "workout_style") => Text(&f.workout_style),

            (Self::Equipment(f), "equipment") => List(&f.equipment),
            (Self::Equipment(f), "constraints") => List(&f.constraints),

            (Self::Nutrition(f), "dietary_style") => Text(&f.dietary_style),
            (Self::Nutrition(f), "allergens") => List(&f.allergens),
            (Self::Nutrition(f), "favorite_ingredients") => List(&f.favorite_ingredients),
            (Self::Nutrition(f), "disliked_ingredients") => List(&f.disliked_ingredients),
            (Self::Nutrition(f), "meals_per_day") => Text(&f.meals_per_day),
            (Self::Nutrition(f), "meal_prep_time") => Text(&f.meal_prep_time),
            (Self::Nutrition(f), "cooking_tools") => List(&f.cooking_tools),

            _ => return None,
        };
        Some(value)
    }

    /// Candidate values for `step`, pre-filled from the draft with the
    /// form defaults where the draft has nothing yet.
    pub fn seeded(step: IntakeStep, draft: &OnboardingDraft) -> Self {
        fn text(v: &Option<String>, default: &str) -> String {
            v.clone().unwrap_or_else(|| default.to_string())
        }
        fn list(v: &Option<Vec<String>>) -> Vec<String> {
            v.clone().unwrap_or_default()
        }

        match step {
            IntakeStep::Basics => Self::Basics(StepOneFields {
                name: text(&draft.name, ""),
                age: text(&draft.age, ""),
                sex: text(&draft.sex, ""),
                height_cm: text(&draft.height_cm, ""),
                weight_kg: text(&draft.weight_kg, ""),
            }),
            IntakeStep::Training => Self::Training(StepTwoFields {
                fitness_goal: text(&draft.fitness_goal, "maintenance"),
                experience_level: text(&draft.experience_level, "beginner"),
                days_per_week: text(&draft.days_per_week, "3"),
                session_duration: text(&draft.session_duration, "45"),
                workout_style: text(&draft.workout_style, "mixed"),
            }),
            IntakeStep::Equipment => Self::Equipment(StepThreeFields {
                equipment: list(&draft.equipment),
                constraints: list(&draft.constraints),
            }),
            IntakeStep::Nutrition => Self::Nutrition(StepFourFields {
                dietary_style: text(&draft.dietary_style, "none"),
                allergens: list(&draft.allergens),
                favorite_ingredients: list(&draft.favorite_ingredients),
                disliked_ingredients: list(&draft.disliked_ingredients),
                meals_per_day: text(&draft.meals_per_day, "3"),
                meal_prep_time: text(&draft.meal_prep_time, "30"),
                cooking_tools: list(&draft.cooking_tools),
            }),
        }
    }
}

/// Answers accumulated across validated steps.
///
/// A field is `None` until its owning step has been validated and merged.
/// Merges only ever overwrite the merged step's own fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnboardingDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_cm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fitness_goal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_per_week: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workout_style: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub equipment: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dietary_style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allergens: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorite_ingredients: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disliked_ingredients: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meals_per_day: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal_prep_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooking_tools: Option<Vec<String>>,
}

impl OnboardingDraft {
    /// Merge one step's fields, overwriting that step's previous answers and
    /// leaving every other field untouched.
    pub fn merge(&mut self, fields: &StepFields) {
        match fields.clone() {
            StepFields::Basics(f) => {
                self.name = Some(f.name);
                self.age = Some(f.age);
                self.sex = Some(f.sex);
                self.height_cm = Some(f.height_cm);
                self.weight_kg = Some(f.weight_kg);
            }
            StepFields::Training(f) => {
                self.fitness_goal = Some(f.fitness_goal);
                self.experience_level = Some(f.experience_level);
                self.days_per_week = Some(f.days_per_week);
                self.session_duration = Some(f.session_duration);
                self.workout_style = Some(f.workout_style);
            }
            StepFields::Equipment(f) => {
                self.equipment = Some(f.equipment);
                self.constraints = Some(f.constraints);
            }
            StepFields::Nutrition(f) => {
                self.dietary_style = Some(f.dietary_style);
                self.allergens = Some(f.allergens);
                self.favorite_ingredients = Some(f.favorite_ingredients);
                self.disliked_ingredients = Some(f.disliked_ingredients);
                self.meals_per_day = Some(f.meals_per_day);
                self.meal_prep_time = Some(f.meal_prep_time);
                self.cooking_tools = Some(f.cooking_tools);
            }
        }
    }

    /// A copy of the draft with `fields` merged in.
    pub fn merged(&self, fields: &StepFields) -> Self {
        let mut next = self.clone();
        next.merge(fields);
        next
    }

    /// Whether the required answers of `step` are present.
    pub fn has_step(&self, step: IntakeStep) -> bool {
        match step {
            IntakeStep::Basics => self.name.is_some(),
            IntakeStep::Training => {
                self.fitness_goal.is_some()
                    && self.experience_level.is_some()
                    && self.days_per_week.is_some()
                    && self.session_duration.is_some()
                    && self.workout_style.is_some()
            }
            IntakeStep::Equipment => self.equipment.is_some(),
            IntakeStep::Nutrition => {
                self.dietary_style.is_some()
                    && self.favorite_ingredients.is_some()
                    && self.meals_per_day.is_some()
                    && self.meal_prep_time.is_some()
                    && self.cooking_tools.is_some()
            }
        }
    }

    /// Look up a merged field by name. `None` if the field is absent or unknown.
    pub fn value(&self, field: &str) -> Option<FieldValue<'_>> {
        use FieldValue::{List, Text};
        match field {
            "name" => self.name.as_deref().map(Text),
            "age" => self.age.as_deref().map(Text),
            "sex" => self.sex.as_deref().map(Text),
            "height_cm" => self.height_cm.as_deref().map(Text),
            "weight_kg" => self.weight_kg.as_deref().map(Text),

            "fitness_goal" => self.fitness_goal.as_deref().map(Text),
            "experience_level" => self.experience_level.as_deref().map(Text),
            "days_per_week" => self.days_per_week.as_deref().map(Text),
            "session_duration" => self.session_duration.as_deref().map(Text),
            "workout_style" => self.workout_style.as_deref().map(Text),

            "equipment" => self.equipment.as_deref().map(List),
            "constraints" => self.constraints.as_deref().map(List),

            "dietary_style" => self.dietary_style.as_deref().map(Text),
            "allergens" => self.allergens.as_deref().map(List),
            "favorite_ingredients" => self.favorite_ingredients.as_deref().map(List),
            "disliked_ingredients" => self.disliked_ingredients.as_deref().map(List),
            "meals_per_day" => self.meals_per_day.as_deref().map(Text),
            "meal_prep_time" => self.meal_prep_time.as_deref().map(Text),
            "cooking_tools" => self.cooking_tools.as_deref().map(List),
            _ => None,
        }
    }

    /// The furthest step the user may stand on: one past the leading run of
    /// merged steps.
    pub fn furthest_reachable(&self) -> IntakeStep {
        IntakeStep::ALL
            .into_iter()
            .find(|step| !self.has_step(*step))
            .unwrap_or(IntakeStep::Nutrition)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basics(name: &str) -> StepFields {
        StepFields::Basics(StepOneFields {
            name: name.to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn merge_preserves_other_steps() {
        let mut draft = OnboardingDraft::default();
        draft.merge(&basics("Alex"));
        draft.merge(&StepFields::Equipment(StepThreeFields {
            equipment: vec!["dumbbells".into()],
            constraints: vec![],
        }));

        assert_eq!(draft.name.as_deref(), Some("Alex"));
        assert_eq!(draft.equipment, Some(vec!["dumbbells".to_string()]));
        assert!(draft.fitness_goal.is_none());
    }

    #[test]
    fn revisiting_a_step_overwrites_its_fields() {
        let mut draft = OnboardingDraft::default();
        draft.merge(&StepFields::Basics(StepOneFields {
            name: "Alex".into(),
            age: "30".into(),
            ..Default::default()
        }));
        draft.merge(&basics("Sam"));

        assert_eq!(draft.name.as_deref(), Some("Sam"));
        // Cleared in the form, but still present in the draft.
        assert_eq!(draft.age.as_deref(), Some(""));
    }

    #[test]
    fn seeded_uses_defaults_then_draft() {
        let empty = OnboardingDraft::default();
        let StepFields::Training(defaults) = StepFields::seeded(IntakeStep::Training, &empty) else {
            panic!("wrong variant");
        };
        assert_eq!(defaults.fitness_goal, "maintenance");
        assert_eq!(defaults.days_per_week, "3");
        assert_eq!(defaults.session_duration, "45");

        let mut draft = OnboardingDraft::default();
        draft.fitness_goal = Some("strength".into());
        let StepFields::Training(seeded) = StepFields::seeded(IntakeStep::Training, &draft) else {
            panic!("wrong variant");
        };
        assert_eq!(seeded.fitness_goal, "strength");
        assert_eq!(seeded.workout_style, "mixed");
    }

    #[test]
    fn furthest_reachable_tracks_leading_steps() {
        let mut draft = OnboardingDraft::default();
        assert_eq!(draft.furthest_reachable(), IntakeStep::Basics);

        draft.merge(&basics("Alex"));
        assert_eq!(draft.furthest_reachable(), IntakeStep::Training);

        // A gap at step 2 caps reachability even if step 3 is present.
        draft.merge(&StepFields::Equipment(StepThreeFields {
            equipment: vec!["none".into()],
            constraints: vec![],
        }));
        assert_eq!(draft.furthest_reachable(), IntakeStep::Training);
    }

    #[test]
    fn ingredient_editing() {
        let mut fields = StepFourFields::default();
        assert!(fields.add_ingredient(IngredientList::Favorite, "  chicken "));
        assert!(fields.add_ingredient(IngredientList::Favorite, "chicken"));
        assert!(!fields.add_ingredient(IngredientList::Favorite, "   "));
        assert_eq!(fields.favorite_ingredients, vec!["chicken", "chicken"]);

        fields.add_ingredient(IngredientList::Disliked, "olives");
        assert_eq!(
            fields.remove_ingredient(IngredientList::Disliked, 0).as_deref(),
            Some("olives")
        );
        assert!(fields.remove_ingredient(IngredientList::Disliked, 0).is_none());
    }

    #[test]
    fn toggle_keeps_tokens_distinct() {
        let mut tools = vec![];
        assert!(toggle_selection(&mut tools, "stove"));
        assert!(toggle_selection(&mut tools, "oven"));
        assert!(!toggle_selection(&mut tools, "stove"));
        assert_eq!(tools, vec!["oven"]);
    }

    #[test]
    fn step_fields_are_tagged() {
        let fields: StepFields = serde_json::from_value(serde_json::json!({
            "step": "equipment",
            "equipment": ["bands"]
        }))
        .unwrap();
        assert_eq!(fields.step(), IntakeStep::Equipment);
        assert_eq!(
            fields.value("constraints"),
            Some(FieldValue::List(&[]))
        );
        assert!(fields.value("name").is_none());
    }
}
