//! Step schema registry: declarative field rules for each intake step.
//!
//! Validation is pure: `validate` looks only at the candidate values it is
//! given and reports every violated field at once.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::draft::{FieldValue, StepFields};
use super::model::{
    options, Allergen, Constraint, CookingTool, DietaryStyle, Equipment, ExperienceLevel, FitnessGoal, Sex,
    WorkoutStyle,
};
use super::state::IntakeStep;

/// Field name → human-readable message for every field that failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// How an optional numeric string must parse when it is non-empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    Integer,
    Decimal,
}

/// A validation rule for one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Required text with at least this many characters. Surrounding
    /// whitespace is not counted.
    MinLength(usize),
    /// Required text drawn from a closed set.
    OneOf(&'static [&'static str]),
    /// Text drawn from a closed set, or empty.
    OptionalOneOf(&'static [&'static str]),
    /// Required selection, one of the offered numeric options.
    Selected(&'static [u32]),
    /// Empty, or a non-negative number of the given kind.
    OptionalNumber(NumberKind),
    /// At least one entry, every entry from the closed set.
    NonEmptySubsetOf(&'static [&'static str]),
    /// Any number of entries, every entry from the closed set.
    SubsetOf(&'static [&'static str]),
    /// At least one free-text entry.
    NonEmptyTextList,
    /// Any number of free-text entries.
    TextList,
}

impl Rule {
    /// Whether the field must carry a value for the step to pass.
    pub fn is_required(&self) -> bool {
        matches!(
            self,
            Self::MinLength(_) | Self::OneOf(_) | Self::Selected(_) | Self::NonEmptySubsetOf(_) | Self::NonEmptyTextList
        )
    }
}

/// One field of a step schema.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub rule: Rule,
    /// Message reported when the field is missing or malformed.
    pub message: &'static str,
}

/// The fields and rules of one intake step.
#[derive(Debug)]
pub struct StepSchema {
    pub step: IntakeStep,
    pub fields: &'static [FieldSpec],
}

impl StepSchema {
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields
            .iter()
            .filter(|f| f.rule.is_required())
            .map(|f| f.name)
    }
}

const fn field(name: &'static str, rule: Rule, message: &'static str) -> FieldSpec {
    FieldSpec { name, rule, message }
}

static BASICS: StepSchema = StepSchema {
    step: IntakeStep::Basics,
    fields: &[
        field("name", Rule::MinLength(2), "Name must be at least 2 characters"),
        field("age", Rule::OptionalNumber(NumberKind::Integer), "Age must be a whole number"),
        field("sex", Rule::OptionalOneOf(Sex::VALUES), "Select male, female or other"),
        field(
            "height_cm",
            Rule::OptionalNumber(NumberKind::Integer),
            "Height must be a whole number of centimeters",
        ),
        field(
            "weight_kg",
            Rule::OptionalNumber(NumberKind::Decimal),
            "Weight must be a number of kilograms",
        ),
    ],
};

static TRAINING: StepSchema = StepSchema {
    step: IntakeStep::Training,
    fields: &[
        field("fitness_goal", Rule::OneOf(FitnessGoal::VALUES), "Select a fitness goal"),
        field(
            "experience_level",
            Rule::OneOf(ExperienceLevel::VALUES),
            "Select an experience level",
        ),
        field("days_per_week", Rule::Selected(options::DAYS_PER_WEEK), "Please select days per week"),
        field("session_duration", Rule::Selected(options::SESSION_DURATION_MINUTES), "Please select session duration"),
        field("workout_style", Rule::OneOf(WorkoutStyle::VALUES), "Select a workout style"),
    ],
};

static EQUIPMENT: StepSchema = StepSchema {
    step: IntakeStep::Equipment,
    fields: &[
        field(
            "equipment",
            Rule::NonEmptySubsetOf(Equipment::VALUES),
            "Select at least one equipment option",
        ),
        field("constraints", Rule::SubsetOf(Constraint::VALUES), "Unknown physical constraint"),
    ],
};

static NUTRITION: StepSchema = StepSchema {
    step: IntakeStep::Nutrition,
    fields: &[
        field("dietary_style", Rule::OneOf(DietaryStyle::VALUES), "Select a dietary style"),
        field("allergens", Rule::SubsetOf(Allergen::VALUES), "Unknown allergen"),
        field(
            "favorite_ingredients",
            Rule::NonEmptyTextList,
            "Add at least one favorite ingredient",
        ),
        field("disliked_ingredients", Rule::TextList, "Invalid disliked ingredients"),
        field("meals_per_day", Rule::Selected(options::MEALS_PER_DAY), "Please select meals per day"),
        field("meal_prep_time", Rule::Selected(options::MEAL_PREP_MINUTES), "Please select meal prep time"),
        field(
            "cooking_tools",
            Rule::NonEmptySubsetOf(CookingTool::VALUES),
            "Select at least one cooking tool",
        ),
    ],
};

/// The schema for `step`.
pub fn schema(step: IntakeStep) -> &'static StepSchema {
    match step {
        IntakeStep::Basics => &BASICS,
        IntakeStep::Training => &TRAINING,
        IntakeStep::Equipment => &EQUIPMENT,
        IntakeStep::Nutrition => &NUTRITION,
    }
}

/// Validate candidate values against the schema of `step`.
///
/// Fields the candidate does not carry count as empty.
pub fn validate(step: IntakeStep, candidate: &StepFields) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    for spec in schema(step).fields {
        let value = candidate.value(spec.name);
        if let Err(message) = check(spec, value) {
            errors.insert(spec.name, message);
        }
    }
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn check(spec: &FieldSpec, value: Option<FieldValue<'_>>) -> Result<(), String> {
    let fail = || Err(spec.message.to_string());
    let text = match value {
        Some(FieldValue::Text(s)) => s.trim(),
        _ => "",
    };
    let list: &[String] = match value {
        Some(FieldValue::List(items)) => items,
        _ => &[],
    };

    match spec.rule {
        Rule::MinLength(min) => {
            if text.chars().count() < min {
                return fail();
            }
        }
        Rule::OneOf(allowed) => {
            if !allowed.contains(&text) {
                return fail();
            }
        }
        Rule::OptionalOneOf(allowed) => {
            if !text.is_empty() && !allowed.contains(&text) {
                return fail();
            }
        }
        Rule::Selected(offered) => {
            let chosen = text.parse::<u32>().ok();
            if !chosen.is_some_and(|n| offered.contains(&n)) {
                return fail();
            }
        }
        Rule::OptionalNumber(kind) => {
            if !text.is_empty() && !parses_as(kind, text) {
                return fail();
            }
        }
        Rule::NonEmptySubsetOf(allowed) | Rule::SubsetOf(allowed) => {
            if list.is_empty() && spec.rule.is_required() {
                return fail();
            }
            if let Some(bad) = list.iter().find(|v| !allowed.contains(&v.as_str())) {
                return Err(format!("{bad:?} is not an allowed value"));
            }
            let repeated = list
                .iter()
                .enumerate()
                .find(|&(i, v)| list[..i].contains(v))
                .map(|(_, v)| v);
            if let Some(dup) = repeated {
                return Err(format!("{dup:?} is selected more than once"));
            }
        }
        Rule::NonEmptyTextList => {
            if list.iter().all(|v| v.trim().is_empty()) {
                return fail();
            }
        }
        Rule::TextList => {}
    }
    Ok(())
}

fn parses_as(kind: NumberKind, text: &str) -> bool {
    match kind {
        NumberKind::Integer => text.parse::<u32>().is_ok(),
        NumberKind::Decimal => text
            .parse::<f64>()
            .map(|v| v.is_finite() && v >= 0.0)
            .unwrap_or(false),
    }
}
