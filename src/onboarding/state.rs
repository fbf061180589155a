//! Intake step state machine: tracks which step of the wizard is active.

use serde::{Deserialize, Serialize};

/// Number of steps in the intake wizard.
pub const TOTAL_STEPS: u8 = 4;

/// The steps of the intake wizard.
///
/// Progresses linearly: Basics → Training → Equipment → Nutrition. Completing
/// Nutrition hands off to the profile submitter rather than a fifth state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeStep {
    /// Step 1: name and optional body metrics.
    Basics,
    /// Step 2: goal, experience, schedule, style.
    Training,
    /// Step 3: equipment and physical constraints.
    Equipment,
    /// Step 4: diet, ingredients, meals, cooking tools.
    Nutrition,
}

impl IntakeStep {
    pub const ALL: [IntakeStep; TOTAL_STEPS as usize] =
        [Self::Basics, Self::Training, Self::Equipment, Self::Nutrition];

    /// 1-based position of the step.
    pub fn ordinal(&self) -> u8 {
        match self {
            Self::Basics => 1,
            Self::Training => 2,
            Self::Equipment => 3,
            Self::Nutrition => 4,
        }
    }

    /// Look up a step by its 1-based position.
    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        match ordinal {
            1 => Some(Self::Basics),
            2 => Some(Self::Training),
            3 => Some(Self::Equipment),
            4 => Some(Self::Nutrition),
            _ => None,
        }
    }

    /// Check if a transition from `self` to `target` is valid.
    ///
    /// Only single steps forward or backward are allowed.
    pub fn can_transition_to(&self, target: IntakeStep) -> bool {
        self.next() == Some(target) || self.previous() == Some(target)
    }

    /// Whether this is the last step (completion goes to submission).
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Nutrition)
    }

    pub fn next(&self) -> Option<IntakeStep> {
        Self::from_ordinal(self.ordinal() + 1)
    }

    pub fn previous(&self) -> Option<IntakeStep> {
        Self::from_ordinal(self.ordinal().checked_sub(1)?)
    }

    /// Progress through the wizard as a percentage, for the step indicator.
    pub fn progress_percent(&self) -> u8 {
        (u16::from(self.ordinal()) * 100 / u16::from(TOTAL_STEPS)) as u8
    }
}

impl Default for IntakeStep {
    fn default() -> Self {
        Self::Basics
    }
}

impl std::fmt::Display for IntakeStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Basics => "basics",
            Self::Training => "training",
            Self::Equipment => "equipment",
            Self::Nutrition => "nutrition",
        };
        write!(f, "{s}")
    }
}
