//! Error types for FitGoal.

use crate::onboarding::schema::FieldErrors;
use crate::onboarding::state::IntakeStep;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Wizard navigation errors.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("{} field(s) failed validation", .0.len())]
    Validation(FieldErrors),

    #[error("Fields for {got} submitted while the wizard is on {expected}")]
    StepMismatch { expected: IntakeStep, got: IntakeStep },

    #[error("Navigation is locked while a submission is in flight")]
    SubmissionInFlight,

    #[error("Draft storage failed: {0}")]
    Storage(#[from] DatabaseError),
}

/// Profile submission errors.
///
/// `MissingField` and `Coercion` are defensive: the per-step gate should make
/// them unreachable.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("A submission is already in flight")]
    AlreadySubmitting,

    #[error("Cannot submit from {step}; the wizard must be on the final step")]
    NotOnFinalStep { step: IntakeStep },

    #[error("{} field(s) failed validation", .0.len())]
    Validation(FieldErrors),

    #[error("Required field {field} is missing from the draft")]
    MissingField { field: &'static str },

    #[error("Field {field} has unparsable value {value:?}: {reason}")]
    Coercion {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Record store rejected the profile: {0}")]
    Transport(DatabaseError),

    #[error("Failed to record the session: {0}")]
    Session(DatabaseError),
}

impl SubmissionError {
    /// Whether this error comes from a defensive check that the step gate
    /// should have made unreachable.
    pub fn is_defensive(&self) -> bool {
        matches!(self, Self::MissingField { .. } | Self::Coercion { .. })
    }
}
