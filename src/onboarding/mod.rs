//! Onboarding intake: the four-step wizard that produces a user profile.
//!
//! Each step is validated against its schema before the wizard advances.
//! Validated answers accumulate in a string-typed draft that is persisted
//! after every move, so a reload resumes where the user left off. The final
//! step hands the draft to the submitter, which coerces it into a typed
//! `NewProfile` and stores it.

pub mod draft;
pub mod gate;
pub mod model;
pub mod routes;
pub mod schema;
pub mod state;
pub mod storage;
pub mod submitter;
pub mod wizard;

#[cfg(test)]
mod fixtures;

pub use draft::{OnboardingDraft, StepFields};
pub use gate::{ProfileAccess, ProfileGate, Redirect};
pub use model::{NewProfile, Profile, ProfileId};
pub use routes::{IntakeRouteState, onboarding_routes};
pub use schema::{FieldErrors, validate};
pub use state::IntakeStep;
pub use storage::{DraftStore, SessionStore};
pub use submitter::{ProfileSubmitter, Submission};
pub use wizard::{StepView, WizardController};
