//! FitGoal: onboarding intake core.

pub mod config;
pub mod error;
pub mod onboarding;
pub mod store;
