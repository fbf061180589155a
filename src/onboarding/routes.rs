//! REST endpoints for the intake wizard and the dashboard gate.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::sync::RwLock;

use super::draft::StepFields;
use super::gate::{ProfileAccess, ProfileGate};
use super::storage::{DraftStore, SessionStore};
use super::submitter::ProfileSubmitter;
use super::wizard::WizardController;
use crate::error::{DatabaseError, IntakeError, SubmissionError};
use crate::store::{ProfileStore, SettingsStore};

/// Shown when a profile could not be created.
pub const SUBMIT_FAILURE_NOTICE: &str = "Failed to create profile. Please try again.";

/// Shared state for intake routes.
#[derive(Clone)]
pub struct IntakeRouteState {
    pub wizard: Arc<RwLock<WizardController>>,
    pub submitter: Arc<ProfileSubmitter>,
    pub gate: Arc<ProfileGate>,
}

impl IntakeRouteState {
    /// Wire the wizard, submitter and gate for one user, restoring any
    /// persisted draft.
    pub async fn load(
        settings: Arc<dyn SettingsStore>,
        profiles: Arc<dyn ProfileStore>,
        user_id: &str,
    ) -> Result<Self, DatabaseError> {
        let drafts = DraftStore::new(Arc::clone(&settings), user_id);
        let session = SessionStore::new(settings, user_id);
        let wizard = WizardController::load(drafts).await?;

        Ok(Self {
            wizard: Arc::new(RwLock::new(wizard)),
            submitter: Arc::new(ProfileSubmitter::new(
                Arc::clone(&profiles),
                session.clone(),
            )),
            gate: Arc::new(ProfileGate::new(session, profiles)),
        })
    }
}

fn intake_error_response(err: IntakeError) -> Response {
    match err {
        IntakeError::Validation(errors) => {
            (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "errors": errors }))).into_response()
        }
        IntakeError::StepMismatch { .. } | IntakeError::SubmissionInFlight => {
            (StatusCode::CONFLICT, Json(json!({ "error": err.to_string() }))).into_response()
        }
        IntakeError::Storage(e) => {
            tracing::warn!(error = %e, "Failed to persist onboarding draft");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to save progress. Please try again." })),
            )
                .into_response()
        }
    }
}

fn submission_error_response(err: SubmissionError) -> Response {
    let status = match &err {
        SubmissionError::Validation(errors) => {
            return (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "errors": errors })))
                .into_response();
        }
        SubmissionError::AlreadySubmitting | SubmissionError::NotOnFinalStep { .. } => {
            return (StatusCode::CONFLICT, Json(json!({ "error": err.to_string() })))
                .into_response();
        }
        SubmissionError::Transport(_) => StatusCode::BAD_GATEWAY,
        SubmissionError::MissingField { .. }
        | SubmissionError::Coercion { .. }
        | SubmissionError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": SUBMIT_FAILURE_NOTICE }))).into_response()
}

/// GET /api/onboarding
///
/// The active step, its current values and any field errors.
async fn get_view(State(state): State<IntakeRouteState>) -> impl IntoResponse {
    Json(state.wizard.read().await.view())
}

/// POST /api/onboarding/next
async fn post_next(
    State(state): State<IntakeRouteState>,
    Json(fields): Json<StepFields>,
) -> Response {
    let mut wizard = state.wizard.write().await;
    match wizard.next(fields).await {
        Ok(_) => Json(wizard.view()).into_response(),
        Err(e) => intake_error_response(e),
    }
}

/// POST /api/onboarding/previous
async fn post_previous(State(state): State<IntakeRouteState>) -> Response {
    let mut wizard = state.wizard.write().await;
    match wizard.previous().await {
        Ok(_) => Json(wizard.view()).into_response(),
        Err(e) => intake_error_response(e),
    }
}

/// POST /api/onboarding/submit
///
/// Body is the final step's fields. Returns 201 with the new profile id.
async fn post_submit(
    State(state): State<IntakeRouteState>,
    Json(fields): Json<StepFields>,
) -> Response {
    match state.submitter.submit(&state.wizard, fields).await {
        Ok(submission) => (StatusCode::CREATED, Json(submission)).into_response(),
        Err(e) => submission_error_response(e),
    }
}

/// GET /api/profile
///
/// The session's profile, or 404 with a redirect signal if onboarding is
/// not done.
async fn get_profile(State(state): State<IntakeRouteState>) -> Response {
    match state.gate.resolve().await {
        ProfileAccess::Ready(profile) => Json(profile).into_response(),
        ProfileAccess::Redirect(redirect) => {
            (StatusCode::NOT_FOUND, Json(json!({ "redirect": redirect }))).into_response()
        }
    }
}

/// Build the intake REST routes.
pub fn onboarding_routes(state: IntakeRouteState) -> Router {
    Router::new()
        .route("/api/onboarding", get(get_view))
        .route("/api/onboarding/next", post(post_next))
        .route("/api/onboarding/previous", post(post_previous))
        .route("/api/onboarding/submit", post(post_submit))
        .route("/api/profile", get(get_profile))
        .with_state(state)
}
