use atelier_services::workshop::JoinOutcome;
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct JoinResponse {
    pub message: String,
    pub redirect_url: String,
    #[serde(flatten)]
    pub outcome: JoinOutcome,
}

/// One entry point for both code flavors; the service decides where the
/// caller lands and the response carries a client redirect hint.
pub async fn join_by_code(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<JoinRequest>,
) -> Result<Json<JoinResponse>, ApiError> {
    let outcome = state.workshops.join_by_code(auth.user_id, &body.code).await?;

    let (message, redirect_url) = match &outcome {
        JoinOutcome::Workshop { workshop, .. } => {
            let id = workshop.id.map(|id| id.to_hex()).unwrap_or_default();
            (
                format!("Joined workshop: {}", workshop.title),
                format!("/workshops/{id}"),
            )
        }
        JoinOutcome::LiveSession {
            workshop, session, ..
        } => {
            let wid = workshop.id.map(|id| id.to_hex()).unwrap_or_default();
            let sid = session.id.map(|id| id.to_hex()).unwrap_or_default();
            (
                format!("Joined live session: {}", session.title),
                format!("/workshops/{wid}/sessions/{sid}/live"),
            )
        }
        JoinOutcome::Session { session, .. } => {
            let wid = session.workshop_id.to_hex();
            let sid = session.id.map(|id| id.to_hex()).unwrap_or_default();
            (
                format!("Joined session: {}", session.title),
                format!("/workshops/{wid}/sessions/{sid}"),
            )
        }
    };

    Ok(Json(JoinResponse {
        message,
        redirect_url,
        outcome,
    }))
}
