use atelier_db::models::{SessionActivity, WorkshopSession};
use atelier_services::workshop::CreateActivity;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use super::parse_oid;
use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

pub async fn start(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(session_id): Path<String>,
) -> Result<Json<WorkshopSession>, ApiError> {
    let sid = parse_oid(&session_id, "session")?;
    Ok(Json(state.workshops.start_session(auth.user_id, sid).await?))
}

pub async fn end(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(session_id): Path<String>,
) -> Result<Json<WorkshopSession>, ApiError> {
    let sid = parse_oid(&session_id, "session")?;
    Ok(Json(state.workshops.end_session(auth.user_id, sid).await?))
}

pub async fn join(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(session_id): Path<String>,
) -> Result<Json<WorkshopSession>, ApiError> {
    let sid = parse_oid(&session_id, "session")?;
    Ok(Json(state.workshops.join_session(auth.user_id, sid).await?))
}

pub async fn regenerate_code(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(session_id): Path<String>,
) -> Result<Json<WorkshopSession>, ApiError> {
    let sid = parse_oid(&session_id, "session")?;
    Ok(Json(
        state
            .workshops
            .regenerate_session_code(auth.user_id, sid)
            .await?,
    ))
}

pub async fn activities(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<SessionActivity>>, ApiError> {
    let sid = parse_oid(&session_id, "session")?;
    Ok(Json(state.workshops.list_activities(sid).await?))
}

pub async fn create_activity(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(session_id): Path<String>,
    Json(body): Json<CreateActivity>,
) -> Result<(StatusCode, Json<SessionActivity>), ApiError> {
    let sid = parse_oid(&session_id, "session")?;
    let activity = state
        .workshops
        .create_activity(auth.user_id, sid, body)
        .await?;
    Ok((StatusCode::CREATED, Json(activity)))
}
