use atelier_db::models::{ActivityResponse, SessionActivity};
use atelier_services::workshop::SubmitResult;
use axum::{
    Json,
    extract::{Path, State},
};

use super::parse_oid;
use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

pub async fn get(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(activity_id): Path<String>,
) -> Result<Json<SessionActivity>, ApiError> {
    let aid = parse_oid(&activity_id, "activity")?;
    Ok(Json(state.workshops.get_activity(aid).await?))
}

pub async fn start(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(activity_id): Path<String>,
) -> Result<Json<SessionActivity>, ApiError> {
    let aid = parse_oid(&activity_id, "activity")?;
    Ok(Json(state.workshops.start_activity(auth.user_id, aid).await?))
}

pub async fn submit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(activity_id): Path<String>,
    Json(body): Json<ActivityResponse>,
) -> Result<Json<SubmitResult>, ApiError> {
    let aid = parse_oid(&activity_id, "activity")?;
    Ok(Json(
        state
            .workshops
            .submit_response(auth.user_id, aid, body)
            .await?,
    ))
}

pub async fn complete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(activity_id): Path<String>,
) -> Result<Json<SessionActivity>, ApiError> {
    let aid = parse_oid(&activity_id, "activity")?;
    Ok(Json(
        state
            .workshops
            .complete_activity(auth.user_id, aid)
            .await?,
    ))
}
