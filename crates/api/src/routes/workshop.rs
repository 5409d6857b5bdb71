use atelier_db::models::{Workshop, WorkshopEnrollment, WorkshopSession, WorkshopTeam};
use atelier_services::dao::{PaginatedResult, PaginationParams};
use atelier_services::workshop::{
    CreateSession, CreateWorkshop, EnrollRequest, LeaderboardView, UpdateWorkshop,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use super::parse_oid;
use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateWorkshop>,
) -> Result<(StatusCode, Json<Workshop>), ApiError> {
    let workshop = state.workshops.create_workshop(auth.user_id, body).await?;
    Ok((StatusCode::CREATED, Json(workshop)))
}

pub async fn get(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(workshop_id): Path<String>,
) -> Result<Json<Workshop>, ApiError> {
    let wid = parse_oid(&workshop_id, "workshop")?;
    Ok(Json(state.workshops.get_workshop(wid).await?))
}

pub async fn list_mine(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<PaginatedResult<Workshop>>, ApiError> {
    Ok(Json(
        state
            .workshops
            .list_by_instructor(auth.user_id, &params)
            .await?,
    ))
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(workshop_id): Path<String>,
    Json(body): Json<UpdateWorkshop>,
) -> Result<Json<Workshop>, ApiError> {
    let wid = parse_oid(&workshop_id, "workshop")?;
    Ok(Json(
        state
            .workshops
            .update_workshop(auth.user_id, wid, body)
            .await?,
    ))
}

pub async fn publish(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(workshop_id): Path<String>,
) -> Result<Json<Workshop>, ApiError> {
    let wid = parse_oid(&workshop_id, "workshop")?;
    Ok(Json(state.workshops.publish_workshop(auth.user_id, wid).await?))
}

pub async fn open_registration(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(workshop_id): Path<String>,
) -> Result<Json<Workshop>, ApiError> {
    let wid = parse_oid(&workshop_id, "workshop")?;
    Ok(Json(
        state.workshops.open_registration(auth.user_id, wid).await?,
    ))
}

pub async fn close_registration(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(workshop_id): Path<String>,
) -> Result<Json<Workshop>, ApiError> {
    let wid = parse_oid(&workshop_id, "workshop")?;
    Ok(Json(
        state.workshops.close_registration(auth.user_id, wid).await?,
    ))
}

pub async fn start(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(workshop_id): Path<String>,
) -> Result<Json<Workshop>, ApiError> {
    let wid = parse_oid(&workshop_id, "workshop")?;
    Ok(Json(state.workshops.start_workshop(auth.user_id, wid).await?))
}

pub async fn cancel(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(workshop_id): Path<String>,
) -> Result<Json<Workshop>, ApiError> {
    let wid = parse_oid(&workshop_id, "workshop")?;
    Ok(Json(state.workshops.cancel_workshop(auth.user_id, wid).await?))
}

pub async fn complete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(workshop_id): Path<String>,
) -> Result<Json<Workshop>, ApiError> {
    let wid = parse_oid(&workshop_id, "workshop")?;
    Ok(Json(
        state.workshops.complete_workshop(auth.user_id, wid).await?,
    ))
}

pub async fn enroll(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(workshop_id): Path<String>,
    Json(body): Json<EnrollRequest>,
) -> Result<(StatusCode, Json<WorkshopEnrollment>), ApiError> {
    let wid = parse_oid(&workshop_id, "workshop")?;
    let enrollment = state.workshops.enroll(auth.user_id, wid, body).await?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

pub async fn my_enrollment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(workshop_id): Path<String>,
) -> Result<Json<WorkshopEnrollment>, ApiError> {
    let wid = parse_oid(&workshop_id, "workshop")?;
    Ok(Json(state.workshops.my_enrollment(auth.user_id, wid).await?))
}

pub async fn enrollments(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(workshop_id): Path<String>,
) -> Result<Json<Vec<WorkshopEnrollment>>, ApiError> {
    let wid = parse_oid(&workshop_id, "workshop")?;
    Ok(Json(
        state.workshops.list_enrollments(auth.user_id, wid).await?,
    ))
}

pub async fn leaderboard(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(workshop_id): Path<String>,
) -> Result<Json<LeaderboardView>, ApiError> {
    let wid = parse_oid(&workshop_id, "workshop")?;
    Ok(Json(state.workshops.leaderboard(wid).await?))
}

pub async fn teams(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(workshop_id): Path<String>,
) -> Result<Json<Vec<WorkshopTeam>>, ApiError> {
    let wid = parse_oid(&workshop_id, "workshop")?;
    Ok(Json(state.workshops.list_teams(wid).await?))
}

pub async fn sessions(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(workshop_id): Path<String>,
) -> Result<Json<Vec<WorkshopSession>>, ApiError> {
    let wid = parse_oid(&workshop_id, "workshop")?;
    Ok(Json(state.workshops.list_sessions(wid).await?))
}

pub async fn create_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(workshop_id): Path<String>,
    Json(body): Json<CreateSession>,
) -> Result<(StatusCode, Json<WorkshopSession>), ApiError> {
    let wid = parse_oid(&workshop_id, "workshop")?;
    let session = state
        .workshops
        .create_session(auth.user_id, wid, body)
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}
