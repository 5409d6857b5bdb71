pub mod activity;
pub mod auth;
pub mod join;
pub mod session;
pub mod workshop;

use bson::oid::ObjectId;

use crate::error::ApiError;

pub(crate) fn parse_oid(raw: &str, what: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid {what} id")))
}
