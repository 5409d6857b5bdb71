use atelier_db::models::Workshop;
use bson::{doc, oid::ObjectId};
use mongodb::Database;
use tracing::warn;

use super::base::{BaseDao, DaoError, DaoResult, PaginatedResult, PaginationParams};
use crate::codegen::CodeGenerator;

const CODE_RETRIES: usize = 5;

pub struct WorkshopDao {
    pub base: BaseDao<Workshop>,
}

impl WorkshopDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Workshop::COLLECTION),
        }
    }

    /// Insert a workshop, drawing fresh join codes until one clears the
    /// unique index.
    pub async fn create(&self, mut workshop: Workshop, codes: &CodeGenerator) -> DaoResult<Workshop> {
        for attempt in 0..CODE_RETRIES {
            workshop.join_code = codes.workshop_code();
            match self.base.insert_one(&workshop).await {
                Ok(id) => {
                    workshop.id = Some(id);
                    return Ok(workshop);
                }
                Err(DaoError::DuplicateKey(msg)) => {
                    warn!(attempt, %msg, "Workshop join code collision, regenerating");
                }
                Err(e) => return Err(e),
            }
        }
        Err(DaoError::Validation(
            "could not allocate a unique workshop join code".into(),
        ))
    }

    pub async fn find_by_code(&self, code: &str) -> DaoResult<Option<Workshop>> {
        self.base.find_one(doc! { "join_code": code }).await
    }

    pub async fn find_by_instructor(
        &self,
        instructor_id: ObjectId,
        params: &PaginationParams,
    ) -> DaoResult<PaginatedResult<Workshop>> {
        self.base
            .find_paginated(doc! { "instructor_id": instructor_id }, None, params)
            .await
    }

    pub async fn inc_enrollment_count(&self, workshop_id: ObjectId, by: i32) -> DaoResult<bool> {
        self.base
            .update_by_id(workshop_id, doc! { "$inc": { "enrollment_count": by } })
            .await
    }
}
