use atelier_db::models::{EnrollmentStatus, WorkshopEnrollment};
use bson::{doc, oid::ObjectId};
use mongodb::Database;

use super::base::{BaseDao, DaoResult};

pub struct EnrollmentDao {
    pub base: BaseDao<WorkshopEnrollment>,
}

impl EnrollmentDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, WorkshopEnrollment::COLLECTION),
        }
    }

    pub async fn find_by_user_and_workshop(
        &self,
        user_id: ObjectId,
        workshop_id: ObjectId,
    ) -> DaoResult<Option<WorkshopEnrollment>> {
        self.base
            .find_one(doc! { "user_id": user_id, "workshop_id": workshop_id })
            .await
    }

    pub async fn find_by_workshop(
        &self,
        workshop_id: ObjectId,
    ) -> DaoResult<Vec<WorkshopEnrollment>> {
        self.base
            .find_many(doc! { "workshop_id": workshop_id }, None)
            .await
    }

    pub async fn find_confirmed_by_workshop(
        &self,
        workshop_id: ObjectId,
    ) -> DaoResult<Vec<WorkshopEnrollment>> {
        self.base
            .find_many(
                doc! {
                    "workshop_id": workshop_id,
                    "status": bson::to_bson(&EnrollmentStatus::Confirmed)?,
                },
                None,
            )
            .await
    }

    pub async fn find_by_user(&self, user_id: ObjectId) -> DaoResult<Vec<WorkshopEnrollment>> {
        self.base
            .find_many(doc! { "user_id": user_id }, Some(doc! { "created_at": -1 }))
            .await
    }
}
