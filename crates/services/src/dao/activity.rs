use atelier_db::models::SessionActivity;
use bson::{doc, oid::ObjectId};
use mongodb::Database;

use super::base::{BaseDao, DaoResult};

pub struct ActivityDao {
    pub base: BaseDao<SessionActivity>,
}

impl ActivityDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, SessionActivity::COLLECTION),
        }
    }

    pub async fn find_by_session(&self, session_id: ObjectId) -> DaoResult<Vec<SessionActivity>> {
        self.base
            .find_many(
                doc! { "session_id": session_id },
                Some(doc! { "created_at": 1 }),
            )
            .await
    }

    pub async fn find_by_workshop(&self, workshop_id: ObjectId) -> DaoResult<Vec<SessionActivity>> {
        self.base
            .find_many(
                doc! { "workshop_id": workshop_id },
                Some(doc! { "created_at": 1 }),
            )
            .await
    }
}
