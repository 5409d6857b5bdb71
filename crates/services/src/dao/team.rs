use atelier_db::models::WorkshopTeam;
use bson::{doc, oid::ObjectId};
use mongodb::Database;

use super::base::{BaseDao, DaoResult};

pub struct TeamDao {
    pub base: BaseDao<WorkshopTeam>,
}

impl TeamDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, WorkshopTeam::COLLECTION),
        }
    }

    pub async fn find_by_workshop(&self, workshop_id: ObjectId) -> DaoResult<Vec<WorkshopTeam>> {
        self.base
            .find_many(
                doc! { "workshop_id": workshop_id },
                Some(doc! { "created_at": 1 }),
            )
            .await
    }

    pub async fn find_by_workshop_and_name(
        &self,
        workshop_id: ObjectId,
        name: &str,
    ) -> DaoResult<Option<WorkshopTeam>> {
        self.base
            .find_one(doc! { "workshop_id": workshop_id, "name": name })
            .await
    }

    pub async fn inc_member_count(&self, team_id: ObjectId, by: i32) -> DaoResult<bool> {
        self.base
            .update_by_id(team_id, doc! { "$inc": { "member_count": by } })
            .await
    }
}
