use atelier_db::models::{SessionStatus, WorkshopSession};
use bson::{doc, oid::ObjectId};
use mongodb::Database;
use tracing::warn;

use super::base::{BaseDao, DaoError, DaoResult};

const CODE_RETRIES: usize = 5;

pub struct SessionDao {
    pub base: BaseDao<WorkshopSession>,
}

impl SessionDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, WorkshopSession::COLLECTION),
        }
    }

    /// Insert a session, regenerating its join code on collision. The
    /// caller supplies a closure so expiry stamping stays with the model.
    pub async fn create<F>(
        &self,
        mut session: WorkshopSession,
        mut next_code: F,
    ) -> DaoResult<WorkshopSession>
    where
        F: FnMut(&mut WorkshopSession),
    {
        for attempt in 0..CODE_RETRIES {
            match self.base.insert_one(&session).await {
                Ok(id) => {
                    session.id = Some(id);
                    return Ok(session);
                }
                Err(DaoError::DuplicateKey(msg)) => {
                    warn!(attempt, %msg, "Session join code collision, regenerating");
                    next_code(&mut session);
                }
                Err(e) => return Err(e),
            }
        }
        Err(DaoError::Validation(
            "could not allocate a unique session join code".into(),
        ))
    }

    pub async fn find_by_code(&self, code: &str) -> DaoResult<Option<WorkshopSession>> {
        self.base.find_one(doc! { "join_code": code }).await
    }

    pub async fn find_by_workshop(&self, workshop_id: ObjectId) -> DaoResult<Vec<WorkshopSession>> {
        self.base
            .find_many(
                doc! { "workshop_id": workshop_id },
                Some(doc! { "sequence": 1 }),
            )
            .await
    }

    /// The first live session of a workshop, by sequence, if any.
    pub async fn find_live_by_workshop(
        &self,
        workshop_id: ObjectId,
    ) -> DaoResult<Option<WorkshopSession>> {
        let mut live = self
            .base
            .find_many(
                doc! {
                    "workshop_id": workshop_id,
                    "status": bson::to_bson(&SessionStatus::Live)?,
                },
                Some(doc! { "sequence": 1 }),
            )
            .await?;
        Ok(if live.is_empty() {
            None
        } else {
            Some(live.remove(0))
        })
    }

    pub async fn next_sequence(&self, workshop_id: ObjectId) -> DaoResult<u32> {
        let count = self
            .base
            .count(doc! { "workshop_id": workshop_id })
            .await?;
        Ok(count as u32 + 1)
    }
}
