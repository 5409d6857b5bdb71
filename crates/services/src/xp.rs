use bson::oid::ObjectId;
use mongodb::Database;
use tracing::info;

use crate::dao::{DaoResult, UserDao};

/// XP needed per account level beyond the first.
const XP_PER_LEVEL: u64 = 1000;

#[derive(Debug, Clone, Copy)]
pub enum XpSource {
    WorkshopEnrollment,
    WorkshopAttendance,
    WorkshopActivity,
    WorkshopCompletion,
}

pub fn level_for_xp(xp: u64) -> u32 {
    (1 + xp / XP_PER_LEVEL) as u32
}

/// Account-level experience. Workshop-local points and XP live on the
/// enrollment; this service moves the user's global total and level.
pub struct XpService {
    users: UserDao,
}

impl XpService {
    pub fn new(db: &Database) -> Self {
        Self {
            users: UserDao::new(db),
        }
    }

    pub async fn award(
        &self,
        user_id: ObjectId,
        amount: u32,
        source: XpSource,
        context_id: ObjectId,
    ) -> DaoResult<()> {
        if amount == 0 {
            return Ok(());
        }
        self.users.add_xp(user_id, amount).await?;

        let user = self.users.base.find_by_id(user_id).await?;
        let level = level_for_xp(user.xp);
        if level != user.level {
            self.users.set_level(user_id, level).await?;
            info!(%user_id, level, "User leveled up");
        }

        info!(%user_id, amount, ?source, %context_id, "Awarded XP");
        Ok(())
    }
}
