use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

use super::TransitionError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkshopSession {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub workshop_id: ObjectId,
    pub title: String,
    pub description: Option<String>,
    pub sequence: u32,
    #[serde(default)]
    pub session_type: SessionType,
    #[serde(default)]
    pub status: SessionStatus,
    pub scheduled_start: DateTime,
    pub scheduled_end: DateTime,
    pub actual_start_time: Option<DateTime>,
    pub actual_end_time: Option<DateTime>,
    pub lead_instructor_id: Option<ObjectId>,
    #[serde(default)]
    pub assistant_instructor_ids: Vec<ObjectId>,
    /// `WORKSHOP-{year}-{4 base36 chars}`, upper-cased, unique.
    pub join_code: String,
    pub code_expires_at: DateTime,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    Lecture,
    #[default]
    Interactive,
    Lab,
    QAndA,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Scheduled,
    Live,
    Completed,
    Cancelled,
}

impl WorkshopSession {
    pub const COLLECTION: &'static str = "workshop_sessions";
    const ENTITY: &'static str = "session";

    pub fn start(&mut self, now: DateTime) -> Result<(), TransitionError> {
        if self.status != SessionStatus::Scheduled {
            return Err(TransitionError::new(Self::ENTITY, self.status, "live"));
        }
        self.status = SessionStatus::Live;
        self.actual_start_time = Some(now);
        self.updated_at = now;
        Ok(())
    }

    pub fn end(&mut self, now: DateTime) -> Result<(), TransitionError> {
        if self.status != SessionStatus::Live {
            return Err(TransitionError::new(Self::ENTITY, self.status, "completed"));
        }
        self.status = SessionStatus::Completed;
        self.actual_end_time = Some(now);
        self.updated_at = now;
        Ok(())
    }

    pub fn cancel(&mut self, now: DateTime) -> Result<(), TransitionError> {
        if self.status == SessionStatus::Completed {
            return Err(TransitionError::new(Self::ENTITY, self.status, "cancelled"));
        }
        self.status = SessionStatus::Cancelled;
        self.updated_at = now;
        Ok(())
    }

    pub fn is_code_valid(&self, now: DateTime) -> bool {
        now < self.code_expires_at
    }

    /// Swap in a fresh join code and restart the expiry window.
    pub fn set_join_code(&mut self, code: String, now: DateTime, ttl_hours: i64) {
        self.join_code = code;
        self.code_expires_at = expiry_from(now, ttl_hours);
        self.updated_at = now;
    }
}

pub fn expiry_from(now: DateTime, ttl_hours: i64) -> DateTime {
    DateTime::from_millis(now.timestamp_millis() + ttl_hours * 3_600_000)
}
