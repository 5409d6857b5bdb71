use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::TransitionError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkshopEnrollment {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub workshop_id: ObjectId,
    pub user_id: ObjectId,
    #[serde(default)]
    pub status: EnrollmentStatus,
    #[serde(default)]
    pub role: EnrollmentRole,
    pub team_id: Option<ObjectId>,
    pub payment: Option<PaymentDetails>,
    #[serde(default)]
    pub progress: Progress,
    #[serde(default)]
    pub performance: Performance,
    #[serde(default)]
    pub attendance: Vec<AttendanceEntry>,
    #[serde(default)]
    pub achievements: Vec<UnlockedAchievement>,
    pub feedback: Option<Feedback>,
    pub certificate_issued_at: Option<DateTime>,
    pub certificate_url: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    #[default]
    Pending,
    Confirmed,
    Waitlisted,
    NoShow,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentRole {
    #[default]
    Participant,
    Mentor,
    Observer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub method: String,
    pub amount: f64,
    pub transaction_id: Option<String>,
    pub paid_at: Option<DateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Progress {
    #[serde(default)]
    pub sessions_attended: Vec<ObjectId>,
    #[serde(default)]
    pub activities_completed: Vec<ObjectId>,
    #[serde(default)]
    pub total_points: u64,
    #[serde(default)]
    pub total_xp: u64,
    pub rank: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Performance {
    /// Per-activity scores, keyed by activity id hex.
    #[serde(default)]
    pub quiz_scores: HashMap<String, f64>,
    #[serde(default)]
    pub challenge_scores: HashMap<String, f64>,
    #[serde(default)]
    pub participation_score: f64,
    #[serde(default)]
    pub team_contribution_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceEntry {
    pub session_id: ObjectId,
    pub joined_at: DateTime,
    pub left_at: Option<DateTime>,
    pub duration_secs: Option<i64>,
    pub participation: Option<ParticipationLevel>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ParticipationLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnlockedAchievement {
    pub id: String,
    pub unlocked_at: DateTime,
    pub points: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub rating: u8,
    pub comment: Option<String>,
}

impl WorkshopEnrollment {
    pub const COLLECTION: &'static str = "workshop_enrollments";
    const ENTITY: &'static str = "enrollment";

    pub fn new(workshop_id: ObjectId, user_id: ObjectId, now: DateTime) -> Self {
        Self {
            id: None,
            workshop_id,
            user_id,
            status: EnrollmentStatus::Pending,
            role: EnrollmentRole::Participant,
            team_id: None,
            payment: None,
            progress: Progress::default(),
            performance: Performance::default(),
            attendance: Vec::new(),
            achievements: Vec::new(),
            feedback: None,
            certificate_issued_at: None,
            certificate_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn confirm(&mut self, now: DateTime) -> Result<(), TransitionError> {
        if self.status != EnrollmentStatus::Pending {
            return Err(TransitionError::new(Self::ENTITY, self.status, "confirmed"));
        }
        self.status = EnrollmentStatus::Confirmed;
        self.updated_at = now;
        Ok(())
    }

    pub fn waitlist(&mut self, now: DateTime) -> Result<(), TransitionError> {
        if self.status != EnrollmentStatus::Pending {
            return Err(TransitionError::new(Self::ENTITY, self.status, "waitlisted"));
        }
        self.status = EnrollmentStatus::Waitlisted;
        self.updated_at = now;
        Ok(())
    }

    pub fn complete(&mut self, now: DateTime) -> Result<(), TransitionError> {
        if self.status != EnrollmentStatus::Confirmed {
            return Err(TransitionError::new(Self::ENTITY, self.status, "completed"));
        }
        self.status = EnrollmentStatus::Completed;
        self.updated_at = now;
        Ok(())
    }

    pub fn mark_no_show(&mut self, now: DateTime) -> Result<(), TransitionError> {
        if self.status != EnrollmentStatus::Confirmed {
            return Err(TransitionError::new(Self::ENTITY, self.status, "no_show"));
        }
        self.status = EnrollmentStatus::NoShow;
        self.updated_at = now;
        Ok(())
    }

    pub fn cancel(&mut self, now: DateTime) -> Result<(), TransitionError> {
        if self.status == EnrollmentStatus::Completed {
            return Err(TransitionError::new(Self::ENTITY, self.status, "cancelled"));
        }
        self.status = EnrollmentStatus::Cancelled;
        self.updated_at = now;
        Ok(())
    }

    pub fn add_points(&mut self, points: u32, xp: u32) {
        self.progress.total_points += points as u64;
        self.progress.total_xp += xp as u64;
    }

    /// Unlock an achievement exactly once; points are granted with doubled XP.
    /// Returns false (and grants nothing) when the id is already unlocked.
    pub fn unlock_achievement(&mut self, id: &str, points: u32, now: DateTime) -> bool {
        if self.achievements.iter().any(|a| a.id == id) {
            return false;
        }
        self.achievements.push(UnlockedAchievement {
            id: id.to_string(),
            unlocked_at: now,
            points,
        });
        self.add_points(points, points * 2);
        true
    }

    /// Append an attendance record and track the session as attended.
    pub fn add_attendance(&mut self, session_id: ObjectId, now: DateTime) {
        self.attendance.push(AttendanceEntry {
            session_id,
            joined_at: now,
            left_at: None,
            duration_secs: None,
            participation: None,
        });
        if !self.progress.sessions_attended.contains(&session_id) {
            self.progress.sessions_attended.push(session_id);
        }
        self.updated_at = now;
    }

    pub fn attendance_rate(&self, total_sessions: usize) -> f64 {
        if total_sessions == 0 {
            return 0.0;
        }
        self.progress.sessions_attended.len() as f64 / total_sessions as f64 * 100.0
    }
}
