use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::TransitionError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workshop {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub description: Option<String>,
    pub instructor_id: ObjectId,
    #[serde(default)]
    pub workshop_type: WorkshopType,
    #[serde(default)]
    pub tier: WorkshopTier,
    #[serde(default)]
    pub status: WorkshopStatus,
    pub start_date: DateTime,
    pub end_date: DateTime,
    pub max_participants: u32,
    /// Confirmed enrollments only; waitlisted entries do not consume a slot.
    #[serde(default)]
    pub enrollment_count: u32,
    pub price: Option<f64>,
    /// Upper-cased `XXX-XXX-XXX`, unique across workshops, never expires.
    pub join_code: String,
    #[serde(default)]
    pub gamification: GamificationConfig,
    #[serde(default)]
    pub badges: Vec<Badge>,
    #[serde(default = "default_total_xp_reward")]
    pub total_xp_reward: u32,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub learning_outcomes: Vec<String>,
    pub prerequisites: Option<Prerequisites>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkshopType {
    #[default]
    Bootcamp,
    Masterclass,
    StudyGroup,
    Hackathon,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkshopTier {
    #[default]
    Free,
    Premium,
    Enterprise,
}

impl WorkshopTier {
    pub fn is_paid(&self) -> bool {
        !matches!(self, WorkshopTier::Free)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkshopStatus {
    #[default]
    Draft,
    Published,
    RegistrationOpen,
    RegistrationClosed,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GamificationConfig {
    #[serde(default)]
    pub enable_teams: bool,
    #[serde(default = "bool_true")]
    pub enable_leaderboard: bool,
    /// Default points per activity type, keyed by the type's snake_case name.
    #[serde(default)]
    pub activity_points: HashMap<String, u32>,
    #[serde(default = "default_team_size")]
    pub team_size: u32,
    #[serde(default)]
    pub bonus_points: RankBonusTable,
}

impl Default for GamificationConfig {
    fn default() -> Self {
        Self {
            enable_teams: false,
            enable_leaderboard: true,
            activity_points: HashMap::new(),
            team_size: default_team_size(),
            bonus_points: RankBonusTable::default(),
        }
    }
}

/// Bonus points granted to teams by final rank in a team battle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RankBonusTable {
    pub first: u32,
    pub second: u32,
    pub third: u32,
    pub other: u32,
}

impl Default for RankBonusTable {
    fn default() -> Self {
        Self {
            first: 300,
            second: 200,
            third: 100,
            other: 50,
        }
    }
}

impl RankBonusTable {
    pub fn for_rank(&self, rank: u32) -> u32 {
        match rank {
            1 => self.first,
            2 => self.second,
            3 => self.third,
            _ => self.other,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Badge {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub criteria: String,
    pub points: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Prerequisites {
    pub min_level: Option<u32>,
    /// Declared but not evaluated; journey tracking is an external concern.
    #[serde(default)]
    pub required_journeys: Vec<String>,
}

fn bool_true() -> bool {
    true
}

fn default_team_size() -> u32 {
    5
}

fn default_total_xp_reward() -> u32 {
    1000
}

impl Workshop {
    pub const COLLECTION: &'static str = "workshops";
    const ENTITY: &'static str = "workshop";

    pub fn available_slots(&self) -> i64 {
        self.max_participants as i64 - self.enrollment_count as i64
    }

    pub fn is_registration_open(&self) -> bool {
        self.status == WorkshopStatus::RegistrationOpen
    }

    pub fn publish(&mut self, now: DateTime) -> Result<(), TransitionError> {
        if self.status != WorkshopStatus::Draft {
            return Err(TransitionError::new(Self::ENTITY, self.status, "published"));
        }
        self.status = WorkshopStatus::Published;
        self.updated_at = now;
        Ok(())
    }

    pub fn open_registration(&mut self, now: DateTime) -> Result<(), TransitionError> {
        if self.status != WorkshopStatus::Published {
            return Err(TransitionError::new(
                Self::ENTITY,
                self.status,
                "registration_open",
            ));
        }
        self.status = WorkshopStatus::RegistrationOpen;
        self.updated_at = now;
        Ok(())
    }

    pub fn close_registration(&mut self, now: DateTime) -> Result<(), TransitionError> {
        if self.status != WorkshopStatus::RegistrationOpen {
            return Err(TransitionError::new(
                Self::ENTITY,
                self.status,
                "registration_closed",
            ));
        }
        self.status = WorkshopStatus::RegistrationClosed;
        self.updated_at = now;
        Ok(())
    }

    pub fn start(&mut self, now: DateTime) -> Result<(), TransitionError> {
        if self.status != WorkshopStatus::RegistrationClosed {
            return Err(TransitionError::new(
                Self::ENTITY,
                self.status,
                "in_progress",
            ));
        }
        self.status = WorkshopStatus::InProgress;
        self.updated_at = now;
        Ok(())
    }

    /// Callable from any state; the completion pass is the instructor's call.
    pub fn complete(&mut self, now: DateTime) {
        self.status = WorkshopStatus::Completed;
        self.updated_at = now;
    }

    pub fn cancel(&mut self, now: DateTime) -> Result<(), TransitionError> {
        if matches!(
            self.status,
            WorkshopStatus::Completed | WorkshopStatus::Cancelled
        ) {
            return Err(TransitionError::new(Self::ENTITY, self.status, "cancelled"));
        }
        self.status = WorkshopStatus::Cancelled;
        self.updated_at = now;
        Ok(())
    }
}
