use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// Display colors cycled through as teams are created within a workshop.
pub const TEAM_COLORS: [&str; 6] = ["red", "blue", "green", "yellow", "purple", "orange"];

pub fn team_color(team_index: usize) -> &'static str {
    TEAM_COLORS[team_index % TEAM_COLORS.len()]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkshopTeam {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub workshop_id: ObjectId,
    pub name: String,
    pub color: String,
    pub motto: Option<String>,
    #[serde(default)]
    pub member_count: u32,
    #[serde(default)]
    pub stats: TeamStats,
    #[serde(default)]
    pub achievements: Vec<String>,
    #[serde(default)]
    pub battle_history: Vec<BattleRecord>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TeamStats {
    #[serde(default)]
    pub total_points: u64,
    #[serde(default)]
    pub total_xp: u64,
    #[serde(default)]
    pub challenges_won: u32,
    #[serde(default)]
    pub activities_completed: u32,
    #[serde(default)]
    pub average_score: f64,
    pub rank: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleRecord {
    pub activity_id: ObjectId,
    pub opponent_team_id: Option<ObjectId>,
    pub our_score: f64,
    pub their_score: Option<f64>,
    pub won: bool,
    pub bonus_points: u32,
}

impl WorkshopTeam {
    pub const COLLECTION: &'static str = "workshop_teams";

    pub fn new(workshop_id: ObjectId, name: String, color: String, now: DateTime) -> Self {
        Self {
            id: None,
            workshop_id,
            name,
            color,
            motto: None,
            member_count: 0,
            stats: TeamStats::default(),
            achievements: Vec::new(),
            battle_history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn add_points(&mut self, points: u32, xp: u32) {
        self.stats.total_points += points as u64;
        self.stats.total_xp += xp as u64;
    }
}
