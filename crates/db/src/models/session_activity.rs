use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

use super::TransitionError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionActivity {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub session_id: ObjectId,
    /// Denormalized back-reference so enrollment checks skip a session load.
    pub workshop_id: ObjectId,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub activity_type: ActivityType,
    #[serde(default)]
    pub status: ActivityStatus,
    pub scheduled_start: Option<DateTime>,
    pub duration_minutes: u32,
    pub points: u32,
    /// `floor(points * 1.5)`, fixed at creation.
    pub xp_reward: u32,
    #[serde(default)]
    pub config: ActivityConfig,
    #[serde(default)]
    pub results: ActivityResults,
    /// Present only while the activity is Active.
    pub live: Option<LiveProjection>,
    pub actual_start_time: Option<DateTime>,
    pub actual_end_time: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    #[default]
    Quiz,
    Poll,
    CodeChallenge,
    TeamBattle,
    Discussion,
}

impl ActivityType {
    /// The snake_case name used as the key in per-workshop point tables.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Quiz => "quiz",
            ActivityType::Poll => "poll",
            ActivityType::CodeChallenge => "code_challenge",
            ActivityType::TeamBattle => "team_battle",
            ActivityType::Discussion => "discussion",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    #[default]
    Pending,
    Active,
    Completed,
    Cancelled,
}

/// Type-specific configuration; unused fields stay empty for other types.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ActivityConfig {
    #[serde(default)]
    pub correct_answers: Vec<String>,
    #[serde(default)]
    pub options: Vec<String>,
    pub prompt: Option<String>,
}

/// A participant's submission payload; which fields matter depends on the
/// activity type.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ActivityResponse {
    #[serde(default)]
    pub answers: Vec<String>,
    pub text: Option<String>,
    pub code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ActivityResults {
    #[serde(default)]
    pub participants: Vec<ActivityParticipant>,
    pub summary: Option<ActivitySummary>,
    /// Populated at completion for TeamBattle activities only.
    #[serde(default)]
    pub team_results: Vec<TeamResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityParticipant {
    pub user_id: ObjectId,
    pub team_id: Option<ObjectId>,
    pub joined_at: DateTime,
    pub submitted_at: Option<DateTime>,
    pub response: Option<ActivityResponse>,
    pub score: Option<f64>,
    pub time_spent_secs: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub participant_count: u32,
    pub average_score: f64,
    pub top_scorers: Vec<TopScorer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopScorer {
    pub user_id: ObjectId,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamResult {
    pub team_id: ObjectId,
    pub average_score: f64,
    pub rank: u32,
    pub bonus_points: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LiveProjection {
    pub active_participants: u32,
    pub submitted_count: u32,
    pub average_time_secs: f64,
    pub current_leader: Option<ObjectId>,
}

pub fn xp_for_points(points: u32) -> u32 {
    points * 3 / 2
}

impl SessionActivity {
    pub const COLLECTION: &'static str = "session_activities";
    const ENTITY: &'static str = "activity";

    pub fn start(&mut self, now: DateTime) -> Result<(), TransitionError> {
        if self.status != ActivityStatus::Pending {
            return Err(TransitionError::new(Self::ENTITY, self.status, "active"));
        }
        self.status = ActivityStatus::Active;
        self.actual_start_time = Some(now);
        self.live = Some(LiveProjection::default());
        self.updated_at = now;
        Ok(())
    }

    /// Transition to Completed and compute the results summary. Team-battle
    /// results are layered on by the caller, which knows the bonus table.
    pub fn complete(&mut self, now: DateTime) -> Result<(), TransitionError> {
        if self.status != ActivityStatus::Active {
            return Err(TransitionError::new(Self::ENTITY, self.status, "completed"));
        }
        self.status = ActivityStatus::Completed;
        self.actual_end_time = Some(now);
        self.results.summary = Some(self.compute_summary());
        self.live = None;
        self.updated_at = now;
        Ok(())
    }

    pub fn cancel(&mut self, now: DateTime) -> Result<(), TransitionError> {
        if self.status == ActivityStatus::Completed {
            return Err(TransitionError::new(Self::ENTITY, self.status, "cancelled"));
        }
        self.status = ActivityStatus::Cancelled;
        self.live = None;
        self.updated_at = now;
        Ok(())
    }

    /// Register a participant, recording `joined_at`. No-op when present.
    pub fn add_participant(&mut self, user_id: ObjectId, team_id: Option<ObjectId>, now: DateTime) {
        if self
            .results
            .participants
            .iter()
            .any(|p| p.user_id == user_id)
        {
            return;
        }
        self.results.participants.push(ActivityParticipant {
            user_id,
            team_id,
            joined_at: now,
            submitted_at: None,
            response: None,
            score: None,
            time_spent_secs: None,
        });
        if let Some(live) = self.live.as_mut() {
            live.active_participants += 1;
        }
    }

    /// Record (or overwrite) a participant's submission and refresh the live
    /// projection. The participant must already be registered.
    pub fn record_submission(
        &mut self,
        user_id: ObjectId,
        response: ActivityResponse,
        score: f64,
        now: DateTime,
    ) {
        if let Some(entry) = self
            .results
            .participants
            .iter_mut()
            .find(|p| p.user_id == user_id)
        {
            entry.submitted_at = Some(now);
            entry.time_spent_secs =
                Some((now.timestamp_millis() - entry.joined_at.timestamp_millis()) / 1000);
            entry.response = Some(response);
            entry.score = Some(score);
        }
        self.refresh_live();
        self.updated_at = now;
    }

    fn refresh_live(&mut self) {
        let Some(live) = self.live.as_mut() else {
            return;
        };

        let submitted: Vec<&ActivityParticipant> = self
            .results
            .participants
            .iter()
            .filter(|p| p.submitted_at.is_some())
            .collect();

        live.submitted_count = submitted.len() as u32;
        let times: Vec<i64> = submitted.iter().filter_map(|p| p.time_spent_secs).collect();
        live.average_time_secs = if times.is_empty() {
            0.0
        } else {
            times.iter().sum::<i64>() as f64 / times.len() as f64
        };

        // Leader: highest score, first-found wins on ties.
        let mut leader: Option<(ObjectId, f64)> = None;
        for p in &submitted {
            if let Some(score) = p.score {
                if leader.map_or(true, |(_, best)| score > best) {
                    leader = Some((p.user_id, score));
                }
            }
        }
        live.current_leader = leader.map(|(id, _)| id);
    }

    fn compute_summary(&self) -> ActivitySummary {
        let scored: Vec<&ActivityParticipant> = self
            .results
            .participants
            .iter()
            .filter(|p| p.submitted_at.is_some() && p.score.is_some())
            .collect();

        let average_score = if scored.is_empty() {
            0.0
        } else {
            scored.iter().filter_map(|p| p.score).sum::<f64>() / scored.len() as f64
        };

        // Stable sort keeps encounter order for equal scores.
        let mut ranked = scored;
        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        ActivitySummary {
            participant_count: self.results.participants.len() as u32,
            average_score,
            top_scorers: ranked
                .into_iter()
                .take(3)
                .map(|p| TopScorer {
                    user_id: p.user_id,
                    score: p.score.unwrap_or(0.0),
                })
                .collect(),
        }
    }
}
