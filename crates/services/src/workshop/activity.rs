use atelier_db::models::{
    ActivityConfig, ActivityResponse, ActivityStatus, ActivityType, BattleRecord, SessionActivity,
    TeamResult, WorkshopSession, xp_for_points,
};
use bson::{DateTime, oid::ObjectId};
use chrono::{DateTime as ChronoDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{CreateSession, WorkshopError, WorkshopResult, WorkshopService, not_found};
use crate::ranking::team_battle_results;
use crate::scoring::score_response;
use crate::xp::XpSource;

#[derive(Debug, Deserialize)]
pub struct CreateActivity {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub activity_type: ActivityType,
    pub scheduled_start: Option<ChronoDateTime<Utc>>,
    #[serde(default = "default_duration")]
    pub duration_minutes: u32,
    /// Overrides the workshop's per-type point table.
    pub points: Option<u32>,
    #[serde(default)]
    pub config: ActivityConfig,
}

fn default_duration() -> u32 {
    10
}

/// What a submission earned. Points and XP are zero on repeat submissions;
/// only the first completion pays out.
#[derive(Debug, Serialize)]
pub struct SubmitResult {
    pub score: f64,
    pub points_awarded: u32,
    pub xp_awarded: u32,
    pub first_completion: bool,
}

impl WorkshopService {
    pub async fn create_session(
        &self,
        instructor_id: ObjectId,
        workshop_id: ObjectId,
        input: CreateSession,
    ) -> WorkshopResult<WorkshopSession> {
        let workshop = self.get_workshop(workshop_id).await?;
        self.require_instructor(&workshop, instructor_id)?;

        let sequence = self.sessions.next_sequence(workshop_id).await?;
        let session = self.new_session(
            &workshop,
            input.title,
            input.description,
            input.session_type,
            sequence,
            DateTime::from_chrono(input.scheduled_start),
            DateTime::from_chrono(input.scheduled_end),
            input.lead_instructor_id.or(Some(instructor_id)),
        );
        let session = self
            .sessions
            .create(session, |s| self.stamp_fresh_code(s))
            .await?;
        info!(workshop_id = %workshop_id, code = %session.join_code, "Created session");
        Ok(session)
    }

    /// Issue a fresh join code, restarting the expiry window. The old code
    /// stops resolving immediately.
    pub async fn regenerate_session_code(
        &self,
        instructor_id: ObjectId,
        session_id: ObjectId,
    ) -> WorkshopResult<WorkshopSession> {
        let _guard = self.locks.acquire(session_id).await;
        let mut session = self
            .sessions
            .base
            .find_by_id(session_id)
            .await
            .map_err(not_found("session"))?;
        self.require_session_instructor(&session, instructor_id).await?;

        session.set_join_code(
            self.codes.session_code(chrono::Datelike::year(&Utc::now())),
            DateTime::now(),
            self.settings.session_code_ttl_hours,
        );
        self.sessions.base.replace_by_id(session_id, &session).await?;
        Ok(session)
    }

    pub async fn start_session(
        &self,
        instructor_id: ObjectId,
        session_id: ObjectId,
    ) -> WorkshopResult<WorkshopSession> {
        let _guard = self.locks.acquire(session_id).await;
        let mut session = self
            .sessions
            .base
            .find_by_id(session_id)
            .await
            .map_err(not_found("session"))?;
        self.require_session_instructor(&session, instructor_id).await?;

        session.start(DateTime::now())?;
        self.sessions.base.replace_by_id(session_id, &session).await?;

        for enrollment in self
            .enrollments
            .find_confirmed_by_workshop(session.workshop_id)
            .await?
        {
            self.notifier.session_start(enrollment.user_id, &session).await;
        }
        info!(%session_id, "Session is live");
        Ok(session)
    }

    pub async fn end_session(
        &self,
        instructor_id: ObjectId,
        session_id: ObjectId,
    ) -> WorkshopResult<WorkshopSession> {
        let _guard = self.locks.acquire(session_id).await;
        let mut session = self
            .sessions
            .base
            .find_by_id(session_id)
            .await
            .map_err(not_found("session"))?;
        self.require_session_instructor(&session, instructor_id).await?;

        session.end(DateTime::now())?;
        self.sessions.base.replace_by_id(session_id, &session).await?;
        info!(%session_id, "Session ended");
        Ok(session)
    }

    pub async fn create_activity(
        &self,
        instructor_id: ObjectId,
        session_id: ObjectId,
        input: CreateActivity,
    ) -> WorkshopResult<SessionActivity> {
        let session = self
            .sessions
            .base
            .find_by_id(session_id)
            .await
            .map_err(not_found("session"))?;
        let workshop = self.get_workshop(session.workshop_id).await?;
        self.require_instructor(&workshop, instructor_id)?;

        let points = input.points.unwrap_or_else(|| {
            workshop
                .gamification
                .activity_points
                .get(input.activity_type.as_str())
                .copied()
                .unwrap_or(100)
        });

        let now = DateTime::now();
        let mut activity = SessionActivity {
            id: None,
            session_id,
            workshop_id: session.workshop_id,
            title: input.title,
            description: input.description,
            activity_type: input.activity_type,
            status: ActivityStatus::Pending,
            scheduled_start: input.scheduled_start.map(DateTime::from_chrono),
            duration_minutes: input.duration_minutes,
            points,
            xp_reward: xp_for_points(points),
            config: input.config,
            results: Default::default(),
            live: None,
            actual_start_time: None,
            actual_end_time: None,
            created_at: now,
            updated_at: now,
        };
        let id = self.activities.base.insert_one(&activity).await?;
        activity.id = Some(id);
        Ok(activity)
    }

    pub async fn start_activity(
        &self,
        instructor_id: ObjectId,
        activity_id: ObjectId,
    ) -> WorkshopResult<SessionActivity> {
        let _guard = self.locks.acquire(activity_id).await;
        let mut activity = self
            .activities
            .base
            .find_by_id(activity_id)
            .await
            .map_err(not_found("activity"))?;
        let workshop = self.get_workshop(activity.workshop_id).await?;
        self.require_instructor(&workshop, instructor_id)?;

        activity.start(DateTime::now())?;
        self.activities
            .base
            .replace_by_id(activity_id, &activity)
            .await?;

        // Tell everyone who has shown up to the session.
        for enrollment in self
            .enrollments
            .find_confirmed_by_workshop(activity.workshop_id)
            .await?
        {
            if enrollment
                .progress
                .sessions_attended
                .contains(&activity.session_id)
            {
                self.notifier.activity_start(enrollment.user_id, &activity).await;
            }
        }
        info!(%activity_id, "Activity started");
        Ok(activity)
    }

    /// Grade and record a submission. First completion pays points and XP
    /// to the enrollment (and the member's team); later submissions only
    /// overwrite the recorded response.
    pub async fn submit_response(
        &self,
        user_id: ObjectId,
        activity_id: ObjectId,
        response: ActivityResponse,
    ) -> WorkshopResult<SubmitResult> {
        let _activity_guard = self.locks.acquire(activity_id).await;

        let mut activity = self
            .activities
            .base
            .find_by_id(activity_id)
            .await
            .map_err(not_found("activity"))?;
        if activity.status != ActivityStatus::Active {
            return Err(WorkshopError::InvalidState("activity is not active".into()));
        }

        let enrollment = self
            .enrollments
            .find_by_user_and_workshop(user_id, activity.workshop_id)
            .await?
            .ok_or_else(|| WorkshopError::Forbidden("not enrolled in this workshop".into()))?;
        let enrollment_id = enrollment.id.expect("persisted enrollment has an id");

        let now = DateTime::now();
        activity.add_participant(user_id, enrollment.team_id, now);
        let score = score_response(activity.activity_type, &activity.config, &response);
        activity.record_submission(user_id, response, score, now);
        self.activities
            .base
            .replace_by_id(activity_id, &activity)
            .await?;

        let _enrollment_guard = self.locks.acquire(enrollment_id).await;
        let mut enrollment = self
            .enrollments
            .base
            .find_by_id(enrollment_id)
            .await
            .map_err(not_found("enrollment"))?;

        let first_completion = !enrollment
            .progress
            .activities_completed
            .contains(&activity_id);
        let (mut points_awarded, mut xp_awarded) = (0, 0);

        if first_completion {
            enrollment.progress.activities_completed.push(activity_id);
            enrollment.add_points(activity.points, activity.xp_reward);
            points_awarded = activity.points;
            xp_awarded = activity.xp_reward;

            match activity.activity_type {
                ActivityType::Quiz => {
                    enrollment
                        .performance
                        .quiz_scores
                        .insert(activity_id.to_hex(), score);
                }
                ActivityType::CodeChallenge => {
                    enrollment
                        .performance
                        .challenge_scores
                        .insert(activity_id.to_hex(), score);
                }
                _ => {
                    enrollment.performance.participation_score += score;
                }
            }
        }
        enrollment.updated_at = now;
        self.enrollments
            .base
            .replace_by_id(enrollment_id, &enrollment)
            .await?;

        if first_completion {
            self.xp
                .award(user_id, activity.xp_reward, XpSource::WorkshopActivity, activity_id)
                .await?;

            if let Some(team_id) = enrollment.team_id {
                let _team_guard = self.locks.acquire(team_id).await;
                let mut team = self
                    .teams
                    .base
                    .find_by_id(team_id)
                    .await
                    .map_err(not_found("team"))?;
                team.add_points(activity.points, activity.xp_reward);
                team.stats.activities_completed += 1;
                team.updated_at = now;
                self.teams.base.replace_by_id(team_id, &team).await?;
            }
        }

        info!(%user_id, %activity_id, score, first_completion, "Recorded submission");
        Ok(SubmitResult {
            score,
            points_awarded,
            xp_awarded,
            first_completion,
        })
    }

    /// Close an activity: freeze the summary and, for team battles, rank the
    /// teams and pay rank bonuses into their stats and battle history.
    pub async fn complete_activity(
        &self,
        instructor_id: ObjectId,
        activity_id: ObjectId,
    ) -> WorkshopResult<SessionActivity> {
        let _guard = self.locks.acquire(activity_id).await;
        let mut activity = self
            .activities
            .base
            .find_by_id(activity_id)
            .await
            .map_err(not_found("activity"))?;
        let workshop = self.get_workshop(activity.workshop_id).await?;
        self.require_instructor(&workshop, instructor_id)?;

        activity.complete(DateTime::now())?;

        if activity.activity_type == ActivityType::TeamBattle {
            let results = team_battle_results(
                &activity.results.participants,
                &workshop.gamification.bonus_points,
            );
            activity.results.team_results = results.clone();
            self.apply_battle_results(activity_id, &results).await?;
        }

        self.activities
            .base
            .replace_by_id(activity_id, &activity)
            .await?;
        info!(%activity_id, "Activity completed");
        Ok(activity)
    }

    async fn apply_battle_results(
        &self,
        activity_id: ObjectId,
        results: &[TeamResult],
    ) -> WorkshopResult<()> {
        let now = DateTime::now();
        for result in results {
            // Head-to-head fields only make sense for two-team battles.
            let opponent = (results.len() == 2)
                .then(|| results.iter().find(|r| r.team_id != result.team_id))
                .flatten();

            let _team_guard = self.locks.acquire(result.team_id).await;
            let mut team = self
                .teams
                .base
                .find_by_id(result.team_id)
                .await
                .map_err(not_found("team"))?;
            team.add_points(result.bonus_points, 0);
            if result.rank == 1 {
                team.stats.challenges_won += 1;
            }
            team.stats.rank = Some(result.rank);
            team.stats.average_score = result.average_score;
            team.battle_history.push(BattleRecord {
                activity_id,
                opponent_team_id: opponent.map(|o| o.team_id),
                our_score: result.average_score,
                their_score: opponent.map(|o| o.average_score),
                won: result.rank == 1,
                bonus_points: result.bonus_points,
            });
            team.updated_at = now;
            self.teams.base.replace_by_id(result.team_id, &team).await?;
        }
        Ok(())
    }

    pub async fn get_activity(&self, activity_id: ObjectId) -> WorkshopResult<SessionActivity> {
        self.activities
            .base
            .find_by_id(activity_id)
            .await
            .map_err(not_found("activity"))
    }

    pub async fn list_activities(
        &self,
        session_id: ObjectId,
    ) -> WorkshopResult<Vec<SessionActivity>> {
        Ok(self.activities.find_by_session(session_id).await?)
    }

    async fn require_session_instructor(
        &self,
        session: &WorkshopSession,
        user_id: ObjectId,
    ) -> WorkshopResult<()> {
        if session.lead_instructor_id == Some(user_id) {
            return Ok(());
        }
        let workshop = self.get_workshop(session.workshop_id).await?;
        self.require_instructor(&workshop, user_id)
    }
}
