use std::collections::HashMap;

use atelier_db::models::{EnrollmentStatus, Workshop, WorkshopEnrollment, WorkshopTeam};
use bson::{DateTime, oid::ObjectId};
use serde::Serialize;
use tracing::info;

use super::{WorkshopError, WorkshopResult, WorkshopService, badge_points, not_found};
use crate::ranking::rank_by_points;
use crate::xp::XpSource;

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardRow {
    pub user_id: ObjectId,
    pub enrollment_id: ObjectId,
    pub total_points: u64,
    pub total_xp: u64,
    pub rank: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamRow {
    pub team_id: ObjectId,
    pub name: String,
    pub total_points: u64,
    pub rank: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardView {
    pub individual: Vec<LeaderboardRow>,
    /// Present only when the workshop has teams enabled.
    pub teams: Option<Vec<TeamRow>>,
}

/// Rank entries are built straight off the repository scan, so tied point
/// totals keep their scan position through the stable rank sort.
fn enrollment_entries(enrollments: &[WorkshopEnrollment]) -> Vec<(ObjectId, u64)> {
    enrollments
        .iter()
        .filter_map(|e| e.id.map(|id| (id, e.progress.total_points)))
        .collect()
}

fn team_entries(teams: &[WorkshopTeam]) -> Vec<(ObjectId, u64)> {
    teams
        .iter()
        .filter_map(|t| t.id.map(|id| (id, t.stats.total_points)))
        .collect()
}

impl WorkshopService {
    /// Rebuild the leaderboard from confirmed enrollments and persist the
    /// assigned ranks. Runs under the workshop lock so two rebuilds cannot
    /// interleave their rank write-backs.
    pub async fn leaderboard(&self, workshop_id: ObjectId) -> WorkshopResult<LeaderboardView> {
        let _guard = self.locks.acquire(workshop_id).await;
        let workshop = self.get_workshop(workshop_id).await?;
        if !workshop.gamification.enable_leaderboard {
            return Err(WorkshopError::InvalidState(
                "leaderboard is disabled for this workshop".into(),
            ));
        }
        self.rank_pass(&workshop).await
    }

    /// The freeze-rank-publish pass shared by the leaderboard endpoint and
    /// the completion flow. The caller holds the workshop lock.
    async fn rank_pass(&self, workshop: &Workshop) -> WorkshopResult<LeaderboardView> {
        let workshop_id = workshop.id.expect("persisted workshop has an id");
        let enrollments = self.enrollments.find_confirmed_by_workshop(workshop_id).await?;
        let ranked = rank_by_points(enrollment_entries(&enrollments));
        let mut by_id: HashMap<ObjectId, WorkshopEnrollment> = enrollments
            .into_iter()
            .filter_map(|e| e.id.map(|id| (id, e)))
            .collect();

        let mut individual = Vec::with_capacity(ranked.len());
        for entry in ranked {
            let Some(enrollment) = by_id.get_mut(&entry.id) else {
                continue;
            };
            enrollment.progress.rank = Some(entry.rank);
            self.enrollments
                .base
                .update_by_id(
                    entry.id,
                    bson::doc! { "$set": { "progress.rank": entry.rank } },
                )
                .await?;
            individual.push(LeaderboardRow {
                user_id: enrollment.user_id,
                enrollment_id: entry.id,
                total_points: entry.points,
                total_xp: enrollment.progress.total_xp,
                rank: entry.rank,
            });
        }

        let teams = if workshop.gamification.enable_teams {
            Some(self.team_rank_pass(workshop_id).await?)
        } else {
            None
        };

        Ok(LeaderboardView { individual, teams })
    }

    async fn team_rank_pass(&self, workshop_id: ObjectId) -> WorkshopResult<Vec<TeamRow>> {
        let teams = self.teams.find_by_workshop(workshop_id).await?;
        let ranked = rank_by_points(team_entries(&teams));
        let mut by_id: HashMap<ObjectId, WorkshopTeam> = teams
            .into_iter()
            .filter_map(|t| t.id.map(|id| (id, t)))
            .collect();

        let mut rows = Vec::with_capacity(ranked.len());
        for entry in ranked {
            let Some(team) = by_id.get_mut(&entry.id) else {
                continue;
            };
            team.stats.rank = Some(entry.rank);
            self.teams
                .base
                .update_by_id(
                    entry.id,
                    bson::doc! { "$set": { "stats.rank": entry.rank } },
                )
                .await?;
            rows.push(TeamRow {
                team_id: entry.id,
                name: team.name.clone(),
                total_points: entry.points,
                rank: entry.rank,
            });
        }
        Ok(rows)
    }

    /// The instructor's completion pass: finalize ranks, transition every
    /// confirmed enrollment, unlock achievements, issue certificates and pay
    /// out the workshop XP reward.
    pub async fn complete_workshop(
        &self,
        instructor_id: ObjectId,
        workshop_id: ObjectId,
    ) -> WorkshopResult<Workshop> {
        let mut workshop = self.get_workshop(workshop_id).await?;
        self.require_instructor(&workshop, instructor_id)?;
        let now = DateTime::now();

        // Final standings always run, leaderboard toggle or not; the
        // achievement rules below key off the persisted ranks. The workshop
        // lock is released before the per-enrollment passes take their own
        // locks.
        let team_ranks: HashMap<ObjectId, u32> = {
            let _guard = self.locks.acquire(workshop_id).await;
            workshop.complete(now);
            self.workshops.base.replace_by_id(workshop_id, &workshop).await?;
            self.rank_pass(&workshop)
                .await?
                .teams
                .unwrap_or_default()
                .into_iter()
                .map(|t| (t.team_id, t.rank))
                .collect()
        };

        let total_sessions = self.sessions.find_by_workshop(workshop_id).await?.len();
        let enrollments = self.enrollments.find_confirmed_by_workshop(workshop_id).await?;
        let mut completed = 0u32;

        for enrollment in enrollments {
            let Some(enrollment_id) = enrollment.id else {
                continue;
            };
            let _guard = self.locks.acquire(enrollment_id).await;
            let mut enrollment = self
                .enrollments
                .base
                .find_by_id(enrollment_id)
                .await
                .map_err(not_found("enrollment"))?;
            if enrollment.status != EnrollmentStatus::Confirmed {
                continue;
            }

            enrollment.complete(now)?;
            self.grant_achievements(&workshop, &mut enrollment, total_sessions, &team_ranks, now);

            enrollment.certificate_issued_at = Some(now);
            let url = self
                .certificates
                .url_for(workshop_id, enrollment.user_id);
            enrollment.certificate_url = Some(url.clone());

            self.enrollments
                .base
                .replace_by_id(enrollment_id, &enrollment)
                .await?;

            self.notifier
                .workshop_completion(enrollment.user_id, &workshop, Some(&url))
                .await;
            self.xp
                .award(
                    enrollment.user_id,
                    workshop.total_xp_reward,
                    XpSource::WorkshopCompletion,
                    workshop_id,
                )
                .await?;
            completed += 1;
        }

        info!(%workshop_id, completed, "Completed workshop");
        Ok(workshop)
    }

    fn grant_achievements(
        &self,
        workshop: &Workshop,
        enrollment: &mut WorkshopEnrollment,
        total_sessions: usize,
        team_ranks: &HashMap<ObjectId, u32>,
        now: DateTime,
    ) {
        enrollment.unlock_achievement(
            "workshop-completion",
            badge_points(workshop, "workshop-completion", 500),
            now,
        );

        if (enrollment.attendance_rate(total_sessions) - 100.0).abs() < f64::EPSILON {
            enrollment.unlock_achievement(
                "perfect-attendance",
                badge_points(workshop, "perfect-attendance", 200),
                now,
            );
        }

        if enrollment.progress.rank.is_some_and(|r| r <= 3) {
            enrollment.unlock_achievement(
                "top-performer",
                badge_points(workshop, "top-performer", 300),
                now,
            );
        }

        if let Some(team_id) = enrollment.team_id {
            if team_ranks.get(&team_id) == Some(&1) {
                enrollment.unlock_achievement(
                    "team-champion",
                    badge_points(workshop, "team-champion", 400),
                    now,
                );
            }
        }
    }
}
