use atelier_db::models::{
    EnrollmentStatus, SessionStatus, Workshop, WorkshopEnrollment, WorkshopSession,
};
use bson::{DateTime, oid::ObjectId};
use serde::Serialize;
use tracing::info;

use super::{WorkshopError, WorkshopResult, WorkshopService, not_found};
use crate::dao::DaoError;
use crate::xp::XpSource;

/// Where a join code landed the caller. Workshop codes prefer a live
/// session when one is running; session codes go straight to the session.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JoinOutcome {
    Workshop {
        workshop: Workshop,
        enrollment: WorkshopEnrollment,
    },
    LiveSession {
        workshop: Workshop,
        session: WorkshopSession,
        enrollment: WorkshopEnrollment,
    },
    Session {
        session: WorkshopSession,
        enrollment: WorkshopEnrollment,
    },
}

impl WorkshopService {
    /// Resolve a join code of either flavor. Workshop codes are tried first;
    /// only a miss falls through to session codes, so a failed workshop-side
    /// check (a cancelled workshop, say) surfaces rather than being masked.
    pub async fn join_by_code(
        &self,
        user_id: ObjectId,
        raw_code: &str,
    ) -> WorkshopResult<JoinOutcome> {
        let code = normalize_code(raw_code)?;

        if let Some(workshop) = self.workshops.find_by_code(&code).await? {
            let workshop_id = workshop.id.expect("persisted workshop has an id");
            let enrollment = self.ensure_enrollment(user_id, &workshop).await?;

            if let Some(session) = self.sessions.find_live_by_workshop(workshop_id).await? {
                let session_id = session.id.expect("persisted session has an id");
                let enrollment = self.record_attendance(&enrollment, session_id).await?;
                info!(%user_id, %code, %session_id, "Joined live session via workshop code");
                return Ok(JoinOutcome::LiveSession {
                    workshop,
                    session,
                    enrollment,
                });
            }

            info!(%user_id, %code, %workshop_id, "Joined workshop via code");
            return Ok(JoinOutcome::Workshop {
                workshop,
                enrollment,
            });
        }

        let session = self
            .sessions
            .find_by_code(&code)
            .await?
            .ok_or(WorkshopError::NotFound("join code"))?;
        if !session.is_code_valid(DateTime::now()) {
            return Err(WorkshopError::CodeExpired);
        }
        // A finished or cancelled session keeps its code in the collection
        // but no longer admits anyone.
        if matches!(
            session.status,
            SessionStatus::Completed | SessionStatus::Cancelled
        ) {
            return Err(WorkshopError::InvalidState(
                "session is not available".into(),
            ));
        }

        let workshop = self
            .workshops
            .base
            .find_by_id(session.workshop_id)
            .await
            .map_err(not_found("workshop"))?;
        let enrollment = self.ensure_enrollment(user_id, &workshop).await?;
        let session_id = session.id.expect("persisted session has an id");
        let enrollment = self.record_attendance(&enrollment, session_id).await?;

        info!(%user_id, %code, %session_id, "Joined session via code");
        Ok(JoinOutcome::Session {
            session,
            enrollment,
        })
    }

    /// Join a specific live session directly (from inside the workshop UI).
    pub async fn join_session(
        &self,
        user_id: ObjectId,
        session_id: ObjectId,
    ) -> WorkshopResult<WorkshopSession> {
        let session = self
            .sessions
            .base
            .find_by_id(session_id)
            .await
            .map_err(not_found("session"))?;
        if session.status != SessionStatus::Live {
            return Err(WorkshopError::InvalidState("session is not live".into()));
        }

        let enrollment = self
            .enrollments
            .find_by_user_and_workshop(user_id, session.workshop_id)
            .await?
            .ok_or_else(|| WorkshopError::Forbidden("not enrolled in this workshop".into()))?;
        if enrollment.status != EnrollmentStatus::Confirmed {
            return Err(WorkshopError::Forbidden(
                "enrollment is not confirmed".into(),
            ));
        }

        self.record_attendance(&enrollment, session_id).await?;
        Ok(session)
    }

    /// The enrollment backing a join: reuse an existing one, otherwise
    /// quick-enroll the user with immediate confirmation. Quick enrollment
    /// skips registration-window, capacity and prerequisite checks.
    async fn ensure_enrollment(
        &self,
        user_id: ObjectId,
        workshop: &Workshop,
    ) -> WorkshopResult<WorkshopEnrollment> {
        let workshop_id = workshop.id.expect("persisted workshop has an id");
        if let Some(existing) = self
            .enrollments
            .find_by_user_and_workshop(user_id, workshop_id)
            .await?
        {
            return Ok(existing);
        }

        let now = DateTime::now();
        let mut enrollment = WorkshopEnrollment::new(workshop_id, user_id, now);
        enrollment.confirm(now)?;

        match self.enrollments.base.insert_one(&enrollment).await {
            Ok(id) => {
                enrollment.id = Some(id);
                self.workshops.inc_enrollment_count(workshop_id, 1).await?;
                self.xp
                    .award(
                        user_id,
                        self.settings.quick_join_xp,
                        XpSource::WorkshopEnrollment,
                        workshop_id,
                    )
                    .await?;
                info!(%user_id, %workshop_id, "Quick-enrolled via join code");
                Ok(enrollment)
            }
            // Lost a race with a concurrent join; the other one counts.
            Err(DaoError::DuplicateKey(_)) => self
                .enrollments
                .find_by_user_and_workshop(user_id, workshop_id)
                .await?
                .ok_or(WorkshopError::NotFound("enrollment")),
            Err(e) => Err(e.into()),
        }
    }

    /// Mark the session attended on the enrollment and grant attendance XP
    /// for a first visit. Runs under the enrollment lock.
    async fn record_attendance(
        &self,
        enrollment: &WorkshopEnrollment,
        session_id: ObjectId,
    ) -> WorkshopResult<WorkshopEnrollment> {
        let enrollment_id = enrollment.id.expect("persisted enrollment has an id");
        let _guard = self.locks.acquire(enrollment_id).await;

        let mut enrollment = self
            .enrollments
            .base
            .find_by_id(enrollment_id)
            .await
            .map_err(not_found("enrollment"))?;

        let first_visit = !enrollment.progress.sessions_attended.contains(&session_id);
        enrollment.add_attendance(session_id, DateTime::now());
        self.enrollments
            .base
            .replace_by_id(enrollment_id, &enrollment)
            .await?;

        if first_visit {
            self.xp
                .award(
                    enrollment.user_id,
                    self.settings.quick_join_xp,
                    XpSource::WorkshopAttendance,
                    session_id,
                )
                .await?;
        }
        Ok(enrollment)
    }
}

fn normalize_code(raw: &str) -> WorkshopResult<String> {
    let code = raw.trim().to_uppercase();
    if code.is_empty() {
        return Err(WorkshopError::Validation("join code is required".into()));
    }
    Ok(code)
}
