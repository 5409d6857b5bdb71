mod activity;
mod join;
mod rewards;

pub use activity::{CreateActivity, SubmitResult};
pub use join::JoinOutcome;
pub use rewards::{LeaderboardRow, LeaderboardView, TeamRow};

use atelier_config::GamificationSettings;
use atelier_db::models::{
    Badge, GamificationConfig, PaymentDetails, Prerequisites, RankBonusTable, SessionType,
    TransitionError, Workshop, WorkshopEnrollment, WorkshopSession, WorkshopStatus, WorkshopTeam,
    WorkshopTier, WorkshopType, team_color,
};
use atelier_db::models::workshop_session::expiry_from;
use bson::{DateTime, oid::ObjectId};
use chrono::{DateTime as ChronoDateTime, Datelike, Utc};
use mongodb::Database;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::certificate::CertificateService;
use crate::codegen::CodeGenerator;
use crate::dao::{
    ActivityDao, DaoError, EnrollmentDao, PaginatedResult, PaginationParams, SessionDao, TeamDao,
    UserDao, WorkshopDao,
};
use crate::locks::LockRegistry;
use crate::notify::NotificationService;
use crate::xp::{XpService, XpSource};

#[derive(Debug, Error)]
pub enum WorkshopError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Already enrolled in this workshop")]
    AlreadyEnrolled,
    #[error("Prerequisite not met: {0}")]
    PrerequisiteNotMet(String),
    #[error("Join code expired")]
    CodeExpired,
    #[error("Validation: {0}")]
    Validation(String),
    #[error(transparent)]
    Dao(#[from] DaoError),
}

pub type WorkshopResult<T> = Result<T, WorkshopError>;

/// Maps a DAO-level miss onto a named entity for the caller.
fn not_found(entity: &'static str) -> impl FnOnce(DaoError) -> WorkshopError {
    move |e| match e {
        DaoError::NotFound => WorkshopError::NotFound(entity),
        other => WorkshopError::Dao(other),
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateWorkshop {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub workshop_type: WorkshopType,
    #[serde(default)]
    pub tier: WorkshopTier,
    pub start_date: ChronoDateTime<Utc>,
    pub end_date: ChronoDateTime<Utc>,
    pub max_participants: u32,
    pub price: Option<f64>,
    #[serde(default)]
    pub gamification: GamificationConfig,
    pub total_xp_reward: Option<u32>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub learning_outcomes: Vec<String>,
    pub prerequisites: Option<Prerequisites>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateWorkshop {
    pub title: Option<String>,
    pub description: Option<String>,
    pub max_participants: Option<u32>,
    pub price: Option<f64>,
    pub total_xp_reward: Option<u32>,
    pub requirements: Option<Vec<String>>,
    pub learning_outcomes: Option<Vec<String>>,
    pub gamification: Option<GamificationPatch>,
}

/// Partial gamification update; absent fields keep their current values.
#[derive(Debug, Deserialize, Default)]
pub struct GamificationPatch {
    pub enable_teams: Option<bool>,
    pub enable_leaderboard: Option<bool>,
    pub team_size: Option<u32>,
    pub activity_points: Option<std::collections::HashMap<String, u32>>,
    pub bonus_points: Option<RankBonusTable>,
}

#[derive(Debug, Deserialize, Default)]
pub struct EnrollRequest {
    pub team_preference: Option<String>,
    pub payment: Option<PaymentInput>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentInput {
    pub method: String,
    pub amount: f64,
    pub transaction_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSession {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub session_type: SessionType,
    pub scheduled_start: ChronoDateTime<Utc>,
    pub scheduled_end: ChronoDateTime<Utc>,
    pub lead_instructor_id: Option<ObjectId>,
}

/// Orchestrates the workshop lifecycle: creation, enrollment, join codes,
/// sessions, activities, scoring and the completion rewards pass.
pub struct WorkshopService {
    pub(crate) workshops: WorkshopDao,
    pub(crate) sessions: SessionDao,
    pub(crate) activities: ActivityDao,
    pub(crate) enrollments: EnrollmentDao,
    pub(crate) teams: TeamDao,
    pub(crate) users: UserDao,
    pub(crate) xp: XpService,
    pub(crate) notifier: NotificationService,
    pub(crate) certificates: CertificateService,
    pub(crate) codes: CodeGenerator,
    pub(crate) locks: LockRegistry,
    pub(crate) settings: GamificationSettings,
}

impl WorkshopService {
    pub fn new(db: &Database, settings: GamificationSettings, codes: CodeGenerator) -> Self {
        Self {
            workshops: WorkshopDao::new(db),
            sessions: SessionDao::new(db),
            activities: ActivityDao::new(db),
            enrollments: EnrollmentDao::new(db),
            teams: TeamDao::new(db),
            users: UserDao::new(db),
            xp: XpService::new(db),
            notifier: NotificationService::new(db),
            certificates: CertificateService::new(settings.certificate_base_url.clone()),
            codes,
            locks: LockRegistry::new(),
            settings,
        }
    }

    pub async fn create_workshop(
        &self,
        instructor_id: ObjectId,
        input: CreateWorkshop,
    ) -> WorkshopResult<Workshop> {
        if input.end_date <= input.start_date {
            return Err(WorkshopError::Validation(
                "end_date must be after start_date".into(),
            ));
        }
        self.users
            .base
            .find_by_id(instructor_id)
            .await
            .map_err(not_found("instructor"))?;

        let now = DateTime::now();
        let badges = badge_catalog(input.gamification.enable_teams);
        let workshop = Workshop {
            id: None,
            title: input.title,
            description: input.description,
            instructor_id,
            workshop_type: input.workshop_type,
            tier: input.tier,
            status: WorkshopStatus::Draft,
            start_date: DateTime::from_chrono(input.start_date),
            end_date: DateTime::from_chrono(input.end_date),
            max_participants: input.max_participants,
            enrollment_count: 0,
            price: input.price,
            join_code: String::new(),
            gamification: input.gamification,
            badges,
            total_xp_reward: input.total_xp_reward.unwrap_or(1000),
            requirements: input.requirements,
            learning_outcomes: input.learning_outcomes,
            prerequisites: input.prerequisites,
            created_at: now,
            updated_at: now,
        };

        let workshop = self.workshops.create(workshop, &self.codes).await?;
        let workshop_id = workshop.id.expect("inserted workshop has an id");

        self.seed_default_sessions(&workshop, instructor_id).await?;
        self.notifier
            .workshop_announcement(instructor_id, &workshop)
            .await;

        info!(%workshop_id, code = %workshop.join_code, "Created workshop");
        Ok(workshop)
    }

    /// The three-session skeleton every new workshop starts with.
    async fn seed_default_sessions(
        &self,
        workshop: &Workshop,
        instructor_id: ObjectId,
    ) -> WorkshopResult<()> {
        let start = workshop.start_date.timestamp_millis();
        let end = workshop.end_date.timestamp_millis();
        const HOUR: i64 = 3_600_000;

        let plan = [
            ("Opening Session", SessionType::Lecture, start, start + 2 * HOUR),
            (
                "Working Session",
                SessionType::Interactive,
                start + 24 * HOUR,
                start + 26 * HOUR,
            ),
            ("Final Presentations", SessionType::QAndA, end, end + HOUR),
        ];

        for (sequence, (title, session_type, from, to)) in plan.into_iter().enumerate() {
            let session = self.new_session(
                workshop,
                title.to_string(),
                None,
                session_type,
                sequence as u32 + 1,
                DateTime::from_millis(from),
                DateTime::from_millis(to),
                Some(instructor_id),
            );
            self.sessions
                .create(session, |s| self.stamp_fresh_code(s))
                .await?;
        }
        Ok(())
    }

    pub(crate) fn new_session(
        &self,
        workshop: &Workshop,
        title: String,
        description: Option<String>,
        session_type: SessionType,
        sequence: u32,
        scheduled_start: DateTime,
        scheduled_end: DateTime,
        lead_instructor_id: Option<ObjectId>,
    ) -> WorkshopSession {
        let now = DateTime::now();
        let mut session = WorkshopSession {
            id: None,
            workshop_id: workshop.id.expect("persisted workshop has an id"),
            title,
            description,
            sequence,
            session_type,
            status: Default::default(),
            scheduled_start,
            scheduled_end,
            actual_start_time: None,
            actual_end_time: None,
            lead_instructor_id,
            assistant_instructor_ids: Vec::new(),
            join_code: String::new(),
            code_expires_at: now,
            created_at: now,
            updated_at: now,
        };
        self.stamp_fresh_code(&mut session);
        session
    }

    pub(crate) fn stamp_fresh_code(&self, session: &mut WorkshopSession) {
        let now = DateTime::now();
        session.join_code = self.codes.session_code(Utc::now().year());
        session.code_expires_at = expiry_from(now, self.settings.session_code_ttl_hours);
    }

    pub async fn update_workshop(
        &self,
        instructor_id: ObjectId,
        workshop_id: ObjectId,
        input: UpdateWorkshop,
    ) -> WorkshopResult<Workshop> {
        let _guard = self.locks.acquire(workshop_id).await;
        let mut workshop = self
            .workshops
            .base
            .find_by_id(workshop_id)
            .await
            .map_err(not_found("workshop"))?;
        self.require_instructor(&workshop, instructor_id)?;

        if let Some(title) = input.title {
            workshop.title = title;
        }
        if let Some(description) = input.description {
            workshop.description = Some(description);
        }
        if let Some(max_participants) = input.max_participants {
            workshop.max_participants = max_participants;
        }
        if let Some(price) = input.price {
            workshop.price = Some(price);
        }
        if let Some(total_xp_reward) = input.total_xp_reward {
            workshop.total_xp_reward = total_xp_reward;
        }
        if let Some(requirements) = input.requirements {
            workshop.requirements = requirements;
        }
        if let Some(learning_outcomes) = input.learning_outcomes {
            workshop.learning_outcomes = learning_outcomes;
        }
        if let Some(patch) = input.gamification {
            let g = &mut workshop.gamification;
            if let Some(enable_teams) = patch.enable_teams {
                g.enable_teams = enable_teams;
            }
            if let Some(enable_leaderboard) = patch.enable_leaderboard {
                g.enable_leaderboard = enable_leaderboard;
            }
            if let Some(team_size) = patch.team_size {
                g.team_size = team_size;
            }
            if let Some(activity_points) = patch.activity_points {
                g.activity_points = activity_points;
            }
            if let Some(bonus_points) = patch.bonus_points {
                g.bonus_points = bonus_points;
            }
        }
        workshop.updated_at = DateTime::now();
        self.workshops.base.replace_by_id(workshop_id, &workshop).await?;

        for enrollment in self.enrollments.find_confirmed_by_workshop(workshop_id).await? {
            self.notifier.workshop_update(enrollment.user_id, &workshop).await;
        }
        Ok(workshop)
    }

    pub async fn publish_workshop(
        &self,
        instructor_id: ObjectId,
        workshop_id: ObjectId,
    ) -> WorkshopResult<Workshop> {
        self.transition(instructor_id, workshop_id, |w, now| w.publish(now))
            .await
    }

    pub async fn open_registration(
        &self,
        instructor_id: ObjectId,
        workshop_id: ObjectId,
    ) -> WorkshopResult<Workshop> {
        self.transition(instructor_id, workshop_id, |w, now| w.open_registration(now))
            .await
    }

    pub async fn close_registration(
        &self,
        instructor_id: ObjectId,
        workshop_id: ObjectId,
    ) -> WorkshopResult<Workshop> {
        self.transition(instructor_id, workshop_id, |w, now| {
            w.close_registration(now)
        })
        .await
    }

    pub async fn start_workshop(
        &self,
        instructor_id: ObjectId,
        workshop_id: ObjectId,
    ) -> WorkshopResult<Workshop> {
        self.transition(instructor_id, workshop_id, |w, now| w.start(now))
            .await
    }

    pub async fn cancel_workshop(
        &self,
        instructor_id: ObjectId,
        workshop_id: ObjectId,
    ) -> WorkshopResult<Workshop> {
        self.transition(instructor_id, workshop_id, |w, now| w.cancel(now))
            .await
    }

    async fn transition<F>(
        &self,
        instructor_id: ObjectId,
        workshop_id: ObjectId,
        apply: F,
    ) -> WorkshopResult<Workshop>
    where
        F: FnOnce(&mut Workshop, DateTime) -> Result<(), TransitionError>,
    {
        let _guard = self.locks.acquire(workshop_id).await;
        let mut workshop = self
            .workshops
            .base
            .find_by_id(workshop_id)
            .await
            .map_err(not_found("workshop"))?;
        self.require_instructor(&workshop, instructor_id)?;
        apply(&mut workshop, DateTime::now())?;
        self.workshops.base.replace_by_id(workshop_id, &workshop).await?;
        Ok(workshop)
    }

    pub async fn enroll(
        &self,
        user_id: ObjectId,
        workshop_id: ObjectId,
        request: EnrollRequest,
    ) -> WorkshopResult<WorkshopEnrollment> {
        let user = self
            .users
            .base
            .find_by_id(user_id)
            .await
            .map_err(not_found("user"))?;

        let _guard = self.locks.acquire(workshop_id).await;
        let workshop = self
            .workshops
            .base
            .find_by_id(workshop_id)
            .await
            .map_err(not_found("workshop"))?;

        if !workshop.is_registration_open() {
            return Err(WorkshopError::InvalidState(
                "registration is not open".into(),
            ));
        }

        let now = DateTime::now();

        // Full waitlist path first: no prerequisites, no payment, no XP.
        // A repeat enrollment here trips the unique index in
        // insert_enrollment and comes back as AlreadyEnrolled.
        if workshop.available_slots() <= 0 {
            let mut enrollment = WorkshopEnrollment::new(workshop_id, user_id, now);
            enrollment.waitlist(now)?;
            let id = self.insert_enrollment(&enrollment).await?;
            enrollment.id = Some(id);
            self.notifier.enrollment(user_id, &workshop, true).await;
            info!(%user_id, %workshop_id, "Waitlisted enrollment");
            return Ok(enrollment);
        }

        // Prerequisites are checked before the duplicate lookup, so a user
        // who slipped in through a quick join still hears about the unmet
        // level requirement instead of a duplicate-enrollment conflict.
        if let Some(prereq) = &workshop.prerequisites {
            if let Some(min_level) = prereq.min_level {
                if user.level < min_level {
                    return Err(WorkshopError::PrerequisiteNotMet(format!(
                        "requires level {min_level}, you are level {}",
                        user.level
                    )));
                }
            }
        }

        if self
            .enrollments
            .find_by_user_and_workshop(user_id, workshop_id)
            .await?
            .is_some()
        {
            return Err(WorkshopError::AlreadyEnrolled);
        }

        let mut enrollment = WorkshopEnrollment::new(workshop_id, user_id, now);
        if workshop.tier.is_paid() && workshop.price.is_some() {
            enrollment.payment = request.payment.map(|p| PaymentDetails {
                method: p.method,
                amount: p.amount,
                transaction_id: p.transaction_id,
                paid_at: Some(now),
            });
        }
        enrollment.confirm(now)?;

        if workshop.gamification.enable_teams {
            if let Some(preference) = request.team_preference.as_deref() {
                let team_id = self.assign_to_team(&workshop, Some(preference)).await?;
                enrollment.team_id = Some(team_id);
            }
        }

        let id = self.insert_enrollment(&enrollment).await?;
        enrollment.id = Some(id);
        self.workshops.inc_enrollment_count(workshop_id, 1).await?;

        self.notifier.enrollment(user_id, &workshop, false).await;
        self.xp
            .award(
                user_id,
                self.settings.enrollment_xp,
                XpSource::WorkshopEnrollment,
                workshop_id,
            )
            .await?;

        info!(%user_id, %workshop_id, "Confirmed enrollment");
        Ok(enrollment)
    }

    async fn insert_enrollment(
        &self,
        enrollment: &WorkshopEnrollment,
    ) -> WorkshopResult<ObjectId> {
        self.enrollments
            .base
            .insert_one(enrollment)
            .await
            .map_err(|e| match e {
                DaoError::DuplicateKey(_) => WorkshopError::AlreadyEnrolled,
                other => WorkshopError::Dao(other),
            })
    }

    /// Find a team for a new member: exact name match first, then any team
    /// with a free seat, then a new team in the next palette color.
    pub(crate) async fn assign_to_team(
        &self,
        workshop: &Workshop,
        preference: Option<&str>,
    ) -> WorkshopResult<ObjectId> {
        let workshop_id = workshop.id.expect("persisted workshop has an id");

        if let Some(name) = preference {
            if let Some(team) = self
                .teams
                .find_by_workshop_and_name(workshop_id, name)
                .await?
            {
                let team_id = team.id.expect("persisted team has an id");
                self.teams.inc_member_count(team_id, 1).await?;
                return Ok(team_id);
            }
        }

        let existing = self.teams.find_by_workshop(workshop_id).await?;
        if let Some(team) = existing
            .iter()
            .find(|t| t.member_count < workshop.gamification.team_size)
        {
            let team_id = team.id.expect("persisted team has an id");
            self.teams.inc_member_count(team_id, 1).await?;
            return Ok(team_id);
        }

        let name = preference
            .map(|p| p.to_string())
            .unwrap_or_else(|| format!("Team {}", existing.len() + 1));
        let mut team = WorkshopTeam::new(
            workshop_id,
            name,
            team_color(existing.len()).to_string(),
            DateTime::now(),
        );
        team.member_count = 1;
        let team_id = self.teams.base.insert_one(&team).await?;
        info!(%workshop_id, %team_id, color = %team.color, "Created team");
        Ok(team_id)
    }

    pub(crate) fn require_instructor(
        &self,
        workshop: &Workshop,
        user_id: ObjectId,
    ) -> WorkshopResult<()> {
        if workshop.instructor_id != user_id {
            return Err(WorkshopError::Forbidden(
                "only the instructor may do this".into(),
            ));
        }
        Ok(())
    }

    pub async fn get_workshop(&self, workshop_id: ObjectId) -> WorkshopResult<Workshop> {
        self.workshops
            .base
            .find_by_id(workshop_id)
            .await
            .map_err(not_found("workshop"))
    }

    pub async fn list_by_instructor(
        &self,
        instructor_id: ObjectId,
        params: &PaginationParams,
    ) -> WorkshopResult<PaginatedResult<Workshop>> {
        Ok(self.workshops.find_by_instructor(instructor_id, params).await?)
    }

    pub async fn list_sessions(
        &self,
        workshop_id: ObjectId,
    ) -> WorkshopResult<Vec<WorkshopSession>> {
        Ok(self.sessions.find_by_workshop(workshop_id).await?)
    }

    pub async fn list_enrollments(
        &self,
        instructor_id: ObjectId,
        workshop_id: ObjectId,
    ) -> WorkshopResult<Vec<WorkshopEnrollment>> {
        let workshop = self.get_workshop(workshop_id).await?;
        self.require_instructor(&workshop, instructor_id)?;
        Ok(self.enrollments.find_by_workshop(workshop_id).await?)
    }

    pub async fn my_enrollment(
        &self,
        user_id: ObjectId,
        workshop_id: ObjectId,
    ) -> WorkshopResult<WorkshopEnrollment> {
        self.enrollments
            .find_by_user_and_workshop(user_id, workshop_id)
            .await?
            .ok_or(WorkshopError::NotFound("enrollment"))
    }

    pub async fn list_teams(&self, workshop_id: ObjectId) -> WorkshopResult<Vec<WorkshopTeam>> {
        Ok(self.teams.find_by_workshop(workshop_id).await?)
    }
}

/// Standard badge catalog attached to every workshop at creation. The
/// team-champion badge only exists where teams are enabled.
fn badge_catalog(enable_teams: bool) -> Vec<Badge> {
    let mut badges = vec![
        Badge {
            id: "workshop-completion".to_string(),
            name: "Workshop Graduate".to_string(),
            description: "Completed the full workshop".to_string(),
            icon: "graduation-cap".to_string(),
            criteria: "Reach workshop completion with a confirmed enrollment".to_string(),
            points: 500,
        },
        Badge {
            id: "perfect-attendance".to_string(),
            name: "Perfect Attendance".to_string(),
            description: "Attended every session".to_string(),
            icon: "calendar-check".to_string(),
            criteria: "Attend 100% of workshop sessions".to_string(),
            points: 200,
        },
        Badge {
            id: "top-performer".to_string(),
            name: "Top Performer".to_string(),
            description: "Finished in the top three".to_string(),
            icon: "trophy".to_string(),
            criteria: "Place in the top 3 of the final leaderboard".to_string(),
            points: 300,
        },
    ];
    if enable_teams {
        badges.push(Badge {
            id: "team-champion".to_string(),
            name: "Team Champion".to_string(),
            description: "Member of the winning team".to_string(),
            icon: "users".to_string(),
            criteria: "Finish on the first-ranked team".to_string(),
            points: 400,
        });
    }
    badges
}

pub(crate) fn badge_points(workshop: &Workshop, badge_id: &str, fallback: u32) -> u32 {
    workshop
        .badges
        .iter()
        .find(|b| b.id == badge_id)
        .map(|b| b.points)
        .unwrap_or(fallback)
}
