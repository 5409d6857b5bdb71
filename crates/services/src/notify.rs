use atelier_db::models::{
    Notification, NotificationSource, NotificationType, SessionActivity, Workshop, WorkshopSession,
};
use bson::{DateTime, oid::ObjectId};
use mongodb::Database;
use tracing::warn;

use crate::dao::BaseDao;

/// Best-effort workshop event notifications. Delivery failures are logged
/// and swallowed; no workflow fails because a notification did not land.
pub struct NotificationService {
    base: BaseDao<Notification>,
}

impl NotificationService {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Notification::COLLECTION),
        }
    }

    pub async fn workshop_announcement(&self, user_id: ObjectId, workshop: &Workshop) {
        self.deliver(
            user_id,
            NotificationType::WorkshopAnnouncement,
            format!("Workshop created: {}", workshop.title),
            format!("Join code {}", workshop.join_code),
            workshop_source(workshop, Some(workshop.instructor_id)),
        )
        .await;
    }

    pub async fn workshop_update(&self, user_id: ObjectId, workshop: &Workshop) {
        self.deliver(
            user_id,
            NotificationType::WorkshopUpdate,
            format!("Workshop updated: {}", workshop.title),
            "The workshop details have changed".to_string(),
            workshop_source(workshop, Some(workshop.instructor_id)),
        )
        .await;
    }

    pub async fn enrollment(&self, user_id: ObjectId, workshop: &Workshop, waitlisted: bool) {
        let body = if waitlisted {
            "You are on the waitlist; a slot will be assigned when one frees up".to_string()
        } else {
            format!("Your enrollment in {} is confirmed", workshop.title)
        };
        self.deliver(
            user_id,
            NotificationType::Enrollment,
            format!("Enrollment: {}", workshop.title),
            body,
            workshop_source(workshop, Some(user_id)),
        )
        .await;
    }

    pub async fn session_start(&self, user_id: ObjectId, session: &WorkshopSession) {
        self.deliver(
            user_id,
            NotificationType::SessionStart,
            format!("Session live: {}", session.title),
            format!("Join with code {}", session.join_code),
            NotificationSource {
                entity_type: "workshop_session".to_string(),
                entity_id: session.id.unwrap_or_default(),
                actor_id: session.lead_instructor_id,
            },
        )
        .await;
    }

    pub async fn activity_start(&self, user_id: ObjectId, activity: &SessionActivity) {
        self.deliver(
            user_id,
            NotificationType::ActivityStart,
            format!("Activity started: {}", activity.title),
            format!("{} points up for grabs", activity.points),
            NotificationSource {
                entity_type: "session_activity".to_string(),
                entity_id: activity.id.unwrap_or_default(),
                actor_id: None,
            },
        )
        .await;
    }

    pub async fn workshop_completion(
        &self,
        user_id: ObjectId,
        workshop: &Workshop,
        certificate_url: Option<&str>,
    ) {
        let body = match certificate_url {
            Some(url) => format!("Congratulations! Your certificate is at {url}"),
            None => "Congratulations on finishing the workshop!".to_string(),
        };
        self.deliver(
            user_id,
            NotificationType::WorkshopCompletion,
            format!("Workshop completed: {}", workshop.title),
            body,
            workshop_source(workshop, Some(workshop.instructor_id)),
        )
        .await;
    }

    async fn deliver(
        &self,
        user_id: ObjectId,
        notification_type: NotificationType,
        title: String,
        body: String,
        source: NotificationSource,
    ) {
        let notification = Notification {
            id: None,
            user_id,
            notification_type,
            title,
            body,
            link: None,
            source,
            is_read: false,
            read_at: None,
            created_at: DateTime::now(),
        };
        if let Err(e) = self.base.insert_one(&notification).await {
            warn!(%user_id, error = %e, "Failed to deliver notification");
        }
    }
}

fn workshop_source(workshop: &Workshop, actor_id: Option<ObjectId>) -> NotificationSource {
    NotificationSource {
        entity_type: "workshop".to_string(),
        entity_id: workshop.id.unwrap_or_default(),
        actor_id,
    }
}
