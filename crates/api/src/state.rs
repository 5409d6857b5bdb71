use atelier_config::Settings;
use atelier_services::{AuthService, CodeGenerator, WorkshopService, dao::user::UserDao};
use mongodb::Database;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub settings: Settings,
    pub auth: Arc<AuthService>,
    pub users: Arc<UserDao>,
    pub workshops: Arc<WorkshopService>,
}

impl AppState {
    pub fn new(db: Database, settings: Settings) -> Self {
        let auth = Arc::new(AuthService::new(settings.jwt.clone()));
        let users = Arc::new(UserDao::new(&db));
        let workshops = Arc::new(WorkshopService::new(
            &db,
            settings.gamification.clone(),
            CodeGenerator::new(),
        ));

        Self {
            db,
            settings,
            auth,
            users,
            workshops,
        }
    }
}
