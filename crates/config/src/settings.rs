use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    pub gamification: GamificationSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub name: String,
    pub max_pool_size: Option<u32>,
    pub min_pool_size: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_ttl_secs: u64,
    pub refresh_token_ttl_secs: u64,
    pub issuer: String,
}

/// Tunables for the points/XP economy. The per-activity point table and the
/// team rank bonuses live on each workshop's gamification config; these are
/// the platform-wide grants.
#[derive(Debug, Deserialize, Clone)]
pub struct GamificationSettings {
    /// XP granted for a regular enrollment.
    pub enrollment_xp: u32,
    /// XP granted for a quick (join-by-code) enrollment or session attendance.
    pub quick_join_xp: u32,
    /// Session join codes expire this many hours after (re)generation.
    pub session_code_ttl_hours: i64,
    pub certificate_base_url: String,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::default()
                    .separator("__")
                    .prefix("ATELIER"),
            )
            .set_default("app.host", "0.0.0.0")?
            .set_default("app.port", 3000)?
            .set_default("app.cors_origins", Vec::<String>::new())?
            .set_default("database.url", "mongodb://localhost:27017")?
            .set_default("database.name", "atelier")?
            .set_default("jwt.secret", "change-me-in-production")?
            .set_default("jwt.access_token_ttl_secs", 3600)?
            .set_default("jwt.refresh_token_ttl_secs", 604800)?
            .set_default("jwt.issuer", "atelier")?
            .set_default("gamification.enrollment_xp", 50)?
            .set_default("gamification.quick_join_xp", 25)?
            .set_default("gamification.session_code_ttl_hours", 24)?
            .set_default(
                "gamification.certificate_base_url",
                "https://certificates.atelier.dev",
            )?
            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::load().expect("Failed to load default settings")
    }
}
