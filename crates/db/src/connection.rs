use atelier_config::Settings;
use mongodb::{Client, Database, options::ClientOptions};
use tracing::info;

/// Open the configured database and ping it before handing it out, so a bad
/// URL fails at startup rather than on the first query.
pub async fn connect(settings: &Settings) -> Result<Database, mongodb::error::Error> {
    let mut options = ClientOptions::parse(&settings.database.url).await?;
    options.app_name = Some("atelier".to_string());
    options.max_pool_size = settings.database.max_pool_size.or(options.max_pool_size);
    options.min_pool_size = settings.database.min_pool_size.or(options.min_pool_size);

    let client = Client::with_options(options)?;
    let db = client.database(&settings.database.name);
    db.run_command(bson::doc! { "ping": 1 }).await?;

    info!(db = %settings.database.name, "Connected to MongoDB");
    Ok(db)
}
