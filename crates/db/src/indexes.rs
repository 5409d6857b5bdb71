use mongodb::{Database, IndexModel, options::IndexOptions};
use tracing::info;

pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    // Users
    create_indexes(
        db,
        "users",
        vec![
            index_unique(bson::doc! { "email": 1 }),
            index_unique(bson::doc! { "username": 1 }),
        ],
    )
    .await?;

    // Workshops. Codes are normalized to upper-case before insert and lookup,
    // so a plain unique index gives us case-insensitive uniqueness.
    create_indexes(
        db,
        "workshops",
        vec![
            index_unique(bson::doc! { "join_code": 1 }),
            index(bson::doc! { "instructor_id": 1, "created_at": -1 }),
            index(bson::doc! { "status": 1, "start_date": 1 }),
        ],
    )
    .await?;

    // Workshop Sessions
    create_indexes(
        db,
        "workshop_sessions",
        vec![
            index_unique(bson::doc! { "join_code": 1 }),
            index(bson::doc! { "workshop_id": 1, "sequence": 1 }),
            index(bson::doc! { "workshop_id": 1, "status": 1 }),
        ],
    )
    .await?;

    // Session Activities
    create_indexes(
        db,
        "session_activities",
        vec![
            index(bson::doc! { "session_id": 1, "created_at": 1 }),
            index(bson::doc! { "workshop_id": 1, "status": 1 }),
        ],
    )
    .await?;

    // Enrollments
    create_indexes(
        db,
        "workshop_enrollments",
        vec![
            index_unique(bson::doc! { "workshop_id": 1, "user_id": 1 }),
            index(bson::doc! { "user_id": 1, "created_at": -1 }),
            index(bson::doc! { "workshop_id": 1, "status": 1 }),
        ],
    )
    .await?;

    // Teams
    create_indexes(
        db,
        "workshop_teams",
        vec![
            index_unique(bson::doc! { "workshop_id": 1, "name": 1 }),
            index(bson::doc! { "workshop_id": 1, "created_at": 1 }),
        ],
    )
    .await?;

    // Notifications
    create_indexes(
        db,
        "notifications",
        vec![index(
            bson::doc! { "user_id": 1, "is_read": 1, "created_at": -1 },
        )],
    )
    .await?;

    info!("All indexes ensured");
    Ok(())
}

fn index(keys: bson::Document) -> IndexModel {
    IndexModel::builder().keys(keys).build()
}

fn index_unique(keys: bson::Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

async fn create_indexes(
    db: &Database,
    collection: &str,
    indexes: Vec<IndexModel>,
) -> Result<(), mongodb::error::Error> {
    db.collection::<bson::Document>(collection)
        .create_indexes(indexes)
        .await?;
    info!(collection, "Indexes created");
    Ok(())
}
