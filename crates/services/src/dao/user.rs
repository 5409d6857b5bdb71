use atelier_db::models::User;
use bson::{DateTime, doc, oid::ObjectId};
use mongodb::Database;

use super::base::{BaseDao, DaoResult};

pub struct UserDao {
    pub base: BaseDao<User>,
}

impl UserDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, User::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        email: String,
        username: String,
        display_name: String,
        password_hash: String,
    ) -> DaoResult<User> {
        let now = DateTime::now();
        let user = User {
            id: None,
            email,
            username,
            display_name,
            password_hash: Some(password_hash),
            level: 1,
            xp: 0,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let id = self.base.insert_one(&user).await?;
        self.base.find_by_id(id).await
    }

    pub async fn find_by_email(&self, email: &str) -> DaoResult<Option<User>> {
        self.base
            .find_one(doc! { "email": email, "deleted_at": null })
            .await
    }

    pub async fn find_by_username(&self, username: &str) -> DaoResult<Option<User>> {
        self.base
            .find_one(doc! { "username": username, "deleted_at": null })
            .await
    }

    pub async fn add_xp(&self, user_id: ObjectId, amount: u32) -> DaoResult<bool> {
        self.base
            .update_by_id(user_id, doc! { "$inc": { "xp": amount as i64 } })
            .await
    }

    pub async fn set_level(&self, user_id: ObjectId, level: u32) -> DaoResult<bool> {
        self.base
            .update_by_id(user_id, doc! { "$set": { "level": level as i64 } })
            .await
    }
}
