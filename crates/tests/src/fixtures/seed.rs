use chrono::{Duration, Utc};
use serde_json::Value;

use super::test_app::TestApp;

pub struct SeededUser {
    pub id: String,
    pub email: String,
    pub username: String,
    pub access_token: String,
}

pub struct SeededWorkshop {
    pub id: String,
    pub join_code: String,
}

impl TestApp {
    /// Register a user and return their auth info.
    pub async fn register_user(&self, email: &str, username: &str, password: &str) -> SeededUser {
        let resp = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&serde_json::json!({
                "email": email,
                "username": username,
                "password": password,
            }))
            .send()
            .await
            .expect("Register request failed");

        assert_eq!(
            resp.status().as_u16(),
            201,
            "Register failed: {}",
            resp.text().await.unwrap_or_default()
        );

        let resp = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&serde_json::json!({
                "email": email,
                "password": password,
            }))
            .send()
            .await
            .expect("Login request failed");

        let json: Value = resp.json().await.expect("Failed to parse login response");

        SeededUser {
            id: json["user"]["id"].as_str().unwrap().to_string(),
            email: email.to_string(),
            username: username.to_string(),
            access_token: json["access_token"].as_str().unwrap().to_string(),
        }
    }

    pub fn auth_get(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {}", token))
    }

    pub fn auth_post(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {}", token))
    }

    pub fn auth_put(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .put(self.url(path))
            .header("Authorization", format!("Bearer {}", token))
    }

    /// Create a draft workshop starting tomorrow. Extra fields are merged
    /// over the defaults, so tests can tweak capacity, teams or prerequisites.
    pub async fn create_workshop(
        &self,
        token: &str,
        title: &str,
        extra: Value,
    ) -> SeededWorkshop {
        let start = Utc::now() + Duration::days(1);
        let end = start + Duration::days(3);
        let mut body = serde_json::json!({
            "title": title,
            "description": "Hands-on systems programming",
            "start_date": start.to_rfc3339(),
            "end_date": end.to_rfc3339(),
            "max_participants": 20,
        });
        if let (Some(base), Some(over)) = (body.as_object_mut(), extra.as_object()) {
            for (k, v) in over {
                base.insert(k.clone(), v.clone());
            }
        }

        let resp = self
            .auth_post("/api/workshop", token)
            .json(&body)
            .send()
            .await
            .expect("Create workshop failed");

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        assert_eq!(status.as_u16(), 201, "Create workshop failed: {text}");
        let json: Value = serde_json::from_str(&text).expect("Failed to parse workshop");

        SeededWorkshop {
            id: json["_id"]["$oid"].as_str().unwrap().to_string(),
            join_code: json["join_code"].as_str().unwrap().to_string(),
        }
    }

    /// Walk a draft workshop to registration_open.
    pub async fn open_for_enrollment(&self, token: &str, workshop_id: &str) {
        for action in ["publish", "open-registration"] {
            let resp = self
                .auth_post(&format!("/api/workshop/{workshop_id}/{action}"), token)
                .send()
                .await
                .expect("Lifecycle request failed");
            assert!(
                resp.status().is_success(),
                "{} failed: {}",
                action,
                resp.text().await.unwrap_or_default()
            );
        }
    }

    pub async fn enroll(&self, token: &str, workshop_id: &str, body: Value) -> Value {
        let resp = self
            .auth_post(&format!("/api/workshop/{workshop_id}/enroll"), token)
            .json(&body)
            .send()
            .await
            .expect("Enroll request failed");
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        assert_eq!(status.as_u16(), 201, "Enroll failed: {text}");
        serde_json::from_str(&text).expect("Failed to parse enrollment")
    }
}

/// Pull the hex id out of a serialized bson ObjectId field.
pub fn oid(value: &Value) -> String {
    value["$oid"].as_str().expect("missing $oid").to_string()
}
