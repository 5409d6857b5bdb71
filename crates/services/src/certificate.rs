use bson::oid::ObjectId;

/// Mints certificate URLs for completed enrollments. Rendering is handled
/// by an external service; we only publish the canonical location.
pub struct CertificateService {
    base_url: String,
}

impl CertificateService {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn url_for(&self, workshop_id: ObjectId, user_id: ObjectId) -> String {
        format!(
            "{}/workshops/{}/participants/{}",
            self.base_url,
            workshop_id.to_hex(),
            user_id.to_hex()
        )
    }
}
