use serde::{Deserialize, Serialize};

/// Profile / role tag for one identity. Managed by the auth service and
/// read-only from the workflow's perspective.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Profile {
    pub user_id: String,
    pub username: String,
    pub role: String, // admin | user
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateProfilePayload {
    pub username: String,
    pub role: String,
}
