//! User data models

use serde::{Deserialize, Serialize};

/// Who the caller is allowed to act as. Workers bid on shifts, businesses
/// post them, admins get a few (not all) elevated privileges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Worker,
    Business,
    Admin,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Worker => "worker",
            UserRole::Business => "business",
            UserRole::Admin => "admin",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "worker" => Some(UserRole::Worker),
            "business" => Some(UserRole::Business),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    /// Unix timestamp in seconds, assigned by the store.
    pub created: i64,
}

/// Fields needed to register a user; the id and timestamp are assigned by
/// the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
}
