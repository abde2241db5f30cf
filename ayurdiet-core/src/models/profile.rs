use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::role::Role;

/// Identity record for a signed-up user, one row of `profiles`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(id: Uuid, email: impl Into<String>, full_name: impl Into<String>, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id,
            email: email.into(),
            full_name: full_name.into(),
            role,
            phone: None,
            avatar_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_doctor(&self) -> bool {
        self.role == Role::Doctor
    }
}
