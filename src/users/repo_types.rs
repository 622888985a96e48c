use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// User record as persisted by a [`UserStore`](super::repo::UserStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub person_id: i64,                // caller-supplied, immutable
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    pub password_hash: String,         // PHC string, never the raw password
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

fn enabled_by_default() -> bool {
    true
}

impl User {
    pub fn new(
        person_id: i64,
        first_name: String,
        last_name: String,
        email: String,
        password_hash: String,
    ) -> Self {
        Self {
            person_id,
            first_name,
            last_name,
            email,
            password_hash,
            enabled: true,
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Partial set of fields merged into an existing record.
///
/// `enabled` can only switch an account off; `Some(true)` on a disabled
/// account leaves it disabled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub enabled: Option<bool>,
}

impl UserUpdate {
    pub fn disable() -> Self {
        Self {
            enabled: Some(false),
            ..Self::default()
        }
    }

    pub fn apply(self, user: &mut User) {
        if let Some(v) = self.first_name {
            user.first_name = v;
        }
        if let Some(v) = self.last_name {
            user.last_name = v;
        }
        if let Some(v) = self.email {
            user.email = v;
        }
        if let Some(v) = self.password_hash.filter(|h| !h.is_empty()) {
            user.password_hash = v;
        }
        if let Some(v) = self.enabled {
            user.enabled &= v;
        }
    }
}
