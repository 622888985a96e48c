use serde::Serialize;

use super::repo_types::User;

/// Public view of a user record, returned by `/api/auth/me` and `/api/users`.
#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub person_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub enabled: bool,
}

impl From<User> for UserProfile {
    fn from(u: User) -> Self {
        Self {
            person_id: u.person_id,
            first_name: u.first_name,
            last_name: u.last_name,
            email: u.email,
            enabled: u.enabled,
        }
    }
}
