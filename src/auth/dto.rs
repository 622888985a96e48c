use serde::{Deserialize, Serialize};

use crate::users::User;

/// Request body for user registration. Fields are optional so that a missing
/// field is reported as a validation failure instead of a body rejection.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(alias = "identifier")]
    pub person_id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Request body for login.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "identifier")]
    pub person_id: Option<i64>,
    pub password: Option<String>,
}

/// Response returned after login or register.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub user: PublicUser,
    pub token: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub person_id: i64,
    pub first_name: String,
    pub email: String,
}

impl From<&User> for PublicUser {
    fn from(u: &User) -> Self {
        Self {
            person_id: u.person_id,
            first_name: u.first_name.clone(),
            email: u.email.clone(),
        }
    }
}
