use serde::{Deserialize, Serialize};

/// JWT payload used for authentication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub person_id: i64, // user ID
    pub iat: u64,       // issued at (unix timestamp)
    pub exp: u64,       // expires at (unix timestamp)
}
