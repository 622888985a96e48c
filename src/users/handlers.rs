use axum::{extract::State, routing::get, Json, Router};
use tracing::{debug, instrument};

use crate::{
    auth::extractors::AuthUser,
    error::AppError,
    state::AppState,
    users::dto::UserProfile,
};

pub fn users_routes() -> Router<AppState> {
    Router::new().route("/users", get(list_users))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<Vec<UserProfile>>, AppError> {
    let users = state.users.get_all().await?;
    debug!(count = users.len(), "users listed");
    Ok(Json(users.into_iter().map(UserProfile::from).collect()))
}
