use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod file_store;
pub mod handlers;
pub mod pg_store;
pub mod repo;
pub mod repo_types;

pub use file_store::JsonFileStore;
pub use pg_store::PgUserStore;
pub use repo::UserStore;
pub use repo_types::User;

pub fn router() -> Router<AppState> {
    handlers::users_routes()
}
