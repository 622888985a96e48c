use async_trait::async_trait;

use super::repo_types::{User, UserUpdate};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("user {0} already exists")]
    Duplicate(i64),
    #[error("user store io: {0}")]
    Io(#[from] std::io::Error),
    #[error("user store format: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("user store database: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence contract for user records.
///
/// Each call is atomic with respect to every other call on the same store.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new record; fails with [`StoreError::Duplicate`] if the id is taken.
    async fn create(&self, user: User) -> StoreResult<User>;

    async fn get_by_id(&self, person_id: i64) -> StoreResult<Option<User>>;

    async fn get_all(&self) -> StoreResult<Vec<User>>;

    /// Merge `update` into the record; `None` if no such user.
    async fn update(&self, person_id: i64, update: UserUpdate) -> StoreResult<Option<User>>;

    /// Soft delete.
    async fn disable(&self, person_id: i64) -> StoreResult<Option<User>> {
        self.update(person_id, UserUpdate::disable()).await
    }
}
