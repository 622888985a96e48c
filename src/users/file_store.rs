use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use super::repo::{StoreError, StoreResult, UserStore};
use super::repo_types::{User, UserUpdate};

#[derive(Debug, Default, Serialize, Deserialize)]
struct UsersDocument {
    users: Vec<User>,
}

/// Users kept in a single pretty-printed JSON document: `{ "users": [...] }`.
///
/// Every operation reads the whole file under `lock`; mutations write it back
/// before releasing the lock.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub async fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("create user store dir {}", dir.display()))?;
        }
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> StoreResult<UsersDocument> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(UsersDocument::default()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(UsersDocument::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, doc: &UsersDocument) -> StoreResult<()> {
        let body = serde_json::to_vec_pretty(doc)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), users = doc.users.len(), "user store written");
        Ok(())
    }
}

#[async_trait]
impl UserStore for JsonFileStore {
    async fn create(&self, user: User) -> StoreResult<User> {
        let _guard = self.lock.lock().await;
        let mut doc = self.read().await?;
        if doc.users.iter().any(|u| u.person_id == user.person_id) {
            return Err(StoreError::Duplicate(user.person_id));
        }
        doc.users.push(user.clone());
        self.write(&doc).await?;
        Ok(user)
    }

    async fn get_by_id(&self, person_id: i64) -> StoreResult<Option<User>> {
        let _guard = self.lock.lock().await;
        let doc = self.read().await?;
        Ok(doc.users.into_iter().find(|u| u.person_id == person_id))
    }

    async fn get_all(&self) -> StoreResult<Vec<User>> {
        let _guard = self.lock.lock().await;
        Ok(self.read().await?.users)
    }

    async fn update(&self, person_id: i64, update: UserUpdate) -> StoreResult<Option<User>> {
        let _guard = self.lock.lock().await;
        let mut doc = self.read().await?;
        let Some(user) = doc.users.iter_mut().find(|u| u.person_id == person_id) else {
            return Ok(None);
        };
        update.apply(user);
        let updated = user.clone();
        self.write(&doc).await?;
        Ok(Some(updated))
    }
}
