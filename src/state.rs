use std::sync::Arc;

use anyhow::Context;

use crate::auth::jwt::JwtKeys;
use crate::config::{AppConfig, StoreConfig};
use crate::users::{JsonFileStore, PgUserStore, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub keys: JwtKeys,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let users: Arc<dyn UserStore> = match &config.store {
            StoreConfig::File { path } => {
                let store = JsonFileStore::open(path.clone()).await?;
                tracing::info!(path = %store.path().display(), "using JSON file user store");
                Arc::new(store)
            }
            StoreConfig::Postgres {
                database_url,
                max_connections,
            } => {
                let db = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(*max_connections)
                    .connect(database_url)
                    .await
                    .context("connect to database")?;
                sqlx::migrate!("./migrations")
                    .run(&db)
                    .await
                    .context("run migrations")?;
                tracing::info!("using postgres user store");
                Arc::new(PgUserStore::new(db))
            }
        };

        Ok(Self::from_parts(Arc::new(config), users))
    }

    pub fn from_parts(config: Arc<AppConfig>, users: Arc<dyn UserStore>) -> Self {
        let keys = JwtKeys::new(&config.jwt);
        Self {
            config,
            users,
            keys,
        }
    }

    /// State backed by a JSON file store at `path`, for tests.
    #[cfg(test)]
    pub async fn fake(path: &std::path::Path) -> Self {
        use crate::config::JwtConfig;

        let config = Arc::new(AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            jwt: JwtConfig {
                secret: "test".into(),
            },
            store: StoreConfig::File {
                path: path.to_path_buf(),
            },
        });
        let users = Arc::new(JsonFileStore::open(path).await.expect("open store")) as Arc<dyn UserStore>;
        Self::from_parts(config, users)
    }
}
