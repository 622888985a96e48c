use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

/// Used only by debug builds when `JWT_SECRET` is unset.
pub const DEV_JWT_SECRET: &str = "authgate-dev-secret-change-me";

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
}

/// Which backend persists user records.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreConfig {
    File {
        path: PathBuf,
    },
    Postgres {
        database_url: String,
        max_connections: u32,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub store: StoreConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source; `from_env` passes the process env.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = match lookup("APP_PORT") {
            Some(v) => v.parse::<u16>().context("APP_PORT must be a port number")?,
            None => 3000,
        };

        let jwt = JwtConfig {
            secret: resolve_secret(lookup("JWT_SECRET"))?,
        };

        let store = match lookup("USER_STORE").as_deref().unwrap_or("file") {
            "file" => StoreConfig::File {
                path: lookup("USERS_DB_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("db/users.json")),
            },
            "postgres" => StoreConfig::Postgres {
                database_url: lookup("DATABASE_URL")
                    .context("DATABASE_URL is required when USER_STORE=postgres")?,
                max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                    .and_then(|v| v.parse::<u32>().ok())
                    .unwrap_or(10),
            },
            other => anyhow::bail!("unknown USER_STORE {other:?}, expected \"file\" or \"postgres\""),
        };

        Ok(Self {
            host,
            port,
            jwt,
            store,
        })
    }
}

/// Release builds refuse to start without a signing secret.
fn resolve_secret(configured: Option<String>) -> anyhow::Result<String> {
    match configured {
        Some(secret) if !secret.trim().is_empty() => Ok(secret),
        _ if cfg!(debug_assertions) => {
            tracing::warn!("JWT_SECRET not set; using the built-in development secret");
            Ok(DEV_JWT_SECRET.to_string())
        }
        _ => anyhow::bail!("JWT_SECRET must be set"),
    }
}
