use async_trait::async_trait;
use sqlx::PgPool;

use super::repo::{StoreError, StoreResult, UserStore};
use super::repo_types::{User, UserUpdate};

/// Postgres-backed store. Each operation is a single statement.
#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: User) -> StoreResult<User> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (person_id, first_name, last_name, email, password_hash, enabled, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING person_id, first_name, last_name, email, password_hash, enabled, created_at
            "#,
        )
        .bind(user.person_id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.enabled)
        .bind(user.created_at)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                StoreError::Duplicate(user.person_id)
            }
            other => StoreError::Database(other),
        })?;
        Ok(created)
    }

    async fn get_by_id(&self, person_id: i64) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT person_id, first_name, last_name, email, password_hash, enabled, created_at
            FROM users
            WHERE person_id = $1
            "#,
        )
        .bind(person_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn get_all(&self) -> StoreResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT person_id, first_name, last_name, email, password_hash, enabled, created_at
            FROM users
            ORDER BY created_at ASC, person_id ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(users)
    }

    async fn update(&self, person_id: i64, update: UserUpdate) -> StoreResult<Option<User>> {
        // enabled can be cleared but never set back
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET first_name    = COALESCE($2, first_name),
                   last_name     = COALESCE($3, last_name),
                   email         = COALESCE($4, email),
                   password_hash = COALESCE(NULLIF($5, ''), password_hash),
                   enabled       = enabled AND COALESCE($6, enabled)
             WHERE person_id = $1
            RETURNING person_id, first_name, last_name, email, password_hash, enabled, created_at
            "#,
        )
        .bind(person_id)
        .bind(update.first_name)
        .bind(update.last_name)
        .bind(update.email)
        .bind(update.password_hash)
        .bind(update.enabled)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;
    use time::OffsetDateTime;

    // Runs only when DATABASE_URL points at a disposable database.
    async fn test_store() -> Option<PgUserStore> {
        let url = std::env::var("DATABASE_URL").ok()?;
        let db = PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .expect("connect to DATABASE_URL");
        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .expect("run migrations");
        Some(PgUserStore::new(db))
    }

    fn unique_id() -> i64 {
        let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
        (nanos % 1_000_000_000_000) as i64 + i64::from(std::process::id()) * 1_000_000_000_000
    }

    fn user(id: i64) -> User {
        User::new(
            id,
            "Ada".into(),
            String::new(),
            "ada@example.com".into(),
            "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into(),
        )
    }

    async fn cleanup(store: &PgUserStore, id: i64) {
        sqlx::query("DELETE FROM users WHERE person_id = $1")
            .bind(id)
            .execute(&store.db)
            .await
            .expect("cleanup");
    }

    #[tokio::test]
    async fn create_get_and_reject_duplicate() {
        let Some(store) = test_store().await else {
            return;
        };
        let id = unique_id();

        let created = store.create(user(id)).await.expect("create");
        let found = store.get_by_id(id).await.expect("get").expect("present");
        assert_eq!(found.person_id, created.person_id);
        assert_eq!(found.first_name, "Ada");
        assert!(found.enabled);

        let err = store.create(user(id)).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(d) if d == id));
        assert!(store
            .get_all()
            .await
            .expect("get_all")
            .iter()
            .any(|u| u.person_id == id));

        cleanup(&store, id).await;
    }

    #[tokio::test]
    async fn update_never_re_enables() {
        let Some(store) = test_store().await else {
            return;
        };
        let id = unique_id() + 1;
        store.create(user(id)).await.expect("create");

        let renamed = store
            .update(
                id,
                UserUpdate {
                    last_name: Some("Lovelace".into()),
                    password_hash: Some(String::new()),
                    ..UserUpdate::default()
                },
            )
            .await
            .expect("update")
            .expect("present");
        assert_eq!(renamed.last_name, "Lovelace");
        assert!(!renamed.password_hash.is_empty());

        let disabled = store.disable(id).await.expect("disable").expect("present");
        assert!(!disabled.enabled);

        let still = store
            .update(
                id,
                UserUpdate {
                    enabled: Some(true),
                    ..UserUpdate::default()
                },
            )
            .await
            .expect("update")
            .expect("present");
        assert!(!still.enabled);

        assert!(store
            .update(-id, UserUpdate::disable())
            .await
            .expect("update")
            .is_none());

        cleanup(&store, id).await;
    }
}
