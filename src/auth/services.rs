use anyhow::Context;
use tracing::{info, warn};

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest},
        jwt::JwtKeys,
        password,
    },
    error::AppError,
    users::{User, UserStore},
};

/// Successful register or login: the stored record and a fresh token.
#[derive(Debug)]
pub struct Authenticated {
    pub user: User,
    pub token: String,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Register a new account.
///
/// Validation and the existence check happen before any write, so a
/// rejected registration leaves the store untouched.
pub async fn register(
    store: &dyn UserStore,
    keys: &JwtKeys,
    req: RegisterRequest,
) -> Result<Authenticated, AppError> {
    let person_id = req.person_id.filter(|id| *id != 0);
    let first_name = present(req.first_name);
    let email = present(req.email);
    let plain = req.password.filter(|p| !p.is_empty());

    let (Some(person_id), Some(first_name), Some(email), Some(plain)) =
        (person_id, first_name, email, plain)
    else {
        warn!("register missing required fields");
        return Err(AppError::Validation("Missing required fields".into()));
    };

    if store.get_by_id(person_id).await?.is_some() {
        warn!(person_id, "person_id already registered");
        return Err(AppError::Conflict);
    }

    let hash = hash_blocking(plain).await?;
    let record = User::new(
        person_id,
        first_name,
        req.last_name.unwrap_or_default(),
        email,
        hash,
    );
    // a concurrent registration of the same id surfaces here as Duplicate -> Conflict
    let user = store.create(record).await?;

    let token = keys.sign(user.person_id)?;
    info!(person_id = user.person_id, email = %user.email, "user registered");
    Ok(Authenticated { user, token })
}

/// Log in with `person_id` and password.
///
/// Unknown ids and wrong passwords produce the same error. A disabled account
/// is rejected before its password is checked.
pub async fn login(
    store: &dyn UserStore,
    keys: &JwtKeys,
    req: LoginRequest,
) -> Result<Authenticated, AppError> {
    let person_id = req.person_id.filter(|id| *id != 0);
    let plain = req.password.filter(|p| !p.is_empty());
    let (Some(person_id), Some(plain)) = (person_id, plain) else {
        warn!("login missing person_id or password");
        return Err(AppError::Validation("Missing person_id or password".into()));
    };

    let Some(user) = store.get_by_id(person_id).await? else {
        // same argon2 cost as a wrong password
        verify_dummy_blocking(plain).await?;
        warn!(person_id, "login unknown person_id");
        return Err(AppError::InvalidCredentials);
    };

    if !user.enabled {
        warn!(person_id, "login to disabled account");
        return Err(AppError::AccountDisabled);
    }

    if !verify_blocking(plain, user.password_hash.clone()).await? {
        warn!(person_id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let token = keys.sign(user.person_id)?;
    info!(person_id, email = %user.email, "user logged in");
    Ok(Authenticated { user, token })
}

/// Resolve the record behind an authorized `person_id`.
pub async fn current_user(store: &dyn UserStore, person_id: i64) -> Result<User, AppError> {
    store.get_by_id(person_id).await?.ok_or_else(|| {
        warn!(person_id, "token subject no longer exists");
        AppError::NotFound
    })
}

async fn hash_blocking(plain: String) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || password::hash_password(&plain))
        .await
        .context("password hashing task failed")?
}

async fn verify_blocking(plain: String, hash: String) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || password::verify_password(&plain, &hash))
        .await
        .context("password verification task failed")
}

async fn verify_dummy_blocking(plain: String) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || password::verify_password(&plain, password::dummy_hash()))
        .await
        .context("password verification task failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::jwt::Verification, config::JwtConfig, users::JsonFileStore};
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn setup() -> (TempDir, JsonFileStore, JwtKeys) {
        let tmp = TempDir::new().expect("temp dir");
        let store = JsonFileStore::open(tmp.path().join("users.json"))
            .await
            .expect("open store");
        let keys = JwtKeys::new(&JwtConfig {
            secret: "service-test-secret".into(),
        });
        (tmp, store, keys)
    }

    fn registration(id: i64, password: &str) -> RegisterRequest {
        RegisterRequest {
            person_id: Some(id),
            first_name: Some("John".into()),
            last_name: None,
            email: Some("john@example.com".into()),
            password: Some(password.into()),
        }
    }

    fn credentials(id: i64, password: &str) -> LoginRequest {
        LoginRequest {
            person_id: Some(id),
            password: Some(password.into()),
        }
    }

    #[tokio::test]
    async fn register_then_login_issue_verifiable_tokens() {
        let (_tmp, store, keys) = setup().await;

        let registered = register(&store, &keys, registration(100, "SecurePassword123"))
            .await
            .expect("register");
        assert_eq!(registered.user.last_name, "");
        assert!(registered.user.enabled);
        assert_ne!(registered.user.password_hash, "SecurePassword123");

        let logged_in = login(&store, &keys, credentials(100, "SecurePassword123"))
            .await
            .expect("login");
        for token in [&registered.token, &logged_in.token] {
            match keys.verify(token) {
                Verification::Valid(claims) => assert_eq!(claims.person_id, 100),
                other => panic!("expected valid token, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn register_requires_all_mandatory_fields() {
        let (_tmp, store, keys) = setup().await;

        let cases = [
            RegisterRequest {
                person_id: None,
                ..registration(1, "pw")
            },
            RegisterRequest {
                person_id: Some(0),
                ..registration(1, "pw")
            },
            RegisterRequest {
                first_name: Some("  ".into()),
                ..registration(1, "pw")
            },
            RegisterRequest {
                email: None,
                ..registration(1, "pw")
            },
            registration(1, ""),
        ];
        for req in cases {
            let err = register(&store, &keys, req).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(ref m) if m == "Missing required fields"));
        }
        assert!(store.get_all().await.expect("get_all").is_empty());
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts_and_keeps_first_record() {
        let (_tmp, store, keys) = setup().await;
        register(&store, &keys, registration(101, "Password123"))
            .await
            .expect("first register");

        let second = RegisterRequest {
            first_name: Some("Another".into()),
            email: Some("another@example.com".into()),
            ..registration(101, "Password456")
        };
        let err = register(&store, &keys, second).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict));

        let stored = store.get_by_id(101).await.expect("get").expect("present");
        assert_eq!(stored.first_name, "John");
        assert_eq!(stored.email, "john@example.com");
        assert!(password::verify_password("Password123", &stored.password_hash));
    }

    #[tokio::test]
    async fn concurrent_duplicate_registrations_create_one_record() {
        let (_tmp, store, keys) = setup().await;
        let store = Arc::new(store);

        let a = {
            let (store, keys) = (Arc::clone(&store), keys.clone());
            tokio::spawn(async move { register(store.as_ref(), &keys, registration(5, "pw-a")).await })
        };
        let b = {
            let (store, keys) = (Arc::clone(&store), keys.clone());
            tokio::spawn(async move { register(store.as_ref(), &keys, registration(5, "pw-b")).await })
        };
        let results = [a.await.expect("join a"), b.await.expect("join b")];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(AppError::Conflict))));
        assert_eq!(store.get_all().await.expect("get_all").len(), 1);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_are_indistinguishable() {
        let (_tmp, store, keys) = setup().await;
        register(&store, &keys, registration(104, "CorrectPassword123"))
            .await
            .expect("register");

        let wrong = login(&store, &keys, credentials(104, "WrongPassword"))
            .await
            .unwrap_err();
        let unknown = login(&store, &keys, credentials(999, "SomePassword"))
            .await
            .unwrap_err();
        assert!(matches!(wrong, AppError::InvalidCredentials));
        assert!(matches!(unknown, AppError::InvalidCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn unknown_user_costs_as_much_as_wrong_password() {
        let (_tmp, store, keys) = setup().await;
        register(&store, &keys, registration(104, "CorrectPassword123"))
            .await
            .expect("register");
        // warm up the dummy digest so its one-off hashing is not timed
        login(&store, &keys, credentials(998, "warmup")).await.unwrap_err();

        let started = std::time::Instant::now();
        login(&store, &keys, credentials(104, "WrongPassword"))
            .await
            .unwrap_err();
        let wrong = started.elapsed();

        let started = std::time::Instant::now();
        login(&store, &keys, credentials(999, "WrongPassword"))
            .await
            .unwrap_err();
        let unknown = started.elapsed();

        assert!(
            unknown * 10 >= wrong,
            "unknown user answered in {unknown:?}, wrong password in {wrong:?}"
        );
    }

    #[tokio::test]
    async fn disabled_account_is_denied_before_password_check() {
        let (_tmp, store, keys) = setup().await;
        register(&store, &keys, registration(106, "Password123"))
            .await
            .expect("register");
        store.disable(106).await.expect("disable").expect("present");

        let correct = login(&store, &keys, credentials(106, "Password123"))
            .await
            .unwrap_err();
        let wrong = login(&store, &keys, credentials(106, "nope"))
            .await
            .unwrap_err();
        assert!(matches!(correct, AppError::AccountDisabled));
        assert!(matches!(wrong, AppError::AccountDisabled));
    }

    #[tokio::test]
    async fn login_does_not_write_to_the_store() {
        let (_tmp, store, keys) = setup().await;
        register(&store, &keys, registration(7, "Password123"))
            .await
            .expect("register");
        let before = tokio::fs::read(store.path()).await.expect("read");

        login(&store, &keys, credentials(7, "Password123"))
            .await
            .expect("login");
        let _ = login(&store, &keys, credentials(7, "bad")).await;

        let after = tokio::fs::read(store.path()).await.expect("read");
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn login_requires_id_and_password() {
        let (_tmp, store, keys) = setup().await;
        let err = login(&store, &keys, LoginRequest::default()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == "Missing person_id or password"));
    }

    #[tokio::test]
    async fn current_user_reports_vanished_record() {
        let (_tmp, store, _keys) = setup().await;
        assert!(matches!(
            current_user(&store, 42).await.unwrap_err(),
            AppError::NotFound
        ));
    }
}
