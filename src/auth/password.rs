use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use tracing::{error, warn};

lazy_static! {
    /// Digest with the same parameters as real ones, checked against when the
    /// account does not exist so both login failures cost one argon2 run.
    static ref DUMMY_HASH: String =
        hash_password("authgate-no-such-account").expect("argon2 with default params");
}

pub fn dummy_hash() -> &'static str {
    &DUMMY_HASH
}

/// Hash a password into a PHC string (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`).
///
/// Argon2id with the crate defaults (19 MiB, 2 passes). The digest carries its
/// own salt and parameters.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// `false` on mismatch and on a digest that does not parse.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "stored password hash is malformed");
            return false;
        }
    };
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}
