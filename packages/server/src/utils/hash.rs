use anyhow::anyhow;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

/// Hash a password into an Argon2id PHC string.
///
/// Runs on the blocking pool.
pub async fn hash_password(password: &str) -> anyhow::Result<String> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|phc| phc.to_string())
            .map_err(|e| anyhow!(e.to_string()))
    })
    .await?
}

/// Check a password against a stored PHC string.
///
/// A stored value that does not parse verifies as `false`.
pub async fn verify_password(password: &str, stored: &str) -> anyhow::Result<bool> {
    let password = password.to_owned();
    let stored = stored.to_owned();
    let matched = tokio::task::spawn_blocking(move || match PasswordHash::new(&stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    })
    .await?;
    Ok(matched)
}
