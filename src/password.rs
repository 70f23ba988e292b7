//! Salted password hashing.
//!
//! Hashes are Argon2id PHC strings. Both hashing and verification are CPU
//! bound and run on the blocking pool.

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tokio::task::{self, JoinError};

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("failed to hash password: {0}")]
    Hash(String),
    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),
    #[error("password task failed: {0}")]
    Task(#[from] JoinError),
}

/// Hash `secret` with a fresh random salt.
///
/// # Errors
/// Returns an error if hashing fails or the blocking task panics.
pub async fn hash(secret: SecretString) -> Result<String, PasswordError> {
    task::spawn_blocking(move || hash_blocking(secret.expose_secret())).await?
}

/// Check `secret` against a stored PHC hash.
///
/// The comparison inside the verifier is constant time.
///
/// # Errors
/// Returns an error if `stored_hash` cannot be parsed or the blocking task panics.
pub async fn verify(secret: SecretString, stored_hash: String) -> Result<bool, PasswordError> {
    task::spawn_blocking(move || verify_blocking(secret.expose_secret(), &stored_hash)).await?
}

fn hash_blocking(secret: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

fn verify_blocking(secret: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    let parsed =
        PasswordHash::new(stored_hash).map_err(|e| PasswordError::MalformedHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(secret.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_is_salted_and_never_plaintext() {
        let first = hash(SecretString::from("1234")).await.unwrap();
        let second = hash(SecretString::from("1234")).await.unwrap();

        assert!(first.starts_with("$argon2id$"));
        assert!(!first.contains("1234"));
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn verify_accepts_only_the_original_secret() {
        let stored = hash(SecretString::from("1234")).await.unwrap();

        assert!(verify(SecretString::from("1234"), stored.clone()).await.unwrap());
        assert!(!verify(SecretString::from("wrong"), stored.clone()).await.unwrap());
        assert!(!verify(SecretString::from(""), stored).await.unwrap());
    }

    #[tokio::test]
    async fn verify_reports_malformed_hash() {
        let result = verify(SecretString::from("1234"), "not-a-phc-string".to_string()).await;
        assert!(matches!(result, Err(PasswordError::MalformedHash(_))));
    }
}
