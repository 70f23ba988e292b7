//! Login verification.

use crate::{
    password::{self, PasswordError},
    store::{CredentialStore, StoreError},
};
use secrecy::SecretString;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected,
}

impl Verdict {
    #[must_use]
    pub const fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Infrastructure failure while verifying; never a credential outcome.
#[derive(Debug, Error)]
pub enum LoginError {
    #[error("credential lookup failed")]
    Lookup(#[source] StoreError),
    #[error("password verification failed")]
    Verify(#[source] PasswordError),
}

/// Decide whether `(username, secret)` is a valid pair.
///
/// Unknown usernames are rejected without running the hash, so response time
/// distinguishes "unknown user" from "wrong secret".
///
/// # Errors
/// Returns `LoginError` when the store cannot be queried or the stored hash
/// cannot be checked.
#[instrument(skip(store, secret))]
pub async fn verify(
    store: &dyn CredentialStore,
    username: &str,
    secret: SecretString,
) -> Result<Verdict, LoginError> {
    let Some(credential) = store
        .find_by_username(username)
        .await
        .map_err(LoginError::Lookup)?
    else {
        debug!("User not found");
        return Ok(Verdict::Rejected);
    };

    let matches = password::verify(secret, credential.password_hash)
        .await
        .map_err(LoginError::Verify)?;

    Ok(if matches {
        Verdict::Accepted
    } else {
        Verdict::Rejected
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn secret(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    async fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        let hash = password::hash(secret("1234")).await.unwrap();
        store.insert_if_absent("Usertest", &hash).await.unwrap();
        store
    }

    #[tokio::test]
    async fn correct_secret_is_accepted() {
        let store = seeded_store().await;
        let verdict = verify(&store, "Usertest", secret("1234")).await.unwrap();
        assert_eq!(verdict, Verdict::Accepted);
        assert!(verdict.is_accepted());
    }

    #[tokio::test]
    async fn wrong_secret_is_rejected() {
        let store = seeded_store().await;
        for attempt in ["wrong", "", "12345", "1234 "] {
            let verdict = verify(&store, "Usertest", secret(attempt)).await.unwrap();
            assert_eq!(verdict, Verdict::Rejected, "secret {attempt:?}");
        }
    }

    #[tokio::test]
    async fn unknown_user_is_rejected() {
        let store = seeded_store().await;
        for username in ["nobody", "usertest", "", "Usertest'; DROP TABLE users; --"] {
            let verdict = verify(&store, username, secret("1234")).await.unwrap();
            assert_eq!(verdict, Verdict::Rejected, "username {username:?}");
        }
    }

    #[tokio::test]
    async fn store_failure_is_not_a_rejection() {
        let store = seeded_store().await;
        store.set_available(false);

        let result = verify(&store, "Usertest", secret("1234")).await;
        assert!(matches!(result, Err(LoginError::Lookup(_))));
    }

    #[tokio::test]
    async fn corrupt_hash_is_an_internal_error() {
        let store = MemoryStore::new();
        store.insert_if_absent("broken", "plaintext").await.unwrap();

        let result = verify(&store, "broken", secret("plaintext")).await;
        assert!(matches!(result, Err(LoginError::Verify(_))));
    }
}
