//! Credential storage.
//!
//! The rest of the crate talks to a [`CredentialStore`] trait object so the
//! bootstrap sequence and the HTTP handlers can be exercised without a live
//! database. [`postgres::PgStore`] is the production implementation.

use async_trait::async_trait;
use std::{sync::Arc, time::Duration};
use thiserror::Error;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// A row of the `users` table.
#[derive(Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Credential {
    pub id: i32,
    pub username: String,
    pub password_hash: String,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"***")
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("store is unavailable")]
    Unavailable,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Shared handle injected into the bootstrap routine and the handlers.
pub type SharedStore = Arc<dyn CredentialStore>;

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Trivial liveness query.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Create the `users` table if it does not exist yet.
    async fn ensure_schema(&self) -> Result<(), StoreError>;

    /// Exact-match lookup by username.
    async fn find_by_username(&self, username: &str) -> Result<Option<Credential>, StoreError>;

    /// Insert a credential unless the username is already taken.
    ///
    /// Returns `true` when a row was written and `false` when the username
    /// already existed.
    async fn insert_if_absent(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<bool, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_debug_hides_hash() {
        let credential = Credential {
            id: 1,
            username: "Usertest".to_string(),
            password_hash: "$argon2id$v=19$secret".to_string(),
        };
        let debug = format!("{credential:?}");
        assert!(debug.contains("Usertest"));
        assert!(!debug.contains("argon2id"));
    }

    #[test]
    fn timeout_error_mentions_duration() {
        let err = StoreError::Timeout(Duration::from_millis(250));
        assert_eq!(err.to_string(), "store operation timed out after 250ms");
    }
}
