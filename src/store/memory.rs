use super::{Credential, CredentialStore, StoreError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use tokio::sync::Mutex;

/// In-process credential store with switchable availability.
///
/// Behaves like the `users` table (unique usernames, increasing ids) and can
/// be told to fail, which is how outages are simulated in tests.
#[derive(Debug)]
pub struct MemoryStore {
    rows: Mutex<Vec<Credential>>,
    available: AtomicBool,
    failing_pings: AtomicU32,
    schema_ready: AtomicBool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            available: AtomicBool::new(true),
            failing_pings: AtomicU32::new(0),
            schema_ready: AtomicBool::new(false),
        }
    }

    /// Make the next `count` pings fail before the store answers.
    #[must_use]
    pub fn with_failing_pings(self, count: u32) -> Self {
        self.failing_pings.store(count, Ordering::SeqCst);
        self
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    #[must_use]
    pub fn schema_ready(&self) -> bool {
        self.schema_ready.load(Ordering::SeqCst)
    }

    pub async fn rows(&self) -> Vec<Credential> {
        self.rows.lock().await.clone()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable)
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()?;

        let pending = self
            .failing_pings
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match pending {
            Ok(_) => Err(StoreError::Unavailable),
            Err(_) => Ok(()),
        }
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        self.check_available()?;
        self.schema_ready.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Credential>, StoreError> {
        self.check_available()?;
        let rows = self.rows.lock().await;
        Ok(rows.iter().find(|row| row.username == username).cloned())
    }

    async fn insert_if_absent(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<bool, StoreError> {
        self.check_available()?;
        let mut rows = self.rows.lock().await;
        if rows.iter().any(|row| row.username == username) {
            return Ok(false);
        }

        let id = rows.last().map_or(1, |row| row.id + 1);
        rows.push(Credential {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        });

        Ok(true)
    }
}
