//! Startup sequence run before the listener accepts traffic.
//!
//! `NotStarted → WaitingForStore → SchemaReady → SeedChecked → Ready`, with a
//! terminal `Failed` reachable only when the readiness wait runs out of
//! attempts. Schema and seed failures are returned as errors without moving
//! the state; the caller aborts either way.
//!
//! The seed step checks for the default user first and then inserts with
//! `ON CONFLICT DO NOTHING`, so a concurrent bootstrap that wins the race is
//! treated as success rather than as a constraint violation.

use crate::{
    password::{self, PasswordError},
    store::{SharedStore, StoreError},
};
use secrecy::SecretString;
use std::{fmt, sync::Arc};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

pub mod retry;

pub use retry::{Backoff, RetryPolicy, Sleeper, TokioSleeper};

pub const SEED_USERNAME: &str = "Usertest";
pub const SEED_SECRET: &str = "1234";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    NotStarted,
    WaitingForStore,
    SchemaReady,
    SeedChecked,
    Ready,
    Failed,
}

impl BootstrapState {
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::NotStarted, Self::WaitingForStore)
                | (Self::WaitingForStore, Self::SchemaReady | Self::Failed)
                | (Self::SchemaReady, Self::SeedChecked)
                | (Self::SeedChecked, Self::Ready)
        )
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Failed)
    }
}

impl fmt::Display for BootstrapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotStarted => "not-started",
            Self::WaitingForStore => "waiting-for-store",
            Self::SchemaReady => "schema-ready",
            Self::SeedChecked => "seed-checked",
            Self::Ready => "ready",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// The default credential guaranteed to exist after bootstrap.
#[derive(Debug, Clone)]
pub struct Seed {
    pub username: String,
    pub secret: SecretString,
}

impl Seed {
    #[must_use]
    pub fn new(username: impl Into<String>, secret: SecretString) -> Self {
        Self {
            username: username.into(),
            secret,
        }
    }
}

impl Default for Seed {
    fn default() -> Self {
        Self::new(SEED_USERNAME, SecretString::from(SEED_SECRET.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Created,
    AlreadyPresent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootstrapReport {
    /// Readiness attempts used, including the successful one.
    pub attempts: u32,
    pub seed: SeedOutcome,
}

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Password(#[from] PasswordError),
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("credential store unavailable after {attempts} attempts")]
    StoreUnavailable {
        attempts: u32,
        #[source]
        source: StoreError,
    },
    #[error("failed to ensure the users schema")]
    Schema(#[source] StoreError),
    #[error("failed to ensure the seed credential")]
    Seed(#[source] SeedError),
    #[error("illegal bootstrap transition from {from} to {to}")]
    IllegalTransition {
        from: BootstrapState,
        to: BootstrapState,
    },
}

pub struct Bootstrap {
    store: SharedStore,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    seed: Seed,
    state: BootstrapState,
}

impl Bootstrap {
    #[must_use]
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            policy: RetryPolicy::default(),
            sleeper: Arc::new(TokioSleeper),
            seed: Seed::default(),
            state: BootstrapState::NotStarted,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: Seed) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub const fn state(&self) -> BootstrapState {
        self.state
    }

    /// Bring the store to a usable state.
    ///
    /// # Errors
    /// Returns `StoreUnavailable` once the retry policy is exhausted, or the
    /// first schema/seed failure. All of them are fatal for the process.
    #[instrument(skip(self), fields(policy = ?self.policy))]
    pub async fn run(&mut self) -> Result<BootstrapReport, BootstrapError> {
        let attempts = self.wait_for_store().await?;

        self.store
            .ensure_schema()
            .await
            .map_err(BootstrapError::Schema)?;
        self.transition(BootstrapState::SchemaReady)?;
        info!("Table 'users' ready");

        let seed = self.ensure_seed().await.map_err(BootstrapError::Seed)?;
        self.transition(BootstrapState::SeedChecked)?;

        self.transition(BootstrapState::Ready)?;

        Ok(BootstrapReport { attempts, seed })
    }

    async fn wait_for_store(&mut self) -> Result<u32, BootstrapError> {
        self.transition(BootstrapState::WaitingForStore)?;

        let mut attempt = 0;
        loop {
            attempt += 1;

            match self.store.ping().await {
                Ok(()) => {
                    info!(attempt, "Credential store ready");
                    return Ok(attempt);
                }
                Err(err) => match self.policy.delay_after(attempt) {
                    Some(delay) => {
                        warn!(
                            attempt,
                            max_attempts = self.policy.max_attempts,
                            "Waiting for credential store: {}",
                            err
                        );
                        self.sleeper.sleep(delay).await;
                    }
                    None => {
                        self.transition(BootstrapState::Failed)?;
                        error!(attempt, "Credential store unavailable: {}", err);
                        return Err(BootstrapError::StoreUnavailable {
                            attempts: attempt,
                            source: err,
                        });
                    }
                },
            }
        }
    }

    async fn ensure_seed(&self) -> Result<SeedOutcome, SeedError> {
        let username = self.seed.username.as_str();

        if self.store.find_by_username(username).await?.is_some() {
            info!("Seed user '{}' already present", username);
            return Ok(SeedOutcome::AlreadyPresent);
        }

        let password_hash = password::hash(self.seed.secret.clone()).await?;

        if self.store.insert_if_absent(username, &password_hash).await? {
            info!("Seed user '{}' created", username);
            Ok(SeedOutcome::Created)
        } else {
            debug!("Seed user '{}' inserted concurrently", username);
            Ok(SeedOutcome::AlreadyPresent)
        }
    }

    fn transition(&mut self, next: BootstrapState) -> Result<(), BootstrapError> {
        if !self.state.can_transition_to(next) {
            return Err(BootstrapError::IllegalTransition {
                from: self.state,
                to: next,
            });
        }

        debug!("Bootstrap state {} -> {}", self.state, next);
        self.state = next;

        Ok(())
    }
}
