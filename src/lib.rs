//! # pglogin
//!
//! A small login service backed by a single PostgreSQL table.
//!
//! ## Startup
//!
//! Before the HTTP listener binds, the [`bootstrap`] sequence waits for the
//! database with a bounded retry policy, creates the `users` table if it is
//! missing and seeds the default `Usertest` credential. Any failure there is
//! fatal: the process exits non-zero instead of serving requests against a
//! store it cannot use.
//!
//! ## Login
//!
//! `POST /login` looks the username up and verifies the submitted secret
//! against a salted Argon2id hash. The outcome is a [`verifier::Verdict`];
//! store failures are reported separately as [`verifier::LoginError`] and
//! rendered as `500` without affecting other requests.

pub mod api;
pub mod bootstrap;
pub mod cli;
pub mod password;
pub mod store;
pub mod verifier;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(GIT_COMMIT_HASH.len() >= 7);
    }
}
