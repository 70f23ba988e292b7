use crate::bootstrap::{Backoff, RetryPolicy};
use anyhow::{anyhow, Result};
use clap::{Arg, ArgMatches, Command};
use std::time::Duration;

pub const ARG_BOOTSTRAP_RETRIES: &str = "bootstrap-retries";
pub const ARG_BOOTSTRAP_RETRY_DELAY_MS: &str = "bootstrap-retry-delay-ms";
pub const ARG_BOOTSTRAP_BACKOFF: &str = "bootstrap-backoff";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_BOOTSTRAP_RETRIES)
                .long(ARG_BOOTSTRAP_RETRIES)
                .help("Attempts to reach the database before giving up")
                .env("PGLOGIN_BOOTSTRAP_RETRIES")
                .default_value("10")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new(ARG_BOOTSTRAP_RETRY_DELAY_MS)
                .long(ARG_BOOTSTRAP_RETRY_DELAY_MS)
                .help("Delay between database attempts, in milliseconds")
                .env("PGLOGIN_BOOTSTRAP_RETRY_DELAY_MS")
                .default_value("1000")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_BOOTSTRAP_BACKOFF)
                .long(ARG_BOOTSTRAP_BACKOFF)
                .help("Delay growth between attempts")
                .env("PGLOGIN_BOOTSTRAP_BACKOFF")
                .default_value("fixed")
                .value_parser(["fixed", "exponential"]),
        )
}

/// Build the readiness retry policy from validated matches.
///
/// # Errors
/// Returns an error if the backoff value cannot be parsed.
pub fn parse(matches: &ArgMatches) -> Result<RetryPolicy> {
    let max_attempts = matches
        .get_one::<u32>(ARG_BOOTSTRAP_RETRIES)
        .copied()
        .unwrap_or(10);
    let delay = Duration::from_millis(
        matches
            .get_one::<u64>(ARG_BOOTSTRAP_RETRY_DELAY_MS)
            .copied()
            .unwrap_or(1000),
    );
    let backoff = matches
        .get_one::<String>(ARG_BOOTSTRAP_BACKOFF)
        .map_or(Ok(Backoff::Fixed), |value| value.parse::<Backoff>())
        .map_err(|e| anyhow!(e))?;

    Ok(RetryPolicy::new(max_attempts, delay).with_backoff(backoff))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn command() -> Command {
        with_args(Command::new("pglogin"))
    }

    #[test]
    fn defaults_match_the_fixed_wait_loop() {
        temp_env::with_vars_unset(
            [
                "PGLOGIN_BOOTSTRAP_RETRIES",
                "PGLOGIN_BOOTSTRAP_RETRY_DELAY_MS",
                "PGLOGIN_BOOTSTRAP_BACKOFF",
            ],
            || {
                let matches = command().get_matches_from(vec!["pglogin"]);
                assert_eq!(parse(&matches).unwrap(), RetryPolicy::default());
            },
        );
    }

    #[test]
    fn exponential_backoff_from_env() {
        temp_env::with_vars(
            [
                ("PGLOGIN_BOOTSTRAP_RETRIES", Some("3")),
                ("PGLOGIN_BOOTSTRAP_RETRY_DELAY_MS", Some("50")),
                ("PGLOGIN_BOOTSTRAP_BACKOFF", Some("exponential")),
            ],
            || {
                let matches = command().get_matches_from(vec!["pglogin"]);
                let policy = parse(&matches).unwrap();
                assert_eq!(policy.max_attempts, 3);
                assert_eq!(policy.delay, Duration::from_millis(50));
                assert!(matches!(policy.backoff, Backoff::Exponential { .. }));
            },
        );
    }

    #[test]
    fn zero_retries_is_rejected() {
        let result = command().try_get_matches_from(vec!["pglogin", "--bootstrap-retries", "0"]);
        assert!(result.is_err());
    }
}
