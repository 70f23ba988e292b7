use anyhow::{anyhow, Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::PgConnectOptions;
use std::time::Duration;
use url::Url;

pub const ARG_DB_HOST: &str = "db-host";
pub const ARG_DB_PORT: &str = "db-port";
pub const ARG_DB_USER: &str = "db-user";
pub const ARG_DB_PASSWORD: &str = "db-password";
pub const ARG_DB_NAME: &str = "db-name";
pub const ARG_DB_QUERY_TIMEOUT_MS: &str = "db-query-timeout-ms";
pub const ARG_DB_MAX_CONNECTIONS: &str = "db-max-connections";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_DB_HOST)
                .long(ARG_DB_HOST)
                .help("PostgreSQL host")
                .env("DB_HOST")
                .required(true),
        )
        .arg(
            Arg::new(ARG_DB_PORT)
                .long(ARG_DB_PORT)
                .help("PostgreSQL port")
                .env("DB_PORT")
                .default_value("5432")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_DB_USER)
                .long(ARG_DB_USER)
                .help("PostgreSQL user")
                .env("DB_USER")
                .required(true),
        )
        .arg(
            Arg::new(ARG_DB_PASSWORD)
                .long(ARG_DB_PASSWORD)
                .help("PostgreSQL password")
                .env("DB_PASSWORD")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_DB_NAME)
                .long(ARG_DB_NAME)
                .help("PostgreSQL database name")
                .env("DB_NAME")
                .required(true),
        )
        .arg(
            Arg::new(ARG_DB_QUERY_TIMEOUT_MS)
                .long(ARG_DB_QUERY_TIMEOUT_MS)
                .help("Upper bound for every database statement, in milliseconds")
                .env("PGLOGIN_DB_QUERY_TIMEOUT_MS")
                .default_value("5000")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_DB_MAX_CONNECTIONS)
                .long(ARG_DB_MAX_CONNECTIONS)
                .help("Maximum number of pooled database connections")
                .env("PGLOGIN_DB_MAX_CONNECTIONS")
                .default_value("5")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
}

#[derive(Debug, Clone)]
pub struct Options {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: SecretString,
    pub name: String,
    pub query_timeout: Duration,
    pub max_connections: u32,
}

impl Options {
    /// Read database options from validated matches.
    ///
    /// # Errors
    /// Returns an error if a required argument is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let required = |id: &str| -> Result<String> {
            matches
                .get_one::<String>(id)
                .cloned()
                .with_context(|| format!("missing required argument: --{id}"))
        };

        Ok(Self {
            host: required(ARG_DB_HOST)?,
            port: matches.get_one::<u16>(ARG_DB_PORT).copied().unwrap_or(5432),
            user: required(ARG_DB_USER)?,
            password: SecretString::from(required(ARG_DB_PASSWORD)?),
            name: required(ARG_DB_NAME)?,
            query_timeout: Duration::from_millis(
                matches
                    .get_one::<u64>(ARG_DB_QUERY_TIMEOUT_MS)
                    .copied()
                    .unwrap_or(5000),
            ),
            max_connections: matches
                .get_one::<u32>(ARG_DB_MAX_CONNECTIONS)
                .copied()
                .unwrap_or(5),
        })
    }

    /// Connection URL with the credentials applied.
    ///
    /// # Errors
    /// Returns an error if the host or database name do not form a valid URL.
    pub fn dsn(&self) -> Result<Url> {
        let mut dsn = Url::parse(&format!("postgres://{}:{}/{}", self.host, self.port, self.name))
            .context("Invalid database host or name")?;

        dsn.set_username(&self.user)
            .map_err(|()| anyhow!("Error setting username"))?;

        dsn.set_password(Some(self.password.expose_secret()))
            .map_err(|()| anyhow!("Error setting password"))?;

        Ok(dsn)
    }

    /// # Errors
    /// Returns an error if the DSN cannot be built or parsed.
    pub fn connect_options(&self) -> Result<PgConnectOptions> {
        self.dsn()?
            .as_str()
            .parse::<PgConnectOptions>()
            .context("Invalid database connection options")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn matches(args: &[&str]) -> ArgMatches {
        let mut argv = vec!["pglogin"];
        argv.extend_from_slice(args);
        with_args(Command::new("pglogin")).get_matches_from(argv)
    }

    #[test]
    fn defaults_and_dsn() {
        temp_env::with_vars_unset(
            [
                "DB_HOST",
                "DB_PORT",
                "DB_USER",
                "DB_PASSWORD",
                "DB_NAME",
                "PGLOGIN_DB_QUERY_TIMEOUT_MS",
                "PGLOGIN_DB_MAX_CONNECTIONS",
            ],
            || {
                let options = Options::parse(&matches(&[
                    "--db-host",
                    "db",
                    "--db-user",
                    "postgres",
                    "--db-password",
                    "p@ss word",
                    "--db-name",
                    "logindb",
                ]))
                .unwrap();

                assert_eq!(options.port, 5432);
                assert_eq!(options.query_timeout, Duration::from_secs(5));
                assert_eq!(options.max_connections, 5);

                let dsn = options.dsn().unwrap();
                assert_eq!(dsn.host_str(), Some("db"));
                assert_eq!(dsn.port(), Some(5432));
                assert_eq!(dsn.path(), "/logindb");
                assert_eq!(dsn.username(), "postgres");
                assert!(dsn.password().is_some());

                assert!(options.connect_options().is_ok());
            },
        );
    }

    #[test]
    fn reads_environment() {
        temp_env::with_vars(
            [
                ("DB_HOST", Some("postgres")),
                ("DB_USER", Some("app")),
                ("DB_PASSWORD", Some("secret")),
                ("DB_NAME", Some("app")),
                ("DB_PORT", Some("6543")),
                ("PGLOGIN_DB_QUERY_TIMEOUT_MS", Some("250")),
            ],
            || {
                let options = Options::parse(&matches(&[])).unwrap();
                assert_eq!(options.host, "postgres");
                assert_eq!(options.port, 6543);
                assert_eq!(options.password.expose_secret(), "secret");
                assert_eq!(options.query_timeout, Duration::from_millis(250));
            },
        );
    }

    #[test]
    fn debug_hides_password() {
        temp_env::with_vars(
            [
                ("DB_HOST", Some("postgres")),
                ("DB_USER", Some("app")),
                ("DB_PASSWORD", Some("hunter2")),
                ("DB_NAME", Some("app")),
            ],
            || {
                let options = Options::parse(&matches(&[])).unwrap();
                assert!(!format!("{options:?}").contains("hunter2"));
            },
        );
    }
}
