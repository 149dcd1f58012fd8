//! Configuration management for the server.
//!
//! Values come from an [`EnvSource`]. At runtime that is the process
//! environment layered over an optional `.env` file; tests pass a plain map.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `APP_ENV` | `development` |
//! | `APP_PORT` | `3000` |
//! | `APP_URL` | `http://localhost:3000` |
//! | `DB_HOST` | `localhost` |
//! | `DB_PORT` | `5432` |
//! | `DB_USER` | `postgres` |
//! | `DB_PASS` | unset, required in production |
//! | `DB_NAME` | unset, always required |
//! | `DB_SSL` | `disable` |
//! | `JWT_SECRET` | unset, required in production (32+ characters) |
//! | `JWT_EXPIRES_IN` | `24h` |

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub const APP_ENV: &str = "APP_ENV";
pub const APP_PORT: &str = "APP_PORT";
pub const APP_URL: &str = "APP_URL";
pub const DB_HOST: &str = "DB_HOST";
pub const DB_PORT: &str = "DB_PORT";
pub const DB_USER: &str = "DB_USER";
pub const DB_PASS: &str = "DB_PASS";
pub const DB_NAME: &str = "DB_NAME";
pub const DB_SSL: &str = "DB_SSL";
pub const JWT_SECRET: &str = "JWT_SECRET";
pub const JWT_EXPIRES_IN: &str = "JWT_EXPIRES_IN";

/// Minimum JWT secret length accepted in production.
pub const MIN_SECRET_LEN: usize = 32;

/// A key-value lookup the configuration is read from.
pub trait EnvSource {
    /// Raw value for `key`, `None` if the key is not defined at all.
    fn get(&self, key: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// Two sources where any key defined in `primary` shadows `fallback`,
/// even when the primary value is empty.
#[derive(Debug, Clone)]
pub struct LayeredEnv<P, F> {
    pub primary: P,
    pub fallback: F,
}

impl<P, F> LayeredEnv<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P: EnvSource, F: EnvSource> EnvSource for LayeredEnv<P, F> {
    fn get(&self, key: &str) -> Option<String> {
        self.primary.get(key).or_else(|| self.fallback.get(key))
    }
}

/// Read `KEY=VALUE` entries from a dotenv file without touching the process
/// environment.
///
/// A missing or malformed file is not an error: a warning is logged and no
/// entries are returned, so a file that fails to parse contributes nothing.
pub fn load_env_file(path: &Path) -> HashMap<String, String> {
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(e) if e.not_found() => {
            tracing::warn!("No env file at {}, using process environment", path.display());
            return HashMap::new();
        }
        Err(e) => {
            tracing::warn!("Error loading env file {}: {}", path.display(), e);
            return HashMap::new();
        }
    };

    match iter.collect::<Result<HashMap<_, _>, _>>() {
        Ok(entries) => {
            tracing::debug!("Loaded {} entries from {}", entries.len(), path.display());
            entries
        }
        Err(e) => {
            tracing::warn!("Error loading env file {}: {}", path.display(), e);
            HashMap::new()
        }
    }
}

/// The process environment layered over the given env file.
pub fn runtime_env(env_file: &Path) -> LayeredEnv<ProcessEnv, HashMap<String, String>> {
    LayeredEnv::new(ProcessEnv, load_env_file(env_file))
}

/// Declared runtime context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentMode {
    Development,
    Production,
    Other(String),
}

impl DeploymentMode {
    pub fn parse(value: &str) -> Self {
        match value {
            "development" => Self::Development,
            "production" => Self::Production,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Other(name) => name,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// PostgreSQL `sslmode` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SslMode {
    Disable,
    Allow,
    Prefer,
    Require,
    VerifyCa,
    VerifyFull,
}

impl SslMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disable => "disable",
            Self::Allow => "allow",
            Self::Prefer => "prefer",
            Self::Require => "require",
            Self::VerifyCa => "verify-ca",
            Self::VerifyFull => "verify-full",
        }
    }
}

impl FromStr for SslMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "disable" => Ok(Self::Disable),
            "allow" => Ok(Self::Allow),
            "prefer" => Ok(Self::Prefer),
            "require" => Ok(Self::Require),
            "verify-ca" => Ok(Self::VerifyCa),
            "verify-full" => Ok(Self::VerifyFull),
            other => Err(ConfigError::InvalidSslMode(other.to_string())),
        }
    }
}

impl fmt::Display for SslMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server configuration, validated and immutable once resolved.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub app_env: DeploymentMode,
    pub port: u16,
    /// Public base URL of the API
    pub app_url: String,
    pub db_host: String,
    pub db_port: u16,
    pub db_user: String,
    pub db_password: String,
    pub db_name: String,
    pub db_ssl_mode: SslMode,
    /// Signing secret for auth tokens
    pub jwt_secret: String,
    /// Lifetime of issued auth tokens
    pub jwt_expires_in: Duration,
}

impl Config {
    /// Resolve and validate configuration from `env`.
    ///
    /// Keys that are absent or empty take their static default.
    pub fn resolve<E: EnvSource + ?Sized>(env: &E) -> Result<Self, ConfigError> {
        let config = Self {
            app_env: DeploymentMode::parse(&lookup(env, APP_ENV, "development")),
            port: parse_port(APP_PORT, lookup(env, APP_PORT, "3000"))?,
            app_url: lookup(env, APP_URL, "http://localhost:3000"),
            db_host: lookup(env, DB_HOST, "localhost"),
            db_port: parse_port(DB_PORT, lookup(env, DB_PORT, "5432"))?,
            db_user: lookup(env, DB_USER, "postgres"),
            db_ssl_mode: lookup(env, DB_SSL, "disable").parse()?,
            jwt_expires_in: parse_lifetime(JWT_EXPIRES_IN, lookup(env, JWT_EXPIRES_IN, "24h"))?,

            // No safe default; must come from the environment
            db_password: lookup(env, DB_PASS, ""),
            db_name: lookup(env, DB_NAME, ""),
            jwt_secret: lookup(env, JWT_SECRET, ""),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.app_env.is_production() {
            if self.db_password.is_empty() {
                return Err(ConfigError::RequiredInProduction(DB_PASS));
            }
            if self.jwt_secret.is_empty() {
                return Err(ConfigError::RequiredInProduction(JWT_SECRET));
            }
            if self.jwt_secret.chars().count() < MIN_SECRET_LEN {
                return Err(ConfigError::SecretTooShort {
                    key: JWT_SECRET,
                    min: MIN_SECRET_LEN,
                });
            }
            if self.db_ssl_mode == SslMode::Disable {
                tracing::warn!("SSL is disabled for database connection in production");
            }
        }

        if self.db_name.is_empty() {
            return Err(ConfigError::MissingField(DB_NAME));
        }

        Ok(())
    }

    /// Keyword/value connection string for the database.
    pub fn dsn(&self) -> String {
        self.render_dsn(&self.db_password)
    }

    /// [`Config::dsn`] with the password masked, for logs.
    pub fn redacted_dsn(&self) -> String {
        let masked = if self.db_password.is_empty() { "" } else { "********" };
        self.render_dsn(masked)
    }

    fn render_dsn(&self, password: &str) -> String {
        format!(
            "host={} user={} password={} dbname={} port={} sslmode={}",
            self.db_host, self.db_user, password, self.db_name, self.db_port, self.db_ssl_mode
        )
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("app_env", &self.app_env)
            .field("port", &self.port)
            .field("app_url", &self.app_url)
            .field("db_host", &self.db_host)
            .field("db_port", &self.db_port)
            .field("db_user", &self.db_user)
            .field("db_password", &"<redacted>")
            .field("db_name", &self.db_name)
            .field("db_ssl_mode", &self.db_ssl_mode)
            .field("jwt_secret", &"<redacted>")
            .field("jwt_expires_in", &self.jwt_expires_in)
            .finish()
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required for production environment")]
    RequiredInProduction(&'static str),

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{key} must be at least {min} characters long for production")]
    SecretTooShort { key: &'static str, min: usize },

    #[error("Invalid {key} value: {value}")]
    InvalidPort { key: &'static str, value: String },

    #[error("Invalid DB_SSL value: {0}")]
    InvalidSslMode(String),

    #[error("Invalid {key} duration: {value}")]
    InvalidDuration { key: &'static str, value: String },
}

fn lookup<E: EnvSource + ?Sized>(env: &E, key: &str, default: &str) -> String {
    env.get(key)
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_port(key: &'static str, value: String) -> Result<u16, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidPort { key, value })
}

fn parse_lifetime(key: &'static str, value: String) -> Result<Duration, ConfigError> {
    parse_duration(&value).ok_or(ConfigError::InvalidDuration { key, value })
}

/// Parse Go-style durations such as `24h`, `1h30m`, `1.5h` or `100us`.
///
/// Units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`; amounts may carry a
/// fraction and every amount needs a unit, except a bare `0`. Negative
/// durations are rejected.
pub fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.strip_prefix('+').unwrap_or(value);
    if value == "0" {
        return Some(Duration::ZERO);
    }
    if value.is_empty() {
        return None;
    }

    let mut rest = value;
    let mut total: u128 = 0;

    while !rest.is_empty() {
        let (whole, after) = split_digits(rest);
        let (fraction, after) = match after.strip_prefix('.') {
            Some(after_dot) => split_digits(after_dot),
            None => ("", after),
        };
        if whole.is_empty() && fraction.is_empty() {
            return None;
        }

        let unit_len = after
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(after.len());
        let unit: u128 = match &after[..unit_len] {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => 1_000_000_000,
            "m" => 60_000_000_000,
            "h" => 3_600_000_000_000,
            _ => return None,
        };
        rest = &after[unit_len..];

        if !whole.is_empty() {
            let amount: u128 = whole.parse().ok()?;
            total = total.checked_add(amount.checked_mul(unit)?)?;
        }
        if !fraction.is_empty() {
            // Digits past nanosecond precision cannot change the result.
            let fraction = &fraction[..fraction.len().min(18)];
            let scale = 10u128.pow(fraction.len() as u32);
            let amount: u128 = fraction.parse().ok()?;
            total = total.checked_add(amount * unit / scale)?;
        }
    }

    // Same ceiling as Go's int64 nanoseconds.
    if total > i64::MAX as u128 {
        return None;
    }
    Some(Duration::from_nanos(total as u64))
}

fn split_digits(value: &str) -> (&str, &str) {
    let end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    value.split_at(end)
}
