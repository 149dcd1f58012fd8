//! Database connection pool management.

use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;

use super::{decide, migrate, MigrationDecision, MigrationError, MigrationFlags, MigrationMode};
use crate::config::{Config, SslMode};

/// Type alias for the database pool.
pub type Pool = PgPool;

const MAX_CONNECTIONS: u32 = 10;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Startup could not produce a usable pool.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Failed to connect to database: {0}")]
    Connect(#[source] sqlx::Error),

    #[error(transparent)]
    Migration(#[from] MigrationError),
}

/// Connection options equivalent to [`Config::dsn`].
pub fn connect_options(config: &Config) -> PgConnectOptions {
    // Always set, even when empty, so PGPASSWORD and .pgpass are not consulted.
    PgConnectOptions::new()
        .host(&config.db_host)
        .port(config.db_port)
        .username(&config.db_user)
        .password(&config.db_password)
        .database(&config.db_name)
        .ssl_mode(pg_ssl_mode(config.db_ssl_mode))
}

fn pg_ssl_mode(mode: SslMode) -> PgSslMode {
    match mode {
        SslMode::Disable => PgSslMode::Disable,
        SslMode::Allow => PgSslMode::Allow,
        SslMode::Prefer => PgSslMode::Prefer,
        SslMode::Require => PgSslMode::Require,
        SslMode::VerifyCa => PgSslMode::VerifyCa,
        SslMode::VerifyFull => PgSslMode::VerifyFull,
    }
}

/// Create a new database connection pool.
///
/// Connects eagerly so an unreachable database is reported here.
pub async fn create_pool(config: &Config) -> Result<Pool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect_with(connect_options(config))
        .await
}

/// Connect, then run the startup migration if the flags call for it.
pub async fn connect_and_maybe_migrate(
    config: &Config,
    flags: &MigrationFlags,
) -> Result<Pool, BootstrapError> {
    let pool = create_pool(config)
        .await
        .map_err(BootstrapError::Connect)?;

    tracing::info!("Database connected successfully ({})", config.redacted_dsn());

    match decide(flags) {
        MigrationDecision::Run => {
            migrate(&pool, MigrationMode::Startup).await?;
        }
        MigrationDecision::Skip(reason) => tracing::info!("{}", reason),
    }

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DB_HOST, DB_NAME, DB_PASS, DB_PORT, DB_SSL, DB_USER};
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Config {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::resolve(&env).unwrap()
    }

    #[test]
    fn options_follow_config() {
        let config = config(&[
            (DB_HOST, "db.internal"),
            (DB_PORT, "6543"),
            (DB_USER, "shop"),
            (DB_PASS, "pw"),
            (DB_NAME, "storefront"),
            (DB_SSL, "require"),
        ]);
        let options = connect_options(&config);

        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_username(), "shop");
        assert_eq!(options.get_database(), Some("storefront"));
    }

    #[test]
    fn empty_password_is_sent_as_empty() {
        let config = config(&[(DB_NAME, "storefront")]);
        let options = format!("{:?}", connect_options(&config));
        assert!(options.contains(r#"password: Some("")"#), "{options}");
    }

    #[test]
    fn ssl_modes_map_one_to_one() {
        assert!(matches!(pg_ssl_mode(SslMode::Disable), PgSslMode::Disable));
        assert!(matches!(pg_ssl_mode(SslMode::VerifyCa), PgSslMode::VerifyCa));
        assert!(matches!(
            pg_ssl_mode(SslMode::VerifyFull),
            PgSslMode::VerifyFull
        ));
    }

    #[test]
    fn bootstrap_error_display() {
        let err = BootstrapError::Connect(sqlx::Error::PoolTimedOut);
        assert!(err
            .to_string()
            .starts_with("Failed to connect to database:"));

        let err = BootstrapError::from(MigrationError {
            mode: MigrationMode::Startup,
            source: sqlx::Error::PoolClosed,
        });
        assert!(err.to_string().starts_with("startup migration failed"));
    }
}
