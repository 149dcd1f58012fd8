//! Storefront Server - REST API entry point.
//!
//! Resolves configuration, connects to PostgreSQL, reconciles the schema when
//! enabled and serves HTTP. `migrate` runs the schema reconciliation on its
//! own and exits.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use storefront_server::config::{self, Config};
use storefront_server::db::{self, MigrationFlags, MigrationMode};
use storefront_server::AppState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "storefront-server")]
#[command(about = "Storefront REST API server", version, long_about = None)]
struct Cli {
    /// Dotenv file consulted for variables missing from the environment
    #[arg(long, env = "ENV_FILE", default_value = ".env")]
    env_file: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Connect, migrate if enabled, and serve HTTP (default)
    Serve,
    /// Reconcile the database schema and exit
    Migrate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Load configuration
    let env = config::runtime_env(&cli.env_file);
    let config = Config::resolve(&env).inspect_err(|e| {
        tracing::error!("Invalid configuration: {}", e);
    })?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, MigrationFlags::from_env(&env)).await,
        Command::Migrate => run_manual_migration(&config).await,
    }
}

async fn serve(config: Config, flags: MigrationFlags) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Starting Storefront API ({}) on port {}",
        config.app_env,
        config.port
    );

    let pool = db::connect_and_maybe_migrate(&config, &flags)
        .await
        .inspect_err(|e| tracing::error!("Startup failed: {}", e))?;

    let addr = format!("0.0.0.0:{}", config.port);
    let app = storefront_server::app(AppState {
        pool,
        config: Arc::new(config),
    });

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn run_manual_migration(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let pool = db::create_pool(config)
        .await
        .inspect_err(|e| tracing::error!("Failed to connect to database: {}", e))?;

    tracing::info!("Database connected successfully ({})", config.redacted_dsn());

    let report = db::migrate(&pool, MigrationMode::Manual)
        .await
        .inspect_err(|e| tracing::error!(fatal = e.is_fatal(), "{}", e))?;

    if report.is_empty() {
        tracing::info!("Schema is already up to date");
    }
    for change in &report.changes {
        tracing::info!("Applied: {}", change);
    }

    pool.close().await;
    Ok(())
}
