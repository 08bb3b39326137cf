//! Yasmin chat widget server entry point.
//!
//! Binary name: `yasmin`
//!
//! Parses CLI arguments (with environment-variable fallbacks), initializes
//! the database and provider chain, then serves the HTTP API and the
//! static widget assets.

mod http;
mod state;

use clap::Parser;
use secrecy::SecretString;
use tracing_subscriber::EnvFilter;

use yasmin_types::config::ServerConfig;

use state::AppState;

#[derive(Parser)]
#[command(name = "yasmin", version, about = "Yasmin chat widget server")]
struct Cli {
    /// SQLite connection string (e.g. sqlite://yasmin.db?mode=rwc)
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Primary provider credential (OpenRouter)
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    openrouter_api_key: Option<String>,

    /// Backup provider credential (Gemini)
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: Option<String>,

    /// Public base URL, sent as the attribution referer to OpenRouter
    #[arg(long, env = "APP_URL", default_value = "http://localhost:5000")]
    app_url: String,

    /// Display title, sent as the attribution title to OpenRouter
    #[arg(long, env = "APP_TITLE", default_value = "Yasmin GPT Chat")]
    app_title: String,

    /// Maximum history turns forwarded upstream per request
    #[arg(long, env = "YASMIN_HISTORY_LIMIT", default_value_t = 10)]
    history_limit: usize,

    /// Bind address
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Bind port
    #[arg(long, default_value_t = 5000)]
    port: u16,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,yasmin=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    let config = ServerConfig {
        database_url: cli.database_url,
        primary_api_key: cli.openrouter_api_key.map(SecretString::from),
        backup_api_key: cli.gemini_api_key.map(SecretString::from),
        app_url: cli.app_url,
        app_title: cli.app_title,
        history_limit: cli.history_limit,
    };

    if !config.has_any_provider() {
        tracing::warn!("No provider credentials configured; only offline replies are available");
    }

    // Initialize application state (DB, services)
    let app_state = AppState::init(config).await?;

    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Yasmin API listening");

    let router = http::router::build_router(app_state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
