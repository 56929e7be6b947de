//! policypilot-server - Compliance Training Service
//!
//! Serves the PolicyPilot admin and learner APIs: policy document uploads,
//! campaign generation, publish/nudge workflows, and assignment delivery.

use anyhow::Result;
use clap::Parser;
use policypilot_common::config::ServerConfig;
use policypilot_server::services::email::{EmailDelivery, HttpRelayDelivery, LogOnlyDelivery};
use policypilot_server::services::generation::Generator;
use policypilot_server::services::storage::LocalObjectStorage;
use policypilot_server::AppState;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "policypilot-server", version)]
struct Cli {
    /// Path to a TOML config file (overrides POLICYPILOT_CONFIG)
    #[arg(long, env = "POLICYPILOT_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let config = ServerConfig::load(cli.config.as_deref())?;

    info!("Starting policypilot-server");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Data directory: {}", config.data_dir.display());

    std::fs::create_dir_all(&config.data_dir)?;

    let db_path = config.database_path();
    info!("Database: {}", db_path.display());
    let db = policypilot_server::db::init_database_pool(&db_path).await?;
    info!("Database connection established");

    let storage = Arc::new(LocalObjectStorage::new(config.storage_root()));

    let email: Arc<dyn EmailDelivery> = match &config.email_relay_url {
        Some(url) => {
            info!("Email relay: {}", url);
            Arc::new(HttpRelayDelivery::new(url.clone()))
        }
        None => {
            info!("Email relay not configured; deliveries are logged only");
            Arc::new(LogOnlyDelivery)
        }
    };

    let generator = Generator::from_config(&config.generator);
    match &generator {
        Generator::AiBacked(_) => info!("Generator: AI-backed with deterministic fallback"),
        Generator::Deterministic => info!("Generator: deterministic only"),
    }

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(db, storage, email, generator, config);
    let app = policypilot_server::build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
