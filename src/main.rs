use std::sync::Arc;

use tracing::{error, info};

use serene::assistant::{Assistant, GeminiClient};
use serene::stress::StressDetector;
use serene::web::{AppState, WebServer};
use serene::{ChatHub, Config, Database};

/// Default configuration file path.
const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    // Load configuration
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {config_path}: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };

    // Initialize logging
    if let Err(e) = serene::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        serene::logging::init_console_only(&config.logging.level);
    }

    info!("Serene - wellness community backend");

    if let Err(e) = run(config).await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> serene::Result<()> {
    config.validate()?;

    let db = Database::open(&config.database.path).await?;
    info!("Database opened at {}", config.database.path);

    let hub = Arc::new(ChatHub::with_config(db.pool().clone(), config.chat.clone()));
    let users = hub.seed_users(&config.chat.seed_users).await?;
    info!("User directory holds {} identities", users);
    hub.initialize().await?;

    let stress = StressDetector::new(config.stress.clone());
    let generator = GeminiClient::from_env(config.assistant.clone())?;
    let assistant = Assistant::new(Arc::new(generator));

    let state = Arc::new(AppState::new(hub, stress, assistant));
    let server = WebServer::new(&config.server, state)?;
    info!(
        "Server configured on {}:{}",
        config.server.host, config.server.port
    );

    server.run_until(shutdown_signal()).await?;
    db.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
