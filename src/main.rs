//! Visualization data service entry point.
//!
//! Loads configuration, initializes tracing, connects the document store,
//! loads the dataset into it, and only then binds the HTTP listener. Any
//! failure before the listener is bound aborts startup.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use visualization_server::config::{AppConfig, DEFAULT_CONFIG_PATH, DEFAULT_LOG_FILTER};
use visualization_server::{service, store};

/// Serves a JSON dataset loaded into a document database
#[derive(Parser, Debug)]
#[command(name = "visualization-server", version, about)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Log level filter (e.g., "visualization_server=debug,tower_http=info")
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Loaded before tracing since `logging.format` picks the text or json
    // layer; a load error reaches stderr through main's Err return.
    let config = AppConfig::load(&args.config)?;

    // Initialize tracing with priority: CLI > env > default
    let log_filter = args
        .log_level
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    let (text_layer, json_layer) = if config.logging.is_json() {
        (None, Some(tracing_subscriber::fmt::layer().json()))
    } else {
        (Some(tracing_subscriber::fmt::layer()), None)
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&log_filter))
        .with(text_layer)
        .with(json_layer)
        .init();

    tracing::info!(
        config = %args.config,
        backend = ?config.database.backend,
        collection = %config.database.collection,
        dataset = %config.dataset.path,
        load_mode = %config.dataset.load_mode,
        "Loaded configuration"
    );

    let db = store::connect(&config.database).await?;

    service::run(&config, db).await?;
    Ok(())
}
