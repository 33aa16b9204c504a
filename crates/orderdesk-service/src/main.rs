//! Main entry point for the orderdesk service.
//!
//! This binary wires the configured storage backend, the order store, and
//! the HTTP API together. It loads configuration from a TOML file, sets up
//! logging, and serves until interrupted.

use clap::Parser;
use orderdesk_config::Config;
use orderdesk_core::{EventBus, OrderStore};
use orderdesk_storage::{get_all_implementations, StorageService};
use std::path::PathBuf;
use std::sync::Arc;

mod apis;
mod server;

/// Command-line arguments for the orderdesk service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

/// Main entry point for the orderdesk service.
///
/// This function:
/// 1. Parses command-line arguments
/// 2. Initializes logging infrastructure
/// 3. Loads configuration from file
/// 4. Builds the order store on the configured storage backend
/// 5. Serves the HTTP API until interrupted
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt().with_env_filter(env_filter).with_target(true).init();

	// Load configuration
	let config_path = args
		.config
		.to_str()
		.ok_or("Configuration path is not valid UTF-8")?;
	let config = Config::from_file(config_path).await?;
	tracing::info!("Loaded configuration [{}]", config.service.id);

	// Build the storage backend selected by the configuration
	let storage = build_storage(&config)?;
	let storage = Arc::new(StorageService::new(storage));
	tracing::info!(component = "storage", implementation = %config.storage.primary, "Loaded");

	// Event bus plus a subscriber that mirrors committed changes into the log
	let events = EventBus::new(1000);
	spawn_event_logger(&events);

	let store = Arc::new(OrderStore::new(storage, events));

	// Serve the API
	match config.api.clone() {
		Some(api_config) if api_config.enabled => {
			server::start_server(api_config, store).await?;
		}
		_ => {
			tracing::warn!("API server disabled in configuration - nothing to do");
		}
	}

	tracing::info!("Stopped orderdesk");
	Ok(())
}

/// Creates the primary storage backend from the configuration.
fn build_storage(
	config: &Config,
) -> Result<Box<dyn orderdesk_storage::StorageInterface>, Box<dyn std::error::Error>> {
	let primary = config.storage.primary.as_str();
	let backend_config = config
		.storage
		.implementations
		.get(primary)
		.cloned()
		.unwrap_or(toml::Value::Table(Default::default()));

	let factory = get_all_implementations()
		.into_iter()
		.find(|(name, _)| *name == primary)
		.map(|(_, factory)| factory)
		.ok_or_else(|| format!("Unknown storage implementation '{}'", primary))?;

	Ok(factory(&backend_config)?)
}

/// Subscribes to the event bus and logs every committed order change.
fn spawn_event_logger(events: &EventBus) {
	let mut receiver = events.subscribe();
	tokio::spawn(async move {
		loop {
			match receiver.recv().await {
				Ok(event) => tracing::debug!(event = ?event, "Order event"),
				Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
					tracing::warn!(missed, "Event logger lagged behind the bus");
				}
				Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
			}
		}
	});
}
