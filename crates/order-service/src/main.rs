//! Main entry point for the order processor service.
//!
//! Loads configuration, builds the order service with the configured storage
//! backend, serves the HTTP API when enabled and shuts everything down on
//! Ctrl-C.

use clap::Parser;
use order_config::{ApiConfig, Config};
use order_core::OrderService;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

mod apis;
mod factory_registry;
mod server;

/// Command-line arguments for the order processor.
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

/// Main entry point for the order processor.
///
/// This function:
/// 1. Parses command-line arguments
/// 2. Initializes logging infrastructure
/// 3. Loads configuration from file
/// 4. Builds the order service and starts its workers
/// 5. Serves the API (if enabled) until interrupted, then stops the workers
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	// Create env filter with default from args
	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started order processor");

	// Load configuration
	let config = Config::from_file(&args.config).await?;
	tracing::info!("Loaded configuration [{}]", config.service.id);

	let service = Arc::new(factory_registry::build_service_from_config(config.clone()).await?);

	run(service, config.api, shutdown_signal()).await?;
	tracing::info!("Stopped order processor");
	Ok(())
}

/// Serves the API when enabled until `shutdown` resolves, then stops the
/// workers. The workers are stopped even when the server fails.
async fn run<F>(
	service: Arc<OrderService>,
	api: Option<ApiConfig>,
	shutdown: F,
) -> Result<(), Box<dyn std::error::Error>>
where
	F: Future<Output = ()> + Send + 'static,
{
	let served = match api.filter(|api| api.enabled) {
		Some(api_config) => server::start_server(api_config, Arc::clone(&service), shutdown).await,
		None => {
			tracing::info!("API disabled, processing only");
			shutdown.await;
			Ok(())
		},
	};
	if let Err(e) = &served {
		tracing::error!(error = %e, "API server failed");
	}

	service.stop().await?;
	served
}

/// Resolves when Ctrl-C is received.
async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		tracing::error!(error = %e, "Failed to listen for shutdown signal");
	}
	tracing::info!("Shutdown signal received");
}
