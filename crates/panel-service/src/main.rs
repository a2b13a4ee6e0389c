//! Main entry point for the vendor panel service.
//!
//! This binary serves the vendor back-office API: order listing and status
//! transitions, dashboard aggregation and identity-gated access. It uses a
//! modular architecture with pluggable implementations for storage and
//! identity resolution.

use clap::Parser;
use panel_config::Config;
use panel_core::{BuilderError, PanelBuilder, PanelEngine, PanelFactories};
use std::path::PathBuf;
use std::sync::Arc;

mod middleware;
mod server;

// Import implementations from individual crates
use panel_identity::implementations::static_tokens::create_identity;
use panel_storage::implementations::file::create_storage as create_file_storage;
use panel_storage::implementations::memory::create_storage as create_memory_storage;

/// Command-line arguments for the panel service.
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

/// Main entry point for the panel service.
///
/// This function:
/// 1. Parses command-line arguments
/// 2. Initializes logging infrastructure
/// 3. Loads configuration from file
/// 4. Builds the panel engine with all implementations
/// 5. Serves the API until interrupted
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

	tracing::info!("Started panel");

	// Load configuration
	let config = Config::from_file(&args.config.to_string_lossy()).await?;
	tracing::info!("Loaded configuration [{}]", config.panel.id);

	let api_config = config.api.clone().filter(|api| api.enabled);

	// Build panel engine with implementations
	let engine = Arc::new(build_panel(config)?);

	match api_config {
		Some(api_config) => {
			server::start_server(api_config, engine).await?;
			tracing::info!("API server finished");
		}
		None => {
			tracing::warn!("API server is disabled in configuration, nothing to serve");
		}
	}

	tracing::info!("Stopped panel");
	Ok(())
}

/// Macro to create a factory HashMap with the appropriate type aliases
macro_rules! create_factory_map {
	($interface:path, $error:path, $( $name:literal => $factory:expr ),* $(,)?) => {{
		let mut factories = std::collections::HashMap::new();
		$(
			factories.insert(
				$name.to_string(),
				$factory as fn(&toml::Value) -> Result<Box<dyn $interface>, $error>
			);
		)*
		factories
	}};
}

/// Builds the panel engine with all necessary implementations.
///
/// This function wires up all the concrete implementations for:
/// - Storage backends (e.g., in-memory, file)
/// - Identity resolvers (e.g., static token tables)
pub(crate) fn build_panel(config: Config) -> Result<PanelEngine, BuilderError> {
	let builder = PanelBuilder::new(config);

	// Storage factories (simple config-only interface)
	let storage_factories = create_factory_map!(
		panel_storage::StorageInterface,
		panel_storage::StorageError,
		"file" => create_file_storage,
		"memory" => create_memory_storage,
	);

	// Identity factories (simple config-only interface)
	let identity_factories = create_factory_map!(
		panel_identity::IdentityInterface,
		panel_identity::IdentityError,
		"static_tokens" => create_identity,
	);

	let factories = PanelFactories {
		storage_factories,
		identity_factories,
	};

	builder.build(factories)
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::tempdir;

	const MINIMAL_CONFIG: &str = r#"
[panel]
id = "test-panel"

[storage]
primary = "memory"

[storage.implementations.memory]

[identity]
primary = "static_tokens"

[identity.implementations.static_tokens.tokens.tok-1]
vendor_id = "v-1"
status = "approved"
"#;

	#[test]
	fn test_args_default_values() {
		let args = Args {
			config: PathBuf::from("config.toml"),
			log_level: "info".to_string(),
		};

		assert_eq!(args.config, PathBuf::from("config.toml"));
		assert_eq!(args.log_level, "info");
	}

	#[test]
	fn test_args_custom_values() {
		let args = Args {
			config: PathBuf::from("custom.toml"),
			log_level: "debug".to_string(),
		};

		assert_eq!(args.config, PathBuf::from("custom.toml"));
		assert_eq!(args.log_level, "debug");
	}

	#[test]
	fn test_create_factory_map_macro() {
		use panel_storage::{StorageError, StorageInterface};

		let factories = create_factory_map!(
			StorageInterface,
			StorageError,
			"memory" => create_memory_storage,
		);

		assert_eq!(factories.len(), 1);
		assert!(factories.contains_key("memory"));
	}

	#[test]
	fn test_create_factory_map_multiple_entries() {
		use panel_storage::{StorageError, StorageInterface};

		let factories = create_factory_map!(
			StorageInterface,
			StorageError,
			"memory" => create_memory_storage,
			"file" => create_file_storage,
		);

		assert_eq!(factories.len(), 2);
		assert!(factories.contains_key("memory"));
		assert!(factories.contains_key("file"));
	}

	#[test]
	fn test_identity_factories_creation() {
		let identity_factories = create_factory_map!(
			panel_identity::IdentityInterface,
			panel_identity::IdentityError,
			"static_tokens" => create_identity,
		);

		assert_eq!(identity_factories.len(), 1);
		assert!(identity_factories.contains_key("static_tokens"));
	}

	#[test]
	fn test_build_panel_with_minimal_config() {
		let config: Config = MINIMAL_CONFIG.parse().expect("Failed to parse config");

		let result = build_panel(config);

		assert!(result.is_ok(), "Failed to build panel: {:?}", result.err());

		let engine = result.unwrap();
		assert_eq!(engine.config().panel.id, "test-panel");
	}

	#[test]
	fn test_build_panel_rejects_unknown_primary() {
		let config: Config = MINIMAL_CONFIG
			.replace("primary = \"memory\"", "primary = \"redis\"")
			.parse()
			.expect("Failed to parse config");

		let result = build_panel(config);

		assert!(result.is_err());
	}

	#[tokio::test]
	async fn test_config_loads_from_file() {
		let temp_dir = tempdir().expect("Failed to create temp dir");
		let config_path = temp_dir.path().join("test_config.toml");

		std::fs::write(&config_path, MINIMAL_CONFIG).expect("Failed to write config");

		let config = Config::from_file(&config_path.to_string_lossy())
			.await
			.expect("Failed to load config");

		assert_eq!(config.panel.id, "test-panel");
		assert_eq!(config.storage.primary, "memory");
		assert_eq!(config.identity.primary, "static_tokens");
	}
}
