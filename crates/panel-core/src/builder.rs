//! Builder pattern for constructing panel engines.
//!
//! Composes a PanelEngine from pluggable storage and identity
//! implementations using factory functions. Each implementation's
//! configuration is validated against its declared schema before the
//! primary backend is selected.

use crate::dashboard::{DashboardAggregator, StorageProductCatalog};
use crate::lifecycle::OrderLifecycle;
use crate::PanelEngine;
use panel_config::Config;
use panel_identity::{IdentityError, IdentityInterface, IdentityService};
use panel_storage::{StorageError, StorageInterface, StorageService};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during panel engine construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
}

/// Container for the factory functions needed to build a PanelEngine.
///
/// Each factory takes a TOML configuration value and returns the
/// corresponding implementation.
pub struct PanelFactories<SF, IF> {
	pub storage_factories: HashMap<String, SF>,
	pub identity_factories: HashMap<String, IF>,
}

/// Builder for constructing a PanelEngine with pluggable implementations.
pub struct PanelBuilder {
	config: Config,
}

impl PanelBuilder {
	/// Creates a new PanelBuilder with the given configuration.
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Builds the PanelEngine using factories for each component type.
	pub fn build<SF, IF>(
		self,
		factories: PanelFactories<SF, IF>,
	) -> Result<PanelEngine, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
		IF: Fn(&toml::Value) -> Result<Box<dyn IdentityInterface>, IdentityError>,
	{
		// Create storage implementations
		let mut storage_impls = HashMap::new();
		for (name, config) in &self.config.storage.implementations {
			if let Some(factory) = factories.storage_factories.get(name) {
				let implementation = factory(config).map_err(|e| {
					BuilderError::Config(format!(
						"Failed to create storage implementation '{}': {}",
						name, e
					))
				})?;
				implementation
					.config_schema()
					.validate(config)
					.map_err(|e| {
						BuilderError::Config(format!(
							"Invalid configuration for storage implementation '{}': {}",
							name, e
						))
					})?;
				let is_primary = &self.config.storage.primary == name;
				tracing::info!(component = "storage", implementation = %name, enabled = %is_primary, "Loaded");
				storage_impls.insert(name.clone(), implementation);
			}
		}

		let primary_storage = &self.config.storage.primary;
		let storage_backend = storage_impls.remove(primary_storage).ok_or_else(|| {
			BuilderError::Config(format!(
				"Primary storage '{}' failed to load or has invalid configuration",
				primary_storage
			))
		})?;

		let mut storage_service = StorageService::new(storage_backend);
		if let Some(limit_ms) = self.config.storage.operation_timeout_ms {
			storage_service =
				storage_service.with_operation_timeout(Duration::from_millis(limit_ms));
		}
		let storage = Arc::new(storage_service);

		// Create identity implementations
		let mut identity_impls = HashMap::new();
		for (name, config) in &self.config.identity.implementations {
			if let Some(factory) = factories.identity_factories.get(name) {
				let implementation = factory(config).map_err(|e| {
					BuilderError::Config(format!(
						"Failed to create identity implementation '{}': {}",
						name, e
					))
				})?;
				implementation
					.config_schema()
					.validate(config)
					.map_err(|e| {
						BuilderError::Config(format!(
							"Invalid configuration for identity implementation '{}': {}",
							name, e
						))
					})?;
				let is_primary = &self.config.identity.primary == name;
				tracing::info!(component = "identity", implementation = %name, enabled = %is_primary, "Loaded");
				identity_impls.insert(name.clone(), implementation);
			}
		}

		let primary_identity = &self.config.identity.primary;
		let identity_backend = identity_impls.remove(primary_identity).ok_or_else(|| {
			BuilderError::Config(format!(
				"Primary identity '{}' failed to load or has invalid configuration",
				primary_identity
			))
		})?;
		let identity = Arc::new(IdentityService::new(identity_backend));

		let orders = OrderLifecycle::new(Arc::clone(&storage));
		let dashboard = DashboardAggregator::new(
			orders.repository().clone(),
			Arc::new(StorageProductCatalog::new(Arc::clone(&storage))),
		);

		Ok(PanelEngine::new(
			self.config,
			storage,
			identity,
			orders,
			dashboard,
		))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use panel_identity::implementations::static_tokens;
	use panel_storage::implementations::memory;
	use panel_storage::StorageFactory;

	fn config(primary_storage: &str) -> Config {
		format!(
			r#"
			[panel]
			id = "vendor-panel"

			[storage]
			primary = "{}"
			[storage.implementations.memory]

			[identity]
			primary = "static_tokens"
			[identity.implementations.static_tokens.tokens.tok-1]
			vendor_id = "v-1"
			status = "approved"
			"#,
			primary_storage
		)
		.parse()
		.unwrap()
	}

	fn factories() -> PanelFactories<StorageFactory, panel_identity::IdentityFactory> {
		PanelFactories {
			storage_factories: HashMap::from([(
				"memory".to_string(),
				memory::create_storage as StorageFactory,
			)]),
			identity_factories: HashMap::from([(
				"static_tokens".to_string(),
				static_tokens::create_identity as panel_identity::IdentityFactory,
			)]),
		}
	}

	#[tokio::test]
	async fn builds_an_engine_from_factories() {
		let engine = PanelBuilder::new(config("memory")).build(factories()).unwrap();
		assert_eq!(engine.config().panel.id, "vendor-panel");

		let vendor = engine.identity().resolve("tok-1").await.unwrap();
		assert_eq!(vendor.vendor_id, "v-1");
	}

	#[test]
	fn missing_primary_factory_fails() {
		let mut factories = factories();
		factories.storage_factories.clear();

		let result = PanelBuilder::new(config("memory")).build(factories);
		assert!(matches!(result, Err(BuilderError::Config(_))));
	}
}
