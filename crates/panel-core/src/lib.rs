//! Core engine for the vendor panel system.
//!
//! This module ties the panel's pieces together: the order repository and
//! lifecycle state machine, the dashboard aggregator and the identity
//! service, all over a pluggable storage backend. The [`builder`] module
//! provides the factory pattern for assembling an engine instance from
//! configuration.

use panel_config::Config;
use panel_identity::IdentityService;
use panel_storage::StorageService;
use std::sync::Arc;

pub mod builder;
pub mod dashboard;
pub mod lifecycle;
pub mod orders;

pub use builder::{BuilderError, PanelBuilder, PanelFactories};
pub use dashboard::{DashboardAggregator, DashboardError, ProductCatalog, StorageProductCatalog};
pub use lifecycle::{allowed_targets, OrderError, OrderLifecycle};
pub use orders::{OrderFilter, OrderRepository};

/// Main engine that owns the panel's services.
///
/// Constructed through [`PanelBuilder`]; the HTTP layer only ever talks to
/// the engine's accessors.
pub struct PanelEngine {
	/// Panel configuration.
	config: Config,
	/// Storage service for persisting records.
	storage: Arc<StorageService>,
	/// Identity service resolving credentials and gating approval.
	identity: Arc<IdentityService>,
	/// Order creation and status transitions.
	orders: OrderLifecycle,
	/// Dashboard and statistics aggregation.
	dashboard: DashboardAggregator,
}

impl PanelEngine {
	pub fn new(
		config: Config,
		storage: Arc<StorageService>,
		identity: Arc<IdentityService>,
		orders: OrderLifecycle,
		dashboard: DashboardAggregator,
	) -> Self {
		Self {
			config,
			storage,
			identity,
			orders,
			dashboard,
		}
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn storage(&self) -> &Arc<StorageService> {
		&self.storage
	}

	pub fn identity(&self) -> &Arc<IdentityService> {
		&self.identity
	}

	pub fn orders(&self) -> &OrderLifecycle {
		&self.orders
	}

	pub fn dashboard(&self) -> &DashboardAggregator {
		&self.dashboard
	}
}
