//! Order lifecycle state machine.
//!
//! Orders move pending -> preparing -> on_the_way -> delivered, with
//! cancellation allowed from any non-terminal state. Every accepted
//! transition appends exactly one entry to the order's status history;
//! delivered and cancelled orders accept no further transitions.

use crate::orders::OrderRepository;
use chrono::Utc;
use once_cell::sync::Lazy;
use panel_storage::{StorageError, StorageService};
use panel_types::{new_order_number, Order, OrderDraft, OrderStatus, StatusChange, StorageTable};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while creating or transitioning orders.
#[derive(Debug, Error)]
pub enum OrderError {
	/// The order does not exist, or belongs to another vendor.
	#[error("order not found")]
	NotFound,
	/// The requested move is not in the transition table.
	#[error("cannot transition order from {from} to {to}")]
	InvalidTransition { from: OrderStatus, to: OrderStatus },
	/// Error from the storage layer.
	#[error("Storage error: {0}")]
	Storage(StorageError),
}

impl From<StorageError> for OrderError {
	fn from(err: StorageError) -> Self {
		match err {
			StorageError::NotFound => OrderError::NotFound,
			other => OrderError::Storage(other),
		}
	}
}

// Static transition table - each status maps to its allowed next statuses
static TRANSITIONS: Lazy<HashMap<OrderStatus, HashSet<OrderStatus>>> = Lazy::new(|| {
	let mut m = HashMap::new();
	m.insert(
		OrderStatus::Pending,
		HashSet::from([OrderStatus::Preparing, OrderStatus::Cancelled]),
	);
	m.insert(
		OrderStatus::Preparing,
		HashSet::from([OrderStatus::OnTheWay, OrderStatus::Cancelled]),
	);
	m.insert(
		OrderStatus::OnTheWay,
		HashSet::from([OrderStatus::Delivered, OrderStatus::Cancelled]),
	);
	m.insert(OrderStatus::Delivered, HashSet::new()); // terminal
	m.insert(OrderStatus::Cancelled, HashSet::new()); // terminal
	m
});

static NO_TARGETS: Lazy<HashSet<OrderStatus>> = Lazy::new(HashSet::new);

/// Returns the set of statuses an order may move to from `from`.
pub fn allowed_targets(from: OrderStatus) -> &'static HashSet<OrderStatus> {
	TRANSITIONS.get(&from).unwrap_or(&NO_TARGETS)
}

/// Manages order creation and status transitions with persistence.
pub struct OrderLifecycle {
	storage: Arc<StorageService>,
	repository: OrderRepository,
}

impl OrderLifecycle {
	pub fn new(storage: Arc<StorageService>) -> Self {
		let repository = OrderRepository::new(Arc::clone(&storage));
		Self {
			storage,
			repository,
		}
	}

	/// The repository backing this lifecycle engine.
	pub fn repository(&self) -> &OrderRepository {
		&self.repository
	}

	/// Builds a new order record from a draft.
	///
	/// Assigns the id, synthesizes an order number when the draft carries
	/// none and seeds the status history with the creation status.
	pub fn new_order(&self, vendor_id: &str, draft: OrderDraft) -> Order {
		let now = Utc::now();
		let status = draft.status.unwrap_or(OrderStatus::Pending);
		let order_number = draft
			.order_number
			.unwrap_or_else(|| new_order_number(now));

		Order {
			id: uuid::Uuid::new_v4().to_string(),
			vendor_id: vendor_id.to_string(),
			order_number,
			customer_info: draft.customer_info,
			items: draft.items,
			subtotal: draft.subtotal,
			delivery_fee: draft.delivery_fee,
			total: draft.total,
			payment_status: draft.payment_status,
			status,
			status_history: vec![StatusChange {
				status,
				changed_at: now,
				note: None,
			}],
			notes: draft.notes,
			created_at: now,
			updated_at: now,
		}
	}

	/// Creates and persists a new order for the vendor.
	///
	/// An order-number collision surfaces as
	/// [`OrderError::Storage`] carrying [`StorageError::AlreadyExists`];
	/// the number is never re-rolled.
	pub async fn create_order(
		&self,
		vendor_id: &str,
		draft: OrderDraft,
	) -> Result<Order, OrderError> {
		let order = self.new_order(vendor_id, draft);
		match self.repository.insert(&order).await {
			Ok(()) => Ok(order),
			Err(err) => Err(OrderError::Storage(err)),
		}
	}

	/// Moves an order to a new status.
	///
	/// Holds the per-order lock across the load-validate-persist sequence so
	/// concurrent transitions on the same order serialize instead of losing
	/// history entries.
	pub async fn transition(
		&self,
		order_id: &str,
		vendor_id: &str,
		target: OrderStatus,
		note: Option<String>,
	) -> Result<Order, OrderError> {
		let record_id = OrderRepository::record_id(vendor_id, order_id);
		let _guard = self
			.storage
			.lock(StorageTable::Orders.as_str(), &record_id)
			.await;

		let mut order = self.repository.get(vendor_id, order_id).await?;

		if !allowed_targets(order.status).contains(&target) {
			return Err(OrderError::InvalidTransition {
				from: order.status,
				to: target,
			});
		}

		let now = Utc::now();
		order.status = target;
		order.status_history.push(StatusChange {
			status: target,
			changed_at: now,
			note,
		});
		order.updated_at = now;
		self.repository.persist(&order).await?;

		tracing::info!(
			order_id = %order.id,
			status = %target,
			"Order status updated"
		);

		Ok(order)
	}
}
