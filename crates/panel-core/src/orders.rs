//! Order persistence for the vendor panel.
//!
//! Orders are stored under `orders:<vendor_id>/<order_id>`, so every read is
//! scoped to the owning vendor by construction. A record requested with the
//! wrong vendor id is simply absent; callers cannot tell another vendor's
//! order apart from one that never existed. Order numbers are kept unique
//! through a create-if-absent index at `order_numbers:<order_number>`.

use chrono::{DateTime, Utc};
use panel_storage::{StorageError, StorageService};
use panel_types::{Order, OrderPage, OrderStatus, Pagination, PaymentStatus, StorageTable};
use std::sync::Arc;

/// Filter applied to order listings.
///
/// Date bounds apply to `created_at` and are inclusive on both ends.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
	pub status: Option<OrderStatus>,
	pub payment_status: Option<PaymentStatus>,
	pub from: Option<DateTime<Utc>>,
	pub to: Option<DateTime<Utc>>,
}

impl OrderFilter {
	fn matches(&self, order: &Order) -> bool {
		if let Some(status) = self.status {
			if order.status != status {
				return false;
			}
		}
		if let Some(payment_status) = self.payment_status {
			if order.payment_status != payment_status {
				return false;
			}
		}
		if let Some(from) = self.from {
			if order.created_at < from {
				return false;
			}
		}
		if let Some(to) = self.to {
			if order.created_at > to {
				return false;
			}
		}
		true
	}
}

/// Typed order store on top of the storage service.
#[derive(Clone)]
pub struct OrderRepository {
	storage: Arc<StorageService>,
}

impl OrderRepository {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	/// Storage id of an order record, `<vendor_id>/<order_id>`.
	pub fn record_id(vendor_id: &str, order_id: &str) -> String {
		format!("{}/{}", vendor_id, order_id)
	}

	/// Inserts a new order and claims its order number.
	///
	/// The number index entry is created first; a taken number fails with
	/// [`StorageError::AlreadyExists`] before the record is written.
	pub async fn insert(&self, order: &Order) -> Result<(), StorageError> {
		self.storage
			.create(
				StorageTable::OrderNumbers.as_str(),
				&order.order_number,
				&order.id,
			)
			.await?;
		self.storage
			.create(
				StorageTable::Orders.as_str(),
				&Self::record_id(&order.vendor_id, &order.id),
				order,
			)
			.await
	}

	/// Loads a single order owned by the given vendor.
	pub async fn get(&self, vendor_id: &str, order_id: &str) -> Result<Order, StorageError> {
		self.storage
			.retrieve(
				StorageTable::Orders.as_str(),
				&Self::record_id(vendor_id, order_id),
			)
			.await
	}

	/// Lists a vendor's orders, filtered, newest first, one page at a time.
	pub async fn list(
		&self,
		vendor_id: &str,
		filter: &OrderFilter,
		page: u32,
		limit: u32,
	) -> Result<OrderPage, StorageError> {
		let page = page.max(1);
		let limit = limit.max(1);

		let mut orders: Vec<Order> = self
			.all_for_vendor(vendor_id)
			.await?
			.into_iter()
			.filter(|order| filter.matches(order))
			.collect();
		orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

		let total = orders.len() as u64;
		let pages = (total.div_ceil(limit as u64)) as u32;
		let orders = orders
			.into_iter()
			.skip(((page - 1) as usize) * (limit as usize))
			.take(limit as usize)
			.collect();

		Ok(OrderPage {
			orders,
			pagination: Pagination {
				total,
				page,
				limit,
				pages,
			},
		})
	}

	/// Returns every order owned by the vendor, in storage order.
	pub async fn all_for_vendor(&self, vendor_id: &str) -> Result<Vec<Order>, StorageError> {
		self.storage
			.retrieve_prefix(StorageTable::Orders.as_str(), &format!("{}/", vendor_id))
			.await
	}

	/// Writes back an existing order record.
	pub async fn persist(&self, order: &Order) -> Result<(), StorageError> {
		self.storage
			.update(
				StorageTable::Orders.as_str(),
				&Self::record_id(&order.vendor_id, &order.id),
				order,
			)
			.await
	}
}
