//! Dashboard aggregation over a vendor's orders and products.
//!
//! Every figure is computed from the orders as stored; nothing is cached or
//! incrementally maintained. All window boundaries derive from a single
//! captured `now`, so two calls with the same timestamp always agree.
//!
//! Counts and revenue use different predicates on purpose: window and chart
//! counts include cancelled orders while their revenue excludes them, and
//! the caller-ranged statistics exclude nothing.

use crate::orders::OrderRepository;
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use panel_storage::{StorageError, StorageService};
use panel_types::{
	ChartPoint, DashboardSnapshot, Order, OrderStats, OrderStatus, OrderTotals, PendingSummary,
	Product, ProductStats, ProductStatus, StorageTable, WindowTotals,
};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while aggregating dashboard figures.
///
/// Any storage failure aborts the whole aggregation; partial snapshots are
/// never returned.
#[derive(Debug, Error)]
pub enum DashboardError {
	#[error("Storage error: {0}")]
	Storage(#[from] StorageError),
}

/// Seam to the product catalog collaborator.
///
/// The dashboard only needs the summary counters; catalog management lives
/// outside the panel.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
	/// Returns the product counters for one vendor.
	async fn stats(&self, vendor_id: &str) -> Result<ProductStats, StorageError>;
}

/// Product catalog reading records from the panel's own storage.
///
/// Products are stored under `products:<vendor_id>/<product_id>`.
pub struct StorageProductCatalog {
	storage: Arc<StorageService>,
}

impl StorageProductCatalog {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}
}

#[async_trait]
impl ProductCatalog for StorageProductCatalog {
	async fn stats(&self, vendor_id: &str) -> Result<ProductStats, StorageError> {
		let products: Vec<Product> = self
			.storage
			.retrieve_prefix(StorageTable::Products.as_str(), &format!("{}/", vendor_id))
			.await?;

		Ok(ProductStats {
			total: products.len() as u64,
			active: products
				.iter()
				.filter(|p| p.status == ProductStatus::Active)
				.count() as u64,
			low_stock: products.iter().filter(|p| p.is_low_stock()).count() as u64,
		})
	}
}

/// Number of recent orders surfaced on the dashboard.
const RECENT_ORDERS: usize = 10;

/// Number of daily points in the dashboard chart.
const CHART_DAYS: i64 = 7;

/// Computes dashboard snapshots and order statistics for one vendor at a time.
pub struct DashboardAggregator {
	orders: OrderRepository,
	products: Arc<dyn ProductCatalog>,
}

impl DashboardAggregator {
	pub fn new(orders: OrderRepository, products: Arc<dyn ProductCatalog>) -> Self {
		Self { orders, products }
	}

	/// Builds the full dashboard payload for a vendor.
	///
	/// `now` is captured once by the caller; today starts at UTC midnight of
	/// its date, the week and month windows trail it by 7 and 30 days.
	pub async fn snapshot(
		&self,
		vendor_id: &str,
		now: DateTime<Utc>,
	) -> Result<DashboardSnapshot, DashboardError> {
		let mut orders = self.orders.all_for_vendor(vendor_id).await?;
		orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

		let today_start = now.date_naive().and_time(NaiveTime::MIN).and_utc();
		let week_start = now - Duration::days(7);
		let month_start = now - Duration::days(30);

		let pending = PendingSummary {
			orders: orders
				.iter()
				.filter(|o| o.status == OrderStatus::Pending)
				.count() as u64,
		};

		let products = self.products.stats(vendor_id).await?;

		let today = now.date_naive();
		let mut chart_data = Vec::with_capacity(CHART_DAYS as usize);
		for offset in (0..CHART_DAYS).rev() {
			let date = today - Duration::days(offset);
			let mut point = ChartPoint {
				date,
				orders: 0,
				revenue: Decimal::ZERO,
			};
			for order in orders.iter().filter(|o| o.created_at.date_naive() == date) {
				point.orders += 1;
				if order.status != OrderStatus::Cancelled {
					point.revenue += order.total;
				}
			}
			chart_data.push(point);
		}

		let recent_orders = orders.iter().take(RECENT_ORDERS).cloned().collect();

		Ok(DashboardSnapshot {
			today: window_totals(&orders, today_start),
			week: window_totals(&orders, week_start),
			month: window_totals(&orders, month_start),
			pending,
			products,
			recent_orders,
			chart_data,
		})
	}

	/// Aggregates order figures over a caller-supplied `created_at` range.
	///
	/// Both bounds are inclusive and optional. Revenue here sums every order
	/// in range, cancelled ones included.
	pub async fn stats(
		&self,
		vendor_id: &str,
		from: Option<DateTime<Utc>>,
		to: Option<DateTime<Utc>>,
	) -> Result<OrderStats, DashboardError> {
		let orders = self.orders.all_for_vendor(vendor_id).await?;
		let in_range: Vec<&Order> = orders
			.iter()
			.filter(|o| {
				from.map_or(true, |from| o.created_at >= from)
					&& to.map_or(true, |to| o.created_at <= to)
			})
			.collect();

		let total_orders = in_range.len() as u64;
		let total_revenue: Decimal = in_range.iter().map(|o| o.total).sum();
		let avg_order_value = if total_orders == 0 {
			Decimal::ZERO
		} else {
			total_revenue / Decimal::from(total_orders)
		};

		let mut status_counts = BTreeMap::new();
		for order in &in_range {
			*status_counts.entry(order.status).or_insert(0u64) += 1;
		}

		Ok(OrderStats {
			stats: OrderTotals {
				total_orders,
				total_revenue,
				avg_order_value,
			},
			status_counts,
		})
	}
}

/// Count and revenue of orders created at or after `start`.
fn window_totals(orders: &[Order], start: DateTime<Utc>) -> WindowTotals {
	let mut totals = WindowTotals {
		orders: 0,
		revenue: Decimal::ZERO,
	};
	for order in orders.iter().filter(|o| o.created_at >= start) {
		totals.orders += 1;
		if order.status != OrderStatus::Cancelled {
			totals.revenue += order.total;
		}
	}
	totals
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;
	use panel_storage::implementations::memory::MemoryStorage;
	use panel_types::{CustomerInfo, PaymentStatus, StatusChange};

	fn now() -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
	}

	fn order(id: &str, created_at: DateTime<Utc>, status: OrderStatus, total: Decimal) -> Order {
		Order {
			id: id.to_string(),
			vendor_id: "v-1".to_string(),
			order_number: format!("ORD-20240310-{}", id),
			customer_info: CustomerInfo {
				name: "Ada".to_string(),
				phone: "555-0100".to_string(),
				email: None,
				address: "1 Main St".to_string(),
			},
			items: vec![],
			subtotal: total,
			delivery_fee: Decimal::ZERO,
			total,
			payment_status: PaymentStatus::Pending,
			status,
			status_history: vec![StatusChange {
				status,
				changed_at: created_at,
				note: None,
			}],
			notes: None,
			created_at,
			updated_at: created_at,
		}
	}

	struct NoProducts;

	#[async_trait]
	impl ProductCatalog for NoProducts {
		async fn stats(&self, _vendor_id: &str) -> Result<ProductStats, StorageError> {
			Ok(ProductStats::default())
		}
	}

	async fn aggregator(orders: Vec<Order>) -> DashboardAggregator {
		let storage = Arc::new(StorageService::new(Box::new(MemoryStorage::new())));
		let repository = OrderRepository::new(Arc::clone(&storage));
		for order in &orders {
			repository.insert(order).await.unwrap();
		}
		DashboardAggregator::new(repository, Arc::new(NoProducts))
	}

	#[tokio::test]
	async fn window_counts_include_cancelled_but_revenue_excludes_it() {
		let now = now();
		let aggregator = aggregator(vec![
			order("o-1", now - Duration::hours(2), OrderStatus::Pending, Decimal::new(1000, 2)),
			order(
				"o-2",
				now - Duration::hours(3),
				OrderStatus::Cancelled,
				Decimal::new(2000, 2),
			),
		])
		.await;

		let snapshot = aggregator.snapshot("v-1", now).await.unwrap();
		assert_eq!(snapshot.today.orders, 2);
		assert_eq!(snapshot.today.revenue, Decimal::new(1000, 2));

		let naive_sum = Decimal::new(1000, 2) + Decimal::new(2000, 2);
		assert!(snapshot.today.revenue <= naive_sum);
	}

	#[tokio::test]
	async fn windows_trail_the_captured_now() {
		let now = now();
		let aggregator = aggregator(vec![
			order("o-1", now - Duration::hours(1), OrderStatus::Pending, Decimal::new(500, 2)),
			order("o-2", now - Duration::days(3), OrderStatus::Delivered, Decimal::new(500, 2)),
			order("o-3", now - Duration::days(20), OrderStatus::Delivered, Decimal::new(500, 2)),
			order("o-4", now - Duration::days(40), OrderStatus::Delivered, Decimal::new(500, 2)),
		])
		.await;

		let snapshot = aggregator.snapshot("v-1", now).await.unwrap();
		assert_eq!(snapshot.today.orders, 1);
		assert_eq!(snapshot.week.orders, 2);
		assert_eq!(snapshot.month.orders, 3);
	}

	#[tokio::test]
	async fn pending_count_is_not_windowed() {
		let now = now();
		let aggregator = aggregator(vec![
			order("o-1", now - Duration::days(90), OrderStatus::Pending, Decimal::ONE),
			order("o-2", now - Duration::hours(1), OrderStatus::Pending, Decimal::ONE),
			order("o-3", now - Duration::hours(2), OrderStatus::Delivered, Decimal::ONE),
		])
		.await;

		let snapshot = aggregator.snapshot("v-1", now).await.unwrap();
		assert_eq!(snapshot.pending.orders, 2);
	}

	#[tokio::test]
	async fn chart_is_seven_contiguous_zero_filled_days() {
		let now = now();
		let aggregator = aggregator(vec![
			order("o-1", now - Duration::days(2), OrderStatus::Delivered, Decimal::new(1500, 2)),
			order(
				"o-2",
				now - Duration::days(2),
				OrderStatus::Cancelled,
				Decimal::new(9900, 2),
			),
		])
		.await;

		let snapshot = aggregator.snapshot("v-1", now).await.unwrap();
		let chart = &snapshot.chart_data;
		assert_eq!(chart.len(), 7);
		assert_eq!(chart[6].date, now.date_naive());
		for pair in chart.windows(2) {
			assert_eq!(pair[1].date - pair[0].date, Duration::days(1));
		}

		for point in chart {
			if point.date == (now - Duration::days(2)).date_naive() {
				assert_eq!(point.orders, 2);
				assert_eq!(point.revenue, Decimal::new(1500, 2));
			} else {
				assert_eq!(point.orders, 0);
				assert_eq!(point.revenue, Decimal::ZERO);
			}
		}
	}

	#[tokio::test]
	async fn recent_orders_are_newest_first_capped_at_ten() {
		let now = now();
		let mut orders = Vec::new();
		for i in 0..12 {
			orders.push(order(
				&format!("o-{}", i),
				now - Duration::hours(i),
				OrderStatus::Pending,
				Decimal::ONE,
			));
		}
		let aggregator = aggregator(orders).await;

		let snapshot = aggregator.snapshot("v-1", now).await.unwrap();
		assert_eq!(snapshot.recent_orders.len(), 10);
		assert_eq!(snapshot.recent_orders[0].id, "o-0");
		assert_eq!(snapshot.recent_orders[9].id, "o-9");
	}

	#[tokio::test]
	async fn same_day_snapshots_agree_on_today() {
		let t1 = Utc.with_ymd_and_hms(2024, 3, 10, 10, 0, 0).unwrap();
		let t2 = Utc.with_ymd_and_hms(2024, 3, 10, 18, 0, 0).unwrap();
		let aggregator = aggregator(vec![
			order(
				"o-1",
				Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap(),
				OrderStatus::Pending,
				Decimal::new(700, 2),
			),
			order(
				"o-2",
				Utc.with_ymd_and_hms(2024, 3, 9, 23, 0, 0).unwrap(),
				OrderStatus::Delivered,
				Decimal::new(900, 2),
			),
		])
		.await;

		let first = aggregator.snapshot("v-1", t1).await.unwrap();
		let second = aggregator.snapshot("v-1", t2).await.unwrap();
		assert_eq!(first.today, second.today);
		assert_eq!(first.today.orders, 1);
	}

	#[tokio::test]
	async fn stats_revenue_keeps_cancelled_orders() {
		let now = now();
		let aggregator = aggregator(vec![
			order("o-1", now - Duration::days(1), OrderStatus::Delivered, Decimal::new(1000, 2)),
			order(
				"o-2",
				now - Duration::days(2),
				OrderStatus::Cancelled,
				Decimal::new(2000, 2),
			),
		])
		.await;

		let stats = aggregator.stats("v-1", None, None).await.unwrap();
		assert_eq!(stats.stats.total_orders, 2);
		assert_eq!(stats.stats.total_revenue, Decimal::new(3000, 2));
		assert_eq!(stats.stats.avg_order_value, Decimal::new(1500, 2));
		assert_eq!(stats.status_counts.get(&OrderStatus::Cancelled), Some(&1));
		assert_eq!(stats.status_counts.get(&OrderStatus::Delivered), Some(&1));
	}

	#[tokio::test]
	async fn stats_range_bounds_are_inclusive() {
		let now = now();
		let aggregator = aggregator(vec![
			order("o-1", now - Duration::days(5), OrderStatus::Pending, Decimal::ONE),
			order("o-2", now - Duration::days(3), OrderStatus::Pending, Decimal::ONE),
			order("o-3", now - Duration::days(1), OrderStatus::Pending, Decimal::ONE),
		])
		.await;

		let stats = aggregator
			.stats(
				"v-1",
				Some(now - Duration::days(5)),
				Some(now - Duration::days(3)),
			)
			.await
			.unwrap();
		assert_eq!(stats.stats.total_orders, 2);
	}

	#[tokio::test]
	async fn stats_of_an_empty_range_are_zero() {
		let aggregator = aggregator(vec![]).await;
		let stats = aggregator.stats("v-1", None, None).await.unwrap();
		assert_eq!(stats.stats.total_orders, 0);
		assert_eq!(stats.stats.total_revenue, Decimal::ZERO);
		assert_eq!(stats.stats.avg_order_value, Decimal::ZERO);
		assert!(stats.status_counts.is_empty());
	}

	#[tokio::test]
	async fn storage_catalog_counts_products() {
		let storage = Arc::new(StorageService::new(Box::new(MemoryStorage::new())));
		let catalog = StorageProductCatalog::new(Arc::clone(&storage));
		let created_at = now();

		for (id, stock, threshold, status) in [
			("p-1", 5u32, 10u32, ProductStatus::Active),
			("p-2", 50, 10, ProductStatus::Active),
			("p-3", 50, 10, ProductStatus::Inactive),
		] {
			let product = Product {
				id: id.to_string(),
				vendor_id: "v-1".to_string(),
				name: "Tomatoes".to_string(),
				category: "produce".to_string(),
				price: Decimal::ONE,
				discount_price: None,
				unit: "kg".to_string(),
				stock,
				min_stock_threshold: threshold,
				status,
				description: None,
				image_url: None,
				created_at,
				updated_at: created_at,
			};
			storage
				.store(
					StorageTable::Products.as_str(),
					&format!("v-1/{}", id),
					&product,
				)
				.await
				.unwrap();
		}

		let stats = catalog.stats("v-1").await.unwrap();
		assert_eq!(stats.total, 3);
		assert_eq!(stats.active, 2);
		assert_eq!(stats.low_stock, 1);

		let other = catalog.stats("v-2").await.unwrap();
		assert_eq!(other.total, 0);
	}
}
