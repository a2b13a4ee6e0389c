//! Product catalog types.
//!
//! The product catalog is a collaborator the dashboard reads summary
//! counters from; the panel itself only stores and counts records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Listing state of a product.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
	#[default]
	Active,
	Inactive,
}

/// A product record as stored by the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
	/// Unique identifier for this product (storage key).
	pub id: String,
	/// Owning vendor.
	pub vendor_id: String,
	pub name: String,
	pub category: String,
	pub price: Decimal,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub discount_price: Option<Decimal>,
	/// Sales unit (piece, kg, ...).
	pub unit: String,
	pub stock: u32,
	/// Stock at or below this threshold counts as low.
	pub min_stock_threshold: u32,
	#[serde(default)]
	pub status: ProductStatus,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub image_url: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl Product {
	/// True when stock has fallen to or below the configured threshold.
	pub fn is_low_stock(&self) -> bool {
		self.stock <= self.min_stock_threshold
	}
}

/// Aggregate product counters surfaced on the dashboard.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProductStats {
	/// All products owned by the vendor.
	pub total: u64,
	/// Products currently listed as active.
	pub active: u64,
	/// Products at or below their low-stock threshold.
	pub low_stock: u64,
}

#[cfg(test)]
mod tests {
	use super::*;

	fn product(stock: u32, threshold: u32) -> Product {
		Product {
			id: "p-1".to_string(),
			vendor_id: "v-1".to_string(),
			name: "Tomatoes".to_string(),
			category: "produce".to_string(),
			price: Decimal::new(450, 2),
			discount_price: None,
			unit: "kg".to_string(),
			stock,
			min_stock_threshold: threshold,
			status: ProductStatus::Active,
			description: None,
			image_url: None,
			created_at: Utc::now(),
			updated_at: Utc::now(),
		}
	}

	#[test]
	fn low_stock_is_inclusive() {
		assert!(product(10, 10).is_low_stock());
		assert!(product(3, 10).is_low_stock());
		assert!(!product(11, 10).is_low_stock());
	}
}
