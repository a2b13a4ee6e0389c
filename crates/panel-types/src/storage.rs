//! Storage-related types for the panel system.

use std::str::FromStr;

/// Storage tables for the panel's data collections.
///
/// This enum provides type safety for storage operations by replacing
/// string literals with strongly typed variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageTable {
	/// Order records, keyed by `<vendor_id>/<order_id>`.
	Orders,
	/// Order-number uniqueness index, keyed by order number.
	OrderNumbers,
	/// Product records, keyed by `<vendor_id>/<product_id>`.
	Products,
	/// Vendor profile records.
	Vendors,
}

impl StorageTable {
	/// Returns the string representation of the storage table.
	pub fn as_str(&self) -> &'static str {
		match self {
			StorageTable::Orders => "orders",
			StorageTable::OrderNumbers => "order_numbers",
			StorageTable::Products => "products",
			StorageTable::Vendors => "vendors",
		}
	}

	/// Returns an iterator over all StorageTable variants.
	pub fn all() -> impl Iterator<Item = Self> {
		[
			Self::Orders,
			Self::OrderNumbers,
			Self::Products,
			Self::Vendors,
		]
		.into_iter()
	}
}

impl FromStr for StorageTable {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"orders" => Ok(Self::Orders),
			"order_numbers" => Ok(Self::OrderNumbers),
			"products" => Ok(Self::Products),
			"vendors" => Ok(Self::Vendors),
			_ => Err(()),
		}
	}
}

impl From<StorageTable> for &'static str {
	fn from(table: StorageTable) -> Self {
		table.as_str()
	}
}
