//! Order domain types for the vendor panel.
//!
//! This module defines the order record, its line items, the fulfilment
//! status lifecycle and the append-only status history carried with every
//! order.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status of an order in the fulfilment lifecycle.
///
/// `delivered` and `cancelled` are terminal; no transition leaves them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
	/// Order has been received but work has not started.
	Pending,
	/// Order is being prepared by the vendor.
	Preparing,
	/// Order has left the vendor and is out for delivery.
	OnTheWay,
	/// Order reached the customer.
	Delivered,
	/// Order was cancelled before completion.
	Cancelled,
}

impl OrderStatus {
	/// Returns the wire representation of the status.
	pub fn as_str(&self) -> &'static str {
		match self {
			OrderStatus::Pending => "pending",
			OrderStatus::Preparing => "preparing",
			OrderStatus::OnTheWay => "on_the_way",
			OrderStatus::Delivered => "delivered",
			OrderStatus::Cancelled => "cancelled",
		}
	}

	/// True for statuses that accept no further transitions.
	pub fn is_terminal(&self) -> bool {
		matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
	}

	/// Returns an iterator over all OrderStatus variants.
	pub fn all() -> impl Iterator<Item = Self> {
		[
			Self::Pending,
			Self::Preparing,
			Self::OnTheWay,
			Self::Delivered,
			Self::Cancelled,
		]
		.into_iter()
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Error returned when a string does not name a known order status.
///
/// Carries the offending value so it can be surfaced in field-level
/// validation errors.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown order status: {0}")]
pub struct ParseOrderStatusError(pub String);

impl FromStr for OrderStatus {
	type Err = ParseOrderStatusError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"pending" => Ok(Self::Pending),
			"preparing" => Ok(Self::Preparing),
			"on_the_way" => Ok(Self::OnTheWay),
			"delivered" => Ok(Self::Delivered),
			"cancelled" => Ok(Self::Cancelled),
			other => Err(ParseOrderStatusError(other.to_string())),
		}
	}
}

/// Payment state reported with an order.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
	/// Payment has been collected.
	Paid,
	/// Payment is outstanding.
	#[default]
	Pending,
	/// Payment was attempted and failed.
	Failed,
}

impl PaymentStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			PaymentStatus::Paid => "paid",
			PaymentStatus::Pending => "pending",
			PaymentStatus::Failed => "failed",
		}
	}
}

impl fmt::Display for PaymentStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Error returned when a string does not name a known payment status.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown payment status: {0}")]
pub struct ParsePaymentStatusError(pub String);

impl FromStr for PaymentStatus {
	type Err = ParsePaymentStatusError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"paid" => Ok(Self::Paid),
			"pending" => Ok(Self::Pending),
			"failed" => Ok(Self::Failed),
			other => Err(ParsePaymentStatusError(other.to_string())),
		}
	}
}

/// A single line item on an order.
///
/// Line totals are trusted as submitted by the ordering side and are never
/// recomputed by the panel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
	/// Identifier of the ordered product.
	pub product_id: String,
	/// Product name as displayed at order time.
	pub name: String,
	/// Sales unit (piece, kg, ...).
	pub unit: String,
	/// Ordered quantity, at least 1.
	pub quantity: u32,
	/// Price per unit.
	pub unit_price: Decimal,
	/// Line total as submitted.
	pub total_price: Decimal,
}

/// Customer contact details carried on an order record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerInfo {
	pub name: String,
	pub phone: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	pub address: String,
}

/// One entry of an order's append-only status history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
	/// Status the order moved to.
	pub status: OrderStatus,
	/// When the change was applied.
	pub changed_at: DateTime<Utc>,
	/// Optional operator note attached to the change.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub note: Option<String>,
}

/// An order record as stored and returned by the panel.
///
/// `total == subtotal + delivery_fee` is the submitter's responsibility;
/// the panel records the amounts as given. `status_history` starts with the
/// creation status and only ever grows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
	/// Unique identifier for this order (storage key).
	pub id: String,
	/// Owning vendor.
	pub vendor_id: String,
	/// Human-facing order number, `ORD-YYYYMMDD-NNNN`.
	pub order_number: String,
	/// Customer contact details.
	pub customer_info: CustomerInfo,
	/// Ordered line items.
	pub items: Vec<OrderItem>,
	/// Sum of line totals as submitted.
	pub subtotal: Decimal,
	/// Delivery fee as submitted.
	pub delivery_fee: Decimal,
	/// Grand total as submitted.
	pub total: Decimal,
	/// Payment state.
	#[serde(default)]
	pub payment_status: PaymentStatus,
	/// Current fulfilment status.
	pub status: OrderStatus,
	/// Append-only history of status changes, oldest first.
	#[serde(default)]
	pub status_history: Vec<StatusChange>,
	/// Free-form order notes.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub notes: Option<String>,
	/// Timestamp when this order was created.
	pub created_at: DateTime<Utc>,
	/// Timestamp when this order was last updated.
	pub updated_at: DateTime<Utc>,
}

/// Input for creating a new order record.
///
/// Everything an order carries except the fields the panel assigns itself
/// (id, order number when absent, history, timestamps).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
	pub customer_info: CustomerInfo,
	pub items: Vec<OrderItem>,
	pub subtotal: Decimal,
	pub delivery_fee: Decimal,
	pub total: Decimal,
	#[serde(default)]
	pub payment_status: PaymentStatus,
	/// Pre-assigned order number; synthesized when absent.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub order_number: Option<String>,
	/// Initial status; defaults to `pending`.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub status: Option<OrderStatus>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub notes: Option<String>,
}

/// Synthesizes a human-facing order number of the form `ORD-YYYYMMDD-NNNN`.
///
/// The four-digit suffix is random and zero-padded. Uniqueness is not
/// guaranteed here; the storage layer's create-if-absent constraint on the
/// order-number index enforces it, and a collision surfaces as a conflict.
pub fn new_order_number(now: DateTime<Utc>) -> String {
	let suffix = (uuid::Uuid::new_v4().as_u128() % 10_000) as u16;
	format!("ORD-{}-{:04}", now.format("%Y%m%d"), suffix)
}
