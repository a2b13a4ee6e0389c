//! API types for the vendor panel HTTP API.
//!
//! Every endpoint answers with the same envelope: `success`, an optional
//! human-readable `message`, the payload under `data` and, for validation
//! failures, a list of field-level `errors`. [`ApiError`] is the boundary
//! error taxonomy with its HTTP status mapping.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{Order, OrderStatus, ProductStats, VendorStatus};

/// Response envelope shared by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
	pub success: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub errors: Option<Vec<FieldError>>,
}

impl<T> ApiResponse<T> {
	/// Success envelope carrying only data.
	pub fn ok(data: T) -> Self {
		Self {
			success: true,
			message: None,
			data: Some(data),
			errors: None,
		}
	}

	/// Success envelope carrying data and a message.
	pub fn ok_with_message(message: impl Into<String>, data: T) -> Self {
		Self {
			success: true,
			message: Some(message.into()),
			data: Some(data),
			errors: None,
		}
	}
}

/// A single field-level validation failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldError {
	/// Request field the failure refers to.
	pub field: String,
	/// What was wrong with it.
	pub message: String,
}

impl FieldError {
	pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			field: field.into(),
			message: message.into(),
		}
	}
}

/// Structured API error type with appropriate HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
	/// Missing or invalid credential (401).
	#[error("{0}")]
	Unauthorized(String),
	/// Vendor resolved but not approved for panel access (403).
	#[error("{}", forbidden_message(.status, .reason))]
	Forbidden {
		status: VendorStatus,
		reason: Option<String>,
	},
	/// Record absent, or owned by another vendor (404).
	#[error("{0} not found")]
	NotFound(&'static str),
	/// Requested status change is not in the transition table (400).
	#[error("cannot transition order from {from} to {to}")]
	InvalidTransition { from: OrderStatus, to: OrderStatus },
	/// One or more request fields failed validation (400).
	#[error("validation failed")]
	Validation(Vec<FieldError>),
	/// Write lost to a concurrent one, or a unique key already taken (409).
	#[error("{0}")]
	Conflict(String),
	/// Storage timed out; the caller may retry (503).
	#[error("service temporarily unavailable")]
	Unavailable { retry_after: Option<u64> },
	/// Anything else (500). The detail is for logs, not the response body.
	#[error("internal server error")]
	Internal(String),
}

fn forbidden_message(status: &VendorStatus, reason: &Option<String>) -> String {
	match status {
		VendorStatus::PendingReview => "vendor account is pending review".to_string(),
		VendorStatus::Suspended => "vendor account is suspended".to_string(),
		VendorStatus::Rejected => match reason {
			Some(reason) => format!("vendor account was rejected: {}", reason),
			None => "vendor account was rejected".to_string(),
		},
		VendorStatus::Approved => "vendor account is approved".to_string(),
	}
}

impl ApiError {
	/// Get the HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			ApiError::Unauthorized(_) => 401,
			ApiError::Forbidden { .. } => 403,
			ApiError::NotFound(_) => 404,
			ApiError::InvalidTransition { .. } => 400,
			ApiError::Validation(_) => 400,
			ApiError::Conflict(_) => 409,
			ApiError::Unavailable { .. } => 503,
			ApiError::Internal(_) => 500,
		}
	}

	/// Render the failure envelope body for this error.
	///
	/// Forbidden additionally carries the vendor status and, when present,
	/// the rejection reason; Unavailable carries the retry hint.
	pub fn to_body(&self) -> serde_json::Value {
		let mut body = serde_json::json!({
			"success": false,
			"message": self.to_string(),
		});
		match self {
			ApiError::Validation(errors) => {
				body["errors"] = serde_json::json!(errors);
			},
			ApiError::Forbidden { status, reason } => {
				body["status"] = serde_json::json!(status);
				if let Some(reason) = reason {
					body["rejectionReason"] = serde_json::json!(reason);
				}
			},
			ApiError::Unavailable {
				retry_after: Some(seconds),
			} => {
				body["retryAfter"] = serde_json::json!(seconds);
			},
			_ => {},
		}
		body
	}
}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for ApiError {
	fn into_response(self) -> axum::response::Response {
		use axum::{http::StatusCode, response::Json};

		let status = StatusCode::from_u16(self.status_code())
			.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		(status, Json(self.to_body())).into_response()
	}
}

/// Pagination block returned alongside list results.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
	/// Records matching the filter across all pages.
	pub total: u64,
	/// 1-based page number.
	pub page: u32,
	/// Page size.
	pub limit: u32,
	/// Total page count, `ceil(total / limit)`.
	pub pages: u32,
}

/// One page of a vendor's orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPage {
	pub orders: Vec<Order>,
	pub pagination: Pagination,
}

/// Order count and revenue for one dashboard window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WindowTotals {
	/// Orders created in the window, regardless of status.
	pub orders: u64,
	/// Revenue of the window, excluding cancelled orders.
	pub revenue: Decimal,
}

/// Count of orders currently awaiting action.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingSummary {
	pub orders: u64,
}

/// One day of the dashboard's order chart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartPoint {
	pub date: NaiveDate,
	/// Orders created on the day, regardless of status.
	pub orders: u64,
	/// Revenue of the day, excluding cancelled orders.
	pub revenue: Decimal,
}

/// The full dashboard payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
	pub today: WindowTotals,
	pub week: WindowTotals,
	pub month: WindowTotals,
	pub pending: PendingSummary,
	pub products: ProductStats,
	/// Last ten orders, newest first.
	pub recent_orders: Vec<Order>,
	/// Exactly seven contiguous days ending today, oldest first.
	pub chart_data: Vec<ChartPoint>,
}

/// Aggregate figures for a caller-supplied date range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
	pub total_orders: u64,
	/// Sum of order totals in range. Unlike the dashboard windows, this
	/// figure does not exclude cancelled orders.
	pub total_revenue: Decimal,
	/// Zero when the range is empty.
	pub avg_order_value: Decimal,
}

/// Payload of the order statistics endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
	pub stats: OrderTotals,
	pub status_counts: BTreeMap<OrderStatus, u64>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn success_envelope_skips_absent_fields() {
		let json = serde_json::to_value(ApiResponse::ok(serde_json::json!({"n": 1}))).unwrap();
		assert_eq!(json["success"], true);
		assert!(json.get("message").is_none());
		assert!(json.get("errors").is_none());
	}

	#[test]
	fn status_codes() {
		assert_eq!(ApiError::Unauthorized("missing token".into()).status_code(), 401);
		assert_eq!(ApiError::NotFound("order").status_code(), 404);
		assert_eq!(
			ApiError::InvalidTransition {
				from: OrderStatus::Pending,
				to: OrderStatus::Delivered,
			}
			.status_code(),
			400
		);
		assert_eq!(ApiError::Validation(vec![]).status_code(), 400);
		assert_eq!(ApiError::Conflict("order number taken".into()).status_code(), 409);
		assert_eq!(ApiError::Unavailable { retry_after: None }.status_code(), 503);
		assert_eq!(ApiError::Internal("boom".into()).status_code(), 500);
	}

	#[test]
	fn invalid_transition_message_names_both_statuses() {
		let err = ApiError::InvalidTransition {
			from: OrderStatus::Delivered,
			to: OrderStatus::Preparing,
		};
		assert_eq!(
			err.to_string(),
			"cannot transition order from delivered to preparing"
		);
	}

	#[test]
	fn forbidden_body_carries_status_and_reason() {
		let err = ApiError::Forbidden {
			status: VendorStatus::Rejected,
			reason: Some("incomplete documents".to_string()),
		};
		let body = err.to_body();
		assert_eq!(body["success"], false);
		assert_eq!(body["status"], "rejected");
		assert_eq!(body["rejectionReason"], "incomplete documents");
	}

	#[test]
	fn validation_body_lists_field_errors() {
		let err = ApiError::Validation(vec![FieldError::new(
			"status",
			"unknown order status: shipped",
		)]);
		let body = err.to_body();
		assert_eq!(body["errors"][0]["field"], "status");
		assert_eq!(body["errors"][0]["message"], "unknown order status: shipped");
	}

	#[test]
	fn unavailable_body_carries_retry_hint() {
		let body = ApiError::Unavailable {
			retry_after: Some(5),
		}
		.to_body();
		assert_eq!(body["retryAfter"], 5);
	}

	#[test]
	fn internal_detail_stays_out_of_the_message() {
		let err = ApiError::Internal("storage backend exploded".to_string());
		assert_eq!(err.to_string(), "internal server error");
	}
}
