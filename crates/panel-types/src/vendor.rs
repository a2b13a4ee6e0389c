//! Vendor identity types supplied by the Identity Context.
//!
//! The panel never stores vendor accounts itself; credentials are resolved
//! into a [`VendorIdentity`] by the identity collaborator and the approval
//! gate decides whether the vendor may use the API.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Review state of a vendor account.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VendorStatus {
	/// Account submitted, awaiting review.
	PendingReview,
	/// Account approved for panel access.
	Approved,
	/// Account rejected during review.
	Rejected,
	/// Previously approved account that has been suspended.
	Suspended,
}

impl VendorStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			VendorStatus::PendingReview => "pending_review",
			VendorStatus::Approved => "approved",
			VendorStatus::Rejected => "rejected",
			VendorStatus::Suspended => "suspended",
		}
	}
}

impl fmt::Display for VendorStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// The resolved identity behind an API credential.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VendorIdentity {
	/// Identifier the vendor's records are keyed by.
	pub vendor_id: String,
	/// Current review state.
	pub status: VendorStatus,
	/// Reason recorded when the account was rejected.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub rejection_reason: Option<String>,
}

impl VendorIdentity {
	pub fn is_approved(&self) -> bool {
		self.status == VendorStatus::Approved
	}
}
