//! Identity module for the vendor panel system.
//!
//! This module is the seam to the Identity Context, which owns vendor
//! accounts and credentials. The panel only resolves an API credential into
//! a [`VendorIdentity`] and gates access on the vendor's approval state;
//! registration, profile management and token issuance live elsewhere.

use async_trait::async_trait;
use panel_types::{ConfigSchema, ImplementationRegistry, VendorIdentity, VendorStatus};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod static_tokens;
}

/// Errors that can occur during credential resolution.
///
/// Every variant maps to an unauthorized response at the API boundary.
#[derive(Debug, Error)]
pub enum IdentityError {
	/// No credential was presented.
	#[error("Missing credential")]
	MissingCredential,
	/// The credential is unknown or malformed.
	#[error("Invalid credential")]
	InvalidCredential,
	/// The credential was valid once but is no longer.
	#[error("Credential expired")]
	Expired,
	/// Error that occurs when interacting with the identity implementation.
	#[error("Implementation error: {0}")]
	Implementation(String),
}

/// Trait defining the interface for identity implementations.
///
/// This trait must be implemented by any identity backend that wants to
/// integrate with the panel system. It resolves a presented credential into
/// the vendor identity behind it.
#[async_trait]
pub trait IdentityInterface: Send + Sync {
	/// Returns the configuration schema for this identity implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Resolves a credential into the vendor identity behind it.
	async fn resolve(&self, credential: &str) -> Result<VendorIdentity, IdentityError>;
}

/// Type alias for identity factory functions.
pub type IdentityFactory = fn(&toml::Value) -> Result<Box<dyn IdentityInterface>, IdentityError>;

/// Registry trait for identity implementations.
pub trait IdentityRegistry: ImplementationRegistry<Factory = IdentityFactory> {}

/// Get all registered identity implementations.
pub fn get_all_implementations() -> Vec<(&'static str, IdentityFactory)> {
	use implementations::static_tokens;

	vec![(
		static_tokens::Registry::NAME,
		static_tokens::Registry::factory(),
	)]
}

/// Error raised by the approval gate for vendors that are not approved.
///
/// Carries the vendor's actual status and, for rejected accounts, the
/// recorded reason so the API layer can mirror both into its response.
#[derive(Debug, Clone, Error)]
#[error("vendor is not approved: {status}")]
pub struct ApprovalError {
	pub status: VendorStatus,
	pub reason: Option<String>,
}

/// Service that manages identity resolution and the approval gate.
pub struct IdentityService {
	/// The underlying identity implementation.
	implementation: Box<dyn IdentityInterface>,
}

impl IdentityService {
	/// Creates a new IdentityService with the specified implementation.
	pub fn new(implementation: Box<dyn IdentityInterface>) -> Self {
		Self { implementation }
	}

	/// Resolves a credential into the vendor identity behind it.
	pub async fn resolve(&self, credential: &str) -> Result<VendorIdentity, IdentityError> {
		self.implementation.resolve(credential).await
	}

	/// Rejects vendors that are not approved for panel access.
	pub fn ensure_approved(&self, vendor: &VendorIdentity) -> Result<(), ApprovalError> {
		if vendor.is_approved() {
			Ok(())
		} else {
			Err(ApprovalError {
				status: vendor.status,
				reason: vendor.rejection_reason.clone(),
			})
		}
	}
}
