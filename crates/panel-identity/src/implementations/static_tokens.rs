//! Static bearer-token identity implementation for the panel service.
//!
//! Resolves credentials against a fixed token table from the configuration
//! file. This stands in for the real Identity Context in development and
//! single-box deployments; tokens are issued out of band.

use crate::{IdentityError, IdentityFactory, IdentityInterface, IdentityRegistry};
use async_trait::async_trait;
use panel_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError,
	VendorIdentity, VendorStatus,
};
use serde::Deserialize;
use std::collections::HashMap;

/// One vendor entry of the token table.
#[derive(Debug, Clone, Deserialize)]
struct TokenEntry {
	vendor_id: String,
	status: VendorStatus,
	#[serde(default)]
	rejection_reason: Option<String>,
}

/// Identity implementation backed by a static token table.
pub struct StaticTokens {
	tokens: HashMap<String, TokenEntry>,
}

impl StaticTokens {
	/// Creates a StaticTokens instance from configuration.
	pub fn from_config(config: &toml::Value) -> Result<Self, IdentityError> {
		#[derive(Debug, Deserialize)]
		struct RawConfig {
			tokens: HashMap<String, TokenEntry>,
		}

		let raw: RawConfig = config
			.clone()
			.try_into()
			.map_err(|e| IdentityError::Implementation(e.to_string()))?;

		Ok(Self { tokens: raw.tokens })
	}
}

#[async_trait]
impl IdentityInterface for StaticTokens {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(StaticTokensSchema)
	}

	async fn resolve(&self, credential: &str) -> Result<VendorIdentity, IdentityError> {
		let entry = self
			.tokens
			.get(credential)
			.ok_or(IdentityError::InvalidCredential)?;

		Ok(VendorIdentity {
			vendor_id: entry.vendor_id.clone(),
			status: entry.status,
			rejection_reason: entry.rejection_reason.clone(),
		})
	}
}

/// Configuration schema for StaticTokens.
pub struct StaticTokensSchema;

impl ConfigSchema for StaticTokensSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		// Token values are free-form keys, so only the table itself is declared
		let schema = Schema::new(
			vec![Field::new(
				"tokens",
				FieldType::Table(Schema::new(vec![], vec![])),
			)],
			vec![],
		);
		schema.validate(config)
	}
}

/// Registry entry for the static-tokens identity implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "static_tokens";
	type Factory = IdentityFactory;

	fn factory() -> Self::Factory {
		create_identity
	}
}

impl IdentityRegistry for Registry {}

/// Factory function to create a static-tokens identity backend.
///
/// Configuration parameters:
/// - `tokens`: table mapping each token to `{ vendor_id, status, rejection_reason? }`
pub fn create_identity(config: &toml::Value) -> Result<Box<dyn IdentityInterface>, IdentityError> {
	Ok(Box::new(StaticTokens::from_config(config)?))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn config() -> toml::Value {
		toml::from_str(
			r#"
			[tokens.tok-approved]
			vendor_id = "v-1"
			status = "approved"

			[tokens.tok-rejected]
			vendor_id = "v-2"
			status = "rejected"
			rejection_reason = "incomplete documents"
			"#,
		)
		.unwrap()
	}

	#[tokio::test]
	async fn resolves_known_tokens() {
		let identity = StaticTokens::from_config(&config()).unwrap();

		let vendor = identity.resolve("tok-approved").await.unwrap();
		assert_eq!(vendor.vendor_id, "v-1");
		assert_eq!(vendor.status, VendorStatus::Approved);

		let vendor = identity.resolve("tok-rejected").await.unwrap();
		assert_eq!(vendor.status, VendorStatus::Rejected);
		assert_eq!(vendor.rejection_reason.as_deref(), Some("incomplete documents"));
	}

	#[tokio::test]
	async fn unknown_token_is_invalid() {
		let identity = StaticTokens::from_config(&config()).unwrap();
		let result = identity.resolve("tok-unknown").await;
		assert!(matches!(result, Err(IdentityError::InvalidCredential)));
	}

	#[test]
	fn schema_requires_token_table() {
		let schema = StaticTokensSchema;
		let missing: toml::Value = toml::from_str("").unwrap();
		assert!(schema.validate(&missing).is_err());
		assert!(schema.validate(&config()).is_ok());
	}
}
