//! Bearer-token authentication middleware.
//!
//! Extracts the credential from `Authorization: Bearer <token>`, resolves it
//! through the identity service and provides the [`VendorIdentity`] to
//! downstream handlers. Vendors that are not approved are turned away with a
//! forbidden response carrying their status and, when recorded, the
//! rejection reason.

use crate::server::AppState;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use panel_identity::IdentityError;
use panel_types::{ApiError, VendorIdentity};

/// Middleware guarding every panel route.
///
/// Missing, unknown or expired credentials answer 401; resolved but
/// unapproved vendors answer 403. Handlers read the vendor identity from
/// request extensions.
pub async fn authenticate(
	State(state): State<AppState>,
	mut request: Request,
	next: Next,
) -> Result<Response, ApiError> {
	let token = request
		.headers()
		.get("authorization")
		.and_then(|v| v.to_str().ok())
		.and_then(|v| v.strip_prefix("Bearer "))
		.ok_or(IdentityError::MissingCredential)
		.map_err(|e| ApiError::Unauthorized(e.to_string()))?;

	let vendor: VendorIdentity = state
		.engine
		.identity()
		.resolve(token)
		.await
		.map_err(|e| ApiError::Unauthorized(e.to_string()))?;

	state
		.engine
		.identity()
		.ensure_approved(&vendor)
		.map_err(|e| ApiError::Forbidden {
			status: e.status,
			reason: e.reason,
		})?;

	request.extensions_mut().insert(vendor);

	Ok(next.run(request).await)
}
