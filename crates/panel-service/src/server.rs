//! HTTP server for the vendor panel API.
//!
//! Exposes the dashboard and order endpoints under `/api`, all behind the
//! bearer-token middleware. Every response uses the shared envelope; request
//! field failures answer as field-level validation errors rather than bare
//! rejections.

use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::middleware::from_fn_with_state;
use axum::response::Json;
use axum::routing::{get, put};
use axum::{Extension, Router};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use panel_config::ApiConfig;
use panel_core::{DashboardError, OrderError, OrderFilter, PanelEngine};
use panel_storage::StorageError;
use panel_types::{
	ApiError, ApiResponse, DashboardSnapshot, FieldError, Order, OrderPage, OrderStats,
	OrderStatus, PaymentStatus, VendorIdentity,
};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Retry hint returned with storage-timeout responses, in seconds.
const RETRY_AFTER_SECONDS: u64 = 1;

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// Reference to the panel engine for processing requests.
	pub engine: Arc<PanelEngine>,
}

/// Starts the HTTP server for the panel API.
pub async fn start_server(
	api_config: ApiConfig,
	engine: Arc<PanelEngine>,
) -> Result<(), Box<dyn std::error::Error>> {
	let state = AppState { engine };
	let app = router(&api_config, state);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Panel API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}

/// Builds the application router.
///
/// `/orders/stats` is registered before `/orders/{id}` so the statistics
/// endpoint is never captured as an order id.
pub fn router(api_config: &ApiConfig, state: AppState) -> Router {
	let api_routes = Router::new()
		.route("/dashboard", get(handle_dashboard))
		.route("/orders", get(handle_list_orders))
		.route("/orders/stats", get(handle_order_stats))
		.route("/orders/{id}", get(handle_get_order))
		.route("/orders/{id}/status", put(handle_update_status))
		.route_layer(from_fn_with_state(
			state.clone(),
			crate::middleware::authenticate,
		));

	Router::new()
		.nest("/api", api_routes)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(cors_layer(api_config.cors.as_ref()))
				.layer(TimeoutLayer::new(Duration::from_secs(
					api_config.timeout_seconds,
				)))
				.layer(DefaultBodyLimit::max(api_config.max_request_size)),
		)
		.with_state(state)
}

/// Builds the CORS layer from configuration, permissive when absent.
fn cors_layer(config: Option<&panel_config::CorsConfig>) -> CorsLayer {
	match config {
		Some(cors) => {
			let origins: Vec<axum::http::HeaderValue> = cors
				.allowed_origins
				.iter()
				.filter_map(|origin| origin.parse().ok())
				.collect();
			let methods: Vec<axum::http::Method> = cors
				.allowed_methods
				.iter()
				.filter_map(|method| method.parse().ok())
				.collect();
			let headers: Vec<axum::http::HeaderName> = cors
				.allowed_headers
				.iter()
				.filter_map(|header| header.parse().ok())
				.collect();
			CorsLayer::new()
				.allow_origin(origins)
				.allow_methods(methods)
				.allow_headers(headers)
		},
		None => CorsLayer::permissive(),
	}
}

/// Query parameters of the order listing endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListOrdersQuery {
	status: Option<String>,
	payment_status: Option<String>,
	from: Option<String>,
	to: Option<String>,
	#[serde(default = "default_page")]
	page: u32,
	#[serde(default = "default_limit")]
	limit: u32,
}

/// Query parameters of the order statistics endpoint.
#[derive(Debug, Deserialize)]
struct StatsQuery {
	from: Option<String>,
	to: Option<String>,
}

/// Body of the status update endpoint.
#[derive(Debug, Deserialize)]
struct UpdateStatusRequest {
	status: String,
	#[serde(default)]
	note: Option<String>,
}

fn default_page() -> u32 {
	1
}

fn default_limit() -> u32 {
	50
}

/// Parses an enum-valued request field, recording a field error on failure.
fn parse_enum<T: FromStr>(
	field: &'static str,
	value: Option<&str>,
	errors: &mut Vec<FieldError>,
) -> Option<T>
where
	T::Err: fmt::Display,
{
	let value = value?;
	match value.parse::<T>() {
		Ok(parsed) => Some(parsed),
		Err(e) => {
			errors.push(FieldError::new(field, e.to_string()));
			None
		},
	}
}

/// Parses a date-valued request field.
///
/// Accepts RFC 3339 timestamps and bare dates, which are taken as UTC
/// midnight.
fn parse_datetime(
	field: &'static str,
	value: Option<&str>,
	errors: &mut Vec<FieldError>,
) -> Option<DateTime<Utc>> {
	let value = value?;
	if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
		return Some(timestamp.with_timezone(&Utc));
	}
	if let Ok(date) = value.parse::<NaiveDate>() {
		return Some(date.and_time(NaiveTime::MIN).and_utc());
	}
	errors.push(FieldError::new(field, format!("invalid date: {}", value)));
	None
}

fn storage_error(err: StorageError) -> ApiError {
	match err {
		StorageError::NotFound => ApiError::NotFound("order"),
		StorageError::Timeout(_) => ApiError::Unavailable {
			retry_after: Some(RETRY_AFTER_SECONDS),
		},
		other => {
			tracing::error!(error = %other, "Storage operation failed");
			ApiError::Internal(other.to_string())
		},
	}
}

fn order_error(err: OrderError) -> ApiError {
	match err {
		OrderError::NotFound => ApiError::NotFound("order"),
		OrderError::InvalidTransition { from, to } => ApiError::InvalidTransition { from, to },
		OrderError::Storage(StorageError::AlreadyExists) => {
			ApiError::Conflict("order number already taken".to_string())
		},
		OrderError::Storage(err) => storage_error(err),
	}
}

fn dashboard_error(err: DashboardError) -> ApiError {
	match err {
		DashboardError::Storage(err) => storage_error(err),
	}
}

/// Handles GET /api/dashboard requests.
///
/// The reference instant is captured once at request start; every window
/// and chart boundary of the snapshot derives from it.
async fn handle_dashboard(
	State(state): State<AppState>,
	Extension(vendor): Extension<VendorIdentity>,
) -> Result<Json<ApiResponse<DashboardSnapshot>>, ApiError> {
	let now = Utc::now();
	let snapshot = state
		.engine
		.dashboard()
		.snapshot(&vendor.vendor_id, now)
		.await
		.map_err(dashboard_error)?;

	Ok(Json(ApiResponse::ok(snapshot)))
}

/// Handles GET /api/orders requests.
async fn handle_list_orders(
	State(state): State<AppState>,
	Extension(vendor): Extension<VendorIdentity>,
	Query(query): Query<ListOrdersQuery>,
) -> Result<Json<ApiResponse<OrderPage>>, ApiError> {
	let mut errors = Vec::new();
	let filter = OrderFilter {
		status: parse_enum::<OrderStatus>("status", query.status.as_deref(), &mut errors),
		payment_status: parse_enum::<PaymentStatus>(
			"paymentStatus",
			query.payment_status.as_deref(),
			&mut errors,
		),
		from: parse_datetime("from", query.from.as_deref(), &mut errors),
		to: parse_datetime("to", query.to.as_deref(), &mut errors),
	};
	if !errors.is_empty() {
		return Err(ApiError::Validation(errors));
	}

	let page = state
		.engine
		.orders()
		.repository()
		.list(&vendor.vendor_id, &filter, query.page, query.limit)
		.await
		.map_err(storage_error)?;

	Ok(Json(ApiResponse::ok(page)))
}

/// Handles GET /api/orders/stats requests.
async fn handle_order_stats(
	State(state): State<AppState>,
	Extension(vendor): Extension<VendorIdentity>,
	Query(query): Query<StatsQuery>,
) -> Result<Json<ApiResponse<OrderStats>>, ApiError> {
	let mut errors = Vec::new();
	let from = parse_datetime("from", query.from.as_deref(), &mut errors);
	let to = parse_datetime("to", query.to.as_deref(), &mut errors);
	if !errors.is_empty() {
		return Err(ApiError::Validation(errors));
	}

	let stats = state
		.engine
		.dashboard()
		.stats(&vendor.vendor_id, from, to)
		.await
		.map_err(dashboard_error)?;

	Ok(Json(ApiResponse::ok(stats)))
}

/// Handles GET /api/orders/{id} requests.
async fn handle_get_order(
	State(state): State<AppState>,
	Extension(vendor): Extension<VendorIdentity>,
	Path(id): Path<String>,
) -> Result<Json<ApiResponse<Order>>, ApiError> {
	let order = state
		.engine
		.orders()
		.repository()
		.get(&vendor.vendor_id, &id)
		.await
		.map_err(storage_error)?;

	Ok(Json(ApiResponse::ok(order)))
}

/// Handles PUT /api/orders/{id}/status requests.
async fn handle_update_status(
	State(state): State<AppState>,
	Extension(vendor): Extension<VendorIdentity>,
	Path(id): Path<String>,
	Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<ApiResponse<Order>>, ApiError> {
	let mut errors = Vec::new();
	let target = parse_enum::<OrderStatus>("status", Some(&request.status), &mut errors);
	let Some(target) = target else {
		return Err(ApiError::Validation(errors));
	};

	let order = state
		.engine
		.orders()
		.transition(&id, &vendor.vendor_id, target, request.note)
		.await
		.map_err(order_error)?;

	Ok(Json(ApiResponse::ok_with_message(
		"order status updated",
		order,
	)))
}
