//! HTTP server for the order processor API.
//!
//! Routes live under `/api`. Handlers stay thin and delegate to
//! [`crate::apis::order`].

use axum::{
	extract::{rejection::JsonRejection, Path, State},
	response::Json,
	routing::{get, post},
	Router,
};
use order_config::ApiConfig;
use order_core::OrderService;
use order_types::{APIError, CreateOrderRequest, Order, OrderMetrics};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// Service handling order creation and queries.
	pub service: Arc<OrderService>,
}

/// Builds the API router.
pub fn router(service: Arc<OrderService>) -> Router {
	Router::new()
		.nest(
			"/api",
			Router::new()
				.route("/orders", post(handle_create_order))
				.route("/orders/metrics", get(handle_get_metrics))
				.route("/orders/{id}", get(handle_get_order_by_id)),
		)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(CorsLayer::permissive()),
		)
		.with_state(AppState { service })
}

/// Starts the HTTP server and runs it until `shutdown` resolves.
///
/// In-flight requests are allowed to finish before this returns.
pub async fn start_server<F>(
	api_config: ApiConfig,
	service: Arc<OrderService>,
	shutdown: F,
) -> Result<(), Box<dyn std::error::Error>>
where
	F: Future<Output = ()> + Send + 'static,
{
	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Order API server starting on {}", bind_address);

	axum::serve(listener, router(service))
		.with_graceful_shutdown(shutdown)
		.await?;

	tracing::info!("Order API server stopped");
	Ok(())
}

/// Handles POST /api/orders requests.
async fn handle_create_order(
	State(state): State<AppState>,
	payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<Json<Order>, APIError> {
	let Json(request) = payload.map_err(crate::apis::order::invalid_request)?;
	crate::apis::order::create_order(&state.service, request)
		.await
		.map(Json)
}

/// Handles GET /api/orders/{id} requests.
async fn handle_get_order_by_id(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<Order>, APIError> {
	match crate::apis::order::get_order_by_id(&state.service, &id).await {
		Ok(order) => Ok(Json(order)),
		Err(e) => {
			tracing::warn!("Order retrieval failed: {}", e);
			Err(e)
		},
	}
}

/// Handles GET /api/orders/metrics requests.
async fn handle_get_metrics(State(state): State<AppState>) -> Result<Json<OrderMetrics>, APIError> {
	crate::apis::order::get_metrics(&state.service)
		.await
		.map(Json)
}
