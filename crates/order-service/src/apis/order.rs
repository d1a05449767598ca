//! Order API implementation.
//!
//! Translates HTTP requests into [`OrderService`] calls and service errors
//! into [`APIError`] responses.

use axum::extract::rejection::JsonRejection;
use order_core::{OrderService, ServiceError};
use order_types::{APIError, CreateOrderRequest, Order, OrderMetrics};
use tracing::warn;

/// Handles order creation requests.
pub async fn create_order(
	service: &OrderService,
	request: CreateOrderRequest,
) -> Result<Order, APIError> {
	let CreateOrderRequest {
		user_id,
		total_amount,
		item_ids,
	} = request;

	service
		.create_order(user_id, total_amount, item_ids)
		.await
		.map_err(to_api_error)
}

/// Retrieves one order by id.
pub async fn get_order_by_id(service: &OrderService, order_id: &str) -> Result<Order, APIError> {
	service.get_order(order_id).await.map_err(to_api_error)
}

/// Returns the current processing metrics.
pub async fn get_metrics(service: &OrderService) -> Result<OrderMetrics, APIError> {
	service.get_metrics().await.map_err(to_api_error)
}

/// Maps a body that failed to deserialize into a 400 response.
pub fn invalid_request(rejection: JsonRejection) -> APIError {
	warn!(error = %rejection.body_text(), "Rejected order request");
	APIError::BadRequest {
		error_type: "INVALID_REQUEST".to_string(),
		message: rejection.body_text(),
		details: None,
	}
}

fn to_api_error(error: ServiceError) -> APIError {
	match error {
		ServiceError::NotFound(_) => APIError::NotFound {
			error_type: "ORDER_NOT_FOUND".to_string(),
			message: error.to_string(),
		},
		ServiceError::Persistence(_) => APIError::InternalServerError {
			error_type: "PERSISTENCE_FAILURE".to_string(),
			message: error.to_string(),
		},
		ServiceError::ShuttingDown => APIError::ServiceUnavailable {
			error_type: "SERVICE_UNAVAILABLE".to_string(),
			message: error.to_string(),
		},
	}
}
