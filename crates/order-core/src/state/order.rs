//! Order state machine implementation.
//!
//! Orders move through `Pending -> Processing -> Completed` and nothing else.
//! Each transition reads the stored record, checks the move, applies it to a
//! copy and writes the whole record back, so the store never holds a status
//! without the fields that belong to it.

use chrono::Utc;
use order_storage::OrderStore;
use order_types::{truncate_id, Order, OrderStatus};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during order state management.
#[derive(Debug, Error)]
pub enum OrderStateError {
	#[error("Storage error: {0}")]
	Storage(String),
	#[error("Invalid state transition from {from} to {to}")]
	InvalidTransition { from: OrderStatus, to: OrderStatus },
	#[error("Order not found: {0}")]
	OrderNotFound(String),
}

/// Manages order state transitions and persistence.
///
/// A given order is only ever advanced by the worker that dequeued it, so the
/// read-modify-write below needs no per-order lock.
pub struct OrderStateMachine {
	store: Arc<dyn OrderStore>,
}

impl OrderStateMachine {
	pub fn new(store: Arc<dyn OrderStore>) -> Self {
		Self { store }
	}

	/// Marks a pending order as being worked on.
	pub async fn begin_processing(&self, order_id: &str) -> Result<Order, OrderStateError> {
		self.transition_order_status(order_id, OrderStatus::Processing)
			.await
	}

	/// Marks a processing order as completed, stamping its timing fields.
	pub async fn complete(&self, order_id: &str) -> Result<Order, OrderStateError> {
		self.transition_order_status(order_id, OrderStatus::Completed)
			.await
	}

	/// Transitions an order to a new status with validation.
	pub async fn transition_order_status(
		&self,
		order_id: &str,
		new_status: OrderStatus,
	) -> Result<Order, OrderStateError> {
		let mut order = self
			.store
			.find_by_id(order_id)
			.await
			.map_err(|e| OrderStateError::Storage(e.to_string()))?
			.ok_or_else(|| OrderStateError::OrderNotFound(order_id.to_string()))?;

		if !Self::is_valid_transition(order.status, new_status) {
			return Err(OrderStateError::InvalidTransition {
				from: order.status,
				to: new_status,
			});
		}

		match new_status {
			OrderStatus::Completed => order.complete_at(Utc::now()),
			status => order.status = status,
		}

		let saved = self
			.store
			.save(&order)
			.await
			.map_err(|e| OrderStateError::Storage(e.to_string()))?;

		tracing::debug!(
			order_id = %truncate_id(order_id),
			status = %saved.status,
			"Order status updated"
		);
		Ok(saved)
	}

	/// Checks if a state transition is valid.
	fn is_valid_transition(from: OrderStatus, to: OrderStatus) -> bool {
		from.next() == Some(to)
	}
}
