//! Order types for the processing pipeline.
//!
//! This module defines the persisted order record, the status lifecycle it
//! moves through, and the aggregate metrics computed over stored orders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A user's purchase request tracked through the processing lifecycle.
///
/// The identity, user, items, amount and creation time are fixed when the
/// order is created. Only `status`, `processed_at` and `processing_time`
/// change afterwards, and only through the lifecycle transitions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
	/// Unique identifier, assigned once before the first write.
	pub order_id: String,
	/// Opaque identifier of the requesting user.
	pub user_id: String,
	/// Item identifiers in the order they were submitted.
	pub item_ids: Vec<String>,
	/// Monetary amount of the order. No range is enforced.
	pub total_amount: f64,
	/// Current lifecycle status.
	pub status: OrderStatus,
	/// Time the order was created.
	pub created_at: DateTime<Utc>,
	/// Time the order entered `COMPLETED`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub processed_at: Option<DateTime<Utc>>,
	/// Milliseconds between `created_at` and `processed_at`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub processing_time: Option<i64>,
}

impl Order {
	/// Creates a fresh `PENDING` order with a newly generated id.
	pub fn new(user_id: impl Into<String>, total_amount: f64, item_ids: Vec<String>) -> Self {
		Self {
			order_id: Uuid::new_v4().to_string(),
			user_id: user_id.into(),
			item_ids,
			total_amount,
			status: OrderStatus::Pending,
			created_at: Utc::now(),
			processed_at: None,
			processing_time: None,
		}
	}

	/// Stamps the completion fields and moves the order to `COMPLETED`.
	///
	/// `processing_time` is derived from the two stored timestamps so that
	/// `processing_time == processed_at - created_at` holds exactly.
	pub fn complete_at(&mut self, processed_at: DateTime<Utc>) {
		self.status = OrderStatus::Completed;
		self.processed_at = Some(processed_at);
		self.processing_time = Some((processed_at - self.created_at).num_milliseconds());
	}
}

/// Status of an order in the processing lifecycle.
///
/// Transitions are one-directional: `Pending -> Processing -> Completed`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
	/// Order has been persisted and queued but no worker has picked it up.
	Pending,
	/// A worker has started processing the order.
	Processing,
	/// Processing finished; timing fields are set.
	Completed,
}

impl OrderStatus {
	/// Returns the wire representation of the status.
	pub fn as_str(&self) -> &'static str {
		match self {
			OrderStatus::Pending => "PENDING",
			OrderStatus::Processing => "PROCESSING",
			OrderStatus::Completed => "COMPLETED",
		}
	}

	/// Returns the status an order moves to next, if any.
	pub fn next(&self) -> Option<OrderStatus> {
		match self {
			OrderStatus::Pending => Some(OrderStatus::Processing),
			OrderStatus::Processing => Some(OrderStatus::Completed),
			OrderStatus::Completed => None,
		}
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Point-in-time aggregate over stored orders.
///
/// Serialized with the snake_case keys exposed by the metrics endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OrderMetrics {
	pub total_orders: u64,
	pub pending_orders: u64,
	pub processing_orders: u64,
	pub completed_orders: u64,
	/// Mean `processing_time` of completed orders, `None` when none completed.
	pub average_processing_time_ms: Option<f64>,
}

impl OrderMetrics {
	/// Builds a snapshot in a single pass over the given orders.
	///
	/// Every order lands in exactly one status bucket, so the per-status
	/// counts always sum to `total_orders`.
	pub fn from_orders<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Self {
		let mut metrics = Self::default();
		let mut timed_sum = 0i64;
		let mut timed_count = 0u64;

		for order in orders {
			metrics.total_orders += 1;
			match order.status {
				OrderStatus::Pending => metrics.pending_orders += 1,
				OrderStatus::Processing => metrics.processing_orders += 1,
				OrderStatus::Completed => {
					metrics.completed_orders += 1;
					if let Some(ms) = order.processing_time {
						timed_sum += ms;
						timed_count += 1;
					}
				},
			}
		}

		if timed_count > 0 {
			metrics.average_processing_time_ms = Some(timed_sum as f64 / timed_count as f64);
		}
		metrics
	}

	/// Returns the count for a single status bucket.
	pub fn count_for(&self, status: OrderStatus) -> u64 {
		match status {
			OrderStatus::Pending => self.pending_orders,
			OrderStatus::Processing => self.processing_orders,
			OrderStatus::Completed => self.completed_orders,
		}
	}
}
