//! Order persistence interface and its storage-backed implementation.
//!
//! The processing core only talks to [`OrderStore`]. [`OrderRepository`]
//! implements it on top of [`StorageService`], storing each order as one JSON
//! document under the `orders` namespace.

use crate::{StorageError, StorageService};
use async_trait::async_trait;
use order_types::{Order, OrderMetrics, OrderStatus, StorageKey};
use std::sync::Arc;

/// Durable persistence of order records.
///
/// Implementations must tolerate concurrent calls for different orders and
/// must write a whole record in one operation.
#[async_trait]
pub trait OrderStore: Send + Sync {
	/// Inserts or replaces an order and returns the persisted record.
	async fn save(&self, order: &Order) -> Result<Order, StorageError>;

	/// Fetches an order by id.
	async fn find_by_id(&self, order_id: &str) -> Result<Option<Order>, StorageError>;

	/// Counts orders currently in `status`.
	async fn count_by_status(&self, status: OrderStatus) -> Result<u64, StorageError>;

	/// Counts all stored orders.
	async fn count(&self) -> Result<u64, StorageError>;

	/// Mean processing time of completed orders, `None` if none completed.
	async fn average_processing_time_of_completed(&self) -> Result<Option<f64>, StorageError>;

	/// Aggregate snapshot for the metrics endpoint.
	///
	/// The total is derived from the status buckets so the counts always add up.
	async fn metrics(&self) -> Result<OrderMetrics, StorageError> {
		let pending_orders = self.count_by_status(OrderStatus::Pending).await?;
		let processing_orders = self.count_by_status(OrderStatus::Processing).await?;
		let completed_orders = self.count_by_status(OrderStatus::Completed).await?;
		Ok(OrderMetrics {
			total_orders: pending_orders + processing_orders + completed_orders,
			pending_orders,
			processing_orders,
			completed_orders,
			average_processing_time_ms: self.average_processing_time_of_completed().await?,
		})
	}
}

/// [`OrderStore`] backed by a [`StorageService`].
pub struct OrderRepository {
	storage: Arc<StorageService>,
}

impl OrderRepository {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	async fn all_orders(&self) -> Result<Vec<Order>, StorageError> {
		self.storage.retrieve_all(StorageKey::Orders.as_str()).await
	}
}

#[async_trait]
impl OrderStore for OrderRepository {
	async fn save(&self, order: &Order) -> Result<Order, StorageError> {
		self.storage
			.store(StorageKey::Orders.as_str(), &order.order_id, order)
			.await?;
		Ok(order.clone())
	}

	async fn find_by_id(&self, order_id: &str) -> Result<Option<Order>, StorageError> {
		match self
			.storage
			.retrieve(StorageKey::Orders.as_str(), order_id)
			.await
		{
			Ok(order) => Ok(Some(order)),
			Err(StorageError::NotFound) => Ok(None),
			Err(e) => Err(e),
		}
	}

	async fn count_by_status(&self, status: OrderStatus) -> Result<u64, StorageError> {
		Ok(self.metrics().await?.count_for(status))
	}

	async fn count(&self) -> Result<u64, StorageError> {
		Ok(self.all_orders().await?.len() as u64)
	}

	async fn average_processing_time_of_completed(&self) -> Result<Option<f64>, StorageError> {
		Ok(self.metrics().await?.average_processing_time_ms)
	}

	async fn metrics(&self) -> Result<OrderMetrics, StorageError> {
		let orders = self.all_orders().await?;
		Ok(OrderMetrics::from_orders(orders.iter()))
	}
}
