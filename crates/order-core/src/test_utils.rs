//! Store doubles and polling helpers for tests.

use async_trait::async_trait;
use order_storage::implementations::memory::MemoryStorage;
use order_storage::{OrderRepository, OrderStore, StorageError, StorageService};
use order_types::{Order, OrderMetrics, OrderStatus};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

pub(crate) fn memory_store() -> Arc<OrderRepository> {
	Arc::new(OrderRepository::new(Arc::new(StorageService::new(
		Box::new(MemoryStorage::new()),
	))))
}

/// Memory-backed store whose writes fail for records in one status.
pub(crate) struct FlakyStore {
	inner: Arc<OrderRepository>,
	fail_on: OrderStatus,
	failures_left: AtomicUsize,
}

impl FlakyStore {
	pub(crate) fn failing_on(fail_on: OrderStatus) -> Self {
		Self {
			inner: memory_store(),
			fail_on,
			failures_left: AtomicUsize::new(usize::MAX),
		}
	}

	/// Rejects only the first write of a record in `fail_on`.
	pub(crate) fn failing_once_on(fail_on: OrderStatus) -> Self {
		Self {
			failures_left: AtomicUsize::new(1),
			..Self::failing_on(fail_on)
		}
	}
}

#[async_trait]
impl OrderStore for FlakyStore {
	async fn save(&self, order: &Order) -> Result<Order, StorageError> {
		let inject = order.status == self.fail_on
			&& self
				.failures_left
				.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
				.is_ok();
		if inject {
			return Err(StorageError::Backend(format!(
				"injected failure writing {} order",
				order.status
			)));
		}
		self.inner.save(order).await
	}

	async fn find_by_id(&self, order_id: &str) -> Result<Option<Order>, StorageError> {
		self.inner.find_by_id(order_id).await
	}

	async fn count_by_status(&self, status: OrderStatus) -> Result<u64, StorageError> {
		self.inner.count_by_status(status).await
	}

	async fn count(&self) -> Result<u64, StorageError> {
		self.inner.count().await
	}

	async fn average_processing_time_of_completed(&self) -> Result<Option<f64>, StorageError> {
		self.inner.average_processing_time_of_completed().await
	}

	async fn metrics(&self) -> Result<OrderMetrics, StorageError> {
		self.inner.metrics().await
	}
}

/// Memory-backed store whose writes pause after persisting until released.
pub(crate) struct GatedStore {
	inner: Arc<OrderRepository>,
	pub(crate) saved: Arc<Notify>,
	pub(crate) release: Arc<Notify>,
}

impl GatedStore {
	pub(crate) fn new() -> Self {
		Self {
			inner: memory_store(),
			saved: Arc::new(Notify::new()),
			release: Arc::new(Notify::new()),
		}
	}
}

#[async_trait]
impl OrderStore for GatedStore {
	async fn save(&self, order: &Order) -> Result<Order, StorageError> {
		let saved = self.inner.save(order).await?;
		self.saved.notify_one();
		self.release.notified().await;
		Ok(saved)
	}

	async fn find_by_id(&self, order_id: &str) -> Result<Option<Order>, StorageError> {
		self.inner.find_by_id(order_id).await
	}

	async fn count_by_status(&self, status: OrderStatus) -> Result<u64, StorageError> {
		self.inner.count_by_status(status).await
	}

	async fn count(&self) -> Result<u64, StorageError> {
		self.inner.count().await
	}

	async fn average_processing_time_of_completed(&self) -> Result<Option<f64>, StorageError> {
		self.inner.average_processing_time_of_completed().await
	}

	async fn metrics(&self) -> Result<OrderMetrics, StorageError> {
		self.inner.metrics().await
	}
}

/// Polls `condition` every few milliseconds until it holds or `timeout` passes.
pub(crate) async fn wait_until<F, Fut>(timeout: Duration, mut condition: F) -> bool
where
	F: FnMut() -> Fut,
	Fut: Future<Output = bool>,
{
	let deadline = tokio::time::Instant::now() + timeout;
	loop {
		if condition().await {
			return true;
		}
		if tokio::time::Instant::now() >= deadline {
			return false;
		}
		tokio::time::sleep(Duration::from_millis(5)).await;
	}
}
