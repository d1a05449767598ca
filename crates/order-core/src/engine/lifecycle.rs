//! Lifecycle management for the processing pipeline.
//!
//! Handles starting the worker pool and shutting it down, ensuring queued
//! orders are left untouched and in-flight work is abandoned promptly.

use super::{EngineError, OrderPipeline};

impl OrderPipeline {
	/// Spawns the worker pool.
	pub async fn start(&self) -> Result<(), EngineError> {
		self.pool.spawn(self.worker_context()).await?;
		tracing::info!(workers = self.pool.size(), "Order pipeline started");
		Ok(())
	}

	/// Stops accepting orders, signals every worker and waits for them.
	///
	/// Creations already past the acceptance check finish first and their
	/// orders are queued.
	///
	/// Orders still queued remain `Pending`; orders whose work step was
	/// interrupted remain `Processing`.
	pub async fn stop(&self) -> Result<(), EngineError> {
		tracing::info!("Shutting down order pipeline");
		{
			let _admission = self.admission.write().await;
			self.queue.close();
		}
		self.pool.shutdown().await?;
		tracing::info!("Order pipeline stopped");
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::delay::FixedDelay;
	use crate::test_utils::{memory_store, wait_until};
	use order_storage::OrderStore;
	use order_types::{Order, OrderStatus};
	use std::sync::Arc;
	use std::time::Duration;

	fn pipeline(store: Arc<dyn OrderStore>, delay: Duration, workers: usize) -> OrderPipeline {
		OrderPipeline::new(store, Arc::new(FixedDelay(delay)), workers)
	}

	#[tokio::test]
	async fn test_start_twice_fails() {
		let pipeline = pipeline(memory_store(), Duration::ZERO, 2);
		pipeline.start().await.unwrap();
		assert!(matches!(
			pipeline.start().await,
			Err(EngineError::AlreadyStarted)
		));
		pipeline.stop().await.unwrap();
	}

	#[tokio::test]
	async fn test_restart_after_stop_fails() {
		let pipeline = pipeline(memory_store(), Duration::ZERO, 1);
		pipeline.start().await.unwrap();
		pipeline.stop().await.unwrap();
		pipeline.stop().await.unwrap();

		assert!(!pipeline.is_accepting());
		assert!(matches!(pipeline.start().await, Err(EngineError::Stopped)));
	}

	#[tokio::test]
	async fn test_stop_without_start() {
		let pipeline = pipeline(memory_store(), Duration::ZERO, 3);
		pipeline.stop().await.unwrap();
		assert!(!pipeline.is_accepting());
	}

	#[tokio::test]
	async fn test_processes_enqueued_orders() {
		let store = memory_store();
		let pipeline = pipeline(store.clone(), Duration::from_millis(5), 2);
		pipeline.start().await.unwrap();

		let mut ids = Vec::new();
		for i in 0..4 {
			let order = store
				.save(&Order::new(format!("u{}", i), 1.0, vec![]))
				.await
				.unwrap();
			pipeline.enqueue(order.order_id.clone()).unwrap();
			ids.push(order.order_id);
		}

		let done = wait_until(Duration::from_secs(5), || {
			let store = store.clone();
			async move { store.count_by_status(OrderStatus::Completed).await.unwrap() == 4 }
		})
		.await;
		assert!(done);
		for id in ids {
			let order = store.find_by_id(&id).await.unwrap().unwrap();
			assert!(order.processing_time.unwrap() >= 5);
		}
		pipeline.stop().await.unwrap();
	}

	#[tokio::test]
	async fn test_stop_releases_idle_workers_promptly() {
		let pipeline = pipeline(memory_store(), Duration::ZERO, 8);
		pipeline.start().await.unwrap();
		tokio::time::sleep(Duration::from_millis(10)).await;

		tokio::time::timeout(Duration::from_secs(1), pipeline.stop())
			.await
			.expect("idle workers should exit promptly")
			.unwrap();
	}
}
