//! Order service: the entry point used by the request boundary.
//!
//! Creation persists a `Pending` record and only then hands it to the
//! pipeline. Reads and metrics go straight to the store and never touch the
//! queue.

use crate::engine::{EngineError, OrderPipeline};
use crate::queue::QueueError;
use order_storage::{OrderStore, StorageError};
use order_types::{truncate_id, Order, OrderMetrics};
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

/// Errors surfaced to callers of [`OrderService`].
#[derive(Debug, Error)]
pub enum ServiceError {
	/// No order with the requested id exists.
	#[error("Order not found: {0}")]
	NotFound(String),
	/// The store failed to read or write.
	#[error("Persistence failure: {0}")]
	Persistence(#[from] StorageError),
	/// The pipeline was stopped; no new orders are accepted.
	#[error("Service is shutting down")]
	ShuttingDown,
}

/// Creates orders, hands them to the pipeline and answers read queries.
pub struct OrderService {
	store: Arc<dyn OrderStore>,
	pipeline: OrderPipeline,
}

impl OrderService {
	pub fn new(store: Arc<dyn OrderStore>, pipeline: OrderPipeline) -> Self {
		Self { store, pipeline }
	}

	/// Creates a `Pending` order, persists it and queues it for processing.
	///
	/// Nothing is queued unless the record was written first. A concurrent
	/// [`OrderService::stop`] waits for the creation to finish queueing.
	#[instrument(skip_all, fields(user_id = %user_id.as_ref()))]
	pub async fn create_order(
		&self,
		user_id: impl AsRef<str>,
		total_amount: f64,
		item_ids: Vec<String>,
	) -> Result<Order, ServiceError> {
		let _admitted = self.pipeline.admit().await;
		if !self.pipeline.is_accepting() {
			return Err(ServiceError::ShuttingDown);
		}

		let order = Order::new(user_id.as_ref(), total_amount, item_ids);
		let saved = self.store.save(&order).await.map_err(|e| {
			tracing::error!(error = %e, "Failed to persist new order");
			ServiceError::Persistence(e)
		})?;

		if let Err(QueueError::Closed) = self.pipeline.enqueue(saved.order_id.clone()) {
			tracing::error!(
				order_id = %truncate_id(&saved.order_id),
				"Order persisted but not queued, pipeline closed while admitted"
			);
			return Err(ServiceError::ShuttingDown);
		}

		tracing::info!(order_id = %truncate_id(&saved.order_id), "Order created");
		Ok(saved)
	}

	/// Fetches an order by id.
	pub async fn get_order(&self, order_id: &str) -> Result<Order, ServiceError> {
		self.store
			.find_by_id(order_id)
			.await?
			.ok_or_else(|| ServiceError::NotFound(order_id.to_string()))
	}

	/// Point-in-time counts and average processing time.
	pub async fn get_metrics(&self) -> Result<OrderMetrics, ServiceError> {
		Ok(self.store.metrics().await?)
	}

	/// Starts the worker pool.
	pub async fn start(&self) -> Result<(), EngineError> {
		self.pipeline.start().await
	}

	/// Stops the worker pool; later creations fail with `ShuttingDown`.
	pub async fn stop(&self) -> Result<(), EngineError> {
		self.pipeline.stop().await
	}

	pub fn worker_count(&self) -> usize {
		self.pipeline.worker_count()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::delay::{FixedDelay, ProcessingDelay, RandomDelay};
	use crate::test_utils::{memory_store, wait_until, FlakyStore, GatedStore};
	use order_types::OrderStatus;
	use std::collections::HashSet;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::time::Duration;

	async fn running_service(
		store: Arc<dyn OrderStore>,
		delay: Arc<dyn ProcessingDelay>,
		workers: usize,
	) -> Arc<OrderService> {
		let pipeline = OrderPipeline::new(store.clone(), delay, workers);
		let service = Arc::new(OrderService::new(store, pipeline));
		service.start().await.unwrap();
		service
	}

	#[tokio::test]
	async fn test_create_then_complete() {
		let service =
			running_service(memory_store(), Arc::new(RandomDelay::from_millis(20, 60)), 2).await;

		let created = service
			.create_order("u1", 42.5, vec!["a".into(), "b".into()])
			.await
			.unwrap();
		assert_eq!(created.status, OrderStatus::Pending);
		assert_eq!(created.user_id, "u1");
		assert_eq!(created.total_amount, 42.5);
		assert_eq!(created.item_ids, vec!["a".to_string(), "b".to_string()]);
		assert!(created.processed_at.is_none());
		assert!(created.processing_time.is_none());

		let completed = wait_until(Duration::from_secs(5), || {
			let service = service.clone();
			let id = created.order_id.clone();
			async move {
				service.get_order(&id).await.unwrap().status == OrderStatus::Completed
			}
		})
		.await;
		assert!(completed);

		let order = service.get_order(&created.order_id).await.unwrap();
		let processing_time = order.processing_time.unwrap();
		assert!(processing_time >= 20, "processing took {}ms", processing_time);
		assert!(processing_time < 5000, "processing took {}ms", processing_time);
		assert_eq!(
			processing_time,
			(order.processed_at.unwrap() - order.created_at).num_milliseconds()
		);

		let metrics = service.get_metrics().await.unwrap();
		assert_eq!(metrics.total_orders, 1);
		assert_eq!(metrics.completed_orders, 1);
		assert_eq!(metrics.average_processing_time_ms, Some(processing_time as f64));

		service.stop().await.unwrap();
	}

	#[tokio::test]
	async fn test_unknown_order_is_not_found() {
		let service = running_service(memory_store(), Arc::new(FixedDelay(Duration::ZERO)), 1).await;
		assert!(matches!(
			service.get_order("unknown-id").await,
			Err(ServiceError::NotFound(id)) if id == "unknown-id"
		));
		service.stop().await.unwrap();
	}

	#[tokio::test]
	async fn test_metrics_without_orders() {
		let service = running_service(memory_store(), Arc::new(FixedDelay(Duration::ZERO)), 1).await;
		let metrics = service.get_metrics().await.unwrap();
		assert_eq!(metrics, OrderMetrics::default());
		assert_eq!(metrics.average_processing_time_ms, None);
		service.stop().await.unwrap();
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
	async fn test_concurrent_orders_all_complete_once() {
		const ORDERS: usize = 60;
		let work_steps = Arc::new(AtomicUsize::new(0));
		let delay = {
			let work_steps = work_steps.clone();
			move || {
				work_steps.fetch_add(1, Ordering::SeqCst);
				Duration::from_millis(2)
			}
		};
		let service = running_service(memory_store(), Arc::new(delay), 4).await;

		let mut creations = Vec::new();
		for i in 0..ORDERS {
			let service = service.clone();
			creations.push(tokio::spawn(async move {
				service
					.create_order(format!("user-{}", i), i as f64, vec![])
					.await
					.unwrap()
					.order_id
			}));
		}
		let mut ids = HashSet::new();
		for creation in creations {
			ids.insert(creation.await.unwrap());
		}
		assert_eq!(ids.len(), ORDERS);

		let done = wait_until(Duration::from_secs(10), || {
			let service = service.clone();
			async move { service.get_metrics().await.unwrap().completed_orders == ORDERS as u64 }
		})
		.await;
		assert!(done);

		let metrics = service.get_metrics().await.unwrap();
		assert_eq!(metrics.total_orders, ORDERS as u64);
		assert_eq!(
			metrics.pending_orders + metrics.processing_orders + metrics.completed_orders,
			metrics.total_orders
		);
		assert_eq!(work_steps.load(Ordering::SeqCst), ORDERS);

		service.stop().await.unwrap();
	}

	#[tokio::test]
	async fn test_shutdown_leaves_queued_pending_and_inflight_processing() {
		let service =
			running_service(memory_store(), Arc::new(FixedDelay(Duration::from_secs(60))), 2).await;

		for i in 0..5 {
			service
				.create_order(format!("u{}", i), 1.0, vec![])
				.await
				.unwrap();
		}

		let busy = wait_until(Duration::from_secs(5), || {
			let service = service.clone();
			async move { service.get_metrics().await.unwrap().processing_orders == 2 }
		})
		.await;
		assert!(busy);

		tokio::time::timeout(Duration::from_secs(1), service.stop())
			.await
			.expect("stop should interrupt the work step")
			.unwrap();

		let expected = OrderMetrics {
			total_orders: 5,
			pending_orders: 3,
			processing_orders: 2,
			completed_orders: 0,
			average_processing_time_ms: None,
		};
		assert_eq!(service.get_metrics().await.unwrap(), expected);

		tokio::time::sleep(Duration::from_millis(50)).await;
		assert_eq!(service.get_metrics().await.unwrap(), expected);
	}

	#[tokio::test]
	async fn test_create_after_stop_is_rejected() {
		let store = memory_store();
		let service = running_service(store.clone(), Arc::new(FixedDelay(Duration::ZERO)), 1).await;
		service.stop().await.unwrap();

		assert!(matches!(
			service.create_order("u1", 1.0, vec![]).await,
			Err(ServiceError::ShuttingDown)
		));
		assert_eq!(store.count().await.unwrap(), 0);
	}

	#[tokio::test]
	async fn test_stop_waits_for_admitted_creation() {
		let store = Arc::new(GatedStore::new());
		let pipeline = OrderPipeline::new(store.clone(), Arc::new(FixedDelay(Duration::ZERO)), 1);
		let service = Arc::new(OrderService::new(store.clone(), pipeline));

		let creating = tokio::spawn({
			let service = service.clone();
			async move { service.create_order("u1", 1.0, vec![]).await }
		});
		store.saved.notified().await;

		let stopping = tokio::spawn({
			let service = service.clone();
			async move { service.stop().await }
		});
		tokio::time::sleep(Duration::from_millis(50)).await;
		assert!(!stopping.is_finished(), "stop closed the queue mid-creation");

		store.release.notify_one();
		let created = creating.await.unwrap().unwrap();
		stopping.await.unwrap().unwrap();

		let order = service.get_order(&created.order_id).await.unwrap();
		assert_eq!(order.status, OrderStatus::Pending);
		assert_eq!(store.count().await.unwrap(), 1);

		assert!(matches!(
			service.create_order("u2", 1.0, vec![]).await,
			Err(ServiceError::ShuttingDown)
		));
		assert_eq!(store.count().await.unwrap(), 1);
	}

	#[tokio::test]
	async fn test_failed_creation_persists_and_queues_nothing() {
		let store = Arc::new(FlakyStore::failing_on(OrderStatus::Pending));
		let service = running_service(store.clone(), Arc::new(FixedDelay(Duration::ZERO)), 1).await;

		assert!(matches!(
			service.create_order("u1", 1.0, vec![]).await,
			Err(ServiceError::Persistence(_))
		));
		assert_eq!(service.get_metrics().await.unwrap(), OrderMetrics::default());
		service.stop().await.unwrap();
	}

	#[tokio::test]
	async fn test_failed_transition_keeps_worker_alive() {
		let store = Arc::new(FlakyStore::failing_on(OrderStatus::Completed));
		let service = running_service(store.clone(), Arc::new(FixedDelay(Duration::ZERO)), 1).await;

		let first = service.create_order("u1", 1.0, vec![]).await.unwrap();
		let second = service.create_order("u2", 1.0, vec![]).await.unwrap();

		let both_attempted = wait_until(Duration::from_secs(5), || {
			let service = service.clone();
			async move { service.get_metrics().await.unwrap().processing_orders == 2 }
		})
		.await;
		assert!(both_attempted);

		for id in [&first.order_id, &second.order_id] {
			let order = service.get_order(id).await.unwrap();
			assert_eq!(order.status, OrderStatus::Processing);
			assert!(order.processed_at.is_none());
		}
		service.stop().await.unwrap();
	}

	#[tokio::test]
	async fn test_failed_start_of_work_leaves_order_pending() {
		let store = Arc::new(FlakyStore::failing_once_on(OrderStatus::Processing));
		let service = running_service(store.clone(), Arc::new(FixedDelay(Duration::ZERO)), 1).await;

		let first = service.create_order("u1", 1.0, vec![]).await.unwrap();
		let second = service.create_order("u2", 1.0, vec![]).await.unwrap();

		let second_done = wait_until(Duration::from_secs(5), || {
			let service = service.clone();
			let id = second.order_id.clone();
			async move { service.get_order(&id).await.unwrap().status == OrderStatus::Completed }
		})
		.await;
		assert!(second_done);

		let order = service.get_order(&first.order_id).await.unwrap();
		assert_eq!(order.status, OrderStatus::Pending);
		assert!(order.processed_at.is_none());
		assert!(order.processing_time.is_none());

		let metrics = service.get_metrics().await.unwrap();
		assert_eq!(metrics.pending_orders, 1);
		assert_eq!(metrics.processing_orders, 0);
		assert_eq!(metrics.completed_orders, 1);
		service.stop().await.unwrap();
	}
}
