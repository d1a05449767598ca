//! Asynchronous processing pipeline.
//!
//! [`OrderPipeline`] owns the work queue, the worker pool and the state
//! machine the workers drive. Its lifecycle is explicit: nothing runs until
//! [`OrderPipeline::start`] and [`OrderPipeline::stop`] releases every worker.

pub mod lifecycle;
pub mod pool;
mod worker;

pub use pool::WorkerPool;
pub use worker::WorkOutcome;

use crate::delay::ProcessingDelay;
use crate::queue::{QueueError, WorkQueue};
use crate::state::OrderStateMachine;
use order_storage::OrderStore;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{RwLock, RwLockReadGuard};
use worker::WorkerContext;

/// Errors that can occur while starting or stopping the pipeline.
#[derive(Debug, Error)]
pub enum EngineError {
	#[error("Pipeline is already running")]
	AlreadyStarted,
	#[error("Pipeline has been stopped")]
	Stopped,
	#[error("Worker error: {0}")]
	Worker(String),
}

/// Queue, workers and lifecycle state machine wired together.
pub struct OrderPipeline {
	queue: Arc<WorkQueue>,
	/// Creations hold a read guard from the acceptance check to the enqueue;
	/// closing the queue takes the write side.
	admission: RwLock<()>,
	state_machine: Arc<OrderStateMachine>,
	delay: Arc<dyn ProcessingDelay>,
	pool: WorkerPool,
}

impl OrderPipeline {
	pub fn new(store: Arc<dyn OrderStore>, delay: Arc<dyn ProcessingDelay>, workers: usize) -> Self {
		Self {
			queue: Arc::new(WorkQueue::new()),
			admission: RwLock::new(()),
			state_machine: Arc::new(OrderStateMachine::new(store)),
			delay,
			pool: WorkerPool::new(workers),
		}
	}

	/// Holds off [`OrderPipeline::stop`] from closing the queue until the
	/// guard is dropped.
	pub async fn admit(&self) -> RwLockReadGuard<'_, ()> {
		self.admission.read().await
	}

	/// Schedules an already persisted order for processing.
	pub fn enqueue(&self, order_id: String) -> Result<(), QueueError> {
		self.queue.offer(order_id)
	}

	/// Whether new orders are still accepted.
	pub fn is_accepting(&self) -> bool {
		!self.queue.is_closed()
	}

	pub fn worker_count(&self) -> usize {
		self.pool.size()
	}

	fn worker_context(&self) -> WorkerContext {
		WorkerContext {
			queue: self.queue.clone(),
			state_machine: self.state_machine.clone(),
			delay: self.delay.clone(),
		}
	}
}
