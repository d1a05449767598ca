//! A single worker draining the work queue.

use crate::delay::ProcessingDelay;
use crate::queue::WorkQueue;
use crate::state::{OrderStateError, OrderStateMachine};
use order_types::{truncate_id, Order, OrderStatus};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::instrument;

/// How one dequeued order left the worker.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkOutcome {
	/// The order reached `Completed`.
	Completed(Order),
	/// Shutdown interrupted the order; it stays in the given status.
	Cancelled(OrderStatus),
}

/// Everything a worker shares with its siblings.
#[derive(Clone)]
pub(crate) struct WorkerContext {
	pub(crate) queue: Arc<WorkQueue>,
	pub(crate) state_machine: Arc<OrderStateMachine>,
	pub(crate) delay: Arc<dyn ProcessingDelay>,
}

pub(crate) struct Worker {
	id: usize,
	ctx: WorkerContext,
	shutdown: watch::Receiver<bool>,
}

impl Worker {
	pub(crate) fn new(id: usize, ctx: WorkerContext, shutdown: watch::Receiver<bool>) -> Self {
		Self { id, ctx, shutdown }
	}

	/// Takes orders until shutdown. A failed order is logged and skipped.
	pub(crate) async fn run(mut self) {
		tracing::info!(worker = self.id, "Worker started");

		while let Some(order_id) = self.ctx.queue.take(&mut self.shutdown).await {
			match self.process(&order_id).await {
				Ok(WorkOutcome::Completed(order)) => {
					tracing::info!(
						worker = self.id,
						order_id = %truncate_id(&order.order_id),
						processing_time_ms = order.processing_time.unwrap_or_default(),
						"Order completed"
					);
				},
				Ok(WorkOutcome::Cancelled(status)) => {
					tracing::warn!(
						worker = self.id,
						order_id = %truncate_id(&order_id),
						status = %status,
						"Order interrupted by shutdown"
					);
					break;
				},
				Err(e) => {
					tracing::error!(
						worker = self.id,
						order_id = %truncate_id(&order_id),
						error = %e,
						"Order processing failed"
					);
				},
			}
		}

		tracing::info!(worker = self.id, "Worker stopped");
	}

	/// Runs one order through `Processing` and `Completed`.
	#[instrument(skip_all, fields(worker = self.id, order_id = %truncate_id(order_id)))]
	pub(crate) async fn process(&mut self, order_id: &str) -> Result<WorkOutcome, OrderStateError> {
		if *self.shutdown.borrow() {
			return Ok(WorkOutcome::Cancelled(OrderStatus::Pending));
		}

		self.ctx.state_machine.begin_processing(order_id).await?;
		tracing::debug!("Processing started");

		let work = tokio::time::sleep(self.ctx.delay.next_delay());
		tokio::select! {
			biased;
			_ = self.shutdown.changed() => {
				return Ok(WorkOutcome::Cancelled(OrderStatus::Processing));
			}
			_ = work => {}
		}

		let order = self.ctx.state_machine.complete(order_id).await?;
		Ok(WorkOutcome::Completed(order))
	}
}
