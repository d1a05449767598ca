//! Work queue between order creation and the worker pool.
//!
//! An unbounded FIFO of order ids. Any number of producers may `offer`
//! without blocking, and any number of workers may `take`. A worker blocked
//! in `take` is released as soon as the pipeline's shutdown signal fires.

use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::sync::{mpsc, watch, Mutex};

/// Errors that can occur when enqueueing work.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
	/// The queue no longer accepts work because the pipeline was stopped.
	#[error("Work queue is closed")]
	Closed,
}

/// Unbounded multi-producer, multi-consumer queue of order ids.
pub struct WorkQueue {
	sender: mpsc::UnboundedSender<String>,
	/// Workers take turns holding the receiver; the lock is fair, so waiting
	/// workers are served in the order they arrived.
	receiver: Mutex<mpsc::UnboundedReceiver<String>>,
	closed: AtomicBool,
}

impl WorkQueue {
	pub fn new() -> Self {
		let (sender, receiver) = mpsc::unbounded_channel();
		Self {
			sender,
			receiver: Mutex::new(receiver),
			closed: AtomicBool::new(false),
		}
	}

	/// Appends an order id to the back of the queue. Never blocks.
	pub fn offer(&self, order_id: String) -> Result<(), QueueError> {
		if self.is_closed() {
			return Err(QueueError::Closed);
		}
		self.sender.send(order_id).map_err(|_| QueueError::Closed)
	}

	/// Waits for the next order id.
	///
	/// Returns `None` once `shutdown` carries `true` (or its sender is gone).
	/// When an item and the shutdown signal are both ready, shutdown wins and
	/// the item stays queued.
	pub async fn take(&self, shutdown: &mut watch::Receiver<bool>) -> Option<String> {
		if *shutdown.borrow() {
			return None;
		}

		let mut receiver = tokio::select! {
			biased;
			_ = shutdown.changed() => return None,
			guard = self.receiver.lock() => guard,
		};

		tokio::select! {
			biased;
			_ = shutdown.changed() => None,
			order_id = receiver.recv() => order_id,
		}
	}

	/// Stops accepting new work. Items already queued are left in place.
	pub fn close(&self) {
		self.closed.store(true, Ordering::SeqCst);
	}

	pub fn is_closed(&self) -> bool {
		self.closed.load(Ordering::SeqCst)
	}
}

impl Default for WorkQueue {
	fn default() -> Self {
		Self::new()
	}
}
