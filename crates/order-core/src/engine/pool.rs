//! Fixed-size pool of worker tasks.

use super::worker::{Worker, WorkerContext};
use super::EngineError;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

/// Owns the worker tasks and the shutdown signal they all observe.
pub struct WorkerPool {
	size: usize,
	shutdown_tx: watch::Sender<bool>,
	handles: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
	pub fn new(size: usize) -> Self {
		let (shutdown_tx, _) = watch::channel(false);
		Self {
			size,
			shutdown_tx,
			handles: Mutex::new(Vec::new()),
		}
	}

	/// Number of workers the pool runs.
	pub fn size(&self) -> usize {
		self.size
	}

	/// Spawns `size` workers sharing `ctx`.
	pub(crate) async fn spawn(&self, ctx: WorkerContext) -> Result<(), EngineError> {
		let mut handles = self.handles.lock().await;
		if *self.shutdown_tx.borrow() {
			return Err(EngineError::Stopped);
		}
		if !handles.is_empty() {
			return Err(EngineError::AlreadyStarted);
		}

		for id in 0..self.size {
			let worker = Worker::new(id, ctx.clone(), self.shutdown_tx.subscribe());
			handles.push(tokio::spawn(worker.run()));
		}
		Ok(())
	}

	/// Signals every worker to stop and waits for all of them to exit.
	///
	/// Safe to call more than once.
	pub async fn shutdown(&self) -> Result<(), EngineError> {
		self.shutdown_tx.send_replace(true);

		let handles = std::mem::take(&mut *self.handles.lock().await);
		let mut failures = Vec::new();
		for handle in handles {
			if let Err(e) = handle.await {
				tracing::error!(error = %e, "Worker task failed");
				failures.push(e.to_string());
			}
		}

		if failures.is_empty() {
			Ok(())
		} else {
			Err(EngineError::Worker(failures.join("; ")))
		}
	}
}
