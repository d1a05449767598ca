//! Core order processing engine.
//!
//! Orders are persisted as `Pending`, handed to an in-memory work queue and
//! drained by a fixed pool of workers that move each one through
//! `Processing` to `Completed`. This crate holds the queue, the pool, the
//! lifecycle state machine and the service facade in front of them, plus a
//! builder that wires everything from configuration.

pub mod builder;
pub mod delay;
pub mod engine;
pub mod queue;
pub mod service;
pub mod state;

#[cfg(test)]
mod test_utils;

pub use builder::{BuilderError, OrderServiceBuilder};
pub use delay::{FixedDelay, ProcessingDelay, RandomDelay};
pub use engine::{EngineError, OrderPipeline, WorkOutcome, WorkerPool};
pub use queue::{QueueError, WorkQueue};
pub use service::{OrderService, ServiceError};
pub use state::{OrderStateError, OrderStateMachine};
