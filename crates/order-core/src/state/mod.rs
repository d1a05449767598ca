//! State management for orders within the processing pipeline.
//!
//! This module provides the state machine that moves an order through its
//! lifecycle, validating each transition and persisting it as a single write.

pub mod order;

pub use order::{OrderStateError, OrderStateMachine};
