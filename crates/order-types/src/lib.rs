//! Common types module for the order processing system.
//!
//! This module defines the core data types and structures used throughout
//! the order processor. It provides a centralized location for shared types
//! so the storage layer, the processing core and the HTTP boundary agree on
//! the shape of an order.

/// API types for HTTP endpoints and request/response structures.
pub mod api;
/// Order records, lifecycle statuses and aggregate metrics.
pub mod order;
/// Registry trait for self-registering implementations.
pub mod registry;
/// Storage types for managing persistent data.
pub mod storage;
/// Utility functions for formatting values in logs.
pub mod utils;
/// Configuration validation types for ensuring type-safe configurations.
pub mod validation;

// Re-export all types for convenient access
pub use api::*;
pub use order::*;
pub use registry::ImplementationRegistry;
pub use storage::*;
pub use utils::truncate_id;
pub use validation::*;
