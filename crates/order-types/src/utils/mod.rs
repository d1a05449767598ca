//! Utility functions shared across the order processor crates.

pub mod formatting;

pub use formatting::truncate_id;
