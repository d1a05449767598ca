//! Configuration builder for creating test and development configurations.
//!
//! This module provides utilities for constructing Config instances with
//! sensible defaults, particularly useful for testing scenarios.

use crate::{ApiConfig, Config, PipelineConfig, ServiceConfig, StorageConfig};
use std::collections::HashMap;

/// Builder for creating `Config` instances with a fluent API.
///
/// Defaults to in-memory storage, two workers and a short processing window
/// so tests finish quickly.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
	service_id: String,
	storage_primary: String,
	storage_implementations: HashMap<String, toml::Value>,
	workers: usize,
	min_processing_ms: u64,
	max_processing_ms: u64,
	api: Option<ApiConfig>,
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigBuilder {
	/// Creates a new `ConfigBuilder` with default values suitable for testing.
	pub fn new() -> Self {
		let mut storage_implementations = HashMap::new();
		storage_implementations.insert(
			"memory".to_string(),
			toml::Value::Table(toml::map::Map::new()),
		);
		Self {
			service_id: "test-order-processor".to_string(),
			storage_primary: "memory".to_string(),
			storage_implementations,
			workers: 2,
			min_processing_ms: 10,
			max_processing_ms: 20,
			api: None,
		}
	}

	/// Sets the service ID.
	pub fn service_id(mut self, id: impl Into<String>) -> Self {
		self.service_id = id.into();
		self
	}

	/// Selects the primary storage and registers its settings.
	pub fn storage(mut self, primary: impl Into<String>, settings: toml::Value) -> Self {
		let primary = primary.into();
		self.storage_implementations.insert(primary.clone(), settings);
		self.storage_primary = primary;
		self
	}

	/// Sets the worker pool size.
	pub fn workers(mut self, workers: usize) -> Self {
		self.workers = workers;
		self
	}

	/// Sets the simulated work window in milliseconds.
	pub fn processing_window_ms(mut self, min: u64, max: u64) -> Self {
		self.min_processing_ms = min;
		self.max_processing_ms = max;
		self
	}

	/// Sets the API configuration.
	pub fn api(mut self, api: Option<ApiConfig>) -> Self {
		self.api = api;
		self
	}

	/// Builds the `Config`. No validation is applied, so tests can build
	/// deliberately broken configurations.
	pub fn build(self) -> Config {
		Config {
			service: ServiceConfig {
				id: self.service_id,
			},
			storage: StorageConfig {
				primary: self.storage_primary,
				implementations: self.storage_implementations,
			},
			pipeline: PipelineConfig {
				workers: self.workers,
				min_processing_ms: self.min_processing_ms,
				max_processing_ms: self.max_processing_ms,
			},
			api: self.api,
		}
	}
}
