//! Builder pattern for constructing order services.
//!
//! Composes an [`OrderService`] from configuration: the primary storage
//! backend is created through its factory, wrapped in the order repository,
//! and handed to a pipeline sized by the `[pipeline]` section.

use crate::delay::{ProcessingDelay, RandomDelay};
use crate::engine::OrderPipeline;
use crate::service::OrderService;
use order_config::Config;
use order_storage::{OrderRepository, OrderStore, StorageError, StorageInterface, StorageService};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during service construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Builder for constructing an [`OrderService`] with pluggable storage.
pub struct OrderServiceBuilder {
	config: Config,
	delay: Option<Arc<dyn ProcessingDelay>>,
}

impl OrderServiceBuilder {
	/// Creates a new OrderServiceBuilder with the given configuration.
	pub fn new(config: Config) -> Self {
		Self {
			config,
			delay: None,
		}
	}

	/// Replaces the random work duration drawn from the pipeline bounds.
	pub fn with_delay(mut self, delay: Arc<dyn ProcessingDelay>) -> Self {
		self.delay = Some(delay);
		self
	}

	/// Builds the service from storage factories and starts its workers.
	pub async fn build<SF>(
		self,
		storage_factories: HashMap<String, SF>,
	) -> Result<OrderService, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
	{
		let primary = &self.config.storage.primary;
		let settings = self
			.config
			.storage
			.implementations
			.get(primary)
			.ok_or_else(|| {
				BuilderError::Config(format!(
					"Primary storage '{}' not found in implementations",
					primary
				))
			})?;
		let factory = storage_factories.get(primary).ok_or_else(|| {
			BuilderError::MissingComponent(format!("storage implementation '{}'", primary))
		})?;

		let backend = match factory(settings) {
			Ok(backend) => {
				tracing::info!(component = "storage", implementation = %primary, "Loaded");
				backend
			},
			Err(e) => {
				tracing::error!(
					component = "storage",
					implementation = %primary,
					error = %e,
					"Failed to create storage implementation"
				);
				return Err(BuilderError::Config(format!(
					"Failed to create storage implementation '{}': {}",
					primary, e
				)));
			},
		};

		for name in self.config.storage.implementations.keys() {
			if name != primary {
				tracing::debug!(component = "storage", implementation = %name, "Configured but not primary");
			}
		}

		let storage = Arc::new(StorageService::new(backend));
		let store: Arc<dyn OrderStore> = Arc::new(OrderRepository::new(storage));
		self.build_with_store(store).await
	}

	/// Builds the service over an existing store and starts its workers.
	pub async fn build_with_store(
		self,
		store: Arc<dyn OrderStore>,
	) -> Result<OrderService, BuilderError> {
		let pipeline_config = &self.config.pipeline;
		if pipeline_config.workers == 0 {
			return Err(BuilderError::Config(
				"Pipeline needs at least one worker".into(),
			));
		}

		let delay = self.delay.unwrap_or_else(|| {
			Arc::new(RandomDelay::from_millis(
				pipeline_config.min_processing_ms,
				pipeline_config.max_processing_ms,
			))
		});

		let pipeline = OrderPipeline::new(store.clone(), delay, pipeline_config.workers);
		let service = OrderService::new(store, pipeline);
		service
			.start()
			.await
			.map_err(|e| BuilderError::Config(e.to_string()))?;

		tracing::info!(
			service_id = %self.config.service.id,
			workers = pipeline_config.workers,
			min_processing_ms = pipeline_config.min_processing_ms,
			max_processing_ms = pipeline_config.max_processing_ms,
			"Order service ready"
		);
		Ok(service)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::delay::FixedDelay;
	use order_config::ConfigBuilder;
	use order_storage::get_all_implementations;
	use order_types::OrderStatus;
	use std::time::Duration;
	use tempfile::TempDir;

	fn factories() -> HashMap<String, order_storage::StorageFactory> {
		get_all_implementations()
			.into_iter()
			.map(|(name, factory)| (name.to_string(), factory))
			.collect()
	}

	#[tokio::test]
	async fn test_build_with_memory_storage() {
		let config = ConfigBuilder::new().workers(3).build();
		let service = OrderServiceBuilder::new(config)
			.build(factories())
			.await
			.unwrap();

		assert_eq!(service.worker_count(), 3);
		let order = service.create_order("u1", 5.0, vec![]).await.unwrap();
		assert_eq!(order.status, OrderStatus::Pending);
		service.stop().await.unwrap();
	}

	#[tokio::test]
	async fn test_build_with_file_storage() {
		let dir = TempDir::new().unwrap();
		let mut settings = toml::map::Map::new();
		settings.insert(
			"storage_path".into(),
			toml::Value::String(dir.path().to_string_lossy().into_owned()),
		);
		let config = ConfigBuilder::new()
			.storage("file", toml::Value::Table(settings))
			.build();

		let service = OrderServiceBuilder::new(config)
			.with_delay(Arc::new(FixedDelay(Duration::from_secs(60))))
			.build(factories())
			.await
			.unwrap();
		let order = service.create_order("u1", 5.0, vec![]).await.unwrap();
		service.stop().await.unwrap();

		let file = dir.path().join("orders").join(format!("{}.json", order.order_id));
		assert!(file.exists());
	}

	#[tokio::test]
	async fn test_missing_factory() {
		let config = ConfigBuilder::new().build();
		let result = OrderServiceBuilder::new(config)
			.build(HashMap::<String, order_storage::StorageFactory>::new())
			.await;
		assert!(matches!(result, Err(BuilderError::MissingComponent(_))));
	}

	#[tokio::test]
	async fn test_invalid_storage_settings() {
		let settings: toml::Value = toml::from_str("unexpected = true").unwrap();
		let config = ConfigBuilder::new().storage("memory", settings).build();
		let result = OrderServiceBuilder::new(config).build(factories()).await;
		assert!(matches!(result, Err(BuilderError::Config(_))));
	}

	#[tokio::test]
	async fn test_zero_workers_rejected() {
		let config = ConfigBuilder::new().workers(0).build();
		let result = OrderServiceBuilder::new(config).build(factories()).await;
		assert!(matches!(result, Err(BuilderError::Config(_))));
	}
}
