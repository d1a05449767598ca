//! File-based storage backend.
//!
//! Each key is stored as one JSON file. A key `"{namespace}:{id}"` maps to
//! `{storage_path}/{namespace}/{id}.json`, so listing a namespace is a single
//! directory scan. Writes go to a temporary file that is renamed over the
//! target, so a reader never sees a partially written record.

use crate::{StorageError, StorageFactory, StorageInterface, StorageRegistry};
use async_trait::async_trait;
use order_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError,
};
use std::path::PathBuf;
use tokio::fs;

const EXTENSION: &str = "json";
const DEFAULT_NAMESPACE_DIR: &str = "_";

/// File-based storage implementation.
pub struct FileStorage {
	/// Base directory path for storing files.
	base_path: PathBuf,
}

impl FileStorage {
	/// Creates a new FileStorage rooted at `base_path`.
	pub fn new(base_path: PathBuf) -> Self {
		Self { base_path }
	}

	/// Converts a storage key to its file path.
	fn get_file_path(&self, key: &str) -> PathBuf {
		let (namespace, id) = match key.split_once(':') {
			Some((namespace, id)) => (escape(namespace), escape(id)),
			None => (DEFAULT_NAMESPACE_DIR.to_string(), escape(key)),
		};
		self.base_path
			.join(namespace)
			.join(format!("{}.{}", id, EXTENSION))
	}

	/// Lists the keys stored in one namespace directory.
	async fn keys_in_namespace(&self, namespace: &str) -> Result<Vec<String>, StorageError> {
		let dir = self.base_path.join(escape(namespace));
		let mut entries = match fs::read_dir(&dir).await {
			Ok(entries) => entries,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		let mut keys = Vec::new();
		while let Some(entry) = entries
			.next_entry()
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?
		{
			let path = entry.path();
			if path.extension() != Some(std::ffi::OsStr::new(EXTENSION)) {
				continue;
			}
			match path.file_stem().and_then(|stem| stem.to_str()) {
				Some(stem) => keys.push(format!("{}:{}", namespace, unescape(stem))),
				None => tracing::debug!("Skipping non UTF-8 file name {:?}", path),
			}
		}
		Ok(keys)
	}
}

/// Makes a key component safe to use as a single path segment.
fn escape(component: &str) -> String {
	component
		.replace('%', "%25")
		.replace('/', "%2F")
		.replace('\\', "%5C")
		.replace('.', "%2E")
}

fn unescape(component: &str) -> String {
	component
		.replace("%2E", ".")
		.replace("%5C", "\\")
		.replace("%2F", "/")
		.replace("%25", "%")
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let path = self.get_file_path(key);

		match fs::read(&path).await {
			Ok(data) => Ok(data),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let path = self.get_file_path(key);

		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)
				.await
				.map_err(|e| StorageError::Backend(e.to_string()))?;
		}

		// Write atomically by writing to temp file then renaming
		let temp_path = path.with_extension("json.tmp");
		fs::write(&temp_path, value)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		fs::rename(&temp_path, &path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		let path = self.get_file_path(key);

		match fs::remove_file(&path).await {
			Ok(_) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		fs::try_exists(self.get_file_path(key))
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))
	}

	async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
		// Keys are grouped by namespace on disk; only scan the one the prefix names.
		let Some((namespace, id_prefix)) = prefix.split_once(':') else {
			return Err(StorageError::Backend(format!(
				"File storage can only list within a namespace, got prefix '{}'",
				prefix
			)));
		};

		let keys = self.keys_in_namespace(namespace).await?;
		let namespace_prefix = format!("{}:{}", namespace, id_prefix);
		Ok(keys
			.into_iter()
			.filter(|key| key.starts_with(&namespace_prefix))
			.collect())
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStorageSchema)
	}
}

/// Configuration schema for FileStorage.
pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![], vec![Field::new("storage_path", FieldType::String)]).validate(config)
	}
}

/// Factory function to create a file storage backend from configuration.
///
/// Configuration parameters:
/// - `storage_path`: Base directory for order files (default: "./data/orders")
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	FileStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;

	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or("./data/orders");

	Ok(Box::new(FileStorage::new(PathBuf::from(storage_path))))
}

/// Registry for the file storage implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}
