//! File-based storage backend implementation for the panel service.
//!
//! This module provides a filesystem implementation of the StorageInterface
//! trait. Every key is stored as one JSON document on disk, grouped into a
//! directory per table so prefix listings stay cheap.

use crate::{StorageError, StorageFactory, StorageInterface, StorageRegistry};
use async_trait::async_trait;
use panel_types::{ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError};
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// File-based storage implementation.
///
/// Keys of the form `table:rest` map to `<base>/<table>/<rest>.json`, with
/// path separators in `rest` flattened. Writes go through a temp file and a
/// rename so readers never observe partial documents.
pub struct FileStorage {
	/// Base directory path for storing files.
	base_path: PathBuf,
}

impl FileStorage {
	/// Creates a new FileStorage instance with the specified base path.
	pub fn new(base_path: PathBuf) -> Self {
		Self { base_path }
	}

	/// Splits a key into its table directory and sanitized file stem.
	fn split_key(key: &str) -> (&str, String) {
		let (table, rest) = key.split_once(':').unwrap_or(("", key));
		(table, rest.replace(['/', ':'], "_"))
	}

	/// Converts a storage key to a filesystem-safe file path.
	fn get_file_path(&self, key: &str) -> PathBuf {
		let (table, stem) = Self::split_key(key);
		self.base_path.join(table).join(format!("{}.json", stem))
	}
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
		let temp_path = path.with_extension("tmp");
		fs::write(&temp_path, value)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		fs::rename(&temp_path, &path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		Ok(())
	}

	async fn create_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let path = self.get_file_path(key);

		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)
				.await
				.map_err(|e| StorageError::Backend(e.to_string()))?;
		}

		// create_new makes the existence check and the create one atomic step
		let mut file = match fs::OpenOptions::new()
			.write(true)
			.create_new(true)
			.open(&path)
			.await
		{
			Ok(file) => file,
			Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
				return Err(StorageError::AlreadyExists)
			},
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		file.write_all(&value)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		file.flush()
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
		let path = self.get_file_path(key);
		Ok(path.exists())
	}

	async fn list_bytes(&self, prefix: &str) -> Result<Vec<Vec<u8>>, StorageError> {
		let (table, stem_prefix) = Self::split_key(prefix);
		let dir = self.base_path.join(table);

		let mut entries = match fs::read_dir(&dir).await {
			Ok(entries) => entries,
			// A table no one has written to yet is simply empty
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		let mut values = Vec::new();
		while let Some(entry) = entries
			.next_entry()
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?
		{
			let path = entry.path();
			if path.extension() != Some(std::ffi::OsStr::new("json")) {
				continue;
			}
			let matches_prefix = path
				.file_stem()
				.and_then(|stem| stem.to_str())
				.map(|stem| stem.starts_with(&stem_prefix))
				.unwrap_or(false);
			if !matches_prefix {
				continue;
			}
			match fs::read(&path).await {
				Ok(data) => values.push(data),
				Err(e) => {
					tracing::warn!("Skipping file {:?}: could not be read: {}", path, e);
				},
			}
		}
		Ok(values)
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStorageSchema)
	}
}

/// Configuration schema for FileStorage.
pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![], // No required fields
			vec![Field::new("storage_path", FieldType::String)],
		);
		schema.validate(config)
	}
}

/// Registry entry for the file storage implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}

/// Factory function to create a file storage backend from configuration.
///
/// Configuration parameters:
/// - `storage_path`: Base directory for file storage (default: "./data/storage")
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or("./data/storage")
		.to_string();

	Ok(Box::new(FileStorage::new(PathBuf::from(storage_path))))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn storage() -> (tempfile::TempDir, FileStorage) {
		let dir = tempfile::tempdir().unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf());
		(dir, storage)
	}

	#[tokio::test]
	async fn test_basic_operations() {
		let (_dir, storage) = storage();

		let key = "orders:v-1/o-1";
		let value = br#"{"id":"o-1"}"#.to_vec();
		storage.set_bytes(key, value.clone()).await.unwrap();

		assert_eq!(storage.get_bytes(key).await.unwrap(), value);
		assert!(storage.exists(key).await.unwrap());

		storage.delete(key).await.unwrap();
		assert!(!storage.exists(key).await.unwrap());
		assert!(matches!(
			storage.get_bytes(key).await,
			Err(StorageError::NotFound)
		));
	}

	#[tokio::test]
	async fn test_overwrite() {
		let (_dir, storage) = storage();

		let key = "orders:v-1/o-1";
		storage.set_bytes(key, b"one".to_vec()).await.unwrap();
		storage.set_bytes(key, b"two".to_vec()).await.unwrap();

		assert_eq!(storage.get_bytes(key).await.unwrap(), b"two".to_vec());
	}

	#[tokio::test]
	async fn test_create_is_exclusive() {
		let (_dir, storage) = storage();

		let key = "order_numbers:ORD-20240307-0001";
		storage.create_bytes(key, b"o-1".to_vec()).await.unwrap();

		let result = storage.create_bytes(key, b"o-2".to_vec()).await;
		assert!(matches!(result, Err(StorageError::AlreadyExists)));
		assert_eq!(storage.get_bytes(key).await.unwrap(), b"o-1".to_vec());
	}

	#[tokio::test]
	async fn test_list_by_prefix() {
		let (_dir, storage) = storage();

		storage
			.set_bytes("orders:v-1/a", b"1".to_vec())
			.await
			.unwrap();
		storage
			.set_bytes("orders:v-1/b", b"2".to_vec())
			.await
			.unwrap();
		storage
			.set_bytes("orders:v-2/c", b"3".to_vec())
			.await
			.unwrap();

		let mut values = storage.list_bytes("orders:v-1/").await.unwrap();
		values.sort();
		assert_eq!(values, vec![b"1".to_vec(), b"2".to_vec()]);
	}

	#[tokio::test]
	async fn test_listing_unwritten_table_is_empty() {
		let (_dir, storage) = storage();
		let values = storage.list_bytes("orders:v-1/").await.unwrap();
		assert!(values.is_empty());
	}
}
