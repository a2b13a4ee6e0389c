//! Storage module for the vendor panel system.
//!
//! This module provides abstractions for persistent storage of panel data,
//! supporting different backend implementations such as in-memory or
//! file-based storage. The high-level [`StorageService`] adds typed
//! operations, create-if-absent semantics for unique keys and a per-key
//! lock table used to serialize read-modify-write sequences.

use async_trait::async_trait;
use dashmap::DashMap;
use panel_types::{ConfigSchema, ImplementationRegistry};
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// Error that occurs when a requested item is not found.
	#[error("Not found")]
	NotFound,
	/// Error that occurs when creating a key that is already present.
	#[error("Already exists")]
	AlreadyExists,
	/// Error that occurs during serialization/deserialization.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Error that occurs in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
	/// Error that occurs when an operation exceeds its time limit.
	#[error("Timeout: {0}")]
	Timeout(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the low-level interface for storage backends.
///
/// This trait must be implemented by any storage backend that wants to
/// integrate with the panel system. It provides basic key-value operations
/// plus prefix listing, which powers vendor-scoped queries.
#[async_trait]
pub trait StorageInterface: Send + Sync {
	/// Retrieves raw bytes for the given key.
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;

	/// Stores raw bytes, creating or overwriting the key.
	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

	/// Stores raw bytes only if the key does not exist yet.
	///
	/// Fails with [`StorageError::AlreadyExists`] when the key is present.
	/// This is the uniqueness constraint used by the order-number index.
	async fn create_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

	/// Deletes the value associated with the given key.
	async fn delete(&self, key: &str) -> Result<(), StorageError>;

	/// Checks if a key exists in storage.
	async fn exists(&self, key: &str) -> Result<bool, StorageError>;

	/// Returns every value stored under a key prefix.
	///
	/// Ordering is unspecified; callers sort as needed.
	async fn list_bytes(&self, prefix: &str) -> Result<Vec<Vec<u8>>, StorageError>;

	/// Returns the configuration schema for validation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

/// Type alias for storage factory functions.
///
/// This is the function signature that all storage implementations must
/// provide to create instances of their storage interface.
pub type StorageFactory = fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>;

/// Registry trait for storage implementations.
pub trait StorageRegistry: ImplementationRegistry<Factory = StorageFactory> {}

/// Get all registered storage implementations.
///
/// Returns a vector of (name, factory) tuples for all available storage
/// implementations, used by the builder to populate its factory map.
pub fn get_all_implementations() -> Vec<(&'static str, StorageFactory)> {
	use implementations::{file, memory};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// High-level storage service that provides typed operations.
///
/// The StorageService wraps a low-level storage backend and provides
/// convenient methods for storing and retrieving typed data with automatic
/// JSON serialization. Keys are formed as `namespace:id`. It also owns the
/// per-key lock table that callers use to serialize load-modify-persist
/// sequences on a single record.
pub struct StorageService {
	/// The underlying storage backend implementation.
	backend: Box<dyn StorageInterface>,
	/// Per-key async locks, created on first use.
	locks: DashMap<String, Arc<Mutex<()>>>,
	/// Optional per-operation time limit.
	operation_timeout: Option<Duration>,
}

impl StorageService {
	/// Creates a new StorageService with the specified backend.
	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		Self {
			backend,
			locks: DashMap::new(),
			operation_timeout: None,
		}
	}

	/// Applies a time limit to every storage operation.
	///
	/// Operations that exceed the limit fail with [`StorageError::Timeout`],
	/// which the API boundary maps to a retryable unavailability response.
	pub fn with_operation_timeout(mut self, limit: Duration) -> Self {
		self.operation_timeout = Some(limit);
		self
	}

	async fn run<T>(
		&self,
		fut: impl Future<Output = Result<T, StorageError>>,
	) -> Result<T, StorageError> {
		match self.operation_timeout {
			Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
				StorageError::Timeout(format!("operation exceeded {}ms", limit.as_millis()))
			})?,
			None => fut.await,
		}
	}

	/// Acquires the async lock guarding `namespace:id`.
	///
	/// The lock is advisory; every writer of a record must acquire it before
	/// loading the record and hold it until the write has been persisted.
	pub async fn lock(&self, namespace: &str, id: &str) -> OwnedMutexGuard<()> {
		let key = format!("{}:{}", namespace, id);
		let lock = {
			let entry = self
				.locks
				.entry(key)
				.or_insert_with(|| Arc::new(Mutex::new(())));
			Arc::clone(entry.value())
		};
		lock.lock_owned().await
	}

	/// Stores a serializable value, creating or overwriting the key.
	pub async fn store<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let key = format!("{}:{}", namespace, id);
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.run(self.backend.set_bytes(&key, bytes)).await
	}

	/// Stores a serializable value only if the key is absent.
	///
	/// Fails with [`StorageError::AlreadyExists`] when the key is taken.
	pub async fn create<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let key = format!("{}:{}", namespace, id);
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.run(self.backend.create_bytes(&key, bytes)).await
	}

	/// Retrieves and deserializes a value from storage.
	pub async fn retrieve<T: DeserializeOwned>(
		&self,
		namespace: &str,
		id: &str,
	) -> Result<T, StorageError> {
		let key = format!("{}:{}", namespace, id);
		let bytes = self.run(self.backend.get_bytes(&key)).await?;
		serde_json::from_slice(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	/// Retrieves and deserializes every value whose id starts with `prefix`.
	pub async fn retrieve_prefix<T: DeserializeOwned>(
		&self,
		namespace: &str,
		prefix: &str,
	) -> Result<Vec<T>, StorageError> {
		let key_prefix = format!("{}:{}", namespace, prefix);
		let values = self.run(self.backend.list_bytes(&key_prefix)).await?;
		values
			.iter()
			.map(|bytes| {
				serde_json::from_slice(bytes)
					.map_err(|e| StorageError::Serialization(e.to_string()))
			})
			.collect()
	}

	/// Updates an existing value in storage.
	///
	/// This method first checks if the key exists, then updates the value.
	/// Returns an error if the key doesn't exist, making it semantically
	/// different from store() which will create or overwrite.
	pub async fn update<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let key = format!("{}:{}", namespace, id);

		if !self.run(self.backend.exists(&key)).await? {
			return Err(StorageError::NotFound);
		}

		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.run(self.backend.set_bytes(&key, bytes)).await
	}

	/// Removes a value from storage.
	pub async fn remove(&self, namespace: &str, id: &str) -> Result<(), StorageError> {
		let key = format!("{}:{}", namespace, id);
		self.run(self.backend.delete(&key)).await
	}

	/// Checks if a value exists in storage.
	pub async fn exists(&self, namespace: &str, id: &str) -> Result<bool, StorageError> {
		let key = format!("{}:{}", namespace, id);
		self.run(self.backend.exists(&key)).await
	}
}
