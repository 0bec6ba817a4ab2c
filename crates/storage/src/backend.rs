use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use recall_core::model::{StatsHistory, StoreData};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Persistence boundary for the application store and the stats history.
///
/// The two documents are independent keys in the underlying key-value
/// storage; loading either when nothing was ever saved yields defaults
/// rather than an error, so first runs need no special casing.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Load the full store document, or defaults if absent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the document exists but cannot be read or
    /// parsed.
    async fn load_store(&self) -> Result<StoreData, StorageError>;

    /// Replace the full store document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the document cannot be written.
    async fn save_store(&self, store: &StoreData) -> Result<(), StorageError>;

    /// Load the stats history document, or defaults if absent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the document exists but cannot be read or
    /// parsed.
    async fn load_stats(&self) -> Result<StatsHistory, StorageError>;

    /// Replace the stats history document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the document cannot be written.
    async fn save_stats(&self, stats: &StatsHistory) -> Result<(), StorageError>;
}

/// In-memory backend for tests and prototyping.
///
/// Counts physical store writes so debounce behavior can be asserted.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    store: Arc<Mutex<StoreData>>,
    stats: Arc<Mutex<StatsHistory>>,
    store_writes: Arc<AtomicUsize>,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times `save_store` has been called.
    #[must_use]
    pub fn store_writes(&self) -> usize {
        self.store_writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StoreBackend for InMemoryBackend {
    async fn load_store(&self) -> Result<StoreData, StorageError> {
        let guard = self
            .store
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn save_store(&self, store: &StoreData) -> Result<(), StorageError> {
        let mut guard = self
            .store
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        *guard = store.clone();
        self.store_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load_stats(&self) -> Result<StatsHistory, StorageError> {
        let guard = self
            .stats
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn save_stats(&self, stats: &StatsHistory) -> Result<(), StorageError> {
        let mut guard = self
            .stats
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        *guard = stats.clone();
        Ok(())
    }
}
