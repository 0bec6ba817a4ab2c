use std::path::{Path, PathBuf};

use async_trait::async_trait;
use recall_core::model::{StatsHistory, StoreData};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::backend::{StorageError, StoreBackend};

const STORE_FILE: &str = "flashcards.json";
const STATS_FILE: &str = "stats-history.json";

/// Backend that keeps each document as a JSON file in a data directory.
///
/// Writes go through a temp file followed by a rename, so a crash mid-write
/// leaves the previous document intact.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    store_path: PathBuf,
    stats_path: PathBuf,
}

impl JsonFileBackend {
    /// Creates a backend rooted at `data_dir`. The directory is created on
    /// first write, not here.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let dir = data_dir.into();
        Self {
            store_path: dir.join(STORE_FILE),
            stats_path: dir.join(STATS_FILE),
        }
    }

    #[must_use]
    pub fn store_path(&self) -> &Path {
        &self.store_path
    }
}

async fn load_document<T>(path: &Path) -> Result<T, StorageError>
where
    T: DeserializeOwned + Default,
{
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(serde_json::from_str(&text)?),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "document missing, using defaults");
            Ok(T::default())
        }
        Err(err) => Err(err.into()),
    }
}

async fn save_document<T>(path: &Path, value: &T) -> Result<(), StorageError>
where
    T: Serialize,
{
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }
    let text = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, text.as_bytes()).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl StoreBackend for JsonFileBackend {
    async fn load_store(&self) -> Result<StoreData, StorageError> {
        load_document(&self.store_path).await
    }

    async fn save_store(&self, store: &StoreData) -> Result<(), StorageError> {
        save_document(&self.store_path, store).await
    }

    async fn load_stats(&self) -> Result<StatsHistory, StorageError> {
        load_document(&self.stats_path).await
    }

    async fn save_stats(&self, stats: &StatsHistory) -> Result<(), StorageError> {
        save_document(&self.stats_path, stats).await
    }
}
