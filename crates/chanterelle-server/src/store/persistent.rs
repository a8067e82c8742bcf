//! File-backed persistence for the ledger.

use super::Ledger;
use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info, instrument};

/// On-disk format version.
const DATA_VERSION: u32 = 1;

#[derive(Serialize)]
struct DataFileRef<'a> {
    version: u32,
    ledger: &'a Ledger,
}

#[derive(Deserialize)]
struct DataFile {
    version: u32,
    ledger: Ledger,
}

/// JSON file store.
pub struct FileStore {
    storage_path: PathBuf,
}

impl FileStore {
    pub fn new(storage_path: PathBuf) -> Self {
        Self { storage_path }
    }

    /// Save the ledger, replacing the file atomically.
    #[instrument(skip(self, ledger), fields(path = ?self.storage_path))]
    pub async fn save(&self, ledger: &Ledger) -> Result<(), ApiError> {
        let data = serde_json::to_vec_pretty(&DataFileRef {
            version: DATA_VERSION,
            ledger,
        })?;

        // Ensure parent directory exists
        if let Some(parent) = self.storage_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        // Write atomically using temp file + rename
        let temp_path = self.storage_path.with_extension("tmp");
        fs::write(&temp_path, &data).await?;
        fs::rename(&temp_path, &self.storage_path).await?;

        debug!(bytes = data.len(), "Saved ledger");
        Ok(())
    }

    /// Load the ledger.
    ///
    /// Returns an empty ledger if the file doesn't exist.
    #[instrument(skip(self), fields(path = ?self.storage_path))]
    pub async fn load(&self) -> Result<Ledger, ApiError> {
        if !fs::try_exists(&self.storage_path).await? {
            info!("Data file not found, starting with empty ledger");
            return Ok(Ledger::new());
        }

        let data = fs::read(&self.storage_path).await?;
        let file: DataFile = serde_json::from_slice(&data)?;

        if file.version != DATA_VERSION {
            return Err(ApiError::Storage(format!(
                "Unsupported data file version {} (expected {})",
                file.version, DATA_VERSION
            )));
        }

        info!(
            contacts = file.ledger.contact_count(),
            pending = file.ledger.pending_count(),
            "Loaded ledger"
        );
        Ok(file.ledger)
    }

    /// Check if the data file exists.
    pub fn exists(&self) -> bool {
        self.storage_path.exists()
    }
}

/// In-memory store for tests or when persistence is disabled.
pub struct MemoryStore;

impl MemoryStore {
    /// "Save" does nothing for memory store.
    pub async fn save(&self, _ledger: &Ledger) -> Result<(), ApiError> {
        debug!("Memory store: save is a no-op");
        Ok(())
    }

    /// "Load" returns an empty ledger.
    pub async fn load(&self) -> Result<Ledger, ApiError> {
        debug!("Memory store: returning empty ledger");
        Ok(Ledger::new())
    }
}

/// Storage backend with or without persistence.
pub enum Store {
    /// JSON file storage
    File(FileStore),
    /// In-memory only (no persistence)
    Memory(MemoryStore),
}

impl Store {
    /// File-backed store at `storage_path`.
    pub fn file(storage_path: PathBuf) -> Self {
        Store::File(FileStore::new(storage_path))
    }

    /// Force memory store.
    pub fn memory() -> Self {
        Store::Memory(MemoryStore)
    }

    /// Save the ledger.
    pub async fn save(&self, ledger: &Ledger) -> Result<(), ApiError> {
        match self {
            Store::File(s) => s.save(ledger).await,
            Store::Memory(s) => s.save(ledger).await,
        }
    }

    /// Load the ledger.
    pub async fn load(&self) -> Result<Ledger, ApiError> {
        match self {
            Store::File(s) => s.load().await,
            Store::Memory(s) => s.load().await,
        }
    }

    pub fn is_persistent(&self) -> bool {
        matches!(self, Store::File(_))
    }
}
