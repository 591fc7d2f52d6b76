//! Whole-document persistence for the work-unit dataset.
//!
//! The core never touches the filesystem itself: every operation runs
//! against an in-memory [`WorkUnitDataset`] obtained from a [`Store`] and the
//! result is handed back to it. [`Store::transact`] wraps one
//! load → mutate → save cycle and skips the save when the mutation fails.
//!
//! Two implementations ship with the crate:
//!
//! - [`JsonFileStore`]: a pretty-printed JSON document on disk, written via
//!   temp file + rename and guarded by an advisory lock.
//! - [`MemoryStore`]: an in-process snapshot for tests and embedding.

#![allow(clippy::module_name_repetitions)]

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    time::Duration,
};

use tracing::{debug, info, instrument};

use crate::config::WorklinkConfig;
use crate::dataset::WorkUnitDataset;
use crate::error::{ErrorCode, GraphError, OperationError};
use crate::lock::{LockError, StoreLock};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("invalid work-unit document {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to serialize work-unit document: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error(transparent)]
    Lock(#[from] LockError),
}

impl StoreError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Read { .. } | Self::Parse { .. } => ErrorCode::StoreReadFailed,
            Self::Write { .. } => ErrorCode::StoreWriteFailed,
            Self::Serialize(_) => ErrorCode::InternalUnexpected,
            Self::Lock(err) => err.code(),
        }
    }
}

// ---------------------------------------------------------------------------
// Store contract
// ---------------------------------------------------------------------------

/// Loads and persists the complete dataset as one document.
pub trait Store {
    /// Load the latest snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the document cannot be read or parsed.
    fn load(&self) -> Result<WorkUnitDataset, StoreError>;

    /// Persist `dataset` as the next snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the document cannot be written.
    fn save(&mut self, dataset: &WorkUnitDataset) -> Result<(), StoreError>;

    /// Load, apply `mutate`, and save only if it succeeded.
    ///
    /// # Errors
    ///
    /// The mutation's [`GraphError`] (nothing is saved) or a [`StoreError`].
    fn transact<T, F>(&mut self, mutate: F) -> Result<T, OperationError>
    where
        Self: Sized,
        F: FnOnce(&mut WorkUnitDataset) -> Result<T, GraphError>,
    {
        let mut dataset = self.load()?;
        let value = mutate(&mut dataset)?;
        self.save(&dataset)?;
        Ok(value)
    }
}

// ---------------------------------------------------------------------------
// JsonFileStore
// ---------------------------------------------------------------------------

/// Default time to wait for the document lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(5_000);

/// JSON document on disk.
///
/// A missing file loads as an empty dataset. Saves write `<file>.tmp` and
/// rename it over the document, so readers never see a partial write.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    lock_path: PathBuf,
    lock_timeout: Duration,
}

impl JsonFileStore {
    #[must_use]
    pub fn open(path: impl Into<PathBuf>, lock_timeout: Duration) -> Self {
        let path = path.into();
        let lock_path = sibling(&path, "lock");
        Self {
            path,
            lock_path,
            lock_timeout,
        }
    }

    /// Store at the configured document path, resolved against `root`.
    #[must_use]
    pub fn from_config(root: &Path, config: &WorklinkConfig) -> Self {
        let path = if config.store.path.is_absolute() {
            config.store.path.clone()
        } else {
            root.join(&config.store.path)
        };
        Self::open(path, config.store.lock_timeout())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<WorkUnitDataset, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no document yet, starting empty");
                return Ok(WorkUnitDataset::new());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        serde_json::from_str(&raw).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn write_document(&self, dataset: &WorkUnitDataset) -> Result<(), StoreError> {
        let mut snapshot = dataset.clone();
        snapshot.mark_saved();
        let mut json = serde_json::to_string_pretty(&snapshot).map_err(StoreError::Serialize)?;
        json.push('\n');

        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let tmp = sibling(&self.path, "tmp");
        let mut file = fs::File::create(&tmp).map_err(write_err)?;
        file.write_all(json.as_bytes()).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;
        fs::rename(&tmp, &self.path).map_err(write_err)?;

        info!(path = %self.path.display(), units = snapshot.len(), "work units saved");
        Ok(())
    }
}

impl Store for JsonFileStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn load(&self) -> Result<WorkUnitDataset, StoreError> {
        let _lock = StoreLock::shared(&self.lock_path, self.lock_timeout)?;
        self.read_document()
    }

    #[instrument(skip(self, dataset), fields(path = %self.path.display()))]
    fn save(&mut self, dataset: &WorkUnitDataset) -> Result<(), StoreError> {
        let _lock = StoreLock::exclusive(&self.lock_path, self.lock_timeout)?;
        self.write_document(dataset)
    }

    /// Holds the exclusive lock across the whole cycle so concurrent
    /// processes serialize.
    fn transact<T, F>(&mut self, mutate: F) -> Result<T, OperationError>
    where
        Self: Sized,
        F: FnOnce(&mut WorkUnitDataset) -> Result<T, GraphError>,
    {
        let _lock = StoreLock::exclusive(&self.lock_path, self.lock_timeout)
            .map_err(StoreError::from)?;
        let mut dataset = self.read_document()?;
        let value = mutate(&mut dataset)?;
        self.write_document(&dataset)?;
        Ok(value)
    }
}

/// `work-units.json` → `work-units.json.<ext>`.
fn sibling(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.file_name().map(ToOwned::to_owned).unwrap_or_default();
    name.push(".");
    name.push(ext);
    path.with_file_name(name)
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-memory store. Counts saves so callers can assert a failed operation
/// never reached `save`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    dataset: WorkUnitDataset,
    saves: usize,
}

impl MemoryStore {
    #[must_use]
    pub fn new(dataset: WorkUnitDataset) -> Self {
        Self { dataset, saves: 0 }
    }

    #[must_use]
    pub const fn saves(&self) -> usize {
        self.saves
    }

    #[must_use]
    pub const fn snapshot(&self) -> &WorkUnitDataset {
        &self.dataset
    }
}

impl Store for MemoryStore {
    fn load(&self) -> Result<WorkUnitDataset, StoreError> {
        Ok(self.dataset.clone())
    }

    fn save(&mut self, dataset: &WorkUnitDataset) -> Result<(), StoreError> {
        let mut snapshot = dataset.clone();
        snapshot.mark_saved();
        self.dataset = snapshot;
        self.saves += 1;
        Ok(())
    }
}
