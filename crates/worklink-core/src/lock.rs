//! Advisory file locks guarding the work-unit document.
//!
//! Readers take a shared lock, writers an exclusive one, both on a sidecar
//! `<document>.lock` file. Acquisition polls with `try_lock_*` until the
//! configured timeout elapses.

use crate::error::ErrorCode;
use fs2::FileExt;
use std::{
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Advisory lock errors for the work-unit document.
#[derive(Debug)]
pub enum LockError {
    Timeout { path: PathBuf, waited: Duration },
    IoError(io::Error),
}

impl From<io::Error> for LockError {
    fn from(err: io::Error) -> Self {
        Self::IoError(err)
    }
}

impl LockError {
    /// Machine-readable code associated with this lock error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Timeout { .. } => ErrorCode::LockContention,
            Self::IoError(_) => ErrorCode::StoreWriteFailed,
        }
    }

    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

impl std::fmt::Display for LockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout { path, waited } => write!(
                f,
                "{}: lock timed out after {:?} at {}",
                self.code().code(),
                waited,
                path.display()
            ),
            Self::IoError(err) => write!(f, "{}: {}", self.code().code(), err),
        }
    }
}

impl std::error::Error for LockError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Timeout { .. } => None,
            Self::IoError(err) => Some(err),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Shared,
    Exclusive,
}

/// RAII advisory lock on a lock file. Released on drop.
#[derive(Debug)]
pub struct StoreLock {
    file: File,
    path: PathBuf,
    mode: LockMode,
}

impl StoreLock {
    /// Shared lock for reading the document.
    ///
    /// # Errors
    ///
    /// [`LockError::Timeout`] if a writer holds the lock past `timeout`.
    pub fn shared(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        Self::acquire(path, timeout, LockMode::Shared)
    }

    /// Exclusive lock held across a load → mutate → save cycle.
    ///
    /// # Errors
    ///
    /// [`LockError::Timeout`] if any other holder keeps the lock past `timeout`.
    pub fn exclusive(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        Self::acquire(path, timeout, LockMode::Exclusive)
    }

    fn acquire(path: &Path, timeout: Duration, mode: LockMode) -> Result<Self, LockError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let start = Instant::now();
        let mut contended = false;
        loop {
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(path)?;

            let acquired = match mode {
                LockMode::Shared => file.try_lock_shared().is_ok(),
                LockMode::Exclusive => file.try_lock_exclusive().is_ok(),
            };

            if acquired {
                return Ok(Self {
                    file,
                    path: path.to_path_buf(),
                    mode,
                });
            }

            if !contended {
                debug!(path = %path.display(), ?mode, "waiting for store lock");
                contended = true;
            }

            if start.elapsed() >= timeout {
                return Err(LockError::Timeout {
                    path: path.to_path_buf(),
                    waited: start.elapsed(),
                });
            }

            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Explicitly release the lock. Release also happens automatically on drop.
    pub fn release(self) {
        drop(self);
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn mode(&self) -> LockMode {
        self.mode
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
