//! # Wallet Store
//!
//! Persistence for the exported wallet blob. The blob is opaque here: it is
//! read back verbatim at startup and overwritten in full after every
//! initialization.

use chainbot_error::{Error, ErrorKind, Result};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Default file the wallet blob lives in
pub const DEFAULT_WALLET_DATA_FILE: &str = "wallet_data.txt";

/// Storage backend for the wallet blob
pub trait WalletStore: Send + Sync {
    /// Read the stored blob. `None` means nothing was stored yet.
    fn load(&self) -> Result<Option<String>>;

    /// Replace the stored blob
    fn save(&self, blob: &str) -> Result<()>;
}

/// File-backed store (truncate and write, no atomic replace)
#[derive(Debug, Clone)]
pub struct FileWalletStore {
    path: PathBuf,
}

impl FileWalletStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn storage_error(&self, op: &'static str, err: std::io::Error) -> Error {
        Error::new(
            ErrorKind::StorageFailed,
            format!("failed to {} {}: {}", op, self.path.display(), err),
        )
        .with_operation("FileWalletStore")
        .with_context("path", self.path.display().to_string())
        .set_source(err)
    }
}

impl Default for FileWalletStore {
    fn default() -> Self {
        Self::new(DEFAULT_WALLET_DATA_FILE)
    }
}

impl WalletStore for FileWalletStore {
    fn load(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                debug!(path = %self.path.display(), bytes = content.len(), "read wallet data");
                Ok(Some(content))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no wallet data file");
                Ok(None)
            }
            Err(e) => Err(self.storage_error("read", e)),
        }
    }

    fn save(&self, blob: &str) -> Result<()> {
        std::fs::write(&self.path, blob).map_err(|e| self.storage_error("write", e))?;
        debug!(path = %self.path.display(), bytes = blob.len(), "wrote wallet data");
        Ok(())
    }
}

/// In-memory store (volatile, for tests)
#[derive(Debug, Default)]
pub struct MemoryWalletStore {
    blob: Mutex<Option<String>>,
}

impl MemoryWalletStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: Mutex::new(Some(blob.into())),
        }
    }
}

impl WalletStore for MemoryWalletStore {
    fn load(&self) -> Result<Option<String>> {
        let guard = self
            .blob
            .lock()
            .map_err(|_| Error::storage_failed("wallet store lock poisoned"))?;
        Ok(guard.clone())
    }

    fn save(&self, blob: &str) -> Result<()> {
        let mut guard = self
            .blob
            .lock()
            .map_err(|_| Error::storage_failed("wallet store lock poisoned"))?;
        *guard = Some(blob.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempdir().unwrap();
        let store = FileWalletStore::new(dir.path().join("wallet_data.txt"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let store = FileWalletStore::new(dir.path().join("wallet_data.txt"));

        store.save(r#"{"wallet_id":"w1"}"#).unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some(r#"{"wallet_id":"w1"}"#));
    }

    #[test]
    fn test_save_truncates() {
        let dir = tempdir().unwrap();
        let store = FileWalletStore::new(dir.path().join("wallet_data.txt"));

        store.save("a much longer first blob").unwrap();
        store.save("short").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("short"));
    }

    #[test]
    fn test_save_of_load_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wallet_data.txt");
        std::fs::write(&path, "blob\nwith newline\n").unwrap();

        let store = FileWalletStore::new(&path);
        let first = store.load().unwrap().unwrap();
        store.save(&first).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "blob\nwith newline\n");
    }

    #[test]
    fn test_unreadable_path_is_storage_error() {
        let dir = tempdir().unwrap();
        // A directory cannot be read as a file
        let store = FileWalletStore::new(dir.path());
        let err = store.load().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StorageFailed);

        let err = store.save("x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StorageFailed);
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryWalletStore::new();
        assert_eq!(store.load().unwrap(), None);
        store.save("blob").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("blob"));

        let store = MemoryWalletStore::with_blob("seeded");
        assert_eq!(store.load().unwrap().as_deref(), Some("seeded"));
    }
}
