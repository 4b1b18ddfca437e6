//! Secure credential storage
//!
//! [`SecureStore`] is the seam through which session credentials reach the
//! platform's secure storage. [`FileStore`] keeps one versioned, checksummed
//! JSON file per key and replaces files atomically; [`MemoryStore`] is used
//! for ephemeral sessions and tests.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Storage error types
#[derive(Debug, Error)]
pub enum StorageError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Corruption detected
    #[error("Corruption detected: {0}")]
    Corruption(String),

    /// Version mismatch
    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Expected version
        expected: u32,
        /// Found version
        found: u32,
    },

    /// Key contains characters that cannot be used as a file name
    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Key/value storage for secrets
///
/// Implementations must be safe to share between tasks. Values are opaque
/// strings; callers serialize their own records.
#[async_trait]
pub trait SecureStore: Send + Sync {
    /// Read the value stored under `key`, if any
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}

// =============================================================================
// In-memory store
// =============================================================================

/// Process-local store; contents are lost when dropped
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl SecureStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

// =============================================================================
// File-backed store
// =============================================================================

/// On-disk envelope for a single value
#[derive(Debug, Clone, Serialize, Deserialize)]
struct VersionedEntry {
    /// Schema version
    version: u32,
    /// md5 of `value`
    checksum: String,
    /// The stored value
    value: String,
}

impl VersionedEntry {
    fn new(version: u32, value: &str) -> Self {
        Self {
            version,
            checksum: checksum(value),
            value: value.to_string(),
        }
    }

    fn verify_checksum(&self) -> Result<()> {
        let computed = checksum(&self.value);

        if computed != self.checksum {
            return Err(StorageError::Corruption(format!(
                "Checksum mismatch: expected {}, got {}",
                self.checksum, computed
            )));
        }

        Ok(())
    }
}

fn checksum(value: &str) -> String {
    format!("{:x}", md5::compute(value.as_bytes()))
}

/// File store configuration
#[derive(Debug, Clone)]
pub struct FileStoreConfig {
    /// Directory holding one file per key
    pub dir: PathBuf,
    /// Current schema version
    pub version: u32,
    /// Write through a temp file and rename
    pub atomic_writes: bool,
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("secure-store"),
            version: 1,
            atomic_writes: true,
        }
    }
}

impl FileStoreConfig {
    /// Create a new configuration rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), ..Default::default() }
    }

    /// Set schema version
    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Enable or disable atomic writes
    pub fn atomic_writes(mut self, enabled: bool) -> Self {
        self.atomic_writes = enabled;
        self
    }
}

/// File-backed [`SecureStore`]
///
/// Each key maps to `<dir>/<key>.json`. Files are created owner-only on Unix.
#[derive(Debug)]
pub struct FileStore {
    config: FileStoreConfig,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Create a store; the directory is created on first write
    pub fn new(config: FileStoreConfig) -> Self {
        Self { config, write_lock: Mutex::new(()) }
    }

    /// Get the store configuration
    pub fn config(&self) -> &FileStoreConfig {
        &self.config
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !key.starts_with('.');

        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }

        Ok(self.config.dir.join(format!("{}.json", key)))
    }

    async fn write_entry(&self, path: &Path, contents: &str) -> Result<()> {
        fs::create_dir_all(&self.config.dir).await?;

        if !self.config.atomic_writes {
            let mut file = create_private(path).await?;
            file.write_all(contents.as_bytes()).await?;
            file.sync_all().await?;
            return Ok(());
        }

        let temp_path = path.with_extension("tmp");

        let mut file = create_private(&temp_path).await?;
        file.write_all(contents.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, path).await?;

        Ok(())
    }
}

/// Open `path` for writing, created owner-only
async fn create_private(path: &Path) -> Result<fs::File> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let file = options.open(path).await?;
    // A pre-existing file keeps its old mode
    restrict_permissions(path).await?;
    Ok(file)
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[async_trait]
impl SecureStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.entry_path(key)?;

        let contents = match fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let entry: VersionedEntry = serde_json::from_str(&contents)?;
        entry.verify_checksum()?;

        if entry.version != self.config.version {
            return Err(StorageError::VersionMismatch {
                expected: self.config.version,
                found: entry.version,
            });
        }

        Ok(Some(entry.value))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.entry_path(key)?;
        let entry = VersionedEntry::new(self.config.version, value);
        let json = serde_json::to_string_pretty(&entry)?;

        let _guard = self.write_lock.lock().await;
        self.write_entry(&path, &json).await?;

        tracing::debug!(key, "stored secure entry");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.entry_path(key)?;

        let _guard = self.write_lock.lock().await;
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(key, "removed secure entry");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
