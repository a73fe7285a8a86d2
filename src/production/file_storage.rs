//! File-based secure storage for development builds
//!
//! Avoids OS keyring prompts during development. The binary changes every
//! compile in dev mode, so some keyrings re-prompt on every access.
//! This stores sealed items in a plain JSON file instead.
//!
//! WARNING: Not secure. Values are written in clear text; reports
//! `SecurityLevel::Any`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::security::SecurityLevel;
use crate::traits::{SecureStorage, StorageError, StoredItem};

pub struct FileStorage {
    inner: Arc<FileInner>,
}

struct FileInner {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: PathBuf) -> Self {
        Self {
            inner: Arc::new(FileInner {
                path,
                lock: Mutex::new(()),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// File I/O blocks; keep it off the runtime like the keyring backend.
    async fn blocking<T, F>(&self, op: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&FileInner) -> Result<T, StorageError> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let _guard = inner.lock.lock().unwrap();
            op(&inner)
        })
        .await
        .map_err(|e| StorageError::Unavailable(format!("file task failed: {}", e)))?
    }
}

impl FileInner {
    fn load(&self) -> Result<BTreeMap<String, StoredItem>, StorageError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content)
            .map_err(|e| StorageError::Corrupt(format!("{}: {}", self.path.display(), e)))
    }

    fn flush(&self, items: &BTreeMap<String, StoredItem>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        }
        let content = serde_json::to_string_pretty(items)
            .map_err(|e| StorageError::Corrupt(e.to_string()))?;

        // Write-then-rename so a crash never leaves a half-written file
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content).map_err(|e| StorageError::Unavailable(e.to_string()))?;
        restrict_permissions(&tmp)?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(())
    }

    /// Removes the file even when its contents no longer parse
    fn clear(&self) -> Result<usize, StorageError> {
        let count = match self.load() {
            Ok(items) => items.len(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Discarding unreadable credentials file");
                0
            }
        };
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(count),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(count),
            Err(e) => Err(StorageError::Unavailable(e.to_string())),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<(), StorageError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| StorageError::Unavailable(e.to_string()))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<(), StorageError> {
    Ok(())
}

#[async_trait::async_trait]
impl SecureStorage for FileStorage {
    async fn write(&self, key: &str, item: StoredItem) -> Result<(), StorageError> {
        let key = key.to_string();
        self.blocking(move |inner| {
            let mut items = inner.load()?;
            items.insert(key, item);
            inner.flush(&items)
        })
        .await
    }

    async fn read(&self, key: &str) -> Result<Option<StoredItem>, StorageError> {
        let key = key.to_string();
        self.blocking(move |inner| Ok(inner.load()?.remove(&key))).await
    }

    async fn delete(&self, key: &str) -> Result<Option<StoredItem>, StorageError> {
        let key = key.to_string();
        self.blocking(move |inner| {
            let mut items = inner.load()?;
            let removed = items.remove(&key);
            if removed.is_some() {
                inner.flush(&items)?;
            }
            Ok(removed)
        })
        .await
    }

    async fn clear(&self) -> Result<usize, StorageError> {
        self.blocking(|inner| inner.clear()).await
    }

    async fn security_level(&self) -> Result<SecurityLevel, StorageError> {
        Ok(SecurityLevel::Any)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::AccessControlPolicy;
    use tempfile::TempDir;

    fn storage(dir: &TempDir) -> FileStorage {
        FileStorage::new(dir.path().join("nested").join("credentials.json"))
    }

    #[tokio::test]
    async fn test_write_read_delete() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);

        storage
            .write("k", StoredItem::new("v", AccessControlPolicy::DevicePasscode))
            .await
            .unwrap();
        assert!(storage.path().exists());

        let item = storage.read("k").await.unwrap().unwrap();
        assert_eq!(item.value, "v");
        assert_eq!(item.policy, AccessControlPolicy::DevicePasscode);

        assert!(storage.delete("k").await.unwrap().is_some());
        assert!(storage.read("k").await.unwrap().is_none());
        assert!(storage.delete("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        storage(&dir)
            .write("k", StoredItem::new("v", AccessControlPolicy::None))
            .await
            .unwrap();

        let reopened = storage(&dir);
        assert_eq!(reopened.read("k").await.unwrap().unwrap().value, "v");
    }

    #[tokio::test]
    async fn test_clear_removes_file() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        storage
            .write("a", StoredItem::new("1", AccessControlPolicy::None))
            .await
            .unwrap();
        storage
            .write("b", StoredItem::new("2", AccessControlPolicy::None))
            .await
            .unwrap();

        assert_eq!(storage.clear().await.unwrap(), 2);
        assert!(!storage.path().exists());
        assert_eq!(storage.clear().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "{ not json").unwrap();
        let storage = FileStorage::new(path);

        let result = storage.read("k").await;
        assert!(matches!(result, Err(StorageError::Corrupt(_))));
    }

    #[tokio::test]
    async fn test_clear_discards_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "{ not json").unwrap();
        let storage = FileStorage::new(path);

        assert_eq!(storage.clear().await.unwrap(), 0);
        assert!(!storage.path().exists());
        assert!(storage.read("k").await.unwrap().is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        storage
            .write("k", StoredItem::new("v", AccessControlPolicy::None))
            .await
            .unwrap();

        let mode = std::fs::metadata(storage.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_reports_no_protection() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            storage(&dir).security_level().await.unwrap(),
            SecurityLevel::Any
        );
    }
}
