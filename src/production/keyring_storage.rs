//! OS keyring implementation of secure storage.
//!
//! Each credential lives in its own keyring entry under the application's
//! service name, so per-key atomicity comes from the platform. Keyrings
//! cannot enumerate a service, so an index entry tracks the stored keys for
//! `clear`. The index is updated before the credential entry is written,
//! which keeps every persisted entry reachable by `clear`.
//!
//! Dispatches to:
//!   - macOS / iOS: Security.framework Keychain
//!   - Windows: Credential Manager
//!   - Linux: Secret Service, cached in the kernel keyring

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use keyring::Entry;

use crate::security::SecurityLevel;
use crate::traits::{SecureStorage, StorageError, StoredItem};

const INDEX_KEY: &str = "__keyguard_index__";

/// Raw named secrets within one service
trait EntryVault: Send + Sync {
    fn get(&self, name: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, name: &str, secret: &str) -> Result<(), StorageError>;
    /// Returns false when there was nothing to delete
    fn remove(&self, name: &str) -> Result<bool, StorageError>;
}

struct KeyringVault {
    service: String,
}

impl KeyringVault {
    fn entry(&self, name: &str) -> Result<Entry, StorageError> {
        Entry::new(&self.service, name).map_err(map_keyring_error)
    }
}

impl EntryVault for KeyringVault {
    fn get(&self, name: &str) -> Result<Option<String>, StorageError> {
        match self.entry(name)?.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(map_keyring_error(e)),
        }
    }

    fn set(&self, name: &str, secret: &str) -> Result<(), StorageError> {
        self.entry(name)?.set_password(secret).map_err(map_keyring_error)
    }

    fn remove(&self, name: &str) -> Result<bool, StorageError> {
        match self.entry(name)?.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(e) => Err(map_keyring_error(e)),
        }
    }
}

/// Per-key entries plus the key index, over any vault
struct IndexedEntries<V> {
    vault: V,
    index_lock: Mutex<()>,
}

impl<V: EntryVault> IndexedEntries<V> {
    fn new(vault: V) -> Self {
        Self {
            vault,
            index_lock: Mutex::new(()),
        }
    }

    fn read_index(&self) -> Result<BTreeSet<String>, StorageError> {
        match self.vault.get(INDEX_KEY)? {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| StorageError::Corrupt(format!("key index: {}", e))),
            None => Ok(BTreeSet::new()),
        }
    }

    fn write_index(&self, index: &BTreeSet<String>) -> Result<(), StorageError> {
        if index.is_empty() {
            self.vault.remove(INDEX_KEY)?;
            return Ok(());
        }
        let json = serde_json::to_string(index)
            .map_err(|e| StorageError::Corrupt(format!("key index: {}", e)))?;
        self.vault.set(INDEX_KEY, &json)
    }

    fn write(&self, key: &str, item: &StoredItem) -> Result<(), StorageError> {
        if key == INDEX_KEY {
            return Err(StorageError::InvalidKey(format!("'{}' is reserved", key)));
        }
        let json = item.to_json()?;
        let _guard = self.index_lock.lock().unwrap();

        let mut index = self.read_index()?;
        if index.insert(key.to_string()) {
            self.write_index(&index)?;
        }
        // A stale index name is harmless: `clear` skips names with no entry
        self.vault.set(key, &json)
    }

    fn read(&self, key: &str) -> Result<Option<StoredItem>, StorageError> {
        if key == INDEX_KEY {
            return Ok(None);
        }
        match self.vault.get(key)? {
            Some(json) => StoredItem::from_json(&json).map(Some),
            None => Ok(None),
        }
    }

    fn delete(&self, key: &str) -> Result<Option<StoredItem>, StorageError> {
        if key == INDEX_KEY {
            return Ok(None);
        }
        let _guard = self.index_lock.lock().unwrap();
        let existing = self.read(key)?;
        self.vault.remove(key)?;

        let mut index = self.read_index()?;
        if index.remove(key) {
            self.write_index(&index)?;
        }
        Ok(existing)
    }

    fn clear(&self) -> Result<usize, StorageError> {
        let _guard = self.index_lock.lock().unwrap();
        let index = match self.read_index() {
            Ok(index) => index,
            Err(StorageError::Corrupt(reason)) => {
                tracing::warn!(reason = %reason, "Discarding unreadable key index");
                BTreeSet::new()
            }
            Err(e) => return Err(e),
        };

        let mut removed = 0;
        for key in &index {
            if self.vault.remove(key)? {
                removed += 1;
            } else {
                tracing::debug!(key = %key, "Indexed key already gone from keyring");
            }
        }
        self.vault.remove(INDEX_KEY)?;
        Ok(removed)
    }
}

pub struct KeyringStorage {
    service: String,
    inner: Arc<IndexedEntries<KeyringVault>>,
}

impl KeyringStorage {
    pub fn new(service: &str) -> Self {
        Self {
            service: service.to_string(),
            inner: Arc::new(IndexedEntries::new(KeyringVault {
                service: service.to_string(),
            })),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Keyring calls may block on an OS unlock prompt; keep them off the runtime.
    async fn blocking<T, F>(&self, op: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&IndexedEntries<KeyringVault>) -> Result<T, StorageError> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || op(&inner))
            .await
            .map_err(|e| StorageError::Unavailable(format!("keyring task failed: {}", e)))?
    }
}

fn map_keyring_error(err: keyring::Error) -> StorageError {
    match err {
        keyring::Error::TooLong(attribute, max) => StorageError::TooLong {
            attribute,
            max: max as usize,
        },
        keyring::Error::Invalid(attribute, reason) => {
            StorageError::InvalidKey(format!("{}: {}", attribute, reason))
        }
        keyring::Error::BadEncoding(_) => {
            StorageError::Corrupt("stored value is not valid UTF-8".into())
        }
        keyring::Error::NoStorageAccess(e) | keyring::Error::PlatformFailure(e) => {
            StorageError::Unavailable(e.to_string())
        }
        other => StorageError::Unavailable(other.to_string()),
    }
}

#[async_trait::async_trait]
impl SecureStorage for KeyringStorage {
    async fn write(&self, key: &str, item: StoredItem) -> Result<(), StorageError> {
        let key = key.to_string();
        self.blocking(move |inner| inner.write(&key, &item)).await?;
        tracing::debug!("Wrote keyring entry");
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Option<StoredItem>, StorageError> {
        let key = key.to_string();
        self.blocking(move |inner| inner.read(&key)).await
    }

    async fn delete(&self, key: &str) -> Result<Option<StoredItem>, StorageError> {
        let key = key.to_string();
        self.blocking(move |inner| inner.delete(&key)).await
    }

    async fn clear(&self) -> Result<usize, StorageError> {
        let removed = self.blocking(|inner| inner.clear()).await?;
        tracing::info!(service = %self.service, count = removed, "Cleared keyring namespace");
        Ok(removed)
    }

    async fn security_level(&self) -> Result<SecurityLevel, StorageError> {
        if cfg!(any(target_os = "macos", target_os = "ios")) {
            Err(StorageError::Unsupported(
                "the Keychain does not report a security level".into(),
            ))
        } else {
            Ok(SecurityLevel::SecureSoftware)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::AccessControlPolicy;
    use std::collections::HashMap;

    // ============================================================================
    // In-memory vault
    // ============================================================================

    #[derive(Default)]
    struct MemoryVault {
        entries: Mutex<HashMap<String, String>>,
        failing_set: Mutex<Option<String>>,
    }

    impl MemoryVault {
        fn fail_set_for(&self, name: &str) {
            *self.failing_set.lock().unwrap() = Some(name.to_string());
        }

        fn raw(&self, name: &str) -> Option<String> {
            self.entries.lock().unwrap().get(name).cloned()
        }

        fn put_raw(&self, name: &str, secret: &str) {
            self.entries
                .lock()
                .unwrap()
                .insert(name.to_string(), secret.to_string());
        }
    }

    impl EntryVault for MemoryVault {
        fn get(&self, name: &str) -> Result<Option<String>, StorageError> {
            Ok(self.raw(name))
        }

        fn set(&self, name: &str, secret: &str) -> Result<(), StorageError> {
            if self.failing_set.lock().unwrap().as_deref() == Some(name) {
                return Err(StorageError::Unavailable("platform failure".into()));
            }
            self.put_raw(name, secret);
            Ok(())
        }

        fn remove(&self, name: &str) -> Result<bool, StorageError> {
            Ok(self.entries.lock().unwrap().remove(name).is_some())
        }
    }

    fn entries() -> IndexedEntries<MemoryVault> {
        IndexedEntries::new(MemoryVault::default())
    }

    fn item(value: &str) -> StoredItem {
        StoredItem::new(value, AccessControlPolicy::None)
    }

    fn index_of(entries: &IndexedEntries<MemoryVault>) -> Vec<String> {
        entries.read_index().unwrap().into_iter().collect()
    }

    // ============================================================================
    // Index bookkeeping
    // ============================================================================

    #[test]
    fn test_write_and_delete_keep_index_in_step() {
        let entries = entries();
        entries.write("a", &item("1")).unwrap();
        entries.write("b", &item("2")).unwrap();
        entries.write("a", &item("3")).unwrap();
        assert_eq!(index_of(&entries), vec!["a", "b"]);
        assert_eq!(entries.read("a").unwrap().unwrap().value, "3");

        assert_eq!(entries.delete("a").unwrap().unwrap().value, "3");
        assert_eq!(index_of(&entries), vec!["b"]);
        assert!(entries.delete("a").unwrap().is_none());

        entries.delete("b").unwrap();
        assert!(entries.vault.raw(INDEX_KEY).is_none());
    }

    #[test]
    fn test_clear_removes_every_indexed_entry() {
        let entries = entries();
        entries.write("a", &item("1")).unwrap();
        entries.write("b", &item("2")).unwrap();

        assert_eq!(entries.clear().unwrap(), 2);
        assert!(entries.read("a").unwrap().is_none());
        assert!(entries.read("b").unwrap().is_none());
        assert!(entries.vault.raw(INDEX_KEY).is_none());
        assert_eq!(entries.clear().unwrap(), 0);
    }

    #[test]
    fn test_corrupt_index_blocks_write_before_entry_lands() {
        let entries = entries();
        entries.vault.put_raw(INDEX_KEY, "{ not json");

        let result = entries.write("k", &item("v"));
        assert!(matches!(result, Err(StorageError::Corrupt(_))));
        assert!(entries.vault.raw("k").is_none());
    }

    #[test]
    fn test_failed_entry_write_stays_reachable_by_clear() {
        let entries = entries();
        entries.vault.fail_set_for("k");

        assert!(entries.write("k", &item("v")).is_err());
        assert_eq!(index_of(&entries), vec!["k"]);

        assert_eq!(entries.clear().unwrap(), 0);
        assert!(entries.vault.raw(INDEX_KEY).is_none());
    }

    #[test]
    fn test_clear_recovers_from_corrupt_index() {
        let entries = entries();
        entries.vault.put_raw(INDEX_KEY, "{ not json");

        assert_eq!(entries.clear().unwrap(), 0);
        assert!(entries.vault.raw(INDEX_KEY).is_none());

        entries.write("k", &item("v")).unwrap();
        assert_eq!(index_of(&entries), vec!["k"]);
    }

    // ============================================================================
    // Keyring error mapping
    // ============================================================================

    #[test]
    fn test_too_long_maps_to_length_failure() {
        let err = map_keyring_error(keyring::Error::TooLong("user".into(), 255));
        assert_eq!(
            err,
            StorageError::TooLong {
                attribute: "user".into(),
                max: 255
            }
        );
    }

    #[test]
    fn test_invalid_attribute_maps_to_invalid_key() {
        let err = map_keyring_error(keyring::Error::Invalid("user".into(), "empty".into()));
        assert!(matches!(err, StorageError::InvalidKey(msg) if msg.contains("empty")));
    }

    #[test]
    fn test_bad_encoding_maps_to_corrupt() {
        let err = map_keyring_error(keyring::Error::BadEncoding(vec![0xff]));
        assert!(matches!(err, StorageError::Corrupt(_)));
    }

    #[tokio::test]
    async fn test_index_key_is_reserved() {
        let storage = KeyringStorage::new("com.keyguard.test");
        let result = storage.write(INDEX_KEY, item("v")).await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
        assert!(storage.read(INDEX_KEY).await.unwrap().is_none());
    }
}
