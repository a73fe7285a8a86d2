//! Secure storage substrate trait
//!
//! The platform-backed store the engine writes sealed items into. Backends
//! own per-key atomicity; the engine adds no locking of its own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::policy::AccessControlPolicy;
use crate::security::SecurityLevel;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("{attribute} exceeds the platform limit of {max}")]
    TooLong { attribute: String, max: usize },
    #[error("Invalid key: {0}")]
    InvalidKey(String),
    #[error("Secure storage unavailable: {0}")]
    Unavailable(String),
    #[error("Stored item is corrupt: {0}")]
    Corrupt(String),
    #[error("{0}")]
    Unsupported(String),
}

/// Salted SHA-256 of an application password
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordDigest {
    pub salt: Vec<u8>,
    pub hash: Vec<u8>,
}

impl std::fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordDigest(***)")
    }
}

/// Envelope persisted under a key: the value plus the policy it was sealed with
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredItem {
    pub value: String,
    pub policy: AccessControlPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<PasswordDigest>,
    pub stored_at: DateTime<Utc>,
}

impl StoredItem {
    pub fn new(value: impl Into<String>, policy: AccessControlPolicy) -> Self {
        Self {
            value: value.into(),
            policy,
            password: None,
            stored_at: Utc::now(),
        }
    }

    pub fn with_password(mut self, digest: PasswordDigest) -> Self {
        self.password = Some(digest);
        self
    }

    pub fn to_json(&self) -> Result<String, StorageError> {
        serde_json::to_string(self).map_err(|e| StorageError::Corrupt(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, StorageError> {
        serde_json::from_str(json).map_err(|e| StorageError::Corrupt(e.to_string()))
    }
}

impl std::fmt::Debug for StoredItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredItem")
            .field("value", &"***")
            .field("policy", &self.policy)
            .field("password", &self.password)
            .field("stored_at", &self.stored_at)
            .finish()
    }
}

/// Trait for the platform secure-storage namespace
///
/// Production: OS keyring via `keyring` crate, JSON file in development
/// Testing: In-memory HashMap
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SecureStorage: Send + Sync {
    /// Write or overwrite the item under `key`
    async fn write(&self, key: &str, item: StoredItem) -> Result<(), StorageError>;

    /// Read the item under `key`
    async fn read(&self, key: &str) -> Result<Option<StoredItem>, StorageError>;

    /// Delete the item under `key`, returning it if it existed
    async fn delete(&self, key: &str) -> Result<Option<StoredItem>, StorageError>;

    /// Delete every item in the namespace, returning how many were removed
    async fn clear(&self) -> Result<usize, StorageError>;

    /// Protection tier of the backing store
    async fn security_level(&self) -> Result<SecurityLevel, StorageError>;
}
