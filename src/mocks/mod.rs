//! Test doubles for dependency injection
//!
//! Provides in-memory implementations of all platform dependencies for isolated testing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::biometry::BiometryType;
use crate::policy::AccessControlPolicy;
use crate::security::SecurityLevel;
use crate::traits::{
    AuthError, Authenticator, BiometryProbe, PasswordPurpose, SecureStorage, StorageError,
    StoredItem,
};

// ============================================================================
// InMemoryStorage
// ============================================================================

/// In-memory secure storage for testing
///
/// Thread-safe storage backed by HashMap. No actual keyring interaction.
#[derive(Clone)]
pub struct InMemoryStorage {
    items: Arc<Mutex<HashMap<String, StoredItem>>>,
    level: Option<SecurityLevel>,
    unavailable: Arc<Mutex<Option<String>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            items: Arc::new(Mutex::new(HashMap::new())),
            level: None,
            unavailable: Arc::new(Mutex::new(None)),
        }
    }

    /// Storage that reports `level` from `security_level`
    pub fn with_security_level(level: SecurityLevel) -> Self {
        Self {
            level: Some(level),
            ..Self::new()
        }
    }

    /// Get all stored keys, sorted (for assertions)
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.items.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Raw stored envelope (for assertions)
    pub fn item(&self, key: &str) -> Option<StoredItem> {
        self.items.lock().unwrap().get(key).cloned()
    }

    /// Make every subsequent call fail as if the store were locked
    pub fn set_unavailable(&self, reason: Option<&str>) {
        *self.unavailable.lock().unwrap() = reason.map(str::to_string);
    }

    fn check_available(&self) -> Result<(), StorageError> {
        match self.unavailable.lock().unwrap().as_ref() {
            Some(reason) => Err(StorageError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecureStorage for InMemoryStorage {
    async fn write(&self, key: &str, item: StoredItem) -> Result<(), StorageError> {
        self.check_available()?;
        self.items.lock().unwrap().insert(key.to_string(), item);
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Option<StoredItem>, StorageError> {
        self.check_available()?;
        Ok(self.items.lock().unwrap().get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<Option<StoredItem>, StorageError> {
        self.check_available()?;
        Ok(self.items.lock().unwrap().remove(key))
    }

    async fn clear(&self) -> Result<usize, StorageError> {
        self.check_available()?;
        let mut items = self.items.lock().unwrap();
        let count = items.len();
        items.clear();
        Ok(count)
    }

    async fn security_level(&self) -> Result<SecurityLevel, StorageError> {
        self.check_available()?;
        self.level.ok_or_else(|| {
            StorageError::Unsupported("in-memory storage reports no security level".into())
        })
    }
}

// ============================================================================
// ScriptedAuthenticator
// ============================================================================

/// How the scripted user answers prompts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptBehavior {
    Approve,
    Deny,
    Cancel,
}

struct ScriptState {
    behavior: PromptBehavior,
    password: String,
    biometry: bool,
    passcode: bool,
    prompts: usize,
}

/// Scripted authenticator for testing
///
/// Answers every prompt according to the configured behavior and records
/// how many prompts were shown.
#[derive(Clone)]
pub struct ScriptedAuthenticator {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedAuthenticator {
    fn with_behavior(behavior: PromptBehavior) -> Self {
        Self {
            state: Arc::new(Mutex::new(ScriptState {
                behavior,
                password: "password".to_string(),
                biometry: true,
                passcode: true,
                prompts: 0,
            })),
        }
    }

    /// Every prompt succeeds
    pub fn approving() -> Self {
        Self::with_behavior(PromptBehavior::Approve)
    }

    /// Every prompt fails verification
    pub fn denying() -> Self {
        Self::with_behavior(PromptBehavior::Deny)
    }

    /// Every prompt is dismissed by the user
    pub fn cancelling() -> Self {
        Self::with_behavior(PromptBehavior::Cancel)
    }

    /// Password the scripted user types
    pub fn with_password(self, password: &str) -> Self {
        self.state.lock().unwrap().password = password.to_string();
        self
    }

    /// Device has no biometric sensor
    pub fn without_biometry(self) -> Self {
        self.state.lock().unwrap().biometry = false;
        self
    }

    /// Device has no passcode set
    pub fn without_passcode(self) -> Self {
        self.state.lock().unwrap().passcode = false;
        self
    }

    pub fn set_behavior(&self, behavior: PromptBehavior) {
        self.state.lock().unwrap().behavior = behavior;
    }

    /// Change the password typed from now on
    pub fn set_password(&self, password: &str) {
        self.state.lock().unwrap().password = password.to_string();
    }

    pub fn deny_all(&self) {
        self.set_behavior(PromptBehavior::Deny);
    }

    pub fn approve_all(&self) {
        self.set_behavior(PromptBehavior::Approve);
    }

    /// Number of prompts shown so far
    pub fn prompts(&self) -> usize {
        self.state.lock().unwrap().prompts
    }
}

impl Default for ScriptedAuthenticator {
    fn default() -> Self {
        Self::approving()
    }
}

#[async_trait]
impl Authenticator for ScriptedAuthenticator {
    fn supports(&self, policy: AccessControlPolicy) -> bool {
        let state = self.state.lock().unwrap();
        match policy {
            AccessControlPolicy::None | AccessControlPolicy::ApplicationPassword => true,
            AccessControlPolicy::DevicePasscode => state.passcode,
            AccessControlPolicy::BiometryCurrentSet => state.biometry,
        }
    }

    async fn verify_presence(
        &self,
        policy: AccessControlPolicy,
        _reason: &str,
    ) -> Result<(), AuthError> {
        let mut state = self.state.lock().unwrap();
        state.prompts += 1;
        match state.behavior {
            PromptBehavior::Approve => Ok(()),
            PromptBehavior::Deny => Err(AuthError::Failed(format!("{} check failed", policy))),
            PromptBehavior::Cancel => Err(AuthError::Cancelled),
        }
    }

    async fn request_password(
        &self,
        _reason: &str,
        _purpose: PasswordPurpose,
    ) -> Result<Zeroizing<String>, AuthError> {
        let mut state = self.state.lock().unwrap();
        state.prompts += 1;
        match state.behavior {
            PromptBehavior::Approve => Ok(Zeroizing::new(state.password.clone())),
            PromptBehavior::Deny => Err(AuthError::Failed("password entry rejected".into())),
            PromptBehavior::Cancel => Err(AuthError::Cancelled),
        }
    }
}

// ============================================================================
// FixedBiometryProbe
// ============================================================================

/// Biometry probe with a fixed answer that counts how often it was asked
#[derive(Clone)]
pub struct FixedBiometryProbe {
    answer: Arc<Mutex<Option<BiometryType>>>,
    calls: Arc<Mutex<usize>>,
}

impl FixedBiometryProbe {
    pub fn new(answer: Option<BiometryType>) -> Self {
        Self {
            answer: Arc::new(Mutex::new(answer)),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Change what the device reports (e.g. biometrics disabled mid-session)
    pub fn set_answer(&self, answer: Option<BiometryType>) {
        *self.answer.lock().unwrap() = answer;
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl BiometryProbe for FixedBiometryProbe {
    async fn detect(&self) -> Option<BiometryType> {
        *self.calls.lock().unwrap() += 1;
        *self.answer.lock().unwrap()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_storage() {
        let storage = InMemoryStorage::new();

        // Write
        storage
            .write("key1", StoredItem::new("value1", AccessControlPolicy::None))
            .await
            .unwrap();
        assert_eq!(storage.keys(), vec!["key1".to_string()]);

        // Read
        let item = storage.read("key1").await.unwrap().unwrap();
        assert_eq!(item.value, "value1");

        // Delete
        assert!(storage.delete("key1").await.unwrap().is_some());
        assert!(storage.delete("key1").await.unwrap().is_none());
        assert!(storage.keys().is_empty());
    }

    #[tokio::test]
    async fn test_in_memory_storage_unavailable() {
        let storage = InMemoryStorage::new();
        storage.set_unavailable(Some("locked"));

        let result = storage.read("key1").await;
        assert!(matches!(result, Err(StorageError::Unavailable(_))));

        storage.set_unavailable(None);
        assert!(storage.read("key1").await.unwrap().is_none());
    }

    #[test]
    fn test_in_memory_storage_clear() {
        let storage = InMemoryStorage::new();
        tokio_test::block_on(async {
            storage
                .write("a", StoredItem::new("1", AccessControlPolicy::None))
                .await
                .unwrap();
            storage
                .write("b", StoredItem::new("2", AccessControlPolicy::DevicePasscode))
                .await
                .unwrap();
            assert_eq!(storage.clear().await.unwrap(), 2);
            assert_eq!(storage.clear().await.unwrap(), 0);
        });
    }

    #[tokio::test]
    async fn test_scripted_authenticator_counts_prompts() {
        let auth = ScriptedAuthenticator::approving().with_password("pw");

        let password = auth
            .request_password("unlock", PasswordPurpose::Unlock)
            .await
            .unwrap();
        assert_eq!(password.as_str(), "pw");
        auth.verify_presence(AccessControlPolicy::DevicePasscode, "unlock")
            .await
            .unwrap();
        assert_eq!(auth.prompts(), 2);

        auth.set_behavior(PromptBehavior::Cancel);
        let result = auth
            .verify_presence(AccessControlPolicy::BiometryCurrentSet, "unlock")
            .await;
        assert_eq!(result, Err(AuthError::Cancelled));
    }

    #[test]
    fn test_scripted_authenticator_capabilities() {
        let auth = ScriptedAuthenticator::approving()
            .without_biometry()
            .without_passcode();
        assert!(auth.supports(AccessControlPolicy::None));
        assert!(auth.supports(AccessControlPolicy::ApplicationPassword));
        assert!(!auth.supports(AccessControlPolicy::DevicePasscode));
        assert!(!auth.supports(AccessControlPolicy::BiometryCurrentSet));
    }

    #[tokio::test]
    async fn test_fixed_probe() {
        let probe = FixedBiometryProbe::new(Some(BiometryType::Face));
        assert_eq!(probe.detect().await, Some(BiometryType::Face));

        probe.set_answer(None);
        assert_eq!(probe.detect().await, None);
        assert_eq!(probe.calls(), 2);
    }
}
