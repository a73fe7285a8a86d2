//! Credential store engine
//!
//! Validates keys, runs the access gate and talks to the secure storage
//! backend. Every operation resolves to an [`Outcome`]; nothing is retried.
//! Values and passwords never reach the logs, only keys and policies.

use std::sync::Arc;

use crate::credential::{Credential, CredentialKey};
use crate::error::Outcome;
use crate::gate::AccessGate;
use crate::policy::AccessControlPolicy;
use crate::security::SecurityLevel;
use crate::traits::{Authenticator, SecureStorage};

pub struct CredentialStore {
    storage: Arc<dyn SecureStorage>,
    gate: AccessGate,
}

impl CredentialStore {
    pub fn new(storage: Arc<dyn SecureStorage>, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            storage,
            gate: AccessGate::new(authenticator),
        }
    }

    /// Whether this device can enforce `policy`
    pub fn supports(&self, policy: AccessControlPolicy) -> bool {
        self.gate.supports(policy)
    }

    /// Store `value` under `key`, replacing any existing item
    pub async fn save(&self, key: &str, value: &str, policy: AccessControlPolicy) -> Outcome<()> {
        let key = CredentialKey::parse(key)?;
        let item = self.gate.seal(&key, value, policy).await?;
        self.storage.write(key.as_str(), item).await?;
        tracing::info!(key = %key, policy = %policy, "Credential saved");
        Ok(())
    }

    /// Read the credential under `key`; `Ok(None)` when nothing is stored
    pub async fn load(&self, key: &str, policy: AccessControlPolicy) -> Outcome<Option<Credential>> {
        let key = CredentialKey::parse(key)?;
        let Some(item) = self.storage.read(key.as_str()).await? else {
            tracing::debug!(key = %key, "No credential stored");
            return Ok(None);
        };
        if let Err(e) = self.gate.unseal(&key, &item, policy).await {
            tracing::warn!(key = %key, error = %e, "Credential load denied");
            return Err(e);
        }
        tracing::debug!(key = %key, "Credential loaded");
        Ok(Some(Credential::new(key.as_str(), item.value)))
    }

    /// Delete the credential under `key` after passing its gate, returning it.
    /// Removing an absent key succeeds with `Ok(None)`.
    pub async fn remove(&self, key: &str, policy: AccessControlPolicy) -> Outcome<Option<Credential>> {
        let key = CredentialKey::parse(key)?;
        let Some(item) = self.storage.read(key.as_str()).await? else {
            tracing::debug!(key = %key, "Nothing to remove");
            return Ok(None);
        };
        if let Err(e) = self.gate.unseal(&key, &item, policy).await {
            tracing::warn!(key = %key, error = %e, "Credential removal denied");
            return Err(e);
        }
        self.storage.delete(key.as_str()).await?;
        tracing::info!(key = %key, "Credential removed");
        Ok(Some(Credential::new(key.as_str(), item.value)))
    }

    /// Delete every credential in the namespace, regardless of policy
    pub async fn reset_all(&self) -> Outcome<()> {
        let removed = self.storage.clear().await?;
        tracing::warn!(count = removed, "All credentials reset");
        Ok(())
    }

    /// Protection tier of the backing store; `Unsupported` where the
    /// platform draws no distinction
    pub async fn security_level(&self) -> Outcome<SecurityLevel> {
        let level = self.storage.security_level().await?;
        tracing::debug!(level = %level, "Security level queried");
        Ok(level)
    }
}
