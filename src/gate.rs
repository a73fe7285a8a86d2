//! Policy enforcement at write and read time
//!
//! `seal` runs the write-side gate and produces the envelope to persist;
//! `unseal` checks a read/remove request against the policy the item was
//! sealed with and runs the matching authentication prompt.

use std::sync::Arc;

use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::credential::CredentialKey;
use crate::error::{Outcome, StoreError};
use crate::policy::AccessControlPolicy;
use crate::traits::{AuthError, Authenticator, PasswordDigest, PasswordPurpose, StoredItem};

const SALT_LEN: usize = 16;

pub struct AccessGate {
    authenticator: Arc<dyn Authenticator>,
}

impl AccessGate {
    pub fn new(authenticator: Arc<dyn Authenticator>) -> Self {
        Self { authenticator }
    }

    pub fn supports(&self, policy: AccessControlPolicy) -> bool {
        !policy.requires_authentication() || self.authenticator.supports(policy)
    }

    /// Seal `value` under `policy`, prompting where the policy gates writes
    pub async fn seal(
        &self,
        key: &CredentialKey,
        value: &str,
        policy: AccessControlPolicy,
    ) -> Outcome<StoredItem> {
        if !self.supports(policy) {
            return Err(StoreError::Unsupported(format!(
                "{} protection is not available on this device",
                policy
            )));
        }

        let item = StoredItem::new(value, policy);
        match policy {
            AccessControlPolicy::None | AccessControlPolicy::DevicePasscode => Ok(item),
            AccessControlPolicy::ApplicationPassword => {
                let reason = format!("Choose a password for '{}'", key);
                let password = self
                    .authenticator
                    .request_password(&reason, PasswordPurpose::Create)
                    .await?;
                if password.is_empty() {
                    return Err(StoreError::InvalidArgument(
                        "application password must not be empty".into(),
                    ));
                }
                Ok(item.with_password(digest_password(&password)))
            }
            AccessControlPolicy::BiometryCurrentSet => {
                let reason = format!("Authenticate to protect '{}'", key);
                self.authenticator.verify_presence(policy, &reason).await?;
                Ok(item)
            }
        }
    }

    /// Check a request made under `requested` against a sealed item
    pub async fn unseal(
        &self,
        key: &CredentialKey,
        item: &StoredItem,
        requested: AccessControlPolicy,
    ) -> Outcome<()> {
        if item.policy.requires_authentication() && requested != item.policy {
            return Err(StoreError::AuthenticationFailed(format!(
                "'{}' is protected by {}, request supplied {}",
                key, item.policy, requested
            )));
        }

        match item.policy {
            AccessControlPolicy::None => Ok(()),
            AccessControlPolicy::DevicePasscode | AccessControlPolicy::BiometryCurrentSet => {
                let reason = format!("Authenticate to access '{}'", key);
                self.authenticator
                    .verify_presence(item.policy, &reason)
                    .await
                    .map_err(unlock_error)
            }
            AccessControlPolicy::ApplicationPassword => {
                let digest = item.password.as_ref().ok_or_else(|| {
                    StoreError::StorageUnavailable(format!(
                        "'{}' is missing its password digest",
                        key
                    ))
                })?;
                let reason = format!("Enter the password for '{}'", key);
                let password = self
                    .authenticator
                    .request_password(&reason, PasswordPurpose::Unlock)
                    .await
                    .map_err(unlock_error)?;
                if verify_password(digest, &password) {
                    Ok(())
                } else {
                    Err(StoreError::AuthenticationFailed(
                        "application password did not match".into(),
                    ))
                }
            }
        }
    }
}

/// A gate that disappears after sealing (biometrics disabled, sensor removed)
/// locks the item rather than making the request unsupported.
fn unlock_error(err: AuthError) -> StoreError {
    match err {
        AuthError::Unavailable(msg) => {
            StoreError::AuthenticationFailed(format!("gate no longer available: {}", msg))
        }
        other => other.into(),
    }
}

fn digest_password(password: &str) -> PasswordDigest {
    let mut salt = vec![0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let hash = hash_with_salt(&salt, password);
    PasswordDigest { salt, hash }
}

fn hash_with_salt(salt: &[u8], password: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().to_vec()
}

fn verify_password(digest: &PasswordDigest, password: &str) -> bool {
    let candidate = hash_with_salt(&digest.salt, password);
    candidate.as_slice().ct_eq(digest.hash.as_slice()).into()
}
