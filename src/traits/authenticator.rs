//! Authentication gate trait
//!
//! The platform primitive behind each access-control policy: presence checks
//! for device passcode and biometry, password entry for application passwords.

use thiserror::Error;
use zeroize::Zeroizing;

use crate::policy::AccessControlPolicy;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("user cancelled the authentication prompt")]
    Cancelled,
    #[error("{0}")]
    Failed(String),
    #[error("{0}")]
    Unavailable(String),
}

/// Why a password is being requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordPurpose {
    /// Choosing the password an item is sealed with
    Create,
    /// Entering the password to open a sealed item
    Unlock,
}

/// Trait for the OS authentication prompts a policy maps to
///
/// Production: terminal prompts plus `fprintd` on Linux
/// Testing: Scripted responses
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Authenticator: Send + Sync {
    /// Whether this device can enforce `policy` at all
    fn supports(&self, policy: AccessControlPolicy) -> bool;

    /// Confirm the device owner is present (passcode or biometric check)
    async fn verify_presence(
        &self,
        policy: AccessControlPolicy,
        reason: &str,
    ) -> Result<(), AuthError>;

    /// Ask the user for an application password
    async fn request_password(
        &self,
        reason: &str,
        purpose: PasswordPurpose,
    ) -> Result<Zeroizing<String>, AuthError>;
}
