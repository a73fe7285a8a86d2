//! Biometric capability probe trait

use crate::biometry::BiometryType;

/// Trait for querying the strongest biometric factor the device offers
///
/// Production: `fprintd` enrollment query on Linux
/// Testing: Fixed answer
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait BiometryProbe: Send + Sync {
    /// Detect the available biometry; `None` when no hardware or enrollment exists
    async fn detect(&self) -> Option<BiometryType>;
}
