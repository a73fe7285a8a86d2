//! Biometric capability probe backed by the OS
//!
//! On Linux, asks `fprintd` whether the current user has enrolled fingers.
//! Other platforms report no biometry.

use tokio::process::Command;

use crate::biometry::BiometryType;
use crate::traits::BiometryProbe;

pub struct SystemBiometryProbe {
    user: Option<String>,
}

impl SystemBiometryProbe {
    pub fn new() -> Self {
        Self {
            user: std::env::var("USER").ok(),
        }
    }

    pub fn for_user(user: &str) -> Self {
        Self {
            user: Some(user.to_string()),
        }
    }

    async fn detect_fprintd(&self) -> Option<BiometryType> {
        let user = self.user.as_deref()?;
        let output = match Command::new("fprintd-list").arg(user).output().await {
            Ok(output) => output,
            Err(e) => {
                tracing::debug!(error = %e, "fprintd not available");
                return None;
            }
        };
        if !output.status.success() {
            tracing::debug!(status = %output.status, "fprintd-list failed");
            return None;
        }
        let listing = String::from_utf8_lossy(&output.stdout);
        has_enrolled_fingers(&listing).then_some(BiometryType::Fingerprint)
    }
}

impl Default for SystemBiometryProbe {
    fn default() -> Self {
        Self::new()
    }
}

/// `fprintd-list` prints one ` - #N: finger-name` line per enrolled finger
fn has_enrolled_fingers(listing: &str) -> bool {
    listing
        .lines()
        .any(|line| line.trim_start().starts_with("- #"))
}

#[async_trait::async_trait]
impl BiometryProbe for SystemBiometryProbe {
    async fn detect(&self) -> Option<BiometryType> {
        if cfg!(target_os = "linux") {
            self.detect_fprintd().await
        } else {
            None
        }
    }
}
