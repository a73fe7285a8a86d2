//! Security tier of the backing store

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecurityLevel {
    /// No protection guarantees (plain file)
    Any,
    /// Encrypted by the OS, keys held in software
    SecureSoftware,
    /// Keys isolated in secure hardware
    SecureHardware,
}

impl SecurityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityLevel::Any => "ANY",
            SecurityLevel::SecureSoftware => "SECURE_SOFTWARE",
            SecurityLevel::SecureHardware => "SECURE_HARDWARE",
        }
    }

    pub fn is_hardware_backed(&self) -> bool {
        matches!(self, SecurityLevel::SecureHardware)
    }
}

impl std::fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
