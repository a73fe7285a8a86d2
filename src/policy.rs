//! Access-control policies and their presentation order
//!
//! The option list is a pure function of whether biometry is available; the
//! index lookup is kept separate so policy semantics never depend on display
//! order.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::biometry::BiometryType;
use crate::error::StoreError;

/// Authentication gate attached to an item at write time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessControlPolicy {
    None,
    DevicePasscode,
    ApplicationPassword,
    BiometryCurrentSet,
}

impl AccessControlPolicy {
    pub const ALL: [AccessControlPolicy; 4] = [
        AccessControlPolicy::None,
        AccessControlPolicy::DevicePasscode,
        AccessControlPolicy::ApplicationPassword,
        AccessControlPolicy::BiometryCurrentSet,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AccessControlPolicy::None => "None",
            AccessControlPolicy::DevicePasscode => "Passcode",
            AccessControlPolicy::ApplicationPassword => "Password",
            AccessControlPolicy::BiometryCurrentSet => "Biometry",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessControlPolicy::None => "none",
            AccessControlPolicy::DevicePasscode => "device_passcode",
            AccessControlPolicy::ApplicationPassword => "application_password",
            AccessControlPolicy::BiometryCurrentSet => "biometry_current_set",
        }
    }

    pub fn requires_authentication(&self) -> bool {
        !matches!(self, AccessControlPolicy::None)
    }
}

impl std::fmt::Display for AccessControlPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessControlPolicy {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "none" => Ok(AccessControlPolicy::None),
            "passcode" | "device_passcode" => Ok(AccessControlPolicy::DevicePasscode),
            "password" | "application_password" => Ok(AccessControlPolicy::ApplicationPassword),
            "biometry" | "biometry_current_set" => Ok(AccessControlPolicy::BiometryCurrentSet),
            other => Err(StoreError::InvalidArgument(format!(
                "unknown access control policy: {}",
                other
            ))),
        }
    }
}

/// Policies offered to the user, in display order
pub fn available_options(has_biometry: bool) -> Vec<AccessControlPolicy> {
    let mut options = vec![
        AccessControlPolicy::None,
        AccessControlPolicy::DevicePasscode,
        AccessControlPolicy::ApplicationPassword,
    ];
    if has_biometry {
        options.push(AccessControlPolicy::BiometryCurrentSet);
    }
    options
}

/// Display labels for [`available_options`]; the biometric entry is named
/// after the detected biometry type
pub fn option_labels(biometry: Option<BiometryType>) -> Vec<String> {
    available_options(biometry.is_some())
        .into_iter()
        .map(|policy| match (policy, biometry) {
            (AccessControlPolicy::BiometryCurrentSet, Some(kind)) => kind.to_string(),
            _ => policy.label().to_string(),
        })
        .collect()
}

/// Checked lookup for untrusted selection input
pub fn try_policy_for_index(index: usize, has_biometry: bool) -> Option<AccessControlPolicy> {
    available_options(has_biometry).get(index).copied()
}

/// Map a selection index to its policy.
///
/// # Panics
///
/// Panics when `index` is outside the option list; selections always come
/// from [`available_options`], so this is a caller bug.
pub fn policy_for_index(index: usize, has_biometry: bool) -> AccessControlPolicy {
    match try_policy_for_index(index, has_biometry) {
        Some(policy) => policy,
        None => panic!(
            "access control index {} out of range (0..{})",
            index,
            available_options(has_biometry).len()
        ),
    }
}
