//! Credential records and validated keys

use serde::Serialize;

use crate::error::StoreError;

/// Longest key accepted, in bytes. Platform keyrings reject longer
/// identifiers; this is checked up front so nothing is ever truncated.
pub const MAX_KEY_LEN: usize = 255;

/// Non-empty, length-bounded key naming a credential
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CredentialKey(String);

impl CredentialKey {
    pub fn parse(key: &str) -> Result<Self, StoreError> {
        if key.is_empty() {
            return Err(StoreError::InvalidArgument("key must not be empty".into()));
        }
        if key.len() > MAX_KEY_LEN {
            return Err(StoreError::InvalidArgument(format!(
                "key is {} bytes, limit is {}",
                key.len(),
                MAX_KEY_LEN
            )));
        }
        if key.chars().any(char::is_control) {
            return Err(StoreError::InvalidArgument(
                "key must not contain control characters".into(),
            ));
        }
        Ok(Self(key.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for CredentialKey {
    type Error = StoreError;

    fn try_from(key: &str) -> Result<Self, Self::Error> {
        Self::parse(key)
    }
}

/// A key and the value stored under it, as returned by a read
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub key: String,
    pub value: String,
}

impl Credential {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("key", &self.key)
            .field("value", &"***")
            .finish()
    }
}
