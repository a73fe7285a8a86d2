//! Short user-facing status lines for store outcomes
//!
//! The presentation layer shows these verbatim. Failures carry the error kind
//! and diagnostic so "wrong password", "no such key" and "storage
//! unavailable" read differently.

use serde::Serialize;

use crate::credential::Credential;
use crate::error::{ErrorKind, Outcome, StoreError};
use crate::security::SecurityLevel;

/// Action the user triggered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Save,
    Load,
    Remove,
    Reset,
    SecurityLevel,
}

/// Rendered status for one action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    pub action: Action,
    pub success: bool,
    pub error_kind: Option<ErrorKind>,
    pub message: String,
}

impl Status {
    fn ok(action: Action, message: impl Into<String>) -> Self {
        Self {
            action,
            success: true,
            error_kind: None,
            message: message.into(),
        }
    }

    fn failed(action: Action, prefix: &str, err: &StoreError) -> Self {
        Self {
            action,
            success: false,
            error_kind: Some(err.kind()),
            message: format!("{} [{}] {}", prefix, err.kind(), err.diagnostic()),
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

pub fn saved(outcome: &Outcome<()>) -> Status {
    match outcome {
        Ok(()) => Status::ok(Action::Save, "Credentials saved!"),
        Err(e) => Status::failed(Action::Save, "Could not save credentials:", e),
    }
}

pub fn loaded(outcome: &Outcome<Option<Credential>>) -> Status {
    match outcome {
        Ok(Some(_)) => Status::ok(Action::Load, "Credentials loaded!"),
        Ok(None) => Status::ok(Action::Load, "No credentials stored."),
        Err(e) => Status::failed(Action::Load, "Could not load credentials:", e),
    }
}

pub fn removed(outcome: &Outcome<Option<Credential>>) -> Status {
    match outcome {
        Ok(Some(_)) => Status::ok(Action::Remove, "Credentials removed!"),
        Ok(None) => Status::ok(Action::Remove, "No credentials removed."),
        Err(e) => Status::failed(Action::Remove, "Could not remove credentials:", e),
    }
}

pub fn reset(outcome: &Outcome<()>) -> Status {
    match outcome {
        Ok(()) => Status::ok(Action::Reset, "Credentials reset!"),
        Err(e) => Status::failed(Action::Reset, "Could not reset credentials:", e),
    }
}

pub fn security_level(outcome: &Outcome<SecurityLevel>) -> Status {
    match outcome {
        Ok(level) => Status::ok(Action::SecurityLevel, format!("Security level: {}", level)),
        Err(e @ StoreError::Unsupported(_)) => Status::failed(
            Action::SecurityLevel,
            "Security level is not available on this platform:",
            e,
        ),
        Err(e) => Status::failed(Action::SecurityLevel, "Could not query security level:", e),
    }
}
