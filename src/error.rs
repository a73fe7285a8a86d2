//! Error taxonomy for store operations
//!
//! Every engine operation returns an [`Outcome`]. A missing item is not an
//! error: `load`/`remove` report it as `Ok(None)`.

use serde::Serialize;
use thiserror::Error;

use crate::traits::{AuthError, StorageError};

/// Result of every store, probe-adjacent and query operation
pub type Outcome<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("unsupported: {0}")]
    Unsupported(String),
}

/// Discriminant of a [`StoreError`], for callers that branch on the kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidArgument,
    AuthenticationFailed,
    StorageUnavailable,
    Unsupported,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::AuthenticationFailed => "authentication_failed",
            ErrorKind::StorageUnavailable => "storage_unavailable",
            ErrorKind::Unsupported => "unsupported",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            StoreError::AuthenticationFailed(_) => ErrorKind::AuthenticationFailed,
            StoreError::StorageUnavailable(_) => ErrorKind::StorageUnavailable,
            StoreError::Unsupported(_) => ErrorKind::Unsupported,
        }
    }

    /// Underlying diagnostic without the kind prefix
    pub fn diagnostic(&self) -> &str {
        match self {
            StoreError::InvalidArgument(msg)
            | StoreError::AuthenticationFailed(msg)
            | StoreError::StorageUnavailable(msg)
            | StoreError::Unsupported(msg) => msg,
        }
    }
}

impl From<StorageError> for StoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::TooLong { .. } | StorageError::InvalidKey(_) => {
                StoreError::InvalidArgument(err.to_string())
            }
            StorageError::Unsupported(msg) => StoreError::Unsupported(msg),
            StorageError::Unavailable(_) | StorageError::Corrupt(_) => {
                StoreError::StorageUnavailable(err.to_string())
            }
        }
    }
}

impl From<AuthError> for StoreError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unavailable(msg) => StoreError::Unsupported(msg),
            AuthError::Cancelled | AuthError::Failed(_) => {
                StoreError::AuthenticationFailed(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(
            StoreError::InvalidArgument("x".into()).kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            StoreError::AuthenticationFailed("x".into()).kind(),
            ErrorKind::AuthenticationFailed
        );
        assert_eq!(
            StoreError::StorageUnavailable("x".into()).kind(),
            ErrorKind::StorageUnavailable
        );
        assert_eq!(StoreError::Unsupported("x".into()).kind(), ErrorKind::Unsupported);
    }

    #[test]
    fn test_display_includes_kind_and_diagnostic() {
        let err = StoreError::AuthenticationFailed("wrong password".into());
        assert_eq!(err.to_string(), "authentication failed: wrong password");
        assert_eq!(err.diagnostic(), "wrong password");
    }

    #[test]
    fn test_storage_error_conversion() {
        let err: StoreError = StorageError::TooLong {
            attribute: "user".into(),
            max: 255,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err: StoreError = StorageError::Unavailable("locked".into()).into();
        assert_eq!(err.kind(), ErrorKind::StorageUnavailable);
        assert!(err.diagnostic().contains("locked"));

        let err: StoreError = StorageError::Unsupported("no tier".into()).into();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }

    #[test]
    fn test_auth_error_conversion() {
        let err: StoreError = AuthError::Cancelled.into();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);

        let err: StoreError = AuthError::Failed("no match".into()).into();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);

        let err: StoreError = AuthError::Unavailable("no sensor".into()).into();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }
}
