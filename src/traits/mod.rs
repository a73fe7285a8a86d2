//! Trait definitions for dependency injection
//!
//! All platform dependencies are abstracted behind traits to enable testing.

mod authenticator;
mod biometry_probe;
mod secure_storage;

pub use authenticator::{AuthError, Authenticator, PasswordPurpose};
pub use biometry_probe::BiometryProbe;
pub use secure_storage::{PasswordDigest, SecureStorage, StorageError, StoredItem};

#[cfg(test)]
pub use authenticator::MockAuthenticator;
#[cfg(test)]
pub use biometry_probe::MockBiometryProbe;
#[cfg(test)]
pub use secure_storage::MockSecureStorage;
