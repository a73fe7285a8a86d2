//! Production implementations of traits

mod file_storage;
mod keyring_storage;
mod system_biometry;
mod terminal_authenticator;

pub use file_storage::FileStorage;
pub use keyring_storage::KeyringStorage;
pub use system_biometry::SystemBiometryProbe;
pub use terminal_authenticator::TerminalAuthenticator;
