//! Keyguard - secure key-value credential storage with access-control policies
//!
//! This library provides the credential store engine, organized around
//! trait-based dependency injection for testability. Platform backends live
//! in [`production`], test doubles in [`mocks`].

pub mod biometry;
pub mod config;
pub mod credential;
pub mod error;
pub mod gate;
pub mod mocks;
pub mod policy;
pub mod production;
pub mod security;
pub mod status;
pub mod store;
pub mod traits;

mod state;

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use biometry::{BiometryCache, BiometryType};
pub use credential::{Credential, CredentialKey};
pub use error::{ErrorKind, Outcome, StoreError};
pub use policy::AccessControlPolicy;
pub use security::SecurityLevel;
pub use state::AppState;
pub use store::CredentialStore;

/// Initialize logging to stderr and, when `log_dir` is given, a daily file.
///
/// Keep the returned guard alive for the process lifetime or buffered file
/// output is lost.
pub fn init_logging(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "keyguard=info,keyguard_lib=info".into()),
    );
    let stderr = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = rolling::daily(dir, "keyguard.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr)
                .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false))
                .try_init()?;
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr)
                .try_init()?;
            Ok(None)
        }
    }
}
