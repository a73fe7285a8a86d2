//! Application state management

use std::sync::Arc;

use crate::biometry::BiometryCache;
use crate::config::{AppConfig, BackendKind};
use crate::production::{FileStorage, KeyringStorage, SystemBiometryProbe, TerminalAuthenticator};
use crate::store::CredentialStore;
use crate::traits::{Authenticator, BiometryProbe, SecureStorage};

/// Application state containing all dependencies
pub struct AppState {
    pub store: CredentialStore,
    pub biometry: BiometryCache,
    pub config: AppConfig,
}

impl AppState {
    /// Create a new AppState with production implementations
    pub async fn new_production(config: AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        tracing::info!(service = %config.service, backend = ?config.backend, "Initializing AppState");

        let storage: Arc<dyn SecureStorage> = match config.backend {
            BackendKind::File => {
                let path = config.credentials_file();
                std::fs::create_dir_all(&config.data_dir)?;
                tracing::info!(path = %path.display(), "DEV MODE: file-based credential store (not secure)");
                Arc::new(FileStorage::new(path))
            }
            BackendKind::Keyring => {
                tracing::info!("Keyring credential store initialized");
                Arc::new(KeyringStorage::new(&config.service))
            }
        };

        let probe: Arc<dyn BiometryProbe> = Arc::new(SystemBiometryProbe::new());
        let biometry = BiometryCache::new(probe);
        let detected = biometry.get().await;
        tracing::info!(biometry = ?detected, "Biometry capability detected");

        let authenticator: Arc<dyn Authenticator> = Arc::new(TerminalAuthenticator::new(detected));

        Ok(Self::from_parts(storage, authenticator, biometry, config))
    }

    /// Assemble state from explicit implementations (tests, embedders)
    pub fn from_parts(
        storage: Arc<dyn SecureStorage>,
        authenticator: Arc<dyn Authenticator>,
        biometry: BiometryCache,
        config: AppConfig,
    ) -> Self {
        Self {
            store: CredentialStore::new(storage, authenticator),
            biometry,
            config,
        }
    }
}
