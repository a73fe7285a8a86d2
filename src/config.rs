//! Environment-based application configuration

use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

pub const DEFAULT_SERVICE: &str = "com.keyguard.app";
const CREDENTIALS_FILE: &str = "dev-credentials.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
    #[error("No data directory available; set KEYGUARD_DATA_DIR")]
    NoDataDir,
}

/// Which secure-storage backend to wire up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Keyring,
    File,
}

impl BackendKind {
    /// Dev builds use the file store so rebuilt binaries don't re-prompt
    pub fn default_for_build() -> Self {
        if cfg!(debug_assertions) {
            BackendKind::File
        } else {
            BackendKind::Keyring
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keyring" | "keychain" => Ok(BackendKind::Keyring),
            "file" => Ok(BackendKind::File),
            other => Err(format!("expected 'keyring' or 'file', got '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Keyring service name; the single namespace all credentials live in
    pub service: String,
    pub backend: BackendKind,
    pub data_dir: PathBuf,
    pub log_dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source (for testing)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let service = lookup("KEYGUARD_SERVICE")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SERVICE.to_string());

        let backend = match lookup("KEYGUARD_BACKEND") {
            Some(value) => value.parse::<BackendKind>().map_err(|reason| ConfigError::Invalid {
                var: "KEYGUARD_BACKEND",
                reason,
            })?,
            None => BackendKind::default_for_build(),
        };

        let data_dir = match lookup("KEYGUARD_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_dir().ok_or(ConfigError::NoDataDir)?.join("keyguard"),
        };

        let log_dir = lookup("KEYGUARD_LOG_DIR").map(PathBuf::from);

        Ok(Self {
            service,
            backend,
            data_dir,
            log_dir,
        })
    }

    pub fn credentials_file(&self) -> PathBuf {
        self.data_dir.join(CREDENTIALS_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|var| map.get(var).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[("KEYGUARD_DATA_DIR", "/tmp/kg")]).unwrap();
        assert_eq!(config.service, DEFAULT_SERVICE);
        assert_eq!(config.backend, BackendKind::default_for_build());
        assert_eq!(config.credentials_file(), PathBuf::from("/tmp/kg/dev-credentials.json"));
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("KEYGUARD_SERVICE", "com.example.vault"),
            ("KEYGUARD_BACKEND", "Keyring"),
            ("KEYGUARD_DATA_DIR", "/tmp/kg"),
            ("KEYGUARD_LOG_DIR", "/tmp/kg/logs"),
        ])
        .unwrap();
        assert_eq!(config.service, "com.example.vault");
        assert_eq!(config.backend, BackendKind::Keyring);
        assert_eq!(config.log_dir, Some(PathBuf::from("/tmp/kg/logs")));
    }

    #[test]
    fn test_blank_service_falls_back() {
        let config = config(&[("KEYGUARD_SERVICE", "  "), ("KEYGUARD_DATA_DIR", "/tmp")]).unwrap();
        assert_eq!(config.service, DEFAULT_SERVICE);
    }

    #[test]
    fn test_invalid_backend() {
        let err = config(&[("KEYGUARD_BACKEND", "sqlite"), ("KEYGUARD_DATA_DIR", "/tmp")])
            .unwrap_err();
        assert!(err.to_string().contains("KEYGUARD_BACKEND"));
    }
}
