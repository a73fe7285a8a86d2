//! Biometric capability types and the caller-owned capability cache

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::traits::BiometryProbe;

/// Strongest biometric factor a device offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BiometryType {
    TouchId,
    FaceId,
    Fingerprint,
    Face,
    Iris,
}

impl BiometryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BiometryType::TouchId => "TouchID",
            BiometryType::FaceId => "FaceID",
            BiometryType::Fingerprint => "Fingerprint",
            BiometryType::Face => "Face",
            BiometryType::Iris => "Iris",
        }
    }
}

impl std::fmt::Display for BiometryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detected capability, probed once and reused until [`BiometryCache::refresh`]
///
/// The cache never invalidates itself. Callers that suspect the OS-level
/// capability changed (biometrics disabled mid-session) must refresh.
pub struct BiometryCache {
    probe: Arc<dyn BiometryProbe>,
    state: Mutex<Option<Option<BiometryType>>>,
}

impl BiometryCache {
    pub fn new(probe: Arc<dyn BiometryProbe>) -> Self {
        Self {
            probe,
            state: Mutex::new(None),
        }
    }

    /// Cached capability, probing on first use
    pub async fn get(&self) -> Option<BiometryType> {
        if let Some(cached) = self.cached() {
            return cached;
        }
        self.refresh().await
    }

    /// Re-probe the device and replace the cached value
    pub async fn refresh(&self) -> Option<BiometryType> {
        let detected = self.probe.detect().await;
        tracing::debug!(biometry = ?detected, "Biometry capability probed");
        *self.state.lock().unwrap() = Some(detected);
        detected
    }

    /// Cached value without probing; outer `None` means never probed
    pub fn cached(&self) -> Option<Option<BiometryType>> {
        *self.state.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockBiometryProbe;

    #[tokio::test]
    async fn test_probe_runs_once() {
        let mut probe = MockBiometryProbe::new();
        probe
            .expect_detect()
            .times(1)
            .returning(|| Some(BiometryType::Fingerprint));
        let cache = BiometryCache::new(Arc::new(probe));

        assert_eq!(cache.cached(), None);
        assert_eq!(cache.get().await, Some(BiometryType::Fingerprint));
        assert_eq!(cache.get().await, Some(BiometryType::Fingerprint));
        assert_eq!(cache.cached(), Some(Some(BiometryType::Fingerprint)));
    }

    #[tokio::test]
    async fn test_absent_biometry_is_cached_too() {
        let mut probe = MockBiometryProbe::new();
        probe.expect_detect().times(1).returning(|| None);
        let cache = BiometryCache::new(Arc::new(probe));

        assert_eq!(cache.get().await, None);
        assert_eq!(cache.get().await, None);
        assert_eq!(cache.cached(), Some(None));
    }

    #[tokio::test]
    async fn test_refresh_picks_up_capability_change() {
        let mut probe = MockBiometryProbe::new();
        let mut seq = mockall::Sequence::new();
        probe
            .expect_detect()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Some(BiometryType::FaceId));
        probe
            .expect_detect()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| None);
        let cache = BiometryCache::new(Arc::new(probe));

        assert_eq!(cache.get().await, Some(BiometryType::FaceId));
        assert_eq!(cache.refresh().await, None);
        assert_eq!(cache.get().await, None);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(BiometryType::TouchId.to_string(), "TouchID");
        assert_eq!(BiometryType::Fingerprint.to_string(), "Fingerprint");
    }
}
