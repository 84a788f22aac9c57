//! API Configuration
//!
//! Configuration types for the RunShare API layer.

use std::path::PathBuf;

use crate::network::SharingConfig;
use crate::tracking::TrackingConfig;

/// Where run history and the offline cache are kept.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StorageLocation {
    /// No persistence; the offline cache lives in memory.
    #[default]
    Disabled,
    /// In-memory SQLite database.
    InMemory,
    /// SQLite database file.
    File(PathBuf),
}

/// Configuration for a RunShare instance.
#[derive(Debug, Clone)]
pub struct RunShareConfig {
    /// Run history storage.
    pub storage: StorageLocation,

    /// Relay HTTP endpoint; empty for offline mode.
    pub endpoint: String,

    /// Stable identifier of the local participant.
    pub local_id: String,

    /// Name shown to peers.
    pub display_name: String,

    /// Relay connection settings.
    pub sharing: SharingConfig,

    /// Fix filtering and distance settings.
    pub tracking: TrackingConfig,
}

impl Default for RunShareConfig {
    fn default() -> Self {
        RunShareConfig {
            storage: StorageLocation::Disabled,
            endpoint: String::new(),
            local_id: uuid::Uuid::new_v4().to_string(),
            display_name: "Runner".to_string(),
            sharing: SharingConfig::default(),
            tracking: TrackingConfig::default(),
        }
    }
}

impl RunShareConfig {
    /// Creates a configuration persisting to the given database file.
    pub fn with_storage_path(storage_path: impl Into<PathBuf>) -> Self {
        RunShareConfig {
            storage: StorageLocation::File(storage_path.into()),
            ..Default::default()
        }
    }

    /// Creates a configuration backed by an in-memory database.
    pub fn in_memory() -> Self {
        RunShareConfig {
            storage: StorageLocation::InMemory,
            ..Default::default()
        }
    }

    /// Sets the relay endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the local participant's id and display name.
    pub fn with_identity(mut self, local_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        self.local_id = local_id.into();
        self.display_name = display_name.into();
        self
    }

    pub fn with_sharing(mut self, sharing: SharingConfig) -> Self {
        self.sharing = sharing;
        self
    }

    pub fn with_tracking(mut self, tracking: TrackingConfig) -> Self {
        self.tracking = tracking;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_builder_chain() {
        let config = RunShareConfig::with_storage_path("/tmp/runs.db")
            .with_endpoint("https://relay.example")
            .with_identity("me", "Ana")
            .with_sharing(SharingConfig {
                reconnect_delay: Duration::from_secs(1),
                ..Default::default()
            });

        assert_eq!(config.storage, StorageLocation::File("/tmp/runs.db".into()));
        assert_eq!(config.endpoint, "https://relay.example");
        assert_eq!(config.local_id, "me");
        assert_eq!(config.display_name, "Ana");
        assert_eq!(config.sharing.reconnect_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_default_identity_is_unique() {
        assert_ne!(
            RunShareConfig::default().local_id,
            RunShareConfig::default().local_id
        );
        assert_eq!(RunShareConfig::in_memory().storage, StorageLocation::InMemory);
    }
}
