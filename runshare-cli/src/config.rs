//! CLI Configuration

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Data directory for storage.
    pub data_dir: PathBuf,
    /// Relay endpoint (http, https, ws or wss). Empty means offline.
    pub endpoint: String,
    /// Overrides the stored user ID.
    pub user_id: Option<String>,
    /// Overrides the stored display name.
    pub name: Option<String>,
}

/// Display name used until `init` or `identity rename` sets one.
pub const DEFAULT_NAME: &str = "Runner";

/// Local runner identity, persisted as JSON in the data directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub name: String,
}

impl CliConfig {
    /// Returns the run history database path.
    pub fn storage_path(&self) -> PathBuf {
        self.data_dir.join("runs.db")
    }

    /// Returns the identity file path.
    pub fn identity_path(&self) -> PathBuf {
        self.data_dir.join("identity.json")
    }

    /// Returns true if the identity file exists.
    pub fn is_initialized(&self) -> bool {
        self.identity_path().exists()
    }

    /// Creates the identity file with a fresh user ID.
    pub fn create_identity(&self, name: &str) -> Result<Identity> {
        if self.is_initialized() {
            bail!(
                "RunShare is already initialized in {:?}. Use --data-dir to specify a different location.",
                self.data_dir
            );
        }
        let name = name.trim();
        if name.is_empty() {
            bail!("Display name cannot be empty");
        }

        fs::create_dir_all(&self.data_dir)?;
        let identity = Identity {
            user_id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
        };
        fs::write(self.identity_path(), serde_json::to_vec_pretty(&identity)?)?;
        Ok(identity)
    }

    /// Loads the identity written by `init`.
    pub fn load_identity(&self) -> Result<Identity> {
        if !self.is_initialized() {
            bail!("RunShare not initialized. Run 'runshare init <name>' first.");
        }
        let data = fs::read(self.identity_path())
            .with_context(|| format!("reading {:?}", self.identity_path()))?;
        Ok(serde_json::from_slice(&data)?)
    }

    /// Identity used for sharing.
    ///
    /// Creates and stores one on first use so the user ID stays stable across
    /// invocations. `--user-id` and `--name` override the stored values.
    pub fn resolve_identity(&self) -> Result<Identity> {
        let mut identity = if self.is_initialized() {
            self.load_identity()?
        } else {
            self.create_identity(self.name.as_deref().unwrap_or(DEFAULT_NAME))?
        };
        if let Some(user_id) = self.user_id.as_deref().filter(|id| !id.trim().is_empty()) {
            identity.user_id = user_id.trim().to_string();
        }
        if let Some(name) = self.name.as_deref().filter(|name| !name.trim().is_empty()) {
            identity.name = name.trim().to_string();
        }
        Ok(identity)
    }

    /// Renames the stored identity, keeping its user ID.
    pub fn rename_identity(&self, name: &str) -> Result<Identity> {
        let name = name.trim();
        if name.is_empty() {
            bail!("Display name cannot be empty");
        }
        let mut identity = self.load_identity()?;
        identity.name = name.to_string();
        fs::write(self.identity_path(), serde_json::to_vec_pretty(&identity)?)?;
        Ok(identity)
    }
}

// INLINE_TEST_REQUIRED: Binary crate without lib.rs - tests cannot be external
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config_in(dir: &std::path::Path) -> CliConfig {
        CliConfig {
            data_dir: dir.to_path_buf(),
            endpoint: "ws://localhost:8080".to_string(),
            user_id: None,
            name: None,
        }
    }

    #[test]
    fn test_identity_persists_across_config_instances() {
        let temp_dir = tempdir().unwrap();

        let created = config_in(temp_dir.path())
            .create_identity("Alice")
            .expect("should create identity");
        let loaded = config_in(temp_dir.path())
            .load_identity()
            .expect("should load identity");

        assert_eq!(created, loaded);
        assert_eq!(loaded.name, "Alice");
        assert!(uuid::Uuid::parse_str(&loaded.user_id).is_ok());
    }

    #[test]
    fn test_create_identity_twice_fails() {
        let temp_dir = tempdir().unwrap();
        let config = config_in(temp_dir.path());

        config.create_identity("Alice").unwrap();
        assert!(config.create_identity("Bob").is_err());
    }

    #[test]
    fn test_load_without_init_fails() {
        let temp_dir = tempdir().unwrap();
        let err = config_in(temp_dir.path()).load_identity().unwrap_err();
        assert!(err.to_string().contains("not initialized"));
    }

    #[test]
    fn test_rename_keeps_user_id() {
        let temp_dir = tempdir().unwrap();
        let config = config_in(temp_dir.path());

        let before = config.create_identity("Alice").unwrap();
        let after = config.rename_identity("  Alicia ").unwrap();

        assert_eq!(before.user_id, after.user_id);
        assert_eq!(after.name, "Alicia");
    }

    #[test]
    fn test_blank_name_rejected() {
        let temp_dir = tempdir().unwrap();
        assert!(config_in(temp_dir.path()).create_identity("   ").is_err());
    }

    #[test]
    fn test_resolve_creates_identity_once() {
        let temp_dir = tempdir().unwrap();
        let config = config_in(temp_dir.path());

        let first = config.resolve_identity().unwrap();
        let second = config.resolve_identity().unwrap();

        assert!(config.is_initialized());
        assert_eq!(first.user_id, second.user_id);
        assert_eq!(first.name, DEFAULT_NAME);
    }

    #[test]
    fn test_resolve_applies_overrides_without_storing_them() {
        let temp_dir = tempdir().unwrap();
        let stored = config_in(temp_dir.path()).create_identity("Alice").unwrap();

        let config = CliConfig {
            user_id: Some("runner-42".to_string()),
            name: Some("Bob".to_string()),
            ..config_in(temp_dir.path())
        };
        let resolved = config.resolve_identity().unwrap();

        assert_eq!(resolved.user_id, "runner-42");
        assert_eq!(resolved.name, "Bob");
        assert_eq!(config.load_identity().unwrap(), stored);
    }
}
