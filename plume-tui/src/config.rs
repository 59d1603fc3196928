use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Server configuration stored locally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub server_url: String,
    pub last_updated: chrono::DateTime<chrono::Utc>,
}

/// Manages the `~/.plume` directory: server config, durable session storage
/// and the log file all live under it.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a config manager rooted at `~/.plume`
    pub fn new() -> Result<Self> {
        Self::with_dir(Self::default_config_dir()?)
    }

    /// Create a config manager rooted at `config_dir`, creating it if needed
    pub fn with_dir(config_dir: impl Into<PathBuf>) -> Result<Self> {
        let config_dir = config_dir.into();
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir).with_context(|| {
                format!("Failed to create config directory {}", config_dir.display())
            })?;
        }
        Ok(Self { config_dir })
    }

    /// Get the `.plume` configuration directory path
    pub fn default_config_dir() -> Result<PathBuf> {
        let home_dir = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home_dir.join(".plume"))
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Directory backing `FileStorage` unless overridden on the command line
    pub fn storage_dir(&self) -> PathBuf {
        self.config_dir.join("storage")
    }

    fn server_config_file(&self) -> PathBuf {
        self.config_dir.join("server_config.json")
    }

    /// Save server configuration
    pub fn save_server_config(&self, config: &ServerConfig) -> Result<()> {
        let json =
            serde_json::to_string_pretty(config).context("Failed to serialize server config")?;
        fs::write(self.server_config_file(), json).context("Failed to write server config file")?;
        Ok(())
    }

    /// Load server configuration, `None` when nothing was saved yet
    pub fn load_server_config(&self) -> Result<Option<ServerConfig>> {
        let config_file = self.server_config_file();
        if !config_file.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&config_file).context("Failed to read server config file")?;
        let config: ServerConfig =
            serde_json::from_str(&json).context("Failed to parse server config")?;
        Ok(Some(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_server_config_round_trip() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_dir(dir.path().join(".plume")).unwrap();

        assert_eq!(manager.load_server_config().unwrap(), None);

        let config = ServerConfig {
            server_url: "http://10.0.0.2:8000".to_string(),
            last_updated: chrono::Utc::now(),
        };
        manager.save_server_config(&config).unwrap();

        assert_eq!(manager.load_server_config().unwrap(), Some(config));
    }

    #[test]
    fn test_corrupted_server_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_dir(dir.path()).unwrap();
        fs::write(dir.path().join("server_config.json"), "{not json").unwrap();

        assert!(manager.load_server_config().is_err());
    }

    #[test]
    fn test_storage_dir_lives_under_config_dir() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_dir(dir.path()).unwrap();
        assert_eq!(manager.storage_dir(), dir.path().join("storage"));
    }
}
