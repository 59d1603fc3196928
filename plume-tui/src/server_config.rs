use crate::config::{ConfigManager, ServerConfig};
use anyhow::Result;

pub const SERVER_URL_ENV: &str = "PLUME_API_URL";
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";

/// Server configuration utility for managing the backend base URL
pub struct ServerConfigManager {
    config_manager: ConfigManager,
}

impl ServerConfigManager {
    pub fn new(config_manager: ConfigManager) -> Self {
        Self { config_manager }
    }

    /// Determine the server URL to use based on priority:
    /// 1. CLI argument (highest priority)
    /// 2. Environment variable PLUME_API_URL
    /// 3. Saved configuration file
    /// 4. Local development default
    pub fn determine_server_url(&self, cli_override: Option<String>) -> Result<String> {
        let env = std::env::var(SERVER_URL_ENV).ok();
        let saved = self.config_manager.load_server_config()?;
        Ok(resolve_server_url(cli_override, env, saved))
    }

    /// Remember `server_url` for future runs
    pub fn save_server_url(&self, server_url: String) -> Result<()> {
        let config = ServerConfig {
            server_url,
            last_updated: chrono::Utc::now(),
        };
        self.config_manager.save_server_config(&config)
    }

    /// Short description for the status bar
    pub fn server_description(current_url: &str) -> &'static str {
        if current_url == DEFAULT_SERVER_URL {
            "Local Development Server (default)"
        } else if current_url.contains("localhost") || current_url.contains("127.0.0.1") {
            "Local Development Server (custom)"
        } else {
            "Custom Server"
        }
    }
}

fn resolve_server_url(
    cli_override: Option<String>,
    env: Option<String>,
    saved: Option<ServerConfig>,
) -> String {
    let non_blank = |url: &String| !url.trim().is_empty();

    cli_override
        .filter(non_blank)
        .or_else(|| env.filter(non_blank))
        .or_else(|| saved.map(|config| config.server_url).filter(non_blank))
        .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string())
        .trim()
        .trim_end_matches('/')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn saved(url: &str) -> Option<ServerConfig> {
        Some(ServerConfig {
            server_url: url.to_string(),
            last_updated: chrono::Utc::now(),
        })
    }

    #[test]
    fn test_cli_override_priority() {
        let url = resolve_server_url(
            Some("http://cli:8000".to_string()),
            Some("http://env:8000".to_string()),
            saved("http://file:8000"),
        );
        assert_eq!(url, "http://cli:8000");
    }

    #[test]
    fn test_env_beats_saved_file() {
        let url = resolve_server_url(None, Some("http://env:8000/".to_string()), saved("http://file:8000"));
        assert_eq!(url, "http://env:8000");
    }

    #[test]
    fn test_saved_file_then_default() {
        assert_eq!(
            resolve_server_url(None, None, saved("http://file:8000")),
            "http://file:8000"
        );
        assert_eq!(resolve_server_url(None, Some("  ".to_string()), None), DEFAULT_SERVER_URL);
    }

    #[test]
    fn test_saved_url_is_used_on_next_run() {
        let dir = TempDir::new().unwrap();
        let manager = ServerConfigManager::new(ConfigManager::with_dir(dir.path()).unwrap());
        manager.save_server_url("http://saved:9000".to_string()).unwrap();

        let loaded = manager.config_manager.load_server_config().unwrap();
        assert_eq!(resolve_server_url(None, None, loaded), "http://saved:9000");
    }

    #[test]
    fn test_server_description() {
        assert_eq!(
            ServerConfigManager::server_description(DEFAULT_SERVER_URL),
            "Local Development Server (default)"
        );
        assert_eq!(
            ServerConfigManager::server_description("http://localhost:3000"),
            "Local Development Server (custom)"
        );
        assert_eq!(
            ServerConfigManager::server_description("https://plume.example.com"),
            "Custom Server"
        );
    }
}
