use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ShelfConfig {
    pub goodreads: GoodreadsConfig,
    pub sources: SourceConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoodreadsConfig {
    pub base_url: String,
    pub user_id: String,
    pub profile_url: String,
}

/// Where the client looks for shelf data, in fallback order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Managed backend exposing `/goodreads`. Tried first when set.
    pub backend_url: Option<String>,
    pub is_development: bool,
    pub dev_proxy_base: String,
    pub cors_relay_url: Option<String>,
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub cache_max_age_seconds: u64,
    pub default_limit: usize,
    pub max_limit: usize,
    pub max_page_size: usize,
}

impl Default for GoodreadsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.goodreads.com".into(),
            user_id: "195680955".into(),
            profile_url: "https://www.goodreads.com/user/show/195680955-aryan-singhal".into(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            backend_url: None,
            is_development: false,
            dev_proxy_base: "http://localhost:5173/dev/goodreads".into(),
            cors_relay_url: Some("https://api.allorigins.win/raw".into()),
            request_timeout_seconds: 10,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8787".into(),
            cache_max_age_seconds: 600,
            default_limit: 24,
            max_limit: 40,
            max_page_size: 60,
        }
    }
}

impl SourceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl ShelfConfig {
    /// Default location of the configuration file.
    pub fn config_file_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_dir = dirs::config_dir().ok_or("no configuration directory on this platform")?;
        Ok(config_dir.join("goodreads-shelf").join("config.json"))
    }

    /// Loads the default config file, falling back to defaults.
    pub fn load() -> Self {
        match Self::config_file_path() {
            Ok(path) => Self::load_or_init(&path),
            Err(e) => {
                warn!(error = %e, "cannot locate config file, using defaults");
                Self::default()
            }
        }
    }

    /// Reads `path`, writing defaults there only when the file is missing.
    /// An unreadable or malformed file is left untouched.
    pub fn load_or_init(path: &Path) -> Self {
        if !path.exists() {
            let default_config = Self::default();
            match default_config.save_to(path) {
                Ok(()) => info!(path = %path.display(), "wrote default config"),
                Err(e) => warn!(error = %e, "failed to write default config"),
            }
            return default_config;
        }
        match Self::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, path = %path.display(), "failed to load config, using defaults");
                Self::default()
            }
        }
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: ShelfConfig = serde_json::from_str(&content)?;
        info!(path = %path.as_ref().display(), "loaded config");
        Ok(config)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
