//! Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Default response-length cap when neither flag nor config sets one.
pub const DEFAULT_MAX_TOKENS: u32 = 400;

/// Configuration for quill
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Completion endpoint URL
    pub base_url: Option<String>,
    /// Bearer credential (prefer the QUILL_API_KEY environment variable)
    pub api_key: Option<String>,
    /// Response-length cap
    pub max_tokens: Option<u32>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("quill")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        // Check for QUILL_CONFIG_PATH env var first
        if let Ok(path) = std::env::var("QUILL_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from file
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Warning: Failed to parse config file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    /// Save config to file
    pub fn save(&self) -> std::io::Result<()> {
        let path = Self::config_path();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, content)
    }

    /// Create a default config file if it doesn't exist
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }

        let default_config = Config {
            base_url: Some("https://example.com/v1/chat/completions".to_string()),
            api_key: None,
            max_tokens: Some(DEFAULT_MAX_TOKENS),
        };

        default_config.save()?;
        Ok(path)
    }

    /// Get the endpoint URL, checking config then env
    pub fn get_base_url(&self) -> Option<String> {
        self.base_url
            .clone()
            .or_else(|| std::env::var("QUILL_BASE_URL").ok())
    }

    /// Get the API key, checking config then env
    pub fn get_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("QUILL_API_KEY").ok())
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# quill configuration file
# Place at ~/.config/quill/config.toml (Linux/Mac) or %APPDATA%\quill\config.toml (Windows)

# Completion endpoint URL (can also use the QUILL_BASE_URL environment variable)
base_url = "https://example.com/v1/chat/completions"

# Response-length cap sent with each request
max_tokens = 400

# Bearer credential (optional - prefer the environment variable for security)
# api_key = "sk-..."
# export QUILL_API_KEY=...
"#
}
