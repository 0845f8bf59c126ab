use serde::Deserialize;
use std::path::PathBuf;

use crate::models::Layout;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Recommendation backend base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding the preference snapshot
    #[serde(default = "default_prefs_dir")]
    pub prefs_dir: PathBuf,

    /// Which primary layout (and therefore which surface) this dashboard serves
    #[serde(default)]
    pub layout: Layout,

    /// Locale sent with every recommendation request
    #[serde(default = "default_locale")]
    pub locale: String,
}

fn default_api_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_prefs_dir() -> PathBuf {
    PathBuf::from(".newsflix")
}

fn default_locale() -> String {
    "en-US".to_string()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
