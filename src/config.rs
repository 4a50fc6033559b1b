use serde::Deserialize;

use crate::roster::document::UserId;

pub const CONFIG_ENV: &str = "ROSTER_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "config.json";
pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_DATA_FILE: &str = "data.json";

/// Startup configuration, read once from a JSON file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Senders on this allowlist get the admin command set; everyone else
    /// is a participant.
    pub admins: Vec<UserId>,
    /// Shared transport credential. When set, gateway clients must present
    /// it in the `X-Auth-Token` header.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_data_file")]
    pub data_file: String,
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_data_file() -> String {
    DEFAULT_DATA_FILE.to_string()
}

impl Config {
    pub fn load(path: &str) -> Result<Config, String> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path, e))?;
        serde_json::from_str(&raw).map_err(|e| format!("Failed to parse {}: {}", path, e))
    }

    /// Load from the path in `ROSTER_CONFIG`, falling back to `config.json`.
    pub fn load_from_env() -> Result<Config, String> {
        let path =
            std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load(&path)
    }
}
