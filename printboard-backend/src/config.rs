/// Configuration for the Printboard backend.
/// Reads backend.json from ~/.config/printboard/backend.json (or platform equivalent).
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Where the board snapshot and sync settings live. Defaults to a
    /// `data` directory next to the config file.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

fn default_port() -> u16 {
    8080
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_bind_address(),
            data_dir: None,
        }
    }
}

impl BackendConfig {
    pub fn resolve_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| app_dir().join("data"))
    }
}

fn app_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("printboard")
}

/// Default config path: ~/.config/printboard/backend.json
pub fn default_config_path() -> PathBuf {
    app_dir().join("backend.json")
}

/// Default log file: ~/.config/printboard/logs/backend.log
pub fn default_log_path() -> PathBuf {
    app_dir().join("logs").join("backend.log")
}

/// Load config from path. Returns default if the file doesn't exist or
/// can't be parsed.
pub fn load_config(path: &Path) -> BackendConfig {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!(
                "[printboard.config] Failed to parse config {}: {}",
                path.display(),
                e
            );
            BackendConfig::default()
        }),
        Err(_) => {
            log::info!(
                "[printboard.config] No config at {}, using defaults",
                path.display()
            );
            BackendConfig::default()
        }
    }
}
