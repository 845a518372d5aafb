///
/// # Tool Configuration
///
/// `sqlbridge.toml` is optional and every key has a default:
///
/// ```toml
/// [storage]
/// data_dir = "/var/lib/myapp"   # relative database paths resolve here
///
/// [runtime]
/// worker_threads = 4            # defaults to available parallelism
///
/// [log]
/// filter = "sqlbridge_sqlite=debug,info"
/// ```
///
/// `RUST_LOG`, when set, takes precedence over `log.filter`.
///

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::errors::ToolError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub storage: StorageConfig,
    pub runtime: RuntimeConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub worker_threads: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("sqlbridge"))
        .unwrap_or_else(|| PathBuf::from("data"))
}

impl BridgeConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, ToolError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path).map_err(|e| ToolError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ToolError> {
        Ok(toml::from_str(content)?)
    }

    pub fn worker_threads(&self) -> usize {
        self.runtime
            .worker_threads
            .filter(|n| *n > 0)
            .or_else(|| std::thread::available_parallelism().ok().map(|n| n.get()))
            .unwrap_or(4)
    }
}
