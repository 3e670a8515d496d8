use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_LEDGER_PATH: &str = "results.csv";
const DEFAULT_API_ADDR: &str = "127.0.0.1:5001";
const DEFAULT_DETECTOR: &str = "stub";
const DEFAULT_RECOGNIZER: &str = "stub";

#[derive(Debug, Deserialize, Default)]
struct ServiceConfigFile {
    ledger_path: Option<String>,
    api: Option<ApiConfigFile>,
    models: Option<ModelConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct ApiConfigFile {
    addr: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ModelConfigFile {
    detector: Option<String>,
    recognizer: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub ledger_path: String,
    pub api_addr: String,
    pub detector: String,
    pub recognizer: String,
}

impl ServiceConfig {
    /// Loads the optional JSON config file named by `PLATELOG_CONFIG`, then
    /// applies `PLATELOG_*` environment overrides, then validates.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("PLATELOG_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env();
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: ServiceConfigFile) -> Self {
        Self {
            ledger_path: file
                .ledger_path
                .unwrap_or_else(|| DEFAULT_LEDGER_PATH.to_string()),
            api_addr: file
                .api
                .and_then(|api| api.addr)
                .unwrap_or_else(|| DEFAULT_API_ADDR.to_string()),
            detector: file
                .models
                .as_ref()
                .and_then(|models| models.detector.clone())
                .unwrap_or_else(|| DEFAULT_DETECTOR.to_string()),
            recognizer: file
                .models
                .and_then(|models| models.recognizer)
                .unwrap_or_else(|| DEFAULT_RECOGNIZER.to_string()),
        }
    }

    fn apply_env(&mut self) {
        if let Ok(path) = std::env::var("PLATELOG_LEDGER_PATH") {
            if !path.trim().is_empty() {
                self.ledger_path = path;
            }
        }
        if let Ok(addr) = std::env::var("PLATELOG_API_ADDR") {
            if !addr.trim().is_empty() {
                self.api_addr = addr;
            }
        }
        if let Ok(name) = std::env::var("PLATELOG_DETECTOR") {
            if !name.trim().is_empty() {
                self.detector = name;
            }
        }
        if let Ok(name) = std::env::var("PLATELOG_RECOGNIZER") {
            if !name.trim().is_empty() {
                self.recognizer = name;
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.ledger_path.trim().is_empty() {
            return Err(anyhow!("ledger_path must not be empty"));
        }
        self.api_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|_| anyhow!("api addr '{}' is not a socket address", self.api_addr))?;
        Ok(())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::from_file(ServiceConfigFile::default())
    }
}

fn read_config_file(path: &Path) -> Result<ServiceConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
