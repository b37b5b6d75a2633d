use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::{Path, PathBuf}, time::Duration};
use tokio::fs;
use tracing::{error, warn};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct KernelConfig {
    pub data_collection_interval_secs: u64,
    pub backup_interval_secs: u64,
    pub data_file: PathBuf,
    pub uvs232_url: String,
    pub log_level: String,
    pub webserver: WebserverConf,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct WebserverConf {
    pub port: u16,
    pub webservices: HashMap<String, bool>, // ex: { version: true, currentdata: true }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),
    #[error("uvs232_url is empty")]
    MissingUrl,
}

impl Default for WebserverConf {
    fn default() -> Self {
        Self {
            port: 4000,
            webservices: HashMap::from([("version".into(), true), ("currentdata".into(), true)]),
        }
    }
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            data_collection_interval_secs: 60,
            backup_interval_secs: 300,
            data_file: PathBuf::from("./data/solar.yaml"),
            // pas d'adresse par défaut : à fournir par le fichier ou SOLAR_UVS232_URL
            uvs232_url: String::new(),
            log_level: "info".into(),
            webserver: WebserverConf::default(),
        }
    }
}

impl KernelConfig {
    pub fn collection_interval(&self) -> Duration {
        Duration::from_secs(self.data_collection_interval_secs)
    }

    pub fn backup_interval(&self) -> Duration {
        Duration::from_secs(self.backup_interval_secs)
    }

    pub fn webservice_enabled(&self, name: &str) -> bool {
        self.webserver.webservices.get(name).copied().unwrap_or(false)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data_collection_interval_secs == 0 {
            return Err(ConfigError::ZeroInterval("data_collection_interval_secs"));
        }
        if self.backup_interval_secs == 0 {
            return Err(ConfigError::ZeroInterval("backup_interval_secs"));
        }
        if self.uvs232_url.trim().is_empty() {
            return Err(ConfigError::MissingUrl);
        }
        Ok(())
    }
}

pub async fn load_config() -> KernelConfig {
    let path = std::env::var("SOLAR_KERNEL_CONFIG").unwrap_or_else(|_| "solar.yaml".into());
    let mut cfg = load_config_from(Path::new(&path)).await;
    if let Ok(url) = std::env::var("SOLAR_UVS232_URL") {
        cfg.uvs232_url = url;
    }
    cfg
}

pub async fn load_config_from(path: &Path) -> KernelConfig {
    if path.exists() {
        let txt = fs::read_to_string(path).await.unwrap_or_default();
        if txt.trim().is_empty() { return KernelConfig::default(); }
        serde_yaml::from_str(&txt).unwrap_or_else(|e| {
            error!("invalid config {}: {e}", path.display());
            KernelConfig::default()
        })
    } else {
        warn!("no {} found, using default config", path.display());
        KernelConfig::default()
    }
}
