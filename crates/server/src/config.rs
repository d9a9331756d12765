use anyhow::Context;
use ledgerlight_import::MerchantMatcher;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "LEDGERLIGHT_CONFIG";
pub const BIND_ENV: &str = "LEDGERLIGHT_BIND";
pub const DATA_DIR_ENV: &str = "LEDGERLIGHT_DATA_DIR";
pub const DEFAULT_CONFIG_FILE: &str = "ledgerlight.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub data_dir: PathBuf,
    /// File name under `data_dir` holding the learned patterns.
    pub learning_cache_file: String,
    /// Bank format used when an upload names none.
    pub default_format: String,
    pub max_upload_bytes: usize,
    /// `[[merchant]]` table replacing the built-in merchants.
    pub merchants_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8085".to_string(),
            data_dir: PathBuf::from("./data"),
            learning_cache_file: "learned_patterns.json".to_string(),
            default_format: "standard".to_string(),
            max_upload_bytes: 5 * 1024 * 1024,
            merchants_file: None,
        }
    }
}

impl ServerConfig {
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Reads `path`, or returns the defaults when it does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content)
                .with_context(|| format!("Invalid config file {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(bind) = var(BIND_ENV).filter(|v| !v.trim().is_empty()) {
            self.bind = bind;
        }
        if let Some(dir) = var(DATA_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let mut config = Self::load(Path::new(&path))?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn merchant_matcher(&self) -> anyhow::Result<MerchantMatcher> {
        let Some(path) = &self.merchants_file else {
            return Ok(MerchantMatcher::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read merchants file {}", path.display()))?;
        MerchantMatcher::from_toml(&content)
            .with_context(|| format!("Invalid merchants file {}", path.display()))
    }
}
