use crate::document::parse_selector;
use crate::engine::LocationBanTable;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Selects which entry of the ban table is active.
    #[serde(default = "default_location")]
    pub location: String,

    #[serde(default = "default_user_id")]
    pub user_id: String,

    #[serde(default)]
    pub filter: FilterConfig,

    #[serde(default)]
    pub panel: PanelConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Written to the store on startup when it has no ban table yet.
    #[serde(default)]
    pub seed: LocationBanTable,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FilterConfig {
    #[serde(default = "default_result_selector")]
    pub result_selector: String,
    #[serde(default = "default_link_selector")]
    pub link_selector: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PanelConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_store_backend")]
    pub backend: String,
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_enable")]
    pub enable: bool,
    #[serde(default = "default_log_removed")]
    pub log_removed: bool,
    #[serde(default)]
    pub log_kept: bool,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_filter_log_sinks")]
    pub filter_log_sinks: Vec<String>,
    #[serde(default = "default_memory_capacity")]
    pub memory_capacity: usize,
}

// Defaults
fn default_location() -> String {
    "US".to_string()
}
fn default_user_id() -> String {
    "local".to_string()
}
fn default_result_selector() -> String {
    ".g, .tF2Cxc".to_string()
}
fn default_link_selector() -> String {
    "a[href]".to_string()
}
fn default_page_size() -> usize {
    10
}
fn default_store_backend() -> String {
    "sqlite".to_string()
}
fn default_sqlite_path() -> String {
    "serp-filter.db".to_string()
}
fn default_log_enable() -> bool {
    true
}
fn default_log_removed() -> bool {
    true
}
fn default_log_format() -> String {
    "text".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_filter_log_sinks() -> Vec<String> {
    vec!["console".to_string()]
}
fn default_memory_capacity() -> usize {
    100
}

impl Default for Config {
    fn default() -> Self {
        Self {
            location: default_location(),
            user_id: default_user_id(),
            filter: FilterConfig::default(),
            panel: PanelConfig::default(),
            store: StoreConfig::default(),
            logging: LoggingConfig::default(),
            seed: LocationBanTable::new(),
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            result_selector: default_result_selector(),
            link_selector: default_link_selector(),
        }
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            sqlite_path: default_sqlite_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable: default_log_enable(),
            log_removed: default_log_removed(),
            log_kept: false,
            format: default_log_format(),
            level: default_log_level(),
            filter_log_sinks: default_filter_log_sinks(),
            memory_capacity: default_memory_capacity(),
        }
    }
}

impl Config {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .context("Failed to read config file")?;
        let config = Self::parse(&contents)?;
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        parse_selector(&self.filter.result_selector).context("Invalid filter.result_selector")?;
        parse_selector(&self.filter.link_selector).context("Invalid filter.link_selector")?;
        if self.panel.page_size == 0 {
            anyhow::bail!("panel.page_size must be at least 1");
        }
        match self.store.backend.as_str() {
            "memory" | "sqlite" => Ok(()),
            other => anyhow::bail!("Unknown store backend '{}'", other),
        }
    }
}
