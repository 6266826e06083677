//! Server configuration

use anyhow::{Context, Result};
use engine_lib::DurationSubCategory;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Server configuration, read from `RIGHTSIZER_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Name attached to structured log events
    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    /// Port for the summarize, health and metrics endpoints
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// JSON workload document; the server starts empty without one
    #[serde(default)]
    pub data_path: Option<PathBuf>,

    /// Duration sub-categories as `name:days,name:days`
    #[serde(default = "default_sub_categories")]
    pub sub_categories: String,
}

fn default_instance_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "rightsizer".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_sub_categories() -> String {
    "short_term:1,medium_term:7,long_term:15".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            instance_name: default_instance_name(),
            api_port: default_api_port(),
            data_path: None,
            sub_categories: default_sub_categories(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the process environment
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, reading variables from `env` instead of the process when given
    pub fn load_from(env: Option<HashMap<String, String>>) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("RIGHTSIZER")
                    .try_parsing(true)
                    .source(env),
            )
            .build()
            .context("Failed to read RIGHTSIZER_* environment")?;

        let loaded: ServerConfig = config
            .try_deserialize()
            .context("Invalid RIGHTSIZER_* configuration")?;
        loaded.duration_sub_categories()?;
        Ok(loaded)
    }

    pub fn duration_sub_categories(&self) -> Result<Vec<DurationSubCategory>> {
        DurationSubCategory::parse_list(&self.sub_categories)
            .context("Invalid RIGHTSIZER_SUB_CATEGORIES")
    }
}
