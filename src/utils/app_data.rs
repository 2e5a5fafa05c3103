use crate::output::ColorMode;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "jargon";
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_XML: &str = "data/jargon.xml";
pub const DEFAULT_JSON: &str = "data/jargon.json";

/// User configuration, read from the platform config directory.
/// Command-line flags take precedence over every field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// DocBook source used by `build` and automatic rebuilds
    #[serde(default = "default_xml_path")]
    pub xml_path: PathBuf,

    /// JSON glossary written by `build` and read by lookups
    #[serde(default = "default_json_path")]
    pub json_path: PathBuf,

    #[serde(default)]
    pub color: ColorMode,
}

fn default_xml_path() -> PathBuf {
    PathBuf::from(DEFAULT_XML)
}

fn default_json_path() -> PathBuf {
    PathBuf::from(DEFAULT_JSON)
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            xml_path: default_xml_path(),
            json_path: default_json_path(),
            color: ColorMode::default(),
        }
    }
}

impl AppConfig {
    /// Load config from the config directory, or return default if not found
    pub fn load() -> Result<Self> {
        match get_config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }
}

/// `<config dir>/jargon/config.json`, when the platform has a config dir
pub fn get_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_NAME).join(CONFIG_FILE))
}
