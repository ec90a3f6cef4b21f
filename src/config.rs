//! Configuration loading (~/.fatetrace/config.json).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::chronicler::ChroniclerConfig;
use crate::fate::ClassifierConfig;

/// Overrides `chronicler.baseUrl`, e.g. to point at a local Chronicler mirror.
pub const BASE_URL_ENV: &str = "FATETRACE_BASE_URL";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub chronicler: ChroniclerConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

/// Get the canonical config file path (~/.fatetrace/config.json)
pub fn config_path() -> Result<PathBuf, String> {
    let home = dirs::home_dir().ok_or("Could not find home directory")?;
    Ok(home.join(".fatetrace").join("config.json"))
}

/// Load configuration from ~/.fatetrace/config.json, then apply environment
/// overrides. A missing file means defaults.
pub fn load_config() -> Result<Config, String> {
    let mut config = load_config_from(&config_path()?)?;
    apply_base_url_override(&mut config, std::env::var(BASE_URL_ENV).ok().as_deref());
    Ok(config)
}

/// Replace `chronicler.baseUrl` with `value` unless it is absent or blank.
pub fn apply_base_url_override(config: &mut Config, value: Option<&str>) {
    let Some(base_url) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return;
    };
    log::info!("Using Chronicler base URL from {}", BASE_URL_ENV);
    config.chronicler.base_url = base_url.to_string();
}

/// Load configuration from an explicit path without environment overrides.
pub fn load_config_from(path: &Path) -> Result<Config, String> {
    if !path.exists() {
        log::debug!("No config at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read config: {}", e))?;

    let config: Config =
        serde_json::from_str(&content).map_err(|e| format!("Failed to parse config: {}", e))?;

    if config.chronicler.page_size == 0 {
        return Err("chronicler.pageSize must be at least 1".to_string());
    }
    if config.chronicler.max_pages == 0 {
        return Err("chronicler.maxPages must be at least 1".to_string());
    }

    Ok(config)
}
