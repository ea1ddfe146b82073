use crate::config::ScrapeConfig;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Environment variables that override the storage section.
pub const ENV_PATH_ROOT: &str = "FOI_PATH_ROOT";
pub const ENV_ARCHIVE_ROOT: &str = "FOI_ARCHIVE_ROOT";
pub const ENV_STORE_PATH: &str = "FOI_STORE_PATH";

/// Loads a YAML config file, falling back to defaults for missing sections,
/// then applies environment overrides.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ScrapeConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!("Failed to read config file {:?}: {}", path_ref, e));
        }
    };

    let config: ScrapeConfig = if config_content.trim().is_empty() {
        ScrapeConfig::default()
    } else {
        match serde_yaml::from_str(&config_content) {
            Ok(conf) => {
                info!(config_path = ?path_ref, "Parsed config YAML successfully");
                conf
            }
            Err(e) => {
                error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
                return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
            }
        }
    };

    Ok(apply_env_overrides(config))
}

/// Config file if given, otherwise defaults; environment overrides apply either way.
pub fn load_or_default(path: Option<&Path>) -> Result<ScrapeConfig> {
    let config = match path {
        Some(path) => load_config(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => {
            info!("No config file given, using defaults");
            apply_env_overrides(ScrapeConfig::default())
        }
    };
    config.trace_loaded();
    Ok(config)
}

fn apply_env_overrides(mut config: ScrapeConfig) -> ScrapeConfig {
    for (var, target) in [
        (ENV_PATH_ROOT, &mut config.storage.path_root),
        (ENV_ARCHIVE_ROOT, &mut config.storage.archive_root),
        (ENV_STORE_PATH, &mut config.storage.store_path),
    ] {
        if let Ok(value) = std::env::var(var) {
            info!(var, value = %value, "Storage path overridden from env");
            *target = PathBuf::from(value);
        }
    }
    config
}
