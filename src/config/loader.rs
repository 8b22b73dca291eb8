//! Configuration file discovery, loading and environment overrides.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::schema::ChainConfig;
use crate::config::validator::validate;
use crate::error::{ChainError, Result};

/// File name looked up in the project root.
pub const CONFIG_FILE_NAME: &str = ".testchain.yml";

/// Overrides `barrier.poll_interval_ms`.
pub const ENV_POLL_INTERVAL_MS: &str = "TESTCHAIN_POLL_INTERVAL_MS";
/// Overrides `barrier.wait_timeout_secs`.
pub const ENV_WAIT_TIMEOUT_SECS: &str = "TESTCHAIN_WAIT_TIMEOUT_SECS";
/// Overrides `steps.deadline_ms`.
pub const ENV_STEP_DEADLINE_MS: &str = "TESTCHAIN_STEP_DEADLINE_MS";

/// Find the config file for a project root, if present.
pub fn find_config(project_root: &Path) -> Option<PathBuf> {
    let path = project_root.join(CONFIG_FILE_NAME);
    if path.is_file() {
        Some(path)
    } else {
        None
    }
}

/// Parse YAML content into a [`ChainConfig`].
///
/// `source_path` is only used for error reporting. Empty content yields the
/// defaults.
pub fn parse_config(content: &str, source_path: &Path) -> Result<ChainConfig> {
    if content.trim().is_empty() {
        return Ok(ChainConfig::default());
    }
    serde_yaml::from_str(content).map_err(|e| ChainError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load a single config file.
///
/// # Errors
///
/// Returns `Io` if the file cannot be read.
/// Returns `ConfigParseError` if the YAML is invalid.
pub fn load_config_file(path: &Path) -> Result<ChainConfig> {
    let content = fs::read_to_string(path)?;
    parse_config(&content, path)
}

/// Apply environment overrides using `lookup` to read variables.
///
/// Unset or empty variables leave the value alone.
pub fn apply_env_overrides<F>(config: &mut ChainConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(ms) = read_u64(&lookup, ENV_POLL_INTERVAL_MS)? {
        config.barrier.poll_interval_ms = ms;
    }
    if let Some(secs) = read_u64(&lookup, ENV_WAIT_TIMEOUT_SECS)? {
        config.barrier.wait_timeout_secs = secs;
    }
    if let Some(ms) = read_u64(&lookup, ENV_STEP_DEADLINE_MS)? {
        config.steps.deadline_ms = Some(ms);
    }
    Ok(())
}

fn read_u64<F>(lookup: &F, var: &str) -> Result<Option<u64>>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(var).filter(|v| !v.trim().is_empty()) else {
        return Ok(None);
    };
    let value: u64 = raw
        .trim()
        .parse()
        .map_err(|_| ChainError::ConfigValidationError {
            message: format!("{} must be a non-negative integer, got '{}'", var, raw),
        })?;
    debug!("Config override from {}: {}", var, value);
    Ok(Some(value))
}

/// Load the effective configuration.
///
/// Reads `config_override` if given, otherwise `.testchain.yml` in
/// `project_root` when it exists, otherwise starts from defaults. Process
/// environment overrides are applied last, then the result is validated.
pub fn load_config(project_root: &Path, config_override: Option<&Path>) -> Result<ChainConfig> {
    load_config_with_env(project_root, config_override, |var| std::env::var(var).ok())
}

/// [`load_config`] with an explicit environment lookup.
pub fn load_config_with_env<F>(
    project_root: &Path,
    config_override: Option<&Path>,
    lookup: F,
) -> Result<ChainConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let path = match config_override {
        Some(path) => Some(path.to_path_buf()),
        None => find_config(project_root),
    };

    let mut config = match &path {
        Some(path) => {
            debug!("Loading config from {}", path.display());
            load_config_file(path)?
        }
        None => {
            debug!("No config file found, using defaults");
            ChainConfig::default()
        }
    };

    apply_env_overrides(&mut config, lookup)?;
    validate(&config)?;
    Ok(config)
}
