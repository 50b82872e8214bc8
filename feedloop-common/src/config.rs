//! Configuration resolution shared by all feedloop services
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (applied by the caller)

use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolve one setting following the standard priority order.
///
/// Returns `None` when neither the CLI argument, the environment
/// variable, nor the config file provides a value; the caller then
/// applies its compiled default.
pub fn resolve_setting(cli_arg: Option<&str>, env_var_name: &str, file_key: &str) -> Option<String> {
    // Priority 1: Command-line argument
    if let Some(value) = cli_arg {
        return Some(value.to_string());
    }

    // Priority 2: Environment variable
    if let Ok(value) = std::env::var(env_var_name) {
        return Some(value);
    }

    // Priority 3: TOML config file
    if let Some(path) = config_file_path() {
        if let Some(value) = read_config_key(&path, file_key) {
            debug!("Resolved {} from {}", file_key, path.display());
            return Some(value);
        }
    }

    None
}

/// Read one top-level string value from a TOML config file.
///
/// Missing files, unparseable TOML, and absent or non-string keys all
/// resolve to `None` so a broken config file degrades to defaults.
pub fn read_config_key(path: &Path, key: &str) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    let value = toml::from_str::<toml::Value>(&content).ok()?;
    value.get(key).and_then(|v| v.as_str()).map(|s| s.to_string())
}

/// Default configuration file path for the platform
///
/// Linux checks the user config dir first, then /etc/feedloop.
fn config_file_path() -> Option<PathBuf> {
    if cfg!(target_os = "linux") {
        if let Some(user_config) = dirs::config_dir().map(|d| d.join("feedloop").join("config.toml")) {
            if user_config.exists() {
                return Some(user_config);
            }
        }
        let system_config = PathBuf::from("/etc/feedloop/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
        None
    } else {
        dirs::config_dir()
            .map(|d| d.join("feedloop").join("config.toml"))
            .filter(|p| p.exists())
    }
}
