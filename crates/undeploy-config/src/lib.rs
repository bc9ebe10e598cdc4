pub mod config;
pub mod error;
pub mod outputs;

pub use config::{Config, DeployerSettings};
pub use error::*;
pub use outputs::JsonOutputs;

use std::path::PathBuf;

/// Environment variable naming the config file directly
pub const CONFIG_PATH_ENV: &str = "UNDEPLOY_CONFIG_PATH";

const CANDIDATES: [&str; 3] = ["undeploy.local.yml", "undeploy.yml", ".undeploy.yml"];

/// Directory holding the global config, `~/.config/undeploy`
pub fn get_config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("undeploy"))
}

/// Find the config file
///
/// Search order:
/// 1. `UNDEPLOY_CONFIG_PATH`
/// 2. current directory: undeploy.local.yml, undeploy.yml, .undeploy.yml
/// 3. ~/.config/undeploy/config.yml
pub fn find_config_file() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!("{} points at missing file {}", CONFIG_PATH_ENV, path.display());
    }

    let current_dir = std::env::current_dir()?;
    for filename in &CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    if let Ok(config_dir) = get_config_dir() {
        let global_config = config_dir.join("config.yml");
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::ConfigFileNotFound)
}
