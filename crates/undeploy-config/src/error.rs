use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config directory not found")]
    ConfigDirNotFound,

    #[error(
        "Config file not found. Looked in:\n\
        - UNDEPLOY_CONFIG_PATH\n\
        - current directory: undeploy.local.yml, undeploy.yml, .undeploy.yml\n\
        - ~/.config/undeploy/config.yml"
    )]
    ConfigFileNotFound,

    #[error("Invalid config {path}: {message}")]
    Invalid { path: String, message: String },

    #[error("Failed to read outputs {path}: {message}")]
    Outputs { path: String, message: String },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
