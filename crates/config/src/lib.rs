// Configuration loading

pub mod env;
pub mod settings;

use std::path::PathBuf;

use thiserror::Error;

pub use env::EnvOverrides;
pub use settings::{
    CompareSettings, GatewaySettings, LoadedSettings, ReportSettings, Settings, WorkbookSettings,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("cannot render config: {0}")]
    Encode(#[from] toml::ser::Error),
}
