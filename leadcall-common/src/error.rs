//! Common error types for leadcall

use thiserror::Error;

/// Common result type for leadcall operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors shared by the leadcall crates
#[derive(Error, Debug)]
pub enum Error {
    /// Reading a config file or other local resource failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file exists but is not valid TOML for [`crate::config::TomlConfig`]
    #[error("Config parse error in {path}: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// Configuration is missing a required value or holds an unusable one
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization or other unexpected failure
    #[error("Internal error: {0}")]
    Internal(String),
}
