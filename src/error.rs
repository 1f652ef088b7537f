use std::path::PathBuf;

use thiserror::Error;

/// Error type returned by transform and hook functions supplied by the host.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum TransfigError {
    #[error("Invalid schema descriptor: {0}")]
    SchemaInvalid(String),

    #[error("Unknown descriptor key '{key}' (line {line})")]
    UnknownDescriptorKey { key: String, line: usize },

    #[error("Unknown keys in schema descriptor")]
    UnknownDescriptorKeys(Vec<TransfigError>),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Failed to parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid store path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Conflicting tree shape at '{key}': {reason}")]
    InvalidTreeShape { key: String, reason: String },

    #[error("Transform '{name}' aborted at '{key}': {reason}")]
    TransformAborted {
        name: String,
        key: String,
        reason: String,
    },

    #[error("On-use hook '{name}' failed for '{source_path}': {reason}")]
    HookError {
        name: String,
        source_path: String,
        reason: String,
    },

    #[error("Failed to decode value: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Settings error: {0}")]
    ConfigError(#[from] confique::Error),
}
