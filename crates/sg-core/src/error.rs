//! Error types for sg-core

use thiserror::Error;

/// Core error type for sqlguard
#[derive(Error, Debug)]
pub enum CoreError {
    /// C001: Configuration file not found
    #[error("[C001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// C002: Invalid configuration value
    #[error("[C002] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// C003: Extraction manifest is structurally invalid
    #[error("[C003] Invalid manifest '{path}': {message}")]
    ManifestInvalid { path: String, message: String },

    /// C004: Manifest file has an extension we cannot decode
    #[error("[C004] Unsupported manifest format '{path}': expected .json, .yml or .yaml")]
    UnsupportedManifestFormat { path: String },

    /// C005: IO error
    #[error("[C005] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// C006: IO error with file path context
    #[error("[C006] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// C007: YAML parse error
    #[error("[C007] YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// C008: JSON parse error
    #[error("[C008] JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
