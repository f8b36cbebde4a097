//! Configuration types and parsing for sqlguard.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Project configuration from sqlguard.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// SQL dialect used to parse generated queries
    #[serde(default)]
    pub dialect: Dialect,

    /// Glob patterns locating extraction manifests, relative to the project directory
    #[serde(default = "default_manifest_paths")]
    pub manifest_paths: Vec<String>,

    /// Sentinel column name substituted for update-spread expressions
    #[serde(default = "default_spread_update_column")]
    pub spread_update_column: String,

    /// Analysis diagnostic configuration
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// SQL dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// PostgreSQL; unquoted identifiers fold to lower case
    #[default]
    Postgres,
    /// Generic ANSI-ish SQL; identifiers are matched as written
    Generic,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Postgres => write!(f, "postgres"),
            Dialect::Generic => write!(f, "generic"),
        }
    }
}

/// Severity level for diagnostic overrides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSeverity {
    Info,
    Warning,
    Error,
    /// Suppress the diagnostic entirely
    Off,
}

/// Analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Override default severities for specific diagnostic codes.
    ///
    /// Keys are diagnostic code strings (e.g. "SG003").
    /// Values are severity levels: info, warning, error, or off.
    #[serde(default)]
    pub severity_overrides: HashMap<String, ConfigSeverity>,
}

/// Diagnostic codes that can be overridden in `analysis.severity_overrides`
pub const VALID_DIAGNOSTIC_CODES: &[&str] = &[
    "SG001", "SG002", "SG003", "SG004", "SG005", "SG006", "SG007", "SG008", "SG009", "SG010",
];

/// Default sentinel column for update-spread placeholders
pub const DEFAULT_SPREAD_UPDATE_COLUMN: &str = "__sqlguard_spread_update__";

/// Config file names looked up in a project directory, in order
pub const CONFIG_FILE_NAMES: &[&str] = &["sqlguard.yml", "sqlguard.yaml"];

fn default_manifest_paths() -> Vec<String> {
    vec!["sqlguard/**/*.json".to_string()]
}

fn default_spread_update_column() -> String {
    DEFAULT_SPREAD_UPDATE_COLUMN.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            manifest_paths: default_manifest_paths(),
            spread_update_column: default_spread_update_column(),
            analysis: AnalysisConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory.
    /// Looks for sqlguard.yml or sqlguard.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        match Self::find_in_dir(dir) {
            Some(path) => Self::load(&path),
            None => Err(CoreError::ConfigNotFound {
                path: dir.join(CONFIG_FILE_NAMES[0]).display().to_string(),
            }),
        }
    }

    /// Load configuration from a project directory, falling back to defaults
    /// when no config file exists
    pub fn load_or_default(dir: &Path) -> CoreResult<Self> {
        match Self::find_in_dir(dir) {
            Some(path) => Self::load(&path),
            None => {
                log::debug!("No config file in {}, using defaults", dir.display());
                Ok(Self::default())
            }
        }
    }

    fn find_in_dir(dir: &Path) -> Option<std::path::PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        if self.spread_update_column.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "spread_update_column cannot be empty".to_string(),
            });
        }

        if self.spread_update_column.contains('"') {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "spread_update_column '{}' must not contain double quotes",
                    self.spread_update_column
                ),
            });
        }

        for code in self.analysis.severity_overrides.keys() {
            if !VALID_DIAGNOSTIC_CODES.contains(&code.as_str()) {
                return Err(CoreError::ConfigInvalid {
                    message: format!(
                        "Unknown diagnostic code '{}' in analysis.severity_overrides. Valid codes: {}",
                        code,
                        VALID_DIAGNOSTIC_CODES.join(", ")
                    ),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
