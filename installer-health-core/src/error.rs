//! Error types for the installer health checks

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while configuring a run or loading its inputs.
///
/// Only [`HealthError::Configuration`] and [`HealthError::ConfigParse`] abort a
/// run. Everything else is caught per installer and turned into a finding.
#[derive(Error, Debug)]
pub enum HealthError {
    /// A required input directory is missing or unusable
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The configuration file exists but is not valid YAML for [`crate::CheckConfig`]
    #[error("Failed to parse configuration file {path}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },

    /// The registry file paired with an installer does not exist
    #[error("Registry file not found: {path}")]
    RegistryNotFound { path: PathBuf },

    /// The registry file is not valid JSON
    #[error("Failed to parse registry file {path}: {source}")]
    RegistryParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The registry file is JSON but a record does not have the expected shape
    #[error("Invalid record #{index} in registry file {path}: {reason}")]
    RegistryShape {
        path: PathBuf,
        index: usize,
        reason: String,
    },

    /// An input file could not be read
    #[error("Failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

impl HealthError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        HealthError::Configuration {
            message: message.into(),
        }
    }

    /// Whether this error must stop the whole run
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            HealthError::Configuration { .. }
                | HealthError::ConfigParse { .. }
                | HealthError::Pattern(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, HealthError>;
