//! Run configuration
//!
//! Paths come from an optional YAML file and can be overridden from the
//! command line:
//!
//! ```yaml
//! installers_dir: ../installers
//! registries_dir: ../registry/installer
//! installer_extension: iss
//! registry_extension: json
//! web_installer_marker: webinstaller
//! ```

use crate::installer::WEB_INSTALLER_MARKER;
use crate::naming::NameMapper;
use crate::{HealthError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default configuration filename looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "installer-health.yml";

/// Characters an extension may not carry: separators and glob syntax
const EXTENSION_FORBIDDEN: [char; 7] = ['.', '/', '\\', '*', '?', '[', ']'];

fn default_installer_extension() -> String {
    "iss".to_string()
}

fn default_registry_extension() -> String {
    "json".to_string()
}

fn default_web_installer_marker() -> String {
    WEB_INSTALLER_MARKER.to_string()
}

/// Inputs of a checker run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Directory holding the installer scripts
    pub installers_dir: PathBuf,
    /// Directory holding the registry descriptors
    pub registries_dir: PathBuf,
    #[serde(default = "default_installer_extension")]
    pub installer_extension: String,
    #[serde(default = "default_registry_extension")]
    pub registry_extension: String,
    /// Substring that marks a filename as a web installer
    #[serde(default = "default_web_installer_marker")]
    pub web_installer_marker: String,
}

impl CheckConfig {
    pub fn new(installers_dir: impl Into<PathBuf>, registries_dir: impl Into<PathBuf>) -> Self {
        Self {
            installers_dir: installers_dir.into(),
            registries_dir: registries_dir.into(),
            installer_extension: default_installer_extension(),
            registry_extension: default_registry_extension(),
            web_installer_marker: default_web_installer_marker(),
        }
    }

    /// Load a YAML configuration file.
    ///
    /// Relative directories are resolved against the file's own directory.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| HealthError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config: CheckConfig =
            serde_yaml_ng::from_str(&contents).map_err(|source| HealthError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;

        if let Some(base) = path.parent() {
            config.installers_dir = resolve_relative(base, &config.installers_dir);
            config.registries_dir = resolve_relative(base, &config.registries_dir);
        }

        debug!("Loaded configuration from {:?}: {:?}", path, config);
        Ok(config)
    }

    /// Look for [`DEFAULT_CONFIG_FILE`] in `dir`; absence is not an error
    pub fn discover(dir: impl AsRef<Path>) -> Result<Option<Self>> {
        let candidate = dir.as_ref().join(DEFAULT_CONFIG_FILE);
        if !candidate.is_file() {
            debug!("No configuration file at {:?}", candidate);
            return Ok(None);
        }

        info!("Using configuration file {:?}", candidate);
        Self::from_file(candidate).map(Some)
    }

    /// Check that both input directories exist and canonicalise them.
    ///
    /// A missing or unreadable directory is a fatal configuration error.
    pub fn validate(&self) -> Result<Self> {
        let installers_dir = canonical_dir("installers", &self.installers_dir)?;
        let registries_dir = canonical_dir("registries", &self.registries_dir)?;

        for (label, extension) in [
            ("installer_extension", &self.installer_extension),
            ("registry_extension", &self.registry_extension),
        ] {
            if extension.is_empty() || extension.contains(EXTENSION_FORBIDDEN) {
                return Err(HealthError::configuration(format!(
                    "{label} must be a bare extension without dots or glob characters (got {extension:?})"
                )));
            }
        }

        if self.web_installer_marker.is_empty() {
            return Err(HealthError::configuration(
                "web_installer_marker must not be empty",
            ));
        }

        Ok(Self {
            installers_dir,
            registries_dir,
            ..self.clone()
        })
    }

    pub fn name_mapper(&self) -> NameMapper {
        NameMapper::new(&self.installer_extension, &self.registry_extension)
    }
}

fn resolve_relative(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn canonical_dir(label: &str, path: &Path) -> Result<PathBuf> {
    let canonical = path.canonicalize().map_err(|e| {
        HealthError::configuration(format!(
            "{} directory {} is not accessible: {}",
            label,
            path.display(),
            e
        ))
    })?;

    if !canonical.is_dir() {
        return Err(HealthError::configuration(format!(
            "{} path is not a directory: {}",
            label,
            canonical.display()
        )));
    }

    Ok(canonical)
}
