//! Registry descriptor loading
//!
//! A registry file lists the components one installer bundles. The top level
//! is an array of records, each record an array of at least four scalars:
//!
//! ```json
//! [
//!   ["nginx", "https://wpn-xm.org/get.php?s=nginx", "nginx.zip", "1.13.1"],
//!   ["phpext-xdebug-x64", "https://...", "phpext_xdebug.zip", "2.5.5", "x64"]
//! ]
//! ```
//!
//! Trailing fields after the version are kept in [`ComponentRecord::extra`].

use crate::naming::canonical_identifier;
use crate::{HealthError, Result};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Number of leading fields every record must carry
const REQUIRED_FIELDS: usize = 4;

/// One component entry of a registry file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentRecord {
    /// Software name as recorded, possibly with a `-x64`/`-x86` suffix
    pub software_name: String,
    pub download_url: String,
    /// Filename the download is stored under
    pub downloaded_filename: String,
    pub version: String,
    /// Optional trailing flags, preserved as-is
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<Value>,
}

impl ComponentRecord {
    /// Identifier this component is referenced by inside installer content
    pub fn canonical_identifier(&self) -> String {
        canonical_identifier(&self.software_name)
    }

    fn from_value(path: &Path, index: usize, value: &Value) -> Result<Self> {
        let shape_error = |reason: String| HealthError::RegistryShape {
            path: path.to_path_buf(),
            index,
            reason,
        };

        let fields = value
            .as_array()
            .ok_or_else(|| shape_error(format!("expected an array, found {}", kind_of(value))))?;

        if fields.len() < REQUIRED_FIELDS {
            return Err(shape_error(format!(
                "expected at least {} fields, found {}",
                REQUIRED_FIELDS,
                fields.len()
            )));
        }

        let scalar = |position: usize| -> Result<String> {
            match &fields[position] {
                Value::String(s) => Ok(s.clone()),
                Value::Number(n) => Ok(n.to_string()),
                other => Err(shape_error(format!(
                    "field {} must be a string, found {}",
                    position,
                    kind_of(other)
                ))),
            }
        };

        Ok(Self {
            software_name: scalar(0)?,
            download_url: scalar(1)?,
            downloaded_filename: scalar(2)?,
            version: scalar(3)?,
            extra: fields[REQUIRED_FIELDS..].to_vec(),
        })
    }
}

/// Parsed content of one registry file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistryDescriptor {
    pub path: PathBuf,
    pub components: Vec<ComponentRecord>,
}

impl RegistryDescriptor {
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Parse registry content already in memory
    pub fn from_json(path: impl Into<PathBuf>, contents: &str) -> Result<Self> {
        let path = path.into();
        let document: Value =
            serde_json::from_str(contents).map_err(|source| HealthError::RegistryParse {
                path: path.clone(),
                source,
            })?;

        // Objects keyed by component index are accepted as well.
        let records: Vec<&Value> = match &document {
            Value::Array(items) => items.iter().collect(),
            Value::Object(map) => map.values().collect(),
            other => {
                return Err(HealthError::RegistryShape {
                    path,
                    index: 0,
                    reason: format!("expected an array of records, found {}", kind_of(other)),
                })
            }
        };

        let components = records
            .into_iter()
            .enumerate()
            .map(|(index, value)| ComponentRecord::from_value(&path, index, value))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { path, components })
    }
}

/// Reads registry files from disk
pub struct RegistryLoader;

impl RegistryLoader {
    /// Load and parse the registry at `path`.
    ///
    /// Fails with [`HealthError::RegistryNotFound`] when the file is absent and
    /// with [`HealthError::RegistryParse`] / [`HealthError::RegistryShape`]
    /// when its content is malformed.
    pub fn load(path: impl AsRef<Path>) -> Result<RegistryDescriptor> {
        let path = path.as_ref();

        if !path.is_file() {
            return Err(HealthError::RegistryNotFound {
                path: path.to_path_buf(),
            });
        }

        let contents = std::fs::read_to_string(path).map_err(|source| HealthError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let descriptor = RegistryDescriptor::from_json(path, &contents)?;
        debug!(
            "Loaded registry {:?} with {} components",
            path,
            descriptor.len()
        );
        Ok(descriptor)
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_parse_records() {
        let contents = r#"[
            ["nginx", "https://example.org/nginx.zip", "nginx.zip", "1.13.1"],
            ["mariadb-x64", "https://example.org/mariadb.zip", "mariadb.zip", "10.2.6", "x64", true]
        ]"#;

        let registry = RegistryDescriptor::from_json("full-w64.json", contents).unwrap();
        assert_eq!(registry.len(), 2);

        let mariadb = &registry.components[1];
        assert_eq!(mariadb.software_name, "mariadb-x64");
        assert_eq!(mariadb.downloaded_filename, "mariadb.zip");
        assert_eq!(mariadb.version, "10.2.6");
        assert_eq!(mariadb.extra, vec![json!("x64"), json!(true)]);
        assert_eq!(mariadb.canonical_identifier(), "mariadb");
    }

    #[test]
    fn test_numeric_version_is_accepted() {
        let contents = r#"[["node", "https://example.org/node.zip", "node.zip", 8]]"#;
        let registry = RegistryDescriptor::from_json("r.json", contents).unwrap();
        assert_eq!(registry.components[0].version, "8");
    }

    #[test]
    fn test_object_keyed_by_index() {
        let contents = r#"{"0": ["php", "https://example.org/php.zip", "php.zip", "7.1.6"]}"#;
        let registry = RegistryDescriptor::from_json("r.json", contents).unwrap();
        assert_eq!(registry.components[0].software_name, "php");
    }

    #[test]
    fn test_empty_registry() {
        let registry = RegistryDescriptor::from_json("r.json", "[]").unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_invalid_json() {
        let result = RegistryDescriptor::from_json("r.json", "[[\"nginx\",");
        assert!(matches!(result, Err(HealthError::RegistryParse { .. })));
    }

    #[test]
    fn test_short_record() {
        let result = RegistryDescriptor::from_json("r.json", r#"[["nginx", "url", "nginx.zip"]]"#);
        match result {
            Err(HealthError::RegistryShape { index, reason, .. }) => {
                assert_eq!(index, 0);
                assert!(reason.contains("at least 4 fields"));
            }
            other => panic!("Expected shape error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_scalar_field() {
        let result =
            RegistryDescriptor::from_json("r.json", r#"[["nginx", "url", ["nginx.zip"], "1.0"]]"#);
        assert!(matches!(result, Err(HealthError::RegistryShape { .. })));
    }

    #[test]
    fn test_top_level_scalar() {
        let result = RegistryDescriptor::from_json("r.json", "42");
        assert!(matches!(result, Err(HealthError::RegistryShape { .. })));
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = RegistryLoader::load(temp_dir.path().join("missing.json"));
        assert!(matches!(result, Err(HealthError::RegistryNotFound { .. })));
    }

    #[test]
    fn test_load_from_disk() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("full-w64.json");
        std::fs::write(
            &path,
            r#"[["gogs", "https://example.org/gogs.zip", "gogs.zip", "0.11"]]"#,
        )
        .unwrap();

        let registry = RegistryLoader::load(&path).unwrap();
        assert_eq!(registry.path, path);
        assert_eq!(registry.components[0].canonical_identifier(), "gogs");
    }
}
