//! Installer scripts and the identity derived from their filenames

use crate::bitsize::Bitsize;
use crate::naming::{base_name, PHP_MARKER};
use crate::{HealthError, Result};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Default filename marker of web installers
pub const WEB_INSTALLER_MARKER: &str = "webinstaller";

/// PHP version encoded as `-php<major><minor>` in an installer filename
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhpVersion {
    pub major: u8,
    pub minor: u8,
}

impl fmt::Display for PhpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Facts about an installer that follow from its filename alone
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallerIdentity {
    pub bitsize: Bitsize,
    pub php_version: Option<PhpVersion>,
    pub is_web_installer: bool,
}

impl InstallerIdentity {
    /// Derive the identity using the default web installer marker
    pub fn from_filename(filename: &str) -> Self {
        Self::from_filename_with_marker(filename, WEB_INSTALLER_MARKER)
    }

    pub fn from_filename_with_marker(filename: &str, web_marker: &str) -> Self {
        let base = base_name(filename);

        let php_version = PHP_MARKER.captures(base).and_then(|caps| {
            let major = caps.get(1)?.as_str().parse().ok()?;
            let minor = caps.get(2)?.as_str().parse().ok()?;
            Some(PhpVersion { major, minor })
        });

        Self {
            bitsize: Bitsize::resolve(base),
            php_version,
            is_web_installer: base.contains(web_marker),
        }
    }
}

/// The literal PHP version an installer filename encodes, if any.
///
/// A `-php` marker is taken verbatim without its leading hyphen, so
/// `full-php7-1-w64.iss` gives `php7-1` as the registry mapping sees it.
/// Otherwise this is the second hyphen-delimited segment of the stem when it
/// starts with a digit (`7.1.3`).
pub fn php_version_literal(filename: &str) -> Option<&str> {
    let base = base_name(filename);
    let stem = match base.rfind('.') {
        Some(idx) if idx > 0 => &base[..idx],
        _ => base,
    };

    if let Some(marker) = PHP_MARKER.find(stem) {
        return Some(&marker.as_str()[1..]);
    }

    stem.split('-')
        .nth(1)
        .filter(|segment| segment.starts_with(|c: char| c.is_ascii_digit()))
}

/// An installer script loaded into memory
#[derive(Debug, Clone)]
pub struct InstallerScript {
    /// Path the script was read from
    pub path: PathBuf,
    /// Base filename, used for all name derivations
    pub file_name: String,
    /// Raw script content
    pub content: String,
    pub identity: InstallerIdentity,
}

impl InstallerScript {
    /// Read an installer script from disk
    pub fn from_file(path: impl AsRef<Path>, web_marker: &str) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&path).map_err(|source| HealthError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(Self::from_content(path, content, web_marker))
    }

    /// Build a script from content already in memory
    pub fn from_content(path: PathBuf, content: String, web_marker: &str) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        let identity = InstallerIdentity::from_filename_with_marker(&file_name, web_marker);

        Self {
            path,
            file_name,
            content,
            identity,
        }
    }

    pub fn is_web_installer(&self) -> bool {
        self.identity.is_web_installer
    }

    pub fn bitsize(&self) -> Bitsize {
        self.identity.bitsize
    }
}
