//! Expected bitsize of an installer, taken from its filename

use serde::Serialize;
use std::fmt;

/// Filename marker for 32-bit installers
const W32_MARKER: &str = "-w32";

/// Target platform width of an installer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Bitsize {
    W32,
    W64,
}

impl Bitsize {
    /// Resolve the bitsize from an installer filename.
    ///
    /// Anything without a `-w32` marker is treated as 64-bit. The installer
    /// content is never consulted; it is checked against this instead.
    pub fn resolve(filename: &str) -> Self {
        if filename.contains(W32_MARKER) {
            Bitsize::W32
        } else {
            Bitsize::W64
        }
    }

    /// Architecture token (`x86` / `x64`) used for 7zip and vcredist paths
    pub fn arch_token(&self) -> &'static str {
        match self {
            Bitsize::W32 => "x86",
            Bitsize::W64 => "x64",
        }
    }

    /// Word token (`w32` / `w64`) used by the BITSIZE define
    pub fn word_token(&self) -> &'static str {
        match self {
            Bitsize::W32 => "w32",
            Bitsize::W64 => "w64",
        }
    }

    pub fn bits(&self) -> u8 {
        match self {
            Bitsize::W32 => 32,
            Bitsize::W64 => 64,
        }
    }
}

impl fmt::Display for Bitsize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.arch_token(), self.word_token())
    }
}
