//! Content rules for installer scripts
//!
//! These are literal substring and pattern checks, not a parse of the
//! installer grammar. Define lines must match byte for byte, including the
//! padding that aligns the quoted value.

use super::ContentRule;
use crate::bitsize::Bitsize;
use crate::installer::{php_version_literal, InstallerScript};
use crate::report::{CheckCategory, Finding};
use once_cell::sync::Lazy;
use regex::Regex;

/// Width the define name is padded to, so values start in the same column
const DEFINE_NAME_WIDTH: usize = 21;

/// Installers that download components bundle fewer redistributables
pub const WEB_INSTALLER_VCREDIST_COUNT: usize = 2;
pub const FULL_INSTALLER_VCREDIST_COUNT: usize = 3;

static PHP_VERSION_DEFINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?m)^\s*#define\s+PHP_VERSION\s+"([^"]*)""#).unwrap());
static BITSIZE_DEFINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?m)^\s*#define\s+BITSIZE\s+"([^"]*)""#).unwrap());
static VCREDIST_X86: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?mi)vcredist_x86_\d+").unwrap());
static VCREDIST_X64: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?mi)vcredist_x64_\d+").unwrap());

/// `#define NAME                 "value"` in the fixed-column layout
pub fn define_line(name: &str, value: &str) -> String {
    format!(
        "#define {:<width$}\"{}\"",
        name,
        value,
        width = DEFINE_NAME_WIDTH
    )
}

/// `Source: ..\bin\7zip\<arch>`
pub fn seven_zip_source(bitsize: Bitsize) -> String {
    format!(r"Source: ..\bin\7zip\{}", bitsize.arch_token())
}

/// Number of `vcredist_<arch>_<digits>` occurrences, case-insensitive
pub fn count_vcredist(content: &str, bitsize: Bitsize) -> usize {
    let pattern = match bitsize {
        Bitsize::W32 => &*VCREDIST_X86,
        Bitsize::W64 => &*VCREDIST_X64,
    };
    pattern.find_iter(content).count()
}

/// Shared handling of the `#define NAME "value"` rules: an exact line is
/// fine, a define with another value is invalid, no define at all is missing.
fn check_define(
    script: &InstallerScript,
    category: CheckCategory,
    name: &str,
    pattern: &Regex,
    expected: &str,
) -> Option<Finding> {
    let line = define_line(name, expected);
    if script.content.contains(&line) {
        return None;
    }

    let finding = match pattern.captures(&script.content) {
        Some(caps) if &caps[1] != expected => Finding::invalid(
            category,
            &script.path,
            format!("Wrong \"#define {name}\": found \"{}\", expected \"{expected}\".", &caps[1]),
        ),
        Some(_) => Finding::invalid(
            category,
            &script.path,
            format!("Misaligned \"#define {name}\", value must start at the fixed column."),
        ),
        None => Finding::missing(category, &script.path, format!("Missing \"#define {name}\".")),
    };

    Some(finding.with_suggestion(line))
}

/// Rule: PHP_VERSION define carries the version encoded in the filename
pub struct PhpVersionDefineRule;

impl ContentRule for PhpVersionDefineRule {
    fn category(&self) -> CheckCategory {
        CheckCategory::PhpVersionDefine
    }

    fn description(&self) -> &'static str {
        "    => Check PHP_VERSION define entry: \"#define PHP_VERSION\""
    }

    fn check(&self, script: &InstallerScript) -> Vec<Finding> {
        // Installers without a version in their name have nothing to match.
        let Some(version) = php_version_literal(&script.file_name) else {
            return Vec::new();
        };

        check_define(
            script,
            self.category(),
            "PHP_VERSION",
            &PHP_VERSION_DEFINE,
            version,
        )
        .into_iter()
        .collect()
    }
}

/// Rule: BITSIZE define carries the word token of the filename's bitsize
pub struct BitsizeDefineRule;

impl ContentRule for BitsizeDefineRule {
    fn category(&self) -> CheckCategory {
        CheckCategory::BitsizeDefine
    }

    fn description(&self) -> &'static str {
        "    => Check bitsize define entry: \"#define BITSIZE\""
    }

    fn check(&self, script: &InstallerScript) -> Vec<Finding> {
        check_define(
            script,
            self.category(),
            "BITSIZE",
            &BITSIZE_DEFINE,
            script.bitsize().word_token(),
        )
        .into_iter()
        .collect()
    }
}

/// Rule: the bundled 7zip matches the installer's architecture
pub struct SevenZipBitsizeRule;

impl ContentRule for SevenZipBitsizeRule {
    fn category(&self) -> CheckCategory {
        CheckCategory::SevenZipBitsize
    }

    fn description(&self) -> &'static str {
        "    => Check using correct bitsize of 7zip:"
    }

    fn check(&self, script: &InstallerScript) -> Vec<Finding> {
        let bitsize = script.bitsize();
        let expected = seven_zip_source(bitsize);
        if script.content.contains(&expected) {
            return Vec::new();
        }

        let other = match bitsize {
            Bitsize::W32 => Bitsize::W64,
            Bitsize::W64 => Bitsize::W32,
        };

        let finding = if script.content.contains(&seven_zip_source(other)) {
            Finding::invalid(
                self.category(),
                &script.path,
                format!(
                    "Ships 7zip {} in a {}-bit installer.",
                    other.arch_token(),
                    bitsize.bits()
                ),
            )
        } else {
            Finding::missing(
                self.category(),
                &script.path,
                format!("Missing 7zip {} source entry.", bitsize.arch_token()),
            )
        };

        vec![finding.with_suggestion(expected)]
    }
}

/// Rule: vcredist entries use the installer's architecture, 2 for web
/// installers and 3 for all others
pub struct VcredistCountRule;

impl VcredistCountRule {
    pub fn expected_count(script: &InstallerScript) -> usize {
        if script.is_web_installer() {
            WEB_INSTALLER_VCREDIST_COUNT
        } else {
            FULL_INSTALLER_VCREDIST_COUNT
        }
    }
}

impl ContentRule for VcredistCountRule {
    fn category(&self) -> CheckCategory {
        CheckCategory::VcredistCount
    }

    fn description(&self) -> &'static str {
        "    => Check using correct bitsize of VCREDIST:"
    }

    fn check(&self, script: &InstallerScript) -> Vec<Finding> {
        let bitsize = script.bitsize();
        let expected = Self::expected_count(script);
        let found = count_vcredist(&script.content, bitsize);

        if found == expected {
            return Vec::new();
        }

        vec![Finding::invalid(
            self.category(),
            &script.path,
            format!(
                "Invalid vcredist_ entry: found {} vcredist_{}_ entries, expected {}. Please use correct bitsize: {}",
                found,
                bitsize.arch_token(),
                expected,
                bitsize.arch_token()
            ),
        )]
    }
}
