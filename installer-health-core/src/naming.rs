//! Name mapping between installer scripts, registry files and the
//! identifiers used inside installer content.
//!
//! Pairing an installer with its registry is a pure function of the
//! filename. There is no fallback search and no fuzzy matching.

use once_cell::sync::Lazy;
use regex::Regex;

/// `-php71` or `-php7-1` in an installer filename
pub(crate) static PHP_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-php(\d)-?(\d)").unwrap());

/// Marker that registry filenames carry in front of the PHP version
const NEXT_PHP_MARKER: &str = "-next-php";

/// Translates filenames between the installer and registry directories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameMapper {
    installer_extension: String,
    registry_extension: String,
}

impl NameMapper {
    pub fn new(
        installer_extension: impl Into<String>,
        registry_extension: impl Into<String>,
    ) -> Self {
        Self {
            installer_extension: installer_extension.into(),
            registry_extension: registry_extension.into(),
        }
    }

    /// Map an installer script filename to the registry filename it pairs with.
    ///
    /// `full-php71-w64.iss` becomes `full-next-php7.1-w64.json`. Web installer
    /// names are mapped like any other; callers decide whether to skip them.
    pub fn installer_to_registry(&self, script: &str) -> String {
        let base = base_name(script);
        let renamed = PHP_MARKER.replace_all(base, "-next-php$1.$2");
        swap_extension(&renamed, &self.installer_extension, &self.registry_extension)
    }

    /// Map a registry filename back to its installer script filename.
    ///
    /// The first `.` of the name is dropped, which assumes it is the dot of the
    /// PHP version (`php7.1`). Names without a PHP version lose their extension
    /// dot instead, and names with more than one dot before the marker keep
    /// the later ones. Both shapes are left as they are.
    pub fn registry_to_installer(&self, registry: &str) -> String {
        const SENTINEL: &str = "@";

        let base = base_name(registry);
        let marked = base.replacen('.', SENTINEL, 1);
        let stripped = marked.replace(SENTINEL, "").replace(NEXT_PHP_MARKER, "-php");

        let registry_suffix = format!(".{}", self.registry_extension);
        let installer_suffix = format!(".{}", self.installer_extension);
        stripped.replace(&registry_suffix, &installer_suffix)
    }
}

impl Default for NameMapper {
    fn default() -> Self {
        Self::new("iss", "json")
    }
}

/// Derive the identifier used inside installer content from a registry's
/// recorded software name.
///
/// Bitsize suffixes are removed, hyphens become underscores and a QA build
/// collapses onto its base package: `mariadb-x64` gives `mariadb`, `php-qa`
/// gives `php`.
pub fn canonical_identifier(registry_software_name: &str) -> String {
    let name = registry_software_name
        .replace("-x64", "")
        .replace("-x86", "")
        .replace('-', "_");

    match name.strip_suffix("_qa") {
        Some(base) if !base.is_empty() => base.to_string(),
        _ => name,
    }
}

/// How a [`NameSectionRule`] matches a canonical identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionMatch {
    /// Identifier is one of the listed names
    OneOf(&'static [&'static str]),
    /// Identifier contains the given substring
    Contains(&'static str),
}

impl SectionMatch {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            SectionMatch::OneOf(names) => names.contains(&name),
            SectionMatch::Contains(needle) => name.contains(needle),
        }
    }
}

/// One row of the `Name:` section lookup table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameSectionRule {
    pub matcher: SectionMatch,
    pub section: &'static str,
}

const fn rule(matcher: SectionMatch, section: &'static str) -> NameSectionRule {
    NameSectionRule { matcher, section }
}

/// Evaluated top to bottom, first match wins. The xdebug row has to stay
/// above the generic `phpext_` row.
pub const NAME_SECTION_RULES: &[NameSectionRule] = &[
    rule(SectionMatch::OneOf(&["nginx", "php", "mariadb"]), "serverstack"),
    rule(SectionMatch::Contains("phpext_xdebug"), "xdebug"),
    rule(SectionMatch::Contains("phpext_"), "phpextensions"),
    rule(SectionMatch::Contains("wpnxm_benchmark"), "benchmark"),
    rule(
        SectionMatch::OneOf(&["closure_compiler", "yuicompressor"]),
        "assettools",
    ),
    rule(SectionMatch::OneOf(&["gogs", "msysgit"]), "git"),
    rule(SectionMatch::OneOf(&["node", "nodenpm"]), "node"),
    rule(SectionMatch::OneOf(&["php_cs_fixer"]), "phpcsfixer"),
    rule(SectionMatch::OneOf(&["wpnxm_scp"]), "servercontrolpanel"),
];

/// Map a canonical identifier to the label used in the installer's
/// `Name:` declarations. Unknown identifiers map to themselves.
pub fn name_section_identifier(name: &str) -> &str {
    NAME_SECTION_RULES
        .iter()
        .find(|rule| rule.matcher.matches(name))
        .map(|rule| rule.section)
        .unwrap_or(name)
}

/// Last path component, accepting both separators
pub(crate) fn base_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

fn swap_extension(name: &str, from: &str, to: &str) -> String {
    let suffix = format!(".{from}");
    match name.strip_suffix(&suffix) {
        Some(stem) => format!("{stem}.{to}"),
        None => name.to_string(),
    }
}
