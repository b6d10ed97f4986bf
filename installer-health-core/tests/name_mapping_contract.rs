//! Contract tests for installer/registry name mapping

use installer_health_core::naming::NAME_SECTION_RULES;
use installer_health_core::{
    canonical_identifier, name_section_identifier, Bitsize, InstallerIdentity, NameMapper,
};
use pretty_assertions::assert_eq;

const INSTALLER_NAMES: &[&str] = &[
    "full-php56-w32.iss",
    "full-php70-w64.iss",
    "full-php71-w32.iss",
    "full-php71-w64.iss",
    "lite-php72-w64.iss",
    "standard-php71-w64.iss",
    "literc-php71-w64.iss",
];

#[test]
fn test_forward_mapping_never_keeps_installer_marker() {
    let mapper = NameMapper::default();
    for &name in INSTALLER_NAMES {
        let registry = mapper.installer_to_registry(name);
        assert!(registry.ends_with(".json"), "{name} -> {registry}");
        assert!(registry.contains("-next-php"), "{name} -> {registry}");
        assert!(!registry.contains(".iss"), "{name} -> {registry}");
    }

    for (major, minor) in [(5, 6), (7, 0), (7, 1), (7, 2)] {
        let name = format!("full-php{major}-{minor}.iss");
        let registry = mapper.installer_to_registry(&name);
        assert!(registry.ends_with(&format!("-next-php{major}.{minor}.json")));
        assert!(!registry.contains(&format!("-php{major}-{minor}")));
    }
}

#[test]
fn test_inverse_mapping_round_trips_single_dot_names() {
    let mapper = NameMapper::default();
    for &name in INSTALLER_NAMES {
        let registry = mapper.installer_to_registry(name);
        assert_eq!(mapper.registry_to_installer(&registry), name);
    }
}

#[test]
fn test_inverse_mapping_of_unversioned_registry_is_lossy() {
    // Only the PHP version dot is expected before the extension.
    let mapper = NameMapper::default();
    let registry = mapper.installer_to_registry("webinstaller-w64.iss");
    assert_eq!(registry, "webinstaller-w64.json");
    assert_ne!(mapper.registry_to_installer(&registry), "webinstaller-w64.iss");
}

#[test]
fn test_identity_follows_filename_only() {
    for &name in INSTALLER_NAMES {
        let identity = InstallerIdentity::from_filename(name);
        let expected = if name.contains("-w32") {
            Bitsize::W32
        } else {
            Bitsize::W64
        };
        assert_eq!(identity.bitsize, expected);
        assert!(identity.php_version.is_some());
        assert!(!identity.is_web_installer);
    }
}

#[test]
fn test_component_names_to_sections() {
    let cases = [
        ("nginx", "serverstack"),
        ("php-x64", "serverstack"),
        ("php-qa-x86", "serverstack"),
        ("mariadb-x64", "serverstack"),
        ("phpext-xdebug-x64", "xdebug"),
        ("phpext-xdebug-3-2", "xdebug"),
        ("phpext-apcu-x64", "phpextensions"),
        ("wpnxm-benchmark", "benchmark"),
        ("closure-compiler", "assettools"),
        ("yuicompressor", "assettools"),
        ("gogs-x64", "git"),
        ("msysgit", "git"),
        ("node-x64", "node"),
        ("nodenpm", "node"),
        ("php-cs-fixer", "phpcsfixer"),
        ("wpnxm-scp", "servercontrolpanel"),
        ("heidisql", "heidisql"),
        ("adminer", "adminer"),
    ];

    for (registry_name, section) in cases {
        let name = canonical_identifier(registry_name);
        assert_eq!(name_section_identifier(&name), section, "{registry_name}");
    }
}

#[test]
fn test_section_table_first_match_wins() {
    // Every identifier resolves to the first matching row, never a later one.
    for probe in ["phpext_xdebug", "phpext_xdebug_2_5", "phpext_curl", "php", "wpnxm_scp"] {
        let first = NAME_SECTION_RULES
            .iter()
            .find(|rule| rule.matcher.matches(probe))
            .map(|rule| rule.section)
            .unwrap();
        assert_eq!(name_section_identifier(probe), first);
    }
}
