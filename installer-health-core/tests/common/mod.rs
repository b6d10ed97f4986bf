//! Shared helpers for the integration tests

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize logging for tests (only once per test run)
pub fn init_test_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_target(true)
                    .with_level(true),
            )
            .with(tracing_subscriber::filter::EnvFilter::from_default_env())
            .try_init();
    });
}

/// Create `installers/` and `registries/` below `root`
pub fn create_input_dirs(root: &Path) -> Result<(PathBuf, PathBuf)> {
    let installers = root.join("installers");
    let registries = root.join("registries");
    fs::create_dir_all(&installers)?;
    fs::create_dir_all(&registries)?;
    Ok((installers, registries))
}

/// Installer content that satisfies every content rule for the given filename
pub fn healthy_installer(
    php_version: Option<&str>,
    word: &str,
    arch: &str,
    vcredist: usize,
) -> String {
    let mut content = String::new();
    if let Some(version) = php_version {
        content.push_str(&format!("#define PHP_VERSION          \"{version}\"\n"));
    }
    content.push_str(&format!("#define BITSIZE              \"{word}\"\n\n[Files]\n"));
    content.push_str(&format!("Source: ..\\bin\\7zip\\{arch}\\7za.exe; DestDir: {{tmp}};\n"));
    for year in [2015, 2013, 2012].into_iter().take(vcredist) {
        content.push_str(&format!(
            "Source: ..\\bin\\vcredist_{arch}_{year}.exe; DestDir: {{tmp}};\n"
        ));
    }
    content
}

/// `[Components]`, `Filename_` and install lines for one component
pub fn component_entries(name: &str, section: &str, file: &str) -> String {
    format!(
        "#define Filename_{name} \"{file}\"\n\
         Name: {section}; Description: {name}\n\
         ExtractTemporaryFile(targetPath + Filename_{name});\n"
    )
}
