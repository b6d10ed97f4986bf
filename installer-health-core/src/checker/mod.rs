//! Consistency checker
//!
//! Cross-validates installer scripts against their registry files in three
//! phases, each independently invokable:
//!
//! 1. pairing: every non-web installer has a registry file
//! 2. component entries: every registry component is referenced by its installer
//! 3. content: defines, 7zip path and vcredist entries match the installer bitsize
//!
//! All state of a run lives in [`CheckContext`]. Phases only append findings
//! to it and never stop at the first failure.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub mod rules;


use crate::config::CheckConfig;
use crate::installer::InstallerScript;
use crate::naming::{name_section_identifier, NameMapper};
use crate::registry::{RegistryDescriptor, RegistryLoader};
use crate::report::{CheckCategory, Finding, Report, Reporter};
use crate::{HealthError, Result};
use rules::*;

/// Trait for checks that only look at a single installer's content
pub trait ContentRule: Send + Sync {
    /// Check one installer, returning its findings
    fn check(&self, script: &InstallerScript) -> Vec<Finding>;

    /// Category the findings are reported under
    fn category(&self) -> CheckCategory;

    /// Progress line shown at verbose level before the rule runs
    fn description(&self) -> &'static str;
}

/// Explicit state of one checker run
#[derive(Debug, Clone, Default)]
pub struct CheckContext {
    /// Installer scripts, sorted
    pub installers: Vec<PathBuf>,
    /// Registry files, sorted
    pub registries: Vec<PathBuf>,
    /// Directory paired registry files are looked up in
    pub registries_dir: PathBuf,
    /// Append-only list of findings
    pub findings: Vec<Finding>,
    ran: Vec<CheckCategory>,
}

impl CheckContext {
    /// Enumerate both input directories of a validated configuration
    pub fn enumerate(config: &CheckConfig) -> Result<Self> {
        let installers = list_files(&config.installers_dir, &config.installer_extension)?;
        let registries = list_files(&config.registries_dir, &config.registry_extension)?;

        info!(
            "Found {} installer scripts and {} registry files",
            installers.len(),
            registries.len()
        );

        Ok(Self::from_paths(
            installers,
            registries,
            config.registries_dir.clone(),
        ))
    }

    /// Build a context from already known paths
    pub fn from_paths(
        mut installers: Vec<PathBuf>,
        mut registries: Vec<PathBuf>,
        registries_dir: PathBuf,
    ) -> Self {
        installers.sort();
        registries.sort();
        Self {
            installers,
            registries,
            registries_dir,
            findings: Vec::new(),
            ran: Vec::new(),
        }
    }

    /// Categories that have run so far, in order
    pub fn ran(&self) -> &[CheckCategory] {
        &self.ran
    }

    fn mark_ran(&mut self, category: CheckCategory) {
        if !self.ran.contains(&category) {
            self.ran.push(category);
        }
    }

    fn push(&mut self, finding: Finding, reporter: &mut dyn Reporter) {
        reporter.normal(&format!("       => {}", finding.message));
        if let Some(suggestion) = &finding.suggestion {
            reporter.normal(&format!("          Please add: {suggestion}"));
        }
        self.findings.push(finding);
    }

    fn findings_since(&self, mark: usize) -> usize {
        self.findings.len() - mark
    }

    /// Group the accumulated findings into a report
    pub fn report(&self) -> Report {
        Report::from_findings(&self.ran, &self.findings)
    }
}

/// Runs the pairing, component-entry and content checks
pub struct ConsistencyChecker {
    mapper: NameMapper,
    web_marker: String,
    rules: Vec<Box<dyn ContentRule>>,
}

impl ConsistencyChecker {
    /// Create a checker with the default content rules
    pub fn new(config: &CheckConfig) -> Self {
        let rules: Vec<Box<dyn ContentRule>> = vec![
            Box::new(PhpVersionDefineRule),
            Box::new(BitsizeDefineRule),
            Box::new(SevenZipBitsizeRule),
            Box::new(VcredistCountRule),
        ];

        Self {
            mapper: config.name_mapper(),
            web_marker: config.web_installer_marker.clone(),
            rules,
        }
    }

    fn is_web_installer(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| name.to_string_lossy().contains(self.web_marker.as_str()))
            .unwrap_or(false)
    }

    /// Run all phases in sequence and return the grouped report
    pub fn run_all(&self, ctx: &mut CheckContext, reporter: &mut dyn Reporter) -> Report {
        reporter.normal("== Checking Installer Health");

        self.check_pairing(ctx, reporter);
        self.check_component_entries(ctx, reporter);
        self.check_content(ctx, reporter);

        ctx.report()
    }

    /// Every non-web installer must have its registry among the enumerated files
    pub fn check_pairing(&self, ctx: &mut CheckContext, reporter: &mut dyn Reporter) {
        reporter.normal(
            "Check, that every installer script has a corresponding \"next\" installer registry file...",
        );
        ctx.mark_ran(CheckCategory::Pairing);
        let mark = ctx.findings.len();

        let available: BTreeSet<String> = ctx
            .registries
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect();

        let installers = ctx.installers.clone();
        for installer in &installers {
            if self.is_web_installer(installer) {
                debug!("Pairing check skips web installer {:?}", installer);
                continue;
            }

            let expected = self.mapper.installer_to_registry(&installer.to_string_lossy());
            if !available.contains(&expected) {
                let finding = Finding::missing(
                    CheckCategory::Pairing,
                    installer,
                    format!("Missing Registry: {expected}"),
                )
                .with_suggestion(ctx.registries_dir.join(&expected).display().to_string());
                ctx.push(finding, reporter);
            }
        }

        if ctx.findings_since(mark) == 0 {
            reporter.normal(" => Ok");
        }
    }

    /// Every component of a paired registry must be referenced by its installer
    pub fn check_component_entries(&self, ctx: &mut CheckContext, reporter: &mut dyn Reporter) {
        reporter.normal(
            "Check, that every component in the \"next\" installer registry file has corresponding entries in the installer script.",
        );
        ctx.mark_ran(CheckCategory::ComponentEntries);
        let mark = ctx.findings.len();

        let installers = ctx.installers.clone();
        for installer in &installers {
            if self.is_web_installer(installer) {
                reporter.normal(&format!(
                    "Skipping Installers without registry file: {}",
                    installer.display()
                ));
                continue;
            }

            reporter.normal(&format!("Processing Installer: {}", installer.display()));

            let registry_name = self.mapper.installer_to_registry(&installer.to_string_lossy());
            reporter.verbose(&format!(" => Matching Registry file is: {registry_name}"));

            let registry = match RegistryLoader::load(ctx.registries_dir.join(&registry_name)) {
                Ok(registry) => registry,
                Err(HealthError::RegistryNotFound { path }) => {
                    if ctx.ran().contains(&CheckCategory::Pairing) {
                        // Already reported by the pairing check.
                        reporter.verbose(&format!(
                            " => No registry at {}, skipping component entries",
                            path.display()
                        ));
                    } else {
                        let finding = Finding::missing(
                            CheckCategory::ComponentEntries,
                            installer,
                            format!("Missing Registry: {registry_name}"),
                        )
                        .with_suggestion(path.display().to_string());
                        ctx.push(finding, reporter);
                    }
                    continue;
                }
                Err(e) => {
                    let finding = Finding::invalid(
                        CheckCategory::ComponentEntries,
                        installer,
                        format!("Component entries not checked: {e}"),
                    );
                    ctx.push(finding, reporter);
                    continue;
                }
            };

            let script = match InstallerScript::from_file(installer, &self.web_marker) {
                Ok(script) => script,
                Err(e) => {
                    let finding = Finding::invalid(
                        CheckCategory::ComponentEntries,
                        installer,
                        format!("Installer not readable: {e}"),
                    );
                    ctx.push(finding, reporter);
                    continue;
                }
            };

            for finding in self.check_components_of(&script, &registry, reporter) {
                ctx.push(finding, reporter);
            }
        }

        if ctx.findings_since(mark) == 0 {
            reporter.normal(" => Ok");
        }
    }

    /// Check one installer's content against every record of its registry.
    ///
    /// Each absent fact is its own finding. The install-section suggestion
    /// names the `Filename_` reference, so it is only attached once the
    /// definition exists.
    pub fn check_components_of(
        &self,
        script: &InstallerScript,
        registry: &RegistryDescriptor,
        reporter: &mut dyn Reporter,
    ) -> Vec<Finding> {
        let mut findings = Vec::new();
        let content = script.content.as_str();

        for record in &registry.components {
            let registry_name = &record.software_name;
            let name = record.canonical_identifier();
            let section = name_section_identifier(&name);

            reporter.verbose("    => Check filename_ entry");
            let filename_ref = format!("Filename_{name}");
            let has_filename = content.contains(&filename_ref);
            if !has_filename {
                findings.push(
                    Finding::missing(
                        CheckCategory::ComponentEntries,
                        &script.path,
                        format!("Missing filename_ entry for software {registry_name} => {name}."),
                    )
                    .with_suggestion(format!(
                        "{filename_ref} = \"{}\";",
                        record.downloaded_filename
                    )),
                );
            }

            reporter.verbose("    => Check Name: entry");
            let name_entry = format!("Name: {section};");
            if !content.contains(&name_entry) {
                findings.push(
                    Finding::missing(
                        CheckCategory::ComponentEntries,
                        &script.path,
                        format!("Missing Name entry for software {registry_name} => {section}."),
                    )
                    .with_suggestion(name_entry),
                );
            }

            reporter.verbose("    => Check Install Section exists");
            let install_ref = format!("targetPath + {filename_ref}");
            if !content.contains(&install_ref) {
                let finding = Finding::missing(
                    CheckCategory::ComponentEntries,
                    &script.path,
                    format!("Missing install section for {registry_name} => {section}."),
                );
                findings.push(if has_filename {
                    finding.with_suggestion(install_ref)
                } else {
                    finding
                });
            }
        }

        findings
    }

    /// Content checks run against every installer, web installers included
    pub fn check_content(&self, ctx: &mut CheckContext, reporter: &mut dyn Reporter) {
        reporter.normal("Checking installer scripts for correct values...");
        for rule in &self.rules {
            ctx.mark_ran(rule.category());
        }
        let mark = ctx.findings.len();

        let installers = ctx.installers.clone();
        for installer in &installers {
            reporter.normal(&format!("Processing Installer: {}", installer.display()));

            let script = match InstallerScript::from_file(installer, &self.web_marker) {
                Ok(script) => script,
                Err(e) => {
                    for rule in &self.rules {
                        let finding = Finding::invalid(
                            rule.category(),
                            installer,
                            format!("Installer not readable: {e}"),
                        );
                        ctx.push(finding, reporter);
                    }
                    continue;
                }
            };

            reporter.verbose(&format!("Found BITSIZE: {}", script.identity.bitsize));

            for finding in self.check_script_content(&script, reporter) {
                ctx.push(finding, reporter);
            }
        }

        if ctx.findings_since(mark) == 0 {
            reporter.normal(" => Ok");
        }
    }

    /// Apply every content rule to one installer
    pub fn check_script_content(
        &self,
        script: &InstallerScript,
        reporter: &mut dyn Reporter,
    ) -> Vec<Finding> {
        let mut findings = Vec::new();
        for rule in &self.rules {
            reporter.verbose(rule.description());
            findings.extend(rule.check(script));
        }
        findings
    }
}

/// Non-recursive listing of `dir/*.ext`, sorted
fn list_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/*.{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        extension
    );
    debug!("Listing files matching {}", pattern);

    let mut files = Vec::new();
    for entry in glob::glob(&pattern)? {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            HealthError::Io {
                path,
                source: e.into_error(),
            }
        })?;
        if path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}
