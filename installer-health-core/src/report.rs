//! Findings, the run report and the reporter sink

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Outcome of a single fact or a whole category
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Ok,      // Nothing to report
    Missing, // Expected entry or file is absent
    Invalid, // Entry present but wrong, or input unreadable
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Ok => "ok",
            Severity::Missing => "missing",
            Severity::Invalid => "invalid",
        };
        f.write_str(label)
    }
}

/// The check a finding belongs to, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckCategory {
    Pairing,
    ComponentEntries,
    PhpVersionDefine,
    BitsizeDefine,
    SevenZipBitsize,
    VcredistCount,
}

impl CheckCategory {
    pub const ALL: [CheckCategory; 6] = [
        CheckCategory::Pairing,
        CheckCategory::ComponentEntries,
        CheckCategory::PhpVersionDefine,
        CheckCategory::BitsizeDefine,
        CheckCategory::SevenZipBitsize,
        CheckCategory::VcredistCount,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            CheckCategory::Pairing => "pairing",
            CheckCategory::ComponentEntries => "component-entries",
            CheckCategory::PhpVersionDefine => "php-version-define",
            CheckCategory::BitsizeDefine => "bitsize-define",
            CheckCategory::SevenZipBitsize => "7zip-bitsize",
            CheckCategory::VcredistCount => "vcredist-count",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            CheckCategory::Pairing => "Every installer script has a matching registry file",
            CheckCategory::ComponentEntries => {
                "Every registry component has Filename_, Name: and install entries"
            }
            CheckCategory::PhpVersionDefine => "PHP_VERSION define matches the filename",
            CheckCategory::BitsizeDefine => "BITSIZE define matches the filename",
            CheckCategory::SevenZipBitsize => "Bundled 7zip matches the installer bitsize",
            CheckCategory::VcredistCount => "vcredist entries match the installer bitsize",
        }
    }
}

impl fmt::Display for CheckCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// One discrepancy between an installer and what it is expected to contain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub category: CheckCategory,
    pub severity: Severity,
    /// Installer script the finding is about
    pub installer: PathBuf,
    pub message: String,
    /// Literal text to add, when it can be derived
    pub suggestion: Option<String>,
}

impl Finding {
    pub fn missing(category: CheckCategory, installer: &Path, message: impl Into<String>) -> Self {
        Self {
            category,
            severity: Severity::Missing,
            installer: installer.to_path_buf(),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn invalid(category: CheckCategory, installer: &Path, message: impl Into<String>) -> Self {
        Self {
            category,
            severity: Severity::Invalid,
            installer: installer.to_path_buf(),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.severity,
            self.installer.display(),
            self.message
        )?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " Please add: {suggestion}")?;
        }
        Ok(())
    }
}

/// Findings of one check category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryReport {
    pub category: CheckCategory,
    pub findings: Vec<Finding>,
}

impl CategoryReport {
    pub fn status(&self) -> Severity {
        self.findings
            .iter()
            .map(|f| f.severity)
            .max()
            .unwrap_or(Severity::Ok)
    }
}

/// Result of a checker run, grouped by category in execution order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub categories: Vec<CategoryReport>,
}

impl Report {
    /// Group an append-only finding list by the categories that ran
    pub fn from_findings(ran: &[CheckCategory], findings: &[Finding]) -> Self {
        let categories = ran
            .iter()
            .map(|&category| CategoryReport {
                category,
                findings: findings
                    .iter()
                    .filter(|f| f.category == category)
                    .cloned()
                    .collect(),
            })
            .collect();
        Self { categories }
    }

    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.categories.iter().flat_map(|c| c.findings.iter())
    }

    pub fn category(&self, category: CheckCategory) -> Option<&CategoryReport> {
        self.categories.iter().find(|c| c.category == category)
    }

    /// `Ok` for a category that ran clean or did not run
    pub fn status(&self, category: CheckCategory) -> Severity {
        self.category(category)
            .map(CategoryReport::status)
            .unwrap_or(Severity::Ok)
    }

    pub fn total_findings(&self) -> usize {
        self.categories.iter().map(|c| c.findings.len()).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.total_findings() == 0
    }

    /// Human-readable rendering: one line per finding and its suggestion,
    /// one affirmative line per clean category.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for category in &self.categories {
            out.push_str(&format!("{}:\n", category.category.description()));
            if category.findings.is_empty() {
                out.push_str(" => Ok\n");
                continue;
            }
            for finding in &category.findings {
                out.push_str(&format!(
                    "  => {} [{}] {}\n",
                    finding.installer.display(),
                    finding.severity,
                    finding.message
                ));
                if let Some(suggestion) = &finding.suggestion {
                    out.push_str(&format!("     Please add: {suggestion}\n"));
                }
            }
        }
        out
    }
}

/// Verbosity of a reporter message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Normal,
    Verbose,
}

/// Sink for progress and finding lines streamed during a run
pub trait Reporter {
    fn emit(&mut self, message: &str, level: Verbosity);

    fn normal(&mut self, message: &str) {
        self.emit(message, Verbosity::Normal);
    }

    fn verbose(&mut self, message: &str) {
        self.emit(message, Verbosity::Verbose);
    }
}

/// Forwards reporter lines to `tracing`
#[derive(Debug, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn emit(&mut self, message: &str, level: Verbosity) {
        match level {
            Verbosity::Normal => info!("{}", message),
            Verbosity::Verbose => debug!("{}", message),
        }
    }
}

/// Keeps every reporter line in memory
#[derive(Debug, Default)]
pub struct MemoryReporter {
    pub lines: Vec<(Verbosity, String)>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines emitted at normal verbosity
    pub fn normal_lines(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter(|(level, _)| *level == Verbosity::Normal)
            .map(|(_, line)| line.as_str())
            .collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|(_, line)| line.contains(needle))
    }
}

impl Reporter for MemoryReporter {
    fn emit(&mut self, message: &str, level: Verbosity) {
        self.lines.push((level, message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_findings() -> Vec<Finding> {
        vec![
            Finding::missing(
                CheckCategory::ComponentEntries,
                Path::new("full-w64.iss"),
                "Missing Filename_ entry for nginx",
            )
            .with_suggestion("Filename_nginx = \"nginx.zip\";"),
            Finding::invalid(
                CheckCategory::VcredistCount,
                Path::new("full-w64.iss"),
                "Expected 3 vcredist_x64 entries, found 1",
            ),
        ]
    }

    #[test]
    fn test_report_groups_by_category() {
        let report = Report::from_findings(&CheckCategory::ALL, &sample_findings());

        assert_eq!(report.categories.len(), 6);
        assert_eq!(report.total_findings(), 2);
        assert_eq!(report.status(CheckCategory::Pairing), Severity::Ok);
        assert_eq!(report.status(CheckCategory::ComponentEntries), Severity::Missing);
        assert_eq!(report.status(CheckCategory::VcredistCount), Severity::Invalid);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_render_text() {
        let report = Report::from_findings(
            &[CheckCategory::Pairing, CheckCategory::ComponentEntries],
            &sample_findings(),
        );

        let text = report.render_text();
        let expected = "\
Every installer script has a matching registry file:
 => Ok
Every registry component has Filename_, Name: and install entries:
  => full-w64.iss [missing] Missing Filename_ entry for nginx
     Please add: Filename_nginx = \"nginx.zip\";
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_finding_display() {
        let finding = &sample_findings()[0];
        assert_eq!(
            finding.to_string(),
            "[missing] full-w64.iss: Missing Filename_ entry for nginx Please add: Filename_nginx = \"nginx.zip\";"
        );
    }

    #[test]
    fn test_finding_serializes() {
        let json = serde_json::to_value(&sample_findings()[1]).unwrap();
        assert_eq!(json["category"], "vcredist_count");
        assert_eq!(json["severity"], "invalid");
        assert_eq!(json["suggestion"], serde_json::Value::Null);
    }

    #[test]
    fn test_memory_reporter() {
        let mut reporter = MemoryReporter::new();
        reporter.normal("Processing Installer: full-w64.iss");
        reporter.verbose("    => Check filename_ entry");

        assert_eq!(reporter.normal_lines(), vec!["Processing Installer: full-w64.iss"]);
        assert!(reporter.contains("filename_"));
    }
}
