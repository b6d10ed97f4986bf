//! installer-health - cross-checks installer scripts against their registry files
//!
//! Runs as one step of the packaging pipeline. Progress goes to stderr through
//! `tracing`, the report goes to stdout.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use installer_health_core::installer::{php_version_literal, WEB_INSTALLER_MARKER};
use installer_health_core::{
    CheckConfig, CheckContext, ConsistencyChecker, InstallerIdentity, NameMapper, Report,
    TracingReporter,
};

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Report output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Table,
}

/// Check phases that can be run on their own
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Phase {
    Pairing,
    Components,
    Content,
}

#[derive(Parser, Debug)]
#[clap(
    name = "installer-health",
    about = "Cross-checks installer scripts against their component registries",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    /// Set log level
    #[clap(long, default_value = "info", global = true)]
    log_level: LogLevel,

    /// Emit logs as JSON lines
    #[clap(long, global = true)]
    log_json: bool,
}

#[derive(Parser, Debug)]
enum Command {
    /// Check installers against their registries
    Check {
        /// Configuration file (defaults to ./installer-health.yml when present)
        #[clap(long)]
        config: Option<PathBuf>,

        /// Directory containing the installer scripts
        #[clap(long)]
        installers_dir: Option<PathBuf>,

        /// Directory containing the registry files
        #[clap(long)]
        registries_dir: Option<PathBuf>,

        /// Output format
        #[clap(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Exit non-zero when any finding is reported
        #[clap(long)]
        strict: bool,

        /// Run a single phase instead of the full suite
        #[clap(long, value_enum)]
        only: Option<Phase>,
    },

    /// Print the registry filename an installer pairs with
    Map {
        /// Installer (or, with --reverse, registry) filename
        filename: String,

        /// Map a registry filename back to its installer
        #[clap(long)]
        reverse: bool,

        #[clap(long, default_value = "iss")]
        installer_extension: String,

        #[clap(long, default_value = "json")]
        registry_extension: String,
    },

    /// Show what an installer filename implies about its content
    Identify {
        filename: String,

        /// Substring marking web installers
        #[clap(long, default_value = WEB_INSTALLER_MARKER)]
        web_marker: String,
    },
}

/// Initialize tracing with CLI flags. Logs always go to stderr.
fn initialize_tracing(log_level: &LogLevel, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_filter_directive()));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_tracing(&cli.log_level, cli.log_json);

    match cli.command {
        Command::Check {
            config,
            installers_dir,
            registries_dir,
            format,
            strict,
            only,
        } => check_command(config, installers_dir, registries_dir, format, strict, only),
        Command::Map {
            filename,
            reverse,
            installer_extension,
            registry_extension,
        } => {
            let mapper = NameMapper::new(installer_extension, registry_extension);
            map_command(&mapper, &filename, reverse);
            Ok(())
        }
        Command::Identify {
            filename,
            web_marker,
        } => identify_command(&filename, &web_marker),
    }
}

/// Merge the configuration file with command line overrides
fn resolve_config(
    config: Option<PathBuf>,
    installers_dir: Option<PathBuf>,
    registries_dir: Option<PathBuf>,
) -> Result<CheckConfig> {
    let from_file = match config {
        Some(path) => Some(
            CheckConfig::from_file(&path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        ),
        None => {
            let cwd = std::env::current_dir().context("Failed to determine working directory")?;
            CheckConfig::discover(&cwd)?
        }
    };

    let mut resolved = match (from_file, installers_dir.clone(), registries_dir.clone()) {
        (Some(config), _, _) => config,
        (None, Some(installers), Some(registries)) => CheckConfig::new(installers, registries),
        (None, _, _) => bail!(
            "No configuration file found; pass --config or both --installers-dir and --registries-dir"
        ),
    };

    if let Some(dir) = installers_dir {
        resolved.installers_dir = dir;
    }
    if let Some(dir) = registries_dir {
        resolved.registries_dir = dir;
    }

    debug!("Resolved configuration: {:?}", resolved);
    Ok(resolved.validate()?)
}

fn check_command(
    config: Option<PathBuf>,
    installers_dir: Option<PathBuf>,
    registries_dir: Option<PathBuf>,
    format: OutputFormat,
    strict: bool,
    only: Option<Phase>,
) -> Result<()> {
    let config = resolve_config(config, installers_dir, registries_dir)?;
    info!(
        "Checking installers in {:?} against registries in {:?}",
        config.installers_dir, config.registries_dir
    );

    let checker = ConsistencyChecker::new(&config);
    let mut ctx = CheckContext::enumerate(&config)?;
    let mut reporter = TracingReporter;

    let report = match only {
        None => checker.run_all(&mut ctx, &mut reporter),
        Some(phase) => {
            match phase {
                Phase::Pairing => checker.check_pairing(&mut ctx, &mut reporter),
                Phase::Components => checker.check_component_entries(&mut ctx, &mut reporter),
                Phase::Content => checker.check_content(&mut ctx, &mut reporter),
            }
            ctx.report()
        }
    };

    match format {
        OutputFormat::Text => print!("{}", report.render_text()),
        OutputFormat::Json => {
            let output = report_json(&ctx, &report);
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Table => print_report_table(&report),
    }

    info!(
        "Checked {} installers: {} findings",
        ctx.installers.len(),
        report.total_findings()
    );

    // The exit code is the pipeline's decision, not the checker's.
    if strict && !report.is_clean() {
        std::process::exit(1);
    }

    Ok(())
}

fn report_json(ctx: &CheckContext, report: &Report) -> serde_json::Value {
    serde_json::json!({
        "installers": ctx.installers.len(),
        "registries": ctx.registries.len(),
        "total_findings": report.total_findings(),
        "categories": report.categories.iter().map(|c| {
            serde_json::json!({
                "category": c.category.id(),
                "description": c.category.description(),
                "status": c.status(),
                "findings": c.findings,
            })
        }).collect::<Vec<_>>()
    })
}

#[derive(Tabled)]
struct CategoryTableRow {
    #[tabled(rename = "Check")]
    check: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Findings")]
    findings: usize,
    #[tabled(rename = "Description")]
    description: String,
}

fn print_report_table(report: &Report) {
    let rows: Vec<CategoryTableRow> = report
        .categories
        .iter()
        .map(|c| CategoryTableRow {
            check: c.category.id().to_string(),
            status: c.status().to_string(),
            findings: c.findings.len(),
            description: c.category.description().to_string(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string();
    println!("{table}");

    for finding in report.findings() {
        println!("{finding}");
    }
}

fn map_command(mapper: &NameMapper, filename: &str, reverse: bool) {
    if reverse {
        println!("{}", mapper.registry_to_installer(filename));
    } else {
        println!("{}", mapper.installer_to_registry(filename));
    }
}

fn identify_command(filename: &str, web_marker: &str) -> Result<()> {
    let identity = InstallerIdentity::from_filename_with_marker(filename, web_marker);
    let bitsize = identity.bitsize;

    let output = serde_json::json!({
        "filename": filename,
        "identity": identity,
        "arch_token": bitsize.arch_token(),
        "word_token": bitsize.word_token(),
        "php_version_define": php_version_literal(filename),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_command_parsing() {
        let cli = Cli::parse_from([
            "installer-health",
            "check",
            "--installers-dir",
            "installers",
            "--registries-dir",
            "registry/installer",
            "--format",
            "json",
            "--strict",
        ]);

        match cli.command {
            Command::Check {
                config,
                installers_dir,
                registries_dir,
                format,
                strict,
                only,
            } => {
                assert_eq!(config, None);
                assert_eq!(installers_dir, Some(PathBuf::from("installers")));
                assert_eq!(registries_dir, Some(PathBuf::from("registry/installer")));
                assert_eq!(format, OutputFormat::Json);
                assert!(strict);
                assert_eq!(only, None);
            }
            _ => panic!("Wrong command parsed"),
        }
    }

    #[test]
    fn test_check_command_defaults() {
        let cli = Cli::parse_from(["installer-health", "check", "--only", "content"]);

        match cli.command {
            Command::Check {
                format,
                strict,
                only,
                ..
            } => {
                assert_eq!(format, OutputFormat::Text);
                assert!(!strict);
                assert_eq!(only, Some(Phase::Content));
            }
            _ => panic!("Wrong command parsed"),
        }
        assert!(!cli.log_json);
    }

    #[test]
    fn test_map_command_parsing() {
        let cli = Cli::parse_from(["installer-health", "map", "full-php71-w64.iss", "--reverse"]);

        match cli.command {
            Command::Map {
                filename,
                reverse,
                installer_extension,
                registry_extension,
            } => {
                assert_eq!(filename, "full-php71-w64.iss");
                assert!(reverse);
                assert_eq!(installer_extension, "iss");
                assert_eq!(registry_extension, "json");
            }
            _ => panic!("Wrong command parsed"),
        }
    }

    #[test]
    fn test_identify_default_marker() {
        let cli = Cli::parse_from(["installer-health", "--log-level", "debug", "identify", "x.iss"]);

        match cli.command {
            Command::Identify { web_marker, .. } => assert_eq!(web_marker, "webinstaller"),
            _ => panic!("Wrong command parsed"),
        }
        assert!(matches!(cli.log_level, LogLevel::Debug));
    }

    #[test]
    fn test_invalid_format_rejected() {
        let result = Cli::try_parse_from(["installer-health", "check", "--format", "xml"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_config_requires_both_dirs() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let result = resolve_config(
            Some(temp_dir.path().join("missing.yml")),
            None,
            None,
        );
        assert!(result.is_err());
    }
}
