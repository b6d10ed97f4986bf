//! Installer health checks
//!
//! Cross-validates installer scripts against the JSON registry files that
//! list the components each installer bundles.

pub mod bitsize;
pub mod checker;
pub mod config;
pub mod error;
pub mod installer;
pub mod naming;
pub mod registry;
pub mod report;

pub use bitsize::Bitsize;
pub use checker::{CheckContext, ConsistencyChecker, ContentRule};
pub use config::CheckConfig;
pub use error::{HealthError, Result};
pub use installer::{InstallerIdentity, InstallerScript};
pub use naming::{canonical_identifier, name_section_identifier, NameMapper};
pub use registry::{ComponentRecord, RegistryDescriptor, RegistryLoader};
pub use report::{
    CheckCategory, Finding, MemoryReporter, Report, Reporter, Severity, TracingReporter,
    Verbosity,
};
