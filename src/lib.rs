//! # clearance - license-compliance fact model
//!
//! Collects what analyzers learn about third-party artifacts, lets
//! configuration correct it, and decides which license governs each artifact.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                        Workflow                               │
//! │  ┌──────────┐      ┌────────────────┐      ┌──────────────┐   │
//! │  │ Analyzer │ ───▶ │   Processors   │ ───▶ │  Generators  │   │
//! │  │ (facts)  │      │ (policy, …)    │      │ (JSON, MD)   │   │
//! │  └────┬─────┘      └───────┬────────┘      └──────┬───────┘   │
//! │       │ add_fact           │ Selector             │           │
//! │  ┌────▼────────────────────▼──────────────────────▼────────┐  │
//! │  │  Artifact: FactKind → Fact   │   flags   │   source      │  │
//! │  └────────────────────────────┬────────────────────────────┘  │
//! │                               │                               │
//! │  ┌────────────────────────────▼────────────────────────────┐  │
//! │  │  final_license: Configured > Overridden > Decl AND Obs  │  │
//! │  │  License algebra  ◀──── SPDX codec ────▶  text          │  │
//! │  └─────────────────────────────────────────────────────────┘  │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - **license**: license algebra, SPDX expression codec, final-license resolution
//! - **coordinate**: ecosystem package identities and their package-URL form
//! - **selector**: wildcard selectors over artifact identity
//! - **artifact**: the per-artifact fact store
//! - **policy**: `.clearance.toml` overrides, download exclusions, forbidden licenses
//! - **workflow**: analyzer/processor/generator traits and a name-based registry
//! - **report**: JSON and Markdown license reports

pub mod artifact;
pub mod coordinate;
pub mod license;
pub mod policy;
pub mod report;
pub mod selector;
pub mod workflow;

// Re-exports for convenience
pub use artifact::{Artifact, ArtifactFact, Fact, FactKind};
pub use coordinate::{Coordinate, CoordinateType};
pub use license::{final_license, License, LicenseInformation, LicenseOperator, LicenseParseError};
pub use policy::{PolicyConfig, PolicyEngine};
pub use report::{render_report, write_report, ReportFormat};
pub use selector::{ArtifactSelector, FieldPatterns, SelectorSet};
pub use workflow::{Analyzer, Generator, Processor, WorkflowRegistry};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClearanceError {
    #[error("License expression error: {0}")]
    LicenseParse(#[from] LicenseParseError),

    #[error("Invalid coordinate: {0}")]
    Coordinate(String),

    #[error("Invalid selector: {0}")]
    Selector(String),

    #[error("Policy error: {0}")]
    Policy(String),

    #[error("Workflow error: {0}")]
    Workflow(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Configuration parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type ClearanceResult<T> = Result<T, ClearanceError>;
