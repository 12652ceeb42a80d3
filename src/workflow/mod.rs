//! Workflow: analyzers feed artifacts, processors amend them, generators
//! write reports.
//!
//! Steps are looked up by name in a [`WorkflowRegistry`]; each factory gets
//! the step's TOML table and builds the step from it.
//!
//! ```toml
//! [[processors]]
//! name = "policy-overrides"
//! [processors.config]
//! forbidden = [{ id = "AGPL-3.0-only" }]
//!
//! [[generators]]
//! name = "markdown-report"
//! ```

use crate::artifact::Artifact;
use crate::policy::{ForbiddenLicense, PolicyConfig, PolicyEngine};
use crate::report::{render_report, ReportFormat};
use crate::{ClearanceError, ClearanceResult};
use serde::Deserialize;
use std::collections::BTreeMap;

// ─── Step Traits ───────────────────────────────────────────────────

/// Produces one artifact per discovered dependency.
///
/// Analyzers only add facts; they never decide the final license.
pub trait Analyzer {
    fn name(&self) -> &str;

    fn analyze(&self) -> ClearanceResult<Vec<Artifact>>;
}

/// Amends artifacts in place
pub trait Processor {
    fn name(&self) -> &str;

    fn process(&self, artifacts: &mut [Artifact]) -> ClearanceResult<()>;
}

/// Renders artifacts into a document
pub trait Generator {
    fn name(&self) -> &str;

    fn generate(&self, artifacts: &[Artifact]) -> ClearanceResult<String>;
}

impl Processor for PolicyEngine {
    fn name(&self) -> &str {
        "policy-overrides"
    }

    fn process(&self, artifacts: &mut [Artifact]) -> ClearanceResult<()> {
        let modified = self.apply(artifacts);
        tracing::info!("Policy overrides touched {} of {} artifacts", modified, artifacts.len());
        Ok(())
    }
}

/// Built-in JSON/Markdown report generator
pub struct ReportGenerator {
    format: ReportFormat,
    policy: PolicyEngine,
}

impl ReportGenerator {
    pub fn new(format: ReportFormat, policy: PolicyEngine) -> Self {
        Self { format, policy }
    }
}

impl Generator for ReportGenerator {
    fn name(&self) -> &str {
        match self.format {
            ReportFormat::Json => "json-report",
            ReportFormat::Markdown => "markdown-report",
        }
    }

    fn generate(&self, artifacts: &[Artifact]) -> ClearanceResult<String> {
        render_report(artifacts, &self.policy, self.format)
    }
}

// ─── Configuration ─────────────────────────────────────────────────

/// One configured step
#[derive(Debug, Clone, Deserialize)]
pub struct StepConfig {
    pub name: String,
    #[serde(default)]
    pub config: toml::Table,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkflowConfig {
    #[serde(default)]
    pub processors: Vec<StepConfig>,
    #[serde(default)]
    pub generators: Vec<StepConfig>,
}

impl WorkflowConfig {
    pub fn from_toml(content: &str) -> ClearanceResult<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Options the built-in report generators read from their table
#[derive(Debug, Default, Deserialize)]
struct ReportOptions {
    #[serde(default)]
    forbidden: Vec<ForbiddenLicense>,
}

fn decode<T: for<'de> Deserialize<'de>>(step: &str, table: &toml::Table) -> ClearanceResult<T> {
    toml::Value::Table(table.clone())
        .try_into()
        .map_err(|e| ClearanceError::Workflow(format!("invalid configuration for '{}': {}", step, e)))
}

// ─── Registry ──────────────────────────────────────────────────────

pub type ProcessorFactory = fn(&toml::Table) -> ClearanceResult<Box<dyn Processor>>;
pub type GeneratorFactory = fn(&toml::Table) -> ClearanceResult<Box<dyn Generator>>;

/// Maps configuration names to step factories
#[derive(Default)]
pub struct WorkflowRegistry {
    processors: BTreeMap<String, ProcessorFactory>,
    generators: BTreeMap<String, GeneratorFactory>,
}

impl WorkflowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in steps
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry
            .register_processor("policy-overrides", policy_overrides)
            .register_generator("json-report", json_report)
            .register_generator("markdown-report", markdown_report);
        registry
    }

    pub fn register_processor(&mut self, name: &str, factory: ProcessorFactory) -> &mut Self {
        self.processors.insert(name.to_string(), factory);
        self
    }

    pub fn register_generator(&mut self, name: &str, factory: GeneratorFactory) -> &mut Self {
        self.generators.insert(name.to_string(), factory);
        self
    }

    pub fn processor(&self, name: &str, config: &toml::Table) -> ClearanceResult<Box<dyn Processor>> {
        let factory = self
            .processors
            .get(name)
            .ok_or_else(|| ClearanceError::Workflow(format!("unknown processor '{}'", name)))?;
        factory(config)
    }

    pub fn generator(&self, name: &str, config: &toml::Table) -> ClearanceResult<Box<dyn Generator>> {
        let factory = self
            .generators
            .get(name)
            .ok_or_else(|| ClearanceError::Workflow(format!("unknown generator '{}'", name)))?;
        factory(config)
    }

    /// Resolve every configured step up front
    pub fn build(&self, config: &WorkflowConfig) -> ClearanceResult<Workflow> {
        let processors = config
            .processors
            .iter()
            .map(|step| self.processor(&step.name, &step.config))
            .collect::<ClearanceResult<Vec<_>>>()?;
        let generators = config
            .generators
            .iter()
            .map(|step| self.generator(&step.name, &step.config))
            .collect::<ClearanceResult<Vec<_>>>()?;
        Ok(Workflow {
            processors,
            generators,
        })
    }
}

fn policy_overrides(table: &toml::Table) -> ClearanceResult<Box<dyn Processor>> {
    let config: PolicyConfig = decode("policy-overrides", table)?;
    config.validate()?;
    Ok(Box::new(PolicyEngine::new(config)))
}

fn report_generator(step: &str, format: ReportFormat, table: &toml::Table) -> ClearanceResult<Box<dyn Generator>> {
    let options: ReportOptions = decode(step, table)?;
    let policy = PolicyEngine::new(PolicyConfig {
        forbidden: options.forbidden,
        ..Default::default()
    });
    Ok(Box::new(ReportGenerator::new(format, policy)))
}

fn json_report(table: &toml::Table) -> ClearanceResult<Box<dyn Generator>> {
    report_generator("json-report", ReportFormat::Json, table)
}

fn markdown_report(table: &toml::Table) -> ClearanceResult<Box<dyn Generator>> {
    report_generator("markdown-report", ReportFormat::Markdown, table)
}

// ─── Run ───────────────────────────────────────────────────────────

/// A generated document, tagged with the generator that wrote it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub generator: String,
    pub content: String,
}

#[derive(Debug, Default)]
pub struct WorkflowOutput {
    pub artifacts: Vec<Artifact>,
    pub documents: Vec<Document>,
}

/// Resolved steps, ready to run
pub struct Workflow {
    processors: Vec<Box<dyn Processor>>,
    generators: Vec<Box<dyn Generator>>,
}

impl Workflow {
    /// Analyze, process in configured order, then generate
    pub fn run(&self, analyzers: &[Box<dyn Analyzer>]) -> ClearanceResult<WorkflowOutput> {
        let mut artifacts = Vec::new();
        for analyzer in analyzers {
            let found = analyzer.analyze()?;
            tracing::info!("{} found {} artifacts", analyzer.name(), found.len());
            artifacts.extend(found);
        }

        for processor in &self.processors {
            tracing::debug!("Running processor {}", processor.name());
            processor.process(&mut artifacts)?;
        }

        let mut documents = Vec::with_capacity(self.generators.len());
        for generator in &self.generators {
            documents.push(Document {
                generator: generator.name().to_string(),
                content: generator.generate(&artifacts)?,
            });
        }

        Ok(WorkflowOutput {
            artifacts,
            documents,
        })
    }
}
