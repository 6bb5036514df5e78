use crate::error::{FuzzplanError, Result};
use crate::functions::registry::GeneratorRegistry;
use crate::plan::parser::{parse_plan, ParsedPlan};
use crate::types::{ParamValue, ParameterSet};
use std::path::Path;
use std::sync::Arc;

/// A loaded fuzzing plan: global parameters, header and footer lines, and
/// the catalog of body blocks.
///
/// Immutable once built; sequences and their clones share it through an
/// `Arc`.
#[derive(Debug, Clone)]
pub struct Plan {
    parameters: ParameterSet,
    header: Vec<String>,
    footer: Vec<String>,
    body_blocks: Vec<Vec<String>>,
    registry: Arc<GeneratorRegistry>,
}

impl Plan {
    /// Plan-wide defaults; per-generator defaults live with the generators.
    pub fn default_parameters() -> ParameterSet {
        ParameterSet::new()
            .with("nCommands", 20i64)
            .with("nTrials", -1i64)
            .with("mode", "random")
            .with("nMutants", 5i64)
            .with("fuzzProbMutateSubstitution", 0.5)
    }

    pub fn new(
        parameters: ParameterSet,
        header: Vec<String>,
        footer: Vec<String>,
        body_blocks: Vec<Vec<String>>,
    ) -> Self {
        let mut merged = Self::default_parameters();
        merged.extend_from(&parameters);
        Self {
            parameters: merged,
            header,
            footer,
            body_blocks,
            registry: Arc::new(GeneratorRegistry::new()),
        }
    }

    /// A plan with defaults only and no commands.
    pub fn empty() -> Self {
        Self::new(ParameterSet::new(), Vec::new(), Vec::new(), Vec::new())
    }

    pub fn parse(text: &str) -> Result<Self> {
        let ParsedPlan {
            parameters,
            header,
            footer,
            body_blocks,
        } = parse_plan(text)?;
        Ok(Self::new(parameters, header, footer, body_blocks))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            FuzzplanError::Configuration(format!(
                "Failed to read plan {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&text)
    }

    pub fn with_registry(mut self, registry: Arc<GeneratorRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Overlay parameters on top of the plan's own.
    pub fn with_overrides(mut self, overrides: &ParameterSet) -> Self {
        self.parameters.extend_from(overrides);
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: ParamValue) -> Self {
        self.parameters.insert(key, value);
        self
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn footer(&self) -> &[String] {
        &self.footer
    }

    pub fn body_blocks(&self) -> &[Vec<String>] {
        &self.body_blocks
    }

    pub fn registry(&self) -> &GeneratorRegistry {
        &self.registry
    }
}
