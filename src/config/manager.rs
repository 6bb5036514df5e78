use super::{
    annealing::AnnealingConfig, execution::ExecutionConfig, search::SearchConfig,
    traits::ConfigSection,
};
use crate::error::{FuzzplanError, Result};
use crate::plan::Plan;
use crate::types::{ParamValue, ParameterSet};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Effective run configuration, derived from a plan's parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub search: SearchConfig,
    pub annealing: AnnealingConfig,
    pub execution: ExecutionConfig,
}

impl AppConfig {
    pub fn from_plan(plan: &Plan) -> Result<Self> {
        let config = Self::from_parameters(plan.parameters())?;
        if plan.body_blocks().is_empty() {
            return Err(FuzzplanError::Configuration(
                "plan has no body blocks".to_string(),
            ));
        }
        Ok(config)
    }

    pub fn from_parameters(params: &ParameterSet) -> Result<Self> {
        Ok(Self {
            search: SearchConfig::from_parameters(params)?,
            annealing: AnnealingConfig::from_parameters(params)?,
            execution: ExecutionConfig::from_parameters(params)?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.search.validate()?;
        self.annealing.validate()?;
        self.execution.validate()?;
        Ok(())
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| FuzzplanError::Configuration(format!("Failed to serialize: {}", e)))
    }
}

/// Read a TOML overlay of plan parameters.
pub fn load_overrides<P: AsRef<Path>>(path: P) -> Result<ParameterSet> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| FuzzplanError::Configuration(format!("Failed to read config: {}", e)))?;
    parse_overrides(&contents)
}

/// Top-level keys become bare parameters; tables become scoped ones, so
/// `[numeric] max = 5` sets `numeric.max`.
pub fn parse_overrides(contents: &str) -> Result<ParameterSet> {
    let table: toml::Table = toml::from_str(contents)
        .map_err(|e| FuzzplanError::Configuration(format!("Failed to parse config: {}", e)))?;
    let mut params = ParameterSet::new();
    flatten("", &table, &mut params)?;
    Ok(params)
}

fn flatten(prefix: &str, table: &toml::Table, out: &mut ParameterSet) -> Result<()> {
    for (key, value) in table {
        let key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        let value = match value {
            toml::Value::Table(inner) => {
                flatten(&key, inner, out)?;
                continue;
            }
            toml::Value::String(s) => ParamValue::String(s.clone()),
            toml::Value::Integer(i) => ParamValue::Integer(*i),
            toml::Value::Float(f) => ParamValue::Float(*f),
            toml::Value::Boolean(b) => ParamValue::Integer(*b as i64),
            other => {
                return Err(FuzzplanError::Configuration(format!(
                    "unsupported value for '{}': {}",
                    key, other
                )))
            }
        };
        out.insert(key, value);
    }
    Ok(())
}
