use crate::error::{FuzzplanError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Output token read by the guided and annealing searches.
pub const OBJECTIVE_KEY: &str = "OBJECTIVE";

static OUTPUT_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z0-9_]+):=(.*)$").expect("output value pattern is valid"));

/// `TOKEN:=VALUE` pairs scraped from one execution's standard output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    values: BTreeMap<String, String>,
}

impl ExecutionResult {
    /// Scan stdout line by line; later lines overwrite earlier ones for the
    /// same token and anything not matching the pattern is skipped.
    pub fn from_stdout(stdout: &str) -> Self {
        let mut values = BTreeMap::new();
        for line in stdout.lines() {
            if let Some(captures) = OUTPUT_VALUE.captures(line.trim_end()) {
                values.insert(captures[1].to_string(), captures[2].to_string());
            }
        }
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The objective as a number, or `None` when absent or unparsable.
    pub fn objective(&self) -> Option<f64> {
        self.objective_value().ok()
    }

    pub fn objective_value(&self) -> Result<f64> {
        parse_objective(self.get(OBJECTIVE_KEY))
    }
}

/// Parse a raw objective string. NaN counts as unparsable so objectives
/// always compare totally.
pub fn parse_objective(raw: Option<&str>) -> Result<f64> {
    let raw = raw.ok_or_else(|| {
        FuzzplanError::ObjectiveParse(format!("no {} value was reported", OBJECTIVE_KEY))
    })?;
    match raw.trim().parse::<f64>() {
        Ok(value) if !value.is_nan() => Ok(value),
        _ => Err(FuzzplanError::ObjectiveParse(format!(
            "{} value is not numeric: {:?}",
            OBJECTIVE_KEY, raw
        ))),
    }
}
