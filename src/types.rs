use crate::error::{FuzzplanError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A typed plan or site parameter.
///
/// Site parameters written inside `@{...}` always arrive as strings; the
/// typed accessors convert on demand so generators never care where a value
/// came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Integer(i64),
    Float(f64),
    String(String),
}

/// Integral floats inside the i64 range; `i64::MAX as f64` rounds up to 2^63.
fn integral(f: f64) -> Option<i64> {
    (f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64).then(|| f as i64)
}

impl ParamValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Integer(i) => Some(*i),
            ParamValue::Float(f) => integral(*f),
            ParamValue::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(integral))
            }
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParamValue::Integer(i) => Some(*i as f64),
            ParamValue::Float(f) => Some(*f),
            ParamValue::String(s) => s.trim().parse::<f64>().ok(),
        }
    }

    pub fn as_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Integer(i) => write!(f, "{}", i),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::String(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Integer(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::String(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::String(value)
    }
}

/// Mapping from parameter key to typed value.
///
/// `owner` names whoever the set belongs to (a generator head, or `plan`) and
/// only feeds error messages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    owner: Option<String>,
    values: BTreeMap<String, ParamValue>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owned_by(owner: impl Into<String>) -> Self {
        Self {
            owner: Some(owner.into()),
            values: BTreeMap::new(),
        }
    }

    pub fn owner(&self) -> &str {
        self.owner.as_deref().unwrap_or("plan")
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.values.iter()
    }

    /// Overlay every entry of `other` on top of this set.
    pub fn extend_from(&mut self, other: &ParameterSet) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Entries keyed `"<scope>.<rest>"`, re-keyed as `rest`.
    pub fn scoped(&self, scope: &str) -> ParameterSet {
        let prefix = format!("{}.", scope);
        let mut out = ParameterSet::owned_by(scope);
        for (key, value) in &self.values {
            if let Some(rest) = key.strip_prefix(&prefix) {
                out.values.insert(rest.to_string(), value.clone());
            }
        }
        out
    }

    fn require(&self, key: &str) -> Result<&ParamValue> {
        self.values.get(key).ok_or_else(|| {
            FuzzplanError::Configuration(format!(
                "missing parameter '{}' for '{}'",
                key,
                self.owner()
            ))
        })
    }

    pub fn int(&self, key: &str) -> Result<i64> {
        let value = self.require(key)?;
        value.as_int().ok_or_else(|| {
            FuzzplanError::Configuration(format!(
                "parameter '{}' for '{}' is not an integer: {}",
                key,
                self.owner(),
                value
            ))
        })
    }

    pub fn float(&self, key: &str) -> Result<f64> {
        let value = self.require(key)?;
        value.as_float().ok_or_else(|| {
            FuzzplanError::Configuration(format!(
                "parameter '{}' for '{}' is not a number: {}",
                key,
                self.owner(),
                value
            ))
        })
    }

    pub fn string(&self, key: &str) -> Result<String> {
        self.require(key).map(ParamValue::as_string)
    }

    pub fn int_or(&self, key: &str, default: i64) -> Result<i64> {
        if self.contains(key) {
            self.int(key)
        } else {
            Ok(default)
        }
    }

    pub fn float_or(&self, key: &str, default: f64) -> Result<f64> {
        if self.contains(key) {
            self.float(key)
        } else {
            Ok(default)
        }
    }

    pub fn string_or(&self, key: &str, default: &str) -> String {
        self.get(key)
            .map(ParamValue::as_string)
            .unwrap_or_else(|| default.to_string())
    }
}

impl FromIterator<(String, ParamValue)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (String, ParamValue)>>(iter: I) -> Self {
        Self {
            owner: None,
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_values_convert_on_demand() {
        let params = ParameterSet::owned_by("numeric")
            .with("min", "3")
            .with("max", " 7 ")
            .with("ratio", "0.25");
        assert_eq!(params.int("min").unwrap(), 3);
        assert_eq!(params.int("max").unwrap(), 7);
        assert_eq!(params.float("ratio").unwrap(), 0.25);
        assert!(params.int("ratio").is_err());
    }

    #[test]
    fn test_out_of_range_floats_are_not_integers() {
        assert_eq!(ParamValue::Float(1e300).as_int(), None);
        assert_eq!(ParamValue::Float(-1e300).as_int(), None);
        assert_eq!(ParamValue::Float(9.223372036854775807e18).as_int(), None);
        assert_eq!(ParamValue::from("1e300").as_int(), None);
        assert_eq!(ParamValue::Float(f64::INFINITY).as_int(), None);
        assert_eq!(ParamValue::Float(f64::NAN).as_int(), None);
        assert_eq!(ParamValue::Float(-9.223372036854775808e18).as_int(), Some(i64::MIN));
        assert_eq!(ParamValue::from("4e3").as_int(), Some(4000));
        assert!(ParameterSet::new().with("max", 1e300).int("max").is_err());
    }

    #[test]
    fn test_missing_parameter_names_owner() {
        let params = ParameterSet::owned_by("numeric");
        let err = params.int("max").unwrap_err().to_string();
        assert!(err.contains("max"));
        assert!(err.contains("numeric"));
    }

    #[test]
    fn test_scoped_strips_prefix() {
        let params = ParameterSet::new()
            .with("numeric.max", 10i64)
            .with("numericx.max", 99i64)
            .with("nCommands", 3i64);
        let scoped = params.scoped("numeric");
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped.int("max").unwrap(), 10);
    }
}
