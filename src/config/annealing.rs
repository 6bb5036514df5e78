use super::traits::ConfigSection;
use crate::error::{FuzzplanError, Result};
use crate::types::ParameterSet;
use serde::{Deserialize, Serialize};

/// Exponential cooling between `t_max` and `t_min`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnealingConfig {
    pub t_max: f64,
    pub t_min: f64,
}

impl Default for AnnealingConfig {
    fn default() -> Self {
        Self {
            t_max: 25000.0,
            t_min: 2.5,
        }
    }
}

impl ConfigSection for AnnealingConfig {
    fn section_name() -> &'static str {
        "anneal"
    }

    fn from_parameters(params: &ParameterSet) -> Result<Self> {
        let defaults = Self::default();
        let scoped = params.scoped(Self::section_name());
        let config = Self {
            t_max: scoped.float_or("tmax", defaults.t_max)?,
            t_min: scoped.float_or("tmin", defaults.t_min)?,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(self.t_min.is_finite() && self.t_min > 0.0) {
            return Err(FuzzplanError::Configuration(format!(
                "anneal.tmin must be positive, got {}",
                self.t_min
            )));
        }
        if !(self.t_max.is_finite() && self.t_max > self.t_min) {
            return Err(FuzzplanError::Configuration(format!(
                "anneal.tmax must exceed anneal.tmin, got tmax={} tmin={}",
                self.t_max, self.t_min
            )));
        }
        Ok(())
    }
}
