use super::traits::ConfigSection;
use crate::error::{FuzzplanError, Result};
use crate::types::ParameterSet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    pub shell: String,
    /// Print every stdout line of every script run.
    pub echo_output: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            shell: "/bin/sh".to_string(),
            echo_output: true,
        }
    }
}

impl ConfigSection for ExecutionConfig {
    fn section_name() -> &'static str {
        "execution"
    }

    fn from_parameters(params: &ParameterSet) -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            shell: params.string_or("shell", &defaults.shell),
            echo_output: params.int_or("echoOutput", defaults.echo_output as i64)? != 0,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.shell.trim().is_empty() {
            return Err(FuzzplanError::Configuration(
                "shell must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
