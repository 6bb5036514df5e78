use super::traits::ConfigSection;
use crate::error::{FuzzplanError, Result};
use crate::types::ParameterSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Random,
    Guided,
    Annealing,
}

impl FromStr for SearchMode {
    type Err = FuzzplanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "random" => Ok(SearchMode::Random),
            "guided" => Ok(SearchMode::Guided),
            "annealing" | "anneal" => Ok(SearchMode::Annealing),
            other => Err(FuzzplanError::Configuration(format!(
                "Unrecognized mode: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SearchMode::Random => "random",
            SearchMode::Guided => "guided",
            SearchMode::Annealing => "annealing",
        })
    }
}

/// How many trials a run may take. Trials are numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialBudget {
    Unlimited,
    Limited(u64),
}

impl TrialBudget {
    /// Negative means run until stopped.
    pub fn from_count(n_trials: i64) -> Self {
        if n_trials < 0 {
            TrialBudget::Unlimited
        } else {
            TrialBudget::Limited(n_trials as u64)
        }
    }

    pub fn permits(&self, trial: u64) -> bool {
        match self {
            TrialBudget::Unlimited => true,
            TrialBudget::Limited(n) => trial <= *n,
        }
    }

    pub fn limit(&self) -> Option<u64> {
        match self {
            TrialBudget::Unlimited => None,
            TrialBudget::Limited(n) => Some(*n),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub mode: SearchMode,
    pub n_commands: i64,
    pub n_trials: i64,
    pub n_mutants: i64,
    pub prob_mutate_substitution: f64,
    /// Guided-mode worker threads; 1 runs mutants in order, 0 uses every core.
    pub n_workers: i64,
    pub seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            mode: SearchMode::Random,
            n_commands: 20,
            n_trials: -1,
            n_mutants: 5,
            prob_mutate_substitution: 0.5,
            n_workers: 1,
            seed: None,
        }
    }
}

impl SearchConfig {
    pub fn budget(&self) -> TrialBudget {
        TrialBudget::from_count(self.n_trials)
    }
}

impl ConfigSection for SearchConfig {
    fn section_name() -> &'static str {
        "search"
    }

    fn from_parameters(params: &ParameterSet) -> Result<Self> {
        let defaults = Self::default();
        let seed = match params.get("seed") {
            None => None,
            Some(_) => {
                let seed = params.int("seed")?;
                if seed < 0 {
                    return Err(FuzzplanError::Configuration(format!(
                        "seed must not be negative, got {}",
                        seed
                    )));
                }
                Some(seed as u64)
            }
        };
        let config = Self {
            mode: params.string_or("mode", "random").parse()?,
            n_commands: params.int_or("nCommands", defaults.n_commands)?,
            n_trials: params.int_or("nTrials", defaults.n_trials)?,
            n_mutants: params.int_or("nMutants", defaults.n_mutants)?,
            prob_mutate_substitution: params
                .float_or("fuzzProbMutateSubstitution", defaults.prob_mutate_substitution)?,
            n_workers: params.int_or("nWorkers", defaults.n_workers)?,
            seed,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.n_commands < 1 {
            return Err(FuzzplanError::Configuration(format!(
                "nCommands must be at least 1, got {}",
                self.n_commands
            )));
        }
        if !(0.0..=1.0).contains(&self.prob_mutate_substitution) {
            return Err(FuzzplanError::Configuration(format!(
                "fuzzProbMutateSubstitution must be between 0 and 1, got {}",
                self.prob_mutate_substitution
            )));
        }
        if self.mode == SearchMode::Guided && self.n_mutants < 1 {
            return Err(FuzzplanError::Configuration(format!(
                "nMutants must be at least 1 in guided mode, got {}",
                self.n_mutants
            )));
        }
        if self.mode == SearchMode::Annealing && self.n_trials < 0 {
            return Err(FuzzplanError::Configuration(
                "annealing needs a fixed step budget; set nTrials >= 0".to_string(),
            ));
        }
        if self.n_workers < 0 {
            return Err(FuzzplanError::Configuration(format!(
                "nWorkers must not be negative, got {}",
                self.n_workers
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_policy() {
        let unlimited = TrialBudget::from_count(-1);
        assert!(unlimited.permits(1) && unlimited.permits(u64::MAX));
        let three = TrialBudget::from_count(3);
        assert!(three.permits(1) && three.permits(3));
        assert!(!three.permits(4));
        assert!(!TrialBudget::from_count(0).permits(1));
    }

    #[test]
    fn test_from_parameters() {
        let params = ParameterSet::new()
            .with("mode", "guided")
            .with("nCommands", 2i64)
            .with("nTrials", 10i64)
            .with("nMutants", 3i64)
            .with("seed", 42i64);
        let config = SearchConfig::from_parameters(&params).unwrap();
        assert_eq!(config.mode, SearchMode::Guided);
        assert_eq!(config.n_mutants, 3);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.budget(), TrialBudget::Limited(10));
    }

    #[test]
    fn test_validation_failures() {
        let bad = [
            ParameterSet::new().with("mode", "sideways"),
            ParameterSet::new().with("nCommands", 0i64),
            ParameterSet::new().with("fuzzProbMutateSubstitution", 1.5),
            ParameterSet::new().with("mode", "guided").with("nMutants", 0i64),
            ParameterSet::new().with("mode", "annealing").with("nTrials", -1i64),
            ParameterSet::new().with("nWorkers", -2i64),
            ParameterSet::new().with("seed", -5i64),
        ];
        for params in bad {
            assert!(
                matches!(SearchConfig::from_parameters(&params), Err(FuzzplanError::Configuration(_))),
                "{:?} should be rejected",
                params
            );
        }
    }
}
