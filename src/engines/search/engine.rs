use super::annealing::{accept, CoolingSchedule};
use super::guided::{evaluate_mutants, select_incumbent};
use super::progress::{ProgressCallback, TrialReport};
use crate::config::{AppConfig, SearchMode, TrialBudget};
use crate::engines::evaluation::Executor;
use crate::engines::generation::CommandSequence;
use crate::error::{FuzzplanError, Result};
use crate::plan::Plan;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Where a run ended up.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub mode: SearchMode,
    pub trials_run: u64,
    /// The live sequence (random), incumbent (guided) or final state (annealing).
    pub sequence: CommandSequence,
    pub objective: Option<f64>,
    pub best_objective: Option<f64>,
    pub best_sequence: Option<CommandSequence>,
}

impl SearchOutcome {
    pub fn report(&self) -> SearchReport {
        SearchReport {
            mode: self.mode,
            trials_run: self.trials_run,
            final_objective: self.objective,
            best_objective: self.best_objective,
            final_script: self.sequence.script(),
            best_script: self.best_sequence.as_ref().map(CommandSequence::script),
            values: self.sequence.result().values().clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub mode: SearchMode,
    pub trials_run: u64,
    pub final_objective: Option<f64>,
    pub best_objective: Option<f64>,
    pub final_script: String,
    pub best_script: Option<String>,
    /// Tokens scraped from the final sequence's last run.
    pub values: BTreeMap<String, String>,
}

impl SearchReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Drives one search run over a plan.
pub struct SearchEngine<E: Executor> {
    config: AppConfig,
    plan: Arc<Plan>,
    executor: E,
    rng: StdRng,
    pool: Option<rayon::ThreadPool>,
    stop: Arc<AtomicBool>,
}

impl<E: Executor> SearchEngine<E> {
    pub fn new(plan: Arc<Plan>, config: AppConfig, executor: E) -> Result<Self> {
        config.validate()?;

        let rng = match config.search.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let pool = if config.search.mode == SearchMode::Guided && config.search.n_workers != 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.search.n_workers as usize)
                .build()
                .map_err(|e| {
                    FuzzplanError::Configuration(format!("Failed to start worker pool: {}", e))
                })?;
            debug!("guided search using {} workers", pool.current_num_threads());
            Some(pool)
        } else {
            None
        };

        Ok(Self {
            config,
            plan,
            executor,
            rng,
            pool,
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Setting the flag ends the run once the current trial has finished.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn run<C: ProgressCallback>(&mut self, mut callback: C) -> Result<SearchOutcome> {
        let budget = self.config.search.budget();
        info!(
            "Starting {} search, trials: {}",
            self.config.search.mode,
            budget
                .limit()
                .map(|n| n.to_string())
                .unwrap_or_else(|| "unlimited".to_string())
        );

        let outcome = match self.config.search.mode {
            SearchMode::Random => self.run_random(budget, &mut callback)?,
            SearchMode::Guided => self.run_guided(budget, &mut callback)?,
            SearchMode::Annealing => self.run_annealing(budget, &mut callback)?,
        };

        info!(
            "Search finished after {} trials, objective: {:?}, best: {:?}",
            outcome.trials_run, outcome.objective, outcome.best_objective
        );
        Ok(outcome)
    }

    fn keep_going(&self, budget: TrialBudget, trial: u64) -> bool {
        if self.stop.load(Ordering::SeqCst) {
            info!("Stop requested, ending before trial {}", trial);
            return false;
        }
        budget.permits(trial)
    }

    fn run_random<C: ProgressCallback>(
        &mut self,
        budget: TrialBudget,
        callback: &mut C,
    ) -> Result<SearchOutcome> {
        let prob = self.config.search.prob_mutate_substitution;
        let mut sequence = CommandSequence::new(Arc::clone(&self.plan), &mut self.rng)?;
        let mut best: Option<(f64, CommandSequence)> = None;

        let mut trial = 1;
        while self.keep_going(budget, trial) {
            callback.on_trial_start(trial);

            let mutation = sequence.mutate(prob, &mut self.rng)?;
            debug!("trial {}: {:?}", trial, mutation);
            sequence.execute(&self.executor, &mut self.rng)?;

            let objective = match sequence.result().objective_value() {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("trial {}: {}", trial, e);
                    None
                }
            };
            if let Some(value) = objective {
                if best.as_ref().map_or(true, |(b, _)| value > *b) {
                    best = Some((value, sequence.clone()));
                }
            }

            callback.on_trial_complete(
                trial,
                &TrialReport {
                    objective,
                    best_objective: best.as_ref().map(|(b, _)| *b),
                    accepted: true,
                    temperature: None,
                },
            );
            trial += 1;
        }

        let (best_objective, best_sequence) = match best {
            Some((value, seq)) => (Some(value), Some(seq)),
            None => (None, None),
        };
        Ok(SearchOutcome {
            mode: SearchMode::Random,
            trials_run: trial - 1,
            objective: sequence.objective(),
            sequence,
            best_objective,
            best_sequence,
        })
    }

    fn run_guided<C: ProgressCallback>(
        &mut self,
        budget: TrialBudget,
        callback: &mut C,
    ) -> Result<SearchOutcome> {
        let prob = self.config.search.prob_mutate_substitution;
        let n_mutants = self.config.search.n_mutants as usize;
        let mut incumbent = CommandSequence::new(Arc::clone(&self.plan), &mut self.rng)?;
        let mut incumbent_objective: Option<f64> = None;

        let mut trial = 1;
        while self.keep_going(budget, trial) {
            callback.on_trial_start(trial);

            let seeds: Vec<u64> = (0..n_mutants).map(|_| self.rng.gen()).collect();
            let mut candidates =
                evaluate_mutants(&incumbent, &seeds, prob, &self.executor, self.pool.as_ref())?;
            let objectives: Vec<Option<f64>> = candidates
                .iter()
                .enumerate()
                .map(|(i, candidate)| match candidate.result().objective_value() {
                    Ok(value) => Some(value),
                    Err(e) => {
                        warn!("trial {} mutant {}: {}", trial, i, e);
                        None
                    }
                })
                .collect();
            debug!("trial {} candidate objectives: {:?}", trial, objectives);

            let chosen = select_incumbent(incumbent_objective, &objectives);
            if let Some(index) = chosen {
                incumbent = candidates.swap_remove(index);
                incumbent_objective = objectives[index];
                info!("New incumbent with objective {:?}", incumbent_objective);
            }

            callback.on_trial_complete(
                trial,
                &TrialReport {
                    objective: objectives.iter().flatten().copied().reduce(f64::max),
                    best_objective: incumbent_objective,
                    accepted: chosen.is_some(),
                    temperature: None,
                },
            );
            trial += 1;
        }

        Ok(SearchOutcome {
            mode: SearchMode::Guided,
            trials_run: trial - 1,
            best_sequence: incumbent_objective.map(|_| incumbent.clone()),
            sequence: incumbent,
            objective: incumbent_objective,
            best_objective: incumbent_objective,
        })
    }

    fn run_annealing<C: ProgressCallback>(
        &mut self,
        budget: TrialBudget,
        callback: &mut C,
    ) -> Result<SearchOutcome> {
        let steps = budget.limit().ok_or_else(|| {
            FuzzplanError::Configuration("annealing needs a fixed step budget".to_string())
        })?;
        let schedule = CoolingSchedule::from_config(&self.config.annealing, steps);
        let prob = self.config.search.prob_mutate_substitution;

        let mut current = CommandSequence::new(Arc::clone(&self.plan), &mut self.rng)?;
        current.execute(&self.executor, &mut self.rng)?;
        let mut energy = -current.result().objective_value()?;
        let mut best = (energy, current.clone());
        debug!("initial energy {}", energy);

        let mut trial = 1;
        while self.keep_going(budget, trial) {
            callback.on_trial_start(trial);
            let temperature = schedule.temperature(trial - 1);

            let previous = current.clone();
            current.mutate(prob, &mut self.rng)?;
            current.execute(&self.executor, &mut self.rng)?;
            let candidate_energy = -current.result().objective_value()?;

            let accepted = accept(candidate_energy - energy, temperature, &mut self.rng);
            if accepted {
                energy = candidate_energy;
                if energy < best.0 {
                    best = (energy, current.clone());
                }
            } else {
                current = previous;
            }

            callback.on_trial_complete(
                trial,
                &TrialReport {
                    objective: Some(-candidate_energy),
                    best_objective: Some(-best.0),
                    accepted,
                    temperature: Some(temperature),
                },
            );
            trial += 1;
        }

        info!("Final energy {}, best energy {}", energy, best.0);
        Ok(SearchOutcome {
            mode: SearchMode::Annealing,
            trials_run: trial - 1,
            sequence: current,
            objective: Some(-energy),
            best_objective: Some(-best.0),
            best_sequence: Some(best.1),
        })
    }
}
