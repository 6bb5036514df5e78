use crate::config::AnnealingConfig;
use rand::{Rng, RngCore};

/// Exponential cooling from `t_max` at step 0 towards `t_min` at `steps`.
#[derive(Debug, Clone, Copy)]
pub struct CoolingSchedule {
    t_max: f64,
    t_min: f64,
    steps: u64,
}

impl CoolingSchedule {
    pub fn new(t_max: f64, t_min: f64, steps: u64) -> Self {
        Self { t_max, t_min, steps }
    }

    pub fn from_config(config: &AnnealingConfig, steps: u64) -> Self {
        Self::new(config.t_max, config.t_min, steps)
    }

    pub fn temperature(&self, step: u64) -> f64 {
        if self.steps == 0 {
            return self.t_max;
        }
        let progress = step.min(self.steps) as f64 / self.steps as f64;
        self.t_max * (-(self.t_max / self.t_min).ln() * progress).exp()
    }
}

/// Metropolis criterion on an energy change.
pub fn accept(delta_energy: f64, temperature: f64, rng: &mut dyn RngCore) -> bool {
    if delta_energy <= 0.0 {
        return true;
    }
    rng.gen::<f64>() < (-delta_energy / temperature).exp()
}
