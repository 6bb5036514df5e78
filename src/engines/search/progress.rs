use std::sync::mpsc::Sender;

/// What a finished trial looked like.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialReport {
    /// Objective of the sequence that was just executed.
    pub objective: Option<f64>,
    pub best_objective: Option<f64>,
    /// Whether the step moved the search (always true for random walks).
    pub accepted: bool,
    /// Annealing temperature for the step.
    pub temperature: Option<f64>,
}

pub trait ProgressCallback: Send {
    fn on_trial_start(&mut self, trial: u64);
    fn on_trial_complete(&mut self, trial: u64, report: &TrialReport);
}

pub struct ConsoleProgressCallback;

impl ProgressCallback for ConsoleProgressCallback {
    fn on_trial_start(&mut self, trial: u64) {
        println!("======== TRIAL {}", trial);
    }

    fn on_trial_complete(&mut self, trial: u64, report: &TrialReport) {
        let objective = report
            .objective
            .map(|o| o.to_string())
            .unwrap_or_else(|| "none".to_string());
        let best = report
            .best_objective
            .map(|o| o.to_string())
            .unwrap_or_else(|| "none".to_string());
        match report.temperature {
            Some(t) => println!(
                "Trial {} complete. Objective: {}, best: {}, accepted: {}, T={:.4}",
                trial, objective, best, report.accepted, t
            ),
            None => println!(
                "Trial {} complete. Objective: {}, best: {}",
                trial, objective, best
            ),
        }
    }
}

/// Ignores every event.
pub struct SilentProgressCallback;

impl ProgressCallback for SilentProgressCallback {
    fn on_trial_start(&mut self, _trial: u64) {}
    fn on_trial_complete(&mut self, _trial: u64, _report: &TrialReport) {}
}

// Forwards events to another thread, e.g. a watcher that decides when to stop.
pub struct ChannelProgressCallback {
    sender: Sender<ProgressMessage>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressMessage {
    TrialStart(u64),
    TrialComplete { trial: u64, report: TrialReport },
}

impl ChannelProgressCallback {
    pub fn new(sender: Sender<ProgressMessage>) -> Self {
        Self { sender }
    }
}

impl ProgressCallback for ChannelProgressCallback {
    fn on_trial_start(&mut self, trial: u64) {
        let _ = self.sender.send(ProgressMessage::TrialStart(trial));
    }

    fn on_trial_complete(&mut self, trial: u64, report: &TrialReport) {
        let _ = self.sender.send(ProgressMessage::TrialComplete {
            trial,
            report: *report,
        });
    }
}
