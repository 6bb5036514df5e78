pub mod annealing;
pub mod engine;
pub mod guided;
pub mod progress;

pub use annealing::{accept, CoolingSchedule};
pub use engine::{SearchEngine, SearchOutcome, SearchReport};
pub use guided::{evaluate_mutants, select_incumbent};
pub use progress::{
    ChannelProgressCallback, ConsoleProgressCallback, ProgressCallback, ProgressMessage,
    SilentProgressCallback, TrialReport,
};
