pub mod annealing;
pub mod execution;
pub mod manager;
pub mod search;
pub mod traits;

pub use annealing::AnnealingConfig;
pub use execution::ExecutionConfig;
pub use manager::{load_overrides, parse_overrides, AppConfig};
pub use search::{SearchConfig, SearchMode, TrialBudget};
pub use traits::ConfigSection;
