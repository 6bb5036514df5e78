pub mod config;
pub mod engines;
pub mod error;
pub mod functions;
pub mod plan;
pub mod types;

pub use config::{AppConfig, SearchMode};
pub use engines::evaluation::{ExecutionResult, Executor, ProcessOutput, ScriptExecutor};
pub use engines::generation::{CommandBlock, CommandSequence, CommandTemplate};
pub use engines::search::{SearchEngine, SearchOutcome, SearchReport};
pub use error::{FuzzplanError, Result};
pub use functions::{Generator, GeneratorRegistry};
pub use plan::Plan;
pub use types::{ParamValue, ParameterSet};
