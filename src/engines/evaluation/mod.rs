pub mod executor;
pub mod objective;

pub use executor::{Executor, ProcessOutput, ScriptExecutor};
pub use objective::{parse_objective, ExecutionResult, OBJECTIVE_KEY};
