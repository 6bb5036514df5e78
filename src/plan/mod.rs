pub mod model;
pub mod parser;

pub use model::Plan;
pub use parser::{parse_plan, ParsedPlan};
