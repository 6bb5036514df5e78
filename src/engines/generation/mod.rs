pub mod ast;
pub mod operators;
pub mod sequence;
pub mod substitution;
pub mod template;

pub use ast::{Branch, ExprNode, NodePath};
pub use operators::{mutate_sequence, Mutation};
pub use sequence::{CommandBlock, CommandSequence};
pub use substitution::SubstitutionPoint;
pub use template::{parse_label, CommandTemplate, Template};
