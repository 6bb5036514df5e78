use crate::engines::generation::ast::ExprNode;
use crate::error::Result;
use crate::plan::Plan;
use crate::types::ParameterSet;
use rand::RngCore;

/// Mutable state owned by one substitution point between generator calls.
///
/// The state is a plain value: cloning a point clones its state, so two
/// speculative copies of a sequence never share anything mutable.
#[derive(Debug, Clone, Default)]
pub enum SubstitutionState {
    #[default]
    Empty,
    /// Persisted syntax tree of the `expr` generator.
    Tree(ExprNode),
    /// Free-form state for user generators.
    Opaque(serde_json::Value),
}

impl SubstitutionState {
    pub fn is_empty(&self) -> bool {
        matches!(self, SubstitutionState::Empty)
    }

    pub fn as_tree(&self) -> Option<&ExprNode> {
        match self {
            SubstitutionState::Tree(tree) => Some(tree),
            _ => None,
        }
    }
}

/// Everything a generator sees for one call.
pub struct GeneratorCall<'a> {
    /// Grammar head the generator was looked up under.
    pub head: &'a str,
    /// Built-in defaults, plan-wide scoped defaults and site parameters,
    /// already merged.
    pub params: &'a ParameterSet,
    /// Shared plan, for nested lookups such as sub-generators.
    pub plan: &'a Plan,
    /// Output of the previous call on this point, empty on the first call.
    pub last_output: &'a str,
    /// The point's state; generators may replace it.
    pub state: &'a mut SubstitutionState,
    pub rng: &'a mut dyn RngCore,
}

/// A grammar head's generation function.
pub trait Generator: Send + Sync {
    /// Lowest-precedence parameter defaults for this generator.
    fn defaults(&self) -> ParameterSet {
        ParameterSet::new()
    }

    /// Produce the next output for a substitution point.
    fn generate(&self, call: &mut GeneratorCall<'_>) -> Result<String>;
}

/// Adapts a closure into a [`Generator`] with no built-in defaults.
pub struct FnGenerator<F> {
    func: F,
}

impl<F> FnGenerator<F>
where
    F: Fn(&mut GeneratorCall<'_>) -> Result<String> + Send + Sync,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Generator for FnGenerator<F>
where
    F: Fn(&mut GeneratorCall<'_>) -> Result<String> + Send + Sync,
{
    fn generate(&self, call: &mut GeneratorCall<'_>) -> Result<String> {
        (self.func)(call)
    }
}
