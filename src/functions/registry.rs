use crate::error::{FuzzplanError, Result};
use crate::functions::{
    expression::Expression,
    primitives::{Alpha, Alphanumeric, Float, Numeric},
    traits::{FnGenerator, Generator, GeneratorCall},
};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

/// Two-tier generator lookup: user-supplied generators shadow built-ins.
///
/// A registry is assembled once through [`RegistryBuilder`] and is read-only
/// afterwards; the plan shares it behind an `Arc`.
pub struct GeneratorRegistry {
    user: HashMap<String, Arc<dyn Generator>>,
    builtin: HashMap<String, Arc<dyn Generator>>,
}

impl GeneratorRegistry {
    /// Registry holding only the built-in generators.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder {
            user: HashMap::new(),
        }
    }

    pub fn lookup(&self, head: &str) -> Result<&dyn Generator> {
        self.user
            .get(head)
            .or_else(|| self.builtin.get(head))
            .map(|g| g.as_ref())
            .ok_or_else(|| FuzzplanError::UnknownSubstitutionType(head.to_string()))
    }

    pub fn contains(&self, head: &str) -> bool {
        self.user.contains_key(head) || self.builtin.contains_key(head)
    }

    pub fn is_user_defined(&self, head: &str) -> bool {
        self.user.contains_key(head)
    }

    /// Every resolvable head, sorted.
    pub fn heads(&self) -> Vec<String> {
        self.user
            .keys()
            .chain(self.builtin.keys())
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn builtins() -> HashMap<String, Arc<dyn Generator>> {
        let generators: Vec<(&str, Arc<dyn Generator>)> = vec![
            ("alphanumeric", Arc::new(Alphanumeric)),
            ("alpha", Arc::new(Alpha)),
            ("numeric", Arc::new(Numeric)),
            ("float", Arc::new(Float)),
            ("expr", Arc::new(Expression)),
        ];
        generators
            .into_iter()
            .map(|(head, generator)| (head.to_string(), generator))
            .collect()
    }
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorRegistry")
            .field("heads", &self.heads())
            .finish()
    }
}

pub struct RegistryBuilder {
    user: HashMap<String, Arc<dyn Generator>>,
}

impl RegistryBuilder {
    pub fn register<G: Generator + 'static>(mut self, head: impl Into<String>, generator: G) -> Self {
        self.user.insert(head.into(), Arc::new(generator));
        self
    }

    pub fn register_fn<F>(self, head: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut GeneratorCall<'_>) -> Result<String> + Send + Sync + 'static,
    {
        self.register(head, FnGenerator::new(func))
    }

    pub fn build(self) -> GeneratorRegistry {
        GeneratorRegistry {
            user: self.user,
            builtin: GeneratorRegistry::builtins(),
        }
    }
}
