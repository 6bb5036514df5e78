use crate::engines::generation::template::parse_label;
use crate::error::Result;
use crate::functions::params;
use crate::functions::traits::{GeneratorCall, SubstitutionState};
use crate::plan::Plan;
use crate::types::ParameterSet;
use rand::RngCore;

/// One `@{...}` occurrence: the unit of targeted mutation.
#[derive(Debug, Clone)]
pub struct SubstitutionPoint {
    head: String,
    site_params: ParameterSet,
    state: SubstitutionState,
    output: String,
}

impl SubstitutionPoint {
    /// Create a point and generate its initial value.
    pub fn new(
        head: impl Into<String>,
        site_params: ParameterSet,
        plan: &Plan,
        rng: &mut dyn RngCore,
    ) -> Result<Self> {
        let mut point = Self {
            head: head.into(),
            site_params,
            state: SubstitutionState::Empty,
            output: String::new(),
        };
        point.generate(plan, rng)?;
        Ok(point)
    }

    /// Create a point from a label such as `numeric min=1 max=9`.
    pub fn from_label(label: &str, plan: &Plan, rng: &mut dyn RngCore) -> Result<Self> {
        let (head, site) = parse_label(label)?;
        Self::new(head, site, plan, rng)
    }

    /// Run the registered generator once, replacing output and state.
    pub fn generate(&mut self, plan: &Plan, rng: &mut dyn RngCore) -> Result<()> {
        let generator = plan.registry().lookup(&self.head)?;
        let merged = params::resolve(
            &self.head,
            &generator.defaults(),
            &self.site_params,
            plan.parameters(),
        );
        let output = {
            let mut call = GeneratorCall {
                head: &self.head,
                params: &merged,
                plan,
                last_output: &self.output,
                state: &mut self.state,
                rng,
            };
            generator.generate(&mut call)?
        };
        self.output = output;
        Ok(())
    }

    pub fn head(&self) -> &str {
        &self.head
    }

    pub fn site_params(&self) -> &ParameterSet {
        &self.site_params
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn state(&self) -> &SubstitutionState {
        &self.state
    }
}
