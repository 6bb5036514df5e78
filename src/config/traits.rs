use crate::error::Result;
use crate::types::ParameterSet;
use serde::{Deserialize, Serialize};

/// A typed section of the run configuration, derived from plan parameters.
pub trait ConfigSection: Serialize + for<'de> Deserialize<'de> + Default + Clone {
    fn section_name() -> &'static str;
    fn from_parameters(params: &ParameterSet) -> Result<Self>;
    fn validate(&self) -> Result<()>;
}
