pub mod expression;
pub mod params;
pub mod primitives;
pub mod registry;
pub mod traits;

pub use expression::{Expression, TreeEdit};
pub use registry::{GeneratorRegistry, RegistryBuilder};
pub use traits::{FnGenerator, Generator, GeneratorCall, SubstitutionState};
