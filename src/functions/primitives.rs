use crate::error::{FuzzplanError, Result};
use crate::functions::traits::{Generator, GeneratorCall};
use crate::types::ParameterSet;
use rand::Rng;

const ALPHANUMERIC: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const ALPHA: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

fn random_string(alphabet: &[u8], call: &mut GeneratorCall<'_>) -> Result<String> {
    let len = call.params.int("len")?;
    if len < 0 {
        return Err(FuzzplanError::Configuration(format!(
            "'{}' length must not be negative, got {}",
            call.head, len
        )));
    }
    Ok((0..len)
        .map(|_| alphabet[call.rng.gen_range(0..alphabet.len())] as char)
        .collect())
}

/// `@{alphanumeric len=N}`
pub struct Alphanumeric;

impl Generator for Alphanumeric {
    fn defaults(&self) -> ParameterSet {
        ParameterSet::new().with("len", 20i64)
    }

    fn generate(&self, call: &mut GeneratorCall<'_>) -> Result<String> {
        random_string(ALPHANUMERIC, call)
    }
}

/// `@{alpha len=N}`, letters only.
pub struct Alpha;

impl Generator for Alpha {
    fn defaults(&self) -> ParameterSet {
        ParameterSet::new().with("len", 20i64)
    }

    fn generate(&self, call: &mut GeneratorCall<'_>) -> Result<String> {
        random_string(ALPHA, call)
    }
}

/// `@{numeric min=A max=B}`, inclusive on both ends.
pub struct Numeric;

impl Generator for Numeric {
    fn defaults(&self) -> ParameterSet {
        ParameterSet::new()
            .with("min", 0i64)
            .with("max", 1_000_000_000i64)
    }

    fn generate(&self, call: &mut GeneratorCall<'_>) -> Result<String> {
        let min = call.params.int("min")?;
        let max = call.params.int("max")?;
        if min > max {
            return Err(FuzzplanError::Configuration(format!(
                "'{}' needs min <= max, got min={} max={}",
                call.head, min, max
            )));
        }
        Ok(call.rng.gen_range(min..=max).to_string())
    }
}

/// `@{float min=A max=B}`
pub struct Float;

impl Generator for Float {
    fn defaults(&self) -> ParameterSet {
        ParameterSet::new().with("min", 0.0).with("max", 1.0)
    }

    fn generate(&self, call: &mut GeneratorCall<'_>) -> Result<String> {
        let min = call.params.float("min")?;
        let max = call.params.float("max")?;
        if !(min.is_finite() && max.is_finite()) || min > max {
            return Err(FuzzplanError::Configuration(format!(
                "'{}' needs finite min <= max, got min={} max={}",
                call.head, min, max
            )));
        }
        if min == max {
            return Ok(min.to_string());
        }
        // Interpolating keeps huge spans such as [-1e308, 1e308] finite.
        let u: f64 = call.rng.gen();
        Ok((u * max + (1.0 - u) * min).clamp(min, max).to_string())
    }
}
