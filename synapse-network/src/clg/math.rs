//! Arithmetic CLGs.

use synapse_core::error::{Result, SynapseError};
use synapse_core::{Clg, ClgFuture, Context, Value, ValueType};

/// Largest supported rounding precision.
const MAX_PRECISION: i64 = 15;

fn floats(args: &[Value]) -> Result<(f64, f64)> {
    match args {
        [a, b] => Ok((a.expect_float()?, b.expect_float()?)),
        other => Err(SynapseError::invalid_interface(format!(
            "expected 2 arguments, got {}",
            other.len()
        ))),
    }
}

fn float_pair() -> Vec<ValueType> {
    vec![ValueType::Context, ValueType::Float, ValueType::Float]
}

/// Adds two floats.
pub struct Sum;

impl Clg for Sum {
    fn name(&self) -> &str {
        "sum"
    }

    fn input_signature(&self) -> Vec<ValueType> {
        float_pair()
    }

    fn output_signature(&self) -> Vec<ValueType> {
        vec![ValueType::Float]
    }

    fn invoke<'a>(&'a self, _ctx: &'a mut Context, args: Vec<Value>) -> ClgFuture<'a> {
        Box::pin(async move {
            let (a, b) = floats(&args)?;
            Ok(vec![Value::Float(a + b)])
        })
    }
}

/// Subtracts the second float from the first.
pub struct Subtract;

impl Clg for Subtract {
    fn name(&self) -> &str {
        "subtract"
    }

    fn input_signature(&self) -> Vec<ValueType> {
        float_pair()
    }

    fn output_signature(&self) -> Vec<ValueType> {
        vec![ValueType::Float]
    }

    fn invoke<'a>(&'a self, _ctx: &'a mut Context, args: Vec<Value>) -> ClgFuture<'a> {
        Box::pin(async move {
            let (a, b) = floats(&args)?;
            Ok(vec![Value::Float(a - b)])
        })
    }
}

/// Multiplies two floats.
pub struct Multiply;

impl Clg for Multiply {
    fn name(&self) -> &str {
        "multiply"
    }

    fn input_signature(&self) -> Vec<ValueType> {
        float_pair()
    }

    fn output_signature(&self) -> Vec<ValueType> {
        vec![ValueType::Float]
    }

    fn invoke<'a>(&'a self, _ctx: &'a mut Context, args: Vec<Value>) -> ClgFuture<'a> {
        Box::pin(async move {
            let (a, b) = floats(&args)?;
            Ok(vec![Value::Float(a * b)])
        })
    }
}

/// Whether the first float is strictly greater than the second.
pub struct IsGreater;

impl Clg for IsGreater {
    fn name(&self) -> &str {
        "is-greater"
    }

    fn input_signature(&self) -> Vec<ValueType> {
        float_pair()
    }

    fn output_signature(&self) -> Vec<ValueType> {
        vec![ValueType::Bool]
    }

    fn invoke<'a>(&'a self, _ctx: &'a mut Context, args: Vec<Value>) -> ClgFuture<'a> {
        Box::pin(async move {
            let (a, b) = floats(&args)?;
            Ok(vec![Value::Bool(a > b)])
        })
    }
}

/// Rounds a float to a number of decimal places.
pub struct Round;

impl Round {
    /// Round `value` half away from zero to `precision` decimal places.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInterface` if `precision` is outside `0..=15`.
    pub fn round(value: f64, precision: i64) -> Result<f64> {
        if !(0..=MAX_PRECISION).contains(&precision) {
            return Err(SynapseError::invalid_interface(format!(
                "precision must be between 0 and {}, got {}",
                MAX_PRECISION, precision
            )));
        }
        let factor = 10f64.powi(precision as i32);
        Ok((value * factor).round() / factor)
    }
}

impl Clg for Round {
    fn name(&self) -> &str {
        "round"
    }

    fn input_signature(&self) -> Vec<ValueType> {
        vec![ValueType::Context, ValueType::Float, ValueType::Int]
    }

    fn output_signature(&self) -> Vec<ValueType> {
        vec![ValueType::Float]
    }

    fn invoke<'a>(&'a self, _ctx: &'a mut Context, args: Vec<Value>) -> ClgFuture<'a> {
        Box::pin(async move {
            let [value, precision] = args.as_slice() else {
                return Err(SynapseError::invalid_interface("round expects 2 arguments"));
            };
            let rounded = Self::round(value.expect_float()?, precision.expect_int()?)?;
            Ok(vec![Value::Float(rounded)])
        })
    }
}
