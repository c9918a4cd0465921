//! The CLG capability trait.

use crate::context::Context;
use crate::error::{Result, SynapseError};
use crate::value::{Value, ValueType};
use std::future::Future;
use std::pin::Pin;

/// A boxed future for async CLG invocation. Resolves to the output values,
/// without a leading context.
pub type ClgFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<Value>>> + Send + 'a>>;

/// A composable computation unit driven purely by its type signature.
///
/// The dispatcher never looks at a CLG's name except for the two reserved
/// roles `input` and `output`.
///
/// # Example
///
/// ```ignore
/// use synapse_core::prelude::*;
///
/// struct Double;
///
/// impl Clg for Double {
///     fn name(&self) -> &str {
///         "double"
///     }
///
///     fn input_signature(&self) -> Vec<ValueType> {
///         vec![ValueType::Context, ValueType::Int]
///     }
///
///     fn output_signature(&self) -> Vec<ValueType> {
///         vec![ValueType::Int]
///     }
///
///     fn invoke<'a>(&'a self, _ctx: &'a mut Context, args: Vec<Value>) -> ClgFuture<'a> {
///         Box::pin(async move { Ok(vec![Value::Int(args[0].expect_int()? * 2)]) })
///     }
/// }
/// ```
pub trait Clg: Send + Sync {
    /// Unique name of this CLG.
    fn name(&self) -> &str;

    /// Declared input types. The first element is always `ValueType::Context`.
    fn input_signature(&self) -> Vec<ValueType>;

    /// Declared output types, without a context.
    fn output_signature(&self) -> Vec<ValueType>;

    /// Run the CLG body.
    ///
    /// `args` excludes the context, which is passed separately and may be
    /// updated in place.
    fn invoke<'a>(&'a self, ctx: &'a mut Context, args: Vec<Value>) -> ClgFuture<'a>;

    /// Declared input types after the leading context.
    fn argument_signature(&self) -> Vec<ValueType> {
        let mut signature = self.input_signature();
        if signature.first() == Some(&ValueType::Context) {
            signature.remove(0);
        }
        signature
    }

    /// Number of declared inputs, excluding the context.
    fn arity(&self) -> usize {
        self.argument_signature().len()
    }
}

/// Check that a signature starts with a context.
pub fn check_signature(clg: &dyn Clg) -> Result<()> {
    match clg.input_signature().first() {
        Some(ValueType::Context) => Ok(()),
        _ => Err(SynapseError::invalid_interface(format!(
            "input signature of '{}' must start with a context",
            clg.name()
        ))),
    }
}

/// Check that arguments match a CLG's declared inputs position by position.
pub fn check_arguments(clg: &dyn Clg, args: &[Value]) -> Result<()> {
    let expected = clg.argument_signature();
    let actual: Vec<ValueType> = args.iter().map(Value::value_type).collect();
    if expected != actual {
        return Err(SynapseError::invalid_interface(format!(
            "'{}' expects {:?}, got {:?}",
            clg.name(),
            expected,
            actual
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Pair;

    impl Clg for Pair {
        fn name(&self) -> &str {
            "pair"
        }

        fn input_signature(&self) -> Vec<ValueType> {
            vec![ValueType::Context, ValueType::Int, ValueType::String]
        }

        fn output_signature(&self) -> Vec<ValueType> {
            vec![ValueType::String]
        }

        fn invoke<'a>(&'a self, _ctx: &'a mut Context, args: Vec<Value>) -> ClgFuture<'a> {
            Box::pin(async move {
                let n = args[0].expect_int()?;
                let s = args[1].expect_str()?;
                Ok(vec![Value::from(format!("{n}{s}"))])
            })
        }
    }

    struct Headless;

    impl Clg for Headless {
        fn name(&self) -> &str {
            "headless"
        }

        fn input_signature(&self) -> Vec<ValueType> {
            vec![ValueType::Int]
        }

        fn output_signature(&self) -> Vec<ValueType> {
            vec![]
        }

        fn invoke<'a>(&'a self, _ctx: &'a mut Context, _args: Vec<Value>) -> ClgFuture<'a> {
            Box::pin(async move { Ok(vec![]) })
        }
    }

    #[test]
    fn arity_excludes_context() {
        assert_eq!(Pair.arity(), 2);
        assert_eq!(
            Pair.argument_signature(),
            vec![ValueType::Int, ValueType::String]
        );
    }

    #[test]
    fn signature_must_start_with_context() {
        assert!(check_signature(&Pair).is_ok());
        assert_eq!(check_signature(&Headless).unwrap_err().code(), "E201");
    }

    #[test]
    fn arguments_checked_by_position() {
        assert!(check_arguments(&Pair, &[Value::Int(1), Value::from("a")]).is_ok());
        assert!(check_arguments(&Pair, &[Value::from("a"), Value::Int(1)]).is_err());
        assert!(check_arguments(&Pair, &[Value::Int(1)]).is_err());
    }

    #[tokio::test]
    async fn invoke_returns_outputs() {
        let mut ctx = Context::new();
        let out = Pair
            .invoke(&mut ctx, vec![Value::Int(3), Value::from("x")])
            .await
            .unwrap();
        assert_eq!(out, vec![Value::from("3x")]);
    }
}
