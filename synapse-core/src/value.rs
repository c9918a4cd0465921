//! Typed values carried in payload arguments.
//!
//! Every argument list starts with a [`Value::Context`]. The remaining values
//! are matched against a node's declared input signature by their
//! [`ValueType`] only, never by content.

use crate::context::Context;
use crate::error::{Result, SynapseError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The declared type of a single argument or output position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// The traversal context.
    Context,
    /// Boolean.
    Bool,
    /// Signed 64-bit integer.
    Int,
    /// 64-bit float.
    Float,
    /// UTF-8 string.
    String,
    /// List of integers.
    IntList,
    /// List of floats.
    FloatList,
    /// List of strings.
    StringList,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Context => "context",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::IntList => "int_list",
            Self::FloatList => "float_list",
            Self::StringList => "string_list",
        };
        f.write_str(name)
    }
}

/// A dynamically typed argument value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// The traversal context.
    Context(Context),
    /// Boolean.
    Bool(bool),
    /// Signed 64-bit integer.
    Int(i64),
    /// 64-bit float.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// List of integers.
    IntList(Vec<i64>),
    /// List of floats.
    FloatList(Vec<f64>),
    /// List of strings.
    StringList(Vec<String>),
}

impl Value {
    /// Get the type of this value.
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Context(_) => ValueType::Context,
            Self::Bool(_) => ValueType::Bool,
            Self::Int(_) => ValueType::Int,
            Self::Float(_) => ValueType::Float,
            Self::String(_) => ValueType::String,
            Self::IntList(_) => ValueType::IntList,
            Self::FloatList(_) => ValueType::FloatList,
            Self::StringList(_) => ValueType::StringList,
        }
    }

    /// Borrow the context if this is a context value.
    pub fn as_context(&self) -> Option<&Context> {
        match self {
            Self::Context(ctx) => Some(ctx),
            _ => None,
        }
    }

    /// Get the value as a bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the value as an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the value as a float.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Borrow the value as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extract a float or fail with `InvalidInterface`.
    pub fn expect_float(&self) -> Result<f64> {
        self.as_float().ok_or_else(|| self.mismatch(ValueType::Float))
    }

    /// Extract an integer or fail with `InvalidInterface`.
    pub fn expect_int(&self) -> Result<i64> {
        self.as_int().ok_or_else(|| self.mismatch(ValueType::Int))
    }

    /// Extract a string or fail with `InvalidInterface`.
    pub fn expect_str(&self) -> Result<&str> {
        self.as_str().ok_or_else(|| self.mismatch(ValueType::String))
    }

    fn mismatch(&self, expected: ValueType) -> SynapseError {
        SynapseError::invalid_interface(format!(
            "expected {}, got {}",
            expected,
            self.value_type()
        ))
    }
}

impl From<Context> for Value {
    fn from(ctx: Context) -> Self {
        Self::Context(ctx)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

/// Map a value list onto its type sequence.
pub fn types_of(values: &[Value]) -> Vec<ValueType> {
    values.iter().map(Value::value_type).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_types() {
        assert_eq!(Value::from(1i64).value_type(), ValueType::Int);
        assert_eq!(Value::from(1.5).value_type(), ValueType::Float);
        assert_eq!(Value::from("x").value_type(), ValueType::String);
        assert_eq!(
            Value::from(Context::new()).value_type(),
            ValueType::Context
        );
        assert_eq!(
            Value::StringList(vec![]).value_type(),
            ValueType::StringList
        );
    }

    #[test]
    fn expect_mismatch_is_invalid_interface() {
        let err = Value::from("x").expect_float().unwrap_err();
        assert_eq!(err.code(), "E201");
        assert!(err.to_string().contains("expected float, got string"));
    }

    #[test]
    fn value_json_shape() {
        let json = serde_json::to_value(Value::Int(3)).unwrap();
        assert_eq!(json, serde_json::json!({"type": "int", "value": 3}));

        let back: Value = serde_json::from_value(json).unwrap();
        assert_eq!(back, Value::Int(3));
    }

    #[test]
    fn types_of_preserves_order() {
        let values = vec![Value::from(Context::new()), Value::from(2i64), Value::from(false)];
        assert_eq!(
            types_of(&values),
            vec![ValueType::Context, ValueType::Int, ValueType::Bool]
        );
    }
}
