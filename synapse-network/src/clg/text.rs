//! Entry, exit and text conversion CLGs.

use std::sync::Arc;
use synapse_core::error::{Result, SynapseError};
use synapse_core::key;
use synapse_core::storage::Storage;
use synapse_core::{Clg, ClgFuture, Context, ObjectId, Value, ValueType};

fn single(args: &[Value]) -> Result<&Value> {
    match args {
        [value] => Ok(value),
        other => Err(SynapseError::invalid_interface(format!(
            "expected 1 argument, got {}",
            other.len()
        ))),
    }
}

/// Entry node.
///
/// Registers every new input sequence under its own information ID and
/// attaches that ID to the context. If a CLG tree was learned for the
/// information ID, its ID is attached too. The input passes through.
pub struct Input {
    storage: Arc<dyn Storage>,
}

impl Input {
    /// Create the entry node over the given storage.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    async fn information_id(&self, input: &str) -> Result<ObjectId> {
        let id_key = key::input_information_id(input);
        match self.storage.get(&id_key).await {
            Ok(raw) => Ok(ObjectId::from(raw)),
            Err(e) if e.is_not_found() => {
                let id = ObjectId::new();
                self.storage.set(&id_key, id.as_str()).await?;
                self.storage
                    .set(&key::information_sequence(&id), input)
                    .await?;
                tracing::debug!(information_id = %id, "Registered new input");
                Ok(id)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn clg_tree_id(&self, information_id: &ObjectId) -> Result<Option<ObjectId>> {
        match self.storage.get(&key::input_clg_tree_id(information_id)).await {
            Ok(raw) => Ok(Some(ObjectId::from(raw))),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl Clg for Input {
    fn name(&self) -> &str {
        "input"
    }

    fn input_signature(&self) -> Vec<ValueType> {
        vec![ValueType::Context, ValueType::String]
    }

    fn output_signature(&self) -> Vec<ValueType> {
        vec![ValueType::String]
    }

    fn invoke<'a>(&'a self, ctx: &'a mut Context, args: Vec<Value>) -> ClgFuture<'a> {
        Box::pin(async move {
            let input = single(&args)?.expect_str()?.to_string();

            let information_id = self.information_id(&input).await?;
            if let Some(tree_id) = self.clg_tree_id(&information_id).await? {
                ctx.set_clg_tree_id(tree_id);
            }
            ctx.set_information_id(information_id);

            Ok(vec![Value::String(input)])
        })
    }
}

/// Exit node. Passes its input through.
pub struct Output;

impl Clg for Output {
    fn name(&self) -> &str {
        "output"
    }

    fn input_signature(&self) -> Vec<ValueType> {
        vec![ValueType::Context, ValueType::String]
    }

    fn output_signature(&self) -> Vec<ValueType> {
        vec![ValueType::String]
    }

    fn invoke<'a>(&'a self, _ctx: &'a mut Context, args: Vec<Value>) -> ClgFuture<'a> {
        Box::pin(async move {
            let output = single(&args)?.expect_str()?.to_string();
            Ok(vec![Value::String(output)])
        })
    }
}

/// Parses a string as a float.
pub struct ParseFloat;

impl Clg for ParseFloat {
    fn name(&self) -> &str {
        "parse-float"
    }

    fn input_signature(&self) -> Vec<ValueType> {
        vec![ValueType::Context, ValueType::String]
    }

    fn output_signature(&self) -> Vec<ValueType> {
        vec![ValueType::Float]
    }

    fn invoke<'a>(&'a self, _ctx: &'a mut Context, args: Vec<Value>) -> ClgFuture<'a> {
        Box::pin(async move {
            let raw = single(&args)?.expect_str()?;
            let value: f64 = raw.trim().parse().map_err(|e| SynapseError::ClgExecution {
                name: self.name().to_string(),
                cause: format!("cannot parse '{}': {}", raw, e),
            })?;
            Ok(vec![Value::Float(value)])
        })
    }
}

/// Formats a float as a string.
pub struct FloatToString;

impl Clg for FloatToString {
    fn name(&self) -> &str {
        "to-string"
    }

    fn input_signature(&self) -> Vec<ValueType> {
        vec![ValueType::Context, ValueType::Float]
    }

    fn output_signature(&self) -> Vec<ValueType> {
        vec![ValueType::String]
    }

    fn invoke<'a>(&'a self, _ctx: &'a mut Context, args: Vec<Value>) -> ClgFuture<'a> {
        Box::pin(async move {
            let value = single(&args)?.expect_float()?;
            Ok(vec![Value::String(value.to_string())])
        })
    }
}

/// Reads the input sequence behind the context's information ID.
pub struct ReadInformationId {
    storage: Arc<dyn Storage>,
}

impl ReadInformationId {
    /// Create the node over the given storage.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }
}

impl Clg for ReadInformationId {
    fn name(&self) -> &str {
        "read-information-id"
    }

    fn input_signature(&self) -> Vec<ValueType> {
        vec![ValueType::Context]
    }

    fn output_signature(&self) -> Vec<ValueType> {
        vec![ValueType::String]
    }

    fn invoke<'a>(&'a self, ctx: &'a mut Context, _args: Vec<Value>) -> ClgFuture<'a> {
        Box::pin(async move {
            let information_id = ctx.information_id();
            if information_id.is_empty() {
                return Err(SynapseError::ClgExecution {
                    name: self.name().to_string(),
                    cause: "context carries no information ID".to_string(),
                });
            }
            let sequence = self
                .storage
                .get(&key::information_sequence(information_id))
                .await?;
            Ok(vec![Value::String(sequence)])
        })
    }
}
