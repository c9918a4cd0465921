//! Payloads routed between nodes, and the text protocol around them.

use crate::context::{Context, Expectation};
use crate::error::{Result, SynapseError};
use crate::types::ObjectId;
use crate::value::{Value, ValueType};
use serde::{Deserialize, Serialize};

/// The unit of work in flight between nodes.
///
/// `args[0]` is always the traversal [`Context`]. A payload produced by a
/// single node has exactly one source. A merged payload carries the sources
/// of all its constituents in selection order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkPayload {
    /// Unique payload identifier.
    pub id: ObjectId,
    /// Arguments, context first.
    pub args: Vec<Value>,
    /// Behavior ID of the node meant to receive this payload.
    pub destination: ObjectId,
    /// Behavior IDs of the nodes that produced the contributing values.
    pub sources: Vec<ObjectId>,
}

impl NetworkPayload {
    /// Create a payload with a fresh identifier.
    pub fn new(args: Vec<Value>, destination: ObjectId, sources: Vec<ObjectId>) -> Self {
        Self {
            id: ObjectId::new(),
            args,
            destination,
            sources,
        }
    }

    /// Borrow the traversal context.
    pub fn context(&self) -> Result<&Context> {
        self.args
            .first()
            .and_then(Value::as_context)
            .ok_or_else(|| SynapseError::invalid_interface("first argument must be a context"))
    }

    /// Behavior ID of the payload context, rejecting an unset one.
    pub fn behavior_id(&self) -> Result<&ObjectId> {
        let id = self.context()?.behavior_id();
        if id.is_empty() {
            return Err(SynapseError::InvalidBehaviorId);
        }
        Ok(id)
    }

    /// Arguments after the leading context.
    pub fn values(&self) -> &[Value] {
        self.args.get(1..).unwrap_or_default()
    }

    /// Types of the arguments after the leading context.
    pub fn arg_types(&self) -> Vec<ValueType> {
        self.values().iter().map(Value::value_type).collect()
    }

    /// Split into the context and the remaining arguments.
    pub fn into_parts(self) -> Result<(Context, Vec<Value>)> {
        let mut args = self.args.into_iter();
        match args.next() {
            Some(Value::Context(ctx)) => Ok((ctx, args.collect())),
            _ => Err(SynapseError::invalid_interface(
                "first argument must be a context",
            )),
        }
    }

    /// Check the structural invariants of a payload.
    pub fn validate(&self) -> Result<()> {
        self.context()?;
        if self.destination.is_empty() {
            return Err(SynapseError::invalid_interface("destination must not be empty"));
        }
        if self.sources.is_empty() {
            return Err(SynapseError::invalid_interface(
                "payload must have at least one source",
            ));
        }
        Ok(())
    }

    /// The single source of an unmerged payload.
    pub fn single_source(&self) -> Result<&ObjectId> {
        match self.sources.as_slice() {
            [source] => Ok(source),
            other => Err(SynapseError::InvalidSources {
                payload_id: self.id.clone(),
                count: other.len(),
            }),
        }
    }
}

/// A request on the streaming text protocol.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TextRequest {
    /// Raw text input.
    pub input: String,
    /// Client session.
    pub session_id: String,
    /// Answer with the input itself instead of running the network.
    pub echo: bool,
    /// Output the traversal should produce. The input is resent until it does.
    pub expectation: Option<Expectation>,
}

impl TextRequest {
    /// Create a request for the given input.
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            ..Default::default()
        }
    }

    /// Set the session ID.
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    /// Mark the request as an echo.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Set the expected output.
    pub fn with_expectation(mut self, output: impl Into<String>) -> Self {
        self.expectation = Some(Expectation::new(output));
        self
    }
}

/// A response on the streaming text protocol.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextResponse {
    /// Output text.
    pub output: String,
    /// Session of the traversal that produced the output.
    pub session_id: String,
}
