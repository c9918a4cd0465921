//! Per-traversal metadata.

use crate::types::ObjectId;
use serde::{Deserialize, Serialize};

/// Target output a traversal is expected to produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expectation {
    /// The expected output text.
    pub output: String,
}

impl Expectation {
    /// Create a new expectation.
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
        }
    }

    /// Check whether an output satisfies this expectation.
    ///
    /// Surrounding whitespace is ignored on both sides.
    #[must_use]
    pub fn matches(&self, output: &str) -> bool {
        self.output.trim() == output.trim()
    }
}

/// Identity and lineage data carried by every payload as its first argument.
///
/// A context is owned by the payload carrying it. Use [`Context::fork`] when a
/// traversal branches, so each branch gets its own identity while sharing the
/// lineage fields. The derived `Clone` is an exact copy, identity included.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Context {
    id: ObjectId,
    #[serde(default)]
    behavior_id: ObjectId,
    #[serde(default)]
    clg_tree_id: ObjectId,
    #[serde(default)]
    session_id: String,
    #[serde(default)]
    information_id: ObjectId,
    #[serde(default)]
    expectation: Option<Expectation>,
}

impl Context {
    /// Create a new context with a fresh identity and no lineage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: ObjectId::new(),
            ..Default::default()
        }
    }

    /// Copy this context under a fresh identity.
    #[must_use]
    pub fn fork(&self) -> Self {
        Self {
            id: ObjectId::new(),
            ..self.clone()
        }
    }

    /// The context's own identity.
    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    /// Route identity of the node instance currently holding this context.
    pub fn behavior_id(&self) -> &ObjectId {
        &self.behavior_id
    }

    /// Identity of the discovered tree this traversal runs through.
    pub fn clg_tree_id(&self) -> &ObjectId {
        &self.clg_tree_id
    }

    /// Client session this traversal belongs to.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Identity of the original input.
    pub fn information_id(&self) -> &ObjectId {
        &self.information_id
    }

    /// Expected output, if any.
    pub fn expectation(&self) -> Option<&Expectation> {
        self.expectation.as_ref()
    }

    /// Set the behavior ID.
    pub fn set_behavior_id(&mut self, id: ObjectId) {
        self.behavior_id = id;
    }

    /// Set the CLG tree ID.
    pub fn set_clg_tree_id(&mut self, id: ObjectId) {
        self.clg_tree_id = id;
    }

    /// Set the session ID.
    pub fn set_session_id(&mut self, session_id: impl Into<String>) {
        self.session_id = session_id.into();
    }

    /// Set the information ID.
    pub fn set_information_id(&mut self, id: ObjectId) {
        self.information_id = id;
    }

    /// Set or clear the expectation.
    pub fn set_expectation(&mut self, expectation: Option<Expectation>) {
        self.expectation = expectation;
    }

    /// Builder-style behavior ID setter.
    pub fn with_behavior_id(mut self, id: ObjectId) -> Self {
        self.behavior_id = id;
        self
    }

    /// Builder-style session ID setter.
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    /// Builder-style expectation setter.
    pub fn with_expectation(mut self, expectation: Option<Expectation>) -> Self {
        self.expectation = expectation;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fork_gets_fresh_id_and_keeps_lineage() {
        let mut ctx = Context::new().with_session_id("sess-1");
        ctx.set_behavior_id(ObjectId::from("b1"));
        ctx.set_clg_tree_id(ObjectId::from("tree"));
        ctx.set_information_id(ObjectId::from("info"));
        ctx.set_expectation(Some(Expectation::new("42")));

        let forked = ctx.fork();
        assert_ne!(forked.id(), ctx.id());
        assert_eq!(forked.behavior_id(), ctx.behavior_id());
        assert_eq!(forked.clg_tree_id(), ctx.clg_tree_id());
        assert_eq!(forked.session_id(), "sess-1");
        assert_eq!(forked.information_id(), ctx.information_id());
        assert_eq!(forked.expectation(), ctx.expectation());
    }

    #[test]
    fn clone_is_identical() {
        let ctx = Context::new().with_behavior_id(ObjectId::from("b"));
        assert_eq!(ctx.clone(), ctx);
    }

    #[test]
    fn new_context_has_empty_lineage() {
        let ctx = Context::new();
        assert!(!ctx.id().is_empty());
        assert!(ctx.behavior_id().is_empty());
        assert!(ctx.expectation().is_none());
    }

    #[test]
    fn expectation_ignores_surrounding_whitespace() {
        let exp = Expectation::new(" 8 ");
        assert!(exp.matches("8\n"));
        assert!(!exp.matches("9"));
    }
}
