//! Storage key namespace.
//!
//! Every key lives under `s:net:` (routing state) or `s:clg:` (node-owned
//! state). Backends may prepend their own prefix on top.

use crate::types::ObjectId;

/// Build a key in the network scope.
pub fn network(suffix: impl AsRef<str>) -> String {
    format!("s:net:{}", suffix.as_ref())
}

/// Build a key in the CLG scope.
pub fn clg(suffix: impl AsRef<str>) -> String {
    format!("s:clg:{}", suffix.as_ref())
}

/// Persisted activation queue of a destination.
pub fn activate_queue(behavior_id: &ObjectId) -> String {
    network(format!(
        "activate:queue:behavior-id:{}:network-payload",
        behavior_id
    ))
}

/// Known source ordering that satisfied a destination.
pub fn activate_configuration(behavior_id: &ObjectId) -> String {
    network(format!(
        "activate:configuration:behavior-id:{}:behavior-ids",
        behavior_id
    ))
}

/// Known fan-out of a node.
pub fn forward_configuration(behavior_id: &ObjectId) -> String {
    network(format!(
        "forward:configuration:behavior-id:{}:behavior-ids",
        behavior_id
    ))
}

/// Shared set of forwarded payloads awaiting pickup.
pub fn events() -> String {
    network("events:network-payload")
}

/// Tracker edge set keyed by source behavior ID.
pub fn tracker_behavior_ids(behavior_id: &ObjectId) -> String {
    network(format!("behavior-id:{}:o:tracker:behavior-ids", behavior_id))
}

/// Tracker edge set keyed by source node name.
pub fn tracker_behavior_names(name: &str) -> String {
    network(format!("behavior-name:{}:o:tracker:behavior-names", name))
}

/// Node name a behavior ID routes to.
pub fn behavior_name(behavior_id: &ObjectId) -> String {
    network(format!("behavior-id:{}:behavior-name", behavior_id))
}

/// Stable behavior ID of a registered node.
pub fn clg_behavior_id(name: &str) -> String {
    network(format!("clg:{}:behavior-id", name))
}

/// Information ID assigned to a raw input.
pub fn input_information_id(input: &str) -> String {
    clg(format!("input:information-id:{}", input))
}

/// Raw input sequence registered under an information ID.
pub fn information_sequence(information_id: &ObjectId) -> String {
    clg(format!("information-id:{}:information-sequence", information_id))
}

/// CLG tree ID learned for an information ID.
pub fn input_clg_tree_id(information_id: &ObjectId) -> String {
    clg(format!("input:clg-tree-id:{}", information_id))
}
