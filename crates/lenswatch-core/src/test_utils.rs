//! Fixture builders shaped like scope query responses
//!
//! Shared by the unit tests of every lenswatch crate and by the workspace
//! integration tests.

use serde_json::{Value, json};

use crate::model::ScopedGraph;

/// A `~scope` back-reference to a lens.
pub fn owner(lens_uid: &str, lens: &str) -> Value {
    json!({ "uid": lens_uid, "lens": lens, "score": 10 })
}

/// A `~scope` back-reference carrying a risk annotation.
pub fn risk_owner(uid: &str, analyzer: &str, risk_score: i64) -> Value {
    json!({ "uid": uid, "analyzer_name": analyzer, "risk_score": risk_score })
}

/// A neighbour as expanded one level below a scope member.
pub fn neighbour(uid: &str, owners: Vec<Value>) -> Value {
    json!({ "uid": uid, "node_key": format!("key-{}", uid), "~scope": owners })
}

pub fn process(uid: &str, name: &str, pid: i64) -> Value {
    json!({
        "uid": uid,
        "node_key": format!("key-{}", uid),
        "process_name": name,
        "process_id": pid,
        "created_timestamp": 1_546_300_800_000i64,
    })
}

pub fn file(uid: &str, path: &str) -> Value {
    json!({ "uid": uid, "node_key": format!("key-{}", uid), "file_path": path })
}

/// Attach an edge list to a JSON node.
pub fn with_edges(mut node: Value, name: &str, targets: Vec<Value>) -> Value {
    if let Some(map) = node.as_object_mut() {
        map.insert(name.to_string(), Value::Array(targets));
    }
    node
}

/// Set a scalar on a JSON node.
pub fn with_scalar(mut node: Value, name: &str, value: Value) -> Value {
    if let Some(map) = node.as_object_mut() {
        map.insert(name.to_string(), value);
    }
    node
}

/// A lens root with the given scope members.
pub fn lens_root(lens_uid: &str, lens: &str, members: Vec<Value>) -> Value {
    json!({
        "uid": lens_uid,
        "node_key": format!("lens-key-{}", lens),
        "lens": lens,
        "score": 10,
        "scope": members,
    })
}

/// Decode a list of JSON roots into a graph.
pub fn graph(roots: Vec<Value>) -> ScopedGraph {
    match ScopedGraph::from_json(Value::Array(roots)) {
        Ok(graph) => graph,
        Err(e) => panic!("fixture is not a valid scoped graph: {}", e),
    }
}
