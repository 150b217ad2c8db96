//! Canonical, order-independent content hashing for node records
//!
//! A node's hash covers its own scalar attributes and the set of
//! `(edge name, target uid)` pairs of its outgoing edges. Attributes of edge
//! targets beyond their uid never contribute, so a neighbour changing does
//! not ripple into the hash of every node pointing at it.

use std::fmt::Write;

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::model::{AttrValue, NodeRecord};

/// Build the pre-image that [`content_hash`] digests.
///
/// Layout: the uid, then the sorted scalar tokens (`name + value`), then the
/// sorted edge tokens (`name + target_uid`, plus one combined string per edge
/// attribute made of that attribute's own sorted tokens).
pub fn canonical_form(record: &NodeRecord) -> String {
    let mut scalars = vec![format!("uid{}", record.uid)];
    let mut edges = Vec::new();

    for (name, value) in &record.attributes {
        match value {
            AttrValue::Edges(targets) if !targets.is_empty() => {
                let mut own: Vec<String> = targets
                    .iter()
                    .map(|target| format!("{}{}", name, target.uid))
                    .collect();
                own.sort();
                let combined = own.concat();
                edges.extend(own);
                edges.push(combined);
            }
            // A pruned edge list is indistinguishable from an empty list
            // value once it has been through JSON.
            AttrValue::Edges(_) => scalars.push(format!("{}[]", name)),
            AttrValue::Scalar(value) => scalars.push(format!("{}{}", name, render_scalar(value))),
        }
    }

    scalars.sort();
    edges.sort();

    let mut out = record.uid.to_string();
    out.push_str(&scalars.concat());
    out.push_str(&edges.concat());
    out
}

/// SHA-256 of [`canonical_form`], lowercase hex.
pub fn content_hash(record: &NodeRecord) -> String {
    let digest = Sha256::digest(canonical_form(record).as_bytes());
    let mut out = String::with_capacity(64);
    for b in digest {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Strings render raw; everything else renders as compact JSON, whose
/// object keys are already sorted.
fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
