//! Scope diff computation against a caller snapshot

use std::collections::BTreeSet;

use tracing::debug;

use crate::filter::strip_graph;
use crate::hash::content_hash;
use crate::model::{DiffResult, ScopedGraph, Snapshot, Uid};

/// Compare an already-filtered scope with a snapshot.
///
/// Only scope members are diff candidates; lens roots count towards the
/// live set so a snapshot that includes the lens itself does not report it
/// removed. A member listed under several roots is considered once.
pub fn compute_diff(graph: &ScopedGraph, snapshot: &Snapshot) -> DiffResult {
    let mut diff = DiffResult::default();
    let mut live: BTreeSet<&Uid> = graph.roots.iter().map(|root| &root.uid).collect();

    for member in graph.scope_members() {
        if !live.insert(&member.uid) && diff.uid_hashes.contains(&member.uid) {
            continue;
        }

        let hash = content_hash(member);
        let changed = snapshot.get(&member.uid) != Some(hash.as_str());
        if changed {
            diff.updated_nodes.push(member.clone());
        }
        diff.uid_hashes.insert(member.uid.clone(), hash);
    }

    diff.removed_nodes = snapshot
        .uids()
        .filter(|uid| !live.contains(uid))
        .cloned()
        .collect();

    diff
}

/// Filter-then-diff for a single lens.
#[derive(Debug, Clone)]
pub struct DiffEngine {
    lens: String,
}

impl DiffEngine {
    pub fn new(lens: impl Into<String>) -> Self {
        DiffEngine { lens: lens.into() }
    }

    pub fn lens(&self) -> &str {
        &self.lens
    }

    /// Apply the visibility filter to a freshly fetched graph, then diff it.
    pub fn evaluate(&self, mut graph: ScopedGraph, snapshot: &Snapshot) -> DiffResult {
        strip_graph(&mut graph, &self.lens);
        let diff = compute_diff(&graph, snapshot);
        debug!(
            "Lens {}: {} in scope, {} updated, {} removed",
            self.lens,
            diff.uid_hashes.len(),
            diff.updated_nodes.len(),
            diff.removed_nodes.len()
        );
        diff
    }
}
