//! Visibility filter over a fetched lens scope
//!
//! The scope query expands every forward edge of a scope member, which
//! pulls in neighbours that belong to other lenses. A neighbour stays only
//! when one of its `~scope` back-references is the current lens, or is
//! risk-annotated.

use tracing::trace;

use crate::model::{AttrValue, NodeRecord, ScopedGraph};

/// Edge attributes that are always kept verbatim.
pub const EXEMPT_EDGES: &[&str] = &["risks", "~risks"];

/// Reverse-scope attribute consulted for visibility.
pub const REVERSE_SCOPE: &str = "~scope";

/// Prune every root of a fetched graph in place.
pub fn strip_graph(graph: &mut ScopedGraph, lens: &str) {
    for root in &mut graph.roots {
        strip_scope(root, lens);
    }
}

/// Prune the edge lists of each scope member of `root`, one level deep.
pub fn strip_scope(root: &mut NodeRecord, lens: &str) {
    let Some(AttrValue::Edges(members)) = root.attributes.get_mut("scope") else {
        return;
    };

    for member in members.iter_mut() {
        for (name, value) in member.attributes.iter_mut() {
            if EXEMPT_EDGES.contains(&name.as_str()) {
                continue;
            }
            if let AttrValue::Edges(targets) = value {
                let before = targets.len();
                targets.retain(|target| is_visible(target, lens));
                if targets.len() != before {
                    trace!(
                        "Pruned {} of {} `{}` edges from {}",
                        before - targets.len(),
                        before,
                        name,
                        member.uid
                    );
                }
            }
        }
    }
}

/// Whether a neighbour is claimed by `lens` or surfaced through a risk.
///
/// The risk override applies whichever lens the annotated back-reference
/// belongs to.
pub fn is_visible(neighbour: &NodeRecord, lens: &str) -> bool {
    neighbour
        .edges(REVERSE_SCOPE)
        .iter()
        .any(|owner| owner.lens_name() == Some(lens) || owner.has_risk_annotation())
}
