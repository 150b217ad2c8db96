//! Lenswatch Core: node record model, scope filter, content hasher and diff engine

pub mod model;
pub mod error;
pub mod filter;
pub mod hash;
pub mod diff;
pub mod validate;

#[cfg(test)]
pub mod tests;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use model::{Uid, AttrValue, NodeRecord, ScopedGraph, Snapshot, DiffResult, LensSummary};
pub use error::{RecordError, ValidationError};
pub use filter::{strip_graph, strip_scope, is_visible};
pub use hash::{canonical_form, content_hash};
pub use diff::{DiffEngine, compute_diff};
pub use validate::{UpdateRequest, lens_prefix_from_json, validate_lens, validate_snapshot};
