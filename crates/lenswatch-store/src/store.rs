//! Read-only graph store interface

use async_trait::async_trait;
use lenswatch_core::{LensSummary, RecordError, ScopedGraph};

/// A failed round trip to the graph store.
///
/// Every variant is transient from the poller's point of view: the next tick
/// may well succeed against an eventually consistent store.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    /// The store could not be reached or the transport failed mid-request.
    #[error("connection to graph store failed: {0}")]
    Connection(#[from] reqwest::Error),

    /// The store answered with a non-success HTTP status.
    #[error("graph store returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The store accepted the request but reported query errors.
    #[error("query failed: {0}")]
    Query(String),

    /// The response envelope was not what a query returns.
    #[error("unexpected response shape: {0}")]
    Decode(String),

    /// The response held data that is not a valid node record.
    #[error("invalid node record: {0}")]
    Record(#[from] RecordError),

    /// Failure injected by a test store.
    #[error("injected failure: {0}")]
    Injected(String),
}

/// One open session against the graph store.
///
/// Implementations must be read-only and perform exactly one round trip per
/// call; all expansion happens server side.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Fetch the lens named `lens` with its scope expanded.
    async fn fetch_scope(&self, lens: &str) -> Result<ScopedGraph, FetchError>;

    /// List lenses ranked by score, descending. An empty prefix lists every
    /// scored lens; otherwise lens names must full-text match the prefix.
    async fn list_lenses(&self, prefix: &str) -> Result<Vec<LensSummary>, FetchError>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

/// Opens store sessions. One session per request; the session is released
/// when it is dropped.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn GraphStore>, FetchError>;

    fn name(&self) -> &str;
}
