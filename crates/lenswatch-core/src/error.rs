//! Error types for record decoding and request validation

/// A store response could not be turned into node records.
#[derive(thiserror::Error, Debug)]
pub enum RecordError {
    /// Every node record must carry an identifier.
    #[error("node record has no uid")]
    MissingUid,

    /// The identifier was neither a non-empty string nor an integer.
    #[error("invalid uid: {0}")]
    InvalidUid(String),

    #[error("malformed record JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Caller input rejected before any store access. Never retried.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("lens name must not be empty")]
    EmptyLens,

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("snapshot contains an empty uid")]
    EmptyUid,

    #[error("snapshot hash for uid {0} is empty")]
    EmptyHash(String),

    #[error("malformed request body: {0}")]
    Malformed(String),
}
