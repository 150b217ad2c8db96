//! Request parsing and validation

use serde::Deserialize;
use serde_json::Value;

use crate::error::ValidationError;
use crate::model::Snapshot;

/// A validated diff request: which lens, compared against what.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateRequest {
    pub lens: String,
    pub snapshot: Snapshot,
}

#[derive(Deserialize)]
struct RawUpdate {
    lens: Option<Value>,
    uid_hashes: Option<Value>,
}

impl UpdateRequest {
    pub fn new(lens: &str, snapshot: Snapshot) -> Result<Self, ValidationError> {
        validate_lens(lens)?;
        validate_snapshot(&snapshot)?;
        Ok(UpdateRequest {
            lens: lens.to_string(),
            snapshot,
        })
    }

    /// Parse a `{"lens": ..., "uid_hashes": {...}}` body.
    pub fn from_json(body: &[u8]) -> Result<Self, ValidationError> {
        let raw: RawUpdate = serde_json::from_slice(body)
            .map_err(|e| ValidationError::Malformed(e.to_string()))?;

        let lens = match raw.lens {
            Some(Value::String(lens)) => lens,
            Some(other) => {
                return Err(ValidationError::Malformed(format!(
                    "`lens` must be a string, got {}",
                    other
                )));
            }
            None => return Err(ValidationError::MissingField("lens")),
        };
        let snapshot: Snapshot = match raw.uid_hashes {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| ValidationError::Malformed(format!("`uid_hashes`: {}", e)))?,
            None => return Err(ValidationError::MissingField("uid_hashes")),
        };

        Self::new(&lens, snapshot)
    }
}

/// Parse a `{"prefix": ...}` lens listing body; a missing prefix lists all.
pub fn lens_prefix_from_json(body: &[u8]) -> Result<String, ValidationError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(String::new());
    }
    let value: Value =
        serde_json::from_slice(body).map_err(|e| ValidationError::Malformed(e.to_string()))?;
    match value.get("prefix") {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(prefix)) => Ok(prefix.trim().to_string()),
        Some(other) => Err(ValidationError::Malformed(format!(
            "`prefix` must be a string, got {}",
            other
        ))),
    }
}

pub fn validate_lens(lens: &str) -> Result<(), ValidationError> {
    if lens.trim().is_empty() {
        return Err(ValidationError::EmptyLens);
    }
    Ok(())
}

pub fn validate_snapshot(snapshot: &Snapshot) -> Result<(), ValidationError> {
    for (uid, hash) in snapshot.iter() {
        if uid.as_str().is_empty() {
            return Err(ValidationError::EmptyUid);
        }
        if hash.is_empty() {
            return Err(ValidationError::EmptyHash(uid.to_string()));
        }
    }
    Ok(())
}
