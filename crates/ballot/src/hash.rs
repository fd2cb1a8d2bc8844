//! Reversible, URL-safe identifiers for candidate values

use dashmap::DashMap;

use crate::{BallotError, BallotResult};

/// Hash used for "no value"
pub const NULL_HASH: &str = "null";

/// Encode a value so it can travel in a URL or form field
pub fn value_hash(value: Option<&str>) -> String {
    match value {
        None => NULL_HASH.to_string(),
        Some(value) => base64::encode_config(value.as_bytes(), base64::URL_SAFE),
    }
}

/// Recover the value from a hash produced by [`value_hash`]
pub fn decode_value_hash(hash: &str) -> BallotResult<Option<String>> {
    if hash == NULL_HASH {
        return Ok(None);
    }
    let bytes = base64::decode_config(hash, base64::URL_SAFE)
        .map_err(|e| BallotError::BadValue(format!("invalid value hash {:?}: {}", hash, e)))?;
    String::from_utf8(bytes)
        .map(Some)
        .map_err(|e| BallotError::BadValue(format!("value hash is not UTF-8: {}", e)))
}

/// Hashes handed out so far, so lookups do not need to decode
#[derive(Debug, Default)]
pub struct ValueHashRegistry {
    seen: DashMap<String, String>,
}

impl ValueHashRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash a value and remember it
    pub fn record(&self, value: &str) -> String {
        let hash = value_hash(Some(value));
        self.seen
            .entry(hash.clone())
            .or_insert_with(|| value.to_string());
        hash
    }

    pub fn lookup(&self, hash: &str) -> BallotResult<Option<String>> {
        if let Some(value) = self.seen.get(hash) {
            return Ok(Some(value.clone()));
        }
        decode_value_hash(hash)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
