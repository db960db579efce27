//! Continuation token encoding

use std::collections::BTreeMap;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

use crate::config::CursorConfig;
use crate::error::{Error, Result};
use crate::query::QueryError;
use crate::value::Value;

/// Sort-field values of the last row on a page, keyed by field name
///
/// A `BTreeMap` so serialization order is deterministic.
pub type CursorValues = BTreeMap<String, Value>;

/// Reversible mapping between cursor values and an opaque token
///
/// Implementations carry no ordering semantics. Swap the implementation to
/// change the wire format (for example, to sign tokens).
pub trait CursorCodec: Send + Sync {
    /// Encode values into a URL-safe token
    fn encode(&self, values: &CursorValues) -> Result<String>;

    /// Decode a token produced by [`encode`](Self::encode)
    ///
    /// `parameter` names the query parameter the token arrived in, for error
    /// messages.
    fn decode(&self, token: &str, parameter: &str) -> std::result::Result<CursorValues, QueryError>;
}

/// Unpadded URL-safe base64 over a JSON object
///
/// ```rust
/// use pagewise::cursor::{CursorCodec, CursorValues, JsonBase64Codec};
/// use pagewise::Value;
///
/// let codec = JsonBase64Codec::default();
/// let mut values = CursorValues::new();
/// values.insert("id".to_string(), Value::Integer(2));
///
/// let token = codec.encode(&values).unwrap();
/// assert_eq!(token, "eyJpZCI6Mn0");
/// assert_eq!(codec.decode(&token, "cursor").unwrap(), values);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonBase64Codec {
    max_token_len: usize,
}

impl JsonBase64Codec {
    /// Codec rejecting tokens longer than `max_token_len`
    #[must_use]
    pub const fn new(max_token_len: usize) -> Self {
        Self { max_token_len }
    }

    /// Codec configured from the `cursor` section
    #[must_use]
    pub const fn from_config(config: &CursorConfig) -> Self {
        Self::new(config.max_token_len)
    }

    /// Longest token accepted by [`decode`](CursorCodec::decode)
    #[must_use]
    pub const fn max_token_len(&self) -> usize {
        self.max_token_len
    }
}

impl Default for JsonBase64Codec {
    fn default() -> Self {
        Self::from_config(&CursorConfig::default())
    }
}

impl CursorCodec for JsonBase64Codec {
    fn encode(&self, values: &CursorValues) -> Result<String> {
        let json = serde_json::to_vec(values)
            .map_err(|e| Error::Internal(format!("Failed to serialize cursor: {e}")))?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    fn decode(&self, token: &str, parameter: &str) -> std::result::Result<CursorValues, QueryError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(QueryError::invalid_cursor(parameter, "token is empty"));
        }
        if token.len() > self.max_token_len {
            return Err(QueryError::invalid_cursor(
                parameter,
                format!("token exceeds {} characters", self.max_token_len),
            ));
        }

        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| QueryError::invalid_cursor(parameter, "token is not valid base64"))?;

        serde_json::from_slice::<CursorValues>(&bytes).map_err(|_| {
            QueryError::invalid_cursor(parameter, "token does not contain a flat JSON object")
        })
    }
}
