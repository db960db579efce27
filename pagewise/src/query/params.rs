//! Raw, uninterpreted query parameters

use std::collections::HashMap;

use axum::{
    extract::{FromRequestParts, Query},
    http::{request::Parts, Uri},
};

use super::QueryError;

/// Every query-string pair of a request, grouped by key
///
/// Collecting is all this type does; interpretation happens in
/// [`parse`](crate::query::parse). Used as an axum extractor it never
/// rejects well-formed query strings.
///
/// ```rust
/// use pagewise::query::RawParams;
///
/// let params = RawParams::from_query_str("sortBy=title&sortBy=id&page=2").unwrap();
/// assert_eq!(params.get_all("sortBy"), ["title", "id"]);
/// assert_eq!(params.single("page").unwrap(), Some("2"));
/// assert!(params.single("sortBy").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawParams {
    values: HashMap<String, Vec<String>>,
}

impl RawParams {
    /// Empty parameter set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a URL query string, with or without the leading `?`
    pub fn from_query_str(query: &str) -> Result<Self, QueryError> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let uri: Uri = format!("/?{query}")
            .parse()
            .map_err(|e| QueryError::malformed(format!("Malformed query string: {e}")))?;
        Self::from_uri(&uri)
    }

    /// Collect the query pairs of a request URI
    pub fn from_uri(uri: &Uri) -> Result<Self, QueryError> {
        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(uri)
            .map_err(|e| QueryError::malformed(format!("Malformed query string: {e}")))?;
        Ok(pairs.into_iter().collect())
    }

    /// Add one value under `key`
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.entry(key.into()).or_default().push(value.into());
    }

    /// Builder-style [`insert`](Self::insert)
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Every value sent under `key`, in request order
    #[must_use]
    pub fn get_all(&self, key: &str) -> &[String] {
        self.values.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// The value of a single-valued parameter
    ///
    /// Returns `Ok(None)` when absent. Sending the key more than once is a
    /// client error rather than a silent pick.
    pub fn single(&self, key: &str) -> Result<Option<&str>, QueryError> {
        match self.get_all(key) {
            [] => Ok(None),
            [value] => Ok(Some(value.as_str())),
            _ => Err(QueryError::duplicate(key)),
        }
    }

    /// Like [`single`](Self::single), treating an empty value as absent
    pub fn single_non_empty(&self, key: &str) -> Result<Option<&str>, QueryError> {
        Ok(self.single(key)?.filter(|value| !value.is_empty()))
    }

    /// Whether `key` was sent at all
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of distinct keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no parameters were sent
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

impl<S> FromRequestParts<S> for RawParams
where
    S: Send + Sync,
{
    type Rejection = QueryError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_uri(&parts.uri)
    }
}
