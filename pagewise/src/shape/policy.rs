//! Pagination policy for a query shape
//!
//! A [`PaginationPolicy`] fixes, per list endpoint, how clients may page
//! through results: which pagination mode is available, how large pages may
//! get, whether clients may choose their own sort, and which column breaks
//! ties in cursor mode.
//!
//! # Example
//!
//! ```rust
//! use pagewise::shape::{Column, PaginationMode, PaginationPolicy, SortSpec};
//!
//! let policy = PaginationPolicy::builder()
//!     .mode(PaginationMode::Both)
//!     .default_limit(20)
//!     .max_limit(100)
//!     .default_sort(SortSpec::desc(Column::new("created_at")))
//!     .cursor_key(Column::new("id"))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(policy.default_limit(), 20);
//! assert_eq!(policy.cursor_key().map(|c| c.name()), Some("id"));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Column, ShapeError};
use crate::config::{PaginationConfig, ParamNames};

/// Pagination strategy offered by an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaginationMode {
    /// Page number and offset (`?page=3`)
    Offset,
    /// Opaque continuation token (`?cursor=...`)
    Cursor,
    /// Either strategy, chosen per request
    ///
    /// A request carrying a `page` parameter is served in offset mode.
    /// Every other request, including one with neither `page` nor `cursor`,
    /// is served in cursor mode. Clients that want numbered pages must send
    /// `page=1` explicitly on the first request.
    #[default]
    Both,
}

impl PaginationMode {
    /// Whether requests may use page numbers
    #[must_use]
    pub const fn allows_offset(self) -> bool {
        matches!(self, Self::Offset | Self::Both)
    }

    /// Whether requests may use continuation tokens
    #[must_use]
    pub const fn allows_cursor(self) -> bool {
        matches!(self, Self::Cursor | Self::Both)
    }

    /// Whether a policy in this mode admits a request resolved to `requested`
    #[must_use]
    pub const fn permits(self, requested: Self) -> bool {
        match requested {
            Self::Offset => self.allows_offset(),
            Self::Cursor => self.allows_cursor(),
            Self::Both => matches!(self, Self::Both),
        }
    }
}

impl fmt::Display for PaginationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Offset => write!(f, "offset"),
            Self::Cursor => write!(f, "cursor"),
            Self::Both => write!(f, "both"),
        }
    }
}

/// Sort direction
///
/// ```rust
/// use pagewise::shape::SortOrder;
///
/// assert_eq!(SortOrder::parse("DESC"), Some(SortOrder::Desc));
/// assert_eq!(SortOrder::Asc.as_sql(), "ASC");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending (A-Z, 0-9, oldest first)
    #[default]
    Asc,
    /// Descending (Z-A, 9-0, newest first)
    Desc,
}

impl SortOrder {
    /// Parse a client-supplied direction, ignoring case and surrounding whitespace
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.eq_ignore_ascii_case("asc") {
            Some(Self::Asc)
        } else if token.eq_ignore_ascii_case("desc") {
            Some(Self::Desc)
        } else {
            None
        }
    }

    /// SQL `ORDER BY` direction keyword
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => write!(f, "asc"),
            Self::Desc => write!(f, "desc"),
        }
    }
}

/// One entry of a default sort
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    /// Column to order by
    pub column: Column,
    /// Direction
    pub order: SortOrder,
}

impl SortSpec {
    /// Sort ascending by `column`
    pub fn asc(column: impl Into<Column>) -> Self {
        Self {
            column: column.into(),
            order: SortOrder::Asc,
        }
    }

    /// Sort descending by `column`
    pub fn desc(column: impl Into<Column>) -> Self {
        Self {
            column: column.into(),
            order: SortOrder::Desc,
        }
    }
}

/// Immutable pagination settings for one query shape
///
/// Construct through [`PaginationPolicy::builder`], [`PaginationPolicy::from_config`]
/// or [`Config::policy_builder`](crate::config::Config::policy_builder); the
/// builder refuses inconsistent settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationPolicy {
    mode: PaginationMode,
    default_limit: u32,
    max_limit: u32,
    allow_custom_limit: bool,
    allow_custom_sort: bool,
    allow_multiple_sort: bool,
    default_sort: Vec<SortSpec>,
    cursor_key: Option<Column>,
    params: ParamNames,
}

impl PaginationPolicy {
    /// Start a builder with the built-in defaults
    #[must_use]
    pub fn builder() -> PaginationPolicyBuilder {
        Self::from_config(&PaginationConfig::default())
    }

    /// Start a builder seeded from configuration
    #[must_use]
    pub fn from_config(config: &PaginationConfig) -> PaginationPolicyBuilder {
        PaginationPolicyBuilder {
            mode: config.mode,
            default_limit: config.default_limit,
            max_limit: config.max_limit,
            allow_custom_limit: config.allow_custom_limit,
            allow_custom_sort: config.allow_custom_sort,
            allow_multiple_sort: config.allow_multiple_sort,
            default_sort: Vec::new(),
            cursor_key: None,
            params: ParamNames::default(),
        }
    }

    /// Pagination mode
    #[must_use]
    pub const fn mode(&self) -> PaginationMode {
        self.mode
    }

    /// Page size used when the client sends none
    #[must_use]
    pub const fn default_limit(&self) -> u32 {
        self.default_limit
    }

    /// Largest page size a client may request
    #[must_use]
    pub const fn max_limit(&self) -> u32 {
        self.max_limit
    }

    /// Whether the client's `limit` parameter is honored
    #[must_use]
    pub const fn allow_custom_limit(&self) -> bool {
        self.allow_custom_limit
    }

    /// Whether the client's sort parameters are honored
    #[must_use]
    pub const fn allow_custom_sort(&self) -> bool {
        self.allow_custom_sort
    }

    /// Whether more than one sort alias is accepted
    #[must_use]
    pub const fn allow_multiple_sort(&self) -> bool {
        self.allow_multiple_sort
    }

    /// Sort applied when the client supplies none
    #[must_use]
    pub fn default_sort(&self) -> &[SortSpec] {
        &self.default_sort
    }

    /// Unique column that makes every cursor-mode sort a total order
    ///
    /// Always present when [`mode`](Self::mode) allows cursors.
    #[must_use]
    pub fn cursor_key(&self) -> Option<&Column> {
        self.cursor_key.as_ref()
    }

    /// Client-facing parameter names
    #[must_use]
    pub fn params(&self) -> &ParamNames {
        &self.params
    }
}

/// Builder for [`PaginationPolicy`]
#[derive(Debug, Clone)]
pub struct PaginationPolicyBuilder {
    mode: PaginationMode,
    default_limit: u32,
    max_limit: u32,
    allow_custom_limit: bool,
    allow_custom_sort: bool,
    allow_multiple_sort: bool,
    default_sort: Vec<SortSpec>,
    cursor_key: Option<Column>,
    params: ParamNames,
}

impl PaginationPolicyBuilder {
    /// Set the pagination mode
    #[must_use]
    pub fn mode(mut self, mode: PaginationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the default page size
    #[must_use]
    pub fn default_limit(mut self, limit: u32) -> Self {
        self.default_limit = limit;
        self
    }

    /// Set the maximum page size
    #[must_use]
    pub fn max_limit(mut self, limit: u32) -> Self {
        self.max_limit = limit;
        self
    }

    /// Allow or forbid a client-chosen page size
    #[must_use]
    pub fn allow_custom_limit(mut self, allow: bool) -> Self {
        self.allow_custom_limit = allow;
        self
    }

    /// Allow or forbid a client-chosen sort
    #[must_use]
    pub fn allow_custom_sort(mut self, allow: bool) -> Self {
        self.allow_custom_sort = allow;
        self
    }

    /// Allow or forbid sorting by more than one field
    #[must_use]
    pub fn allow_multiple_sort(mut self, allow: bool) -> Self {
        self.allow_multiple_sort = allow;
        self
    }

    /// Append an entry to the default sort
    #[must_use]
    pub fn default_sort(mut self, spec: SortSpec) -> Self {
        self.default_sort.push(spec);
        self
    }

    /// Set the cursor key column
    #[must_use]
    pub fn cursor_key(mut self, column: impl Into<Column>) -> Self {
        self.cursor_key = Some(column.into());
        self
    }

    /// Rename the client-facing pagination parameters
    #[must_use]
    pub fn param_names(mut self, params: ParamNames) -> Self {
        self.params = params;
        self
    }

    /// Validate and freeze the policy
    pub fn build(self) -> Result<PaginationPolicy, ShapeError> {
        if self.max_limit == 0 {
            return Err(ShapeError::NonPositiveMaxLimit);
        }
        if self.default_limit == 0 {
            return Err(ShapeError::NonPositiveDefaultLimit);
        }
        if self.default_limit > self.max_limit {
            return Err(ShapeError::DefaultLimitExceedsMax {
                default_limit: self.default_limit,
                max_limit: self.max_limit,
            });
        }
        if self.mode.allows_cursor() && self.cursor_key.is_none() {
            return Err(ShapeError::MissingCursorKey(self.mode));
        }

        let names = self.params.all();
        if names.iter().any(|name| name.is_empty()) {
            return Err(ShapeError::EmptyParameterName);
        }
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(ShapeError::DuplicateParameterName((*name).to_string()));
            }
        }

        Ok(PaginationPolicy {
            mode: self.mode,
            default_limit: self.default_limit,
            max_limit: self.max_limit,
            allow_custom_limit: self.allow_custom_limit,
            allow_custom_sort: self.allow_custom_sort,
            allow_multiple_sort: self.allow_multiple_sort,
            default_sort: self.default_sort,
            cursor_key: self.cursor_key,
            params: self.params,
        })
    }
}
