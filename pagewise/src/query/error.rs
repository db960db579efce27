//! Client input errors
//!
//! Every rejection names the offending parameter so the response tells the
//! client what to fix.
//!
//! ```rust
//! use pagewise::query::{QueryError, QueryErrorKind};
//!
//! let err = QueryError::limit_exceeded("limit", 500, 100);
//! assert_eq!(err.kind, QueryErrorKind::LimitExceeded);
//! assert_eq!(err.parameter.as_deref(), Some("limit"));
//! assert_eq!(err.kind.error_code(), "LIMIT_EXCEEDED");
//! ```

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::ErrorResponse;

/// Category of client input error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryErrorKind {
    /// The query string could not be decoded
    MalformedQuery,
    /// A single-valued parameter was sent more than once
    DuplicateParameter,
    /// The request used a pagination mode the endpoint does not offer
    PaginationModeNotAllowed,
    /// A sort alias matched no sortable field
    UnknownSortField,
    /// More than one sort alias where only one is allowed
    MultipleSortNotAllowed,
    /// A sort direction other than asc/desc
    InvalidSortOrder,
    /// A limit that is not a positive integer
    InvalidLimit,
    /// A limit above the policy maximum
    LimitExceeded,
    /// A filter value that does not fit the field's type
    InvalidValue,
    /// A cursor token that could not be decoded
    InvalidCursor,
    /// A cursor token that lacks the current sort fields
    CursorMismatch,
}

impl fmt::Display for QueryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedQuery => write!(f, "malformed_query"),
            Self::DuplicateParameter => write!(f, "duplicate_parameter"),
            Self::PaginationModeNotAllowed => write!(f, "pagination_mode_not_allowed"),
            Self::UnknownSortField => write!(f, "unknown_sort_field"),
            Self::MultipleSortNotAllowed => write!(f, "multiple_sort_not_allowed"),
            Self::InvalidSortOrder => write!(f, "invalid_sort_order"),
            Self::InvalidLimit => write!(f, "invalid_limit"),
            Self::LimitExceeded => write!(f, "limit_exceeded"),
            Self::InvalidValue => write!(f, "invalid_value"),
            Self::InvalidCursor => write!(f, "invalid_cursor"),
            Self::CursorMismatch => write!(f, "cursor_mismatch"),
        }
    }
}

impl QueryErrorKind {
    /// HTTP status for this kind
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidValue => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Machine-readable error code
    #[must_use]
    pub fn error_code(&self) -> String {
        self.to_string().to_uppercase()
    }
}

/// Rejected client input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryError {
    /// Category
    pub kind: QueryErrorKind,
    /// Offending parameter, when one can be named
    pub parameter: Option<String>,
    /// Human-readable explanation
    pub message: String,
}

impl QueryError {
    /// Create an error for a named parameter
    pub fn new(
        kind: QueryErrorKind,
        parameter: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            parameter: Some(parameter.into()),
            message: message.into(),
        }
    }

    /// The query string itself could not be decoded
    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: QueryErrorKind::MalformedQuery,
            parameter: None,
            message: message.into(),
        }
    }

    /// A single-valued parameter was repeated
    pub fn duplicate(parameter: &str) -> Self {
        Self::new(
            QueryErrorKind::DuplicateParameter,
            parameter,
            format!("Parameter '{parameter}' may only be given once"),
        )
    }

    /// Offset-only endpoint received a cursor
    pub fn cursor_not_allowed(cursor_param: &str, page_param: &str) -> Self {
        Self::new(
            QueryErrorKind::PaginationModeNotAllowed,
            cursor_param,
            format!(
                "Cursor-based pagination is not enabled for this endpoint. \
                 Use \"{page_param}\" parameter instead."
            ),
        )
    }

    /// Cursor-only endpoint received a page number
    pub fn page_not_allowed(page_param: &str, cursor_param: &str) -> Self {
        Self::new(
            QueryErrorKind::PaginationModeNotAllowed,
            page_param,
            format!(
                "Offset-based pagination is not enabled for this endpoint. \
                 Use \"{cursor_param}\" parameter instead."
            ),
        )
    }

    /// Limit that is not a positive integer
    pub fn invalid_limit(parameter: &str, raw: &str) -> Self {
        Self::new(
            QueryErrorKind::InvalidLimit,
            parameter,
            format!("Invalid limit value: '{raw}'. Limit must be a positive integer."),
        )
    }

    /// Limit above the maximum
    pub fn limit_exceeded(parameter: &str, requested: i64, max: u32) -> Self {
        Self::new(
            QueryErrorKind::LimitExceeded,
            parameter,
            format!("Limit value {requested} exceeds maximum allowed limit of {max}."),
        )
    }

    /// Cursor token that could not be decoded
    pub fn invalid_cursor(parameter: &str, reason: impl fmt::Display) -> Self {
        Self::new(
            QueryErrorKind::InvalidCursor,
            parameter,
            format!("Invalid cursor: {reason}"),
        )
    }

    /// Cursor token that lacks a field of the current sort
    pub fn cursor_mismatch(parameter: &str, field: &str) -> Self {
        Self::new(
            QueryErrorKind::CursorMismatch,
            parameter,
            format!(
                "Cursor does not match current sort: missing value for '{field}'. \
                 Restart pagination without a cursor."
            ),
        )
    }

    /// HTTP status for this error
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.kind.status_code()
    }

    pub(crate) fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse::with_code(self.status_code(), self.kind.error_code(), &self.message)
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref parameter) = self.parameter {
            write!(f, " [parameter: {parameter}]")?;
        }
        Ok(())
    }
}

impl std::error::Error for QueryError {}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        tracing::warn!(
            kind = %self.kind,
            parameter = ?self.parameter,
            "Rejected query: {}", self.message
        );

        (self.status_code(), Json(self.to_error_response())).into_response()
    }
}
