//! Page response bodies
//!
//! ```rust
//! use pagewise::response::{CursorPage, OffsetPage};
//! use serde_json::json;
//!
//! let page = OffsetPage { data: vec![3, 4], page: 2, limit: 2 };
//! assert_eq!(
//!     serde_json::to_value(&page).unwrap(),
//!     json!({"data": [3, 4], "page": 2, "limit": 2})
//! );
//!
//! let page = CursorPage { data: vec![5], next_cursor: None };
//! assert_eq!(
//!     serde_json::to_value(&page).unwrap(),
//!     json!({"data": [5], "nextCursor": null})
//! );
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// One numbered page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetPage<T> {
    /// Rows on this page
    pub data: Vec<T>,
    /// 1-based page number
    pub page: u64,
    /// Page size used
    pub limit: u32,
}

/// One page of a cursor traversal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorPage<T> {
    /// Rows on this page
    pub data: Vec<T>,
    /// Token for the following page; `None` when no rows remain
    #[serde(rename = "nextCursor")]
    pub next_cursor: Option<String>,
}

/// Either page shape, serialized without a tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Page<T> {
    /// Offset mode result
    Offset(OffsetPage<T>),
    /// Cursor mode result
    Cursor(CursorPage<T>),
}

impl<T> Page<T> {
    /// Rows on this page
    #[must_use]
    pub fn data(&self) -> &[T] {
        match self {
            Self::Offset(page) => &page.data,
            Self::Cursor(page) => &page.data,
        }
    }

    /// Take the rows, dropping page metadata
    #[must_use]
    pub fn into_data(self) -> Vec<T> {
        match self {
            Self::Offset(page) => page.data,
            Self::Cursor(page) => page.data,
        }
    }

    /// Continuation token, for cursor pages that have one
    #[must_use]
    pub fn next_cursor(&self) -> Option<&str> {
        match self {
            Self::Cursor(page) => page.next_cursor.as_deref(),
            Self::Offset(_) => None,
        }
    }
}

impl<T> From<OffsetPage<T>> for Page<T> {
    fn from(page: OffsetPage<T>) -> Self {
        Self::Offset(page)
    }
}

impl<T> From<CursorPage<T>> for Page<T> {
    fn from(page: CursorPage<T>) -> Self {
        Self::Cursor(page)
    }
}

impl<T: Serialize> IntoResponse for OffsetPage<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

impl<T: Serialize> IntoResponse for CursorPage<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

impl<T: Serialize> IntoResponse for Page<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}
