//! Validated per-request instructions

use std::sync::Arc;

use crate::shape::{Column, FilterOperator, PaginationMode, PaginationPolicy, SortOrder};
use crate::value::Value;

/// One resolved filter
#[derive(Debug, Clone, PartialEq)]
pub struct FilterInstruction {
    /// Column to compare
    pub column: Column,
    /// Declared field the filter came from
    pub field: String,
    /// Comparison
    pub operator: FilterOperator,
    /// Typed operand
    pub value: Value,
}

/// One resolved sort term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortInstruction {
    /// Column to order by
    pub column: Column,
    /// Declared field name; empty for terms taken from a policy's default sort
    pub field: String,
    /// Direction
    pub order: SortOrder,
}

impl SortInstruction {
    /// Sort by a declared field
    pub fn new(column: Column, field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            column,
            field: field.into(),
            order,
        }
    }

    /// Sort by a bare column, as default sorts and the cursor key do
    pub fn by_column(column: Column, order: SortOrder) -> Self {
        Self {
            field: String::new(),
            column,
            order,
        }
    }

    /// Key under which rows expose this term's value, and under which cursors store it
    ///
    /// The declared field name when there is one, otherwise the column name.
    #[must_use]
    pub fn cursor_field(&self) -> &str {
        if self.field.is_empty() {
            self.column.name()
        } else {
            &self.field
        }
    }
}

/// Which page the client asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRequest {
    /// Numbered page
    Offset {
        /// 1-based page number
        page: u64,
        /// Rows to skip: `(page - 1) * limit`
        offset: u64,
    },
    /// Page after a continuation token; `None` requests the first page
    Cursor {
        /// Opaque token from a previous response
        token: Option<String>,
    },
}

impl PageRequest {
    /// Mode this request resolved to, never [`PaginationMode::Both`]
    #[must_use]
    pub const fn mode(&self) -> PaginationMode {
        match self {
            Self::Offset { .. } => PaginationMode::Offset,
            Self::Cursor { .. } => PaginationMode::Cursor,
        }
    }
}

/// Everything the executor needs to answer one list request
///
/// Produced by [`parse`](crate::query::parse) and consumed once by
/// [`Paginator::execute`](crate::executor::Paginator::execute).
#[derive(Debug, Clone)]
pub struct ParsedQuery {
    /// Filters, ANDed together
    pub filters: Vec<FilterInstruction>,
    /// Sort terms, most significant first
    pub sorting: Vec<SortInstruction>,
    /// Page size
    pub limit: u32,
    /// Requested page
    pub page: PageRequest,
    /// Policy the request was parsed against
    pub policy: Arc<PaginationPolicy>,
}

impl ParsedQuery {
    /// Resolved pagination mode
    #[must_use]
    pub const fn mode(&self) -> PaginationMode {
        self.page.mode()
    }

    /// Page number, in offset mode
    #[must_use]
    pub fn page_number(&self) -> Option<u64> {
        match self.page {
            PageRequest::Offset { page, .. } => Some(page),
            PageRequest::Cursor { .. } => None,
        }
    }

    /// Rows to skip, in offset mode
    #[must_use]
    pub fn offset(&self) -> Option<u64> {
        match self.page {
            PageRequest::Offset { offset, .. } => Some(offset),
            PageRequest::Cursor { .. } => None,
        }
    }

    /// Continuation token, in cursor mode
    #[must_use]
    pub fn cursor_token(&self) -> Option<&str> {
        match &self.page {
            PageRequest::Cursor { token } => token.as_deref(),
            PageRequest::Offset { .. } => None,
        }
    }
}
