//! Request parameter interpretation
//!
//! [`RawParams`] collects the query string; [`parse`] validates it against a
//! shape's policy and fields and produces a [`ParsedQuery`]. Parsing is pure:
//! no store access and no side effects beyond a debug log line.
//!
//! ```rust
//! use pagewise::prelude::*;
//!
//! let policy = PaginationPolicy::builder().cursor_key("id").build().unwrap();
//! let shape = QueryShape::builder("posts", policy)
//!     .field(FieldSpec::new("title", "title").filter(FilterOperator::Like).sortable())
//!     .build()
//!     .unwrap();
//!
//! let params = RawParams::from_query_str("?titleLike=rust&sortBy=title&limit=5").unwrap();
//! let query = shape.parse(&params).unwrap();
//! assert_eq!(query.limit, 5);
//! assert_eq!(query.filters.len(), 1);
//! assert_eq!(query.sorting[0].field, "title");
//! ```

mod error;
mod params;
mod parsed;
mod parser;

pub use error::{QueryError, QueryErrorKind};
pub use params::RawParams;
pub use parsed::{FilterInstruction, PageRequest, ParsedQuery, SortInstruction};
pub use parser::parse;
