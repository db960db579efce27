//! # pagewise
//!
//! Declarative filtering, sorting and pagination for list endpoints.
//!
//! Each endpoint declares a [`QueryShape`](shape::QueryShape): a
//! [`PaginationPolicy`](shape::PaginationPolicy) plus the fields clients may
//! filter and sort on. Incoming query parameters are parsed against the shape
//! into a [`ParsedQuery`](query::ParsedQuery), which a
//! [`Paginator`](executor::Paginator) runs against any
//! [`TableQuery`](store::TableQuery) backend.
//!
//! ## Features
//!
//! - **Offset and cursor pagination**: numbered pages, or keyset seeking with
//!   opaque continuation tokens that never skip or repeat rows
//! - **Typed filters**: `eq`, `gt`, `gte`, `lt`, `lte` and case-insensitive
//!   `like`, each under its own public parameter name
//! - **Sorting**: single or multi-field, with per-field public aliases
//! - **Introspection**: every shape can describe its accepted parameters
//! - **Backends**: in-memory tables, and PostgreSQL behind the `database` feature
//!
//! ## Example
//!
//! ```rust,no_run
//! use axum::{extract::State, routing::get, Router};
//! use pagewise::prelude::*;
//! use std::sync::Arc;
//!
//! #[derive(Clone)]
//! struct AppState {
//!     posts: Arc<QueryShape>,
//!     table: MemoryTable,
//!     paginator: Arc<Paginator>,
//! }
//!
//! async fn list_posts(
//!     State(state): State<AppState>,
//!     params: RawParams,
//! ) -> Result<Page<JsonRow>> {
//!     let query = state.posts.parse(&params)?;
//!     state.paginator.execute(state.table.query(), query).await
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let policy = config.policy_builder().cursor_key("id").build()?;
//!     let posts = QueryShape::builder("posts", policy)
//!         .field(FieldSpec::new("id", "id").kind(ValueKind::Integer).sortable())
//!         .field(FieldSpec::new("title", "title").filter(FilterOperator::Like).sortable())
//!         .build()?;
//!
//!     let state = AppState {
//!         posts: Arc::new(posts),
//!         table: MemoryTable::default(),
//!         paginator: Arc::new(Paginator::from_config(&config)),
//!     };
//!     let _app: Router = Router::new()
//!         .route("/posts", get(list_posts))
//!         .with_state(state);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod cursor;
pub mod error;
pub mod executor;
pub mod observability;
pub mod query;
pub mod response;
pub mod shape;
pub mod store;
pub mod value;

pub use error::{Error, Result};
pub use value::Value;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{Config, CursorConfig, PaginationConfig, ParamNames};
    pub use crate::cursor::{CursorCodec, CursorValues, JsonBase64Codec};
    pub use crate::error::{Error, ErrorResponse, Result};
    pub use crate::executor::Paginator;
    pub use crate::observability::init_tracing;
    pub use crate::query::{
        FilterInstruction, PageRequest, ParsedQuery, QueryError, QueryErrorKind, RawParams,
        SortInstruction,
    };
    pub use crate::response::{CursorPage, OffsetPage, Page};
    pub use crate::shape::{
        Column, FieldSpec, FilterOperator, FilterSpec, PaginationMode, PaginationPolicy,
        QueryShape, ShapeError, ShapeRegistry, SortOrder, SortSpec, ValueKind,
    };
    pub use crate::store::{JsonRow, MemoryTable, Record, StoreError, TableQuery};
    pub use crate::value::Value;

    #[cfg(feature = "database")]
    pub use crate::store::{PgQuery, PgTable};
}
