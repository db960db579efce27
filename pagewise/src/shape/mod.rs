//! Per-endpoint declarations: which fields filter, which sort, and how pages work
//!
//! Everything in this module is built once at startup and never mutated.
//! Declaration mistakes (colliding aliases, impossible limits, a cursor mode
//! without a key column) fail with a [`ShapeError`] when the shape is built,
//! not when the first request arrives.

mod column;
mod error;
mod field;
mod policy;
mod registry;
mod summary;

pub use column::Column;
pub use error::ShapeError;
pub use field::{FieldSpec, FilterOperator, FilterSpec, ValueKind};
pub use policy::{PaginationMode, PaginationPolicy, PaginationPolicyBuilder, SortOrder, SortSpec};
pub use registry::{QueryShape, QueryShapeBuilder, ShapeRegistry, ShapeRegistryBuilder};
pub use summary::{FieldSummary, FilterSummary, ParameterSummary, PolicySummary, ShapeSummary};
