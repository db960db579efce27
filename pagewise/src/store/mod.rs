//! Backing tabular query engines
//!
//! The executor never builds query text. It hands a [`TableQuery`] structured
//! [`Predicate`]s and [`OrderTerm`]s, asks for a bounded number of rows, and
//! reads sort-key values back out of each returned [`Record`].
//!
//! Two implementations ship with the crate: [`MemoryTable`] for tests and
//! demos, and `PgTable` (feature `database`) over PostgreSQL.

use std::fmt;
use std::future::Future;

mod error;
mod memory;
#[cfg(feature = "database")]
mod postgres;

pub use error::{StoreError, StoreErrorKind};
pub use memory::{JsonRow, MemoryQuery, MemoryTable};
#[cfg(feature = "database")]
pub use postgres::{PgQuery, PgTable};

use crate::shape::{Column, FilterOperator, SortOrder};
use crate::value::Value;

/// Comparison between a column and a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    /// `=`
    Eq,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `>=`
    Gte,
    /// `<=`
    Lte,
    /// Case-insensitive pattern match with `%` and `_` wildcards
    Like,
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq => write!(f, "="),
            Self::Gt => write!(f, ">"),
            Self::Lt => write!(f, "<"),
            Self::Gte => write!(f, ">="),
            Self::Lte => write!(f, "<="),
            Self::Like => write!(f, "ILIKE"),
        }
    }
}

impl From<FilterOperator> for Comparison {
    fn from(op: FilterOperator) -> Self {
        match op {
            FilterOperator::Eq => Self::Eq,
            FilterOperator::Gt => Self::Gt,
            FilterOperator::Lt => Self::Lt,
            FilterOperator::Gte => Self::Gte,
            FilterOperator::Lte => Self::Lte,
            FilterOperator::Like => Self::Like,
        }
    }
}

/// Boolean condition over a row
///
/// Comparisons involving `NULL` are never true, matching SQL.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `column op value`
    Compare {
        /// Left-hand column
        column: Column,
        /// Operator
        op: Comparison,
        /// Right-hand value
        value: Value,
    },
    /// All must hold; empty is true
    And(Vec<Predicate>),
    /// Any must hold; empty is false
    Or(Vec<Predicate>),
}

impl Predicate {
    /// `column op value`
    pub fn compare(column: Column, op: Comparison, value: impl Into<Value>) -> Self {
        Self::Compare {
            column,
            op,
            value: value.into(),
        }
    }

    /// Conjunction, collapsing a single term
    #[must_use]
    pub fn and(mut terms: Vec<Predicate>) -> Self {
        if terms.len() == 1 {
            if let Some(term) = terms.pop() {
                return term;
            }
        }
        Self::And(terms)
    }

    /// Disjunction, collapsing a single term
    #[must_use]
    pub fn or(mut terms: Vec<Predicate>) -> Self {
        if terms.len() == 1 {
            if let Some(term) = terms.pop() {
                return term;
            }
        }
        Self::Or(terms)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, terms: &[Predicate], sep: &str) -> fmt::Result {
            write!(f, "(")?;
            for (i, term) in terms.iter().enumerate() {
                if i > 0 {
                    write!(f, " {sep} ")?;
                }
                write!(f, "{term}")?;
            }
            write!(f, ")")
        }

        match self {
            Self::Compare { column, op, value } => match value {
                Value::String(s) => write!(f, "{column} {op} '{s}'"),
                other => write!(f, "{column} {op} {other}"),
            },
            Self::And(terms) => join(f, terms, "AND"),
            Self::Or(terms) => join(f, terms, "OR"),
        }
    }
}

/// One `ORDER BY` term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTerm {
    /// Column to order by
    pub column: Column,
    /// Direction
    pub order: SortOrder,
}

/// A row that can report its values by field name
pub trait Record {
    /// Value stored under `field`, or `None` if the row has no such field
    fn value(&self, field: &str) -> Option<Value>;
}

impl Record for serde_json::Map<String, serde_json::Value> {
    fn value(&self, field: &str) -> Option<Value> {
        self.get(field).and_then(Value::from_json)
    }
}

/// A query under construction against a backing table
///
/// Methods consume and return the query so implementations can be plain
/// builders. Repeated [`filter`](Self::filter) calls are ANDed; the last
/// [`order_by`](Self::order_by), [`limit`](Self::limit) and
/// [`offset`](Self::offset) win.
///
/// # Example
///
/// ```rust,ignore
/// use pagewise::store::{JsonRow, OrderTerm, Predicate, StoreError, TableQuery};
///
/// struct ApiQuery { /* ... */ }
///
/// impl TableQuery for ApiQuery {
///     type Row = JsonRow;
///
///     fn filter(self, predicate: Predicate) -> Self { /* ... */ }
///     fn order_by(self, terms: Vec<OrderTerm>) -> Self { /* ... */ }
///     fn limit(self, n: u64) -> Self { /* ... */ }
///     fn offset(self, n: u64) -> Self { /* ... */ }
///
///     async fn fetch(self) -> Result<Vec<JsonRow>, StoreError> {
///         // run the query
///     }
/// }
/// ```
pub trait TableQuery: Sized + Send {
    /// Row type returned by [`fetch`](Self::fetch)
    type Row: Record + Send;

    /// Restrict rows to those matching `predicate`
    fn filter(self, predicate: Predicate) -> Self;

    /// Order rows; earlier terms are more significant
    fn order_by(self, terms: Vec<OrderTerm>) -> Self;

    /// Return at most `n` rows
    fn limit(self, n: u64) -> Self;

    /// Skip the first `n` rows
    fn offset(self, n: u64) -> Self;

    /// Execute the query
    fn fetch(self) -> impl Future<Output = Result<Vec<Self::Row>, StoreError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_and_or_collapse_single_terms() {
        let term = Predicate::compare(Column::new("id"), Comparison::Gt, 3_i64);
        assert_eq!(Predicate::and(vec![term.clone()]), term);
        assert_eq!(Predicate::or(vec![term.clone()]), term);
        assert!(matches!(Predicate::and(Vec::new()), Predicate::And(ref t) if t.is_empty()));
    }

    #[test]
    fn test_predicate_display() {
        let predicate = Predicate::or(vec![
            Predicate::compare(Column::new("score"), Comparison::Lt, 10_i64),
            Predicate::and(vec![
                Predicate::compare(Column::new("score"), Comparison::Eq, 10_i64),
                Predicate::compare(Column::new("name"), Comparison::Gt, "bob"),
            ]),
        ]);
        assert_eq!(
            predicate.to_string(),
            "(score < 10 OR (score = 10 AND name > 'bob'))"
        );
    }

    #[test]
    fn test_comparison_from_filter_operator() {
        assert_eq!(Comparison::from(FilterOperator::Gte), Comparison::Gte);
        assert_eq!(Comparison::from(FilterOperator::Like), Comparison::Like);
    }

    #[test]
    fn test_json_row_record() {
        let row = json!({"id": 1, "title": "a", "tags": ["x"]});
        let row = row.as_object().unwrap();
        assert_eq!(row.value("id"), Some(Value::Integer(1)));
        assert_eq!(row.value("title"), Some(Value::String("a".into())));
        assert_eq!(row.value("tags"), None);
        assert_eq!(row.value("missing"), None);
    }
}
