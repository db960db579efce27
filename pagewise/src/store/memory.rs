//! In-memory table over JSON rows

use std::cmp::Ordering;
use std::sync::Arc;

use super::{Comparison, OrderTerm, Predicate, Record, StoreError, TableQuery};
use crate::shape::SortOrder;
use crate::value::Value;

/// A row as a JSON object
pub type JsonRow = serde_json::Map<String, serde_json::Value>;

/// Immutable table of JSON rows
///
/// Columns are looked up by [`Column::name`](crate::shape::Column::name);
/// SQL expressions on computed columns are ignored. `NULL` sorts last in
/// ascending order and first in descending order, as in PostgreSQL.
///
/// ```rust
/// use pagewise::store::MemoryTable;
/// use serde_json::json;
///
/// let table = MemoryTable::from_json(json!([
///     {"id": 1, "title": "First"},
///     {"id": 2, "title": "Second"},
/// ]))
/// .unwrap();
/// assert_eq!(table.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    rows: Arc<Vec<JsonRow>>,
}

impl MemoryTable {
    /// Table over the given rows
    #[must_use]
    pub fn new(rows: Vec<JsonRow>) -> Self {
        Self {
            rows: Arc::new(rows),
        }
    }

    /// Table from a JSON array of objects
    pub fn from_json(rows: serde_json::Value) -> Result<Self, StoreError> {
        let serde_json::Value::Array(items) = rows else {
            return Err(StoreError::type_conversion("expected a JSON array of rows"));
        };

        let rows = items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                serde_json::Value::Object(row) => Ok(row),
                _ => Err(StoreError::type_conversion(format!(
                    "row {i} is not a JSON object"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(rows))
    }

    /// Start a query over every row
    #[must_use]
    pub fn query(&self) -> MemoryQuery {
        MemoryQuery {
            rows: Arc::clone(&self.rows),
            predicates: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: 0,
        }
    }

    /// Number of rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Query over a [`MemoryTable`]
#[derive(Debug, Clone)]
pub struct MemoryQuery {
    rows: Arc<Vec<JsonRow>>,
    predicates: Vec<Predicate>,
    order: Vec<OrderTerm>,
    limit: Option<u64>,
    offset: u64,
}

impl MemoryQuery {
    fn matches(row: &JsonRow, predicate: &Predicate) -> bool {
        match predicate {
            Predicate::Compare { column, op, value } => row
                .value(column.name())
                .is_some_and(|actual| compare(&actual, *op, value)),
            Predicate::And(terms) => terms.iter().all(|term| Self::matches(row, term)),
            Predicate::Or(terms) => terms.iter().any(|term| Self::matches(row, term)),
        }
    }

    fn order_rows(&self, a: &JsonRow, b: &JsonRow) -> Ordering {
        for term in &self.order {
            let left = a.value(term.column.name()).unwrap_or_default();
            let right = b.value(term.column.name()).unwrap_or_default();
            let ordering = match (left.is_null(), right.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => left.compare(&right).unwrap_or(Ordering::Equal),
            };
            let ordering = match term.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

fn compare(actual: &Value, op: Comparison, expected: &Value) -> bool {
    if op == Comparison::Like {
        return match (actual, expected) {
            (Value::Null, _) | (_, Value::Null) => false,
            (actual, Value::String(pattern)) => like(pattern, &actual.to_string()),
            _ => false,
        };
    }

    let Some(ordering) = actual.compare(expected) else {
        return false;
    };
    match op {
        Comparison::Eq => ordering == Ordering::Equal,
        Comparison::Gt => ordering == Ordering::Greater,
        Comparison::Lt => ordering == Ordering::Less,
        Comparison::Gte => ordering != Ordering::Less,
        Comparison::Lte => ordering != Ordering::Greater,
        Comparison::Like => false,
    }
}

/// Case-insensitive SQL `LIKE`: `%` matches any run, `_` any single character
fn like(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.to_lowercase().chars().collect();
    let text: Vec<char> = text.to_lowercase().chars().collect();

    // Greedy match with backtracking to the last `%`
    let (mut p, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;
    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '_' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == '%' {
            star = Some((p, t));
            p += 1;
        } else if let Some((star_p, star_t)) = star {
            p = star_p + 1;
            t = star_t + 1;
            star = Some((star_p, star_t + 1));
        } else {
            return false;
        }
    }
    pattern[p..].iter().all(|c| *c == '%')
}

impl TableQuery for MemoryQuery {
    type Row = JsonRow;

    fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    fn order_by(mut self, terms: Vec<OrderTerm>) -> Self {
        self.order = terms;
        self
    }

    fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    fn offset(mut self, n: u64) -> Self {
        self.offset = n;
        self
    }

    async fn fetch(self) -> Result<Vec<JsonRow>, StoreError> {
        let mut rows: Vec<&JsonRow> = self
            .rows
            .iter()
            .filter(|row| self.predicates.iter().all(|p| Self::matches(row, p)))
            .collect();

        if !self.order.is_empty() {
            rows.sort_by(|a, b| self.order_rows(a, b));
        }

        let skip = usize::try_from(self.offset).unwrap_or(usize::MAX);
        let take = self
            .limit
            .map_or(usize::MAX, |n| usize::try_from(n).unwrap_or(usize::MAX));

        Ok(rows.into_iter().skip(skip).take(take).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Column;
    use serde_json::json;

    fn table() -> MemoryTable {
        MemoryTable::from_json(json!([
            {"id": 1, "title": "Rust in Action", "score": 5, "author": null},
            {"id": 2, "title": "Programming Rust", "score": 3, "author": "jim"},
            {"id": 3, "title": "The Book", "score": 5, "author": "steve"},
            {"id": 4, "title": "Zero To Production", "score": 4, "author": "luca"},
        ]))
        .unwrap()
    }

    fn ids(rows: &[JsonRow]) -> Vec<i64> {
        rows.iter().filter_map(|r| r["id"].as_i64()).collect()
    }

    fn order(column: &str, order: SortOrder) -> OrderTerm {
        OrderTerm {
            column: Column::new(column),
            order,
        }
    }

    #[test]
    fn test_from_json_rejects_non_objects() {
        assert!(MemoryTable::from_json(json!({"id": 1})).is_err());
        assert!(MemoryTable::from_json(json!([1, 2])).is_err());
        assert!(MemoryTable::from_json(json!([])).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_filter_order_limit_offset() {
        let rows = table()
            .query()
            .filter(Predicate::compare(Column::new("score"), Comparison::Gte, 4_i64))
            .order_by(vec![order("score", SortOrder::Desc), order("id", SortOrder::Asc)])
            .offset(1)
            .limit(2)
            .fetch()
            .await
            .unwrap();

        assert_eq!(ids(&rows), [3, 4]);
    }

    #[tokio::test]
    async fn test_like_is_case_insensitive() {
        let rows = table()
            .query()
            .filter(Predicate::compare(Column::new("title"), Comparison::Like, "%rust%"))
            .order_by(vec![order("id", SortOrder::Asc)])
            .fetch()
            .await
            .unwrap();

        assert_eq!(ids(&rows), [1, 2]);
    }

    #[tokio::test]
    async fn test_null_never_matches_comparisons() {
        let rows = table()
            .query()
            .filter(Predicate::or(vec![
                Predicate::compare(Column::new("author"), Comparison::Lt, "zzz"),
                Predicate::compare(Column::new("missing"), Comparison::Eq, 1_i64),
            ]))
            .order_by(vec![order("id", SortOrder::Asc)])
            .fetch()
            .await
            .unwrap();

        assert_eq!(ids(&rows), [2, 3, 4]);
    }

    #[tokio::test]
    async fn test_nulls_sort_last_ascending_first_descending() {
        let asc = table()
            .query()
            .order_by(vec![order("author", SortOrder::Asc)])
            .fetch()
            .await
            .unwrap();
        assert_eq!(ids(&asc), [2, 4, 3, 1]);

        let desc = table()
            .query()
            .order_by(vec![order("author", SortOrder::Desc)])
            .fetch()
            .await
            .unwrap();
        assert_eq!(ids(&desc), [1, 3, 4, 2]);
    }

    #[tokio::test]
    async fn test_repeated_filters_are_anded() {
        let rows = table()
            .query()
            .filter(Predicate::compare(Column::new("score"), Comparison::Eq, 5_i64))
            .filter(Predicate::compare(Column::new("id"), Comparison::Gt, 1_i64))
            .fetch()
            .await
            .unwrap();

        assert_eq!(ids(&rows), [3]);
    }

    #[test]
    fn test_like_matcher() {
        assert!(like("%rust%", "Programming RUST"));
        assert!(like("r_st", "rust"));
        assert!(like("%", ""));
        assert!(like("a%b%c", "aXXbYYc"));
        assert!(!like("a%b%c", "aXXbYY"));
        assert!(!like("rust", "rusty"));
        assert!(like("%ust", "rust"));
    }
}
