//! Running parsed queries against a backing table
//!
//! [`Paginator::execute`] is the only entry point. It applies filters and
//! ordering, then either skips to a numbered page or seeks past a cursor.
//! In cursor mode it fetches one extra row to learn whether a further page
//! exists, and builds the next token from the last row it returns.

use tracing::{debug, warn};

use crate::config::Config;
use crate::cursor::{seek_predicate, CursorCodec, CursorValues, JsonBase64Codec};
use crate::error::{Error, Result};
use crate::query::{FilterInstruction, PageRequest, ParsedQuery, QueryError, SortInstruction};
use crate::response::{CursorPage, OffsetPage, Page};
use crate::shape::{FilterOperator, PaginationMode, SortOrder};
use crate::store::{OrderTerm, Predicate, Record, TableQuery};
use crate::value::Value;

/// Executes [`ParsedQuery`]s
///
/// Stateless apart from the cursor codec; share one across handlers.
///
/// # Example
///
/// ```rust
/// use pagewise::prelude::*;
/// use serde_json::json;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let policy = PaginationPolicy::builder()
///     .default_limit(2)
///     .cursor_key("id")
///     .build()
///     .unwrap();
/// let shape = QueryShape::builder("posts", policy)
///     .field(FieldSpec::new("id", "id").sortable())
///     .build()
///     .unwrap();
/// let table = MemoryTable::from_json(json!([{"id": 1}, {"id": 2}, {"id": 3}])).unwrap();
///
/// let parsed = shape.parse(&RawParams::new()).unwrap();
/// let page = Paginator::new().execute(table.query(), parsed).await.unwrap();
/// assert_eq!(page.data().len(), 2);
/// assert!(page.next_cursor().is_some());
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Paginator<C = JsonBase64Codec> {
    codec: C,
}

impl Paginator {
    /// Paginator with the default JSON/base64 cursor codec
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Paginator whose codec honors the `cursor` config section
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::with_codec(JsonBase64Codec::from_config(&config.cursor))
    }
}

impl<C: CursorCodec> Paginator<C> {
    /// Paginator with a custom cursor codec
    pub fn with_codec(codec: C) -> Self {
        Self { codec }
    }

    /// Cursor codec in use
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Run `query` against `base` and shape the resulting page
    ///
    /// # Errors
    ///
    /// - [`Error::Query`] when the request's pagination mode is not offered by
    ///   the policy, or its cursor cannot be decoded or does not match the
    ///   current sort
    /// - [`Error::Store`] when the backing table fails
    /// - [`Error::Internal`] when a returned row lacks a sort field needed for
    ///   the next cursor
    pub async fn execute<Q: TableQuery>(&self, base: Q, query: ParsedQuery) -> Result<Page<Q::Row>> {
        let policy = &query.policy;
        let params = policy.params();

        if !policy.mode().permits(query.mode()) {
            return Err(match query.mode() {
                PaginationMode::Cursor => QueryError::cursor_not_allowed(&params.cursor, &params.page),
                _ => QueryError::page_not_allowed(&params.page, &params.cursor),
            }
            .into());
        }

        debug!(
            mode = %query.mode(),
            limit = query.limit,
            filters = query.filters.len(),
            sorts = query.sorting.len(),
            cursor = query.cursor_token().is_some(),
            "Executing paginated query"
        );

        match query.page {
            PageRequest::Offset { page, offset } => self
                .execute_offset(base, &query, page, offset)
                .await
                .map(Page::from),
            PageRequest::Cursor { ref token } => self
                .execute_cursor(base, &query, token.as_deref())
                .await
                .map(Page::from),
        }
    }

    async fn execute_offset<Q: TableQuery>(
        &self,
        base: Q,
        query: &ParsedQuery,
        page: u64,
        offset: u64,
    ) -> Result<OffsetPage<Q::Row>> {
        let mut table = apply_filters(base, &query.filters);
        if !query.sorting.is_empty() {
            table = table.order_by(order_terms(&query.sorting));
        }

        let data = table
            .offset(offset)
            .limit(u64::from(query.limit))
            .fetch()
            .await?;

        debug!(page, rows = data.len(), "Fetched offset page");

        Ok(OffsetPage {
            data,
            page,
            limit: query.limit,
        })
    }

    async fn execute_cursor<Q: TableQuery>(
        &self,
        base: Q,
        query: &ParsedQuery,
        token: Option<&str>,
    ) -> Result<CursorPage<Q::Row>> {
        let key = query
            .policy
            .cursor_key()
            .ok_or_else(|| Error::Internal("cursor pagination without a cursor key".into()))?;

        let mut sorting = query.sorting.clone();
        if !sorting.iter().any(|term| term.column.name() == key.name()) {
            sorting.push(SortInstruction::by_column(key.clone(), SortOrder::Asc));
        }

        let mut table = apply_filters(base, &query.filters);

        if let Some(token) = token {
            let parameter = &query.policy.params().cursor;
            let values = self.codec.decode(token, parameter)?;
            if let Some(seek) = seek_predicate(&sorting, &values, key, parameter)? {
                table = table.filter(seek);
            }
        }

        let limit = usize::try_from(query.limit).unwrap_or(usize::MAX);
        let mut data = table
            .order_by(order_terms(&sorting))
            .limit(u64::from(query.limit) + 1)
            .fetch()
            .await?;

        let next_cursor = if data.len() > limit {
            data.truncate(limit);
            match data.last() {
                Some(last) => Some(self.codec.encode(&cursor_values(last, &sorting)?)?),
                None => None,
            }
        } else {
            None
        };

        debug!(
            rows = data.len(),
            has_next = next_cursor.is_some(),
            "Fetched cursor page"
        );

        Ok(CursorPage { data, next_cursor })
    }
}

fn apply_filters<Q: TableQuery>(base: Q, filters: &[FilterInstruction]) -> Q {
    filters.iter().fold(base, |table, filter| {
        let value = match (filter.operator, &filter.value) {
            (FilterOperator::Like, value) => Value::String(format!("%{value}%")),
            (_, value) => value.clone(),
        };
        table.filter(Predicate::compare(
            filter.column.clone(),
            filter.operator.into(),
            value,
        ))
    })
}

fn order_terms(sorting: &[SortInstruction]) -> Vec<OrderTerm> {
    sorting
        .iter()
        .map(|term| OrderTerm {
            column: term.column.clone(),
            order: term.order,
        })
        .collect()
}

/// Sort-key values of `row`, keyed by each term's cursor field
///
/// Rows may expose a value under the declared field name or under the
/// column name; the cursor always stores it under the field name.
fn cursor_values<R: Record>(row: &R, sorting: &[SortInstruction]) -> Result<CursorValues> {
    sorting
        .iter()
        .map(|term| {
            let field = term.cursor_field();
            let value = row
                .value(field)
                .or_else(|| row.value(term.column.name()))
                .ok_or_else(|| Error::Internal(format!("row is missing sort field '{field}'")))?;
            if value.is_null() {
                warn!(
                    field,
                    column = term.column.name(),
                    "Next cursor carries a NULL sort value; rows after it cannot be reached by seeking"
                );
            }
            Ok((field.to_string(), value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{QueryErrorKind, RawParams};
    use crate::shape::{Column, FieldSpec, PaginationPolicy, QueryShape, SortSpec, ValueKind};
    use crate::store::{JsonRow, MemoryTable};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn table() -> MemoryTable {
        MemoryTable::from_json(json!([
            {"id": 1, "title": "Alpha", "score": 3, "author": "ann"},
            {"id": 2, "title": "beta", "score": 1, "author": "bob"},
            {"id": 3, "title": "Gamma", "score": 3, "author": "ann"},
            {"id": 4, "title": "Alphabet", "score": 2, "author": "cy"},
            {"id": 5, "title": "Delta", "score": 3, "author": "bob"},
        ]))
        .unwrap()
    }

    fn shape(mode: PaginationMode) -> QueryShape {
        let policy = PaginationPolicy::builder()
            .mode(mode)
            .default_limit(2)
            .max_limit(10)
            .cursor_key(Column::new("id"))
            .build()
            .unwrap();

        QueryShape::builder("posts", policy)
            .field(FieldSpec::new("id", "id").kind(ValueKind::Integer).sortable())
            .field(
                FieldSpec::new("title", "title")
                    .filter(FilterOperator::Like)
                    .sortable(),
            )
            .field(
                FieldSpec::new("score", "score")
                    .kind(ValueKind::Integer)
                    .filter(FilterOperator::Eq)
                    .sortable(),
            )
            .field(FieldSpec::new("author", "author").filter(FilterOperator::Eq))
            .build()
            .unwrap()
    }

    async fn run(shape: &QueryShape, query: &str) -> Result<Page<JsonRow>> {
        let parsed = shape.parse(&RawParams::from_query_str(query)?)?;
        Paginator::new().execute(table().query(), parsed).await
    }

    fn ids(page: &Page<JsonRow>) -> Vec<i64> {
        page.data().iter().filter_map(|r| r["id"].as_i64()).collect()
    }

    #[tokio::test]
    async fn test_cursor_walk_by_key() {
        let shape = shape(PaginationMode::Both);

        let first = run(&shape, "").await.unwrap();
        assert_eq!(ids(&first), [1, 2]);
        let token = first.next_cursor().unwrap().to_string();
        let values = JsonBase64Codec::default().decode(&token, "cursor").unwrap();
        assert_eq!(values.get("id"), Some(&Value::Integer(2)));

        let second = run(&shape, &format!("cursor={token}")).await.unwrap();
        assert_eq!(ids(&second), [3, 4]);

        let token = second.next_cursor().unwrap().to_string();
        let third = run(&shape, &format!("cursor={token}")).await.unwrap();
        assert_eq!(ids(&third), [5]);
        assert_eq!(third.next_cursor(), None);
    }

    #[tokio::test]
    async fn test_offset_page() {
        let page = run(&shape(PaginationMode::Both), "page=2&limit=2")
            .await
            .unwrap();
        assert_eq!(ids(&page), [3, 4]);
        assert!(matches!(page, Page::Offset(OffsetPage { page: 2, limit: 2, .. })));
    }

    #[tokio::test]
    async fn test_cursor_ties_on_non_unique_sort() {
        let shape = shape(PaginationMode::Cursor);
        let mut seen = Vec::new();
        let mut query = "sortBy=score&sortOrder=desc".to_string();

        loop {
            let page = run(&shape, &query).await.unwrap();
            seen.extend(ids(&page));
            match page.next_cursor() {
                Some(token) => query = format!("sortBy=score&sortOrder=desc&cursor={token}"),
                None => break,
            }
        }

        // score desc, id asc within ties
        assert_eq!(seen, [1, 3, 5, 4, 2]);
    }

    #[tokio::test]
    async fn test_like_filter_is_case_insensitive_containment() {
        let page = run(&shape(PaginationMode::Offset), "titleLike=ALPHA&limit=10")
            .await
            .unwrap();
        assert_eq!(ids(&page), [1, 4]);
    }

    #[tokio::test]
    async fn test_filters_combine_with_cursor() {
        let shape = shape(PaginationMode::Cursor);
        let first = run(&shape, "score=3&limit=1").await.unwrap();
        assert_eq!(ids(&first), [1]);

        let token = first.next_cursor().unwrap();
        let second = run(&shape, &format!("score=3&limit=1&cursor={token}"))
            .await
            .unwrap();
        assert_eq!(ids(&second), [3]);
    }

    #[tokio::test]
    async fn test_exact_fit_has_no_next_cursor() {
        let page = run(&shape(PaginationMode::Cursor), "limit=5").await.unwrap();
        assert_eq!(page.data().len(), 5);
        assert_eq!(page.next_cursor(), None);
    }

    #[tokio::test]
    async fn test_cursor_from_other_sort_is_mismatch() {
        let shape = shape(PaginationMode::Cursor);
        let first = run(&shape, "").await.unwrap();
        let token = first.next_cursor().unwrap();

        let err = run(&shape, &format!("sortBy=title&cursor={token}"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Query(ref e) if e.kind == QueryErrorKind::CursorMismatch));
    }

    #[tokio::test]
    async fn test_garbage_cursor_is_rejected() {
        let err = run(&shape(PaginationMode::Cursor), "cursor=not-a-token!")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Query(ref e) if e.kind == QueryErrorKind::InvalidCursor));
    }

    #[tokio::test]
    async fn test_mode_checked_against_policy() {
        let cursor_only = shape(PaginationMode::Cursor);
        let mut parsed = shape(PaginationMode::Both)
            .parse(&RawParams::from_query_str("page=2").unwrap())
            .unwrap();
        parsed.policy = cursor_only.policy().clone();

        let err = Paginator::new()
            .execute(table().query(), parsed)
            .await
            .unwrap_err();
        let Error::Query(err) = err else {
            panic!("expected a query error, got {err:?}");
        };
        assert_eq!(err.kind, QueryErrorKind::PaginationModeNotAllowed);
        assert_eq!(err.parameter.as_deref(), Some("page"));
    }

    #[tokio::test]
    async fn test_row_missing_sort_field_is_internal() {
        let policy = PaginationPolicy::builder()
            .mode(PaginationMode::Cursor)
            .default_limit(1)
            .default_sort(SortSpec::asc("rank"))
            .cursor_key("id")
            .build()
            .unwrap();
        let shape = QueryShape::builder("ranked", policy).build().unwrap();
        let table = MemoryTable::from_json(json!([{"id": 1}, {"id": 2}])).unwrap();

        let parsed = shape.parse(&RawParams::new()).unwrap();
        let err = Paginator::new()
            .execute(table.query(), parsed)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Internal(ref msg) if msg.contains("'rank'")));
    }

    #[tokio::test]
    async fn test_cursor_walk_on_renamed_sort_field() {
        let policy = PaginationPolicy::builder()
            .default_limit(1)
            .cursor_key("id")
            .build()
            .unwrap();
        let shape = QueryShape::builder("events", policy)
            .field(FieldSpec::new("createdAt", "created_at").sortable())
            .build()
            .unwrap();
        let table = MemoryTable::from_json(json!([
            {"id": 1, "created_at": "2024-03-01"},
            {"id": 2, "created_at": "2024-01-01"},
            {"id": 3, "created_at": "2024-02-01"},
        ]))
        .unwrap();

        let mut seen = Vec::new();
        let mut query = "sortBy=createdAt".to_string();
        loop {
            let parsed = shape.parse(&RawParams::from_query_str(&query).unwrap()).unwrap();
            let page = Paginator::new()
                .execute(table.query(), parsed)
                .await
                .unwrap();
            seen.extend(ids(&page));
            let Some(token) = page.next_cursor() else {
                break;
            };
            let values = JsonBase64Codec::default().decode(token, "cursor").unwrap();
            assert!(values.contains_key("createdAt"));
            assert!(!values.contains_key("created_at"));
            query = format!("sortBy=createdAt&cursor={token}");
        }

        assert_eq!(seen, [2, 3, 1]);
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_null_sort_value_is_logged() {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .finish();
        let row: JsonRow = json!({"id": 3, "published_at": null})
            .as_object()
            .unwrap()
            .clone();
        let sorting = vec![
            SortInstruction::new(Column::new("published_at"), "published", SortOrder::Desc),
            SortInstruction::by_column(Column::new("id"), SortOrder::Asc),
        ];

        let values =
            tracing::subscriber::with_default(subscriber, || cursor_values(&row, &sorting)).unwrap();
        assert_eq!(values["published"], Value::Null);
        assert_eq!(values["id"], Value::Integer(3));

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("NULL sort value"), "{output}");
        assert!(output.contains("published"), "{output}");
    }
}
