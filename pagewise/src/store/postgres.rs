//! PostgreSQL table queries via sqlx
//!
//! Every value reaches the server as a bound parameter, cast to the column's
//! declared SQL type when it has one. Column names are quoted identifiers;
//! computed columns splice their registered expression and are also merged
//! into each returned row under their name when they appear in the ordering.
//!
//! ```rust,no_run
//! use pagewise::store::{PgTable, TableQuery};
//! use sqlx::PgPool;
//!
//! # async fn demo(pool: PgPool) -> Result<(), pagewise::store::StoreError> {
//! let posts = PgTable::new(pool, "public.posts");
//! let rows = posts.query().limit(10).fetch().await?;
//! # Ok(())
//! # }
//! ```

use sqlx::{types::Json, PgPool, Postgres, QueryBuilder, Row};
use tracing::debug;

use super::{Comparison, JsonRow, OrderTerm, Predicate, StoreError, TableQuery};
use crate::shape::Column;
use crate::value::Value;

/// A PostgreSQL table or view
#[derive(Debug, Clone)]
pub struct PgTable {
    pool: PgPool,
    table: String,
}

impl PgTable {
    /// Table `name`, optionally schema-qualified (`schema.table`)
    pub fn new(pool: PgPool, name: &str) -> Self {
        Self {
            pool,
            table: quote_qualified(name),
        }
    }

    /// Start a query over every row
    #[must_use]
    pub fn query(&self) -> PgQuery {
        PgQuery {
            pool: self.pool.clone(),
            table: self.table.clone(),
            predicates: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
        }
    }
}

/// Query over a [`PgTable`]; rows come back as `to_jsonb(t)` objects plus
/// any computed order columns
#[derive(Debug, Clone)]
pub struct PgQuery {
    pool: PgPool,
    table: String,
    predicates: Vec<Predicate>,
    order: Vec<OrderTerm>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl PgQuery {
    /// SQL text this query would run, with `$n` placeholders
    #[must_use]
    pub fn sql(&self) -> String {
        self.builder().sql().to_string()
    }

    fn builder(&self) -> QueryBuilder<'static, Postgres> {
        build_select(
            &self.table,
            &self.predicates,
            &self.order,
            self.limit,
            self.offset,
        )
    }
}

impl TableQuery for PgQuery {
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
        self.offset = Some(n);
        self
    }

    async fn fetch(self) -> Result<Vec<JsonRow>, StoreError> {
        let mut builder = self.builder();
        debug!(sql = builder.sql(), "Executing table query");

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::from(e).with_context(self.table.clone()))?;

        rows.iter()
            .map(|row| {
                row.try_get::<Json<JsonRow>, _>("row")
                    .map(|Json(object)| object)
                    .map_err(|e| StoreError::from(e).with_context(self.table.clone()))
            })
            .collect()
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn quote_qualified(name: &str) -> String {
    name.split('.')
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(".")
}

fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn build_select(
    table: &str,
    predicates: &[Predicate],
    order: &[OrderTerm],
    limit: Option<u64>,
    offset: Option<u64>,
) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT to_jsonb(t)");

    // Computed order columns must come back in the row for cursor encoding
    let mut computed: Vec<&Column> = Vec::new();
    for term in order {
        if term.column.sql_expression().is_some()
            && !computed.iter().any(|c| c.name() == term.column.name())
        {
            computed.push(&term.column);
        }
    }
    if !computed.is_empty() {
        builder.push(" || jsonb_build_object(");
        for (i, column) in computed.iter().enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            builder.push(quote_literal(column.name())).push(", ");
            push_column(&mut builder, column);
        }
        builder.push(")");
    }

    builder.push(" AS row FROM ").push(table).push(" AS t");

    for (i, predicate) in predicates.iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        push_predicate(&mut builder, predicate);
    }

    for (i, term) in order.iter().enumerate() {
        builder.push(if i == 0 { " ORDER BY " } else { ", " });
        push_column(&mut builder, &term.column);
        builder.push(" ").push(term.order.as_sql());
    }

    if let Some(limit) = limit {
        builder
            .push(" LIMIT ")
            .push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
    }
    if let Some(offset) = offset {
        builder
            .push(" OFFSET ")
            .push_bind(i64::try_from(offset).unwrap_or(i64::MAX));
    }

    builder
}

fn push_column(builder: &mut QueryBuilder<'static, Postgres>, column: &Column) {
    match column.sql_expression() {
        Some(expr) => builder.push("(").push(expr).push(")"),
        None => builder.push("t.").push(quote_ident(column.name())),
    };
}

fn push_predicate(builder: &mut QueryBuilder<'static, Postgres>, predicate: &Predicate) {
    match predicate {
        Predicate::Compare { column, op, value } => {
            push_column(builder, column);
            if *op == Comparison::Like {
                builder.push("::text ILIKE ");
                push_value(builder, value);
            } else {
                builder.push(format!(" {op} "));
                push_value(builder, value);
                if let Some(ty) = column.sql_type() {
                    builder.push("::").push(ty);
                }
            }
        }
        Predicate::And(terms) | Predicate::Or(terms) if terms.is_empty() => {
            builder.push(if matches!(predicate, Predicate::And(_)) {
                "TRUE"
            } else {
                "FALSE"
            });
        }
        Predicate::And(terms) | Predicate::Or(terms) => {
            let sep = if matches!(predicate, Predicate::And(_)) {
                " AND "
            } else {
                " OR "
            };
            builder.push("(");
            for (i, term) in terms.iter().enumerate() {
                if i > 0 {
                    builder.push(sep);
                }
                push_predicate(builder, term);
            }
            builder.push(")");
        }
    }
}

fn push_value(builder: &mut QueryBuilder<'static, Postgres>, value: &Value) {
    match value.clone() {
        Value::Null => builder.push_bind(None::<String>),
        Value::Boolean(b) => builder.push_bind(b),
        Value::Integer(n) => builder.push_bind(n),
        Value::Float(n) => builder.push_bind(n),
        Value::String(s) => builder.push_bind(s),
    };
}
