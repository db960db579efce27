//! Posts API Example - filtering, sorting and pagination over an in-memory table
//!
//! This example demonstrates:
//! - Declaring a query shape with typed filters and sort aliases
//! - Seeding the pagination policy from configuration
//! - Offset and cursor pagination on the same endpoint
//! - Describing the accepted parameters at `/posts/_shape`
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example posts-api
//! ```
//!
//! ## Testing the API
//!
//! ```bash
//! # First cursor page (default mode is "both": no page parameter means cursor)
//! curl "http://localhost:8080/posts"
//!
//! # Follow the nextCursor token from the previous response
//! curl "http://localhost:8080/posts?cursor=eyJpZCI6MTB9"
//!
//! # Numbered pages
//! curl "http://localhost:8080/posts?page=2&limit=5"
//!
//! # Filter and sort
//! curl "http://localhost:8080/posts?titleLike=rust&likesGte=10&sortBy=likes&sortOrder=desc"
//!
//! # Accepted parameters
//! curl "http://localhost:8080/posts/_shape"
//! ```

use std::sync::Arc;

use anyhow::Context;
use axum::{extract::State, routing::get, Json, Router};
use pagewise::prelude::*;
use pagewise::shape::ShapeSummary;
use serde_json::json;

#[derive(Clone)]
struct AppState {
    shapes: Arc<ShapeRegistry>,
    posts: MemoryTable,
    paginator: Arc<Paginator>,
}

impl AppState {
    fn shape(&self, name: &str) -> Result<Arc<QueryShape>> {
        self.shapes
            .get(name)
            .ok_or_else(|| Error::Internal(format!("shape '{name}' is not registered")))
    }
}

async fn list_posts(State(state): State<AppState>, params: RawParams) -> Result<Page<JsonRow>> {
    let query = state.shape("posts")?.parse(&params)?;
    state.paginator.execute(state.posts.query(), query).await
}

async fn describe_posts(State(state): State<AppState>) -> Result<Json<ShapeSummary>> {
    Ok(Json(state.shape("posts")?.describe()))
}

fn posts_shape(config: &Config) -> std::result::Result<QueryShape, ShapeError> {
    let policy = config
        .policy_builder()
        .default_sort(SortSpec::desc("published_at"))
        .cursor_key("id")
        .build()?;

    QueryShape::builder("posts", policy)
        .field(
            FieldSpec::new("id", "id")
                .kind(ValueKind::Integer)
                .filters([FilterOperator::Eq, FilterOperator::Gt, FilterOperator::Lt])
                .sortable(),
        )
        .field(
            FieldSpec::new("title", "title")
                .filters([FilterOperator::Eq, FilterOperator::Like])
                .sortable(),
        )
        .field(FieldSpec::new("author", "author").filter(FilterOperator::Eq))
        .field(
            FieldSpec::new("likes", "likes")
                .kind(ValueKind::Integer)
                .filters([FilterOperator::Gte, FilterOperator::Lte])
                .sortable(),
        )
        .field(FieldSpec::new("published_at", "published_at").sortable_as("published"))
        .field(
            FieldSpec::new("draft", "draft")
                .kind(ValueKind::Boolean)
                .filter_spec(FilterSpec::new(FilterOperator::Eq, "draft").with_default(false)),
        )
        .build()
}

fn seed_posts() -> anyhow::Result<MemoryTable> {
    let authors = ["ada", "grace", "linus", "barbara"];
    let topics = ["Rust", "Databases", "Async Rust", "Compilers", "Networking"];

    let rows = (1..=40)
        .map(|id: usize| {
            json!({
                "id": id,
                "title": format!("{} notes #{id}", topics[id % topics.len()]),
                "author": authors[id % authors.len()],
                "likes": (id * 7) % 25,
                "published_at": format!("2024-{:02}-{:02}", id % 12 + 1, id % 28 + 1),
                "draft": id % 9 == 0,
            })
        })
        .collect();

    MemoryTable::from_json(serde_json::Value::Array(rows)).context("seed rows are not objects")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    init_tracing(&config)?;

    let shapes = ShapeRegistry::builder()
        .shape(posts_shape(&config)?)
        .build()?;
    for summary in shapes.summaries() {
        tracing::info!("Registered query shape\n{summary}");
    }

    let state = AppState {
        shapes: Arc::new(shapes),
        posts: seed_posts()?,
        paginator: Arc::new(Paginator::from_config(&config)),
    };

    let app = Router::new()
        .route("/posts", get(list_posts))
        .route("/posts/_shape", get(describe_posts))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
