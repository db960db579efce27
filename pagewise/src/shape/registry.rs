//! Query shapes and the registry that holds them
//!
//! A [`QueryShape`] bundles a [`PaginationPolicy`] with the ordered list of
//! [`FieldSpec`]s one list endpoint accepts. Shapes are validated once when
//! built and then shared read-only through a [`ShapeRegistry`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use super::{FieldSpec, PaginationPolicy, ShapeError, ShapeSummary};
use crate::query::{self, ParsedQuery, QueryError, RawParams};

/// Declared filters, sorts and pagination policy for one list endpoint
///
/// # Example
///
/// ```rust
/// use pagewise::query::RawParams;
/// use pagewise::shape::{Column, FieldSpec, FilterOperator, PaginationPolicy, QueryShape};
///
/// let policy = PaginationPolicy::builder()
///     .cursor_key(Column::new("id"))
///     .build()
///     .unwrap();
///
/// let shape = QueryShape::builder("posts", policy)
///     .field(FieldSpec::new("id", Column::new("id")).sortable())
///     .field(FieldSpec::new("title", Column::new("title")).filter(FilterOperator::Like))
///     .build()
///     .unwrap();
///
/// let parsed = shape
///     .parse(&RawParams::from_query_str("titleLike=rust&sortBy=id").unwrap())
///     .unwrap();
/// assert_eq!(parsed.filters.len(), 1);
/// assert_eq!(parsed.sorting.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct QueryShape {
    name: String,
    policy: Arc<PaginationPolicy>,
    fields: Vec<FieldSpec>,
}

impl QueryShape {
    /// Start declaring a shape
    pub fn builder(name: impl Into<String>, policy: PaginationPolicy) -> QueryShapeBuilder {
        QueryShapeBuilder {
            name: name.into(),
            policy,
            fields: Vec::new(),
        }
    }

    /// Shape identifier
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pagination policy
    #[must_use]
    pub fn policy(&self) -> &Arc<PaginationPolicy> {
        &self.policy
    }

    /// Declared fields, in declaration order
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Look up a field by name
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Every public filter alias
    #[must_use]
    pub fn filter_aliases(&self) -> Vec<&str> {
        self.fields
            .iter()
            .flat_map(|f| f.filter_specs().iter().map(|spec| spec.alias()))
            .collect()
    }

    /// Every public sort alias
    #[must_use]
    pub fn sort_aliases(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.is_sortable())
            .map(FieldSpec::sort_alias)
            .collect()
    }

    /// Turn raw request parameters into validated instructions
    pub fn parse(&self, params: &RawParams) -> Result<ParsedQuery, QueryError> {
        query::parse(&self.policy, &self.fields, params)
    }

    /// Describe what clients may send to this endpoint
    #[must_use]
    pub fn describe(&self) -> ShapeSummary {
        ShapeSummary::of(self)
    }
}

/// Builder for [`QueryShape`]
#[derive(Debug, Clone)]
pub struct QueryShapeBuilder {
    name: String,
    policy: PaginationPolicy,
    fields: Vec<FieldSpec>,
}

impl QueryShapeBuilder {
    /// Declare a field
    #[must_use]
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Declare several fields
    #[must_use]
    pub fn fields(mut self, fields: impl IntoIterator<Item = FieldSpec>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Validate alias uniqueness and freeze the shape
    pub fn build(self) -> Result<QueryShape, ShapeError> {
        let params = self.policy.params();
        let mut field_names: HashSet<&str> = HashSet::new();
        let mut sort_aliases: HashMap<&str, &str> = HashMap::new();
        let mut filter_aliases: HashMap<&str, &str> = HashMap::new();

        for field in &self.fields {
            if !field_names.insert(field.name()) {
                return Err(ShapeError::DuplicateField(field.name().to_string()));
            }

            if field.is_sortable() {
                if let Some(first) = sort_aliases.insert(field.sort_alias(), field.name()) {
                    return Err(ShapeError::DuplicateSortAlias {
                        alias: field.sort_alias().to_string(),
                        first: first.to_string(),
                        second: field.name().to_string(),
                    });
                }
            }

            for (i, spec) in field.filter_specs().iter().enumerate() {
                let alias = spec.alias();
                if params.is_reserved(alias) {
                    return Err(ShapeError::ReservedParameter {
                        field: field.name().to_string(),
                        alias: alias.to_string(),
                    });
                }
                if field.filter_specs()[..i].iter().any(|s| s.alias() == alias) {
                    return Err(ShapeError::DuplicateFilterAlias {
                        field: field.name().to_string(),
                        alias: alias.to_string(),
                    });
                }
                if let Some(first) = filter_aliases.get(alias) {
                    if *first != field.name() {
                        return Err(ShapeError::FilterAliasConflict {
                            alias: alias.to_string(),
                            first: (*first).to_string(),
                            second: field.name().to_string(),
                        });
                    }
                }
                filter_aliases.insert(alias, field.name());
            }
        }

        debug!(
            shape = %self.name,
            fields = self.fields.len(),
            filters = filter_aliases.len(),
            sorts = sort_aliases.len(),
            mode = %self.policy.mode(),
            "Query shape registered"
        );

        Ok(QueryShape {
            name: self.name,
            policy: Arc::new(self.policy),
            fields: self.fields,
        })
    }
}

/// Immutable set of query shapes keyed by identifier
///
/// Built once at startup and shared freely; lookups hand out `Arc`s so no
/// locking is needed.
///
/// ```rust
/// use pagewise::shape::{Column, PaginationMode, PaginationPolicy, QueryShape, ShapeRegistry};
///
/// let policy = PaginationPolicy::builder().mode(PaginationMode::Offset).build().unwrap();
/// let registry = ShapeRegistry::builder()
///     .shape(QueryShape::builder("users", policy).build().unwrap())
///     .build()
///     .unwrap();
///
/// assert!(registry.get("users").is_some());
/// assert!(registry.get("orders").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ShapeRegistry {
    shapes: HashMap<String, Arc<QueryShape>>,
}

impl ShapeRegistry {
    /// Start collecting shapes
    #[must_use]
    pub fn builder() -> ShapeRegistryBuilder {
        ShapeRegistryBuilder::default()
    }

    /// Look up a shape
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<QueryShape>> {
        self.shapes.get(name).cloned()
    }

    /// Registered identifiers, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.shapes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Summaries of every registered shape, sorted by identifier
    #[must_use]
    pub fn summaries(&self) -> Vec<ShapeSummary> {
        self.names()
            .into_iter()
            .filter_map(|name| self.shapes.get(name))
            .map(|shape| shape.describe())
            .collect()
    }

    /// Number of registered shapes
    #[must_use]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Whether no shapes are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

/// Builder for [`ShapeRegistry`]
#[derive(Debug, Clone, Default)]
pub struct ShapeRegistryBuilder {
    shapes: Vec<QueryShape>,
}

impl ShapeRegistryBuilder {
    /// Add a shape
    #[must_use]
    pub fn shape(mut self, shape: QueryShape) -> Self {
        self.shapes.push(shape);
        self
    }

    /// Reject duplicate identifiers and freeze the registry
    pub fn build(self) -> Result<ShapeRegistry, ShapeError> {
        let mut shapes = HashMap::with_capacity(self.shapes.len());
        for shape in self.shapes {
            let name = shape.name().to_string();
            if shapes.contains_key(&name) {
                return Err(ShapeError::DuplicateShape(name));
            }
            shapes.insert(name, Arc::new(shape));
        }
        Ok(ShapeRegistry { shapes })
    }
}
