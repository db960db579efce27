//! Human- and machine-readable descriptions of query shapes

use std::fmt;

use serde::Serialize;

use super::{FieldSpec, FilterOperator, PaginationMode, QueryShape, ValueKind};
use crate::value::Value;

/// Serializable description of a [`QueryShape`]
///
/// The `Display` impl renders the same information as text, followed by
/// example query strings a client could send.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapeSummary {
    /// Shape identifier
    pub shape: String,
    /// Pagination settings
    pub pagination: PolicySummary,
    /// Per-field capabilities, in declaration order
    pub fields: Vec<FieldSummary>,
    /// Every filter parameter
    pub filter_aliases: Vec<String>,
    /// Every accepted sort key
    pub sort_aliases: Vec<String>,
    /// Client-facing pagination parameter names
    pub parameters: ParameterSummary,
}

/// Pagination settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicySummary {
    /// Offered pagination mode
    pub mode: PaginationMode,
    /// Page size when the client sends no limit
    pub default_limit: u32,
    /// Largest accepted limit
    pub max_limit: u32,
    /// Whether clients may send a limit
    pub allow_custom_limit: bool,
    /// Whether clients may choose the sort
    pub allow_custom_sort: bool,
    /// Whether more than one sort field is accepted
    pub allow_multiple_sort: bool,
    /// Default sort as `column direction` pairs
    pub default_sort: Vec<String>,
    /// Unique tie-breaker column for cursor pages
    pub cursor_key: Option<String>,
}

/// Parameter names clients use for pagination and sorting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterSummary {
    /// Page number parameter
    pub page: String,
    /// Continuation token parameter
    pub cursor: String,
    /// Page size parameter
    pub limit: String,
    /// Sort field list parameter
    pub sort_by: String,
    /// Sort direction list parameter
    pub sort_order: String,
}

/// One field's capabilities
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSummary {
    /// Declared field name
    pub name: String,
    /// Type filter values are parsed as
    pub kind: ValueKind,
    /// Whether the field can be sorted on
    pub sortable: bool,
    /// Sort key, for sortable fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_alias: Option<String>,
    /// Accepted filters on this field
    pub filters: Vec<FilterSummary>,
}

/// One accepted filter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterSummary {
    /// Comparison applied
    pub operator: FilterOperator,
    /// Query parameter name
    pub alias: String,
    /// Value applied when the parameter is absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ShapeSummary {
    pub(crate) fn of(shape: &QueryShape) -> Self {
        let policy = shape.policy();
        let params = policy.params();

        Self {
            shape: shape.name().to_string(),
            pagination: PolicySummary {
                mode: policy.mode(),
                default_limit: policy.default_limit(),
                max_limit: policy.max_limit(),
                allow_custom_limit: policy.allow_custom_limit(),
                allow_custom_sort: policy.allow_custom_sort(),
                allow_multiple_sort: policy.allow_multiple_sort(),
                default_sort: policy
                    .default_sort()
                    .iter()
                    .map(|s| format!("{} {}", s.column, s.order))
                    .collect(),
                cursor_key: policy.cursor_key().map(|c| c.name().to_string()),
            },
            fields: shape.fields().iter().map(FieldSummary::of).collect(),
            filter_aliases: shape
                .filter_aliases()
                .into_iter()
                .map(str::to_string)
                .collect(),
            sort_aliases: shape
                .sort_aliases()
                .into_iter()
                .map(str::to_string)
                .collect(),
            parameters: ParameterSummary {
                page: params.page.clone(),
                cursor: params.cursor.clone(),
                limit: params.limit.clone(),
                sort_by: params.sort_by.clone(),
                sort_order: params.sort_order.clone(),
            },
        }
    }

    /// Example query strings, each with a short caption
    #[must_use]
    pub fn examples(&self) -> Vec<(String, String)> {
        let p = &self.parameters;
        let policy = &self.pagination;
        let mut examples = Vec::new();

        if policy.mode.allows_offset() {
            examples.push(("Page 2".to_string(), format!("?{}=2", p.page)));
        }
        if policy.mode.allows_cursor() {
            examples.push((
                "Next page".to_string(),
                format!("?{}=<nextCursor>", p.cursor),
            ));
        }
        if policy.allow_custom_limit {
            examples.push((
                "Page size".to_string(),
                format!("?{}={}", p.limit, policy.max_limit.min(20)),
            ));
        }

        if policy.allow_custom_sort {
            if let Some(alias) = self.sort_aliases.first() {
                examples.push((
                    "Sort".to_string(),
                    format!("?{}={alias}&{}=desc", p.sort_by, p.sort_order),
                ));
            }
            if policy.allow_multiple_sort && self.sort_aliases.len() > 1 {
                let aliases = self.sort_aliases[..2].join(",");
                examples.push((
                    "Multi-field sort".to_string(),
                    format!("?{}={aliases}&{}=asc,desc", p.sort_by, p.sort_order),
                ));
            }
        }

        let filter_example = self.fields.iter().find_map(|field| {
            field
                .filters
                .first()
                .map(|filter| format!("{}={}", filter.alias, example_value(field.kind, filter.operator)))
        });
        if let Some(filter) = &filter_example {
            examples.push(("Filter".to_string(), format!("?{filter}")));
        }

        let mut combined = Vec::new();
        if policy.mode.allows_offset() {
            combined.push(format!("{}=1", p.page));
        }
        if policy.allow_custom_limit {
            combined.push(format!("{}={}", p.limit, policy.default_limit));
        }
        if policy.allow_custom_sort {
            if let Some(alias) = self.sort_aliases.first() {
                combined.push(format!("{}={alias}", p.sort_by));
            }
        }
        if let Some(filter) = filter_example {
            combined.push(filter);
        }
        if combined.len() > 1 {
            examples.push(("Combined".to_string(), format!("?{}", combined.join("&"))));
        }

        examples
    }
}

impl FieldSummary {
    fn of(field: &FieldSpec) -> Self {
        Self {
            name: field.name().to_string(),
            kind: field.value_kind(),
            sortable: field.is_sortable(),
            sort_alias: field
                .is_sortable()
                .then(|| field.sort_alias().to_string()),
            filters: field
                .filter_specs()
                .iter()
                .map(|spec| FilterSummary {
                    operator: spec.operator(),
                    alias: spec.alias().to_string(),
                    default: spec.default_value().cloned(),
                })
                .collect(),
        }
    }
}

fn example_value(kind: ValueKind, operator: FilterOperator) -> &'static str {
    match (kind, operator) {
        (_, FilterOperator::Like) => "abc",
        (ValueKind::Integer, _) => "10",
        (ValueKind::Float, _) => "9.99",
        (ValueKind::Boolean, _) => "true",
        (ValueKind::Text, _) => "value",
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

impl fmt::Display for ShapeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let policy = &self.pagination;

        writeln!(f, "Query shape '{}'", self.shape)?;
        writeln!(f)?;
        writeln!(f, "Pagination:")?;
        writeln!(f, "  mode: {}", policy.mode)?;
        writeln!(
            f,
            "  limit: {} (max {}, custom: {})",
            policy.default_limit,
            policy.max_limit,
            yes_no(policy.allow_custom_limit)
        )?;
        writeln!(
            f,
            "  custom sort: {}, multiple sort: {}",
            yes_no(policy.allow_custom_sort),
            yes_no(policy.allow_multiple_sort)
        )?;
        if !policy.default_sort.is_empty() {
            writeln!(f, "  default sort: {}", policy.default_sort.join(", "))?;
        }
        if let Some(key) = &policy.cursor_key {
            writeln!(f, "  cursor key: {key}")?;
        }

        if !self.fields.is_empty() {
            writeln!(f)?;
            writeln!(f, "Fields:")?;
            for field in &self.fields {
                write!(f, "  {} ({})", field.name, field.kind)?;
                if let Some(alias) = &field.sort_alias {
                    write!(f, " sortable as '{alias}'")?;
                }
                writeln!(f)?;
                for filter in &field.filters {
                    write!(f, "    {} -> {}", filter.alias, filter.operator)?;
                    if let Some(default) = &filter.default {
                        write!(f, " (default: {default})")?;
                    }
                    writeln!(f)?;
                }
            }
        }

        let examples = self.examples();
        if !examples.is_empty() {
            writeln!(f)?;
            writeln!(f, "Examples:")?;
            for (caption, query) in examples {
                writeln!(f, "  {caption}: {query}")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{Column, FilterSpec, PaginationPolicy, SortSpec};

    fn shape() -> QueryShape {
        let policy = PaginationPolicy::builder()
            .default_limit(2)
            .max_limit(10)
            .default_sort(SortSpec::desc(Column::new("created_at")))
            .cursor_key(Column::new("id"))
            .build()
            .unwrap();

        QueryShape::builder("posts", policy)
            .field(
                FieldSpec::new("id", Column::new("id"))
                    .kind(ValueKind::Integer)
                    .filters([FilterOperator::Eq, FilterOperator::Gt])
                    .sortable(),
            )
            .field(
                FieldSpec::new("title", Column::new("title"))
                    .filter(FilterOperator::Like)
                    .sortable_as("name"),
            )
            .field(
                FieldSpec::new("status", Column::new("status"))
                    .filter_spec(FilterSpec::new(FilterOperator::Eq, "status").with_default("live")),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_summary_collects_policy_and_fields() {
        let summary = shape().describe();

        assert_eq!(summary.shape, "posts");
        assert_eq!(summary.pagination.mode, PaginationMode::Both);
        assert_eq!(summary.pagination.default_sort, ["created_at desc"]);
        assert_eq!(summary.pagination.cursor_key.as_deref(), Some("id"));
        assert_eq!(summary.filter_aliases, ["id", "idGt", "titleLike", "status"]);
        assert_eq!(summary.sort_aliases, ["id", "name"]);
        assert_eq!(summary.fields[2].sort_alias, None);
        assert_eq!(
            summary.fields[2].filters[0].default,
            Some(Value::String("live".into()))
        );
    }

    #[test]
    fn test_summary_serializes() {
        let json = serde_json::to_value(shape().describe()).unwrap();
        assert_eq!(json["pagination"]["mode"], "both");
        assert_eq!(json["fields"][0]["kind"], "integer");
        assert_eq!(json["fields"][1]["filters"][0]["operator"], "like");
        assert!(json["fields"][2].get("sort_alias").is_none());
    }

    #[test]
    fn test_examples_follow_policy() {
        let examples = shape().describe().examples();
        let queries: Vec<&str> = examples.iter().map(|(_, q)| q.as_str()).collect();

        assert!(queries.contains(&"?page=2"));
        assert!(queries.contains(&"?cursor=<nextCursor>"));
        assert!(queries.contains(&"?sortBy=id&sortOrder=desc"));
        assert!(queries.contains(&"?sortBy=id,name&sortOrder=asc,desc"));
        assert!(queries.contains(&"?id=10"));
        assert!(queries.contains(&"?page=1&limit=2&sortBy=id&id=10"));
    }

    #[test]
    fn test_display_renders_sections() {
        let text = shape().describe().to_string();
        assert!(text.starts_with("Query shape 'posts'"));
        assert!(text.contains("mode: both"));
        assert!(text.contains("title (text) sortable as 'name'"));
        assert!(text.contains("status -> eq (default: live)"));
        assert!(text.contains("Examples:"));
    }
}
