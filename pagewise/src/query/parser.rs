//! Raw parameters to validated instructions
//!
//! Parsing is pure: the same policy, fields and parameters always produce the
//! same [`ParsedQuery`] or the same [`QueryError`].

use std::sync::Arc;

use tracing::debug;

use super::{
    FilterInstruction, PageRequest, ParsedQuery, QueryError, QueryErrorKind, RawParams,
    SortInstruction,
};
use crate::shape::{FieldSpec, PaginationMode, PaginationPolicy, SortOrder};

/// Turn raw request parameters into validated instructions
///
/// # Errors
///
/// Returns a [`QueryError`] naming the offending parameter when the request
/// uses a pagination mode the policy forbids, repeats a single-valued
/// parameter, sends an untypable filter value, an unknown sort alias, an
/// invalid sort direction, or a limit that is not a positive integer within
/// the policy maximum.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use pagewise::query::{parse, PageRequest, RawParams};
/// use pagewise::shape::{Column, FieldSpec, PaginationPolicy};
///
/// let policy = Arc::new(
///     PaginationPolicy::builder()
///         .default_limit(2)
///         .max_limit(10)
///         .cursor_key(Column::new("id"))
///         .build()
///         .unwrap(),
/// );
/// let fields = [FieldSpec::new("id", Column::new("id")).sortable()];
///
/// let params = RawParams::from_query_str("page=2&limit=2").unwrap();
/// let parsed = parse(&policy, &fields, &params).unwrap();
/// assert_eq!(parsed.page, PageRequest::Offset { page: 2, offset: 2 });
///
/// let parsed = parse(&policy, &fields, &RawParams::new()).unwrap();
/// assert_eq!(parsed.page, PageRequest::Cursor { token: None });
/// ```
pub fn parse(
    policy: &Arc<PaginationPolicy>,
    fields: &[FieldSpec],
    params: &RawParams,
) -> Result<ParsedQuery, QueryError> {
    let names = policy.params();
    let page_raw = params.single_non_empty(&names.page)?;
    let cursor_raw = params.single_non_empty(&names.cursor)?;

    let mode = match policy.mode() {
        PaginationMode::Offset => {
            if cursor_raw.is_some() {
                return Err(QueryError::cursor_not_allowed(&names.cursor, &names.page));
            }
            PaginationMode::Offset
        }
        PaginationMode::Cursor => {
            if page_raw.is_some() {
                return Err(QueryError::page_not_allowed(&names.page, &names.cursor));
            }
            PaginationMode::Cursor
        }
        PaginationMode::Both if page_raw.is_some() => PaginationMode::Offset,
        PaginationMode::Both => PaginationMode::Cursor,
    };

    let filters = parse_filters(fields, params)?;
    let sorting = parse_sorting(policy, fields, params)?;
    let limit = parse_limit(policy, params)?;

    let page = if mode == PaginationMode::Offset {
        let page = page_raw
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|page| *page >= 1)
            .unwrap_or(1);
        PageRequest::Offset {
            page,
            offset: (page - 1).saturating_mul(u64::from(limit)),
        }
    } else {
        PageRequest::Cursor {
            token: cursor_raw.map(str::to_string),
        }
    };

    debug!(
        mode = %mode,
        limit,
        filters = filters.len(),
        sorts = sorting.len(),
        has_cursor = cursor_raw.is_some() && mode == PaginationMode::Cursor,
        "Parsed list query"
    );

    Ok(ParsedQuery {
        filters,
        sorting,
        limit,
        page,
        policy: Arc::clone(policy),
    })
}

fn parse_filters(
    fields: &[FieldSpec],
    params: &RawParams,
) -> Result<Vec<FilterInstruction>, QueryError> {
    let mut filters = Vec::new();

    for field in fields {
        for spec in field.filter_specs() {
            let value = match params.single(spec.alias())? {
                Some("") => None,
                Some(raw) => {
                    let kind = field.value_kind();
                    let value = kind.parse(raw).ok_or_else(|| {
                        QueryError::new(
                            QueryErrorKind::InvalidValue,
                            spec.alias(),
                            format!(
                                "Invalid value '{raw}' for filter '{}': expected {}.",
                                spec.alias(),
                                kind.expected()
                            ),
                        )
                    })?;
                    Some(value)
                }
                None => spec
                    .default_value()
                    .filter(|value| !value.is_null() && !value.is_empty_string())
                    .cloned(),
            };

            if let Some(value) = value {
                filters.push(FilterInstruction {
                    column: field.column().clone(),
                    field: field.name().to_string(),
                    operator: spec.operator(),
                    value,
                });
            }
        }
    }

    Ok(filters)
}

fn default_sorting(policy: &PaginationPolicy) -> Vec<SortInstruction> {
    policy
        .default_sort()
        .iter()
        .map(|spec| SortInstruction::by_column(spec.column.clone(), spec.order))
        .collect()
}

/// Split repeated comma-separated parameters into trimmed segments, keeping positions
fn segments(values: &[String]) -> Vec<&str> {
    values
        .iter()
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .collect()
}

fn parse_sorting(
    policy: &PaginationPolicy,
    fields: &[FieldSpec],
    params: &RawParams,
) -> Result<Vec<SortInstruction>, QueryError> {
    let names = policy.params();
    if !policy.allow_custom_sort() {
        return Ok(default_sorting(policy));
    }

    let aliases = segments(params.get_all(&names.sort_by));
    let orders = segments(params.get_all(&names.sort_order));

    let requested: Vec<(usize, &str)> = aliases
        .iter()
        .enumerate()
        .filter(|(_, alias)| !alias.is_empty())
        .map(|(i, alias)| (i, *alias))
        .collect();

    if requested.is_empty() {
        return Ok(default_sorting(policy));
    }

    if !policy.allow_multiple_sort() && requested.len() > 1 {
        let received: Vec<&str> = requested.iter().map(|(_, alias)| *alias).collect();
        return Err(QueryError::new(
            QueryErrorKind::MultipleSortNotAllowed,
            &names.sort_by,
            format!(
                "Multiple sort fields are not allowed. Received {} fields: {}. \
                 Only single field sorting is permitted.",
                received.len(),
                received.join(", ")
            ),
        ));
    }

    let mut sorting = Vec::with_capacity(requested.len());
    for (position, alias) in requested {
        let field = fields
            .iter()
            .find(|f| f.is_sortable() && f.sort_alias() == alias)
            .ok_or_else(|| {
                let available: Vec<&str> = fields
                    .iter()
                    .filter(|f| f.is_sortable())
                    .map(FieldSpec::sort_alias)
                    .collect();
                let available = if available.is_empty() {
                    "(none)".to_string()
                } else {
                    available.join(", ")
                };
                QueryError::new(
                    QueryErrorKind::UnknownSortField,
                    &names.sort_by,
                    format!("Invalid sort field '{alias}'. Available fields: {available}"),
                )
            })?;

        let order = match orders.get(position).copied() {
            None | Some("") => SortOrder::Asc,
            Some(token) => SortOrder::parse(token).ok_or_else(|| {
                QueryError::new(
                    QueryErrorKind::InvalidSortOrder,
                    &names.sort_order,
                    format!("Invalid sort order '{token}'. Must be 'asc' or 'desc'."),
                )
            })?,
        };

        sorting.push(SortInstruction::new(
            field.column().clone(),
            field.name(),
            order,
        ));
    }

    Ok(sorting)
}

fn parse_limit(policy: &PaginationPolicy, params: &RawParams) -> Result<u32, QueryError> {
    if !policy.allow_custom_limit() {
        return Ok(policy.default_limit());
    }

    let name = &policy.params().limit;
    let Some(raw) = params.single_non_empty(name)? else {
        return Ok(policy.default_limit());
    };

    let requested = raw
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|limit| *limit > 0)
        .ok_or_else(|| QueryError::invalid_limit(name, raw))?;

    if requested > i64::from(policy.max_limit()) {
        return Err(QueryError::limit_exceeded(
            name,
            requested,
            policy.max_limit(),
        ));
    }

    u32::try_from(requested).map_err(|_| QueryError::invalid_limit(name, raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParamNames;
    use crate::shape::{Column, FilterOperator, FilterSpec, SortSpec, ValueKind};
    use crate::value::Value;

    fn policy(mode: PaginationMode) -> Arc<PaginationPolicy> {
        Arc::new(
            PaginationPolicy::builder()
                .mode(mode)
                .default_limit(2)
                .max_limit(10)
                .default_sort(SortSpec::desc(Column::new("created_at")))
                .cursor_key(Column::new("id"))
                .build()
                .unwrap(),
        )
    }

    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("id", Column::new("id"))
                .kind(ValueKind::Integer)
                .filters([FilterOperator::Eq, FilterOperator::Gt])
                .sortable(),
            FieldSpec::new("title", Column::new("title"))
                .filters([FilterOperator::Eq, FilterOperator::Like])
                .sortable(),
            FieldSpec::new("createdAt", Column::new("created_at")).sortable_as("date"),
            FieldSpec::new("status", Column::new("status"))
                .filter_spec(FilterSpec::new(FilterOperator::Eq, "status").with_default("live")),
        ]
    }

    fn run(mode: PaginationMode, query: &str) -> Result<ParsedQuery, QueryError> {
        let params = RawParams::from_query_str(query).unwrap();
        parse(&policy(mode), &fields(), &params)
    }

    #[test]
    fn test_both_mode_defaults_to_cursor() {
        let parsed = run(PaginationMode::Both, "").unwrap();
        assert_eq!(parsed.page, PageRequest::Cursor { token: None });
        assert_eq!(parsed.limit, 2);
    }

    #[test]
    fn test_both_mode_page_selects_offset() {
        let parsed = run(PaginationMode::Both, "page=3").unwrap();
        assert_eq!(parsed.page, PageRequest::Offset { page: 3, offset: 4 });

        let parsed = run(PaginationMode::Both, "page=2&cursor=abc").unwrap();
        assert_eq!(parsed.mode(), PaginationMode::Offset);
    }

    #[test]
    fn test_both_mode_cursor_token_is_kept() {
        let parsed = run(PaginationMode::Both, "cursor=eyJpZCI6Mn0").unwrap();
        assert_eq!(parsed.cursor_token(), Some("eyJpZCI6Mn0"));
    }

    #[test]
    fn test_offset_policy_rejects_cursor() {
        let err = run(PaginationMode::Offset, "cursor=abc").unwrap_err();
        assert_eq!(err.kind, QueryErrorKind::PaginationModeNotAllowed);
        assert_eq!(err.parameter.as_deref(), Some("cursor"));

        let parsed = run(PaginationMode::Offset, "").unwrap();
        assert_eq!(parsed.page, PageRequest::Offset { page: 1, offset: 0 });
    }

    #[test]
    fn test_cursor_policy_rejects_page() {
        let err = run(PaginationMode::Cursor, "page=1").unwrap_err();
        assert_eq!(err.kind, QueryErrorKind::PaginationModeNotAllowed);
        assert_eq!(err.parameter.as_deref(), Some("page"));
    }

    #[test]
    fn test_page_defaults_to_one() {
        for query in ["page=abc", "page=0", "page=-3"] {
            let parsed = run(PaginationMode::Offset, query).unwrap();
            assert_eq!(parsed.page, PageRequest::Offset { page: 1, offset: 0 }, "{query}");
        }
    }

    #[test]
    fn test_limit_bounds() {
        assert_eq!(run(PaginationMode::Offset, "limit=10").unwrap().limit, 10);
        assert_eq!(run(PaginationMode::Offset, "limit=1").unwrap().limit, 1);

        let err = run(PaginationMode::Offset, "limit=11").unwrap_err();
        assert_eq!(err.kind, QueryErrorKind::LimitExceeded);
        assert!(err.message.contains("maximum allowed limit of 10"));

        for bad in ["limit=0", "limit=-5", "limit=ten", "limit=2.5"] {
            let err = run(PaginationMode::Offset, bad).unwrap_err();
            assert_eq!(err.kind, QueryErrorKind::InvalidLimit, "{bad}");
        }
    }

    #[test]
    fn test_limit_ignored_when_not_customizable() {
        let policy = Arc::new(
            PaginationPolicy::builder()
                .mode(PaginationMode::Offset)
                .default_limit(5)
                .allow_custom_limit(false)
                .build()
                .unwrap(),
        );
        let params = RawParams::from_query_str("limit=999").unwrap();
        let parsed = parse(&policy, &fields(), &params).unwrap();
        assert_eq!(parsed.limit, 5);
    }

    #[test]
    fn test_offset_is_page_minus_one_times_limit() {
        let parsed = run(PaginationMode::Offset, "page=4&limit=5").unwrap();
        assert_eq!(parsed.page, PageRequest::Offset { page: 4, offset: 15 });
    }

    #[test]
    fn test_filters_are_typed_and_defaulted() {
        let parsed = run(PaginationMode::Offset, "idGt=5&titleLike=rust").unwrap();
        let summary: Vec<(&str, FilterOperator, &Value)> = parsed
            .filters
            .iter()
            .map(|f| (f.column.name(), f.operator, &f.value))
            .collect();

        assert_eq!(
            summary,
            [
                ("id", FilterOperator::Gt, &Value::Integer(5)),
                ("title", FilterOperator::Like, &Value::String("rust".into())),
                ("status", FilterOperator::Eq, &Value::String("live".into())),
            ]
        );
        assert_eq!(parsed.filters[0].field, "id");
    }

    #[test]
    fn test_empty_filter_value_is_omitted() {
        let parsed = run(PaginationMode::Offset, "title=&status=").unwrap();
        assert!(parsed.filters.is_empty());
    }

    #[test]
    fn test_untypable_filter_value_rejected() {
        let err = run(PaginationMode::Offset, "id=abc").unwrap_err();
        assert_eq!(err.kind, QueryErrorKind::InvalidValue);
        assert_eq!(err.parameter.as_deref(), Some("id"));
        assert!(err.message.contains("expected an integer"));
    }

    #[test]
    fn test_repeated_filter_rejected() {
        let err = run(PaginationMode::Offset, "title=a&title=b").unwrap_err();
        assert_eq!(err.kind, QueryErrorKind::DuplicateParameter);
    }

    #[test]
    fn test_default_sort_without_sort_params() {
        let parsed = run(PaginationMode::Offset, "").unwrap();
        assert_eq!(parsed.sorting.len(), 1);
        assert_eq!(parsed.sorting[0].column.name(), "created_at");
        assert_eq!(parsed.sorting[0].order, SortOrder::Desc);
        assert!(parsed.sorting[0].field.is_empty());
    }

    #[test]
    fn test_custom_sort_with_parallel_orders() {
        let parsed = run(PaginationMode::Offset, "sortBy=date,title&sortOrder=desc").unwrap();
        let sorting: Vec<(&str, &str, SortOrder)> = parsed
            .sorting
            .iter()
            .map(|s| (s.column.name(), s.field.as_str(), s.order))
            .collect();
        assert_eq!(
            sorting,
            [
                ("created_at", "createdAt", SortOrder::Desc),
                ("title", "title", SortOrder::Asc),
            ]
        );
    }

    #[test]
    fn test_repeated_sort_params_concatenate() {
        let parsed =
            run(PaginationMode::Offset, "sortBy=title&sortBy=id&sortOrder=ASC&sortOrder=Desc")
                .unwrap();
        assert_eq!(parsed.sorting[0].field, "title");
        assert_eq!(parsed.sorting[1].field, "id");
        assert_eq!(parsed.sorting[1].order, SortOrder::Desc);
    }

    #[test]
    fn test_blank_sort_segments_fall_back_to_default() {
        let parsed = run(PaginationMode::Offset, "sortBy=,").unwrap();
        assert_eq!(parsed.sorting[0].column.name(), "created_at");
    }

    #[test]
    fn test_unknown_sort_alias_lists_alternatives() {
        let err = run(PaginationMode::Offset, "sortBy=createdAt").unwrap_err();
        assert_eq!(err.kind, QueryErrorKind::UnknownSortField);
        assert_eq!(
            err.message,
            "Invalid sort field 'createdAt'. Available fields: id, title, date"
        );
    }

    #[test]
    fn test_invalid_sort_order_rejected() {
        let err = run(PaginationMode::Offset, "sortBy=id&sortOrder=sideways").unwrap_err();
        assert_eq!(err.kind, QueryErrorKind::InvalidSortOrder);
        assert_eq!(err.parameter.as_deref(), Some("sortOrder"));
    }

    #[test]
    fn test_multiple_sort_rejected_when_disabled() {
        let policy = Arc::new(
            PaginationPolicy::builder()
                .mode(PaginationMode::Offset)
                .allow_multiple_sort(false)
                .build()
                .unwrap(),
        );
        let params = RawParams::from_query_str("sortBy=id,title").unwrap();
        let err = parse(&policy, &fields(), &params).unwrap_err();

        assert_eq!(err.kind, QueryErrorKind::MultipleSortNotAllowed);
        assert!(err.message.contains("Received 2 fields: id, title"));

        let params = RawParams::from_query_str("sortBy=id").unwrap();
        assert!(parse(&policy, &fields(), &params).is_ok());
    }

    #[test]
    fn test_custom_sort_ignored_when_disabled() {
        let policy = Arc::new(
            PaginationPolicy::builder()
                .mode(PaginationMode::Offset)
                .allow_custom_sort(false)
                .default_sort(SortSpec::asc(Column::new("id")))
                .build()
                .unwrap(),
        );
        let params = RawParams::from_query_str("sortBy=nonsense&sortOrder=bogus").unwrap();
        let parsed = parse(&policy, &fields(), &params).unwrap();
        assert_eq!(parsed.sorting[0].column.name(), "id");
    }

    #[test]
    fn test_renamed_parameters() {
        let params_names = ParamNames {
            page: "p".to_string(),
            limit: "size".to_string(),
            ..ParamNames::default()
        };
        let policy = Arc::new(
            PaginationPolicy::builder()
                .mode(PaginationMode::Offset)
                .param_names(params_names)
                .build()
                .unwrap(),
        );
        let params = RawParams::from_query_str("p=3&size=4").unwrap();
        let parsed = parse(&policy, &fields(), &params).unwrap();
        assert_eq!(parsed.page, PageRequest::Offset { page: 3, offset: 8 });
    }
}
