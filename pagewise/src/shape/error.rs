//! Registration-time errors for query shapes

use thiserror::Error;

use super::PaginationMode;

/// A query shape or pagination policy was declared with violated invariants
///
/// These errors surface while building shapes at startup and are never
/// produced by request handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    /// `max_limit` must be positive
    #[error("max_limit must be greater than 0")]
    NonPositiveMaxLimit,

    /// `default_limit` must be positive
    #[error("default_limit must be greater than 0")]
    NonPositiveDefaultLimit,

    /// `default_limit` larger than `max_limit`
    #[error("default_limit ({default_limit}) cannot exceed max_limit ({max_limit})")]
    DefaultLimitExceedsMax {
        /// Declared default limit
        default_limit: u32,
        /// Declared maximum limit
        max_limit: u32,
    },

    /// Cursor-capable policy without a cursor key column
    #[error("pagination mode '{0}' requires a cursor key column")]
    MissingCursorKey(PaginationMode),

    /// A pagination parameter name was configured empty
    #[error("pagination parameter names cannot be empty")]
    EmptyParameterName,

    /// Two pagination parameters configured with the same name
    #[error("pagination parameter name '{0}' is used more than once")]
    DuplicateParameterName(String),

    /// Unknown filter operator name
    #[error("unknown filter operator '{0}' (expected eq, like, gt, gte, lt or lte)")]
    UnknownOperator(String),

    /// Two fields declared with the same name in one shape
    #[error("field '{0}' is declared more than once")]
    DuplicateField(String),

    /// Two sortable fields expose the same sort alias
    #[error("sort alias '{alias}' is used by both '{first}' and '{second}'")]
    DuplicateSortAlias {
        /// Colliding alias
        alias: String,
        /// First field using the alias
        first: String,
        /// Second field using the alias
        second: String,
    },

    /// One field declares the same filter alias twice
    #[error("filter alias '{alias}' is declared twice on field '{field}'")]
    DuplicateFilterAlias {
        /// Field declaring the alias
        field: String,
        /// Colliding alias
        alias: String,
    },

    /// Two fields expose the same filter alias
    #[error("filter alias '{alias}' is used by both '{first}' and '{second}'")]
    FilterAliasConflict {
        /// Colliding alias
        alias: String,
        /// First field using the alias
        first: String,
        /// Second field using the alias
        second: String,
    },

    /// A filter alias shadows a pagination parameter
    #[error("filter alias '{alias}' on field '{field}' collides with a pagination parameter")]
    ReservedParameter {
        /// Field declaring the alias
        field: String,
        /// Reserved alias
        alias: String,
    },

    /// Two shapes registered under one identifier
    #[error("query shape '{0}' is registered more than once")]
    DuplicateShape(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_error_messages_name_the_problem() {
        let err = ShapeError::DefaultLimitExceedsMax {
            default_limit: 50,
            max_limit: 20,
        };
        assert_eq!(
            err.to_string(),
            "default_limit (50) cannot exceed max_limit (20)"
        );

        let err = ShapeError::MissingCursorKey(PaginationMode::Cursor);
        assert_eq!(
            err.to_string(),
            "pagination mode 'cursor' requires a cursor key column"
        );

        let err = ShapeError::ReservedParameter {
            field: "title".to_string(),
            alias: "page".to_string(),
        };
        assert!(err.to_string().contains("'page'"));
    }
}
