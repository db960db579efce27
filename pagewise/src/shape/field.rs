//! Per-field filter and sort declarations
//!
//! # Example
//!
//! ```rust
//! use pagewise::shape::{Column, FieldSpec, FilterOperator, FilterSpec, ValueKind};
//!
//! let id = FieldSpec::new("id", Column::new("id"))
//!     .kind(ValueKind::Integer)
//!     .filters([FilterOperator::Eq, FilterOperator::Gt, FilterOperator::Lt])
//!     .sortable();
//!
//! let title = FieldSpec::new("title", Column::new("title"))
//!     .filter(FilterOperator::Eq)
//!     .filter_as(FilterOperator::Like, "q")
//!     .sortable_as("name");
//!
//! let status = FieldSpec::new("status", Column::new("status"))
//!     .filter_spec(FilterSpec::new(FilterOperator::Eq, "status").with_default("published"));
//!
//! let aliases: Vec<&str> = id.filter_specs().iter().map(|f| f.alias()).collect();
//! assert_eq!(aliases, ["id", "idGt", "idLt"]);
//! assert_eq!(title.sort_alias(), "name");
//! assert!(!status.is_sortable());
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{Column, ShapeError};
use crate::value::Value;

/// Comparison applied by a filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    /// Equal to (=)
    Eq,
    /// Greater than (>)
    Gt,
    /// Less than (<)
    Lt,
    /// Greater than or equal to (>=)
    Gte,
    /// Less than or equal to (<=)
    Lte,
    /// Case-insensitive containment
    Like,
}

impl FilterOperator {
    /// Suffix appended to the field name to derive a public alias
    ///
    /// ```rust
    /// use pagewise::shape::FilterOperator;
    ///
    /// assert_eq!(FilterOperator::Eq.alias_suffix(), "");
    /// assert_eq!(FilterOperator::Gte.alias_suffix(), "Gte");
    /// ```
    #[must_use]
    pub const fn alias_suffix(&self) -> &'static str {
        match self {
            Self::Eq => "",
            Self::Gt => "Gt",
            Self::Lt => "Lt",
            Self::Gte => "Gte",
            Self::Lte => "Lte",
            Self::Like => "Like",
        }
    }

    /// Alias derived for a field named `field`
    #[must_use]
    pub fn derive_alias(&self, field: &str) -> String {
        format!("{field}{}", self.alias_suffix())
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq => write!(f, "eq"),
            Self::Gt => write!(f, "gt"),
            Self::Lt => write!(f, "lt"),
            Self::Gte => write!(f, "gte"),
            Self::Lte => write!(f, "lte"),
            Self::Like => write!(f, "like"),
        }
    }
}

impl FromStr for FilterOperator {
    type Err = ShapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eq" | "equal" => Ok(Self::Eq),
            "gt" => Ok(Self::Gt),
            "lt" => Ok(Self::Lt),
            "gte" => Ok(Self::Gte),
            "lte" => Ok(Self::Lte),
            "like" => Ok(Self::Like),
            _ => Err(ShapeError::UnknownOperator(s.to_string())),
        }
    }
}

/// How raw filter strings are typed before reaching the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// Passed through as a string
    #[default]
    Text,
    /// Signed 64-bit integer
    Integer,
    /// 64-bit float
    Float,
    /// `true`/`false` (also `1`/`0`)
    Boolean,
}

impl ValueKind {
    /// Convert a raw query-string value, or `None` if it does not fit this kind
    ///
    /// ```rust
    /// use pagewise::{shape::ValueKind, Value};
    ///
    /// assert_eq!(ValueKind::Integer.parse(" 42 "), Some(Value::Integer(42)));
    /// assert_eq!(ValueKind::Integer.parse("4.2"), None);
    /// assert_eq!(ValueKind::Boolean.parse("TRUE"), Some(Value::Boolean(true)));
    /// ```
    #[must_use]
    pub fn parse(&self, raw: &str) -> Option<Value> {
        match self {
            Self::Text => Some(Value::String(raw.to_string())),
            Self::Integer => raw.trim().parse::<i64>().ok().map(Value::Integer),
            Self::Float => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(Value::Float),
            Self::Boolean => {
                let raw = raw.trim();
                if raw.eq_ignore_ascii_case("true") || raw == "1" {
                    Some(Value::Boolean(true))
                } else if raw.eq_ignore_ascii_case("false") || raw == "0" {
                    Some(Value::Boolean(false))
                } else {
                    None
                }
            }
        }
    }

    /// Human-readable description used in validation messages
    #[must_use]
    pub const fn expected(&self) -> &'static str {
        match self {
            Self::Text => "a string",
            Self::Integer => "an integer",
            Self::Float => "a number",
            Self::Boolean => "true or false",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Integer => write!(f, "integer"),
            Self::Float => write!(f, "float"),
            Self::Boolean => write!(f, "boolean"),
        }
    }
}

/// One filter a field accepts, under one public alias
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    operator: FilterOperator,
    alias: String,
    default: Option<Value>,
}

impl FilterSpec {
    /// Declare a filter under an explicit alias
    pub fn new(operator: FilterOperator, alias: impl Into<String>) -> Self {
        Self {
            operator,
            alias: alias.into(),
            default: None,
        }
    }

    /// Value applied when the client omits the parameter
    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Filter operator
    #[must_use]
    pub const fn operator(&self) -> FilterOperator {
        self.operator
    }

    /// Query parameter clients use
    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Fallback value
    #[must_use]
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// Declaration of one filterable and/or sortable field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    name: String,
    column: Column,
    filters: Vec<FilterSpec>,
    sortable: bool,
    sort_alias: String,
    kind: ValueKind,
}

impl FieldSpec {
    /// Declare a field bound to `column`
    ///
    /// The field starts with no filters, unsortable, typed as text.
    pub fn new(name: impl Into<String>, column: impl Into<Column>) -> Self {
        let name = name.into();
        Self {
            sort_alias: name.clone(),
            name,
            column: column.into(),
            filters: Vec::new(),
            sortable: false,
            kind: ValueKind::default(),
        }
    }

    /// Accept a filter under the derived alias
    #[must_use]
    pub fn filter(self, operator: FilterOperator) -> Self {
        let alias = operator.derive_alias(&self.name);
        self.filter_spec(FilterSpec::new(operator, alias))
    }

    /// Accept a filter under an explicit alias
    #[must_use]
    pub fn filter_as(self, operator: FilterOperator, alias: impl Into<String>) -> Self {
        self.filter_spec(FilterSpec::new(operator, alias))
    }

    /// Accept several filters, each under its derived alias
    #[must_use]
    pub fn filters(self, operators: impl IntoIterator<Item = FilterOperator>) -> Self {
        operators.into_iter().fold(self, Self::filter)
    }

    /// Accept a fully specified filter
    #[must_use]
    pub fn filter_spec(mut self, spec: FilterSpec) -> Self {
        self.filters.push(spec);
        self
    }

    /// Allow sorting under the field name
    #[must_use]
    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    /// Allow sorting under a custom alias
    #[must_use]
    pub fn sortable_as(mut self, alias: impl Into<String>) -> Self {
        self.sortable = true;
        self.sort_alias = alias.into();
        self
    }

    /// Set how raw filter values are typed
    #[must_use]
    pub fn kind(mut self, kind: ValueKind) -> Self {
        self.kind = kind;
        self
    }

    /// Field name; also the key rows expose this field under
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bound column
    #[must_use]
    pub fn column(&self) -> &Column {
        &self.column
    }

    /// Declared filters
    #[must_use]
    pub fn filter_specs(&self) -> &[FilterSpec] {
        &self.filters
    }

    /// Whether clients may sort by this field
    #[must_use]
    pub const fn is_sortable(&self) -> bool {
        self.sortable
    }

    /// Public sort key
    #[must_use]
    pub fn sort_alias(&self) -> &str {
        &self.sort_alias
    }

    /// Value kind for filter parsing
    #[must_use]
    pub const fn value_kind(&self) -> ValueKind {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_aliases() {
        let field = FieldSpec::new("price", Column::new("price")).filters([
            FilterOperator::Eq,
            FilterOperator::Gt,
            FilterOperator::Gte,
            FilterOperator::Lt,
            FilterOperator::Lte,
            FilterOperator::Like,
        ]);

        let aliases: Vec<&str> = field.filter_specs().iter().map(FilterSpec::alias).collect();
        assert_eq!(
            aliases,
            ["price", "priceGt", "priceGte", "priceLt", "priceLte", "priceLike"]
        );
    }

    #[test]
    fn test_explicit_alias_and_default() {
        let field = FieldSpec::new("title", Column::new("title")).filter_spec(
            FilterSpec::new(FilterOperator::Like, "search").with_default("rust"),
        );

        let spec = &field.filter_specs()[0];
        assert_eq!(spec.alias(), "search");
        assert_eq!(spec.operator(), FilterOperator::Like);
        assert_eq!(spec.default_value(), Some(&Value::String("rust".into())));
    }

    #[test]
    fn test_sortable_defaults_alias_to_name() {
        let field = FieldSpec::new("createdAt", Column::new("created_at")).sortable();
        assert!(field.is_sortable());
        assert_eq!(field.sort_alias(), "createdAt");
        assert_eq!(field.column().name(), "created_at");

        let field = FieldSpec::new("createdAt", Column::new("created_at")).sortable_as("date");
        assert_eq!(field.sort_alias(), "date");
    }

    #[test]
    fn test_operator_from_str() {
        assert_eq!("eq".parse::<FilterOperator>().unwrap(), FilterOperator::Eq);
        assert_eq!("equal".parse::<FilterOperator>().unwrap(), FilterOperator::Eq);
        assert_eq!("GTE".parse::<FilterOperator>().unwrap(), FilterOperator::Gte);
        assert_eq!("like".parse::<FilterOperator>().unwrap(), FilterOperator::Like);
        assert_eq!(
            "between".parse::<FilterOperator>().unwrap_err(),
            ShapeError::UnknownOperator("between".to_string())
        );
    }

    #[test]
    fn test_value_kind_parse() {
        assert_eq!(ValueKind::Text.parse(" a "), Some(Value::String(" a ".into())));
        assert_eq!(ValueKind::Integer.parse("-7"), Some(Value::Integer(-7)));
        assert_eq!(ValueKind::Integer.parse("seven"), None);
        assert_eq!(ValueKind::Float.parse("2.5"), Some(Value::Float(2.5)));
        assert_eq!(ValueKind::Float.parse("NaN"), None);
        assert_eq!(ValueKind::Boolean.parse("0"), Some(Value::Boolean(false)));
        assert_eq!(ValueKind::Boolean.parse("yes"), None);
    }
}
