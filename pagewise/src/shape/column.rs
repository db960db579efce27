use std::fmt;
use std::sync::Arc;

/// Handle to a queryable column or computed expression
///
/// The engine only reads the registered name. Stores decide what the name
/// (or the optional SQL expression) means when rendering predicates and
/// order terms. Cloning is cheap.
///
/// # Example
///
/// ```rust
/// use pagewise::shape::Column;
///
/// let id = Column::new("id");
/// let lowered = Column::expression("title_lower", "lower(t.title)");
/// let created = Column::new("created_at").with_sql_type("timestamptz");
///
/// assert_eq!(id.name(), "id");
/// assert_eq!(lowered.sql_expression(), Some("lower(t.title)"));
/// assert_eq!(created.sql_type(), Some("timestamptz"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Column {
    name: Arc<str>,
    expression: Option<Arc<str>>,
    sql_type: Option<Arc<str>>,
}

impl Column {
    /// Reference a plain column by name
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            expression: None,
            sql_type: None,
        }
    }

    /// Reference a computed expression registered under `name`
    ///
    /// The expression is trusted developer input and is spliced verbatim
    /// by SQL-backed stores.
    pub fn expression(name: impl Into<Arc<str>>, sql: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            expression: Some(sql.into()),
            sql_type: None,
        }
    }

    /// Declare the column's SQL type
    ///
    /// SQL-backed stores cast bound comparison values to it, so text
    /// operands from query strings and cursors compare against
    /// `timestamptz`, `uuid` or `numeric` columns. Trusted developer input.
    #[must_use]
    pub fn with_sql_type(mut self, ty: impl Into<Arc<str>>) -> Self {
        self.sql_type = Some(ty.into());
        self
    }

    /// Name the column was registered under
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// SQL expression, for computed columns
    #[must_use]
    pub fn sql_expression(&self) -> Option<&str> {
        self.expression.as_deref()
    }

    /// Declared SQL type, if any
    #[must_use]
    pub fn sql_type(&self) -> Option<&str> {
        self.sql_type.as_deref()
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl From<&str> for Column {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}
