//! Backing-store errors

use std::fmt;

use axum::http::StatusCode;

/// Category of store error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreErrorKind {
    /// Could not reach the store
    ConnectionFailed,
    /// Connection pool exhausted or timed out
    PoolExhausted,
    /// Store misconfigured
    Configuration,
    /// Query rejected or failed
    QueryFailed,
    /// A row or value could not be converted
    TypeConversion,
    /// Operation timed out
    Timeout,
    /// Anything else
    Other,
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionFailed => write!(f, "connection_failed"),
            Self::PoolExhausted => write!(f, "pool_exhausted"),
            Self::Configuration => write!(f, "configuration"),
            Self::QueryFailed => write!(f, "query_failed"),
            Self::TypeConversion => write!(f, "type_conversion"),
            Self::Timeout => write!(f, "timeout"),
            Self::Other => write!(f, "other"),
        }
    }
}

impl StoreErrorKind {
    /// HTTP status when this error reaches a client
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::ConnectionFailed | Self::PoolExhausted => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show clients
    #[must_use]
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::Timeout => "Data store operation timed out",
            Self::ConnectionFailed | Self::PoolExhausted => "Data store temporarily unavailable",
            _ => "Data store operation failed",
        }
    }
}

/// Failure reported by a [`TableQuery`](super::TableQuery) implementation
///
/// Propagated to the caller unchanged; the engine never retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    /// Category
    pub kind: StoreErrorKind,
    /// Human-readable message (may contain internals; not sent to clients)
    pub message: String,
    /// Additional context such as the table name
    pub context: Option<String>,
}

impl StoreError {
    /// Create a store error
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: None,
        }
    }

    /// Create a query failed error
    pub fn query_failed(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::QueryFailed, message)
    }

    /// Create a type conversion error
    pub fn type_conversion(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::TypeConversion, message)
    }

    /// Add context to an existing error
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Whether a retry by the caller might succeed
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(
            self.kind,
            StoreErrorKind::ConnectionFailed | StoreErrorKind::PoolExhausted | StoreErrorKind::Timeout
        )
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Store {} error: {}", self.kind, self.message)?;
        if let Some(ref ctx) = self.context {
            write!(f, " [context: {ctx}]")?;
        }
        Ok(())
    }
}

impl std::error::Error for StoreError {}

#[cfg(feature = "database")]
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        use sqlx::Error as E;
        match err {
            E::PoolTimedOut => Self::new(StoreErrorKind::PoolExhausted, "Connection pool timed out"),
            E::PoolClosed => Self::new(StoreErrorKind::ConnectionFailed, "Connection pool is closed"),
            E::Configuration(e) => Self::new(StoreErrorKind::Configuration, e.to_string()),
            E::Io(e) => Self::new(StoreErrorKind::ConnectionFailed, e.to_string()),
            E::Tls(e) => Self::new(StoreErrorKind::ConnectionFailed, format!("TLS error: {e}")),
            E::ColumnDecode { index, source } => Self::type_conversion(format!(
                "Failed to decode column {index}: {source}"
            )),
            E::Decode(e) => Self::type_conversion(e.to_string()),
            E::TypeNotFound { type_name } => {
                Self::type_conversion(format!("Type not found: {type_name}"))
            }
            E::ColumnNotFound(col) => Self::query_failed(format!("Column not found: {col}")),
            E::Protocol(msg) => Self::query_failed(msg),
            E::Database(db_err) => {
                // 57014: query_canceled, raised by statement_timeout
                if db_err.code().as_deref() == Some("57014") {
                    Self::new(StoreErrorKind::Timeout, db_err.to_string())
                } else {
                    Self::query_failed(db_err.to_string())
                }
            }
            E::WorkerCrashed => Self::new(StoreErrorKind::ConnectionFailed, "Database worker crashed"),
            _ => Self::new(StoreErrorKind::Other, err.to_string()),
        }
    }
}
