//! Scalar values carried by filters, cursors, and rows
//!
//! Every value that crosses the engine (a typed filter argument, a sort-key
//! value lifted out of a row, an entry in a decoded cursor) is a [`Value`].
//! Values serialize as plain JSON scalars, which is also their cursor wire
//! representation.
//!
//! # Example
//!
//! ```rust
//! use pagewise::Value;
//!
//! let text: Value = "active".into();
//! let number: Value = 42_i64.into();
//! let flag: Value = true.into();
//!
//! assert_eq!(text.to_string(), "active");
//! assert_eq!(number.to_string(), "42");
//! assert_eq!(flag.to_string(), "true");
//! ```

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A scalar value
///
/// Deserialization accepts JSON `null`, booleans, numbers and strings only,
/// so a cursor payload containing arrays or objects is rejected as malformed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Value {
    /// SQL `NULL` / JSON `null`
    #[default]
    Null,
    /// Boolean value
    Boolean(bool),
    /// 64-bit integer value
    Integer(i64),
    /// 64-bit floating point value
    Float(f64),
    /// String value
    String(String),
}

impl Value {
    /// Convert a JSON value into a scalar
    ///
    /// Returns `None` for arrays and objects, and for numbers that fit
    /// neither `i64` nor `f64`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pagewise::Value;
    /// use serde_json::json;
    ///
    /// assert_eq!(Value::from_json(&json!(7)), Some(Value::Integer(7)));
    /// assert_eq!(Value::from_json(&json!([1, 2])), None);
    /// ```
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => Some(Self::Null),
            serde_json::Value::Bool(b) => Some(Self::Boolean(*b)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Integer)
                .or_else(|| n.as_f64().map(Self::Float)),
            serde_json::Value::String(s) => Some(Self::String(s.clone())),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
        }
    }

    /// Check whether this is [`Value::Null`]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check whether this is an empty string
    #[must_use]
    pub fn is_empty_string(&self) -> bool {
        matches!(self, Self::String(s) if s.is_empty())
    }

    /// Name of the variant, used in error messages
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
        }
    }

    /// Compare two values the way a SQL engine would
    ///
    /// Integers and floats compare numerically with each other. Values of
    /// unrelated types, and anything compared with `NULL`, are incomparable
    /// and yield `None`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::cmp::Ordering;
    /// use pagewise::Value;
    ///
    /// assert_eq!(Value::Integer(2).compare(&Value::Float(2.5)), Some(Ordering::Less));
    /// assert_eq!(Value::Null.compare(&Value::Null), None);
    /// ```
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            #[allow(clippy::cast_precision_loss)]
            (Self::Integer(a), Self::Float(b)) => (*a as f64).partial_cmp(b),
            #[allow(clippy::cast_precision_loss)]
            (Self::Float(a), Self::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            (Self::Boolean(a), Self::Boolean(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
