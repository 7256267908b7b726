//! Conversion of text tokens into their most specific native value.

use std::fmt;

use serde::Serialize;

/// A token read from a text-based format, typed as narrowly as it parses.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TypedValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl TypedValue {
    /// Numeric view of the value; `None` for text.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Coerce a token into an integer, a float, or leave it as text.
///
/// Tokens containing a `.` are tried as floats. Multi-character tokens
/// with a leading `0` are codes and stay text. Everything else is tried
/// as an integer. Any failed parse returns the original text.
///
/// # Examples
/// ```
/// use oscar_client::coerce::{coerce, TypedValue};
///
/// assert_eq!(coerce("1"), TypedValue::Integer(1));
/// assert_eq!(coerce("1.2"), TypedValue::Float(1.2));
/// assert_eq!(coerce("007"), TypedValue::Text("007".to_string()));
/// ```
#[must_use]
pub fn coerce(text: &str) -> TypedValue {
    let parsed = if text.contains('.') {
        text.parse::<f64>().ok().map(TypedValue::Float)
    } else if text.len() > 1 && text.starts_with('0') {
        None
    } else {
        text.parse::<i64>().ok().map(TypedValue::Integer)
    };

    parsed.unwrap_or_else(|| TypedValue::Text(text.to_string()))
}
