//! Error types for the OSCAR client.
//!
//! `OscarError` covers transport, parsing and report-summarization
//! failures. Misses on optional fields and numeric tokens that do not
//! parse are not errors; they surface as `None` or as text values.

use thiserror::Error;

/// Main error type for the OSCAR client library.
#[derive(Debug, Error)]
pub enum OscarError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("Request to {url} failed with status {status}")]
    Status { status: u16, url: String },

    /// URL could not be assembled.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// XML parsing failed.
    #[error("XML parsing failed: {0}")]
    XmlParse(#[from] roxmltree::Error),

    /// JSON decoding failed.
    #[error("JSON decoding failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Path expression could not be parsed.
    #[error("Invalid XPath expression '{expression}': {reason}")]
    InvalidXPath { expression: String, reason: String },

    /// Path expression uses a prefix outside the bound namespace table.
    #[error("Unknown namespace prefix: '{0}'")]
    UnknownNamespacePrefix(String),

    /// A field the summary cannot do without is missing or unusable.
    #[error("Missing required element: {element} in {context}")]
    MalformedInput { element: String, context: String },

    /// Facility type code that is not in the lookup table.
    #[error("Unknown facility type code: '{0}'")]
    UnknownFacilityType(String),

    /// No station matches the requested WIGOS identifier.
    #[error("Station {0} not found")]
    StationNotFound(String),

    /// Invalid date format.
    #[error("Invalid date format: '{0}'. Expected YYYY-MM-DD (e.g., 2024-01-01)")]
    InvalidDate(String),

    /// A command precondition was not met.
    #[error("{0}")]
    MissingArgument(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OscarError {
    /// Shorthand for [`OscarError::MalformedInput`].
    pub(crate) fn malformed(element: impl Into<String>, context: impl Into<String>) -> Self {
        Self::MalformedInput {
            element: element.into(),
            context: context.into(),
        }
    }
}

/// Result type alias for OSCAR client operations.
pub type Result<T> = std::result::Result<T, OscarError>;
