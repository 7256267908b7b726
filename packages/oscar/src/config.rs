//! Configuration constants, environments and validation functions.

use std::fmt;
use std::sync::LazyLock;

use clap::ValueEnum;
use regex::Regex;

use crate::error::{OscarError, Result};

/// HTTP timeout in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Header carrying the OSCAR machine-to-machine API token (`X-WMO-WMDR-Token`).
pub const TOKEN_HEADER: &str = "x-wmo-wmdr-token";

/// OAI-PMH metadata prefix for WMDR records.
pub const METADATA_PREFIX: &str = "wmdr";

/// Date pattern: YYYY-MM-DD.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid regex"));

/// OSCAR/Surface deployment to talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Environment {
    /// Pre-production deployment.
    #[default]
    Depl,
    /// Production deployment.
    Prod,
}

impl Environment {
    /// Base URL of the REST API.
    #[must_use]
    pub fn api_url(&self) -> &'static str {
        match self {
            Self::Depl => "https://oscardepl.wmo.int/surface/rest/api",
            Self::Prod => "https://oscar.wmo.int/surface/rest/api",
        }
    }

    /// URL of the OAI-PMH provider.
    #[must_use]
    pub fn harvest_url(&self) -> &'static str {
        match self {
            Self::Depl => "https://oscardepl.wmo.int/oai/provider",
            Self::Prod => "https://oscar.wmo.int/oai/provider",
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Depl => "depl",
            Self::Prod => "prod",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings for an [`OscarClient`](crate::client::OscarClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub environment: Environment,
    pub api_token: Option<String>,
    pub timeout_secs: u64,
    pub api_url: String,
    pub harvest_url: String,
}

impl ClientConfig {
    /// Start a builder for the given environment.
    #[must_use]
    pub fn builder(environment: Environment) -> ClientConfigBuilder {
        ClientConfigBuilder {
            environment,
            api_token: None,
            timeout_secs: HTTP_TIMEOUT_SECS,
            api_url: None,
            harvest_url: None,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::builder(Environment::default()).build()
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    environment: Environment,
    api_token: Option<String>,
    timeout_secs: u64,
    api_url: Option<String>,
    harvest_url: Option<String>,
}

impl ClientConfigBuilder {
    /// Token sent in the [`TOKEN_HEADER`] header.
    #[must_use]
    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Override the environment's REST API base URL.
    #[must_use]
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Override the environment's OAI-PMH provider URL.
    #[must_use]
    pub fn harvest_url(mut self, url: impl Into<String>) -> Self {
        self.harvest_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn build(self) -> ClientConfig {
        ClientConfig {
            environment: self.environment,
            api_token: self.api_token,
            timeout_secs: self.timeout_secs,
            api_url: self
                .api_url
                .unwrap_or_else(|| self.environment.api_url().to_string()),
            harvest_url: self
                .harvest_url
                .unwrap_or_else(|| self.environment.harvest_url().to_string()),
        }
    }
}

/// Validate and parse a date (YYYY-MM-DD).
///
/// # Examples
/// ```
/// use oscar_client::config::validate_date;
///
/// assert!(validate_date("2024-01-01").is_ok());
/// assert!(validate_date("invalid").is_err());
/// assert!(validate_date("2024-13-01").is_err()); // Invalid month
/// ```
pub fn validate_date(date_str: &str) -> Result<chrono::NaiveDate> {
    if !DATE_PATTERN.is_match(date_str) {
        return Err(OscarError::InvalidDate(date_str.to_string()));
    }

    chrono::NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .map_err(|_| OscarError::InvalidDate(date_str.to_string()))
}

/// Make a record identifier safe to use as a file name.
///
/// Keeps alphanumerics and `-_.~`; `:` and `/` become `_`, anything else is dropped.
///
/// # Examples
/// ```
/// use oscar_client::config::sanitize_file_name;
///
/// assert_eq!(sanitize_file_name("0-20000-0-71758"), "0-20000-0-71758");
/// assert_eq!(sanitize_file_name("oai:wmo.int/0-1-2-3"), "oai_wmo.int_0-1-2-3");
/// assert_eq!(sanitize_file_name("../x"), ".._x");
/// ```
pub fn sanitize_file_name(identifier: &str) -> String {
    identifier
        .chars()
        .filter_map(|c| match c {
            ':' | '/' | '\\' => Some('_'),
            c if c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '~') => Some(c),
            _ => None,
        })
        .collect()
}
