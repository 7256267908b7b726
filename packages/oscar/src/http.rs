//! HTTP client wrapper for the OSCAR REST API and OAI-PMH provider.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::config::{ClientConfig, TOKEN_HEADER};
use crate::error::{OscarError, Result};

/// User agent string identifying this client.
const USER_AGENT: &str = concat!("oscar-client/", env!("CARGO_PKG_VERSION"));

/// Create a configured HTTP client.
///
/// The API token, when configured, is attached to every request.
pub fn create_client(config: &ClientConfig) -> Result<Client> {
    let mut headers = HeaderMap::new();
    if let Some(token) = &config.api_token {
        let mut value = HeaderValue::from_str(token)
            .map_err(|_| OscarError::MissingArgument("API token contains invalid characters".to_string()))?;
        value.set_sensitive(true);
        headers.insert(HeaderName::from_static(TOKEN_HEADER), value);
    }

    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .build()?;
    Ok(client)
}

/// Build `base/segments...` with the given query parameters.
///
/// # Examples
/// ```
/// use oscar_client::http::build_url;
///
/// let url = build_url("https://example.org/api", &["search", "station"], &[("wigosId", "0-1-2-3")]).unwrap();
/// assert_eq!(url.as_str(), "https://example.org/api/search/station?wigosId=0-1-2-3");
/// ```
pub fn build_url(base: &str, segments: &[&str], params: &[(&str, &str)]) -> Result<Url> {
    let mut url = Url::parse(base.trim_end_matches('/'))?;
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|()| OscarError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?;
        path.pop_if_empty();
        path.extend(segments);
    }
    if !params.is_empty() {
        url.query_pairs_mut().extend_pairs(params);
    }
    Ok(url)
}

/// Send a request, logging the URL and status.
pub fn send(request: RequestBuilder) -> Result<Response> {
    let response = request.send()?;
    tracing::debug!(url = %response.url(), status = %response.status(), "Response");
    Ok(response)
}

/// Turn a non-success response into [`OscarError::Status`].
pub fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(OscarError::Status {
            status: status.as_u16(),
            url: response.url().to_string(),
        })
    }
}

/// GET a URL and decode the body as JSON.
pub fn get_json(client: &Client, url: Url) -> Result<serde_json::Value> {
    let response = check_status(send(client.get(url))?)?;
    let body = response.text()?;
    Ok(serde_json::from_str(&body)?)
}

/// GET a URL and return the body as text.
pub fn get_text(client: &Client, url: Url) -> Result<String> {
    let response = check_status(send(client.get(url))?)?;
    Ok(response.text()?)
}
