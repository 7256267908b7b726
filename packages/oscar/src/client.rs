//! OSCAR/Surface REST API client.

use chrono::NaiveDate;
use clap::ValueEnum;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use roxmltree::Document;
use scraper::{Html, Selector};
use serde::Serialize;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::{OscarError, Result};
use crate::facility::FacilityType;
use crate::harvest::Harvest;
use crate::http::{build_url, create_client, get_json, get_text, send};
use crate::report::{summarize, StationReport, StationSummary, StructuredReport};

/// Element id OSCAR uses for the message on its HTML error pages.
const UPLOAD_ERROR_ID: &str = "standardLayouterror";

/// Representation to download a station report in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "UPPER")]
pub enum ReportFormat {
    #[default]
    Json,
    Xml,
}

/// A station report as downloaded.
#[derive(Debug, Clone)]
pub enum RawReport {
    Json(Value),
    Xml(String),
}

impl RawReport {
    /// Parse the report and reduce it to a [`StationSummary`].
    pub fn summarize(&self) -> Result<StationSummary> {
        match self {
            Self::Json(value) => {
                let report = StructuredReport::from_value(value)?;
                summarize(&StationReport::Structured(report))
            }
            Self::Xml(text) => {
                let doc = Document::parse(text)?;
                summarize(&StationReport::Xml(&doc))
            }
        }
    }
}

/// Filters for a station search.
///
/// A WIGOS identifier, when set, overrides the other filters.
#[derive(Debug, Clone, Default)]
pub struct StationQuery {
    pub wigos_id: Option<String>,
    pub program: Option<String>,
    pub country: Option<String>,
    pub facility_type: Option<FacilityType>,
}

impl StationQuery {
    /// Search for a single WIGOS identifier.
    #[must_use]
    pub fn wigos_id(id: impl Into<String>) -> Self {
        Self {
            wigos_id: Some(id.into()),
            ..Self::default()
        }
    }

    fn params(&self) -> Vec<(&'static str, &str)> {
        if let Some(wigos_id) = &self.wigos_id {
            tracing::debug!(wigos_id = %wigos_id, "WIGOS ID filter");
            return vec![("wigosId", wigos_id.as_str())];
        }

        let mut params = Vec::new();
        if let Some(program) = &self.program {
            tracing::debug!(program = %program, "Program filter");
            params.push(("programAffiliation", program.as_str()));
        }
        if let Some(country) = &self.country {
            tracing::debug!(country = %country, "Country filter");
            params.push(("territoryName", country.as_str()));
        }
        if let Some(facility_type) = &self.facility_type {
            tracing::debug!(station_type = %facility_type, "Station type filter");
            params.push(("facilityType", facility_type.label()));
        }
        params
    }
}

/// Filters for a contact lookup; a contact matching any of them is returned.
#[derive(Debug, Clone, Default)]
pub struct ContactQuery {
    pub country: Option<String>,
    pub surname: Option<String>,
    pub organization: Option<String>,
}

impl ContactQuery {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.country.is_none() && self.surname.is_none() && self.organization.is_none()
    }

    fn matches(&self, contact: &Value) -> bool {
        let field_is = |key: &str, wanted: &Option<String>| {
            wanted
                .as_deref()
                .is_some_and(|w| contact.get(key).and_then(Value::as_str) == Some(w))
        };
        field_is("countryName", &self.country)
            || field_is("surname", &self.surname)
            || field_is("organization", &self.organization)
    }
}

/// Result of a WMDR upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UploadOutcome {
    /// Accepted; the API's JSON response.
    Accepted(Value),
    /// Refused; the HTTP status and the message from the error page.
    Rejected { code: u16, description: String },
}

/// Client for one OSCAR/Surface environment.
pub struct OscarClient {
    config: ClientConfig,
    client: Client,
}

impl OscarClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        tracing::debug!(api_url = %config.api_url, harvest_url = %config.harvest_url, "Setting URL");
        let client = create_client(&config)?;
        Ok(Self { config, client })
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    /// Search for stations.
    pub fn get_stations(&self, query: &StationQuery) -> Result<Value> {
        tracing::info!("Searching for stations");
        let url = build_url(&self.config.api_url, &["search", "station"], &query.params())?;
        get_json(&self.client, url)
    }

    /// Fetch the full records of every contact matching `query`.
    pub fn get_contacts(&self, query: &ContactQuery) -> Result<Vec<Value>> {
        tracing::debug!("Fetching all contacts");
        let url = build_url(&self.config.api_url, &["contacts"], &[])?;
        let contacts = get_json(&self.client, url)?;

        let mut ids: Vec<String> = Vec::new();
        for contact in contacts.as_array().into_iter().flatten() {
            if !query.matches(contact) {
                continue;
            }
            if let Some(id) = contact.get("id").and_then(id_string) {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }

        ids.iter()
            .map(|id| {
                tracing::debug!(id = %id, "Fetching contact");
                let url = build_url(&self.config.api_url, &["contacts", "contact", id.as_str()], &[])?;
                get_json(&self.client, url)
            })
            .collect()
    }

    /// Download the report of the station with WIGOS identifier `identifier`.
    pub fn get_station_report(&self, identifier: &str, format: ReportFormat) -> Result<RawReport> {
        tracing::debug!(wigos_id = %identifier, "Searching stations for WIGOS ID");
        let results = self.get_stations(&StationQuery::wigos_id(identifier))?;

        let internal_id = results
            .get("stationSearchResults")
            .and_then(|r| r.get(0))
            .and_then(|r| r.get("id"))
            .and_then(id_string)
            .filter(|_| results.get("totalCount").and_then(Value::as_u64) != Some(0))
            .ok_or_else(|| OscarError::StationNotFound(identifier.to_string()))?;

        tracing::debug!(id = %internal_id, "Fetching station report");
        match format {
            ReportFormat::Xml => {
                let url = build_url(&self.config.api_url, &["wmd", "download", internal_id.as_str()], &[])?;
                Ok(RawReport::Xml(get_text(&self.client, url)?))
            }
            ReportFormat::Json => {
                let url = build_url(
                    &self.config.api_url,
                    &["stations", "station", internal_id.as_str(), "stationReport"],
                    &[],
                )?;
                Ok(RawReport::Json(get_json(&self.client, url)?))
            }
        }
    }

    /// Upload a WMDR XML document.
    ///
    /// `only_use_gml_ids` asks OSCAR to match supporting elements by `gml:id`.
    pub fn upload(&self, xml: &str, only_use_gml_ids: bool) -> Result<UploadOutcome> {
        if self.config.api_token.is_none() {
            return Err(OscarError::MissingArgument(
                "An API token is required to upload".to_string(),
            ));
        }

        let use_only_gml_ids = if only_use_gml_ids { "TRUE" } else { "FALSE" };
        tracing::debug!(use_only_gml_ids, "useOnlyGmlIds");

        let url = build_url(
            &self.config.api_url,
            &["wmd", "upload"],
            &[("useOnlyGmlIds", use_only_gml_ids)],
        )?;
        let response = send(
            self.client
                .post(url)
                .header(CONTENT_TYPE, "application/xml")
                .body(xml.to_string()),
        )?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text()?;
            return Ok(UploadOutcome::Rejected {
                code: status.as_u16(),
                description: upload_error_description(&body),
            });
        }

        let body = response.text()?;
        Ok(UploadOutcome::Accepted(serde_json::from_str(&body)?))
    }

    /// Page through every WMDR record of the OAI-PMH provider.
    #[must_use]
    pub fn harvest_records(&self, date_from: Option<NaiveDate>) -> Harvest<'_> {
        Harvest::new(self, date_from)
    }
}

/// Identifiers come back as numbers or strings depending on the endpoint.
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Text of the error element on an OSCAR HTML error page, whitespace collapsed.
fn upload_error_description(html: &str) -> String {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse(&format!("#{UPLOAD_ERROR_ID}")) else {
        return String::new();
    };

    document
        .select(&selector)
        .next()
        .map(|element| {
            element
                .text()
                .flat_map(str::split_whitespace)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}
