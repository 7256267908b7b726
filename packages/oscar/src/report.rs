//! Station report summarization.
//!
//! A station report arrives either as the OSCAR REST API's JSON object or
//! as a WMDR XML document. Both are reduced to the same [`StationSummary`].

use roxmltree::Document;
use serde::{Deserialize, Serialize};

use crate::coerce::coerce;
use crate::error::{OscarError, Result};
use crate::facility::facility_type_label;
use crate::xml::{extract_first, url_tail};

const NAME_PATH: &str = "//wmdr:ObservingFacility/gml:name";
const IDENTIFIER_PATH: &str = "//wmdr:ObservingFacility/gml:identifier";
const FACILITY_TYPE_PATH: &str = "//wmdr:ObservingFacility/wmdr:facilityType/@xlink:href";
const WMO_REGION_PATH: &str = "//wmdr:ObservingFacility/wmdr:wmoRegion/@xlink:href";
const TERRITORY_NAME_PATH: &str =
    "//wmdr:ObservingFacility/wmdr:territory/wmdr:Territory/wmdr:territoryName/@xlink:href";
const POSITION_PATH: &str = "//wmdr:ObservingFacility/wmdr:geospatialLocation\
    /wmdr:GeospatialLocation/wmdr:geoLocation/gml:Point/gml:pos";

/// Code space identifying atmospheric pressure equipment (observed variable 216).
pub const BAROMETER_CODE_SPACE: &str = "http://codes.wmo.int/wmdr/ObservedVariableAtmosphere/216";

/// Path to the position of the equipment deployed for [`BAROMETER_CODE_SPACE`].
fn barometer_position_path() -> String {
    format!(
        "//wmdr:Process/wmdr:deployment/wmdr:Deployment/wmdr:deployedEquipment\
         /wmdr:Equipment[gml:identifier/@codeSpace='{BAROMETER_CODE_SPACE}']\
         /wmdr:geospatialLocation/wmdr:GeospatialLocation/wmdr:geoLocation/gml:Point/gml:pos"
    )
}

/// WIGOS identifier entry of a JSON station report.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WigosId {
    pub wid: String,
}

/// Location entry of a JSON station report.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub elevation: Option<f64>,
}

/// Territory entry of a JSON station report.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Territory {
    pub territory_name: String,
}

/// The fields of a JSON station report that feed a summary.
///
/// Other keys of the API response are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredReport {
    pub name: String,
    #[serde(default)]
    pub wigos_ids: Vec<WigosId>,
    #[serde(default)]
    pub type_name: Option<String>,
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default)]
    pub territories: Vec<Territory>,
    #[serde(default)]
    pub wmo_ra_id: Option<String>,
}

impl StructuredReport {
    /// Read the summary fields out of a decoded API response.
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        Ok(Self::deserialize(value)?)
    }
}

/// A station report in one of its two representations.
#[derive(Debug, Clone)]
pub enum StationReport<'a, 'input> {
    /// JSON report from the REST API.
    Structured(StructuredReport),
    /// Parsed WMDR XML document.
    Xml(&'a Document<'input>),
}

/// Normalized key fields of a station report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationSummary {
    pub station_name: String,
    pub wigos_station_identifier: String,
    pub facility_type: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: Option<f64>,
    pub barometer_height: Option<f64>,
    pub territory_name: Option<String>,
    pub wmo_region: Option<String>,
}

/// Summarize a station report.
///
/// Fails with [`OscarError::MalformedInput`] when the name, identifier or
/// position is missing, and with [`OscarError::UnknownFacilityType`] when
/// an XML report names a facility type code outside the lookup table.
/// Optional fields that are absent come back as `None`.
///
/// # Examples
/// ```
/// use oscar_client::report::{summarize, StationReport, StructuredReport};
///
/// let value = serde_json::json!({
///     "name": "SYDNEY CS, NS",
///     "wigosIds": [{"wid": "0-20000-0-71758"}],
///     "locations": [{"latitude": -33.86, "longitude": 151.2}],
/// });
/// let report = StationReport::Structured(StructuredReport::from_value(&value).unwrap());
/// let summary = summarize(&report).unwrap();
/// assert_eq!(summary.wigos_station_identifier, "0-20000-0-71758");
/// assert_eq!(summary.barometer_height, None);
/// ```
pub fn summarize(report: &StationReport<'_, '_>) -> Result<StationSummary> {
    match report {
        StationReport::Structured(report) => summarize_structured(report),
        StationReport::Xml(doc) => summarize_xml(doc),
    }
}

fn summarize_structured(report: &StructuredReport) -> Result<StationSummary> {
    let wigos_id = report
        .wigos_ids
        .first()
        .ok_or_else(|| OscarError::malformed("wigosIds[0]", "station report"))?;
    let location = report
        .locations
        .first()
        .ok_or_else(|| OscarError::malformed("locations[0]", "station report"))?;

    Ok(StationSummary {
        station_name: report.name.clone(),
        wigos_station_identifier: wigos_id.wid.clone(),
        facility_type: report.type_name.clone(),
        latitude: location.latitude,
        longitude: location.longitude,
        elevation: location.elevation,
        barometer_height: None,
        territory_name: report.territories.first().map(|t| t.territory_name.clone()),
        wmo_region: report.wmo_ra_id.clone(),
    })
}

fn summarize_xml(doc: &Document<'_>) -> Result<StationSummary> {
    let station_name = extract_first(doc, NAME_PATH)?
        .ok_or_else(|| OscarError::malformed("gml:name", "wmdr:ObservingFacility"))?;

    let identifier = extract_first(doc, IDENTIFIER_PATH)?
        .ok_or_else(|| OscarError::malformed("gml:identifier", "wmdr:ObservingFacility"))?;
    let wigos_station_identifier = identifier
        .split(',')
        .next()
        .unwrap_or_default()
        .to_string();

    let facility_type = coded_reference(doc, FACILITY_TYPE_PATH)?
        .map(|code| facility_type_label(&code).map(str::to_string))
        .transpose()?;
    let wmo_region = coded_reference(doc, WMO_REGION_PATH)?;
    let territory_name = coded_reference(doc, TERRITORY_NAME_PATH)?;

    let position = extract_first(doc, POSITION_PATH)?
        .ok_or_else(|| OscarError::malformed("gml:pos", "wmdr:ObservingFacility"))?;
    let tokens: Vec<&str> = position.split_whitespace().collect();
    let (latitude, longitude) = match tokens.as_slice() {
        [lat, lon, ..] => (
            numeric(lat, "latitude", POSITION_PATH)?,
            numeric(lon, "longitude", POSITION_PATH)?,
        ),
        _ => {
            return Err(OscarError::malformed(
                format!("latitude and longitude (got '{position}')"),
                "wmdr:ObservingFacility/gml:pos",
            ))
        }
    };
    let elevation = match tokens.as_slice() {
        [_, _, elevation] => Some(numeric(elevation, "elevation", POSITION_PATH)?),
        _ => None,
    };

    let barometer_height = extract_first(doc, &barometer_position_path())?
        .and_then(|pos| pos.split_whitespace().last().map(str::to_string))
        .map(|height| numeric(&height, "barometer height", BAROMETER_CODE_SPACE))
        .transpose()?;

    tracing::debug!(
        station = %station_name,
        wigos_id = %wigos_station_identifier,
        has_barometer = barometer_height.is_some(),
        "Summarized WMDR record"
    );

    Ok(StationSummary {
        station_name,
        wigos_station_identifier,
        facility_type,
        latitude,
        longitude,
        elevation,
        barometer_height,
        territory_name,
        wmo_region,
    })
}

/// Code at the tail of a URL-valued attribute, `None` if the attribute is absent.
fn coded_reference(doc: &Document<'_>, expression: &str) -> Result<Option<String>> {
    Ok(extract_first(doc, expression)?.map(|href| url_tail(&href).to_string()))
}

fn numeric(token: &str, what: &str, context: &str) -> Result<f64> {
    coerce(token)
        .as_f64()
        .ok_or_else(|| OscarError::malformed(format!("numeric {what} (got '{token}')"), context))
}
