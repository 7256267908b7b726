//! Client and harvester tests against a mock OSCAR server.
//!
//! The client is blocking, so every call runs inside `spawn_blocking`.

use std::fs;
use std::path::Path;

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use oscar_client::client::{ContactQuery, UploadOutcome};
use oscar_client::{
    ClientConfig, Environment, FacilityType, OscarClient, OscarError, RawReport, ReportFormat,
    StationQuery,
};

fn load_fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("sydney")
        .join(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to load {}: {}", path.display(), e))
}

fn config(server: &MockServer) -> ClientConfig {
    ClientConfig::builder(Environment::Depl)
        .api_url(format!("{}/api", server.uri()))
        .harvest_url(format!("{}/oai/provider", server.uri()))
        .build()
}

async fn with_client<T, F>(config: ClientConfig, f: F) -> T
where
    F: FnOnce(&OscarClient) -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let client = OscarClient::new(config).expect("client creation");
        f(&client)
    })
    .await
    .expect("blocking task")
}

async fn mount_search(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/search/station"))
        .and(query_param("wigosId", "0-20000-0-71758"))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("search.json")))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_station_report_json() {
    let server = MockServer::start().await;
    mount_search(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/stations/station/12345/stationReport"))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("station_report.json")))
        .mount(&server)
        .await;

    let report = with_client(config(&server), |c| {
        c.get_station_report("0-20000-0-71758", ReportFormat::Json)
    })
    .await
    .expect("station report");

    let RawReport::Json(value) = &report else {
        panic!("expected JSON report");
    };
    assert_eq!(value["name"], "SYDNEY CS, NS");
    assert_eq!(value["wmoIndex"], "0-20000-0-71758");
    assert_eq!(report.summarize().unwrap().wmo_region.as_deref(), Some("V"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_station_report_xml() {
    let server = MockServer::start().await;
    mount_search(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/wmd/download/12345"))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("wmdr.xml")))
        .mount(&server)
        .await;

    let report = with_client(config(&server), |c| {
        c.get_station_report("0-20000-0-71758", ReportFormat::Xml)
    })
    .await
    .expect("station report");

    assert!(matches!(report, RawReport::Xml(_)));
    let summary = report.summarize().unwrap();
    assert_eq!(summary.barometer_height, Some(62.3));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_station_report_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/search/station"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"totalCount": 0, "stationSearchResults": []})),
        )
        .mount(&server)
        .await;

    let result = with_client(config(&server), |c| {
        c.get_station_report("non-existent-station", ReportFormat::Json)
    })
    .await;

    assert!(matches!(result, Err(OscarError::StationNotFound(id)) if id == "non-existent-station"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_stations_sends_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/search/station"))
        .and(query_param("territoryName", "AUS"))
        .and(query_param("facilityType", "Land (fixed)"))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("search.json")))
        .expect(1)
        .mount(&server)
        .await;

    let query = StationQuery {
        country: Some("AUS".to_string()),
        facility_type: Some(FacilityType::LandFixed),
        ..StationQuery::default()
    };
    let stations = with_client(config(&server), move |c| c.get_stations(&query))
        .await
        .expect("stations");

    assert_eq!(stations["totalCount"], 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_server_error_is_reported_with_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/search/station"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&server)
        .await;

    let result = with_client(config(&server), |c| c.get_stations(&StationQuery::default())).await;

    assert!(matches!(result, Err(OscarError::Status { status: 500, .. })));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_contacts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/contacts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "countryName": "Canada", "surname": "Doe", "organization": "MSC"},
            {"id": 2, "countryName": "France", "surname": "Martin", "organization": "MF"},
            {"id": 3, "countryName": "Canada", "surname": "Roe", "organization": "ECCC"}
        ])))
        .mount(&server)
        .await;
    for id in [1, 3] {
        Mock::given(method("GET"))
            .and(path(format!("/api/contacts/contact/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": id})))
            .expect(1)
            .mount(&server)
            .await;
    }

    let query = ContactQuery {
        country: Some("Canada".to_string()),
        surname: Some("Doe".to_string()),
        ..ContactQuery::default()
    };
    let contacts = with_client(config(&server), move |c| c.get_contacts(&query))
        .await
        .expect("contacts");

    assert_eq!(contacts, vec![json!({"id": 1}), json!({"id": 3})]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_upload_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/wmd/upload"))
        .and(query_param("useOnlyGmlIds", "TRUE"))
        .and(header("X-WMO-WMDR-Token", "test-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": 67610, "xmlStatus": "SUCCESS_WITH_WARNINGS"})),
        )
        .mount(&server)
        .await;

    let config = ClientConfig::builder(Environment::Depl)
        .api_url(format!("{}/api", server.uri()))
        .api_token("test-token")
        .build();
    let outcome = with_client(config, |c| c.upload("<foo/>", true))
        .await
        .expect("upload");

    let UploadOutcome::Accepted(result) = outcome else {
        panic!("expected accepted upload");
    };
    assert_eq!(result["id"], 67610);
    assert_eq!(result["xmlStatus"], "SUCCESS_WITH_WARNINGS");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_upload_error_page() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/wmd/upload"))
        .and(query_param("useOnlyGmlIds", "FALSE"))
        .respond_with(ResponseTemplate::new(401).set_body_string(
            r#"<html><body><div id="standardLayouterror">Not authorized</div></body></html>"#,
        ))
        .mount(&server)
        .await;

    let config = ClientConfig::builder(Environment::Depl)
        .api_url(format!("{}/api", server.uri()))
        .api_token("wrong")
        .build();
    let outcome = with_client(config, |c| c.upload("<foo/>", false))
        .await
        .expect("upload");

    assert_eq!(
        outcome,
        UploadOutcome::Rejected {
            code: 401,
            description: "Not authorized".to_string(),
        }
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_upload_requires_token() {
    let server = MockServer::start().await;
    let result = with_client(config(&server), |c| c.upload("<foo/>", true)).await;
    assert!(matches!(result, Err(OscarError::MissingArgument(_))));
}

fn oai_page(identifier: &str, token: Option<&str>) -> String {
    let token = token
        .map(|t| format!("<resumptionToken>{t}</resumptionToken>"))
        .unwrap_or_default();
    format!(
        r#"<OAI-PMH xmlns="http://www.openarchives.org/OAI/2.0/">
  <ListRecords>
    <record>
      <header><identifier>{identifier}</identifier></header>
      <metadata>
        <wmdr:WIGOSMetadataRecord xmlns:wmdr="http://def.wmo.int/wmdr/2017"/>
      </metadata>
    </record>
    {token}
  </ListRecords>
</OAI-PMH>"#
    )
}

#[tokio::test(flavor = "multi_thread")]
async fn test_harvest_follows_resumption_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/oai/provider"))
        .and(query_param("verb", "ListRecords"))
        .and(query_param("metadataPrefix", "wmdr"))
        .respond_with(ResponseTemplate::new(200).set_body_string(oai_page("0-1-2-A", Some("page-2"))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/oai/provider"))
        .and(query_param("verb", "ListRecords"))
        .and(query_param("resumptionToken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(oai_page("0-1-2-B", None)))
        .expect(1)
        .mount(&server)
        .await;

    let batches = with_client(config(&server), |c| {
        c.harvest_records(None).collect::<Result<Vec<_>, _>>()
    })
    .await
    .expect("harvest");

    let identifiers: Vec<Vec<String>> = batches
        .iter()
        .map(|b| b.iter().map(|r| r.identifier.clone()).collect())
        .collect();
    assert_eq!(identifiers, vec![vec!["0-1-2-A"], vec!["0-1-2-B"]]);
    assert!(batches[0][0].xml.starts_with("<wmdr:WIGOSMetadataRecord"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_harvest_stops_after_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/oai/provider"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let results = with_client(config(&server), |c| c.harvest_records(None).collect::<Vec<_>>()).await;

    assert_eq!(results.len(), 1);
    assert!(matches!(results[0], Err(OscarError::Status { status: 503, .. })));
}
