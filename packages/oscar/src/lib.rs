//! OSCAR client - Query and harvest the WMO OSCAR/Surface station metadata service.
//!
//! This crate talks to the OSCAR/Surface REST API and its OAI-PMH provider,
//! and reduces station reports (JSON or WMDR XML) to a small summary.
//!
//! # Example
//!
//! ```
//! use roxmltree::Document;
//! use oscar_client::{summarize, StationReport};
//!
//! let xml = r#"<wmdr:WIGOSMetadataRecord
//!     xmlns:wmdr="http://def.wmo.int/wmdr/2017"
//!     xmlns:gml="http://www.opengis.net/gml/3.2"
//!     xmlns:xlink="http://www.w3.org/1999/xlink">
//!   <wmdr:facility><wmdr:ObservingFacility>
//!     <gml:identifier>0-20000-0-71758</gml:identifier>
//!     <gml:name>SYDNEY CS, NS</gml:name>
//!     <wmdr:facilityType xlink:href="http://codes.wmo.int/wmdr/FacilityType/landFixed"/>
//!     <wmdr:geospatialLocation><wmdr:GeospatialLocation><wmdr:geoLocation>
//!       <gml:Point><gml:pos>-33.86 151.2 39</gml:pos></gml:Point>
//!     </wmdr:geoLocation></wmdr:GeospatialLocation></wmdr:geospatialLocation>
//!   </wmdr:ObservingFacility></wmdr:facility>
//! </wmdr:WIGOSMetadataRecord>"#;
//!
//! let doc = Document::parse(xml).unwrap();
//! let summary = summarize(&StationReport::Xml(&doc)).unwrap();
//! assert_eq!(summary.facility_type.as_deref(), Some("Land (fixed)"));
//! assert_eq!(summary.elevation, Some(39.0));
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Environments, client settings and validation
//! - [`error`]: Error types and Result alias
//! - [`coerce`]: Typed coercion of text tokens
//! - [`facility`]: Facility type code table
//! - [`xml`]: Namespace-aware path extraction and XML utilities
//! - [`report`]: Station report summarization
//! - [`http`]: HTTP client helpers
//! - [`client`]: OSCAR REST API client
//! - [`harvest`]: OAI-PMH record harvesting
//! - [`cli`]: Command-line interface

pub mod cli;
pub mod client;
pub mod coerce;
pub mod config;
pub mod error;
pub mod facility;
pub mod harvest;
pub mod http;
pub mod report;
pub mod xml;

// Re-export commonly used items
pub use client::{OscarClient, RawReport, ReportFormat, StationQuery};
pub use coerce::{coerce, TypedValue};
pub use config::{ClientConfig, Environment};
pub use error::{OscarError, Result};
pub use facility::FacilityType;
pub use report::{summarize, StationReport, StationSummary};
pub use xml::{extract, Extracted, NAMESPACES};
