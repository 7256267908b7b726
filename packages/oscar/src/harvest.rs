//! OAI-PMH harvesting of WMDR records.
//!
//! `ListRecords` responses are paged: each page may end with a
//! `resumptionToken` that requests the next one. [`Harvest`] follows the
//! tokens and yields the records of one page at a time.

use chrono::NaiveDate;
use roxmltree::Document;
use url::Url;

use crate::client::OscarClient;
use crate::config::METADATA_PREFIX;
use crate::error::Result;
use crate::http::{build_url, get_text};
use crate::xml::{to_standalone_xml, XPath, WMDR_NS};

/// OAI-PMH 2.0 namespace.
pub const OAI_NS: &str = "http://www.openarchives.org/OAI/2.0/";

const HARVEST_NAMESPACES: &[(&str, &str)] = &[("oai", OAI_NS), ("wmdr", WMDR_NS)];

/// One harvested WMDR record.
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestedRecord {
    /// OAI identifier from the record header.
    pub identifier: String,
    /// The `wmdr:WIGOSMetadataRecord` element as standalone XML.
    pub xml: String,
}

/// Records and continuation of one `ListRecords` response.
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestPage {
    pub records: Vec<HarvestedRecord>,
    pub resumption_token: Option<String>,
}

/// Parse a `ListRecords` response.
///
/// Records without WMDR metadata (deleted records) are skipped. An empty
/// resumption token marks the last page.
pub fn parse_page(xml: &str) -> Result<HarvestPage> {
    let doc = Document::parse(xml)?;
    let token_path = XPath::compile("/oai:OAI-PMH/oai:ListRecords/oai:resumptionToken", HARVEST_NAMESPACES)?;
    let record_path = XPath::compile("/oai:OAI-PMH/oai:ListRecords/oai:record", HARVEST_NAMESPACES)?;
    let identifier_path = XPath::compile("oai:header/oai:identifier", HARVEST_NAMESPACES)?;
    let metadata_path = XPath::compile("oai:metadata/wmdr:WIGOSMetadataRecord", HARVEST_NAMESPACES)?;

    let resumption_token = token_path
        .first_string(doc.root())
        .filter(|token| !token.is_empty());

    let mut records = Vec::new();
    for record in record_path.evaluate(doc.root()).iter().filter_map(|m| m.as_node()) {
        let identifier = identifier_path.first_string(record).unwrap_or_default();
        match metadata_path.first_node(record) {
            Some(metadata) => records.push(HarvestedRecord {
                identifier,
                xml: to_standalone_xml(metadata),
            }),
            None => tracing::debug!(identifier = %identifier, "Skipping record without WMDR metadata"),
        }
    }

    Ok(HarvestPage {
        records,
        resumption_token,
    })
}

/// Iterator over harvested pages.
///
/// Yields one batch per page. After an error, iteration ends.
pub struct Harvest<'c> {
    client: &'c OscarClient,
    date_from: Option<NaiveDate>,
    resumption_token: Option<String>,
    finished: bool,
    pages: usize,
}

impl<'c> Harvest<'c> {
    pub(crate) fn new(client: &'c OscarClient, date_from: Option<NaiveDate>) -> Self {
        Self {
            client,
            date_from,
            resumption_token: None,
            finished: false,
            pages: 0,
        }
    }

    /// URL of the next page request.
    fn next_url(&self) -> Result<Url> {
        let base = &self.client.config().harvest_url;
        match &self.resumption_token {
            Some(token) => build_url(
                base,
                &[],
                &[("verb", "ListRecords"), ("resumptionToken", token.as_str())],
            ),
            None => {
                let from = self.date_from.map(|d| d.format("%Y-%m-%d").to_string());
                let mut params = vec![("verb", "ListRecords"), ("metadataPrefix", METADATA_PREFIX)];
                if let Some(from) = &from {
                    params.push(("from", from.as_str()));
                }
                build_url(base, &[], &params)
            }
        }
    }

    fn fetch_page(&self) -> Result<HarvestPage> {
        let url = self.next_url()?;
        let text = get_text(self.client.http(), url)?;
        tracing::trace!(body = %text, "Raw XML response");
        parse_page(&text)
    }
}

impl Iterator for Harvest<'_> {
    type Item = Result<Vec<HarvestedRecord>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.fetch_page() {
            Ok(page) => {
                self.pages += 1;
                match &page.resumption_token {
                    Some(token) => tracing::debug!(page = self.pages, token = %token, "Resumption token"),
                    None => {
                        tracing::debug!(page = self.pages, "Stopping harvesting");
                        self.finished = true;
                    }
                }
                self.resumption_token = page.resumption_token;
                Some(Ok(page.records))
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
