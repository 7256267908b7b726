//! XML utilities and namespace-aware path extraction for WMDR documents.

mod utils;
mod xpath;

pub use utils::*;
pub use xpath::{evaluate, XPath, XPathMatch};

use roxmltree::Document;

use crate::error::Result;

/// WMDR metadata record namespace.
pub const WMDR_NS: &str = "http://def.wmo.int/wmdr/2017";

/// GML 3.2 namespace.
pub const GML_NS: &str = "http://www.opengis.net/gml/3.2";

/// XLink namespace.
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Prefix bindings available to every expression passed to [`extract`].
pub const NAMESPACES: &[(&str, &str)] = &[("gml", GML_NS), ("wmdr", WMDR_NS), ("xlink", XLINK_NS)];

/// Result of [`extract`].
#[derive(Debug, Clone)]
pub enum Extracted<'a, 'input> {
    /// String value of the first match, `None` when nothing matched.
    First(Option<String>),
    /// Every match, unprocessed.
    All(Vec<XPathMatch<'a, 'input>>),
}

/// Evaluate `expression` against `document` with the [`NAMESPACES`] bindings.
///
/// With `first` set, returns the first match's string value (an
/// attribute value as-is, an element's text content), or `None`.
/// Otherwise returns all matches for the caller to process.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use oscar_client::xml::{extract, Extracted};
///
/// let xml = r#"<gml:name xmlns:gml="http://www.opengis.net/gml/3.2">SYDNEY</gml:name>"#;
/// let doc = Document::parse(xml).unwrap();
/// match extract(&doc, "/gml:name", true).unwrap() {
///     Extracted::First(name) => assert_eq!(name.as_deref(), Some("SYDNEY")),
///     Extracted::All(_) => unreachable!(),
/// }
/// ```
pub fn extract<'a, 'input>(
    document: &'a Document<'input>,
    expression: &str,
    first: bool,
) -> Result<Extracted<'a, 'input>> {
    let path = XPath::compile(expression, NAMESPACES)?;
    let matches = evaluate(&path, document);

    if first {
        Ok(Extracted::First(
            matches.first().map(XPathMatch::string_value),
        ))
    } else {
        Ok(Extracted::All(matches))
    }
}

/// [`extract`] with `first` set.
pub fn extract_first(document: &Document<'_>, expression: &str) -> Result<Option<String>> {
    let path = XPath::compile(expression, NAMESPACES)?;
    Ok(path.first_string(document.root()))
}

/// [`extract`] without `first`.
pub fn extract_all<'a, 'input>(
    document: &'a Document<'input>,
    expression: &str,
) -> Result<Vec<XPathMatch<'a, 'input>>> {
    let path = XPath::compile(expression, NAMESPACES)?;
    Ok(evaluate(&path, document))
}
