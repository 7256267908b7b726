//! Helpers for reading text and code-list references out of XML nodes.

use roxmltree::Node;

/// Get the text content of a node, trimmed.
///
/// Returns an empty string if the node has no text.
pub fn get_text(node: Node<'_, '_>) -> String {
    node.text()
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Final `/`-separated segment of a code-list URL.
///
/// WMDR references codes such as facility types and regions by URL,
/// e.g. `http://codes.wmo.int/wmdr/FacilityType/landFixed`.
///
/// # Examples
/// ```
/// use oscar_client::xml::url_tail;
///
/// assert_eq!(url_tail("http://codes.wmo.int/wmdr/FacilityType/landFixed"), "landFixed");
/// assert_eq!(url_tail("landFixed"), "landFixed");
/// ```
pub fn url_tail(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

/// Serialize an element as a standalone XML fragment.
///
/// The element's source text is reused verbatim. Namespace declarations
/// inherited from ancestors are added to its start tag so the fragment
/// parses on its own.
pub fn to_standalone_xml(node: Node<'_, '_>) -> String {
    let fragment = &node.document().input_text()[node.range()];
    let start_tag_end = start_tag_end(fragment);
    let start_tag = &fragment[..start_tag_end];

    let mut declarations = String::new();
    for ns in node.namespaces() {
        let attr = match ns.name() {
            Some("xml") => continue,
            Some(prefix) => format!("xmlns:{prefix}"),
            None => "xmlns".to_string(),
        };
        if declares(start_tag, &attr) {
            continue;
        }
        let uri = ns.uri().replace('&', "&amp;").replace('"', "&quot;");
        declarations.push_str(&format!(" {attr}=\"{uri}\""));
    }

    let name_end = fragment
        .char_indices()
        .skip(1)
        .find(|(_, c)| c.is_whitespace() || *c == '/' || *c == '>')
        .map_or(fragment.len(), |(i, _)| i);

    format!(
        "{}{}{}",
        &fragment[..name_end],
        declarations,
        &fragment[name_end..]
    )
}

/// Byte offset just past the closing `>` of the first start tag.
fn start_tag_end(fragment: &str) -> usize {
    let mut quote: Option<char> = None;
    for (i, c) in fragment.char_indices() {
        match (quote, c) {
            (None, '"' | '\'') => quote = Some(c),
            (Some(q), _) if c == q => quote = None,
            (None, '>') => return i + 1,
            _ => {}
        }
    }
    fragment.len()
}

fn declares(start_tag: &str, attr: &str) -> bool {
    start_tag
        .match_indices(attr)
        .any(|(i, _)| {
            let before_ok = start_tag[..i].ends_with(char::is_whitespace);
            let after = start_tag[i + attr.len()..].trim_start();
            before_ok && after.starts_with('=')
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use roxmltree::Document;

    #[test]
    fn test_get_text() {
        let xml = r#"<root>  trimmed text  </root>"#;
        let doc = Document::parse(xml).unwrap();
        assert_eq!(get_text(doc.root_element()), "trimmed text");

        let doc = Document::parse("<root/>").unwrap();
        assert_eq!(get_text(doc.root_element()), "");
    }

    #[test]
    fn test_url_tail() {
        assert_eq!(url_tail("http://codes.wmo.int/wmdr/WMORegion/5"), "5");
        assert_eq!(url_tail("http://codes.wmo.int/wmdr/TerritoryName/AUS"), "AUS");
        assert_eq!(url_tail(""), "");
    }

    #[test]
    fn test_to_standalone_xml_adds_inherited_namespaces() {
        let xml = r#"<outer xmlns:a="urn:a" xmlns="urn:default"><a:inner x="1 > 0"><a:leaf/></a:inner></outer>"#;
        let doc = Document::parse(xml).unwrap();
        let inner = doc
            .descendants()
            .find(|n| n.has_tag_name(("urn:a", "inner")))
            .unwrap();

        let standalone = to_standalone_xml(inner);
        let reparsed = Document::parse(&standalone).unwrap();
        let root = reparsed.root_element();
        assert_eq!(root.tag_name().namespace(), Some("urn:a"));
        assert_eq!(root.attribute("x"), Some("1 > 0"));
        assert!(standalone.contains(r#"xmlns="urn:default""#));
    }

    #[test]
    fn test_to_standalone_xml_keeps_own_declarations() {
        let xml = r#"<outer><a:inner xmlns:a="urn:a"/></outer>"#;
        let doc = Document::parse(xml).unwrap();
        let inner = doc.root_element().first_element_child().unwrap();

        let standalone = to_standalone_xml(inner);
        assert_eq!(standalone.matches("xmlns:a=").count(), 1);
    }
}
