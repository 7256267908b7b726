//! A namespace-aware XPath subset evaluated over `roxmltree` documents.
//!
//! Supported syntax:
//!
//! - absolute (`/a/b`) and relative (`a/b`) location paths
//! - `//` between or before steps (descendant-or-self)
//! - element steps with a `prefix:name`, `prefix:*`, plain name or `*` test
//! - `.` and `..`
//! - `@prefix:name` / `@name` / `@*` attribute steps, and `text()`,
//!   both only as the final step
//! - predicates: `[3]`, `[path]` (exists) and `[path='literal']`
//!
//! The string value of an element match is its first text child with
//! surrounding whitespace trimmed, not the concatenation of all descendant
//! text. `[.='x']` therefore matches `<a> x </a>`, and `<a>x<b/>y</a>`
//! has the string value `x`.
//!
//! Prefixes are resolved at compile time against a fixed binding table,
//! so an unknown prefix is a compile error rather than a silent miss.

use roxmltree::{Document, Node};

use crate::error::{OscarError, Result};
use crate::xml::utils::get_text;

/// One match of an evaluated path.
#[derive(Debug, Clone, Copy)]
pub enum XPathMatch<'a, 'input> {
    /// An element (or the document root).
    Node(Node<'a, 'input>),
    /// An attribute value or a text node.
    Value(&'a str),
}

impl<'a, 'input> XPathMatch<'a, 'input> {
    /// String value: the value itself, or an element's first text child, trimmed.
    #[must_use]
    pub fn string_value(&self) -> String {
        match self {
            Self::Node(node) => get_text(*node),
            Self::Value(value) => (*value).to_string(),
        }
    }

    /// The matched node, if this match is one.
    #[must_use]
    pub fn as_node(&self) -> Option<Node<'a, 'input>> {
        match self {
            Self::Node(node) => Some(*node),
            Self::Value(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    DescendantOrSelf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NameTest {
    Any,
    AnyInNamespace(String),
    Name {
        namespace: Option<String>,
        local: String,
    },
}

impl NameTest {
    fn matches(&self, namespace: Option<&str>, local: &str) -> bool {
        match self {
            Self::Any => true,
            Self::AnyInNamespace(ns) => namespace == Some(ns.as_str()),
            Self::Name {
                namespace: expected_ns,
                local: expected_local,
            } => local == expected_local && namespace == expected_ns.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum StepKind {
    SelfNode,
    Parent,
    Element(NameTest),
    Attribute(NameTest),
    Text,
}

impl StepKind {
    fn yields_values(&self) -> bool {
        matches!(self, Self::Attribute(_) | Self::Text)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    Position(usize),
    Exists(LocationPath),
    Equals(LocationPath, String),
}

#[derive(Debug, Clone, PartialEq)]
struct Step {
    axis: Axis,
    kind: StepKind,
    predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, PartialEq)]
struct LocationPath {
    absolute: bool,
    steps: Vec<Step>,
}

/// A compiled path expression.
#[derive(Debug, Clone)]
pub struct XPath {
    expression: String,
    path: LocationPath,
}

impl XPath {
    /// Compile `expression`, resolving prefixes through `namespaces`.
    ///
    /// # Examples
    /// ```
    /// use roxmltree::Document;
    /// use oscar_client::xml::XPath;
    ///
    /// let doc = Document::parse(r#"<a xmlns="urn:x"><b id="1"/><b id="2"/></a>"#).unwrap();
    /// let path = XPath::compile("//x:b/@id", &[("x", "urn:x")]).unwrap();
    /// assert_eq!(path.first_string(doc.root()), Some("1".to_string()));
    /// ```
    pub fn compile(expression: &str, namespaces: &[(&str, &str)]) -> Result<Self> {
        let mut parser = Parser::new(expression, namespaces);
        let path = parser.parse_path()?;
        parser.skip_ws();
        if !parser.at_end() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(Self {
            expression: expression.to_string(),
            path,
        })
    }

    /// The source text of this expression.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.expression
    }

    /// Every match in document order.
    #[must_use]
    pub fn evaluate<'a, 'input>(&self, context: Node<'a, 'input>) -> Vec<XPathMatch<'a, 'input>> {
        select(&self.path, context)
    }

    /// String value of the first match, if any.
    #[must_use]
    pub fn first_string(&self, context: Node<'_, '_>) -> Option<String> {
        self.evaluate(context).first().map(XPathMatch::string_value)
    }

    /// First matching node; value matches are skipped.
    #[must_use]
    pub fn first_node<'a, 'input>(&self, context: Node<'a, 'input>) -> Option<Node<'a, 'input>> {
        self.evaluate(context).iter().find_map(XPathMatch::as_node)
    }
}

/// Evaluate a compiled path against `document`.
pub fn evaluate<'a, 'input>(
    path: &XPath,
    document: &'a Document<'input>,
) -> Vec<XPathMatch<'a, 'input>> {
    path.evaluate(document.root())
}

fn select<'a, 'input>(path: &LocationPath, context: Node<'a, 'input>) -> Vec<XPathMatch<'a, 'input>> {
    let mut current = vec![if path.absolute {
        context.document().root()
    } else {
        context
    }];

    for step in &path.steps {
        let base = expand_axis(&current, step.axis);

        if step.kind.yields_values() {
            return select_values(&base, &step.kind);
        }

        let mut next = Vec::new();
        for node in base {
            let candidates: Vec<Node<'a, 'input>> = match &step.kind {
                StepKind::SelfNode => vec![node],
                StepKind::Parent => node.parent().into_iter().collect(),
                StepKind::Element(test) => node
                    .children()
                    .filter(|c| c.is_element())
                    .filter(|c| test.matches(c.tag_name().namespace(), c.tag_name().name()))
                    .collect(),
                StepKind::Attribute(_) | StepKind::Text => Vec::new(),
            };
            next.extend(apply_predicates(candidates, &step.predicates));
        }
        sort_unique(&mut next);
        current = next;
    }

    current.into_iter().map(XPathMatch::Node).collect()
}

fn expand_axis<'a, 'input>(nodes: &[Node<'a, 'input>], axis: Axis) -> Vec<Node<'a, 'input>> {
    match axis {
        Axis::Child => nodes.to_vec(),
        Axis::DescendantOrSelf => {
            let mut expanded: Vec<Node<'a, 'input>> =
                nodes.iter().flat_map(|n| n.descendants()).collect();
            sort_unique(&mut expanded);
            expanded
        }
    }
}

fn select_values<'a, 'input>(nodes: &[Node<'a, 'input>], kind: &StepKind) -> Vec<XPathMatch<'a, 'input>> {
    let mut values = Vec::new();
    for node in nodes {
        match kind {
            StepKind::Attribute(test) => values.extend(
                node.attributes()
                    .filter(|a| test.matches(a.namespace(), a.name()))
                    .map(|a| XPathMatch::Value(a.value())),
            ),
            StepKind::Text => values.extend(
                node.children()
                    .filter(|c| c.is_text())
                    .filter_map(|c| c.text())
                    .map(XPathMatch::Value),
            ),
            _ => {}
        }
    }
    values
}

fn apply_predicates<'a, 'input>(
    mut candidates: Vec<Node<'a, 'input>>,
    predicates: &[Predicate],
) -> Vec<Node<'a, 'input>> {
    for predicate in predicates {
        candidates = match predicate {
            Predicate::Position(position) => candidates
                .get(position.saturating_sub(1))
                .copied()
                .into_iter()
                .collect(),
            Predicate::Exists(path) => candidates
                .into_iter()
                .filter(|c| !select(path, *c).is_empty())
                .collect(),
            Predicate::Equals(path, literal) => candidates
                .into_iter()
                .filter(|c| select(path, *c).iter().any(|m| m.string_value() == *literal))
                .collect(),
        };
    }
    candidates
}

fn sort_unique(nodes: &mut Vec<Node<'_, '_>>) {
    nodes.sort_by_key(|n| n.id().get());
    nodes.dedup_by_key(|n| n.id());
}

struct Parser<'e, 'n> {
    expression: &'e str,
    chars: Vec<char>,
    pos: usize,
    namespaces: &'n [(&'n str, &'n str)],
}

impl<'e, 'n> Parser<'e, 'n> {
    fn new(expression: &'e str, namespaces: &'n [(&'n str, &'n str)]) -> Self {
        Self {
            expression,
            chars: expression.chars().collect(),
            pos: 0,
            namespaces,
        }
    }

    fn error(&self, reason: &str) -> OscarError {
        OscarError::InvalidXPath {
            expression: self.expression.to_string(),
            reason: format!("{reason} at position {}", self.pos),
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, s: &str) -> bool {
        let matches = s.chars().enumerate().all(|(i, c)| self.peek_at(i) == Some(c));
        if matches {
            self.pos += s.chars().count();
        }
        matches
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn parse_path(&mut self) -> Result<LocationPath> {
        self.skip_ws();
        let mut absolute = false;
        let mut axis = Axis::Child;

        if self.eat_str("//") {
            absolute = true;
            axis = Axis::DescendantOrSelf;
        } else if self.eat('/') {
            absolute = true;
        }

        let mut steps = Vec::new();
        loop {
            let step = self.parse_step(axis)?;
            let yields_values = step.kind.yields_values();
            steps.push(step);

            if self.eat_str("//") {
                axis = Axis::DescendantOrSelf;
            } else if self.eat('/') {
                axis = Axis::Child;
            } else {
                break;
            }

            if yields_values {
                return Err(self.error("attribute and text() steps must be last"));
            }
        }

        Ok(LocationPath { absolute, steps })
    }

    fn parse_step(&mut self, axis: Axis) -> Result<Step> {
        let kind = if self.eat_str("..") {
            StepKind::Parent
        } else if self.eat('.') {
            StepKind::SelfNode
        } else if self.eat('@') {
            StepKind::Attribute(self.parse_name_test()?)
        } else if self.eat_str("text()") {
            StepKind::Text
        } else {
            StepKind::Element(self.parse_name_test()?)
        };

        let mut predicates = Vec::new();
        while self.eat('[') {
            predicates.push(self.parse_predicate()?);
        }

        Ok(Step {
            axis,
            kind,
            predicates,
        })
    }

    fn parse_name_test(&mut self) -> Result<NameTest> {
        if self.eat('*') {
            return Ok(NameTest::Any);
        }

        let first = self.parse_ncname()?;
        if !self.eat(':') {
            return Ok(NameTest::Name {
                namespace: None,
                local: first,
            });
        }

        let namespace = self.resolve_prefix(&first)?;
        if self.eat('*') {
            return Ok(NameTest::AnyInNamespace(namespace));
        }
        let local = self.parse_ncname()?;
        Ok(NameTest::Name {
            namespace: Some(namespace),
            local,
        })
    }

    fn parse_ncname(&mut self) -> Result<String> {
        let start = self.pos;
        match self.peek() {
            Some(c) if c.is_alphabetic() || c == '_' => self.pos += 1,
            _ => return Err(self.error("expected a name")),
        }
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
        {
            self.pos += 1;
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn resolve_prefix(&self, prefix: &str) -> Result<String> {
        self.namespaces
            .iter()
            .find(|(p, _)| *p == prefix)
            .map(|(_, uri)| (*uri).to_string())
            .ok_or_else(|| OscarError::UnknownNamespacePrefix(prefix.to_string()))
    }

    fn parse_predicate(&mut self) -> Result<Predicate> {
        self.skip_ws();

        let predicate = if self.peek().is_some_and(|c| c.is_ascii_digit()) {
            let start = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1;
            }
            let digits: String = self.chars[start..self.pos].iter().collect();
            let position = digits
                .parse::<usize>()
                .ok()
                .filter(|p| *p > 0)
                .ok_or_else(|| self.error("invalid position"))?;
            Predicate::Position(position)
        } else {
            let path = self.parse_path()?;
            self.skip_ws();
            if self.eat('=') {
                self.skip_ws();
                Predicate::Equals(path, self.parse_literal()?)
            } else {
                Predicate::Exists(path)
            }
        };

        self.skip_ws();
        if !self.eat(']') {
            return Err(self.error("expected ']'"));
        }
        Ok(predicate)
    }

    fn parse_literal(&mut self) -> Result<String> {
        let quote = match self.peek() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(self.error("expected a quoted literal")),
        };
        self.pos += 1;
        let start = self.pos;
        while self.peek().is_some_and(|c| c != quote) {
            self.pos += 1;
        }
        if self.at_end() {
            return Err(self.error("unterminated literal"));
        }
        let literal = self.chars[start..self.pos].iter().collect();
        self.pos += 1;
        Ok(literal)
    }
}
