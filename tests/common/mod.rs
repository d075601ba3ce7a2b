//! In-memory driver used by the integration tests.
//!
//! The fake document does not evaluate expressions. It returns every node
//! whose tag appears as an element step of the expression (`//tag`,
//! `self::tag` or a CSS type selector), in document order, and leaves the
//! rest to the query's node filters.
//!
//! XPath string literals are honoured loosely: when an XPath compares
//! against literals (`= 'x'` or `contains(…, 'x')`), a node is kept if its
//! normalized text or any attribute value satisfies at least one of them.
//! That is enough to tell exact from loose rendering apart.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock};

use locator_engine::{
    Driver, Error, ErrorKind, NativeHandle, NativeNode, Result, Scope, ScopeRef, TextMode,
};
use parking_lot::{Mutex, RwLock};
use regex::Regex;

// ============================================================================
// Logging
// ============================================================================

/// Installs a test subscriber honouring `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// FakeNode
// ============================================================================

#[derive(Debug, Default)]
pub struct FakeNode {
    tag: String,
    attributes: Vec<(String, String)>,
    text: String,
    hidden: bool,
    appears_after: usize,
    children: Vec<Arc<FakeNode>>,
}

/// Starts a node with `tag`.
pub fn node(tag: &str) -> FakeNode {
    FakeNode {
        tag: tag.to_string(),
        ..FakeNode::default()
    }
}

impl FakeNode {
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.push((name.to_string(), value.to_string()));
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Left out of the first `finds` document lookups.
    pub fn appears_after(mut self, finds: usize) -> Self {
        self.appears_after = finds;
        self
    }

    pub fn child(mut self, child: FakeNode) -> Self {
        self.children.push(Arc::new(child));
        self
    }

    fn descendants(&self, out: &mut Vec<Arc<FakeNode>>) {
        for child in &self.children {
            out.push(Arc::clone(child));
            child.descendants(out);
        }
    }
}

impl Scope for FakeNode {
    fn find_css(&self, css: &str) -> Result<Vec<NativeHandle>> {
        let mut all = Vec::new();
        self.descendants(&mut all);
        Ok(select(all, &css_tags(css), &Literals::default(), usize::MAX))
    }

    fn find_xpath(&self, xpath: &str) -> Result<Vec<NativeHandle>> {
        let mut all = Vec::new();
        self.descendants(&mut all);
        Ok(select(all, &xpath_tags(xpath), &Literals::of(xpath), usize::MAX))
    }

    fn description(&self) -> Option<String> {
        Some(format!("<{}>", self.tag))
    }
}

impl NativeNode for FakeNode {
    fn tag_name(&self) -> Result<String> {
        Ok(self.tag.clone())
    }

    fn is_visible(&self) -> Result<bool> {
        Ok(!self.hidden)
    }

    fn text(&self, mode: TextMode) -> Result<String> {
        Ok(match mode {
            TextMode::Visible if self.hidden => String::new(),
            _ => self.text.clone(),
        })
    }

    fn attribute(&self, name: &str) -> Result<Option<String>> {
        Ok(self
            .attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone()))
    }
}

// ============================================================================
// FakeDocument
// ============================================================================

#[derive(Debug, Default)]
pub struct FakeDocument {
    nodes: RwLock<Vec<Arc<FakeNode>>>,
    finds: AtomicUsize,
    failures: AtomicUsize,
    expressions: Mutex<Vec<String>>,
    xpath_only: bool,
}

impl FakeDocument {
    pub fn new(nodes: Vec<FakeNode>) -> Arc<Self> {
        Arc::new(Self {
            nodes: RwLock::new(nodes.into_iter().map(Arc::new).collect()),
            ..Self::default()
        })
    }

    /// A document whose backend cannot evaluate CSS.
    pub fn xpath_only(nodes: Vec<FakeNode>) -> Arc<Self> {
        Arc::new(Self {
            nodes: RwLock::new(nodes.into_iter().map(Arc::new).collect()),
            xpath_only: true,
            ..Self::default()
        })
    }

    /// Makes the next `count` lookups fail with a stale element error.
    pub fn fail_next(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Swaps the document contents.
    pub fn replace(&self, nodes: Vec<FakeNode>) {
        *self.nodes.write() = nodes.into_iter().map(Arc::new).collect();
    }

    /// Number of lookups so far.
    pub fn finds(&self) -> usize {
        self.finds.load(Ordering::SeqCst)
    }

    /// Every expression evaluated so far.
    pub fn expressions(&self) -> Vec<String> {
        self.expressions.lock().clone()
    }

    fn lookup(&self, expression: &str, tags: &[String], literals: &Literals) -> Result<Vec<NativeHandle>> {
        let finds = self.finds.fetch_add(1, Ordering::SeqCst) + 1;
        self.expressions.lock().push(expression.to_string());

        let pending = self.failures.load(Ordering::SeqCst);
        if pending > 0 {
            self.failures.store(pending - 1, Ordering::SeqCst);
            return Err(Error::stale_element("document was replaced"));
        }

        let mut all = Vec::new();
        for root in self.nodes.read().iter() {
            all.push(Arc::clone(root));
            root.descendants(&mut all);
        }
        Ok(select(all, tags, literals, finds))
    }
}

impl Scope for FakeDocument {
    fn find_css(&self, css: &str) -> Result<Vec<NativeHandle>> {
        self.lookup(css, &css_tags(css), &Literals::default())
    }

    fn find_xpath(&self, xpath: &str) -> Result<Vec<NativeHandle>> {
        self.lookup(xpath, &xpath_tags(xpath), &Literals::of(xpath))
    }

    fn supports_format(&self, format: locator_engine::ExpressionFormat) -> bool {
        !self.xpath_only || format == locator_engine::ExpressionFormat::XPath
    }
}

// ============================================================================
// FakeDriver
// ============================================================================

pub struct FakeDriver {
    document: Arc<FakeDocument>,
    wait_supported: bool,
    invalid_element_errors: Vec<ErrorKind>,
}

impl FakeDriver {
    pub fn new(document: Arc<FakeDocument>) -> Arc<Self> {
        Arc::new(Self {
            document,
            wait_supported: true,
            invalid_element_errors: vec![ErrorKind::StaleElement],
        })
    }

    /// A driver for a static page: no waiting.
    pub fn static_page(document: Arc<FakeDocument>) -> Arc<Self> {
        Arc::new(Self {
            document,
            wait_supported: false,
            invalid_element_errors: vec![ErrorKind::StaleElement],
        })
    }
}

impl Driver for FakeDriver {
    fn document(&self) -> Result<ScopeRef> {
        let document: ScopeRef = self.document.clone();
        Ok(document)
    }

    fn wait_supported(&self) -> bool {
        self.wait_supported
    }

    fn invalid_element_errors(&self) -> Vec<ErrorKind> {
        self.invalid_element_errors.clone()
    }
}

// ============================================================================
// Expression Scanning
// ============================================================================

static EQUALS_LITERAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"= '([^']*)'").unwrap());
static CONTAINS_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"contains\([^',]*, '([^']*)'\)").unwrap());

/// String literals an XPath compares against.
#[derive(Debug, Default)]
struct Literals {
    equals: Vec<String>,
    contains: Vec<String>,
}

impl Literals {
    fn of(xpath: &str) -> Self {
        let capture = |re: &Regex| re.captures_iter(xpath).map(|caps| caps[1].to_string()).collect();
        Self {
            equals: capture(&EQUALS_LITERAL),
            contains: capture(&CONTAINS_LITERAL),
        }
    }

    fn admit(&self, node: &FakeNode) -> bool {
        if self.equals.is_empty() && self.contains.is_empty() {
            return true;
        }
        let text = node.text.split_whitespace().collect::<Vec<_>>().join(" ");
        let values: Vec<&str> = std::iter::once(text.as_str())
            .chain(node.attributes.iter().map(|(_, value)| value.as_str()))
            .collect();
        values.iter().any(|value| {
            self.equals.iter().any(|literal| *value == literal.as_str())
                || self.contains.iter().any(|literal| value.contains(literal.as_str()))
        })
    }
}

fn select(nodes: Vec<Arc<FakeNode>>, tags: &[String], literals: &Literals, finds: usize) -> Vec<NativeHandle> {
    let any = tags.iter().any(|tag| tag == "*");
    nodes
        .into_iter()
        .filter(|node| node.appears_after < finds)
        .filter(|node| any || tags.contains(&node.tag))
        .filter(|node| literals.admit(node))
        .map(|node| {
            let handle: NativeHandle = node;
            handle
        })
        .collect()
}

fn is_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '*'
}

fn xpath_tags(xpath: &str) -> Vec<String> {
    let mut tags = Vec::new();
    for separator in ["//", "::"] {
        for (start, _) in xpath.match_indices(separator) {
            let tag: String = xpath[start + separator.len()..]
                .chars()
                .take_while(|c| is_tag_char(*c))
                .collect();
            if !tag.is_empty() {
                tags.push(tag);
            }
        }
    }
    tags
}

fn css_tags(css: &str) -> Vec<String> {
    css.split(',')
        .filter_map(|part| {
            let tag: String = part.trim().chars().take_while(|c| is_tag_char(*c)).collect();
            (!tag.is_empty()).then_some(tag)
        })
        .collect()
}
