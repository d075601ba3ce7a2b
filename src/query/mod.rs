//! Selector queries.
//!
//! A [`SelectorQuery`] binds a selector definition, a locator and an option
//! map. Everything that can be decided without a document is decided at
//! construction: option keys are validated, the expression is compiled once
//! and the wait, visibility, exactness and match policy are resolved.
//! [`SelectorQuery::resolve_for`] then evaluates the expression against a
//! scope and narrows the candidates with the query's filters.
//!
//! # Example
//!
//! ```ignore
//! use locator_engine::{QueryOptions, SelectorQuery, SessionOptions};
//!
//! let query = SelectorQuery::builder()
//!     .selector("button")
//!     .locator("Submit")
//!     .options(QueryOptions::new().filter("disabled", false))
//!     .build(&SessionOptions::new())?;
//!
//! assert_eq!(query.description(), "visible button \"Submit\" that is not disabled");
//! let result = query.resolve_for(&document, None)?;
//! ```

// ============================================================================
// Submodules
// ============================================================================

pub mod count;
pub mod text;

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::config::{MatchPolicy, SessionOptions, Visibility};
use crate::driver::{ScopeRef, TextMode};
use crate::error::{Error, Result};
use crate::expression::{CssBuilder, Expression, ExpressionFormat, XPathBuilder};
use crate::node::{Element, QueryResult, normalize_whitespace};
use crate::selector::definition::{ExpressionInput, SelectorDefinition};
use crate::selector::filter::{Filter, FilterOutcome};
use crate::selector::{filter_set, registry};
use crate::value::{FilterValue, IntoLocator, LocatorValue, QueryOptions};

pub use count::{COUNT_KEYS, CountOptions};
pub use text::text_matches;

// ============================================================================
// Constants
// ============================================================================

/// Option keys every query accepts.
pub const VALID_KEYS: [&str; 13] = [
    "count",
    "minimum",
    "maximum",
    "between",
    "text",
    "id",
    "class",
    "visible",
    "exact",
    "exact_text",
    "match",
    "wait",
    "filter_set",
];

// ============================================================================
// Types
// ============================================================================

/// Caller supplied predicate run after every other filter.
pub type FilterBlock = Arc<dyn Fn(&Element) -> Result<bool> + Send + Sync>;

/// Internal shared state for a query.
struct QueryInner {
    selector: Arc<SelectorDefinition>,
    locator: Option<LocatorValue>,
    options: QueryOptions,
    expression: Expression,
    node_filters: Vec<Filter>,
    counts: CountOptions,
    visibility: Visibility,
    exact: bool,
    exact_text: FilterValue,
    match_policy: MatchPolicy,
    wait: Duration,
    filter_block: Option<FilterBlock>,
}

// ============================================================================
// SelectorQuery
// ============================================================================

/// A compiled, validated query.
///
/// Cloning is cheap; elements keep a clone to reload themselves.
#[derive(Clone)]
pub struct SelectorQuery {
    inner: Arc<QueryInner>,
}

impl fmt::Debug for SelectorQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectorQuery")
            .field("selector", &self.inner.selector.name())
            .field("locator", &self.inner.locator)
            .field("expression", &self.inner.expression.render(self.inner.exact))
            .field("visibility", &self.inner.visibility)
            .field("match", &self.inner.match_policy)
            .field("wait", &self.inner.wait)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SelectorQuery - Constructors
// ============================================================================

impl SelectorQuery {
    /// Starts building a query.
    #[inline]
    #[must_use]
    pub fn builder() -> QueryBuilder {
        QueryBuilder::default()
    }

    /// Creates a query without a filter block.
    ///
    /// `selector` of `None` auto-detects from the locator, then falls back to
    /// the session's default selector.
    ///
    /// # Errors
    ///
    /// Configuration errors: unknown selector, unknown option keys, invalid
    /// global option values, a locator of the wrong kind, or an expression
    /// builder failure.
    pub fn new(
        selector: Option<&str>,
        locator: impl IntoLocator,
        options: QueryOptions,
        config: &SessionOptions,
    ) -> Result<Self> {
        let mut builder = Self::builder().locator(locator).options(options);
        if let Some(name) = selector {
            builder = builder.selector(name);
        }
        builder.build(config)
    }

    /// Returns a copy of this query with different count options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] for malformed count values.
    pub fn with_counts(&self, counts: &QueryOptions) -> Result<Self> {
        let mut options = self.inner.options.clone();
        for key in COUNT_KEYS {
            options.remove(key);
        }
        for (key, value) in counts.iter() {
            options.set(key, value.clone());
        }
        let counts = CountOptions::from_options(&options)?;

        Ok(Self {
            inner: Arc::new(QueryInner {
                selector: Arc::clone(&self.inner.selector),
                locator: self.inner.locator.clone(),
                options,
                expression: self.inner.expression.clone(),
                node_filters: self.inner.node_filters.clone(),
                counts,
                visibility: self.inner.visibility,
                exact: self.inner.exact,
                exact_text: self.inner.exact_text.clone(),
                match_policy: self.inner.match_policy,
                wait: self.inner.wait,
                filter_block: self.inner.filter_block.clone(),
            }),
        })
    }
}

// ============================================================================
// SelectorQuery - Accessors
// ============================================================================

impl SelectorQuery {
    /// Returns the selector definition.
    #[inline]
    #[must_use]
    pub fn selector(&self) -> &SelectorDefinition {
        &self.inner.selector
    }

    /// Returns the locator.
    #[inline]
    #[must_use]
    pub fn locator(&self) -> Option<&LocatorValue> {
        self.inner.locator.as_ref()
    }

    /// Returns the options as given.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &QueryOptions {
        &self.inner.options
    }

    /// Returns the compiled expression.
    #[inline]
    #[must_use]
    pub fn expression(&self) -> &Expression {
        &self.inner.expression
    }

    /// Returns the expression format.
    #[inline]
    #[must_use]
    pub fn format(&self) -> ExpressionFormat {
        self.inner.expression.format()
    }

    /// Returns the maximum wait.
    #[inline]
    #[must_use]
    pub fn wait(&self) -> Duration {
        self.inner.wait
    }

    /// Returns the resolved visibility policy.
    #[inline]
    #[must_use]
    pub fn visible(&self) -> Visibility {
        self.inner.visibility
    }

    /// Returns `true` if `is` comparisons render exactly.
    #[inline]
    #[must_use]
    pub fn exact(&self) -> bool {
        self.inner.exact
    }

    /// Returns the match policy.
    #[inline]
    #[must_use]
    pub fn match_policy(&self) -> MatchPolicy {
        self.inner.match_policy
    }

    /// Returns the parsed count options.
    #[inline]
    #[must_use]
    pub fn count_options(&self) -> &CountOptions {
        &self.inner.counts
    }

    /// Returns `true` if `n` satisfies the count options.
    #[inline]
    #[must_use]
    pub fn matches_count(&self, n: usize) -> bool {
        self.inner.counts.matches(n)
    }

    /// XPath text, rendered with `exact` or the query's exactness.
    ///
    /// Returns `None` for CSS queries.
    #[must_use]
    pub fn xpath(&self, exact: Option<bool>) -> Option<String> {
        self.inner
            .expression
            .as_xpath()
            .map(|xpath| xpath.render(exact.unwrap_or(self.inner.exact)))
    }

    /// CSS text. Returns `None` for XPath queries.
    #[inline]
    #[must_use]
    pub fn css(&self) -> Option<&str> {
        self.inner.expression.as_css()
    }

    /// `exact_text: true` turns the `text` option into a whole-text match.
    fn exact_text_flag(&self) -> bool {
        self.inner.exact_text.as_bool() == Some(true)
    }
}

// ============================================================================
// SelectorQuery - Description
// ============================================================================

impl SelectorQuery {
    /// Human readable description, e.g. `visible button "Submit" that is not disabled`.
    #[must_use]
    pub fn description(&self) -> String {
        let options = &self.inner.options;
        let mut desc = String::new();

        match self.inner.visibility {
            Visibility::Visible => desc.push_str("visible "),
            Visibility::Hidden => desc.push_str("non-visible "),
            Visibility::All => {}
        }

        desc.push_str(self.inner.selector.label());
        desc.push(' ');
        match &self.inner.locator {
            Some(locator) => desc.push_str(&locator.inspect()),
            None => desc.push_str("nil"),
        }

        if let Some(text) = options.get("text") {
            let exact = if self.exact_text_flag() { " exact" } else { "" };
            desc.push_str(&format!(" with{exact} text {}", text.inspect()));
        }
        if let FilterValue::Text(exact_text) = &self.inner.exact_text {
            desc.push_str(&format!(" with exact text {exact_text}"));
        }
        if let Some(id) = options.get("id") {
            desc.push_str(&format!(" with id {id}"));
        }
        if let Some(classes) = options.get("class") {
            let classes: Vec<String> = classes.to_list().iter().map(FilterValue::to_text).collect();
            desc.push_str(&format!(" with classes [{}]", classes.join(",")));
        }

        desc.push_str(&self.inner.selector.describe(options));

        if self.inner.filter_block.is_some() {
            desc.push_str(" that also matches the custom filter block");
        }
        desc
    }

    /// `expected to find <description><count phrase>`.
    #[must_use]
    pub fn failure_message(&self) -> String {
        self.failure_message_within(None)
    }

    /// `expected not to find <description><count phrase>`.
    #[must_use]
    pub fn negative_failure_message(&self) -> String {
        self.failure_message().replacen("to find", "not to find", 1)
    }

    /// Failure message naming the scope the query ran in, if any.
    pub(crate) fn failure_message_within(&self, scope: Option<&str>) -> String {
        let within = scope.map(|s| format!(" within {s}")).unwrap_or_default();
        format!(
            "expected to find {}{within}{}",
            self.description(),
            self.inner.counts.message()
        )
    }
}

// ============================================================================
// SelectorQuery - Resolution
// ============================================================================

impl SelectorQuery {
    /// Evaluates the expression in `scope` and filters the candidates.
    ///
    /// `exact` overrides the query's exactness for XPath rendering. An empty
    /// result is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FormatMismatch`] if `scope` cannot evaluate the
    /// expression format, and propagates backend errors from the lookup.
    pub fn resolve_for(&self, scope: &ScopeRef, exact: Option<bool>) -> Result<QueryResult> {
        let format = self.format();
        if !scope.supports_format(format) {
            return Err(Error::format_mismatch(self.inner.selector.name(), format));
        }

        let candidates = match &self.inner.expression {
            Expression::Css(css) => scope.find_css(css)?,
            Expression::XPath(xpath) => {
                scope.find_xpath(&xpath.render(exact.unwrap_or(self.inner.exact)))?
            }
        };
        trace!(
            selector = %self.inner.selector.name(),
            candidates = candidates.len(),
            "Expression evaluated"
        );

        let mut elements = Vec::new();
        let mut rejected = Vec::new();
        let mut filter_errors = Vec::new();
        for node in candidates {
            let element = Element::from_query(node, Arc::clone(scope), self.clone(), elements.len());
            if self.matches_filters(&element, &mut filter_errors)? {
                elements.push(element);
            } else {
                rejected.push(element);
            }
        }

        debug!(
            query = %self.description(),
            matched = elements.len(),
            rejected = rejected.len(),
            "Query resolved"
        );
        Ok(QueryResult::new(
            elements,
            rejected,
            filter_errors,
            scope.description(),
            self.clone(),
        ))
    }

    /// Returns `true` if `element` passes every filter of this query.
    ///
    /// Retryable errors raised by a filter count as a mismatch.
    ///
    /// # Errors
    ///
    /// Propagates non-retryable errors.
    pub fn matches_filters(&self, element: &Element, errors: &mut Vec<String>) -> Result<bool> {
        match self.check_filters(element, errors) {
            Err(e)
                if e.is_element_error()
                    || e.is_invalid_element()
                    || element.scope().invalid_element_errors().contains(&e.kind()) =>
            {
                trace!(error = %e, "Filter raised, treating as mismatch");
                Ok(false)
            }
            other => other,
        }
    }

    /// Visibility, id/class patterns, text, node filters, locator filter and
    /// the filter block, in that order. Stops at the first failure.
    fn check_filters(&self, element: &Element, errors: &mut Vec<String>) -> Result<bool> {
        let inner = &self.inner;

        match inner.visibility {
            Visibility::Visible if !element.is_visible()? => return Ok(false),
            Visibility::Hidden if element.is_visible()? => return Ok(false),
            _ => {}
        }

        for attribute in ["id", "class"] {
            if inner.selector.handles_option(attribute) {
                continue;
            }
            if let Some(re) = inner.options.get(attribute).and_then(FilterValue::as_pattern)
                && !element.attribute(attribute)?.is_some_and(|actual| re.is_match(&actual))
            {
                return Ok(false);
            }
        }

        let text_mode = match inner.visibility {
            Visibility::Visible => TextMode::Visible,
            Visibility::Hidden | Visibility::All => TextMode::All,
        };
        if let Some(expected) = inner.options.get("text") {
            let actual = normalize_whitespace(&element.text(text_mode)?);
            let exact = self.exact_text_flag() && expected.as_pattern().is_none();
            if !text_matches(&actual, expected, exact) {
                return Ok(false);
            }
        }
        if matches!(inner.exact_text, FilterValue::Text(_) | FilterValue::Pattern(_)) {
            let actual = normalize_whitespace(&element.text(text_mode)?);
            if !text_matches(&actual, &inner.exact_text, true) {
                return Ok(false);
            }
        }

        for filter in &inner.node_filters {
            let value = match inner.options.get(filter.name()) {
                Some(value) => value,
                None => match filter.default_value() {
                    Some(default) => default,
                    None => continue,
                },
            };
            if let FilterOutcome::Applied(false) = filter.apply_node(element, value, errors)? {
                trace!(filter = %filter.name(), "Candidate rejected");
                return Ok(false);
            }
        }

        if let Some(locator_filter) = inner.selector.locator_filter()
            && let FilterOutcome::Applied(false) =
                locator_filter.apply(element, inner.locator.as_ref(), inner.exact)?
        {
            return Ok(false);
        }

        match &inner.filter_block {
            Some(block) => block(element),
            None => Ok(true),
        }
    }
}

// ============================================================================
// QueryBuilder
// ============================================================================

/// Builder for [`SelectorQuery`].
#[derive(Default)]
pub struct QueryBuilder {
    selector: Option<String>,
    locator: Option<LocatorValue>,
    options: QueryOptions,
    filter_block: Option<FilterBlock>,
}

impl QueryBuilder {
    /// Names the selector. Without one the locator is auto-detected.
    #[must_use]
    pub fn selector(mut self, name: impl Into<String>) -> Self {
        self.selector = Some(name.into());
        self
    }

    /// Sets the locator.
    #[must_use]
    pub fn locator(mut self, locator: impl IntoLocator) -> Self {
        self.locator = locator.into_locator();
        self
    }

    /// Sets the options.
    #[must_use]
    pub fn options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets a predicate run after every other filter.
    #[must_use]
    pub fn filter_block<F>(mut self, block: F) -> Self
    where
        F: Fn(&Element) -> Result<bool> + Send + Sync + 'static,
    {
        self.filter_block = Some(Arc::new(block));
        self
    }

    /// Validates the options and compiles the expression.
    ///
    /// # Errors
    ///
    /// See [`SelectorQuery::new`].
    pub fn build(self, config: &SessionOptions) -> Result<SelectorQuery> {
        let Self {
            selector,
            locator,
            options,
            filter_block,
        } = self;

        let definition = registry::resolve(
            selector.as_deref(),
            locator.as_ref(),
            &config.default_selector,
        )?;
        if let Some(locator) = &locator {
            definition.validate_locator(locator)?;
        }

        let override_set = match options.get("filter_set") {
            None => None,
            Some(value) => {
                let name = value.as_str().ok_or_else(|| {
                    Error::invalid_value("filter_set", value.inspect(), "expected a filter set name")
                })?;
                Some(filter_set::get(name)?)
            }
        };

        assert_valid_keys(&definition, override_set.as_deref(), &options)?;

        let match_policy = parse_match(&options, config)?;
        let visibility = parse_visibility(&definition, &options, config)?;
        let wait = parse_wait(&options, config)?;
        let counts = CountOptions::from_options(&options)?;

        let exact = if definition.supports_exact() {
            match options.get("exact") {
                None => config.exact,
                Some(value) => value.as_bool().ok_or_else(|| {
                    Error::invalid_value("exact", value.inspect(), "expected true or false")
                })?,
            }
        } else {
            if options.contains("exact") {
                warn!(
                    selector = %definition.name(),
                    "The exact option only affects XPath queries using `is`; ignored"
                );
            }
            false
        };

        let exact_text = options
            .get("exact_text")
            .cloned()
            .unwrap_or(FilterValue::Bool(config.exact_text));

        let expression = {
            let input = ExpressionInput::new(locator.as_ref(), &options, config);
            let mut expression = definition.compile(&input)?;
            if let Some(set) = &override_set {
                for filter in set.expression_filters().filter(|f| f.applies_to(definition.format())) {
                    let Some(value) = options.get(filter.name()).or(filter.default_value()) else {
                        continue;
                    };
                    if let FilterOutcome::Applied(narrowed) =
                        filter.apply_expression(expression.clone(), value)?
                    {
                        expression = narrowed;
                    }
                }
            }
            apply_id_and_class(expression, &definition, &options)
        };

        let node_filters: Vec<Filter> = match &override_set {
            Some(set) => set
                .node_filters()
                .filter(|f| f.applies_to(definition.format()))
                .cloned()
                .collect(),
            None => definition.node_filters().cloned().collect(),
        };

        trace!(
            selector = %definition.name(),
            expression = %expression.render(exact),
            "Query compiled"
        );

        Ok(SelectorQuery {
            inner: Arc::new(QueryInner {
                selector: definition,
                locator,
                options,
                expression,
                node_filters,
                counts,
                visibility,
                exact,
                exact_text,
                match_policy,
                wait,
                filter_block,
            }),
        })
    }
}

// ============================================================================
// Option Resolution
// ============================================================================

fn assert_valid_keys(
    definition: &SelectorDefinition,
    override_set: Option<&filter_set::FilterSet>,
    options: &QueryOptions,
) -> Result<()> {
    let mut valid: Vec<&str> = VALID_KEYS.to_vec();
    valid.extend(definition.custom_keys());
    if let Some(set) = override_set {
        valid.extend(set.filters().iter().map(Filter::name));
    }

    let invalid: Vec<&str> = options.keys().filter(|key| !valid.contains(key)).collect();
    if invalid.is_empty() {
        return Ok(());
    }

    let mut seen = Vec::new();
    valid.retain(|key| {
        let first = !seen.contains(key);
        seen.push(*key);
        first
    });
    Err(Error::invalid_option(invalid, valid))
}

fn parse_match(options: &QueryOptions, config: &SessionOptions) -> Result<MatchPolicy> {
    match options.get("match") {
        None => Ok(config.match_policy),
        Some(value) => match value.as_str() {
            Some(name) => MatchPolicy::from_str(name),
            None => Err(Error::invalid_value(
                "match",
                value.inspect(),
                "should be one of :first, :smart, :prefer_exact, :one",
            )),
        },
    }
}

fn parse_visibility(
    definition: &SelectorDefinition,
    options: &QueryOptions,
    config: &SessionOptions,
) -> Result<Visibility> {
    let Some(value) = options.get("visible") else {
        return Ok(definition.default_visibility(config.ignore_hidden_elements, options));
    };

    match value {
        FilterValue::Bool(true) => Ok(Visibility::Visible),
        FilterValue::Bool(false) => Ok(Visibility::All),
        other => match other.as_str() {
            Some("visible") => Ok(Visibility::Visible),
            Some("hidden") => Ok(Visibility::Hidden),
            Some("all") => Ok(Visibility::All),
            _ => Err(Error::invalid_value(
                "visible",
                other.inspect(),
                "should be true, false, :visible, :hidden or :all",
            )),
        },
    }
}

fn parse_wait(options: &QueryOptions, config: &SessionOptions) -> Result<Duration> {
    let seconds = match options.get("wait") {
        None | Some(FilterValue::Nil | FilterValue::Bool(true)) => {
            return Ok(config.default_max_wait_time);
        }
        Some(FilterValue::Bool(false)) => return Ok(Duration::ZERO),
        Some(FilterValue::Int(n)) => *n as f64,
        Some(FilterValue::Float(x)) => *x,
        Some(other) => {
            return Err(Error::invalid_value(
                "wait",
                other.inspect(),
                "expected seconds or a boolean",
            ));
        }
    };

    Duration::try_from_secs_f64(seconds).map_err(|_| {
        Error::invalid_value("wait", seconds.to_string(), "expected non-negative seconds")
    })
}

/// Applies `id`/`class` as expression conditions unless the selector
/// declares filters of those names.
fn apply_id_and_class(
    expression: Expression,
    definition: &SelectorDefinition,
    options: &QueryOptions,
) -> Expression {
    let id = options
        .get("id")
        .filter(|_| !definition.handles_option("id"));
    let class = options
        .get("class")
        .filter(|_| !definition.handles_option("class"));

    match expression {
        Expression::XPath(mut xpath) => {
            if let Some(id) = id {
                xpath = xpath.with_opt(XPathBuilder::attribute_conditions(&[("id", id)]));
            }
            if let Some(class) = class {
                xpath = xpath.with_opt(XPathBuilder::class_conditions(class));
            }
            Expression::XPath(xpath)
        }
        Expression::Css(mut css) => {
            if let Some(id) = id {
                css = CssBuilder::add_attribute_conditions(&css, &[("id", id)]);
            }
            if let Some(class) = class {
                css = CssBuilder::add_class_conditions(&css, class);
            }
            Expression::Css(css)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use regex::Regex;

    use super::*;

    fn config() -> SessionOptions {
        SessionOptions::new()
    }

    fn query(selector: &str, locator: Option<&str>, options: QueryOptions) -> Result<SelectorQuery> {
        SelectorQuery::new(Some(selector), locator.map(LocatorValue::from), options, &config())
    }

    #[test]
    fn test_unknown_option_rejected() {
        let err = query("button", Some("Go"), QueryOptions::new().filter("colour", "red")).unwrap_err();
        assert!(matches!(err, Error::InvalidOption { .. }));
        assert!(err.to_string().starts_with("invalid keys :colour, should be one of :count"));
    }

    #[test]
    fn test_selector_filters_are_valid_keys() {
        assert!(query("button", Some("Go"), QueryOptions::new().filter("disabled", true)).is_ok());
        assert!(query("field", None, QueryOptions::new().filter("checked", true)).is_ok());
    }

    #[test]
    fn test_filter_set_override_adds_keys() {
        let options = QueryOptions::new().filter_set("_field").filter("checked", true);
        assert!(query("css", Some("input"), options).is_ok());
    }

    #[test]
    fn test_invalid_match() {
        let err = query("css", Some("p"), QueryOptions::new().filter("match", FilterValue::symbol("best")))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidValue { .. }));
    }

    #[test]
    fn test_wait_resolution() {
        let default = config().default_max_wait_time;
        assert_eq!(query("css", Some("p"), QueryOptions::new()).unwrap().wait(), default);
        assert_eq!(query("css", Some("p"), QueryOptions::new().filter("wait", true)).unwrap().wait(), default);
        assert_eq!(query("css", Some("p"), QueryOptions::new().no_wait()).unwrap().wait(), Duration::ZERO);
        assert_eq!(
            query("css", Some("p"), QueryOptions::new().filter("wait", 1.5)).unwrap().wait(),
            Duration::from_millis(1500)
        );
    }

    #[test]
    fn test_visibility_resolution() {
        let visible = |options| query("css", Some("p"), options).unwrap().visible();
        assert_eq!(visible(QueryOptions::new()), Visibility::Visible);
        assert_eq!(visible(QueryOptions::new().filter("visible", false)), Visibility::All);
        assert_eq!(visible(QueryOptions::new().visible(Visibility::Hidden)), Visibility::Hidden);
    }

    #[test]
    fn test_css_ignores_exact() {
        let q = query("css", Some("p"), QueryOptions::new().exact(true)).unwrap();
        assert!(!q.exact());
    }

    #[test]
    fn test_exact_defaults_to_session() {
        let q = SelectorQuery::new(Some("button"), "Go", QueryOptions::new(), &config().with_exact(true)).unwrap();
        assert!(q.exact());
    }

    #[test]
    fn test_id_and_class_on_css() {
        let q = query("css", Some("a, b"), QueryOptions::new().id("main").class(vec!["x", "!y"])).unwrap();
        assert_eq!(q.css(), Some("a#main.x:not(.y), b#main.x:not(.y)"));
    }

    #[test]
    fn test_id_on_xpath() {
        let q = query("xpath", Some(".//p"), QueryOptions::new().id("intro")).unwrap();
        assert_eq!(q.xpath(None).unwrap(), "(.//p)[(@id = 'intro')]");
    }

    #[test]
    fn test_description() {
        let q = query("button", Some("Submit"), QueryOptions::new().filter("disabled", false)).unwrap();
        assert_eq!(q.description(), "visible button \"Submit\" that is not disabled");

        let q = query(
            "css",
            Some("p"),
            QueryOptions::new()
                .text("Hello")
                .id("intro")
                .class(vec!["a", "b"])
                .visible(Visibility::All),
        )
        .unwrap();
        assert_eq!(q.description(), "css \"p\" with text \"Hello\" with id intro with classes [a,b]");
    }

    #[test]
    fn test_description_with_block_and_no_locator() {
        let q = SelectorQuery::builder()
            .selector("link")
            .filter_block(|_| Ok(true))
            .build(&config())
            .unwrap();
        assert_eq!(q.description(), "visible link nil that also matches the custom filter block");
    }

    #[test]
    fn test_failure_messages() {
        let q = query("css", Some("li"), QueryOptions::new().count(2)).unwrap();
        assert_eq!(q.failure_message(), "expected to find visible css \"li\" 2 times");
        assert_eq!(q.negative_failure_message(), "expected not to find visible css \"li\" 2 times");
    }

    #[test]
    fn test_locator_kind_validated() {
        let err = SelectorQuery::new(Some("button"), vec!["a", "b"], QueryOptions::new(), &config()).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_autodetect_xpath() {
        let q = SelectorQuery::new(None, "//p", QueryOptions::new(), &config()).unwrap();
        assert_eq!(q.selector().name(), "xpath");
        let q = SelectorQuery::new(None, "p.intro", QueryOptions::new(), &config()).unwrap();
        assert_eq!(q.selector().name(), "css");
    }

    #[test]
    fn test_with_counts_replaces_count_keys() {
        let q = query("css", Some("p"), QueryOptions::new().count(3)).unwrap();
        let relaxed = q.with_counts(&QueryOptions::new().minimum(1)).unwrap();
        assert!(relaxed.matches_count(5));
        assert!(!q.matches_count(5));
    }

    #[test]
    fn test_pattern_id_prefilter() {
        let q = query("xpath", Some(".//p"), QueryOptions::new().id(Regex::new("intro-\\d").unwrap())).unwrap();
        assert_eq!(q.xpath(None).unwrap(), "(.//p)[@id[contains(., 'intro-')]]");
    }
}
