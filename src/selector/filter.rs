//! Named filters.
//!
//! A filter is either a node predicate evaluated against resolved candidates
//! or an expression transform applied while the query expression is built.
//! Both share value validation: a skip sentinel, a default and an optional
//! set of accepted values.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::error::Result;
use crate::expression::{Expression, ExpressionFormat};
use crate::node::Element;
use crate::value::{FilterValue, LocatorValue};

// ============================================================================
// Types
// ============================================================================

/// Node predicate: `(candidate, value, errors) -> matches`.
///
/// Push a human readable reason onto `errors` when rejecting a candidate.
pub type NodePredicate =
    Arc<dyn Fn(&Element, &FilterValue, &mut Vec<String>) -> Result<bool> + Send + Sync>;

/// Expression transform: `(expression, value) -> narrowed expression`.
pub type ExpressionTransform =
    Arc<dyn Fn(Expression, &FilterValue) -> Result<Expression> + Send + Sync>;

/// Locator predicate: `(candidate, locator, exact) -> matches`.
pub type LocatorPredicate =
    Arc<dyn Fn(&Element, &LocatorValue, bool) -> Result<bool> + Send + Sync>;

/// Result of applying a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOutcome<T> {
    /// The filter did not run (skip sentinel or unusable value).
    Skipped,
    /// The filter ran and produced a result.
    Applied(T),
}

impl<T> FilterOutcome<T> {
    /// Returns the applied result or `skipped`.
    #[inline]
    pub fn unwrap_or(self, skipped: T) -> T {
        match self {
            Self::Skipped => skipped,
            Self::Applied(value) => value,
        }
    }

    /// Returns `true` if the filter did not run.
    #[inline]
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }
}

/// What a filter operates on.
#[derive(Clone)]
pub enum FilterKind {
    /// Post-hoc predicate over candidates.
    Node(NodePredicate),
    /// Transform applied while building the expression.
    Expression(ExpressionTransform),
}

impl fmt::Debug for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(_) => f.write_str("Node"),
            Self::Expression(_) => f.write_str("Expression"),
        }
    }
}

// ============================================================================
// FilterOptions
// ============================================================================

/// Value handling of a filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOptions {
    /// Accepts only `true`/`false`.
    pub boolean: bool,

    /// Value used when the option is absent or invalid.
    pub default: Option<FilterValue>,

    /// Value that turns the filter into a no-op.
    pub skip_if: Option<FilterValue>,

    /// Accepted values; anything else is invalid.
    pub valid_values: Option<Vec<FilterValue>>,

    /// Only applies to selectors of this format.
    pub format: Option<ExpressionFormat>,
}

impl FilterOptions {
    /// Creates options accepting any value.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options accepting only booleans.
    #[inline]
    #[must_use]
    pub fn boolean() -> Self {
        Self {
            boolean: true,
            ..Self::default()
        }
    }

    /// Sets the default value.
    #[inline]
    #[must_use]
    pub fn with_default(mut self, value: impl Into<FilterValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Sets the skip sentinel.
    #[inline]
    #[must_use]
    pub fn with_skip_if(mut self, value: impl Into<FilterValue>) -> Self {
        self.skip_if = Some(value.into());
        self
    }

    /// Restricts accepted values.
    #[inline]
    #[must_use]
    pub fn with_valid_values(mut self, values: Vec<FilterValue>) -> Self {
        self.valid_values = Some(values);
        self
    }

    /// Restricts the filter to one expression format.
    #[inline]
    #[must_use]
    pub fn with_format(mut self, format: ExpressionFormat) -> Self {
        self.format = Some(format);
        self
    }
}

// ============================================================================
// Filter
// ============================================================================

/// A named node or expression filter.
#[derive(Debug, Clone)]
pub struct Filter {
    name: String,
    kind: FilterKind,
    options: FilterOptions,
}

impl Filter {
    /// Creates a node filter.
    pub fn node<F>(name: impl Into<String>, options: FilterOptions, predicate: F) -> Self
    where
        F: Fn(&Element, &FilterValue, &mut Vec<String>) -> Result<bool> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind: FilterKind::Node(Arc::new(predicate)),
            options,
        }
    }

    /// Creates an expression filter.
    pub fn expression<F>(name: impl Into<String>, options: FilterOptions, transform: F) -> Self
    where
        F: Fn(Expression, &FilterValue) -> Result<Expression> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind: FilterKind::Expression(Arc::new(transform)),
            options,
        }
    }

    /// Returns the filter name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the filter kind.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &FilterKind {
        &self.kind
    }

    /// Returns the value options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    /// Returns `true` for node filters.
    #[inline]
    #[must_use]
    pub fn is_node_filter(&self) -> bool {
        matches!(self.kind, FilterKind::Node(_))
    }

    /// Returns `true` for expression filters.
    #[inline]
    #[must_use]
    pub fn is_expression_filter(&self) -> bool {
        matches!(self.kind, FilterKind::Expression(_))
    }

    /// Returns the default value, if any.
    #[inline]
    #[must_use]
    pub fn default_value(&self) -> Option<&FilterValue> {
        self.options.default.as_ref()
    }

    /// Returns `true` if the filter applies to selectors of `format`.
    #[inline]
    #[must_use]
    pub fn applies_to(&self, format: ExpressionFormat) -> bool {
        self.options.format.is_none_or(|f| f == format)
    }

    /// Returns `true` if `value` is the skip sentinel.
    #[must_use]
    pub fn skips(&self, value: &FilterValue) -> bool {
        self.options.skip_if.as_ref().is_some_and(|skip| skip == value)
    }

    /// Returns `true` if `value` is acceptable.
    #[must_use]
    pub fn accepts(&self, value: &FilterValue) -> bool {
        if self.options.boolean && value.as_bool().is_none() {
            return false;
        }
        match &self.options.valid_values {
            Some(valid) => valid.iter().any(|candidate| value_matches(candidate, value)),
            None => true,
        }
    }

    /// Resolves the value the filter should run with.
    ///
    /// Returns `None` when the filter must be skipped: the value is the skip
    /// sentinel, or it is invalid and there is no default to fall back to.
    /// Invalid values emit a warning.
    #[must_use]
    pub fn effective_value<'a>(&'a self, value: &'a FilterValue) -> Option<&'a FilterValue> {
        if self.skips(value) {
            return None;
        }
        if self.accepts(value) {
            return Some(value);
        }

        match &self.options.default {
            Some(default) => {
                warn!(
                    filter = %self.name,
                    value = %value.inspect(),
                    default = %default.inspect(),
                    "Invalid filter value, using default"
                );
                Some(default)
            }
            None => {
                warn!(
                    filter = %self.name,
                    value = %value.inspect(),
                    "Invalid filter value, skipping filter"
                );
                None
            }
        }
    }

    /// Applies a node filter to `node`.
    ///
    /// Expression filters are never node-applied and report `Skipped`.
    ///
    /// # Errors
    ///
    /// Propagates errors raised by the predicate.
    pub fn apply_node(
        &self,
        node: &Element,
        value: &FilterValue,
        errors: &mut Vec<String>,
    ) -> Result<FilterOutcome<bool>> {
        let FilterKind::Node(predicate) = &self.kind else {
            return Ok(FilterOutcome::Skipped);
        };
        match self.effective_value(value) {
            Some(value) => predicate(node, value, errors).map(FilterOutcome::Applied),
            None => Ok(FilterOutcome::Skipped),
        }
    }

    /// Applies an expression filter to `expression`.
    ///
    /// # Errors
    ///
    /// Propagates errors raised by the transform.
    pub fn apply_expression(
        &self,
        expression: Expression,
        value: &FilterValue,
    ) -> Result<FilterOutcome<Expression>> {
        let FilterKind::Expression(transform) = &self.kind else {
            return Ok(FilterOutcome::Skipped);
        };
        match self.effective_value(value) {
            Some(value) => transform(expression, value).map(FilterOutcome::Applied),
            None => Ok(FilterOutcome::Skipped),
        }
    }
}

/// Membership test for valid values: patterns match text, ranges contain
/// integers, everything else compares by equality.
fn value_matches(candidate: &FilterValue, value: &FilterValue) -> bool {
    match (candidate, value) {
        (FilterValue::Pattern(re), FilterValue::Text(text) | FilterValue::Symbol(text)) => {
            re.is_match(text)
        }
        (FilterValue::Range(lo, hi), FilterValue::Int(_)) => value
            .as_usize()
            .is_some_and(|n| (*lo..=*hi).contains(&n)),
        _ => candidate == value,
    }
}

// ============================================================================
// LocatorFilter
// ============================================================================

/// Node predicate fed the query locator.
#[derive(Clone)]
pub struct LocatorFilter {
    predicate: LocatorPredicate,
    format: Option<ExpressionFormat>,
}

impl LocatorFilter {
    /// Creates a locator filter.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Element, &LocatorValue, bool) -> Result<bool> + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
            format: None,
        }
    }

    /// Restricts the filter to one expression format.
    #[must_use]
    pub fn with_format(mut self, format: ExpressionFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Returns `true` if the filter applies to selectors of `format`.
    #[inline]
    #[must_use]
    pub fn applies_to(&self, format: ExpressionFormat) -> bool {
        self.format.is_none_or(|f| f == format)
    }

    /// Applies the filter. Without a locator the filter is skipped.
    ///
    /// # Errors
    ///
    /// Propagates errors raised by the predicate.
    pub fn apply(
        &self,
        node: &Element,
        locator: Option<&LocatorValue>,
        exact: bool,
    ) -> Result<FilterOutcome<bool>> {
        match locator {
            Some(locator) => (self.predicate)(node, locator, exact).map(FilterOutcome::Applied),
            None => Ok(FilterOutcome::Skipped),
        }
    }
}

impl fmt::Debug for LocatorFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocatorFilter")
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use regex::Regex;

    use super::*;
    use crate::expression::XPath;

    fn tagging_filter(options: FilterOptions) -> Filter {
        Filter::expression("tag", options, |expr, value| {
            let xpath = expr.as_xpath().cloned().unwrap_or_else(XPath::current);
            Ok(Expression::XPath(xpath.with(XPath::attr("data-tag").equals(value.to_text()))))
        })
    }

    fn base() -> Expression {
        Expression::XPath(XPath::descendant(&["div"]))
    }

    #[test]
    fn test_skip_sentinel_is_noop() {
        let filter = tagging_filter(FilterOptions::new().with_skip_if(FilterValue::all()));
        let outcome = filter.apply_expression(base(), &FilterValue::all()).unwrap();
        assert!(outcome.is_skipped());
    }

    #[test]
    fn test_applied_expression() {
        let filter = tagging_filter(FilterOptions::new());
        let outcome = filter.apply_expression(base(), &"x".into()).unwrap();
        let FilterOutcome::Applied(expr) = outcome else {
            panic!("expected applied");
        };
        assert_eq!(expr.render(false), ".//div[(@data-tag = 'x')]");
    }

    #[test]
    fn test_invalid_value_uses_default() {
        let filter = tagging_filter(
            FilterOptions::new()
                .with_valid_values(vec!["a".into(), "b".into()])
                .with_default("a"),
        );
        assert_eq!(filter.effective_value(&"zzz".into()), Some(&FilterValue::from("a")));
    }

    #[test]
    fn test_invalid_value_without_default_skips() {
        let filter = tagging_filter(FilterOptions::new().with_valid_values(vec!["a".into()]));
        let outcome = filter.apply_expression(base(), &"zzz".into()).unwrap();
        assert!(outcome.is_skipped());
    }

    #[test]
    fn test_boolean_rejects_text() {
        let filter = tagging_filter(FilterOptions::boolean());
        assert!(filter.accepts(&true.into()));
        assert!(!filter.accepts(&"yes".into()));
    }

    #[test]
    fn test_pattern_valid_values() {
        let filter = tagging_filter(
            FilterOptions::new().with_valid_values(vec![Regex::new("^h[1-6]$").unwrap().into()]),
        );
        assert!(filter.accepts(&"h2".into()));
        assert!(!filter.accepts(&"p".into()));
    }

    #[test]
    fn test_format_restriction() {
        let filter = tagging_filter(FilterOptions::new().with_format(ExpressionFormat::Css));
        assert!(filter.applies_to(ExpressionFormat::Css));
        assert!(!filter.applies_to(ExpressionFormat::XPath));
        assert!(filter.is_expression_filter());
    }
}
