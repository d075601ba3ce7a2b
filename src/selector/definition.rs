//! Selector definitions.
//!
//! A [`SelectorDefinition`] compiles a locator and options into an
//! [`Expression`] in its one declared format and carries the filters that
//! narrow the resolved candidates. Definitions are assembled with
//! [`SelectorBuilder`] and registered once at startup.
//!
//! # Example
//!
//! ```ignore
//! use locator_engine::selector::{self, FilterOptions, SelectorBuilder};
//! use locator_engine::XPath;
//!
//! let heading = SelectorBuilder::new("heading")
//!     .xpath(|input| {
//!         let xpath = XPath::descendant(&["h1", "h2", "h3"]);
//!         Ok(match input.locator_text() {
//!             Some(text) => xpath.with(XPath::string().normalize().is(text)),
//!             None => xpath,
//!         })
//!     })
//!     .build()?;
//!
//! selector::add(heading)?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use super::filter::{Filter, FilterOptions, FilterOutcome, LocatorFilter};
use super::filter_set::{self, FilterSet, FilterSetBuilder};
use crate::config::{SessionOptions, Visibility};
use crate::error::{Error, Result};
use crate::expression::{Expression, ExpressionFormat, XPath};
use crate::node::Element;
use crate::value::{FilterValue, LocatorKind, LocatorValue, QueryOptions};

// ============================================================================
// Types
// ============================================================================

/// Inputs of an expression builder.
#[derive(Debug, Clone, Copy)]
pub struct ExpressionInput<'a> {
    /// The locator, if one was given.
    pub locator: Option<&'a LocatorValue>,
    /// Query options.
    pub options: &'a QueryOptions,
    /// Session defaults.
    pub config: &'a SessionOptions,
}

impl<'a> ExpressionInput<'a> {
    /// Creates builder inputs.
    #[inline]
    #[must_use]
    pub fn new(
        locator: Option<&'a LocatorValue>,
        options: &'a QueryOptions,
        config: &'a SessionOptions,
    ) -> Self {
        Self {
            locator,
            options,
            config,
        }
    }

    /// Returns the locator as plain text.
    #[must_use]
    pub fn locator_text(&self) -> Option<String> {
        self.locator.map(ToString::to_string)
    }

    /// Returns an option value.
    #[inline]
    #[must_use]
    pub fn option(&self, name: &str) -> Option<&'a FilterValue> {
        self.options.get(name)
    }
}

/// XPath expression builder.
pub type XPathFn = Arc<dyn Fn(&ExpressionInput<'_>) -> Result<XPath> + Send + Sync>;

/// CSS expression builder.
pub type CssFn = Arc<dyn Fn(&ExpressionInput<'_>) -> Result<String> + Send + Sync>;

/// Default visibility hook.
pub type VisibilityFn = Arc<dyn Fn(&QueryOptions) -> Option<Visibility> + Send + Sync>;

/// Auto-detection predicate.
pub type LocatorMatchFn = Arc<dyn Fn(&LocatorValue) -> bool + Send + Sync>;

/// The single expression builder of a definition.
#[derive(Clone)]
pub enum ExpressionFn {
    /// Emits CSS.
    Css(CssFn),
    /// Emits XPath.
    XPath(XPathFn),
}

impl ExpressionFn {
    /// Returns the emitted format.
    #[inline]
    #[must_use]
    pub fn format(&self) -> ExpressionFormat {
        match self {
            Self::Css(_) => ExpressionFormat::Css,
            Self::XPath(_) => ExpressionFormat::XPath,
        }
    }
}

// ============================================================================
// SelectorDefinition
// ============================================================================

/// A named strategy for compiling locators into expressions.
#[derive(Clone)]
pub struct SelectorDefinition {
    name: String,
    label: Option<String>,
    expression: ExpressionFn,
    expression_options: Vec<String>,
    filter_set: FilterSet,
    default_visibility: Option<VisibilityFn>,
    locator_match: Option<LocatorMatchFn>,
    locator_types: Option<Vec<LocatorKind>>,
    locator_filter: Option<LocatorFilter>,
    supports_exact: Option<bool>,
}

impl SelectorDefinition {
    /// Starts building a definition.
    #[inline]
    pub fn builder(name: impl Into<String>) -> SelectorBuilder {
        SelectorBuilder::new(name)
    }

    /// Returns the registry name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the label used in descriptions.
    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Returns the expression format.
    #[inline]
    #[must_use]
    pub fn format(&self) -> ExpressionFormat {
        self.expression.format()
    }

    /// Returns `true` if the `exact` option changes the expression.
    #[inline]
    #[must_use]
    pub fn supports_exact(&self) -> bool {
        self.supports_exact
            .unwrap_or(self.format() == ExpressionFormat::XPath)
    }

    /// Returns the filters of this definition.
    #[inline]
    #[must_use]
    pub fn filter_set(&self) -> &FilterSet {
        &self.filter_set
    }

    /// Iterates node filters applicable to this definition's format.
    pub fn node_filters(&self) -> impl Iterator<Item = &Filter> {
        let format = self.format();
        self.filter_set
            .node_filters()
            .filter(move |f| f.applies_to(format))
    }

    /// Iterates expression filters applicable to this definition's format.
    pub fn expression_filters(&self) -> impl Iterator<Item = &Filter> {
        let format = self.format();
        self.filter_set
            .expression_filters()
            .filter(move |f| f.applies_to(format))
    }

    /// Returns the option names consumed by the expression builder itself.
    #[inline]
    #[must_use]
    pub fn expression_options(&self) -> &[String] {
        &self.expression_options
    }

    /// Returns the option names this definition handles.
    #[must_use]
    pub fn custom_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        let names = self
            .filter_set
            .filters()
            .iter()
            .map(Filter::name)
            .chain(self.expression_options.iter().map(String::as_str));
        for name in names {
            if !keys.contains(&name) {
                keys.push(name);
            }
        }
        keys
    }

    /// Returns `true` if `name` is a filter or builder option of this definition.
    #[must_use]
    pub fn handles_option(&self, name: &str) -> bool {
        self.filter_set.handles(name) || self.expression_options.iter().any(|o| o == name)
    }

    /// Returns the locator filter, if it applies to this definition's format.
    #[must_use]
    pub fn locator_filter(&self) -> Option<&LocatorFilter> {
        self.locator_filter
            .as_ref()
            .filter(|f| f.applies_to(self.format()))
    }

    /// Returns the accepted locator kinds, if restricted.
    #[inline]
    #[must_use]
    pub fn locator_types(&self) -> Option<&[LocatorKind]> {
        self.locator_types.as_deref()
    }

    /// Checks `locator` against the accepted locator kinds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] for a locator of the wrong kind.
    pub fn validate_locator(&self, locator: &LocatorValue) -> Result<()> {
        match &self.locator_types {
            Some(kinds) if !kinds.contains(&locator.kind()) => Err(Error::invalid_value(
                "locator",
                locator.inspect(),
                format!("{kinds:?} for selector :{}", self.name),
            )),
            _ => Ok(()),
        }
    }

    /// Returns `true` if this definition claims an untyped locator.
    #[must_use]
    pub fn matches_locator(&self, locator: &LocatorValue) -> bool {
        self.locator_match
            .as_ref()
            .is_some_and(|matches| matches(locator))
    }

    /// Resolves the default visibility for `options`.
    ///
    /// The definition's hook wins; otherwise `ignore_hidden` selects
    /// visible-only or all.
    #[must_use]
    pub fn default_visibility(&self, ignore_hidden: bool, options: &QueryOptions) -> Visibility {
        self.default_visibility
            .as_ref()
            .and_then(|hook| hook(options))
            .unwrap_or(if ignore_hidden {
                Visibility::Visible
            } else {
                Visibility::All
            })
    }

    /// Runs the expression builder alone, without expression filters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FormatMismatch`] if `format` is given and differs
    /// from the declared one, or whatever the builder reports.
    pub fn expression_for(
        &self,
        format: Option<ExpressionFormat>,
        input: &ExpressionInput<'_>,
    ) -> Result<Expression> {
        if let Some(format) = format
            && format != self.format()
        {
            return Err(Error::format_mismatch(&self.name, format));
        }

        match &self.expression {
            ExpressionFn::Css(build) => build(input).map(Expression::Css),
            ExpressionFn::XPath(build) => build(input).map(Expression::XPath),
        }
    }

    /// Builds the expression and applies expression filters in declaration
    /// order. Absent options apply the filter default, if there is one.
    ///
    /// # Errors
    ///
    /// Propagates builder and filter errors.
    pub fn compile(&self, input: &ExpressionInput<'_>) -> Result<Expression> {
        let mut expression = self.expression_for(None, input)?;

        for filter in self.expression_filters() {
            let value = match input.options.get(filter.name()) {
                Some(value) => value,
                None => match filter.default_value() {
                    Some(default) => default,
                    None => continue,
                },
            };

            match filter.apply_expression(expression.clone(), value)? {
                FilterOutcome::Applied(narrowed) => {
                    trace!(selector = %self.name, filter = %filter.name(), "Expression filter applied");
                    expression = narrowed;
                }
                FilterOutcome::Skipped => {}
            }
        }

        Ok(expression)
    }

    /// Describes the filters active for `options`.
    #[must_use]
    pub fn describe(&self, options: &QueryOptions) -> String {
        self.filter_set.description(options)
    }

    /// Reopens this definition for modification.
    #[must_use]
    pub fn to_builder(&self) -> SelectorBuilder {
        let mut filters = FilterSetBuilder::new(&self.name);
        for filter in self.filter_set.filters() {
            filters = filters.filter(filter.clone());
        }
        for describer in self.filter_set.descriptions() {
            let describer = Arc::clone(describer);
            filters = filters.describe(move |options| describer(options));
        }

        SelectorBuilder {
            name: self.name.clone(),
            label: self.label.clone(),
            expression: Some(self.expression.clone()),
            expression_options: self.expression_options.clone(),
            filters,
            default_visibility: self.default_visibility.clone(),
            locator_match: self.locator_match.clone(),
            locator_types: self.locator_types.clone(),
            locator_filter: self.locator_filter.clone(),
            supports_exact: self.supports_exact,
            error: None,
        }
    }
}

impl fmt::Debug for SelectorDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectorDefinition")
            .field("name", &self.name)
            .field("label", &self.label())
            .field("format", &self.format())
            .field("filters", &self.filter_set)
            .field("expression_options", &self.expression_options)
            .field("locator_types", &self.locator_types)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SelectorBuilder
// ============================================================================

/// Builder for [`SelectorDefinition`].
pub struct SelectorBuilder {
    name: String,
    label: Option<String>,
    expression: Option<ExpressionFn>,
    expression_options: Vec<String>,
    filters: FilterSetBuilder,
    default_visibility: Option<VisibilityFn>,
    locator_match: Option<LocatorMatchFn>,
    locator_types: Option<Vec<LocatorKind>>,
    locator_filter: Option<LocatorFilter>,
    supports_exact: Option<bool>,
    error: Option<Error>,
}

impl SelectorBuilder {
    /// Creates a builder for a selector named `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            filters: FilterSetBuilder::new(&name),
            name,
            label: None,
            expression: None,
            expression_options: Vec::new(),
            default_visibility: None,
            locator_match: None,
            locator_types: None,
            locator_filter: None,
            supports_exact: None,
            error: None,
        }
    }

    /// Sets the label used in descriptions.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets an XPath expression builder, replacing any previous builder.
    #[must_use]
    pub fn xpath<F>(mut self, build: F) -> Self
    where
        F: Fn(&ExpressionInput<'_>) -> Result<XPath> + Send + Sync + 'static,
    {
        self.expression = Some(ExpressionFn::XPath(Arc::new(build)));
        self
    }

    /// Sets a CSS expression builder, replacing any previous builder.
    #[must_use]
    pub fn css<F>(mut self, build: F) -> Self
    where
        F: Fn(&ExpressionInput<'_>) -> Result<String> + Send + Sync + 'static,
    {
        self.expression = Some(ExpressionFn::Css(Arc::new(build)));
        self
    }

    /// Declares option names the expression builder reads directly.
    #[must_use]
    pub fn expression_options(mut self, names: &[&str]) -> Self {
        for name in names {
            if !self.expression_options.iter().any(|o| o == name) {
                self.expression_options.push((*name).to_string());
            }
        }
        self
    }

    /// Adds a node filter.
    #[must_use]
    pub fn node_filter<F>(mut self, name: &str, options: FilterOptions, predicate: F) -> Self
    where
        F: Fn(&Element, &FilterValue, &mut Vec<String>) -> Result<bool> + Send + Sync + 'static,
    {
        self.filters = self.filters.node_filter(name, options, predicate);
        self
    }

    /// Adds an expression filter.
    #[must_use]
    pub fn expression_filter<F>(mut self, name: &str, options: FilterOptions, transform: F) -> Self
    where
        F: Fn(Expression, &FilterValue) -> Result<Expression> + Send + Sync + 'static,
    {
        self.filters = self.filters.expression_filter(name, options, transform);
        self
    }

    /// Adds a prepared filter.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters = self.filters.filter(filter);
        self
    }

    /// Adds a description fragment.
    #[must_use]
    pub fn describe<F>(mut self, describer: F) -> Self
    where
        F: Fn(&QueryOptions) -> Option<String> + Send + Sync + 'static,
    {
        self.filters = self.filters.describe(describer);
        self
    }

    /// Imports filters from a registered filter set.
    ///
    /// With `only`, just the named filters are imported. Description
    /// fragments are always imported. An unknown set is reported by
    /// [`build`](Self::build).
    #[must_use]
    pub fn filter_set(mut self, name: &str, only: Option<&[&str]>) -> Self {
        let set = match filter_set::get(name) {
            Ok(set) => set,
            Err(e) => {
                self.error.get_or_insert(e);
                return self;
            }
        };

        for filter in set.filters() {
            if only.is_none_or(|names| names.contains(&filter.name())) {
                self.filters = self.filters.filter(filter.clone());
            }
        }
        for describer in set.descriptions() {
            let describer = Arc::clone(describer);
            self.filters = self.filters.describe(move |options| describer(options));
        }
        self
    }

    /// Restricts accepted locator kinds.
    #[must_use]
    pub fn locator_types(mut self, kinds: &[LocatorKind]) -> Self {
        self.locator_types = Some(kinds.to_vec());
        self
    }

    /// Sets the locator filter.
    #[must_use]
    pub fn locator_filter(mut self, filter: LocatorFilter) -> Self {
        self.locator_filter = Some(filter);
        self
    }

    /// Sets the default visibility hook.
    #[must_use]
    pub fn default_visibility<F>(mut self, hook: F) -> Self
    where
        F: Fn(&QueryOptions) -> Option<Visibility> + Send + Sync + 'static,
    {
        self.default_visibility = Some(Arc::new(hook));
        self
    }

    /// Sets the auto-detection predicate.
    #[must_use]
    pub fn match_locator<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&LocatorValue) -> bool + Send + Sync + 'static,
    {
        self.locator_match = Some(Arc::new(predicate));
        self
    }

    /// Overrides exactness support.
    #[must_use]
    pub fn supports_exact(mut self, supported: bool) -> Self {
        self.supports_exact = Some(supported);
        self
    }

    /// Builds the definition.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no expression builder was set or an
    /// imported filter set is unknown.
    pub fn build(self) -> Result<SelectorDefinition> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if self.name.trim().is_empty() {
            return Err(Error::config("selector name must not be empty"));
        }
        let Some(expression) = self.expression else {
            return Err(Error::config(format!(
                "selector :{} has no expression builder",
                self.name
            )));
        };

        Ok(SelectorDefinition {
            name: self.name,
            label: self.label,
            expression,
            expression_options: self.expression_options,
            filter_set: self.filters.build(),
            default_visibility: self.default_visibility,
            locator_match: self.locator_match,
            locator_types: self.locator_types,
            locator_filter: self.locator_filter,
            supports_exact: self.supports_exact,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
