//! Reusable filter bundles.
//!
//! A [`FilterSet`] groups filters and description fragments so several
//! selectors can share them. Sets live in a process-wide registry; the
//! built-in `_field` set is installed on first access.
//!
//! # Example
//!
//! ```ignore
//! use locator_engine::selector::{filter_set, FilterOptions, FilterSet};
//!
//! let set = FilterSet::builder("_state")
//!     .node_filter("checked", FilterOptions::boolean(), |node, value, _| {
//!         Ok(value.as_bool() == Some(node.is_checked()?))
//!     })
//!     .describe(|options| {
//!         (options.get("checked")?.as_bool()?).then(|| " that is checked".to_string())
//!     })
//!     .build();
//!
//! filter_set::add(set)?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::debug;

use super::builtin;
use super::filter::{Filter, FilterOptions};
use super::registry::ensure_open;
use crate::error::{Error, Result};
use crate::expression::Expression;
use crate::node::Element;
use crate::value::{FilterValue, QueryOptions};

// ============================================================================
// Types
// ============================================================================

/// Description fragment: receives the query options merged with filter
/// defaults and returns text to append, if any.
pub type Describer = Arc<dyn Fn(&QueryOptions) -> Option<String> + Send + Sync>;

/// Process-wide filter set registry.
static FILTER_SETS: LazyLock<RwLock<FxHashMap<String, Arc<FilterSet>>>> = LazyLock::new(|| {
    let mut sets = FxHashMap::default();
    for set in builtin::filter_sets() {
        sets.insert(set.name().to_string(), Arc::new(set));
    }
    RwLock::new(sets)
});

// ============================================================================
// FilterSet
// ============================================================================

/// A named bundle of filters and description fragments.
#[derive(Clone)]
pub struct FilterSet {
    name: String,
    filters: Vec<Filter>,
    descriptions: Vec<Describer>,
}

impl FilterSet {
    /// Starts building a filter set.
    #[inline]
    pub fn builder(name: impl Into<String>) -> FilterSetBuilder {
        FilterSetBuilder::new(name)
    }

    /// Returns the set name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns all filters in declaration order.
    #[inline]
    #[must_use]
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Returns the first filter named `name`.
    #[must_use]
    pub fn filter(&self, name: &str) -> Option<&Filter> {
        self.filters.iter().find(|f| f.name() == name)
    }

    /// Returns the node filter named `name`.
    #[must_use]
    pub fn node_filter(&self, name: &str) -> Option<&Filter> {
        self.node_filters().find(|f| f.name() == name)
    }

    /// Returns the expression filter named `name`.
    #[must_use]
    pub fn expression_filter(&self, name: &str) -> Option<&Filter> {
        self.expression_filters().find(|f| f.name() == name)
    }

    /// Returns `true` if any filter is named `name`.
    #[inline]
    #[must_use]
    pub fn handles(&self, name: &str) -> bool {
        self.filter(name).is_some()
    }

    /// Iterates node filters in declaration order.
    pub fn node_filters(&self) -> impl Iterator<Item = &Filter> {
        self.filters.iter().filter(|f| f.is_node_filter())
    }

    /// Iterates expression filters in declaration order.
    pub fn expression_filters(&self) -> impl Iterator<Item = &Filter> {
        self.filters.iter().filter(|f| f.is_expression_filter())
    }

    /// Returns the description fragments.
    #[inline]
    #[must_use]
    pub fn descriptions(&self) -> &[Describer] {
        &self.descriptions
    }

    /// Returns `options` with defaults filled in for absent filters.
    #[must_use]
    pub fn options_with_defaults(&self, options: &QueryOptions) -> QueryOptions {
        let mut merged = options.clone();
        for filter in &self.filters {
            if let Some(default) = filter.default_value()
                && !merged.contains(filter.name())
            {
                merged.set(filter.name(), default.clone());
            }
        }
        merged
    }

    /// Concatenates every description fragment for `options`.
    #[must_use]
    pub fn description(&self, options: &QueryOptions) -> String {
        let options = self.options_with_defaults(options);
        self.descriptions
            .iter()
            .filter_map(|describe| describe(&options))
            .collect()
    }
}

impl fmt::Debug for FilterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterSet")
            .field("name", &self.name)
            .field("filters", &self.filters.iter().map(Filter::name).collect::<Vec<_>>())
            .field("descriptions", &self.descriptions.len())
            .finish()
    }
}

// ============================================================================
// FilterSetBuilder
// ============================================================================

/// Builder for [`FilterSet`].
pub struct FilterSetBuilder {
    name: String,
    filters: Vec<Filter>,
    descriptions: Vec<Describer>,
}

impl FilterSetBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filters: Vec::new(),
            descriptions: Vec::new(),
        }
    }

    /// Adds a node filter.
    #[must_use]
    pub fn node_filter<F>(self, name: &str, options: FilterOptions, predicate: F) -> Self
    where
        F: Fn(&Element, &FilterValue, &mut Vec<String>) -> Result<bool> + Send + Sync + 'static,
    {
        self.filter(Filter::node(name, options, predicate))
    }

    /// Adds an expression filter.
    #[must_use]
    pub fn expression_filter<F>(self, name: &str, options: FilterOptions, transform: F) -> Self
    where
        F: Fn(Expression, &FilterValue) -> Result<Expression> + Send + Sync + 'static,
    {
        self.filter(Filter::expression(name, options, transform))
    }

    /// Adds a filter, replacing one of the same name and kind.
    ///
    /// A node filter and an expression filter may share a name: the
    /// expression narrows the search and the node filter checks what the
    /// expression cannot.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        let same = |f: &&mut Filter| {
            f.name() == filter.name() && f.is_node_filter() == filter.is_node_filter()
        };
        match self.filters.iter_mut().find(same) {
            Some(existing) => *existing = filter,
            None => self.filters.push(filter),
        }
        self
    }

    /// Adds a description fragment.
    #[must_use]
    pub fn describe<F>(mut self, describer: F) -> Self
    where
        F: Fn(&QueryOptions) -> Option<String> + Send + Sync + 'static,
    {
        self.descriptions.push(Arc::new(describer));
        self
    }

    /// Builds the filter set.
    #[must_use]
    pub fn build(self) -> FilterSet {
        FilterSet {
            name: self.name,
            filters: self.filters,
            descriptions: self.descriptions,
        }
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Registers a filter set, replacing one of the same name.
///
/// # Errors
///
/// Returns [`Error::Config`] after [`freeze`](super::freeze).
pub fn add(set: FilterSet) -> Result<()> {
    ensure_open()?;
    debug!(filter_set = %set.name(), filters = set.filters().len(), "Filter set registered");
    FILTER_SETS
        .write()
        .insert(set.name().to_string(), Arc::new(set));
    Ok(())
}

/// Returns the filter set named `name`.
///
/// # Errors
///
/// Returns [`Error::Config`] if no such set is registered.
pub fn get(name: &str) -> Result<Arc<FilterSet>> {
    FILTER_SETS
        .read()
        .get(name)
        .cloned()
        .ok_or_else(|| Error::config(format!("unknown filter set :{name}")))
}

/// Removes the filter set named `name`.
///
/// # Errors
///
/// Returns [`Error::Config`] after [`freeze`](super::freeze).
pub fn remove(name: &str) -> Result<Option<Arc<FilterSet>>> {
    ensure_open()?;
    Ok(FILTER_SETS.write().remove(name))
}

/// Returns the registered set names, sorted.
#[must_use]
pub fn names() -> Vec<String> {
    let mut names: Vec<String> = FILTER_SETS.read().keys().cloned().collect();
    names.sort();
    names
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FilterSet {
        FilterSet::builder("sample")
            .node_filter("checked", FilterOptions::boolean(), |_, _, _| Ok(true))
            .node_filter(
                "disabled",
                FilterOptions::boolean().with_default(false),
                |_, _, _| Ok(true),
            )
            .describe(|options| {
                (options.get("checked")?.as_bool()?).then(|| " that is checked".to_string())
            })
            .describe(|options| {
                (options.get("disabled")? == &FilterValue::Bool(false))
                    .then(|| " that is not disabled".to_string())
            })
            .build()
    }

    #[test]
    fn test_description_uses_defaults() {
        let set = sample();
        assert_eq!(set.description(&QueryOptions::new()), " that is not disabled");
        assert_eq!(
            set.description(&QueryOptions::new().filter("checked", true)),
            " that is checked that is not disabled"
        );
    }

    #[test]
    fn test_duplicate_filter_replaces() {
        let set = FilterSet::builder("dup")
            .node_filter("a", FilterOptions::new(), |_, _, _| Ok(true))
            .node_filter("a", FilterOptions::boolean(), |_, _, _| Ok(false))
            .build();
        assert_eq!(set.filters().len(), 1);
        assert!(set.filter("a").is_some_and(|f| f.options().boolean));
    }

    #[test]
    fn test_node_and_expression_filter_share_name() {
        let set = FilterSet::builder("shared")
            .node_filter("name", FilterOptions::new(), |_, _, _| Ok(true))
            .expression_filter("name", FilterOptions::new(), |expr, _| Ok(expr))
            .build();
        assert_eq!(set.filters().len(), 2);
        assert!(set.node_filter("name").is_some());
        assert!(set.expression_filter("name").is_some());
    }

    #[test]
    fn test_builtin_field_set_present() {
        let field = get("_field").expect("builtin");
        for name in ["checked", "unchecked", "disabled", "multiple", "name", "placeholder"] {
            assert!(field.filter(name).is_some(), "missing {name}");
        }
    }

    #[test]
    fn test_unknown_set() {
        assert!(get("no-such-set").unwrap_err().is_config_error());
    }
}
