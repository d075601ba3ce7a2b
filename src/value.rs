//! Locator and filter values.
//!
//! Locators are a closed sum type validated per selector; filter values are
//! a small dynamic value model so one option map can carry booleans, text,
//! patterns and lists side by side.
//!
//! # Example
//!
//! ```ignore
//! use locator_engine::{FilterValue, QueryOptions, Visibility};
//!
//! let options = QueryOptions::new()
//!     .text("Submit")
//!     .visible(Visibility::All)
//!     .filter("disabled", false);
//!
//! assert_eq!(options.get("disabled"), Some(&FilterValue::Bool(false)));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::{MatchPolicy, Visibility};

// ============================================================================
// LocatorValue
// ============================================================================

/// The caller supplied value identifying what to find.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocatorValue {
    /// Plain text: an id, a label, an expression.
    Text(String),

    /// Ordered cells, e.g. a table row by its cell texts.
    PathSegments(Vec<String>),

    /// Header to cell mapping.
    FieldMap(BTreeMap<String, String>),
}

/// Shape of a [`LocatorValue`], used for per-selector validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocatorKind {
    /// [`LocatorValue::Text`].
    Text,
    /// [`LocatorValue::PathSegments`].
    PathSegments,
    /// [`LocatorValue::FieldMap`].
    FieldMap,
}

impl LocatorValue {
    /// Creates a text locator.
    #[inline]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Returns the shape of this locator.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> LocatorKind {
        match self {
            Self::Text(_) => LocatorKind::Text,
            Self::PathSegments(_) => LocatorKind::PathSegments,
            Self::FieldMap(_) => LocatorKind::FieldMap,
        }
    }

    /// Returns the text if this is a text locator.
    #[inline]
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Renders the locator the way it appears in failure messages.
    #[must_use]
    pub fn inspect(&self) -> String {
        match self {
            Self::Text(text) => format!("{text:?}"),
            Self::PathSegments(cells) => {
                let cells: Vec<String> = cells.iter().map(|c| format!("{c:?}")).collect();
                format!("[{}]", cells.join(", "))
            }
            Self::FieldMap(map) => {
                let pairs: Vec<String> = map
                    .iter()
                    .map(|(k, v)| format!("{k:?} => {v:?}"))
                    .collect();
                format!("{{{}}}", pairs.join(", "))
            }
        }
    }
}

impl fmt::Display for LocatorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            other => f.write_str(&other.inspect()),
        }
    }
}

impl From<&str> for LocatorValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for LocatorValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Vec<String>> for LocatorValue {
    fn from(cells: Vec<String>) -> Self {
        Self::PathSegments(cells)
    }
}

impl From<Vec<&str>> for LocatorValue {
    fn from(cells: Vec<&str>) -> Self {
        Self::PathSegments(cells.into_iter().map(str::to_string).collect())
    }
}

impl From<BTreeMap<String, String>> for LocatorValue {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self::FieldMap(map)
    }
}

// ============================================================================
// IntoLocator
// ============================================================================

/// Conversion into an optional locator.
///
/// Lets finders accept `"Submit"`, a [`LocatorValue`] or `None` alike.
pub trait IntoLocator {
    /// Performs the conversion.
    fn into_locator(self) -> Option<LocatorValue>;
}

impl IntoLocator for &str {
    fn into_locator(self) -> Option<LocatorValue> {
        Some(self.into())
    }
}

impl IntoLocator for String {
    fn into_locator(self) -> Option<LocatorValue> {
        Some(self.into())
    }
}

impl IntoLocator for &String {
    fn into_locator(self) -> Option<LocatorValue> {
        Some(self.as_str().into())
    }
}

impl IntoLocator for LocatorValue {
    fn into_locator(self) -> Option<LocatorValue> {
        Some(self)
    }
}

impl IntoLocator for Option<LocatorValue> {
    fn into_locator(self) -> Option<LocatorValue> {
        self
    }
}

impl IntoLocator for Vec<&str> {
    fn into_locator(self) -> Option<LocatorValue> {
        Some(self.into())
    }
}

// ============================================================================
// FilterValue
// ============================================================================

/// A value passed to a filter or a global query option.
#[derive(Debug, Clone)]
pub enum FilterValue {
    /// Explicit absence (`href: nil`).
    Nil,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating point number (wait seconds).
    Float(f64),
    /// Text.
    Text(String),
    /// Keyword such as `:all` or `:hidden`.
    Symbol(String),
    /// Regular expression.
    Pattern(Regex),
    /// List of values.
    List(Vec<FilterValue>),
    /// Inclusive range (`between`).
    Range(usize, usize),
}

impl FilterValue {
    /// Creates a keyword value.
    #[inline]
    pub fn symbol(name: impl Into<String>) -> Self {
        Self::Symbol(name.into())
    }

    /// The `:all` keyword, used as a skip sentinel.
    #[inline]
    #[must_use]
    pub fn all() -> Self {
        Self::Symbol("all".to_string())
    }

    /// Returns the boolean if this is one.
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the text of a `Text` or `Symbol` value.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the pattern if this is one.
    #[inline]
    #[must_use]
    pub fn as_pattern(&self) -> Option<&Regex> {
        match self {
            Self::Pattern(re) => Some(re),
            _ => None,
        }
    }

    /// Returns a non-negative integer value.
    #[must_use]
    pub fn as_usize(&self) -> Option<usize> {
        match self {
            Self::Int(n) => usize::try_from(*n).ok(),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Returns `true` for [`FilterValue::Nil`].
    #[inline]
    #[must_use]
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Returns the elements of a list, or the value itself as a one element list.
    #[must_use]
    pub fn to_list(&self) -> Vec<FilterValue> {
        match self {
            Self::List(items) => items.clone(),
            Self::Nil => Vec::new(),
            other => vec![other.clone()],
        }
    }

    /// Plain string form, used when a value is spliced into an expression.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Nil => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Int(n) => n.to_string(),
            Self::Float(x) => x.to_string(),
            Self::Text(s) | Self::Symbol(s) => s.clone(),
            Self::Pattern(re) => re.as_str().to_string(),
            Self::List(items) => items
                .iter()
                .map(FilterValue::to_text)
                .collect::<Vec<_>>()
                .join(" "),
            Self::Range(lo, hi) => format!("{lo}..{hi}"),
        }
    }

    /// Literal form used in human readable descriptions.
    #[must_use]
    pub fn inspect(&self) -> String {
        match self {
            Self::Nil => "nil".to_string(),
            Self::Text(s) => format!("{s:?}"),
            Self::Symbol(s) => format!(":{s}"),
            Self::Pattern(re) => format!("/{}/", re.as_str()),
            Self::List(items) => {
                let items: Vec<String> = items.iter().map(FilterValue::inspect).collect();
                format!("[{}]", items.join(", "))
            }
            other => other.to_text(),
        }
    }
}

impl PartialEq for FilterValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Symbol(a), Self::Symbol(b)) => a == b,
            (Self::Pattern(a), Self::Pattern(b)) => a.as_str() == b.as_str(),
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Range(a1, a2), Self::Range(b1, b2)) => a1 == b1 && a2 == b2,
            _ => false,
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for FilterValue {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<usize> for FilterValue {
    fn from(n: usize) -> Self {
        Self::Int(i64::try_from(n).unwrap_or(i64::MAX))
    }
}

impl From<f64> for FilterValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Regex> for FilterValue {
    fn from(re: Regex) -> Self {
        Self::Pattern(re)
    }
}

impl From<RangeInclusive<usize>> for FilterValue {
    fn from(range: RangeInclusive<usize>) -> Self {
        Self::Range(*range.start(), *range.end())
    }
}

impl<T: Into<FilterValue>> From<Vec<T>> for FilterValue {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Nil, Into::into)
    }
}

impl From<Visibility> for FilterValue {
    fn from(visibility: Visibility) -> Self {
        Self::symbol(visibility.as_str())
    }
}

impl From<MatchPolicy> for FilterValue {
    fn from(policy: MatchPolicy) -> Self {
        Self::symbol(policy.as_str())
    }
}

// ============================================================================
// QueryOptions
// ============================================================================

/// Ordered option map passed to a query.
///
/// Keys keep insertion order; setting an existing key replaces its value in
/// place. Global keys have typed setters, selector specific filters go
/// through [`QueryOptions::filter`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    entries: Vec<(String, FilterValue)>,
}

impl QueryOptions {
    /// Creates an empty option map.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Sets a selector filter option.
    #[must_use]
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Returns the value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Returns `true` if `key` is present.
    #[inline]
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<FilterValue> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Iterates keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of options.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no option is set.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns a copy with `key` set only if it was absent.
    #[must_use]
    pub fn with_default(&self, key: &str, value: impl Into<FilterValue>) -> Self {
        let mut merged = self.clone();
        if !merged.contains(key) {
            merged.set(key, value);
        }
        merged
    }
}

// ============================================================================
// QueryOptions - Global Keys
// ============================================================================

impl QueryOptions {
    /// Requires the element text to contain `text`.
    #[must_use]
    pub fn text(self, text: impl Into<FilterValue>) -> Self {
        self.filter("text", text)
    }

    /// Requires the element text to equal `text` after normalization.
    #[must_use]
    pub fn exact_text(self, text: impl Into<FilterValue>) -> Self {
        self.filter("exact_text", text)
    }

    /// Requires the id attribute.
    #[must_use]
    pub fn id(self, id: impl Into<FilterValue>) -> Self {
        self.filter("id", id)
    }

    /// Requires the given class (or list of classes).
    #[must_use]
    pub fn class(self, class: impl Into<FilterValue>) -> Self {
        self.filter("class", class)
    }

    /// Sets the visibility policy.
    #[must_use]
    pub fn visible(self, visibility: Visibility) -> Self {
        self.filter("visible", visibility)
    }

    /// Sets exact matching for XPath `is` comparisons.
    #[must_use]
    pub fn exact(self, exact: bool) -> Self {
        self.filter("exact", exact)
    }

    /// Sets the match policy.
    #[must_use]
    pub fn match_policy(self, policy: MatchPolicy) -> Self {
        self.filter("match", policy)
    }

    /// Sets the maximum wait.
    #[must_use]
    pub fn wait(self, wait: Duration) -> Self {
        self.filter("wait", wait.as_secs_f64())
    }

    /// Disables waiting for this query.
    #[must_use]
    pub fn no_wait(self) -> Self {
        self.filter("wait", false)
    }

    /// Uses the node filters of a registered filter set.
    #[must_use]
    pub fn filter_set(self, name: impl Into<String>) -> Self {
        self.filter("filter_set", FilterValue::symbol(name))
    }

    /// Requires exactly `count` matches.
    #[must_use]
    pub fn count(self, count: usize) -> Self {
        self.filter("count", count)
    }

    /// Requires at least `minimum` matches.
    #[must_use]
    pub fn minimum(self, minimum: usize) -> Self {
        self.filter("minimum", minimum)
    }

    /// Requires at most `maximum` matches.
    #[must_use]
    pub fn maximum(self, maximum: usize) -> Self {
        self.filter("maximum", maximum)
    }

    /// Requires a match count within `range`.
    #[must_use]
    pub fn between(self, range: RangeInclusive<usize>) -> Self {
        self.filter("between", range)
    }
}

impl<K: Into<String>, V: Into<FilterValue>> FromIterator<(K, V)> for QueryOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut options = Self::new();
        for (key, value) in iter {
            options.set(key, value);
        }
        options
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_kind() {
        assert_eq!(LocatorValue::from("Submit").kind(), LocatorKind::Text);
        assert_eq!(
            LocatorValue::from(vec!["a", "b"]).kind(),
            LocatorKind::PathSegments
        );
    }

    #[test]
    fn test_locator_inspect() {
        assert_eq!(LocatorValue::from("Submit").inspect(), "\"Submit\"");
        assert_eq!(LocatorValue::from(vec!["a", "b"]).inspect(), "[\"a\", \"b\"]");
    }

    #[test]
    fn test_locator_deserializes_untagged() {
        let text: LocatorValue = serde_json::from_str("\"Submit\"").unwrap();
        assert_eq!(text, LocatorValue::text("Submit"));

        let cells: LocatorValue = serde_json::from_str("[\"a\",\"b\"]").unwrap();
        assert_eq!(cells.kind(), LocatorKind::PathSegments);
    }

    #[test]
    fn test_filter_value_pattern_equality_by_source() {
        let a = FilterValue::from(Regex::new("ab+c").unwrap());
        let b = FilterValue::from(Regex::new("ab+c").unwrap());
        let c = FilterValue::from(Regex::new("abc").unwrap());
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_filter_value_inspect() {
        assert_eq!(FilterValue::from("Submit").inspect(), "\"Submit\"");
        assert_eq!(FilterValue::all().inspect(), ":all");
        assert_eq!(FilterValue::from(Regex::new("ab+c").unwrap()).inspect(), "/ab+c/");
        assert_eq!(FilterValue::from(vec!["a", "b"]).inspect(), "[\"a\", \"b\"]");
        assert_eq!(FilterValue::from(false).inspect(), "false");
    }

    #[test]
    fn test_options_replace_in_place() {
        let options = QueryOptions::new()
            .filter("disabled", false)
            .text("Go")
            .filter("disabled", true);

        let keys: Vec<&str> = options.keys().collect();
        assert_eq!(keys, vec!["disabled", "text"]);
        assert_eq!(options.get("disabled"), Some(&FilterValue::Bool(true)));
    }

    #[test]
    fn test_options_with_default() {
        let options = QueryOptions::new().count(2);
        let merged = options.with_default("minimum", 1usize).with_default("count", 5usize);
        assert_eq!(merged.get("count").and_then(FilterValue::as_usize), Some(2));
        assert_eq!(merged.get("minimum").and_then(FilterValue::as_usize), Some(1));
    }

    #[test]
    fn test_options_from_iter() {
        let options: QueryOptions = [("name", "email"), ("placeholder", "you@example.com")]
            .into_iter()
            .collect();
        assert_eq!(options.len(), 2);
        assert!(options.contains("placeholder"));
    }
}
