//! Filtered query results.

// ============================================================================
// Imports
// ============================================================================

use std::cmp::Ordering;
use std::slice;

use super::element::Element;
use crate::query::SelectorQuery;

// ============================================================================
// QueryResult
// ============================================================================

/// Candidates that survived every filter, plus the ones that did not.
///
/// Rejected candidates and the reasons filters gave are kept for failure
/// messages only.
#[derive(Debug, Clone)]
pub struct QueryResult {
    elements: Vec<Element>,
    rejected: Vec<Element>,
    filter_errors: Vec<String>,
    scope_description: Option<String>,
    query: SelectorQuery,
}

impl QueryResult {
    pub(crate) fn new(
        elements: Vec<Element>,
        rejected: Vec<Element>,
        filter_errors: Vec<String>,
        scope_description: Option<String>,
        query: SelectorQuery,
    ) -> Self {
        Self {
            elements,
            rejected,
            filter_errors,
            scope_description,
            query,
        }
    }

    /// An empty result for `query`.
    pub(crate) fn empty(query: SelectorQuery) -> Self {
        Self::new(Vec::new(), Vec::new(), Vec::new(), None, query)
    }

    /// Returns the query that produced this result.
    #[inline]
    #[must_use]
    pub fn query(&self) -> &SelectorQuery {
        &self.query
    }

    /// Number of matching elements.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Element> {
        self.elements.get(index)
    }

    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<&Element> {
        self.elements.first()
    }

    pub fn iter(&self) -> slice::Iter<'_, Element> {
        self.elements.iter()
    }

    /// Matching elements as a slice.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[Element] {
        &self.elements
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Element> {
        self.elements
    }

    /// Candidates rejected by a filter.
    #[inline]
    #[must_use]
    pub fn rejected(&self) -> &[Element] {
        &self.rejected
    }

    /// Number of candidates before filtering.
    #[must_use]
    pub fn unfiltered_len(&self) -> usize {
        self.elements.len() + self.rejected.len()
    }
}

// ============================================================================
// QueryResult - Count Expectations
// ============================================================================

impl QueryResult {
    /// Compares the match count with the query's count options.
    ///
    /// `Less` means too few matches, `Greater` too many.
    #[must_use]
    pub fn compare_count(&self) -> Ordering {
        self.query.count_options().compare(self.len())
    }

    /// Returns `true` if the match count satisfies the query.
    #[must_use]
    pub fn matches_count(&self) -> bool {
        self.compare_count() == Ordering::Equal
    }

    /// `expected to find ...` followed by what was actually found.
    #[must_use]
    pub fn failure_message(&self) -> String {
        let mut message = self
            .query
            .failure_message_within(self.scope_description.as_deref());

        if self.is_empty() {
            message.push_str(" but there were no matches");
        } else {
            let noun = if self.len() == 1 { "match" } else { "matches" };
            message.push_str(&format!(
                ", found {} {noun}: {}",
                self.len(),
                inspect_texts(&self.elements)
            ));
        }

        if !self.rejected.is_empty() {
            message.push_str(&format!(
                ". Also found {}, which matched the selector but not all filters.",
                inspect_texts(&self.rejected)
            ));
            if self.rejected.len() == 1 && self.is_empty() && !self.filter_errors.is_empty() {
                message.push(' ');
                message.push_str(&self.filter_errors.join(". "));
            }
        }
        message
    }

    /// Same as [`failure_message`](Self::failure_message) with `not to find`.
    #[must_use]
    pub fn negative_failure_message(&self) -> String {
        self.failure_message().replacen("to find", "not to find", 1)
    }
}

impl<'a> IntoIterator for &'a QueryResult {
    type Item = &'a Element;
    type IntoIter = slice::Iter<'a, Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for QueryResult {
    type Item = Element;
    type IntoIter = std::vec::IntoIter<Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

/// `"a", "b"` from the visible text of each element.
fn inspect_texts(elements: &[Element]) -> String {
    elements
        .iter()
        .map(|el| match el.visible_text() {
            Ok(text) => format!("{text:?}"),
            Err(_) => "\"<<ERROR>>\"".to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
