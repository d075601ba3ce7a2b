//! Element handles with query provenance.
//!
//! An [`Element`] wraps a backend node together with the scope and query
//! that produced it, so a stale handle can be re-located later.
//!
//! # Example
//!
//! ```ignore
//! let button = session.find(Some("button"), "Submit", QueryOptions::new())?;
//!
//! assert_eq!(button.tag_name()?, "input");
//! button.reload()?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::whitespace::normalize_whitespace;
use crate::driver::{NativeHandle, Scope, ScopeRef, TextMode};
use crate::error::{ErrorKind, Result};
use crate::expression::ExpressionFormat;
use crate::query::SelectorQuery;
use crate::sync;

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for an element.
pub(crate) struct ElementInner {
    /// Current backend node; swapped by reload.
    base: RwLock<NativeHandle>,

    /// Scope the element was found in.
    scope: ScopeRef,

    /// Query that found the element, if reloading is possible.
    query: Option<SelectorQuery>,

    /// Position within the query result.
    index: usize,
}

// ============================================================================
// Element
// ============================================================================

/// A handle to a node found by a query.
///
/// Cloning is cheap and clones share the reloaded node.
#[derive(Clone)]
pub struct Element {
    pub(crate) inner: Arc<ElementInner>,
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("node", &*self.inner.base.read())
            .field(
                "query",
                &self.inner.query.as_ref().map(SelectorQuery::description),
            )
            .field("index", &self.inner.index)
            .finish()
    }
}

// ============================================================================
// Element - Constructors
// ============================================================================

impl Element {
    /// Wraps a node that was not found through a query; it never reloads.
    #[must_use]
    pub fn new(base: NativeHandle, scope: ScopeRef) -> Self {
        Self::build(base, scope, None, 0)
    }

    /// Wraps the `index`-th node found by `query` in `scope`.
    pub(crate) fn from_query(
        base: NativeHandle,
        scope: ScopeRef,
        query: SelectorQuery,
        index: usize,
    ) -> Self {
        Self::build(base, scope, Some(query), index)
    }

    fn build(
        base: NativeHandle,
        scope: ScopeRef,
        query: Option<SelectorQuery>,
        index: usize,
    ) -> Self {
        Self {
            inner: Arc::new(ElementInner {
                base: RwLock::new(base),
                scope,
                query,
                index,
            }),
        }
    }
}

// ============================================================================
// Element - Accessors
// ============================================================================

impl Element {
    /// Returns the current backend node.
    #[inline]
    #[must_use]
    pub fn native(&self) -> NativeHandle {
        self.inner.base.read().clone()
    }

    /// Returns the query that found this element.
    #[inline]
    #[must_use]
    pub fn query(&self) -> Option<&SelectorQuery> {
        self.inner.query.as_ref()
    }

    /// Returns the scope this element was found in.
    #[inline]
    #[must_use]
    pub fn scope(&self) -> &ScopeRef {
        &self.inner.scope
    }

    /// Returns this element as a scope for nested queries.
    #[must_use]
    pub fn as_scope(&self) -> ScopeRef {
        Arc::new(self.clone())
    }

    /// Returns `true` if both handles currently point at the same node.
    #[must_use]
    pub fn same_node(&self, other: &Element) -> bool {
        Arc::ptr_eq(&self.native(), &other.native())
    }
}

// ============================================================================
// Element - Node State
// ============================================================================

impl Element {
    /// # Errors
    ///
    /// Backend failures.
    pub fn tag_name(&self) -> Result<String> {
        self.native().tag_name()
    }

    /// # Errors
    ///
    /// Backend failures.
    pub fn is_visible(&self) -> Result<bool> {
        self.native().is_visible()
    }

    /// Raw text in `mode`.
    ///
    /// # Errors
    ///
    /// Backend failures.
    pub fn text(&self, mode: TextMode) -> Result<String> {
        self.native().text(mode)
    }

    /// Normalized rendered text.
    ///
    /// # Errors
    ///
    /// Backend failures.
    pub fn visible_text(&self) -> Result<String> {
        self.text(TextMode::Visible).map(|t| normalize_whitespace(&t))
    }

    /// Normalized text including hidden parts.
    ///
    /// # Errors
    ///
    /// Backend failures.
    pub fn all_text(&self) -> Result<String> {
        self.text(TextMode::All).map(|t| normalize_whitespace(&t))
    }

    /// # Errors
    ///
    /// Backend failures.
    pub fn attribute(&self, name: &str) -> Result<Option<String>> {
        self.native().attribute(name)
    }

    /// # Errors
    ///
    /// Backend failures.
    pub fn value(&self) -> Result<Option<String>> {
        self.native().value()
    }

    /// # Errors
    ///
    /// Backend failures.
    pub fn is_disabled(&self) -> Result<bool> {
        self.native().is_disabled()
    }

    /// # Errors
    ///
    /// Backend failures.
    pub fn is_checked(&self) -> Result<bool> {
        self.native().is_checked()
    }

    /// # Errors
    ///
    /// Backend failures.
    pub fn is_selected(&self) -> Result<bool> {
        self.native().is_selected()
    }

    /// # Errors
    ///
    /// Backend failures.
    pub fn is_readonly(&self) -> Result<bool> {
        self.native().is_readonly()
    }

    /// # Errors
    ///
    /// Backend failures.
    pub fn is_multiple(&self) -> Result<bool> {
        self.native().is_multiple()
    }
}

// ============================================================================
// Element - Reload
// ============================================================================

impl Element {
    /// Re-locates the node from the originating query and scope.
    ///
    /// Elements without a query are left untouched. Retryable failures
    /// keep the current node so the surrounding retry loop can try again.
    ///
    /// # Errors
    ///
    /// Non-retryable errors raised while re-resolving.
    pub fn reload(&self) -> Result<()> {
        let Some(query) = &self.inner.query else {
            return Ok(());
        };

        let relocated = self
            .inner
            .scope
            .reload_scope()
            .and_then(|()| query.resolve_for(&self.inner.scope, None));

        match relocated {
            Ok(result) => {
                if let Some(found) = result.get(self.inner.index) {
                    *self.inner.base.write() = found.native();
                    debug!(query = %query.description(), index = self.inner.index, "Element reloaded");
                }
                Ok(())
            }
            Err(e) if sync::is_retryable(&e, &self.inner.scope.invalid_element_errors()) => {
                debug!(error = %e, "Reload failed, keeping stale node");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

// ============================================================================
// Element - Scope
// ============================================================================

impl Scope for Element {
    fn find_css(&self, css: &str) -> Result<Vec<NativeHandle>> {
        self.native().find_css(css)
    }

    fn find_xpath(&self, xpath: &str) -> Result<Vec<NativeHandle>> {
        self.native().find_xpath(xpath)
    }

    fn supports_format(&self, format: ExpressionFormat) -> bool {
        self.native().supports_format(format)
    }

    fn description(&self) -> Option<String> {
        match &self.inner.query {
            Some(query) => Some(query.description()),
            None => self.native().description(),
        }
    }

    fn invalid_element_errors(&self) -> Vec<ErrorKind> {
        self.inner.scope.invalid_element_errors()
    }

    fn reload_scope(&self) -> Result<()> {
        self.reload()
    }
}
