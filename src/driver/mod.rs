//! Driver capability contract.
//!
//! The engine never touches a document directly. A backend implements
//! these traits and the engine compiles, resolves, filters and retries on
//! top of them.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Driver`] | Session backend: current document and retry capabilities |
//! | [`Scope`] | Anything expressions can be evaluated against |
//! | [`NativeNode`] | A backend node handle |
//! | [`TextMode`] | Visible or full text rendering |
//!
//! # Example
//!
//! ```ignore
//! use locator_engine::driver::{Driver, ScopeRef};
//! use locator_engine::{ErrorKind, Result};
//!
//! struct StaticDriver {
//!     document: ScopeRef,
//! }
//!
//! impl Driver for StaticDriver {
//!     fn document(&self) -> Result<ScopeRef> {
//!         Ok(self.document.clone())
//!     }
//!
//!     fn wait_supported(&self) -> bool {
//!         false
//!     }
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use crate::error::{ErrorKind, Result};
use crate::expression::ExpressionFormat;

// ============================================================================
// Types
// ============================================================================

/// Shared native node handle.
pub type NativeHandle = Arc<dyn NativeNode>;

/// Shared scope handle.
pub type ScopeRef = Arc<dyn Scope>;

/// Which text of a node to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextMode {
    /// Rendered text only.
    Visible,
    /// All text content, hidden parts included.
    All,
}

// ============================================================================
// Scope
// ============================================================================

/// A document or sub-tree expressions are evaluated against.
pub trait Scope: Send + Sync {
    /// Nodes matching a CSS selector, in document order.
    ///
    /// # Errors
    ///
    /// Backend failures; a stale scope should report
    /// [`Error::StaleElement`](crate::Error::StaleElement).
    fn find_css(&self, css: &str) -> Result<Vec<NativeHandle>>;

    /// Nodes matching an XPath expression, in document order.
    ///
    /// # Errors
    ///
    /// Backend failures.
    fn find_xpath(&self, xpath: &str) -> Result<Vec<NativeHandle>>;

    /// Returns `false` if this scope cannot evaluate `format`.
    fn supports_format(&self, format: ExpressionFormat) -> bool {
        let _ = format;
        true
    }

    /// Short human readable description, used in failure messages.
    fn description(&self) -> Option<String> {
        None
    }

    /// Error kinds, beyond the not-found family, that mean "retry".
    fn invalid_element_errors(&self) -> Vec<ErrorKind> {
        Vec::new()
    }

    /// Re-locates the scope itself before a reload of something found in it.
    ///
    /// # Errors
    ///
    /// Backend failures.
    fn reload_scope(&self) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// NativeNode
// ============================================================================

/// A node handle owned by the backend.
///
/// Boolean states default to attribute presence.
pub trait NativeNode: Scope + fmt::Debug {
    /// Lower-case tag name.
    ///
    /// # Errors
    ///
    /// Backend failures.
    fn tag_name(&self) -> Result<String>;

    /// Whether the node is displayed.
    ///
    /// # Errors
    ///
    /// Backend failures.
    fn is_visible(&self) -> Result<bool>;

    /// Node text in `mode`, not normalized.
    ///
    /// # Errors
    ///
    /// Backend failures.
    fn text(&self, mode: TextMode) -> Result<String>;

    /// Attribute value, `None` when absent.
    ///
    /// # Errors
    ///
    /// Backend failures.
    fn attribute(&self, name: &str) -> Result<Option<String>>;

    /// Current form value.
    ///
    /// # Errors
    ///
    /// Backend failures.
    fn value(&self) -> Result<Option<String>> {
        self.attribute("value")
    }

    /// # Errors
    ///
    /// Backend failures.
    fn is_disabled(&self) -> Result<bool> {
        Ok(self.attribute("disabled")?.is_some())
    }

    /// # Errors
    ///
    /// Backend failures.
    fn is_checked(&self) -> Result<bool> {
        Ok(self.attribute("checked")?.is_some())
    }

    /// # Errors
    ///
    /// Backend failures.
    fn is_selected(&self) -> Result<bool> {
        Ok(self.attribute("selected")?.is_some())
    }

    /// # Errors
    ///
    /// Backend failures.
    fn is_readonly(&self) -> Result<bool> {
        Ok(self.attribute("readonly")?.is_some())
    }

    /// # Errors
    ///
    /// Backend failures.
    fn is_multiple(&self) -> Result<bool> {
        Ok(self.attribute("multiple")?.is_some())
    }
}

// ============================================================================
// Driver
// ============================================================================

/// A session backend.
pub trait Driver: Send + Sync {
    /// The current document.
    ///
    /// # Errors
    ///
    /// Backend failures.
    fn document(&self) -> Result<ScopeRef>;

    /// Returns `false` for backends where the page cannot change on its
    /// own; synchronized operations then run exactly once.
    fn wait_supported(&self) -> bool {
        true
    }

    /// Error kinds, beyond the not-found family, that mean "retry".
    fn invalid_element_errors(&self) -> Vec<ErrorKind> {
        Vec::new()
    }
}
