//! Compiled query expressions.
//!
//! A selector compiles a locator into one [`Expression`], in the single
//! format the selector declares.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`xpath`] | XPath expression tree and rendering |
//! | [`css`] | CSS escaping and selector list splitting |
//! | [`builder`] | Attribute and class condition builders |

// ============================================================================
// Submodules
// ============================================================================

pub mod builder;
pub mod css;
pub mod xpath;

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

pub use builder::{CssBuilder, XPathBuilder};
pub use xpath::XPath;

// ============================================================================
// ExpressionFormat
// ============================================================================

/// Query language of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpressionFormat {
    /// CSS selector.
    Css,
    /// XPath 1.0.
    XPath,
}

impl ExpressionFormat {
    /// Returns the format name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::XPath => "xpath",
        }
    }
}

impl fmt::Display for ExpressionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Expression
// ============================================================================

/// A compiled CSS selector or XPath expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// CSS selector text.
    Css(String),
    /// XPath tree, rendered on demand.
    XPath(XPath),
}

impl Expression {
    /// Creates a CSS expression.
    #[inline]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Returns the format of this expression.
    #[inline]
    #[must_use]
    pub fn format(&self) -> ExpressionFormat {
        match self {
            Self::Css(_) => ExpressionFormat::Css,
            Self::XPath(_) => ExpressionFormat::XPath,
        }
    }

    /// Returns the CSS text if this is a CSS expression.
    #[inline]
    #[must_use]
    pub fn as_css(&self) -> Option<&str> {
        match self {
            Self::Css(css) => Some(css),
            Self::XPath(_) => None,
        }
    }

    /// Returns the XPath tree if this is an XPath expression.
    #[inline]
    #[must_use]
    pub fn as_xpath(&self) -> Option<&XPath> {
        match self {
            Self::XPath(xpath) => Some(xpath),
            Self::Css(_) => None,
        }
    }

    /// Renders the expression text.
    #[must_use]
    pub fn render(&self, exact: bool) -> String {
        match self {
            Self::Css(css) => css.clone(),
            Self::XPath(xpath) => xpath.render(exact),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(false))
    }
}

impl From<XPath> for Expression {
    fn from(xpath: XPath) -> Self {
        Self::XPath(xpath)
    }
}

// ============================================================================
// Tests
// ============================================================================
