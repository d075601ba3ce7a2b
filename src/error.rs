//! Error types for the locator engine.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use locator_engine::{Result, Session};
//!
//! fn example(session: &Session) -> Result<()> {
//!     let button = session.find("button", "Submit", Default::default())?;
//!     println!("{:?}", button.text(Default::default())?);
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::InvalidOption`], [`Error::InvalidValue`], [`Error::UnknownSelector`], [`Error::FormatMismatch`] |
//! | Element (retryable) | [`Error::ElementNotFound`], [`Error::Ambiguous`], [`Error::ExpectationNotMet`] |
//! | Element (driver) | [`Error::StaleElement`], [`Error::Driver`] |
//! | Capability | [`Error::UnselectNotAllowed`], [`Error::NotSupported`] |
//! | Execution | [`Error::Timeout`] |
//! | External | [`Error::Json`], [`Error::Regex`] |
//!
//! Retry classification works on [`ErrorKind`] tags rather than on the
//! variants themselves, so drivers can declare their own transient kinds.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::result::Result as StdResult;

use thiserror::Error;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// ErrorKind
// ============================================================================

/// Classification tag for an [`enum@Error`].
///
/// Drivers report the kinds they consider transient through
/// [`Driver::invalid_element_errors`](crate::driver::Driver::invalid_element_errors);
/// the synchronizer compares tags, never error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid selector, filter or query configuration.
    Config,
    /// Unknown option key passed to a query.
    InvalidOption,
    /// Option present with a value of the wrong shape.
    InvalidValue,
    /// Selector name not present in the registry.
    UnknownSelector,
    /// Scope cannot evaluate the selector's expression format.
    FormatMismatch,
    /// No element matched.
    ElementNotFound,
    /// More than one element matched where one was required.
    Ambiguous,
    /// A count or content expectation was not met.
    ExpectationNotMet,
    /// A previously found node is detached from the document.
    StaleElement,
    /// Driver specific failure, tagged by the driver.
    Driver(&'static str),
    /// Unselect attempted on a single-select control.
    UnselectNotAllowed,
    /// Operation unsupported by the active driver.
    NotSupported,
    /// Deadline elapsed without any specific cause.
    Timeout,
    /// JSON (de)serialization failure.
    Json,
    /// Regular expression compilation failure.
    Regex,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Driver(tag) => write!(f, "driver:{tag}"),
            other => write!(f, "{other:?}"),
        }
    }
}

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when a selector, filter or query is configured incorrectly.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Unknown option keys passed to a query.
    ///
    /// Returned at query construction, before any document access.
    #[error("invalid keys {invalid}, should be one of {valid}")]
    InvalidOption {
        /// Comma separated list of the rejected keys.
        invalid: String,
        /// Comma separated list of the accepted keys.
        valid: String,
    },

    /// Option value with the wrong shape.
    #[error("invalid option {value} for :{option}, {expected}")]
    InvalidValue {
        /// Option name.
        option: String,
        /// Rendered value that was rejected.
        value: String,
        /// What the option accepts.
        expected: String,
    },

    /// Selector name not registered.
    #[error("Unknown selector type (:{name})")]
    UnknownSelector {
        /// The requested selector name.
        name: String,
    },

    /// Scope cannot evaluate the expression format.
    #[error("Scope does not support {format} expressions (selector :{selector})")]
    FormatMismatch {
        /// Selector whose expression could not be evaluated.
        selector: String,
        /// Name of the expression format.
        format: String,
    },

    // ========================================================================
    // Element Errors
    // ========================================================================
    /// No element matched the query.
    #[error("{message}")]
    ElementNotFound {
        /// Failure message built from the query description.
        message: String,
    },

    /// More elements matched than the match policy allows.
    #[error("{message}")]
    Ambiguous {
        /// Failure message built from the query description.
        message: String,
    },

    /// Count or content expectation not met.
    #[error("{message}")]
    ExpectationNotMet {
        /// Failure message built from the query description.
        message: String,
    },

    /// Element is stale (no longer in the document).
    #[error("Stale element: {message}")]
    StaleElement {
        /// Driver supplied detail.
        message: String,
    },

    /// Driver specific failure.
    ///
    /// The tag lets drivers declare the failure retryable via
    /// [`ErrorKind::Driver`].
    #[error("Driver error ({kind}): {message}")]
    Driver {
        /// Driver defined tag.
        kind: &'static str,
        /// Driver supplied detail.
        message: String,
    },

    // ========================================================================
    // Capability Errors
    // ========================================================================
    /// Unselect attempted on a control that does not allow it.
    #[error("Unselect not allowed: {message}")]
    UnselectNotAllowed {
        /// Description of the rejected operation.
        message: String,
    },

    /// Operation not supported by the active driver.
    #[error("Not supported by driver: {operation}")]
    NotSupported {
        /// Name of the unsupported operation.
        operation: String,
    },

    // ========================================================================
    // Execution Errors
    // ========================================================================
    /// Operation timeout with no more specific cause.
    #[error("Timeout after {timeout_ms}ms: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Regular expression error.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid option error from rejected and accepted keys.
    pub fn invalid_option<I, V>(invalid: I, valid: V) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        V: IntoIterator,
        V::Item: AsRef<str>,
    {
        let join = |keys: Vec<String>| keys.join(", ");
        Self::InvalidOption {
            invalid: join(invalid.into_iter().map(|k| format!(":{}", k.as_ref())).collect()),
            valid: join(valid.into_iter().map(|k| format!(":{}", k.as_ref())).collect()),
        }
    }

    /// Creates an invalid value error.
    #[inline]
    pub fn invalid_value(
        option: impl Into<String>,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            option: option.into(),
            value: value.into(),
            expected: expected.into(),
        }
    }

    /// Creates an unknown selector error.
    #[inline]
    pub fn unknown_selector(name: impl Into<String>) -> Self {
        Self::UnknownSelector { name: name.into() }
    }

    /// Creates a format mismatch error.
    #[inline]
    pub fn format_mismatch(selector: impl Into<String>, format: impl fmt::Display) -> Self {
        Self::FormatMismatch {
            selector: selector.into(),
            format: format.to_string(),
        }
    }

    /// Creates an element not found error.
    #[inline]
    pub fn element_not_found(message: impl Into<String>) -> Self {
        Self::ElementNotFound {
            message: message.into(),
        }
    }

    /// Creates an ambiguous match error.
    #[inline]
    pub fn ambiguous(message: impl Into<String>) -> Self {
        Self::Ambiguous {
            message: message.into(),
        }
    }

    /// Creates an expectation not met error.
    #[inline]
    pub fn expectation_not_met(message: impl Into<String>) -> Self {
        Self::ExpectationNotMet {
            message: message.into(),
        }
    }

    /// Creates a stale element error.
    #[inline]
    pub fn stale_element(message: impl Into<String>) -> Self {
        Self::StaleElement {
            message: message.into(),
        }
    }

    /// Creates a tagged driver error.
    #[inline]
    pub fn driver(kind: &'static str, message: impl Into<String>) -> Self {
        Self::Driver {
            kind,
            message: message.into(),
        }
    }

    /// Creates an unselect not allowed error.
    #[inline]
    pub fn unselect_not_allowed(message: impl Into<String>) -> Self {
        Self::UnselectNotAllowed {
            message: message.into(),
        }
    }

    /// Creates a not supported error.
    #[inline]
    pub fn not_supported(operation: impl Into<String>) -> Self {
        Self::NotSupported {
            operation: operation.into(),
        }
    }

    /// Creates a timeout error.
    #[inline]
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns the classification tag of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config { .. } => ErrorKind::Config,
            Self::InvalidOption { .. } => ErrorKind::InvalidOption,
            Self::InvalidValue { .. } => ErrorKind::InvalidValue,
            Self::UnknownSelector { .. } => ErrorKind::UnknownSelector,
            Self::FormatMismatch { .. } => ErrorKind::FormatMismatch,
            Self::ElementNotFound { .. } => ErrorKind::ElementNotFound,
            Self::Ambiguous { .. } => ErrorKind::Ambiguous,
            Self::ExpectationNotMet { .. } => ErrorKind::ExpectationNotMet,
            Self::StaleElement { .. } => ErrorKind::StaleElement,
            Self::Driver { kind, .. } => ErrorKind::Driver(*kind),
            Self::UnselectNotAllowed { .. } => ErrorKind::UnselectNotAllowed,
            Self::NotSupported { .. } => ErrorKind::NotSupported,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Json(_) => ErrorKind::Json,
            Self::Regex(_) => ErrorKind::Regex,
        }
    }

    /// Returns `true` if this is a configuration error.
    ///
    /// Configuration errors are never retried.
    #[inline]
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::Config { .. }
                | Self::InvalidOption { .. }
                | Self::InvalidValue { .. }
                | Self::UnknownSelector { .. }
                | Self::FormatMismatch { .. }
        )
    }

    /// Returns `true` if this belongs to the element-not-found family.
    ///
    /// These are the only kinds retried without driver declarations.
    #[inline]
    #[must_use]
    pub fn is_element_error(&self) -> bool {
        matches!(
            self,
            Self::ElementNotFound { .. } | Self::Ambiguous { .. } | Self::ExpectationNotMet { .. }
        )
    }

    /// Returns `true` if this reports a detached or obsolete node.
    #[inline]
    #[must_use]
    pub fn is_invalid_element(&self) -> bool {
        matches!(self, Self::StaleElement { .. })
    }

    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================
