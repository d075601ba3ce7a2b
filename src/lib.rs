//! Locator Engine - Selector compilation and synchronized element lookup.
//!
//! This library turns named selectors and locators into XPath or CSS
//! expressions, evaluates them through a pluggable driver and narrows the
//! candidates with typed filters. Lookups retry until the page settles or a
//! wall-clock budget is spent.
//!
//! # Architecture
//!
//! - **Selectors**: a process-wide registry of named selector definitions,
//!   each compiling a locator into one expression and declaring filters
//! - **Queries**: validated, precompiled lookups that resolve against a scope
//! - **Driver**: the backend boundary, evaluating raw expressions and
//!   reporting node state
//! - **Synchronization**: bounded retry with reload of stale elements
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use locator_engine::{QueryOptions, Result, Session};
//!
//! fn submit(driver: Arc<dyn locator_engine::Driver>) -> Result<()> {
//!     let session = Session::new(driver);
//!
//!     let button = session.find(
//!         Some("button"),
//!         "Submit",
//!         QueryOptions::new().filter("disabled", false),
//!     )?;
//!     println!("Found {:?}", button.tag_name()?);
//!
//!     let rows = session.all(Some("css"), "tr", QueryOptions::new().minimum(2))?;
//!     println!("{} rows", rows.len());
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | [`SessionOptions`] and policy enums |
//! | [`driver`] | Backend traits: [`Driver`], [`Scope`], [`NativeNode`] |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`expression`] | XPath tree, CSS helpers and condition builders |
//! | [`node`] | [`Element`] handles and [`QueryResult`] |
//! | [`query`] | [`SelectorQuery`] construction and resolution |
//! | [`selector`] | Selector registry, definitions, filters and built-ins |
//! | [`session`] | [`Session`] finders |
//! | [`sync`] | [`Synchronizer`] retry loop |
//! | [`value`] | Locator and filter values, [`QueryOptions`] |

// ============================================================================
// Modules
// ============================================================================

/// Session options and matching policies.
pub mod config;

/// Driver boundary.
///
/// Implement [`Driver`] and [`NativeNode`] to plug in a backend.
pub mod driver;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Compiled expressions and builders.
pub mod expression;

/// Element handles and query results.
pub mod node;

/// Selector queries.
pub mod query;

/// Named selectors.
///
/// Built-in selectors are registered on first access to the registry.
pub mod selector;

/// Session and synchronized finders.
pub mod session;

/// Retry-based synchronization.
pub mod sync;

/// Locator and filter values.
pub mod value;

// ============================================================================
// Re-exports
// ============================================================================

// Configuration
pub use config::{MatchPolicy, SessionOptions, Visibility};

// Driver traits
pub use driver::{Driver, NativeHandle, NativeNode, Scope, ScopeRef, TextMode};

// Error types
pub use error::{Error, ErrorKind, Result};

// Expressions
pub use expression::{Expression, ExpressionFormat, XPath};

// Nodes
pub use node::{Element, QueryResult};

// Queries
pub use query::{QueryBuilder, SelectorQuery};

// Selectors
pub use selector::{FilterSet, SelectorDefinition};

// Session and synchronization
pub use session::Session;
pub use sync::Synchronizer;

// Values
pub use value::{FilterValue, IntoLocator, LocatorKind, LocatorValue, QueryOptions};
