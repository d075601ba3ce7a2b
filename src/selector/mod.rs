//! Selector definitions, filters and their registries.
//!
//! # Components
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`filter`] | Node, expression and locator filters |
//! | [`filter_set`] | Reusable filter bundles and their registry |
//! | [`definition`] | [`SelectorDefinition`] and [`SelectorBuilder`] |
//! | [`registry`] | Process-wide selector catalog |
//! | [`regexp_disassembler`] | Literal substrings a pattern requires |
//! | [`builtin`] | Selectors installed on first registry access |
//!
//! The registration functions are re-exported here, so callers write
//! `selector::add(definition)` and `selector::get("button")`.

// ============================================================================
// Submodules
// ============================================================================

pub mod builtin;
pub mod definition;
pub mod filter;
pub mod filter_set;
pub mod regexp_disassembler;
pub mod registry;

// ============================================================================
// Re-exports
// ============================================================================

pub use definition::{ExpressionFn, ExpressionInput, SelectorBuilder, SelectorDefinition};
pub use filter::{Filter, FilterKind, FilterOptions, FilterOutcome, LocatorFilter};
pub use filter_set::{Describer, FilterSet, FilterSetBuilder};
pub use regexp_disassembler::RegexpDisassembler;
pub use registry::{add, all, detect, freeze, get, is_frozen, names, remove, resolve, update};
