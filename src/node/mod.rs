//! Element handles and query results.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Element`] | Node handle bound to its scope and originating query |
//! | [`QueryResult`] | Filtered candidates with failure messages |
//! | [`normalize_whitespace`] | Text normalization used by text matching |

mod element;
mod result;
mod whitespace;

pub use element::Element;
pub use result::QueryResult;
pub use whitespace::normalize_whitespace;
