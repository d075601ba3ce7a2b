//! Count expectations: `count`, `minimum`, `maximum`, `between`.

use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::value::{FilterValue, QueryOptions};

/// Option names that constrain the number of matches.
pub const COUNT_KEYS: [&str; 4] = ["count", "minimum", "maximum", "between"];

/// Parsed count options of a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountOptions {
    pub count: Option<usize>,
    pub minimum: Option<usize>,
    pub maximum: Option<usize>,
    pub between: Option<(usize, usize)>,
}

impl CountOptions {
    /// Reads the count keys of `options`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] for a non-integer count or a value
    /// other than a range for `between`.
    pub fn from_options(options: &QueryOptions) -> Result<Self> {
        let integer = |key: &str| -> Result<Option<usize>> {
            match options.get(key) {
                None | Some(FilterValue::Nil) => Ok(None),
                Some(value) => value.as_usize().map(Some).ok_or_else(|| {
                    Error::invalid_value(key, value.inspect(), "expected a non-negative integer")
                }),
            }
        };

        let between = match options.get("between") {
            None | Some(FilterValue::Nil) => None,
            Some(FilterValue::Range(lo, hi)) => Some((*lo, *hi)),
            Some(other) => {
                return Err(Error::invalid_value(
                    "between",
                    other.inspect(),
                    "expected an inclusive range",
                ));
            }
        };

        Ok(Self {
            count: integer("count")?,
            minimum: integer("minimum")?,
            maximum: integer("maximum")?,
            between,
        })
    }

    /// Returns `true` if any count option was given.
    #[inline]
    #[must_use]
    pub fn is_specified(&self) -> bool {
        self.count.is_some()
            || self.minimum.is_some()
            || self.maximum.is_some()
            || self.between.is_some()
    }

    /// Returns `true` if `n` satisfies every option. `count` overrides the
    /// others.
    #[must_use]
    pub fn matches(&self, n: usize) -> bool {
        if let Some(count) = self.count {
            return count == n;
        }
        if self.maximum.is_some_and(|max| max < n) {
            return false;
        }
        if self.minimum.is_some_and(|min| min > n) {
            return false;
        }
        if let Some((lo, hi)) = self.between
            && !(lo..=hi).contains(&n)
        {
            return false;
        }
        true
    }

    /// Compares `n` against the options: `Less` when more matches are
    /// needed, `Greater` when there are too many.
    #[must_use]
    pub fn compare(&self, n: usize) -> Ordering {
        if let Some(count) = self.count {
            return n.cmp(&count);
        }
        if self.minimum.is_some_and(|min| n < min) {
            return Ordering::Less;
        }
        if self.maximum.is_some_and(|max| n > max) {
            return Ordering::Greater;
        }
        if let Some((lo, hi)) = self.between
            && !(lo..=hi).contains(&n)
        {
            return n.cmp(&lo);
        }
        Ordering::Equal
    }

    /// Count phrase appended to failure messages, e.g. ` at least 2 times`.
    #[must_use]
    pub fn message(&self) -> String {
        if let Some(count) = self.count {
            format!(" {}", occurrences(count))
        } else if let Some((lo, hi)) = self.between {
            format!(" between {lo} and {hi} times")
        } else if let Some(max) = self.maximum {
            format!(" at most {}", occurrences(max))
        } else if let Some(min) = self.minimum {
            format!(" at least {}", occurrences(min))
        } else {
            String::new()
        }
    }
}

fn occurrences(n: usize) -> String {
    if n == 1 {
        format!("{n} time")
    } else {
        format!("{n} times")
    }
}
