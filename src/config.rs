//! Session-wide query defaults.
//!
//! Every [`SelectorQuery`](crate::SelectorQuery) falls back to these values
//! for options the caller did not pass explicitly.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use locator_engine::{MatchPolicy, SessionOptions};
//!
//! let options = SessionOptions::new()
//!     .with_default_max_wait_time(Duration::from_secs(5))
//!     .with_match_policy(MatchPolicy::One)
//!     .with_exact(true);
//!
//! let parsed = SessionOptions::from_json(r#"{"default_max_wait_time": 500}"#)?;
//! assert_eq!(parsed.default_max_wait_time, Duration::from_millis(500));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default maximum wait for synchronized operations.
pub const DEFAULT_MAX_WAIT_TIME: Duration = Duration::from_secs(2);

/// Default sleep between synchronization attempts.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// Selector used when none is given and no selector claims the locator.
pub const DEFAULT_SELECTOR: &str = "css";

// ============================================================================
// Visibility
// ============================================================================

/// Which candidates survive the visibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Only displayed elements.
    Visible,
    /// Only non-displayed elements.
    Hidden,
    /// Everything.
    All,
}

impl Visibility {
    /// Returns the keyword name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Visible => "visible",
            Self::Hidden => "hidden",
            Self::All => "all",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// MatchPolicy
// ============================================================================

/// How a single-element finder disambiguates multiple candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Take the first candidate.
    First,
    /// Exact first, then loose; more than one candidate is ambiguous.
    #[default]
    Smart,
    /// Exact first, then loose; take the first candidate.
    PreferExact,
    /// More than one candidate is ambiguous.
    One,
}

impl MatchPolicy {
    /// Every policy, in declaration order.
    pub const ALL: [Self; 4] = [Self::First, Self::Smart, Self::PreferExact, Self::One];

    /// Returns the keyword name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Smart => "smart",
            Self::PreferExact => "prefer_exact",
            Self::One => "one",
        }
    }

    /// Returns `true` if the policy tries an exact pass before a loose one.
    #[inline]
    #[must_use]
    pub const fn prefers_exact(self) -> bool {
        matches!(self, Self::Smart | Self::PreferExact)
    }

    /// Returns `true` if more than one match is an error.
    #[inline]
    #[must_use]
    pub const fn rejects_ambiguity(self) -> bool {
        matches!(self, Self::Smart | Self::One)
    }
}

impl FromStr for MatchPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|policy| policy.as_str() == s)
            .ok_or_else(|| {
                Error::invalid_value("match", format!(":{s}"), "one of :first, :smart, :prefer_exact, :one")
            })
    }
}

impl fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SessionOptions
// ============================================================================

/// Session-wide defaults for queries and synchronization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Maximum wait for a synchronized operation.
    #[serde(with = "duration_ms")]
    pub default_max_wait_time: Duration,

    /// Sleep between attempts.
    #[serde(with = "duration_ms")]
    pub retry_interval: Duration,

    /// Re-locate stale elements before retrying.
    pub automatic_reload: bool,

    /// Only visible elements match unless a query says otherwise.
    pub ignore_hidden_elements: bool,

    /// Render XPath `is` comparisons exactly.
    pub exact: bool,

    /// Treat `text` as an exact comparison.
    pub exact_text: bool,

    /// Default match policy for single-element finders.
    pub match_policy: MatchPolicy,

    /// Selector used when none is given and none claims the locator.
    pub default_selector: String,

    /// Let field and button selectors match `aria-label`.
    pub enable_aria_label: bool,

    /// Extra attribute field and button selectors match the locator against.
    pub test_id: Option<String>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl SessionOptions {
    /// Creates options with the default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            default_max_wait_time: DEFAULT_MAX_WAIT_TIME,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            automatic_reload: true,
            ignore_hidden_elements: true,
            exact: false,
            exact_text: false,
            match_policy: MatchPolicy::Smart,
            default_selector: DEFAULT_SELECTOR.to_string(),
            enable_aria_label: false,
            test_id: None,
        }
    }

    /// Parses options from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] for malformed input and [`Error::Config`]
    /// if the parsed values fail validation.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl SessionOptions {
    /// Sets the maximum wait.
    #[inline]
    #[must_use]
    pub fn with_default_max_wait_time(mut self, wait: Duration) -> Self {
        self.default_max_wait_time = wait;
        self
    }

    /// Sets the sleep between attempts.
    #[inline]
    #[must_use]
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Enables or disables automatic reload.
    #[inline]
    #[must_use]
    pub fn with_automatic_reload(mut self, enabled: bool) -> Self {
        self.automatic_reload = enabled;
        self
    }

    /// Sets whether hidden elements are ignored by default.
    #[inline]
    #[must_use]
    pub fn with_ignore_hidden_elements(mut self, ignore: bool) -> Self {
        self.ignore_hidden_elements = ignore;
        self
    }

    /// Sets default exactness.
    #[inline]
    #[must_use]
    pub fn with_exact(mut self, exact: bool) -> Self {
        self.exact = exact;
        self
    }

    /// Sets default exact text matching.
    #[inline]
    #[must_use]
    pub fn with_exact_text(mut self, exact_text: bool) -> Self {
        self.exact_text = exact_text;
        self
    }

    /// Sets the default match policy.
    #[inline]
    #[must_use]
    pub fn with_match_policy(mut self, policy: MatchPolicy) -> Self {
        self.match_policy = policy;
        self
    }

    /// Sets the fallback selector name.
    #[inline]
    #[must_use]
    pub fn with_default_selector(mut self, name: impl Into<String>) -> Self {
        self.default_selector = name.into();
        self
    }

    /// Enables `aria-label` matching.
    #[inline]
    #[must_use]
    pub fn with_aria_label(mut self, enabled: bool) -> Self {
        self.enable_aria_label = enabled;
        self
    }

    /// Sets the test id attribute.
    #[inline]
    #[must_use]
    pub fn with_test_id(mut self, attribute: impl Into<String>) -> Self {
        self.test_id = Some(attribute.into());
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl SessionOptions {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an empty default selector or an empty
    /// test id attribute.
    pub fn validate(&self) -> Result<()> {
        if self.default_selector.trim().is_empty() {
            return Err(Error::config("default_selector must not be empty"));
        }

        if let Some(test_id) = &self.test_id
            && test_id.trim().is_empty()
        {
            return Err(Error::config("test_id must not be empty when set"));
        }

        Ok(())
    }
}

// ============================================================================
// Serde Helpers
// ============================================================================

/// Durations as integer milliseconds.
mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

// ============================================================================
// Tests
// ============================================================================
