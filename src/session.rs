//! Session: driver, options and the synchronized finders.
//!
//! A [`Session`] owns the driver handle and the [`SessionOptions`] every
//! query is built with. Its finders wrap query resolution in a
//! [`Synchronizer`] so elements that appear late are still found.
//!
//! | Method | Result |
//! |--------|--------|
//! | [`Session::find`] | Exactly one element, per the match policy |
//! | [`Session::all`] | Every matching element, checked against counts |
//! | [`Session::first`] | The first of at least one match |
//!
//! The `_in` variants search inside an element instead of the document.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use locator_engine::{QueryOptions, Session};
//!
//! let session = Session::new(Arc::new(driver));
//! let button = session.find(Some("button"), "Submit", QueryOptions::new())?;
//! let items = session.all(Some("css"), "li", QueryOptions::new().minimum(3))?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::config::SessionOptions;
use crate::driver::{Driver, ScopeRef};
use crate::error::{Error, Result};
use crate::node::{Element, QueryResult};
use crate::query::SelectorQuery;
use crate::sync::Synchronizer;
use crate::value::{IntoLocator, QueryOptions};

// ============================================================================
// Session
// ============================================================================

/// Driver handle plus the options queries are built with.
#[derive(Clone)]
pub struct Session {
    driver: Arc<dyn Driver>,
    options: SessionOptions,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("options", &self.options)
            .field("wait_supported", &self.driver.wait_supported())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Creates a session with default options.
    #[must_use]
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self {
            driver,
            options: SessionOptions::default(),
        }
    }

    /// Creates a session with the given options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the options fail validation.
    pub fn with_options(driver: Arc<dyn Driver>, options: SessionOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { driver, options })
    }

    /// Returns the session options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Returns the driver.
    #[inline]
    #[must_use]
    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    /// Returns the current document scope.
    ///
    /// # Errors
    ///
    /// Driver errors.
    pub fn document(&self) -> Result<ScopeRef> {
        self.driver.document()
    }

    /// Builds a query with this session's options.
    ///
    /// # Errors
    ///
    /// Configuration errors from [`SelectorQuery::new`].
    pub fn query(
        &self,
        selector: Option<&str>,
        locator: impl IntoLocator,
        options: QueryOptions,
    ) -> Result<SelectorQuery> {
        SelectorQuery::new(selector, locator, options, &self.options)
    }
}

// ============================================================================
// Session - Synchronization
// ============================================================================

impl Session {
    /// Returns a synchronizer configured from the session and driver.
    #[must_use]
    pub fn synchronizer<'a>(&self, max_wait: Duration) -> Synchronizer<'a> {
        Synchronizer::new(max_wait)
            .interval(self.options.retry_interval)
            .wait_supported(self.driver.wait_supported())
            .retry_on(self.driver.invalid_element_errors())
    }

    /// Runs `attempt` with retries for up to `max_wait`.
    ///
    /// # Errors
    ///
    /// See [`Synchronizer::run`].
    pub fn synchronize<T, F>(&self, max_wait: Duration, attempt: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        self.synchronizer(max_wait).run(attempt)
    }

    /// Runs `attempt` against `element`, reloading it between retries when
    /// automatic reload is on.
    ///
    /// # Errors
    ///
    /// See [`Synchronizer::run`].
    pub fn synchronize_element<T, F>(&self, element: &Element, max_wait: Duration, mut attempt: F) -> Result<T>
    where
        F: FnMut(&Element) -> Result<T>,
    {
        self.element_synchronizer(Some(element), max_wait)
            .run(|| attempt(element))
    }

    /// Like [`Session::synchronize_element`], but reloads `element` only
    /// after failures for which `reload_if` holds.
    ///
    /// # Errors
    ///
    /// See [`Synchronizer::run`].
    pub fn synchronize_element_if<T, P, F>(
        &self,
        element: &Element,
        max_wait: Duration,
        reload_if: P,
        mut attempt: F,
    ) -> Result<T>
    where
        P: Fn(&Error) -> bool,
        F: FnMut(&Element) -> Result<T>,
    {
        self.element_synchronizer(Some(element), max_wait)
            .reload_if(reload_if)
            .run(|| attempt(element))
    }

    /// Polls `condition` until it holds.
    ///
    /// # Errors
    ///
    /// See [`Synchronizer::until`].
    pub fn wait_until<F>(&self, max_wait: Duration, condition: F) -> Result<()>
    where
        F: FnMut() -> Result<bool>,
    {
        self.synchronizer(max_wait).until(condition)
    }

    fn element_synchronizer<'a>(&self, element: Option<&'a Element>, max_wait: Duration) -> Synchronizer<'a> {
        let sync = self.synchronizer(max_wait);
        match element {
            Some(element) if self.options.automatic_reload => sync.reload_with(move || element.reload()),
            _ => sync,
        }
    }

    fn scope_for(&self, within: Option<&Element>) -> Result<ScopeRef> {
        match within {
            Some(element) => Ok(element.as_scope()),
            None => self.driver.document(),
        }
    }
}

// ============================================================================
// Session - Finders
// ============================================================================

impl Session {
    /// Finds exactly one element in the document.
    ///
    /// With `smart` and `prefer_exact` matching, exact matches are tried
    /// first. `smart` and `one` reject more than one match.
    ///
    /// # Errors
    ///
    /// - [`Error::ElementNotFound`] if nothing matched within the wait
    /// - [`Error::Ambiguous`] if the match policy rejects several matches
    /// - Configuration errors from building the query
    pub fn find(&self, selector: Option<&str>, locator: impl IntoLocator, options: QueryOptions) -> Result<Element> {
        let query = self.query(selector, locator, options)?;
        self.find_query(None, &query)
    }

    /// Finds exactly one element inside `scope`.
    ///
    /// # Errors
    ///
    /// See [`Session::find`].
    pub fn find_in(
        &self,
        scope: &Element,
        selector: Option<&str>,
        locator: impl IntoLocator,
        options: QueryOptions,
    ) -> Result<Element> {
        let query = self.query(selector, locator, options)?;
        self.find_query(Some(scope), &query)
    }

    /// Finds exactly one element for a prebuilt query.
    ///
    /// # Errors
    ///
    /// See [`Session::find`].
    pub fn find_query(&self, within: Option<&Element>, query: &SelectorQuery) -> Result<Element> {
        self.element_synchronizer(within, query.wait())
            .run(|| self.resolve_one(within, query))
    }

    /// Finds every matching element in the document.
    ///
    /// Without count options at least one match is awaited, and an empty
    /// result is returned when none shows up.
    ///
    /// # Errors
    ///
    /// - [`Error::ExpectationNotMet`] if explicit count options are not met,
    ///   or there are too many matches
    /// - Configuration errors from building the query
    pub fn all(&self, selector: Option<&str>, locator: impl IntoLocator, options: QueryOptions) -> Result<QueryResult> {
        let query = self.query(selector, locator, options)?;
        self.all_query(None, &query)
    }

    /// Finds every matching element inside `scope`.
    ///
    /// # Errors
    ///
    /// See [`Session::all`].
    pub fn all_in(
        &self,
        scope: &Element,
        selector: Option<&str>,
        locator: impl IntoLocator,
        options: QueryOptions,
    ) -> Result<QueryResult> {
        let query = self.query(selector, locator, options)?;
        self.all_query(Some(scope), &query)
    }

    /// Finds every matching element for a prebuilt query.
    ///
    /// # Errors
    ///
    /// See [`Session::all`].
    pub fn all_query(&self, within: Option<&Element>, query: &SelectorQuery) -> Result<QueryResult> {
        let minimum_specified = query.count_options().is_specified();
        let query = if minimum_specified {
            query.clone()
        } else {
            query.with_counts(&QueryOptions::new().minimum(1))?
        };

        let mut last = None;
        let outcome = self.element_synchronizer(within, query.wait()).run(|| {
            let scope = self.scope_for(within)?;
            let result = query.resolve_for(&scope, None)?;
            let failure = (!result.matches_count()).then(|| result.failure_message());
            let compare = result.compare_count();
            last = Some(compare);
            match failure {
                Some(message) => Err(Error::expectation_not_met(message)),
                None => Ok(result),
            }
        });

        match outcome {
            Err(Error::ExpectationNotMet { .. })
                if !minimum_specified && last != Some(Ordering::Greater) =>
            {
                debug!(query = %query.description(), "No matches, returning empty result");
                Ok(QueryResult::empty(query))
            }
            other => other,
        }
    }

    /// Finds the first of at least one matching element in the document.
    ///
    /// # Errors
    ///
    /// - [`Error::ExpectationNotMet`] if the count options are not met
    /// - Configuration errors from building the query
    pub fn first(&self, selector: Option<&str>, locator: impl IntoLocator, options: QueryOptions) -> Result<Element> {
        let query = self.query(selector, locator, options)?;
        self.first_query(None, &query)
    }

    /// Finds the first of at least one matching element inside `scope`.
    ///
    /// # Errors
    ///
    /// See [`Session::first`].
    pub fn first_in(
        &self,
        scope: &Element,
        selector: Option<&str>,
        locator: impl IntoLocator,
        options: QueryOptions,
    ) -> Result<Element> {
        let query = self.query(selector, locator, options)?;
        self.first_query(Some(scope), &query)
    }

    /// Finds the first of at least one match for a prebuilt query.
    ///
    /// # Errors
    ///
    /// See [`Session::first`].
    pub fn first_query(&self, within: Option<&Element>, query: &SelectorQuery) -> Result<Element> {
        let query = if query.count_options().is_specified() {
            query.clone()
        } else {
            query.with_counts(&QueryOptions::new().minimum(1))?
        };

        let result = self.all_query(within, &query)?;
        result
            .first()
            .cloned()
            .ok_or_else(|| Error::element_not_found(format!("Unable to find {}", query.description())))
    }

    fn resolve_one(&self, within: Option<&Element>, query: &SelectorQuery) -> Result<Element> {
        let scope = self.scope_for(within)?;
        let policy = query.match_policy();

        let result = if policy.prefers_exact() {
            let exact = query.resolve_for(&scope, Some(true))?;
            if exact.is_empty() && !query.exact() {
                query.resolve_for(&scope, Some(false))?
            } else {
                exact
            }
        } else {
            query.resolve_for(&scope, None)?
        };

        if policy.rejects_ambiguity() && result.len() > 1 {
            return Err(Error::ambiguous(format!(
                "Ambiguous match, found {} elements matching {}",
                result.len(),
                query.description()
            )));
        }

        result
            .first()
            .cloned()
            .ok_or_else(|| Error::element_not_found(format!("Unable to find {}", query.description())))
    }
}
