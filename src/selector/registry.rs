//! Process-wide selector registry.
//!
//! Built-in selectors are installed on first access. Registration is meant
//! to happen once at startup; [`freeze`] closes that phase so concurrent
//! readers never observe a definition changing underneath them.
//!
//! # Example
//!
//! ```ignore
//! use locator_engine::selector;
//!
//! selector::update("button", |builder| builder.label("action button"))?;
//! selector::freeze();
//!
//! let button = selector::get("button")?;
//! assert_eq!(button.label(), "action button");
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::debug;

use super::builtin;
use super::definition::{SelectorBuilder, SelectorDefinition};
use crate::error::{Error, Result};
use crate::value::LocatorValue;

// ============================================================================
// Registry
// ============================================================================

/// Definitions by name plus registration order, which drives detection.
struct Registry {
    selectors: FxHashMap<String, Arc<SelectorDefinition>>,
    order: Vec<String>,
}

impl Registry {
    fn insert(&mut self, definition: SelectorDefinition) {
        let name = definition.name().to_string();
        if self
            .selectors
            .insert(name.clone(), Arc::new(definition))
            .is_none()
        {
            self.order.push(name);
        }
    }

    fn remove(&mut self, name: &str) -> Option<Arc<SelectorDefinition>> {
        let removed = self.selectors.remove(name)?;
        self.order.retain(|n| n != name);
        Some(removed)
    }
}

static REGISTRY: LazyLock<RwLock<Registry>> = LazyLock::new(|| {
    let mut registry = Registry {
        selectors: FxHashMap::default(),
        order: Vec::new(),
    };
    for definition in builtin::selectors() {
        registry.insert(definition);
    }
    debug!(selectors = registry.order.len(), "Built-in selectors installed");
    RwLock::new(registry)
});

/// Set once registration is closed.
static FROZEN: AtomicBool = AtomicBool::new(false);

// ============================================================================
// Registration
// ============================================================================

/// Registers a definition, replacing one of the same name.
///
/// # Errors
///
/// Returns [`Error::Config`] after [`freeze`].
pub fn add(definition: SelectorDefinition) -> Result<()> {
    ensure_open()?;
    debug!(
        selector = %definition.name(),
        format = %definition.format(),
        filters = definition.filter_set().filters().len(),
        "Selector registered"
    );
    REGISTRY.write().insert(definition);
    Ok(())
}

/// Reopens a registered definition, extends it and registers the result.
///
/// # Errors
///
/// Returns [`Error::UnknownSelector`] if `name` is not registered,
/// [`Error::Config`] after [`freeze`], or whatever the rebuilt
/// definition fails with.
pub fn update<F>(name: &str, extend: F) -> Result<()>
where
    F: FnOnce(SelectorBuilder) -> SelectorBuilder,
{
    ensure_open()?;
    let existing = get(name)?;
    let definition = extend(existing.to_builder()).build()?;
    if definition.name() != name {
        return Err(Error::config(format!(
            "update of :{name} produced a selector named :{}",
            definition.name()
        )));
    }
    add(definition)
}

/// Removes a definition.
///
/// # Errors
///
/// Returns [`Error::Config`] after [`freeze`].
pub fn remove(name: &str) -> Result<Option<Arc<SelectorDefinition>>> {
    ensure_open()?;
    let removed = REGISTRY.write().remove(name);
    if removed.is_some() {
        debug!(selector = %name, "Selector removed");
    }
    Ok(removed)
}

/// Closes the registration phase.
///
/// Afterwards `add`, `update` and `remove` (for selectors and filter sets)
/// fail. There is no way to reopen.
pub fn freeze() {
    if !FROZEN.swap(true, Ordering::SeqCst) {
        debug!("Selector registries frozen");
    }
}

/// Returns `true` once [`freeze`] was called.
#[inline]
#[must_use]
pub fn is_frozen() -> bool {
    FROZEN.load(Ordering::SeqCst)
}

pub(crate) fn ensure_open() -> Result<()> {
    if is_frozen() {
        Err(Error::config("selector registries are frozen"))
    } else {
        Ok(())
    }
}

// ============================================================================
// Lookup
// ============================================================================

/// Returns the definition named `name`.
///
/// # Errors
///
/// Returns [`Error::UnknownSelector`] if no such definition is registered.
pub fn get(name: &str) -> Result<Arc<SelectorDefinition>> {
    REGISTRY
        .read()
        .selectors
        .get(name)
        .cloned()
        .ok_or_else(|| Error::unknown_selector(name))
}

/// Returns every definition in registration order.
#[must_use]
pub fn all() -> Vec<Arc<SelectorDefinition>> {
    let registry = REGISTRY.read();
    registry
        .order
        .iter()
        .filter_map(|name| registry.selectors.get(name).cloned())
        .collect()
}

/// Returns the registered names in registration order.
#[must_use]
pub fn names() -> Vec<String> {
    REGISTRY.read().order.clone()
}

/// Returns the first definition, in registration order, claiming `locator`.
#[must_use]
pub fn detect(locator: &LocatorValue) -> Option<Arc<SelectorDefinition>> {
    let registry = REGISTRY.read();
    registry
        .order
        .iter()
        .filter_map(|name| registry.selectors.get(name))
        .find(|definition| definition.matches_locator(locator))
        .cloned()
}

/// Picks the selector for a query.
///
/// An explicit name wins; otherwise a claiming definition, otherwise
/// `default_selector`.
///
/// # Errors
///
/// Returns [`Error::UnknownSelector`] for an unregistered name.
pub fn resolve(
    name: Option<&str>,
    locator: Option<&LocatorValue>,
    default_selector: &str,
) -> Result<Arc<SelectorDefinition>> {
    if let Some(name) = name {
        return get(name);
    }
    match locator.and_then(detect) {
        Some(definition) => Ok(definition),
        None => get(default_selector),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::XPath;

    #[test]
    fn test_builtins_registered() {
        for name in ["xpath", "css", "id", "field", "button", "link", "table"] {
            assert!(get(name).is_ok(), "missing :{name}");
        }
    }

    #[test]
    fn test_unknown_selector() {
        let err = get("no_such_selector").unwrap_err();
        assert!(matches!(err, Error::UnknownSelector { .. }));
    }

    #[test]
    fn test_detect_xpath_locators() {
        assert_eq!(detect(&"//div".into()).map(|d| d.name().to_string()), Some("xpath".into()));
        assert_eq!(detect(&"./p".into()).map(|d| d.name().to_string()), Some("xpath".into()));
        assert_eq!(detect(&"(//a)[1]".into()).map(|d| d.name().to_string()), Some("xpath".into()));
        assert!(detect(&"div.item".into()).is_none());
    }

    #[test]
    fn test_resolve_falls_back_to_default() {
        let definition = resolve(None, Some(&"div.item".into()), "css").unwrap();
        assert_eq!(definition.name(), "css");
        let definition = resolve(Some("button"), Some(&"//div".into()), "css").unwrap();
        assert_eq!(definition.name(), "button");
    }

    #[test]
    fn test_add_update_remove() {
        let definition = SelectorBuilder::new("registry_test_heading")
            .xpath(|_| Ok(XPath::descendant(&["h1"])))
            .build()
            .unwrap();
        add(definition).unwrap();
        assert!(names().iter().any(|n| n == "registry_test_heading"));

        update("registry_test_heading", |b| b.label("heading")).unwrap();
        assert_eq!(get("registry_test_heading").unwrap().label(), "heading");

        assert!(remove("registry_test_heading").unwrap().is_some());
        assert!(get("registry_test_heading").is_err());
    }
}
