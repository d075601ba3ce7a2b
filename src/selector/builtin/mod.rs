//! Built-in selectors and filter sets.
//!
//! Installed into the registries on first access.
//!
//! | Module | Selectors |
//! |--------|-----------|
//! | [`basic`] | `xpath`, `css`, `id`, `label`, `table`, `table_row` |
//! | [`field`] | `_field` set, `field`, `fillable_field`, `checkbox`, `radio_button`, `select`, `option` |
//! | [`button`] | `button`, `link`, `link_or_button` |

// ============================================================================
// Submodules
// ============================================================================

pub mod basic;
pub mod button;
pub mod field;

// ============================================================================
// Imports
// ============================================================================

use tracing::warn;

use super::definition::{ExpressionInput, SelectorDefinition};
use super::filter_set::FilterSet;
use crate::error::{Error, Result};
use crate::expression::{Expression, XPath, XPathBuilder};
use crate::node::Element;
use crate::value::FilterValue;

// ============================================================================
// Registry Contents
// ============================================================================

/// Built-in filter sets.
pub(crate) fn filter_sets() -> Vec<FilterSet> {
    vec![field::field_filter_set()]
}

/// Built-in selectors in detection order.
pub(crate) fn selectors() -> Vec<SelectorDefinition> {
    let builders = [
        basic::xpath(),
        basic::css(),
        basic::id(),
        field::field(),
        field::fillable_field(),
        field::checkbox(),
        field::radio_button(),
        field::select(),
        field::option(),
        button::button(),
        button::link(),
        button::link_or_button(),
        basic::label(),
        basic::table(),
        basic::table_row(),
    ];

    builders
        .into_iter()
        .filter_map(|builder| match builder.build() {
            Ok(definition) => Some(definition),
            Err(e) => {
                warn!(error = %e, "Skipping built-in selector");
                None
            }
        })
        .collect()
}

// ============================================================================
// Helpers
// ============================================================================

/// Applies `narrow` to an XPath expression.
pub(crate) fn narrow_xpath<F>(expression: Expression, narrow: F) -> Result<Expression>
where
    F: FnOnce(XPath) -> XPath,
{
    match expression {
        Expression::XPath(xpath) => Ok(Expression::XPath(narrow(xpath))),
        Expression::Css(_) => Err(Error::config(
            "XPath expression filter applied to a CSS expression",
        )),
    }
}

/// `path[normalize-space(string(.)) is text]`
pub(crate) fn with_text(path: XPath, text: &str) -> XPath {
    path.with(XPath::string().normalize().is(text))
}

/// Adds an attribute condition for `value`, if it constrains anything.
pub(crate) fn with_attribute(path: XPath, attribute: &str, value: &FilterValue) -> XPath {
    path.with_opt(XPathBuilder::attribute_conditions(&[(attribute, value)]))
}

/// Matches a field by id, name, placeholder, associated label or wrapping
/// label.
pub(crate) fn locate_field(xpath: XPath, input: &ExpressionInput<'_>) -> XPath {
    let Some(locator) = input.locator_text() else {
        return xpath;
    };
    let locator = locator.as_str();

    let label_for = with_text(XPath::anywhere(&["label"]), locator).attribute("for");
    let mut matchers = XPath::attr("id").equals(locator)
        | XPath::attr("name").equals(locator)
        | XPath::attr("placeholder").equals(locator)
        | XPath::attr("id").equals(label_for);
    if input.config.enable_aria_label {
        matchers = matchers | XPath::attr("aria-label").is(locator);
    }
    if let Some(test_id) = &input.config.test_id {
        matchers = matchers | XPath::attr(test_id.as_str()).equals(locator);
    }

    let wrapping_label = with_text(XPath::descendant(&["label"]), locator);
    xpath.clone().with(matchers).union(xpath.rooted_at(wrapping_label))
}

/// Compares a boolean filter value against a node state.
pub(crate) fn state_matches(value: &FilterValue, state: bool) -> bool {
    value.as_bool() == Some(state)
}

/// Patterns are checked against the attribute; anything else was already
/// handled by the expression.
pub(crate) fn attribute_pattern_matches(
    node: &Element,
    attribute: &str,
    value: &FilterValue,
) -> Result<bool> {
    match value.as_pattern() {
        Some(re) => Ok(node
            .attribute(attribute)?
            .is_some_and(|actual| re.is_match(&actual))),
        None => Ok(true),
    }
}

/// Compares a node value against text or a pattern, recording a reason on
/// mismatch.
pub(crate) fn value_matches(
    node: &Element,
    expected: &FilterValue,
    errors: &mut Vec<String>,
) -> Result<bool> {
    let actual = node.value()?.unwrap_or_default();
    let matches = match expected.as_pattern() {
        Some(re) => re.is_match(&actual),
        None => actual == expected.to_text(),
    };
    if !matches {
        errors.push(format!(
            "Expected value to be {} but was {actual:?}",
            expected.inspect()
        ));
    }
    Ok(matches)
}

// ============================================================================
// Tests
// ============================================================================
