//! Form field selectors and the shared `_field` filter set.

use crate::config::Visibility;
use crate::driver::{Scope, TextMode};
use crate::error::Result;
use crate::expression::{ExpressionFormat, XPath};
use crate::node::{Element, normalize_whitespace};
use crate::selector::definition::SelectorBuilder;
use crate::selector::filter::FilterOptions;
use crate::selector::filter_set::FilterSet;
use crate::value::{FilterValue, LocatorKind, QueryOptions};

use super::{
    attribute_pattern_matches, locate_field, narrow_xpath, state_matches, value_matches,
    with_attribute, with_text,
};

const LOCATOR_TYPES: &[LocatorKind] = &[LocatorKind::Text];

// ============================================================================
// _field
// ============================================================================

pub(crate) fn field_filter_set() -> FilterSet {
    FilterSet::builder("_field")
        .node_filter("checked", FilterOptions::boolean(), |node, value, _| {
            Ok(state_matches(value, node.is_checked()?))
        })
        .node_filter("unchecked", FilterOptions::boolean(), |node, value, _| {
            Ok(state_matches(value, !node.is_checked()?))
        })
        .node_filter(
            "disabled",
            FilterOptions::boolean()
                .with_default(false)
                .with_skip_if(FilterValue::all()),
            |node, value, _| Ok(state_matches(value, node.is_disabled()?)),
        )
        .node_filter("readonly", FilterOptions::boolean(), |node, value, _| {
            Ok(state_matches(value, node.is_readonly()?))
        })
        .node_filter("name", FilterOptions::new(), |node, value, _| {
            attribute_pattern_matches(node, "name", value)
        })
        .node_filter("placeholder", FilterOptions::new(), |node, value, _| {
            attribute_pattern_matches(node, "placeholder", value)
        })
        .expression_filter("name", xpath_only(FilterOptions::new()), |expr, value| {
            narrow_xpath(expr, |xpath| with_attribute(xpath, "name", value))
        })
        .expression_filter("placeholder", xpath_only(FilterOptions::new()), |expr, value| {
            narrow_xpath(expr, |xpath| with_attribute(xpath, "placeholder", value))
        })
        .expression_filter(
            "disabled",
            xpath_only(FilterOptions::boolean().with_skip_if(FilterValue::all())),
            |expr, value| {
                narrow_xpath(expr, |xpath| match value.as_bool() {
                    Some(false) => xpath.with(!XPath::attr("disabled")),
                    _ => xpath,
                })
            },
        )
        .expression_filter("multiple", xpath_only(FilterOptions::boolean()), |expr, value| {
            narrow_xpath(expr, |xpath| match value.as_bool() {
                Some(true) => xpath.with(XPath::attr("multiple")),
                _ => xpath.with(!XPath::attr("multiple")),
            })
        })
        .describe(|options| {
            let mut desc = String::new();
            if options.get("disabled") == Some(&FilterValue::Bool(false)) {
                desc.push_str(" that is not disabled");
            }
            if let Some(name) = options.get("name") {
                desc.push_str(&format!(" with name {name}"));
            }
            if let Some(placeholder) = options.get("placeholder") {
                desc.push_str(&format!(" with placeholder {placeholder}"));
            }
            match options.get("multiple").and_then(FilterValue::as_bool) {
                Some(true) => desc.push_str(" with the multiple attribute"),
                Some(false) => desc.push_str(" without the multiple attribute"),
                None => {}
            }
            Some(desc)
        })
        .describe(|options| {
            let flag = |key: &str| options.get(key).and_then(FilterValue::as_bool);
            let mut states = Vec::new();
            if flag("checked") == Some(true) || flag("unchecked") == Some(false) {
                states.push("checked");
            }
            if flag("unchecked") == Some(true) || flag("checked") == Some(false) {
                states.push("not checked");
            }
            if flag("disabled") == Some(true) {
                states.push("disabled");
            }
            if flag("readonly") == Some(true) {
                states.push("readonly");
            }
            (!states.is_empty()).then(|| format!(" that is {}", states.join(" and ")))
        })
        .build()
}

/// Restricts a `_field` expression filter to XPath selectors, so importing
/// the set into a CSS selector leaves its expression alone.
fn xpath_only(options: FilterOptions) -> FilterOptions {
    options.with_format(ExpressionFormat::XPath)
}

// ============================================================================
// field
// ============================================================================

pub(crate) fn field() -> SelectorBuilder {
    SelectorBuilder::new("field")
        .locator_types(LOCATOR_TYPES)
        .default_visibility(|options| {
            is_hidden_type(options).then_some(Visibility::Hidden)
        })
        .xpath(|input| {
            let mut invalid = vec!["submit", "image"];
            if !is_hidden_type(input.options) {
                invalid.push("hidden");
            }
            let xpath = XPath::descendant(&["input", "textarea", "select"])
                .with(!XPath::attr("type").one_of(&invalid));
            Ok(locate_field(xpath, input))
        })
        .expression_filter("type", FilterOptions::new(), |expr, value| {
            let kind = value.to_text();
            narrow_xpath(expr, |xpath| match kind.as_str() {
                "textarea" | "select" => xpath.self_named(&kind),
                _ => xpath.with(XPath::attr("type").equals(kind.as_str())),
            })
        })
        .filter_set("_field", None)
        .node_filter("with", FilterOptions::new(), value_matches)
        .describe(describe_type)
        .describe(describe_with)
}

fn is_hidden_type(options: &QueryOptions) -> bool {
    options
        .get("type")
        .is_some_and(|kind| kind.to_text() == "hidden")
}

fn describe_type(options: &QueryOptions) -> Option<String> {
    options
        .get("type")
        .map(|kind| format!(" of type {:?}", kind.to_text()))
}

fn describe_with(options: &QueryOptions) -> Option<String> {
    options
        .get("with")
        .map(|with| format!(" with value {:?}", with.to_text()))
}

// ============================================================================
// fillable_field
// ============================================================================

pub(crate) fn fillable_field() -> SelectorBuilder {
    SelectorBuilder::new("fillable_field")
        .label("field")
        .locator_types(LOCATOR_TYPES)
        .xpath(|input| {
            let xpath = XPath::descendant(&["input", "textarea"]).with(
                !XPath::attr("type").one_of(&["submit", "image", "radio", "checkbox", "hidden", "file"]),
            );
            Ok(locate_field(xpath, input))
        })
        .expression_filter("type", FilterOptions::new(), |expr, value| {
            let kind = value.to_text();
            narrow_xpath(expr, |xpath| match kind.as_str() {
                "textarea" => xpath.self_named("textarea"),
                _ => xpath.with(XPath::attr("type").equals(kind.as_str())),
            })
        })
        .filter_set("_field", Some(&["disabled", "readonly", "name", "placeholder", "multiple"]))
        .node_filter("with", FilterOptions::new(), value_matches)
        .describe(describe_type)
        .describe(describe_with)
}

// ============================================================================
// checkbox / radio_button
// ============================================================================

pub(crate) fn checkbox() -> SelectorBuilder {
    toggle("checkbox", "checkbox")
}

pub(crate) fn radio_button() -> SelectorBuilder {
    toggle("radio_button", "radio").label("radio button")
}

fn toggle(name: &str, input_type: &'static str) -> SelectorBuilder {
    SelectorBuilder::new(name)
        .locator_types(LOCATOR_TYPES)
        .xpath(move |input| {
            let xpath =
                XPath::descendant(&["input"]).with(XPath::attr("type").equals(input_type));
            Ok(locate_field(xpath, input))
        })
        .filter_set("_field", Some(&["checked", "unchecked", "disabled", "name"]))
        .node_filter("option", FilterOptions::new(), value_matches)
        .describe(|options| {
            options
                .get("option")
                .map(|option| format!(" with value {}", option.inspect()))
        })
}

// ============================================================================
// select / option
// ============================================================================

pub(crate) fn select() -> SelectorBuilder {
    SelectorBuilder::new("select")
        .label("select box")
        .locator_types(LOCATOR_TYPES)
        .xpath(|input| Ok(locate_field(XPath::descendant(&["select"]), input)))
        .filter_set("_field", Some(&["disabled", "multiple", "name", "placeholder"]))
        .node_filter("options", FilterOptions::new(), |node, value, errors| {
            let mut expected = texts(value);
            let mut actual = option_texts(node, false)?;
            expected.sort();
            actual.sort();
            let matches = expected == actual;
            if !matches {
                errors.push(format!("Expected options {expected:?} found {actual:?}"));
            }
            Ok(matches)
        })
        .expression_filter("with_options", FilterOptions::new(), |expr, value| {
            narrow_xpath(expr, |xpath| {
                texts(value).iter().fold(xpath, |xpath, option| {
                    xpath.with(with_text(XPath::descendant(&["option"]), option))
                })
            })
        })
        .node_filter("selected", FilterOptions::new(), |node, value, errors| {
            let mut expected = texts(value);
            let mut actual = option_texts(node, true)?;
            expected.sort();
            actual.sort();
            let matches = expected == actual;
            if !matches {
                errors.push(format!("Expected {expected:?} to be selected found {actual:?}"));
            }
            Ok(matches)
        })
        .node_filter("with_selected", FilterOptions::new(), |node, value, errors| {
            let actual = option_texts(node, true)?;
            let missing: Vec<String> = texts(value)
                .into_iter()
                .filter(|text| !actual.contains(text))
                .collect();
            if !missing.is_empty() {
                errors.push(format!(
                    "Expected at least {missing:?} to be selected found {actual:?}"
                ));
            }
            Ok(missing.is_empty())
        })
        .describe(|options| {
            options
                .get("with_options")
                .map(|with| format!(" with at least options {}", with.inspect()))
        })
        .describe(|options| {
            let mut desc = String::new();
            if let Some(expected) = options.get("options") {
                desc.push_str(&format!(" with options {}", expected.inspect()));
            }
            if let Some(selected) = options.get("selected") {
                desc.push_str(&format!(" with {} selected", selected.inspect()));
            }
            if let Some(selected) = options.get("with_selected") {
                desc.push_str(&format!(" with at least {} selected", selected.inspect()));
            }
            Some(desc)
        })
}

pub(crate) fn option() -> SelectorBuilder {
    SelectorBuilder::new("option")
        .locator_types(LOCATOR_TYPES)
        .xpath(|input| {
            let xpath = XPath::descendant(&["option"]);
            Ok(match input.locator_text() {
                Some(text) => with_text(xpath, &text),
                None => xpath,
            })
        })
        .node_filter("disabled", FilterOptions::boolean(), |node, value, _| {
            Ok(state_matches(value, node.is_disabled()?))
        })
        .expression_filter("disabled", FilterOptions::boolean(), |expr, value| {
            narrow_xpath(expr, |xpath| match value.as_bool() {
                Some(false) => xpath.with(!XPath::attr("disabled")),
                _ => xpath,
            })
        })
        .node_filter("selected", FilterOptions::boolean(), |node, value, _| {
            Ok(state_matches(value, node.is_selected()?))
        })
        .describe(|options| {
            let mut desc = String::new();
            if let Some(disabled) = options.get("disabled").and_then(FilterValue::as_bool) {
                desc.push_str(if disabled {
                    " that is disabled"
                } else {
                    " that is not disabled"
                });
            }
            if let Some(selected) = options.get("selected").and_then(FilterValue::as_bool) {
                desc.push_str(if selected {
                    " that is selected"
                } else {
                    " that is not selected"
                });
            }
            Some(desc)
        })
}

fn texts(value: &FilterValue) -> Vec<String> {
    value.to_list().iter().map(FilterValue::to_text).collect()
}

/// Normalized texts of the options inside `node`.
fn option_texts(node: &Element, selected_only: bool) -> Result<Vec<String>> {
    let mode = if node.is_visible()? {
        TextMode::Visible
    } else {
        TextMode::All
    };

    let mut texts = Vec::new();
    for option in node.find_xpath(".//option")? {
        if selected_only && !option.is_selected()? {
            continue;
        }
        texts.push(normalize_whitespace(&option.text(mode)?));
    }
    Ok(texts)
}

// ============================================================================
// Tests
// ============================================================================
