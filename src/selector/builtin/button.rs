//! Clickable element selectors.

use regex::Regex;

use crate::config::SessionOptions;
use crate::expression::XPath;
use crate::selector::definition::{ExpressionInput, SelectorBuilder};
use crate::selector::filter::FilterOptions;
use crate::value::{FilterValue, LocatorKind, QueryOptions};

use super::{
    attribute_pattern_matches, narrow_xpath, state_matches, with_attribute, with_text,
};

const LOCATOR_TYPES: &[LocatorKind] = &[LocatorKind::Text];

// ============================================================================
// button
// ============================================================================

pub(crate) fn button() -> SelectorBuilder {
    SelectorBuilder::new("button")
        .locator_types(LOCATOR_TYPES)
        .xpath(|input| Ok(button_xpath(input)))
        .expression_options(&["value", "title", "type"])
        .node_filter(
            "disabled",
            FilterOptions::boolean()
                .with_default(false)
                .with_skip_if(FilterValue::all()),
            |node, value, _| Ok(state_matches(value, node.is_disabled()?)),
        )
        .expression_filter(
            "disabled",
            FilterOptions::boolean().with_skip_if(FilterValue::all()),
            |expr, value| {
                narrow_xpath(expr, |xpath| match value.as_bool() {
                    Some(false) => xpath.with(!XPath::attr("disabled")),
                    _ => xpath,
                })
            },
        )
        .node_filter("name", FilterOptions::new(), |node, value, _| {
            attribute_pattern_matches(node, "name", value)
        })
        .expression_filter("name", FilterOptions::new(), |expr, value| {
            narrow_xpath(expr, |xpath| with_attribute(xpath, "name", value))
        })
        .describe(|options| {
            let mut desc = String::new();
            if options.get("disabled") == Some(&FilterValue::Bool(false)) {
                desc.push_str(" that is not disabled");
            }
            desc.push_str(&describe_attributes(options, &["value", "title", "type", "name"]));
            Some(desc)
        })
        .describe(|options| {
            (options.get("disabled") == Some(&FilterValue::Bool(true)))
                .then(|| " that is disabled".to_string())
        })
}

/// Inputs of a button type, `<button>` elements and image inputs.
fn button_xpath(input: &ExpressionInput<'_>) -> XPath {
    let mut input_button = XPath::descendant(&["input"])
        .with(XPath::attr("type").one_of(&["submit", "reset", "image", "button"]));
    let mut button = XPath::descendant(&["button"]);
    let mut image_button =
        XPath::descendant(&["input"]).with(XPath::attr("type").equals("image"));

    if let Some(locator) = input.locator_text() {
        let locator = locator.as_str();
        let matchers = combine_locators(locator, input.config);
        let button_matchers = matchers.clone()
            | XPath::string().normalize().is(locator)
            | XPath::descendant(&["img"]).with(XPath::attr("alt").is(locator));
        let mut alt_matchers = XPath::attr("alt").is(locator);
        if input.config.enable_aria_label {
            alt_matchers = alt_matchers | XPath::attr("aria-label").is(locator);
        }

        input_button = input_button.with(matchers);
        button = button.with(button_matchers);
        image_button = image_button.with(alt_matchers);
    }

    let mut xpath = input_button.union(button).union(image_button);
    for attribute in ["value", "title", "type"] {
        if let Some(value) = input.option(attribute) {
            xpath = xpath.with(XPath::attr(attribute).equals(value.to_text()));
        }
    }
    xpath
}

fn combine_locators(locator: &str, config: &SessionOptions) -> XPath {
    let label_for = with_text(XPath::anywhere(&["label"]), locator).attribute("for");
    let mut matchers = XPath::attr("id").equals(locator)
        | XPath::attr("name").equals(locator)
        | XPath::attr("value").is(locator)
        | XPath::attr("title").is(locator)
        | XPath::attr("id").equals(label_for);
    if config.enable_aria_label {
        matchers = matchers | XPath::attr("aria-label").is(locator);
    }
    if let Some(test_id) = &config.test_id {
        matchers = matchers | XPath::attr(test_id.as_str()).equals(locator);
    }
    matchers
}

fn describe_attributes(options: &QueryOptions, names: &[&str]) -> String {
    names
        .iter()
        .filter_map(|name| {
            options
                .get(name)
                .map(|value| format!(" with {name} {value}"))
        })
        .collect()
}

// ============================================================================
// link
// ============================================================================

pub(crate) fn link() -> SelectorBuilder {
    let any_text = Regex::new(r"(?s)\A.*\z").expect("static pattern");

    SelectorBuilder::new("link")
        .locator_types(LOCATOR_TYPES)
        .xpath(|input| Ok(link_xpath(input)))
        .expression_options(&["href", "alt", "title", "target"])
        .node_filter("href", FilterOptions::new(), |node, value, errors| {
            let Some(re) = value.as_pattern() else {
                return Ok(true);
            };
            let actual = node.attribute("href")?;
            let matches = actual.as_deref().is_some_and(|href| re.is_match(href));
            if !matches {
                errors.push(format!(
                    "Expected href to match {} but it was {actual:?}",
                    value.inspect()
                ));
            }
            Ok(matches)
        })
        .describe(|options| {
            let mut desc = String::new();
            match options.get("href") {
                Some(FilterValue::Nil | FilterValue::Bool(false)) => {
                    desc.push_str(" with no href attribute");
                }
                Some(FilterValue::Bool(true)) | None => {}
                Some(href @ FilterValue::Pattern(_)) => {
                    desc.push_str(&format!(" with href matching {}", href.inspect()));
                }
                Some(href) => desc.push_str(&format!(" with href {}", href.inspect())),
            }
            match options.get("download") {
                Some(FilterValue::Bool(true)) => desc.push_str(" with download attribute"),
                Some(FilterValue::Bool(false)) => desc.push_str(" without download attribute"),
                Some(name @ FilterValue::Text(_)) => {
                    desc.push_str(&format!(" with download attribute {name}"));
                }
                _ => {}
            }
            Some(desc)
        })
        .expression_filter(
            "download",
            FilterOptions::new().with_valid_values(vec![true.into(), false.into(), any_text.into()]),
            |expr, value| narrow_xpath(expr, |xpath| with_attribute(xpath, "download", value)),
        )
}

fn link_xpath(input: &ExpressionInput<'_>) -> XPath {
    let mut xpath = XPath::descendant(&["a"]);

    let any_href = FilterValue::Bool(true);
    let href = input.option("href").unwrap_or(&any_href);
    if href.as_bool() != Some(false) {
        xpath = with_attribute(xpath, "href", href);
    }

    if let Some(locator) = input.locator_text() {
        let locator = locator.as_str();
        let mut matchers = XPath::attr("id").equals(locator)
            | XPath::string().normalize().is(locator)
            | XPath::attr("title").is(locator)
            | XPath::descendant(&["img"]).with(XPath::attr("alt").is(locator));
        if input.config.enable_aria_label {
            matchers = matchers | XPath::attr("aria-label").is(locator);
        }
        if let Some(test_id) = &input.config.test_id {
            matchers = matchers | XPath::attr(test_id.as_str()).equals(locator);
        }
        xpath = xpath.with(matchers);
    }

    if let Some(title) = input.option("title") {
        xpath = xpath.with(XPath::attr("title").equals(title.to_text()));
    }
    if let Some(alt) = input.option("alt") {
        xpath = xpath.with(
            XPath::descendant(&["img"]).with(XPath::attr("alt").equals(alt.to_text())),
        );
    }
    if let Some(target) = input.option("target") {
        xpath = xpath.with(XPath::attr("target").equals(target.to_text()));
    }
    xpath
}

// ============================================================================
// link_or_button
// ============================================================================

pub(crate) fn link_or_button() -> SelectorBuilder {
    SelectorBuilder::new("link_or_button")
        .label("link or button")
        .locator_types(LOCATOR_TYPES)
        .xpath(|input| Ok(link_xpath(input).union(button_xpath(input))))
        .expression_options(&["href", "alt", "title", "target", "value", "type"])
        .node_filter(
            "disabled",
            FilterOptions::boolean()
                .with_default(false)
                .with_skip_if(FilterValue::all()),
            |node, value, _| {
                Ok(node.tag_name()? == "a" || state_matches(value, node.is_disabled()?))
            },
        )
        .describe(|options| {
            (options.get("disabled") == Some(&FilterValue::Bool(true)))
                .then(|| " that is disabled".to_string())
        })
}

// ============================================================================
// Tests
// ============================================================================
