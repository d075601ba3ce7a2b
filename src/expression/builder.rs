//! Attribute and class condition builders.
//!
//! Turn filter values into expression fragments: `[name='x']` and
//! `.btn:not(.active)` for CSS, predicates for XPath. Patterns are reduced to
//! the literal substrings every match must contain.

// ============================================================================
// Imports
// ============================================================================

use super::css;
use super::xpath::XPath;
use crate::selector::RegexpDisassembler;
use crate::value::FilterValue;

// ============================================================================
// Class Names
// ============================================================================

/// A class requirement parsed from a filter value.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ClassName<'a> {
    Present(&'a str),
    Absent(&'a str),
}

/// `!name` negates; `!!!name` matches a class literally named `!name`.
fn parse_class(raw: &str) -> ClassName<'_> {
    if raw.starts_with('!') && !raw.starts_with("!!!") {
        ClassName::Absent(&raw[1..])
    } else {
        ClassName::Present(raw.strip_prefix("!!").unwrap_or(raw))
    }
}

fn class_names(classes: &FilterValue) -> Vec<String> {
    classes
        .to_list()
        .iter()
        .map(FilterValue::to_text)
        .filter(|name| !name.is_empty())
        .collect()
}

// ============================================================================
// CssBuilder
// ============================================================================

/// Builds CSS condition suffixes.
#[derive(Debug, Clone, Copy, Default)]
pub struct CssBuilder;

impl CssBuilder {
    /// Conditions for `(attribute, value)` pairs, concatenated.
    #[must_use]
    pub fn attribute_conditions(attributes: &[(&str, &FilterValue)]) -> String {
        attributes
            .iter()
            .map(|(attribute, value)| Self::attribute_condition(attribute, value))
            .collect()
    }

    fn attribute_condition(attribute: &str, value: &FilterValue) -> String {
        match value {
            FilterValue::Pattern(re) => {
                let disassembler = RegexpDisassembler::new(re);
                let flag = if disassembler.is_casefold() { " i" } else { "" };
                disassembler
                    .substrings()
                    .iter()
                    .map(|sub| format!("[{attribute}*={}{flag}]", css::quote(sub)))
                    .collect()
            }
            FilterValue::Bool(true) => format!("[{attribute}]"),
            FilterValue::Bool(false) | FilterValue::Nil => format!(":not([{attribute}])"),
            other if attribute == "id" => format!("#{}", css::escape(&other.to_text())),
            other => format!("[{attribute}={}]", css::quote(&other.to_text())),
        }
    }

    /// Class conditions; `!name` entries become `:not(.name)`.
    #[must_use]
    pub fn class_conditions(classes: &FilterValue) -> String {
        if let FilterValue::Pattern(_) = classes {
            return Self::attribute_conditions(&[("class", classes)]);
        }

        let names = class_names(classes);
        let (present, absent): (Vec<_>, Vec<_>) = names
            .iter()
            .map(|raw| parse_class(raw))
            .partition(|name| matches!(name, ClassName::Present(_)));

        let mut out = String::new();
        for name in present.iter().chain(absent.iter()) {
            match name {
                ClassName::Present(cls) => {
                    out.push('.');
                    out.push_str(&css::escape(cls));
                }
                ClassName::Absent(cls) => {
                    out.push_str(":not(.");
                    out.push_str(&css::escape(cls));
                    out.push(')');
                }
            }
        }
        out
    }

    /// Appends attribute conditions to every selector of a selector list.
    #[must_use]
    pub fn add_attribute_conditions(selector: &str, attributes: &[(&str, &FilterValue)]) -> String {
        css::append_to_each(selector, &Self::attribute_conditions(attributes))
    }

    /// Appends class conditions to every selector of a selector list.
    #[must_use]
    pub fn add_class_conditions(selector: &str, classes: &FilterValue) -> String {
        css::append_to_each(selector, &Self::class_conditions(classes))
    }
}

// ============================================================================
// XPathBuilder
// ============================================================================

/// Builds XPath predicates.
#[derive(Debug, Clone, Copy, Default)]
pub struct XPathBuilder;

impl XPathBuilder {
    /// Conjunction of conditions for `(attribute, value)` pairs.
    ///
    /// Returns `None` when there is nothing to constrain.
    #[must_use]
    pub fn attribute_conditions(attributes: &[(&str, &FilterValue)]) -> Option<XPath> {
        attributes
            .iter()
            .map(|(attribute, value)| Self::attribute_condition(attribute, value))
            .reduce(|acc, cond| acc & cond)
    }

    fn attribute_condition(attribute: &str, value: &FilterValue) -> XPath {
        match value {
            FilterValue::Pattern(re) => {
                XPath::attr(attribute).with_opt(Self::pattern_conditions(&RegexpDisassembler::new(re)))
            }
            FilterValue::Bool(true) => XPath::attr(attribute),
            FilterValue::Bool(false) | FilterValue::Nil => !XPath::attr(attribute),
            other => XPath::attr(attribute).equals(other.to_text()),
        }
    }

    fn pattern_conditions(disassembler: &RegexpDisassembler) -> Option<XPath> {
        let subject = if disassembler.is_casefold() {
            XPath::current().uppercase()
        } else {
            XPath::current()
        };
        disassembler
            .substrings()
            .iter()
            .map(|sub| subject.clone().contains(sub.as_str()))
            .reduce(|acc, cond| acc & cond)
    }

    /// Conjunction of class conditions; `!name` entries are negated.
    #[must_use]
    pub fn class_conditions(classes: &FilterValue) -> Option<XPath> {
        if let FilterValue::Pattern(_) = classes {
            return Self::attribute_conditions(&[("class", classes)]);
        }

        class_names(classes)
            .iter()
            .map(|raw| match parse_class(raw) {
                ClassName::Present(cls) => XPath::attr("class").contains_word(cls),
                ClassName::Absent(cls) => !XPath::attr("class").contains_word(cls),
            })
            .reduce(|acc, cond| acc & cond)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use regex::Regex;

    use super::*;

    #[test]
    fn test_css_attribute_values() {
        let name = FilterValue::from("email");
        let required = FilterValue::from(true);
        let disabled = FilterValue::from(false);
        assert_eq!(
            CssBuilder::attribute_conditions(&[
                ("name", &name),
                ("required", &required),
                ("disabled", &disabled),
            ]),
            "[name='email'][required]:not([disabled])"
        );
    }

    #[test]
    fn test_css_id_uses_hash() {
        let id = FilterValue::from("main-nav");
        assert_eq!(CssBuilder::attribute_conditions(&[("id", &id)]), "#main-nav");
    }

    #[test]
    fn test_css_pattern_substrings() {
        let pattern = FilterValue::from(Regex::new("user_\\d+_name").unwrap());
        assert_eq!(
            CssBuilder::attribute_conditions(&[("name", &pattern)]),
            "[name*='user_'][name*='_name']"
        );
    }

    #[test]
    fn test_css_casefold_pattern() {
        let pattern = FilterValue::from(Regex::new("(?i)ab").unwrap());
        assert_eq!(
            CssBuilder::attribute_conditions(&[("title", &pattern)]),
            "[title*='AB' i]"
        );
    }

    #[test]
    fn test_css_casefold_pattern_drops_non_ascii_letters() {
        let cafe = FilterValue::from(Regex::new("(?i)café").unwrap());
        assert_eq!(CssBuilder::attribute_conditions(&[("title", &cafe)]), "[title*='CAF' i]");

        let street = FilterValue::from(Regex::new("(?i)straße").unwrap());
        assert_eq!(
            CssBuilder::attribute_conditions(&[("title", &street)]),
            "[title*='TRA' i][title*='E' i]"
        );
    }

    #[test]
    fn test_css_class_negation() {
        let classes = FilterValue::from(vec!["btn", "!active", "!!!odd"]);
        assert_eq!(CssBuilder::class_conditions(&classes), ".btn.\\!odd:not(.active)");
    }

    #[test]
    fn test_css_add_to_list() {
        let name = FilterValue::from("q");
        assert_eq!(
            CssBuilder::add_attribute_conditions("input, textarea", &[("name", &name)]),
            "input[name='q'], textarea[name='q']"
        );
    }

    #[test]
    fn test_xpath_attribute_values() {
        let name = FilterValue::from("email");
        let missing = FilterValue::Nil;
        let cond = XPathBuilder::attribute_conditions(&[("name", &name), ("href", &missing)])
            .expect("conditions");
        assert_eq!(cond.render(false), "((@name = 'email') and not(@href))");
    }

    #[test]
    fn test_xpath_pattern_casefold() {
        let pattern = FilterValue::from(Regex::new("(?i)foo").unwrap());
        let cond = XPathBuilder::attribute_conditions(&[("title", &pattern)]).expect("conditions");
        assert_eq!(
            cond.render(false),
            "@title[contains(translate(., 'abcdefghijklmnopqrstuvwxyz', 'ABCDEFGHIJKLMNOPQRSTUVWXYZ'), 'FOO')]"
        );
    }

    #[test]
    fn test_xpath_casefold_pattern_drops_non_ascii_letters() {
        let cafe = FilterValue::from(Regex::new("(?i)café").unwrap());
        let rendered = XPathBuilder::attribute_conditions(&[("title", &cafe)])
            .expect("conditions")
            .render(false);
        assert!(rendered.ends_with(", 'CAF')]"), "{rendered}");
        assert!(!rendered.contains('É'));
        assert!(!rendered.contains('é'));
    }

    #[test]
    fn test_xpath_class_conditions() {
        let classes = FilterValue::from(vec!["a", "!b"]);
        let cond = XPathBuilder::class_conditions(&classes).expect("conditions");
        assert_eq!(
            cond.render(false),
            "(contains(concat(' ', normalize-space(@class), ' '), ' a ') and \
             not(contains(concat(' ', normalize-space(@class), ' '), ' b ')))"
        );
    }

    #[test]
    fn test_xpath_empty_classes() {
        assert!(XPathBuilder::class_conditions(&FilterValue::List(Vec::new())).is_none());
    }
}
