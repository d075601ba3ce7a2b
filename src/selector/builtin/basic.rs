//! Raw expression, id, label and table selectors.

use crate::error::{Error, Result};
use crate::expression::{XPath, XPathBuilder};
use crate::selector::definition::{ExpressionInput, SelectorBuilder};
use crate::selector::filter::FilterOptions;
use crate::value::{LocatorKind, LocatorValue};

use super::{attribute_pattern_matches, with_attribute, with_text};

/// Elements a label can wrap.
const LABELABLE: &[&str] = &[
    "button", "input", "keygen", "meter", "output", "progress", "select", "textarea",
];

fn required_locator(selector: &str, input: &ExpressionInput<'_>) -> Result<String> {
    input
        .locator_text()
        .ok_or_else(|| Error::config(format!("selector :{selector} requires a locator")))
}

// ============================================================================
// xpath / css / id
// ============================================================================

pub(crate) fn xpath() -> SelectorBuilder {
    SelectorBuilder::new("xpath")
        .locator_types(&[LocatorKind::Text])
        .xpath(|input| required_locator("xpath", input).map(XPath::raw))
        .match_locator(|locator| {
            locator
                .as_text()
                .is_some_and(|text| ["/", "./", "("].iter().any(|p| text.starts_with(p)))
        })
}

pub(crate) fn css() -> SelectorBuilder {
    SelectorBuilder::new("css")
        .locator_types(&[LocatorKind::Text])
        .css(|input| required_locator("css", input))
}

pub(crate) fn id() -> SelectorBuilder {
    SelectorBuilder::new("id")
        .locator_types(&[LocatorKind::Text])
        .xpath(|input| {
            let id = required_locator("id", input)?;
            Ok(XPath::descendant(&[]).with(XPath::attr("id").equals(id)))
        })
}

// ============================================================================
// label
// ============================================================================

pub(crate) fn label() -> SelectorBuilder {
    SelectorBuilder::new("label")
        .locator_types(&[LocatorKind::Text])
        .xpath(|input| {
            let mut xpath = XPath::descendant(&["label"]);
            if let Some(locator) = input.locator_text() {
                let mut matchers = XPath::string().normalize().is(locator.as_str())
                    | XPath::attr("id").equals(locator.as_str());
                if let Some(test_id) = &input.config.test_id {
                    matchers = matchers | XPath::attr(test_id.as_str()).equals(locator.as_str());
                }
                xpath = xpath.with(matchers);
            }

            if let Some(target) = input.option("for")
                && !target.to_text().is_empty()
                && let Some(direct) = XPathBuilder::attribute_conditions(&[("for", target)])
            {
                let wrapped = with_attribute(XPath::descendant(LABELABLE), "id", target);
                xpath = xpath.with(direct | (!XPath::attr("for") & wrapped));
            }
            Ok(xpath)
        })
        .expression_options(&["for"])
        .node_filter("for", FilterOptions::new(), |node, value, _| {
            attribute_pattern_matches(node, "for", value)
        })
        .describe(|options| {
            options
                .get("for")
                .map(|target| format!(" for {}", target.inspect()))
        })
}

// ============================================================================
// table / table_row
// ============================================================================

pub(crate) fn table() -> SelectorBuilder {
    SelectorBuilder::new("table")
        .locator_types(&[LocatorKind::Text])
        .xpath(|input| {
            let mut xpath = XPath::descendant(&["table"]);
            if let Some(locator) = input.locator_text() {
                let mut matchers = XPath::attr("id").equals(locator.as_str())
                    | XPath::descendant(&["caption"]).is(locator.as_str());
                if let Some(test_id) = &input.config.test_id {
                    matchers = matchers | XPath::attr(test_id.as_str()).equals(locator.as_str());
                }
                xpath = xpath.with(matchers);
            }
            if let Some(caption) = input.option("caption") {
                xpath = xpath.with(XPath::descendant(&["caption"]).equals(caption.to_text()));
            }
            Ok(xpath)
        })
        .expression_options(&["caption"])
        .describe(|options| {
            options
                .get("caption")
                .map(|caption| format!(" with caption {}", caption.inspect()))
        })
}

pub(crate) fn table_row() -> SelectorBuilder {
    SelectorBuilder::new("table_row")
        .label("table row")
        .locator_types(&[LocatorKind::PathSegments, LocatorKind::FieldMap])
        .xpath(|input| {
            let rows = XPath::descendant(&["tr"]);
            Ok(match input.locator {
                None => rows,
                Some(LocatorValue::FieldMap(cells)) => {
                    cells.iter().fold(rows, |rows, (header, cell)| {
                        rows.with(cell_under_header(header, cell))
                    })
                }
                Some(LocatorValue::PathSegments(cells)) => match cells.split_first() {
                    Some((first, rest)) => {
                        let following = rest
                            .iter()
                            .rev()
                            .map(|cell| with_text(XPath::axis("following-sibling", &["td"]), cell))
                            .reduce(|inner, outer| outer.with(inner));
                        rows.with(with_text(XPath::descendant(&["td"]), first).with_opt(following))
                    }
                    None => rows,
                },
                Some(LocatorValue::Text(text)) => rows.with(with_text(XPath::descendant(&["td"]), text)),
            })
        })
}

/// A `td` with text `cell` in the column headed `header`.
fn cell_under_header(header: &str, cell: &str) -> XPath {
    let header_cell = with_text(
        XPath::axis("ancestor", &["table"])
            .with(XPath::Number(1))
            .descendants(&["tr"])
            .with(XPath::Number(1))
            .descendants(&["th"]),
        header,
    );
    let column = header_cell.clone().step("preceding-sibling", &[]).count().plus(1);

    with_text(XPath::descendant(&["td"]), cell).with(
        header_cell.boolean() & XPath::position().equals(column),
    )
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::config::SessionOptions;
    use crate::value::QueryOptions;

    fn compile(builder: SelectorBuilder, locator: Option<LocatorValue>, options: &QueryOptions) -> Result<String> {
        let definition = builder.build()?;
        let config = SessionOptions::new();
        definition
            .compile(&ExpressionInput::new(locator.as_ref(), options, &config))
            .map(|expr| expr.render(false))
    }

    #[test]
    fn test_xpath_matches_locator() {
        let definition = xpath().build().unwrap();
        assert!(definition.matches_locator(&"//p".into()));
        assert!(definition.matches_locator(&"(//p)[2]".into()));
        assert!(!definition.matches_locator(&"p.intro".into()));
    }

    #[test]
    fn test_css_requires_locator() {
        let err = compile(css(), None, &QueryOptions::new()).unwrap_err();
        assert!(err.is_config_error());
        assert_eq!(compile(css(), Some("p.intro".into()), &QueryOptions::new()).unwrap(), "p.intro");
    }

    #[test]
    fn test_id() {
        assert_eq!(
            compile(id(), Some("main".into()), &QueryOptions::new()).unwrap(),
            ".//*[(@id = 'main')]"
        );
    }

    #[test]
    fn test_label_for() {
        let xpath = compile(label(), None, &QueryOptions::new().filter("for", "email")).unwrap();
        assert_eq!(
            xpath,
            ".//label[((@for = 'email') or (not(@for) and .//*[self::button | self::input | self::keygen | self::meter | self::output | self::progress | self::select | self::textarea][(@id = 'email')]))]"
        );
    }

    #[test]
    fn test_table_caption() {
        let xpath = compile(table(), None, &QueryOptions::new().filter("caption", "Prices")).unwrap();
        assert_eq!(xpath, ".//table[(.//caption = 'Prices')]");
    }

    #[test]
    fn test_table_row_by_cells() {
        let xpath = compile(table_row(), Some(vec!["a", "b", "c"].into()), &QueryOptions::new()).unwrap();
        assert_eq!(
            xpath,
            ".//tr[.//td[contains(normalize-space(string(.)), 'a')][./following-sibling::td[contains(normalize-space(string(.)), 'b')][./following-sibling::td[contains(normalize-space(string(.)), 'c')]]]]"
        );
    }

    #[test]
    fn test_table_row_by_header() {
        let mut cells = BTreeMap::new();
        cells.insert("Name".to_string(), "Ada".to_string());
        let xpath = compile(table_row(), Some(cells.into()), &QueryOptions::new()).unwrap();
        assert!(xpath.starts_with(".//tr[.//td[contains(normalize-space(string(.)), 'Ada')]"));
        assert!(xpath.contains("./ancestor::table[1]//tr[1]//th[contains(normalize-space(string(.)), 'Name')]"));
        assert!(xpath.contains("/preceding-sibling::*"));
    }

    #[test]
    fn test_table_row_rejects_text_locator() {
        let definition = table_row().build().unwrap();
        assert!(definition.validate_locator(&"Ada".into()).is_err());
    }
}
