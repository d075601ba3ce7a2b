//! Selectors whose locator is checked by a node predicate.

mod common;

use std::sync::{Arc, Once};

use common::{FakeDocument, FakeDriver, init_tracing, node};
use locator_engine::selector::{self, LocatorFilter, SelectorDefinition};
use locator_engine::{
    Error, LocatorValue, QueryOptions, ScopeRef, SelectorQuery, Session, SessionOptions,
};

static REGISTER: Once = Once::new();

/// `tag` matches spans by their `data-tag` attribute. A tag of `gone`
/// raises not-found, `broken` raises a configuration error.
fn register_tag_selector() {
    REGISTER.call_once(|| {
        let tag = SelectorDefinition::builder("tag")
            .css(|_| Ok("span".to_string()))
            .locator_filter(LocatorFilter::new(|element, locator, _exact| {
                match element.attribute("data-tag")?.as_deref() {
                    Some("gone") => Err(Error::element_not_found("tag vanished")),
                    Some("broken") => Err(Error::config("tag unreadable")),
                    actual => Ok(actual == locator.as_text()),
                }
            }))
            .build()
            .unwrap();
        selector::add(tag).unwrap();
    });
}

fn tags() -> Arc<FakeDocument> {
    FakeDocument::new(vec![
        node("span").attr("data-tag", "alpha").text("A"),
        node("span").attr("data-tag", "beta").text("B"),
        node("span").attr("data-tag", "gone").text("G"),
    ])
}

fn query(locator: Option<&str>) -> SelectorQuery {
    register_tag_selector();
    SelectorQuery::new(
        Some("tag"),
        locator.map(LocatorValue::from),
        QueryOptions::new(),
        &SessionOptions::new(),
    )
    .unwrap()
}

#[test]
fn test_locator_filter_skipped_without_locator() {
    init_tracing();
    let scope: ScopeRef = tags();

    let result = query(None).resolve_for(&scope, None).unwrap();
    assert_eq!(result.len(), 3);
    assert!(result.rejected().is_empty());
}

#[test]
fn test_locator_filter_rejects_other_nodes() {
    init_tracing();
    let document = tags();
    let scope: ScopeRef = document.clone();

    let result = query(Some("beta")).resolve_for(&scope, None).unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.first().unwrap().visible_text().unwrap(), "B");
    assert_eq!(result.rejected().len(), 2);

    let session = Session::new(FakeDriver::new(document));
    let found = session.find(Some("tag"), "alpha", QueryOptions::new()).unwrap();
    assert_eq!(found.attribute("data-tag").unwrap().as_deref(), Some("alpha"));
}

#[test]
fn test_locator_filter_not_found_counts_as_no_match() {
    init_tracing();
    let scope: ScopeRef = tags();

    let result = query(Some("gone")).resolve_for(&scope, None).unwrap();
    assert!(result.is_empty());
    assert_eq!(result.rejected().len(), 3);
}

#[test]
fn test_locator_filter_other_errors_propagate() {
    init_tracing();
    let scope: ScopeRef = FakeDocument::new(vec![node("span").attr("data-tag", "broken")]);

    let err = query(Some("alpha")).resolve_for(&scope, None).unwrap_err();
    assert!(err.is_config_error());
}
