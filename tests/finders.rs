//! Session finders against the in-memory driver.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FakeDocument, FakeDriver, init_tracing, node};
use locator_engine::{
    Element, Error, FilterValue, MatchPolicy, QueryOptions, ScopeRef, SelectorQuery, Session,
    SessionOptions, Visibility,
};

fn options() -> SessionOptions {
    SessionOptions::new()
        .with_default_max_wait_time(Duration::from_millis(200))
        .with_retry_interval(Duration::from_millis(10))
        .with_automatic_reload(true)
}

fn session(document: &Arc<FakeDocument>) -> Session {
    init_tracing();
    Session::with_options(FakeDriver::new(Arc::clone(document)), options()).unwrap()
}

fn list() -> Arc<FakeDocument> {
    FakeDocument::new(vec![
        node("ul")
            .attr("id", "fruits")
            .child(node("li").text("Apple").attr("data-x", "1"))
            .child(node("li").text("Banana")),
        node("p").text("hidden note").hidden(),
    ])
}

// ============================================================================
// Filtering
// ============================================================================

#[test]
fn test_button_excludes_disabled() {
    let document = FakeDocument::new(vec![
        node("button").attr("disabled", "disabled").text("Submit"),
        node("input").attr("type", "submit").attr("value", "Submit"),
    ]);
    let session = session(&document);

    let found = session
        .find(Some("button"), "Submit", QueryOptions::new().filter("disabled", false))
        .unwrap();
    assert_eq!(found.tag_name().unwrap(), "input");

    let all = session.all(Some("button"), "Submit", QueryOptions::new()).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all.rejected().len(), 1);
}

#[test]
fn test_skip_value_keeps_every_candidate() {
    let document = FakeDocument::new(vec![
        node("button").attr("disabled", "disabled").text("Submit"),
        node("input").attr("type", "submit").attr("value", "Submit"),
    ]);
    let session = session(&document);

    let all = session
        .all(Some("button"), "Submit", QueryOptions::new().filter("disabled", FilterValue::all()))
        .unwrap();
    assert_eq!(all.len(), 2);
}

#[test]
fn test_unknown_option_rejected_before_lookup() {
    let document = list();
    let session = session(&document);

    let err = session
        .find(Some("css"), "li", QueryOptions::new().filter("colour", "red"))
        .unwrap_err();
    assert!(err.is_config_error());
    assert_eq!(document.finds(), 0);
}

#[test]
fn test_resolve_is_idempotent() {
    let document = list();
    let scope: ScopeRef = document.clone();
    let query = SelectorQuery::new(Some("css"), "li", QueryOptions::new(), &options()).unwrap();

    let first = query.resolve_for(&scope, None).unwrap();
    let second = query.resolve_for(&scope, None).unwrap();
    assert_eq!(first.len(), second.len());
    assert!(first.iter().zip(second.iter()).all(|(a, b)| a.same_node(b)));
}

#[test]
fn test_filters_are_conjunctive() {
    let document = list();
    let scope: ScopeRef = document.clone();
    let config = options();

    let unfiltered = SelectorQuery::new(Some("css"), "li", QueryOptions::new(), &config).unwrap();
    assert_eq!(unfiltered.resolve_for(&scope, None).unwrap().len(), 2);

    let block_only = SelectorQuery::builder()
        .selector("css")
        .locator("li")
        .filter_block(|element| Ok(element.attribute("data-x")?.is_some()))
        .build(&config)
        .unwrap();
    let result = block_only.resolve_for(&scope, None).unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.first().unwrap().visible_text().unwrap(), "Apple");

    let text_only = SelectorQuery::new(Some("css"), "li", QueryOptions::new().text("Ban"), &config).unwrap();
    assert_eq!(text_only.resolve_for(&scope, None).unwrap().len(), 1);

    let both = SelectorQuery::builder()
        .selector("css")
        .locator("li")
        .options(QueryOptions::new().text("Ban"))
        .filter_block(|element| Ok(element.attribute("data-x")?.is_some()))
        .build(&config)
        .unwrap();
    let result = both.resolve_for(&scope, None).unwrap();
    assert!(result.is_empty());
    assert_eq!(result.rejected().len(), 2);
}

#[test]
fn test_visibility_policies() {
    let document = list();
    let session = session(&document);

    let visible = session.all(Some("css"), "p", QueryOptions::new()).unwrap();
    assert!(visible.is_empty());

    let hidden = session
        .all(Some("css"), "p", QueryOptions::new().visible(Visibility::Hidden))
        .unwrap();
    assert_eq!(hidden.len(), 1);

    let any = session
        .all(Some("css"), "p", QueryOptions::new().visible(Visibility::All).text("note"))
        .unwrap();
    assert_eq!(any.len(), 1);
}

// ============================================================================
// find
// ============================================================================

#[test]
fn test_find_rejects_ambiguous_match() {
    let document = list();
    let session = session(&document);

    let err = session.find(Some("css"), "li", QueryOptions::new()).unwrap_err();
    assert!(matches!(err, Error::Ambiguous { .. }));
    assert_eq!(
        err.to_string(),
        "Ambiguous match, found 2 elements matching visible css \"li\""
    );
}

#[test]
fn test_find_first_policy_takes_first() {
    let document = list();
    let session = session(&document);

    let found = session
        .find(Some("css"), "li", QueryOptions::new().match_policy(MatchPolicy::First))
        .unwrap();
    assert_eq!(found.visible_text().unwrap(), "Apple");
}

fn links(texts: &[&str]) -> Arc<FakeDocument> {
    FakeDocument::new(texts.iter().map(|text| node("a").attr("href", "/").text(text)).collect())
}

#[test]
fn test_smart_prefers_exact_match() {
    let document = links(&["Home", "Home page"]);
    let session = session(&document);

    let found = session.find(Some("link"), "Home", QueryOptions::new()).unwrap();
    assert_eq!(found.visible_text().unwrap(), "Home");
    assert_eq!(document.finds(), 1);
}

#[test]
fn test_smart_falls_back_to_partial_match() {
    let document = links(&["Home page"]);
    let session = session(&document);

    let found = session.find(Some("link"), "Home", QueryOptions::new()).unwrap();
    assert_eq!(found.visible_text().unwrap(), "Home page");

    let expressions = document.expressions();
    assert_eq!(expressions.len(), 2);
    assert!(expressions[0].contains("= 'Home'"));
    assert!(!expressions[0].contains("contains(normalize-space(string(.)), 'Home')"));
    assert!(expressions[1].contains("contains(normalize-space(string(.)), 'Home')"));
}

#[test]
fn test_exact_option_disables_fallback() {
    let document = links(&["Home page"]);
    let session = session(&document);

    let err = session
        .find(Some("link"), "Home", QueryOptions::new().exact(true).no_wait())
        .unwrap_err();
    assert!(matches!(err, Error::ElementNotFound { .. }));
}

#[test]
fn test_prefer_exact_takes_first_partial_match() {
    let document = links(&["Home page", "Home office"]);
    let session = session(&document);

    let found = session
        .find(
            Some("link"),
            "Home",
            QueryOptions::new().match_policy(MatchPolicy::PreferExact),
        )
        .unwrap();
    assert_eq!(found.visible_text().unwrap(), "Home page");

    let err = session.find(Some("link"), "Home", QueryOptions::new()).unwrap_err();
    assert!(matches!(err, Error::Ambiguous { .. }));
}

#[test]
fn test_find_not_found_message() {
    let document = list();
    let session = session(&document);

    let err = session.find(Some("css"), "table", QueryOptions::new()).unwrap_err();
    assert!(matches!(err, Error::ElementNotFound { .. }));
    assert_eq!(err.to_string(), "Unable to find visible css \"table\"");
}

#[test]
fn test_find_waits_for_late_element() {
    let document = FakeDocument::new(vec![node("dialog").text("Saved").appears_after(3)]);
    let session = session(&document);

    let found = session.find(Some("css"), "dialog", QueryOptions::new()).unwrap();
    assert_eq!(found.visible_text().unwrap(), "Saved");
    assert!(document.finds() > 3);
}

#[test]
fn test_find_without_wait_fails_fast() {
    let document = FakeDocument::new(vec![node("dialog").appears_after(3)]);
    let session = session(&document);

    let err = session
        .find(
            Some("css"),
            "dialog",
            QueryOptions::new().match_policy(MatchPolicy::One).no_wait(),
        )
        .unwrap_err();
    assert!(matches!(err, Error::ElementNotFound { .. }));
    assert_eq!(document.finds(), 1);
}

#[test]
fn test_static_page_runs_once() {
    init_tracing();
    let document = FakeDocument::new(vec![node("dialog").appears_after(3)]);
    let session = Session::with_options(FakeDriver::static_page(Arc::clone(&document)), options()).unwrap();

    let err = session
        .find(Some("css"), "dialog", QueryOptions::new().match_policy(MatchPolicy::One))
        .unwrap_err();
    assert!(matches!(err, Error::ElementNotFound { .. }));
    assert_eq!(document.finds(), 1);
}

#[test]
fn test_declared_errors_are_retried() {
    let document = list();
    document.fail_next(2);
    let session = session(&document);

    let found = session.find(Some("css"), "ul", QueryOptions::new()).unwrap();
    assert_eq!(found.attribute("id").unwrap().as_deref(), Some("fruits"));
}

#[test]
fn test_format_mismatch_is_not_retried() {
    init_tracing();
    let document = FakeDocument::xpath_only(vec![node("li")]);
    let session = Session::with_options(FakeDriver::new(Arc::clone(&document)), options()).unwrap();

    let err = session.find(Some("css"), "li", QueryOptions::new()).unwrap_err();
    assert!(matches!(err, Error::FormatMismatch { .. }));
    assert_eq!(document.finds(), 0);
}

#[test]
fn test_find_in_element_scope() {
    let document = FakeDocument::new(vec![
        node("ul").child(node("li").text("Inner")),
        node("li").text("Outer"),
    ]);
    let session = session(&document);

    let list = session.find(Some("css"), "ul", QueryOptions::new()).unwrap();
    let item = session.find_in(&list, Some("css"), "li", QueryOptions::new()).unwrap();
    assert_eq!(item.visible_text().unwrap(), "Inner");
}

// ============================================================================
// all / first
// ============================================================================

#[test]
fn test_all_without_counts_returns_empty() {
    let document = list();
    let session = session(&document);

    let result = session.all(Some("css"), "table", QueryOptions::new()).unwrap();
    assert!(result.is_empty());
}

#[test]
fn test_all_with_counts_raises() {
    let document = list();
    let session = session(&document);

    let err = session
        .all(Some("css"), "li", QueryOptions::new().count(3))
        .unwrap_err();
    assert!(matches!(err, Error::ExpectationNotMet { .. }));
    assert_eq!(
        err.to_string(),
        "expected to find visible css \"li\" 3 times, found 2 matches: \"Apple\", \"Banana\""
    );
}

#[test]
fn test_all_within_bounds() {
    let document = list();
    let session = session(&document);

    let result = session
        .all(Some("css"), "li", QueryOptions::new().between(1..=2))
        .unwrap();
    assert_eq!(result.len(), 2);
}

#[test]
fn test_first() {
    let document = list();
    let session = session(&document);

    let first = session.first(Some("css"), "li", QueryOptions::new()).unwrap();
    assert_eq!(first.visible_text().unwrap(), "Apple");

    let err = session.first(Some("css"), "table", QueryOptions::new()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "expected to find visible css \"table\" at least 1 time but there were no matches"
    );
}

// ============================================================================
// Failure messages
// ============================================================================

#[test]
fn test_failure_message_lists_rejected() {
    let document = list();
    let scope: ScopeRef = document.clone();
    let query = SelectorQuery::new(Some("css"), "li", QueryOptions::new().text("Cherry"), &options()).unwrap();

    let result = query.resolve_for(&scope, None).unwrap();
    assert_eq!(
        result.failure_message(),
        "expected to find visible css \"li\" with text \"Cherry\" but there were no matches. \
         Also found \"Apple\", \"Banana\", which matched the selector but not all filters."
    );
    assert!(result.negative_failure_message().starts_with("expected not to find"));
}

// ============================================================================
// Reload
// ============================================================================

#[test]
fn test_reload_relocates_node() {
    let document = FakeDocument::new(vec![node("p").text("old")]);
    let session = session(&document);

    let paragraph = session.find(Some("css"), "p", QueryOptions::new()).unwrap();
    document.replace(vec![node("p").text("new")]);
    assert_eq!(paragraph.visible_text().unwrap(), "old");

    paragraph.reload().unwrap();
    assert_eq!(paragraph.visible_text().unwrap(), "new");
}

#[test]
fn test_synchronize_element_reloads_between_attempts() {
    let document = FakeDocument::new(vec![node("p").text("Loading")]);
    let session = session(&document);

    let status = session.find(Some("css"), "p", QueryOptions::new()).unwrap();
    document.replace(vec![node("p").text("Done")]);

    let text = session
        .synchronize_element(&status, Duration::from_millis(200), |element| {
            let text = element.visible_text()?;
            if text == "Done" {
                Ok(text)
            } else {
                Err(Error::element_not_found("still loading"))
            }
        })
        .unwrap();
    assert_eq!(text, "Done");
}

#[test]
fn test_synchronize_element_reload_predicate() {
    let document = FakeDocument::new(vec![node("p").text("Loading")]);
    let session = session(&document);

    let status = session.find(Some("css"), "p", QueryOptions::new()).unwrap();
    document.replace(vec![node("p").text("Done")]);

    let wait_for_done = |element: &Element| -> locator_engine::Result<String> {
        let text = element.visible_text()?;
        if text == "Done" {
            Ok(text)
        } else {
            Err(Error::element_not_found("still loading"))
        }
    };

    let err = session
        .synchronize_element_if(&status, Duration::from_millis(50), Error::is_invalid_element, wait_for_done)
        .unwrap_err();
    assert!(matches!(err, Error::ElementNotFound { .. }));
    assert_eq!(status.visible_text().unwrap(), "Loading");

    let text = session
        .synchronize_element_if(&status, Duration::from_millis(200), Error::is_element_error, wait_for_done)
        .unwrap();
    assert_eq!(text, "Done");
}

#[test]
fn test_elements_without_query_ignore_reload() {
    let document = list();
    let scope: ScopeRef = document.clone();
    let query = SelectorQuery::new(Some("css"), "ul", QueryOptions::new(), &options()).unwrap();
    let native = query.resolve_for(&scope, None).unwrap().first().unwrap().native();

    let bare = Element::new(native, scope);
    assert!(bare.query().is_none());
    bare.reload().unwrap();
    assert_eq!(bare.tag_name().unwrap(), "ul");
}
