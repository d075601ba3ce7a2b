//! Registration phase and freezing.
//!
//! Freezing is process wide, so everything runs in one test of its own
//! binary.

mod common;

use std::sync::Arc;

use common::{FakeDocument, FakeDriver, init_tracing, node};
use locator_engine::selector::filter::FilterOptions;
use locator_engine::selector::{self, FilterSet, SelectorDefinition, filter_set};
use locator_engine::{LocatorValue, QueryOptions, Session};

#[test]
fn test_registration_then_freeze() -> anyhow::Result<()> {
    init_tracing();
    let document = FakeDocument::new(vec![
        node("span").attr("class", "badge").text("3"),
        node("span").attr("class", "badge").attr("data-state", "new").text("7"),
    ]);
    let session = Session::new(FakeDriver::new(Arc::clone(&document)));

    let badge = SelectorDefinition::builder("badge")
        .css(|_| Ok("span.badge".to_string()))
        .build()?;
    selector::add(badge)?;
    assert!(selector::names().iter().any(|name| name == "badge"));

    selector::update("badge", |builder| {
        builder.node_filter("fresh", FilterOptions::boolean(), |element, value, _| {
            let fresh = element.attribute("data-state")?.as_deref() == Some("new");
            Ok(value.as_bool() == Some(fresh))
        })
    })?;

    let fresh = session.find(Some("badge"), None::<LocatorValue>, QueryOptions::new().filter("fresh", true))?;
    assert_eq!(fresh.visible_text()?, "7");

    selector::freeze();
    assert!(selector::is_frozen());

    let late = SelectorDefinition::builder("late")
        .css(|_| Ok("div".to_string()))
        .build()?;
    assert!(selector::add(late).unwrap_err().is_config_error());
    assert!(selector::remove("badge").unwrap_err().is_config_error());
    assert!(
        selector::update("badge", |builder| builder)
            .unwrap_err()
            .is_config_error()
    );
    assert!(
        filter_set::add(FilterSet::builder("late").build())
            .unwrap_err()
            .is_config_error()
    );

    let all = session.all(Some("badge"), None::<LocatorValue>, QueryOptions::new())?;
    assert_eq!(all.len(), 2);
    Ok(())
}
