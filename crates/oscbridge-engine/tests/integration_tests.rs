//! End-to-end engine tests over a recording input sink.

use std::path::PathBuf;

use keycatalog::KeyCatalog;
use oscbridge_engine::Engine;
use relayinput::{InputRelay, MockSink};

/// Unique throwaway config path per test so parallel tests never collide.
fn temp_config(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "oscbridge-engine-test-{}-{name}.json",
        std::process::id()
    ))
}

/// Engine wired to a recording sink.
fn test_engine(name: &str) -> (Engine, MockSink, PathBuf) {
    let sink = MockSink::new();
    let relay = InputRelay::with_sink(Box::new(sink.clone()));
    let path = temp_config(name);
    std::fs::remove_file(&path).ok();
    (Engine::with_relay(path.clone(), relay), sink, path)
}

fn code_for(name: &str) -> u16 {
    KeyCatalog::with_defaults().lookup(name).expect("seed key")
}

#[tokio::test(flavor = "multi_thread")]
async fn matching_message_emits_one_key_press() {
    let (engine, sink, path) = test_engine("single-press");
    engine.add_filter("foo").await.expect("add");
    engine.set_action("foo", "@key:a").await.expect("action");
    engine.set_rate("foo", 1, 0).await.expect("rate");

    engine.handle_message("/avatar/parameters/foo 1.0").await;

    let a = code_for("a");
    assert_eq!(sink.events(), vec![(a, true), (a, false)]);

    // Unlimited rate: the next match fires again.
    engine.handle_message("foo").await;
    assert_eq!(sink.events().len(), 4);

    std::fs::remove_file(path).ok();
}

#[tokio::test(flavor = "multi_thread")]
async fn non_matching_message_is_ignored() {
    let (engine, sink, path) = test_engine("no-match");
    engine.add_filter("foo").await.expect("add");
    engine.set_action("foo", "@key:a").await.expect("action");
    engine.set_rate("foo", 1, 0).await.expect("rate");

    engine.handle_message("/avatar/parameters/bar").await;
    assert!(sink.events().is_empty());

    std::fs::remove_file(path).ok();
}

#[tokio::test(flavor = "multi_thread")]
async fn default_rate_limits_suppress_bursts() {
    let (engine, sink, path) = test_engine("burst");
    engine.add_filter("foo").await.expect("add");
    engine.set_action("foo", "@key:a").await.expect("action");

    // Default gate is 2 counts and 1 second; first match is one count of
    // delta and stays suppressed.
    engine.handle_message("foo").await;
    assert!(sink.events().is_empty());

    // Second match satisfies the count gate; no prior execution, so the
    // time gate is open.
    engine.handle_message("foo").await;
    assert_eq!(sink.events().len(), 2);

    // Right after an execution the delta is one again.
    engine.handle_message("foo").await;
    assert_eq!(sink.events().len(), 2);

    std::fs::remove_file(path).ok();
}

#[tokio::test(flavor = "multi_thread")]
async fn one_message_can_fire_several_filters() {
    let (engine, sink, path) = test_engine("multi");
    for (pattern, key) in [("foo", "@key:a"), ("bar", "@key:b")] {
        engine.add_filter(pattern).await.expect("add");
        engine.set_action(pattern, key).await.expect("action");
        engine.set_rate(pattern, 1, 0).await.expect("rate");
    }

    engine.handle_message("foo and bar").await;

    let a = code_for("a");
    let b = code_for("b");
    assert_eq!(
        sink.events(),
        vec![(a, true), (a, false), (b, true), (b, false)]
    );

    std::fs::remove_file(path).ok();
}

#[tokio::test(flavor = "multi_thread")]
async fn configuration_round_trips_through_disk() {
    let (engine, _sink, path) = test_engine("round-trip");
    engine.add_filter("foo").await.expect("add");
    engine.set_action("foo", "@key:a").await.expect("action");
    engine.set_rate("foo", 3, 2).await.expect("rate");
    engine.set_enabled("foo", false).await.expect("disable");
    engine.handle_message("foo").await;
    engine.save().await.expect("save");

    // Fresh engine on the same path sees the same table, with live
    // counters reset.
    let relay = InputRelay::with_sink(Box::new(MockSink::new()));
    let reloaded = Engine::with_relay(path.clone(), relay);
    let n = reloaded.load().await.expect("load").expect("file present");
    assert_eq!(n, 1);

    let filters = reloaded.filters().await;
    let f = &filters[0];
    assert_eq!(f.pattern, "foo");
    assert_eq!(f.action, "@key:a");
    assert!(f.trigger_action);
    assert!(!f.enabled);
    assert_eq!(f.limiter.limits(), (3, 2));
    assert_eq!(f.count, 0);
    assert!(f.last_received.is_none());

    std::fs::remove_file(path).ok();
}

#[tokio::test(flavor = "multi_thread")]
async fn default_filters_install_once() {
    let (engine, _sink, path) = test_engine("defaults");
    let added = engine.install_default_filters().await.expect("install");
    assert_eq!(added, oscbridge_config::DEFAULT_FILTERS.len());
    let again = engine.install_default_filters().await.expect("install");
    assert_eq!(again, 0);

    std::fs::remove_file(path).ok();
}

#[tokio::test(flavor = "multi_thread")]
async fn duplicate_filter_reports_without_aborting() {
    let (engine, _sink, path) = test_engine("duplicate");
    engine.add_filter("foo").await.expect("add");
    assert!(engine.add_filter("foo").await.is_err());
    assert_eq!(engine.filters().await.len(), 1);

    std::fs::remove_file(path).ok();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_key_reports_the_parsed_action() {
    let (engine, sink, path) = test_engine("test-key");
    let description = engine.test_key("ctrl+c").await.expect("emit");
    assert_eq!(description, "key combo of 2 keys");
    assert_eq!(sink.events().len(), 4);

    assert!(engine.test_key("nosuchkey").await.is_err());

    std::fs::remove_file(path).ok();
}
