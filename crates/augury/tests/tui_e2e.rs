//! End-to-end TUI tests driving the app through key events against a
//! canned backend, asserting on rendered screen content.

use std::time::Duration;

use crossterm::event::KeyCode;

use augury::tui::app::ViewMode;
use augury::tui::test_harness::{StubBackend, TuiTestHarness};
use augury_protocol::ResultPayload;

const WAIT: Duration = Duration::from_secs(2);

fn payload(value: serde_json::Value) -> ResultPayload {
    serde_json::from_value(value).expect("canned payload decodes")
}

#[test]
fn geo_lookup_end_to_end() {
    let stub = StubBackend::default();
    stub.push_extract(Ok(StubBackend::geo_payload("8.8.8.8")));
    let mut harness = TuiTestHarness::new(stub);

    let screen = harness.search_and_wait("8.8.8.8", WAIT);

    screen.assert_contains("8.8.8.8"); // tab label
    screen.assert_contains("City: Mountain View");
    screen.assert_contains("Country Code: US");
    assert_eq!(harness.app.tabs.len(), 1);
    assert_eq!(harness.app.tabs.tabs()[0].label, "8.8.8.8");
}

#[test]
fn failed_fetch_renders_error_payload() {
    let stub = StubBackend::default();
    stub.push_extract(Err("connection reset".to_string()));
    let mut harness = TuiTestHarness::new(stub);

    let screen = harness.search_and_wait("bad", WAIT);

    screen.assert_contains("Failed to fetch results");
    screen.assert_not_contains("City:");
    assert_eq!(
        harness.app.tabs.tabs()[0].results,
        Some(ResultPayload::fetch_error())
    );
}

#[test]
fn resubmitted_query_updates_existing_tab() {
    let stub = StubBackend::default();
    stub.push_extract(Ok(StubBackend::geo_payload("8.8.8.8")));
    stub.push_extract(Err("backend flapped".to_string()));
    let mut harness = TuiTestHarness::new(stub);

    harness.search_and_wait("8.8.8.8", WAIT);
    let first_id = harness.app.tabs.tabs()[0].id;

    let screen = harness.search_and_wait("8.8.8.8", WAIT);

    // One tab, same id, results reflect the second response.
    assert_eq!(harness.app.tabs.len(), 1);
    assert_eq!(harness.app.tabs.tabs()[0].id, first_id);
    screen.assert_contains("Failed to fetch results");
}

#[test]
fn distinct_queries_open_distinct_tabs_with_suffixed_labels() {
    let stub = StubBackend::default();
    // Three distinct queries all resolving to the same first IOC.
    stub.push_extract(Ok(StubBackend::geo_payload("10.0.0.1")));
    stub.push_extract(Ok(StubBackend::geo_payload("10.0.0.1")));
    stub.push_extract(Ok(StubBackend::geo_payload("10.0.0.1")));
    let mut harness = TuiTestHarness::new(stub);

    harness.search_and_wait("first query", WAIT);
    harness.search_and_wait("second query", WAIT);
    let screen = harness.search_and_wait("third query", WAIT);

    assert_eq!(harness.app.tabs.len(), 3);
    let labels: Vec<&str> = harness
        .app
        .tabs
        .tabs()
        .iter()
        .map(|t| t.label.as_str())
        .collect();
    assert_eq!(labels, vec!["10.0.0.1", "10.0.0.1 (2)", "10.0.0.1 (3)"]);
    screen.assert_contains("10.0.0.1 (3)");
}

#[test]
fn closing_active_tab_activates_first_remaining() {
    let stub = StubBackend::default();
    stub.push_extract(Ok(StubBackend::geo_payload("a")));
    stub.push_extract(Ok(StubBackend::geo_payload("b")));
    let mut harness = TuiTestHarness::new(stub);

    harness.search_and_wait("query a", WAIT);
    harness.search_and_wait("query b", WAIT);
    let first_id = harness.app.tabs.tabs()[0].id;

    harness.press_ctrl('w');
    assert_eq!(harness.app.tabs.len(), 1);
    assert_eq!(harness.app.tabs.active_id(), Some(first_id));

    harness.press_ctrl('w');
    assert!(harness.app.tabs.is_empty());
    assert_eq!(harness.app.tabs.active_id(), None);
    harness.render();
}

#[test]
fn process_host_link_routes_to_host_detail() {
    let stub = StubBackend::default();
    stub.push_extract(Ok(payload(serde_json::json!({
        "data": {
            "evil.exe": {
                "process": [
                    {"process": {"name": "evil.exe", "host_name": "host1"}}
                ]
            }
        }
    }))));
    stub.push_source(Ok(payload(serde_json::json!({
        "data": {"host1": {"host": [{"host": {"hostname": "host1", "os_full": "Windows 11"}}]}}
    }))));
    let mut harness = TuiTestHarness::new(stub);

    let screen = harness.search_and_wait("evil.exe", WAIT);
    screen.assert_contains("Host Name: host1");

    // Empty input + Enter snaps the cursor to the linked row, then opens it.
    harness.press(KeyCode::Enter);
    harness.press(KeyCode::Enter);
    assert_eq!(harness.app.mode, ViewMode::Detail);
    assert_eq!(harness.app.detail.source, "host");
    assert_eq!(harness.app.detail.ioc, "host1");

    harness.wait_for_idle(WAIT);
    let screen = harness.render();
    screen.assert_contains("host / host1");
    screen.assert_contains("Os Full: Windows 11");
}

#[test]
fn oil_detail_shows_query_log_lines() {
    let stub = StubBackend::default();
    stub.push_source(Ok(payload(serde_json::json!({
        "data": {"1.2.3.4": {"oil": [
            {"oil": {"timestamp": "2025-03-04T10:00:00Z", "client_ip": "1.2.3.4"}}
        ]}},
        "queryLogs": {"1.2.3.4": [
            {"log_id": 9, "last_lookup": "2025-03-04T12:30:00Z",
             "result_count": 4, "user_name": "analyst1"}
        ]}
    }))));
    let mut harness = TuiTestHarness::new(stub);

    harness.app.open_detail("oil", "1.2.3.4");
    harness.wait_for_idle(WAIT);
    let screen = harness.render();

    screen.assert_contains("Client Ip: 1.2.3.4");
    screen.assert_contains("[query log]");
    screen.assert_contains("analyst1 queried 4 result(s)");
}

#[test]
fn detail_without_params_shows_blocking_error() {
    let mut harness = TuiTestHarness::new(StubBackend::default());
    harness.app.open_detail("", "");
    let screen = harness.render();
    screen.assert_contains("Missing source or ioc parameter");
    assert!(!harness.app.detail.loading);
}

#[test]
fn lookup_links_panel_lists_fixed_targets() {
    let stub = StubBackend::default();
    stub.push_extract(Ok(StubBackend::geo_payload("8.8.8.8")));
    let mut harness = TuiTestHarness::new(stub);

    let screen = harness.search_and_wait("8.8.8.8", WAIT);
    for label in ["PDNS", "LDAP", "GeoIP", "Binary", "OIL", "CBR", "Shodan", "Censys"] {
        screen.assert_contains(label);
    }
}

#[test]
fn identity_flow_through_settings_view() {
    let mut harness = TuiTestHarness::new(StubBackend::default());
    assert!(!harness.app.is_authenticated());
    harness.render().assert_contains("analyst: unknown");

    harness.press_ctrl('s');
    assert_eq!(harness.app.mode, ViewMode::Settings);

    // Enter edit mode, type an identity, submit.
    harness.press(KeyCode::Enter);
    harness.type_text("analyst1");
    harness.press(KeyCode::Enter);
    assert!(harness.app.is_authenticated());
    harness.render().assert_contains("analyst: analyst1");

    // Explicit clear returns to unauthenticated.
    harness.press(KeyCode::Delete);
    assert!(!harness.app.is_authenticated());
    harness.render().assert_contains("analyst: unknown");
}

#[test]
fn empty_identity_submission_is_noop() {
    let mut harness = TuiTestHarness::new(StubBackend::default());
    harness.press_ctrl('s');
    harness.press(KeyCode::Enter);
    harness.type_text("   ");
    harness.press(KeyCode::Enter);
    assert!(!harness.app.is_authenticated());
}

#[test]
fn theme_toggles_from_settings() {
    let mut harness = TuiTestHarness::new(StubBackend::default());
    harness.render().assert_contains("[dark]");

    harness.press_ctrl('s');
    harness.press(KeyCode::Down); // select Theme
    harness.press(KeyCode::Enter);
    harness.press(KeyCode::Esc);

    harness.render().assert_contains("[light]");
}

#[test]
fn renders_at_small_and_large_sizes() {
    for (w, h) in [(40u16, 12u16), (80, 24), (200, 60)] {
        let stub = StubBackend::default();
        stub.push_extract(Ok(StubBackend::geo_payload("8.8.8.8")));
        let mut harness = TuiTestHarness::with_size(stub, w, h);
        harness.search_and_wait("8.8.8.8", WAIT);
    }
}
