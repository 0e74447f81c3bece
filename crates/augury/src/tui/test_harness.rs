//! Test harness for TUI integration tests
//!
//! Provides a high-level API for:
//! - Driving the app with a canned backend (no network)
//! - Sending keystrokes
//! - Verifying screen output via TestBackend buffer

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{backend::TestBackend, Terminal};

use augury_protocol::ResultPayload;

use crate::api::Backend;
use crate::config::MemoryPreferenceStore;

use super::app::{App, AppOptions};
use super::ui;

/// Canned backend: queues of responses per endpoint, plus a call log.
#[derive(Default)]
pub struct StubBackend {
    extract_responses: Mutex<VecDeque<Result<ResultPayload, String>>>,
    source_responses: Mutex<VecDeque<Result<ResultPayload, String>>>,
    extract_calls: Arc<Mutex<Vec<(String, Option<String>)>>>,
}

impl StubBackend {
    pub fn push_extract(&self, response: Result<ResultPayload, String>) {
        self.extract_responses.lock().unwrap().push_back(response);
    }

    pub fn push_source(&self, response: Result<ResultPayload, String>) {
        self.source_responses.lock().unwrap().push_back(response);
    }

    /// Handle to the recorded `(query, user_name)` extraction calls.
    pub fn extract_calls(&self) -> Arc<Mutex<Vec<(String, Option<String>)>>> {
        Arc::clone(&self.extract_calls)
    }

    /// Canned geo payload matching the backend's wire shape.
    pub fn geo_payload(ioc: &str) -> ResultPayload {
        serde_json::from_value(serde_json::json!({
            "data": {
                ioc: {
                    "geo": [
                        {"geo": {"city": "Mountain View", "countryCode": "US"}}
                    ]
                }
            }
        }))
        .expect("canned payload decodes")
    }
}

impl Backend for StubBackend {
    fn extract(&self, query: &str, user_name: Option<&str>) -> Result<ResultPayload> {
        self.extract_calls
            .lock()
            .unwrap()
            .push((query.to_string(), user_name.map(str::to_string)));
        self.extract_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err("no canned extract response".to_string()))
            .map_err(|err| anyhow!(err))
    }

    fn source_lookup(&self, _source: &str, _ioc: &str) -> Result<ResultPayload> {
        self.source_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err("no canned source response".to_string()))
            .map_err(|err| anyhow!(err))
    }
}

/// Screen buffer snapshot for assertions
pub struct ScreenSnapshot {
    /// Raw buffer content as single string (row-major)
    pub raw: String,
    /// Content split by rows, trailing whitespace trimmed
    pub rows: Vec<String>,
}

impl ScreenSnapshot {
    pub fn from_backend(backend: &TestBackend) -> Self {
        let buffer = backend.buffer();
        let width = buffer.area.width;
        let height = buffer.area.height;

        let mut raw = String::new();
        for y in 0..height {
            for x in 0..width {
                raw.push_str(buffer[(x, y)].symbol());
            }
        }

        let rows: Vec<String> = raw
            .chars()
            .collect::<Vec<_>>()
            .chunks(width as usize)
            .map(|chunk| chunk.iter().collect::<String>().trim_end().to_string())
            .collect();

        Self { raw, rows }
    }

    pub fn contains(&self, text: &str) -> bool {
        self.raw.contains(text)
    }

    pub fn assert_contains(&self, text: &str) {
        assert!(
            self.contains(text),
            "Screen does not contain '{}'\n\nScreen content:\n{}",
            text,
            self.format_screen()
        );
    }

    pub fn assert_not_contains(&self, text: &str) {
        assert!(
            !self.contains(text),
            "Screen unexpectedly contains '{}'\n\nScreen content:\n{}",
            text,
            self.format_screen()
        );
    }

    pub fn format_screen(&self) -> String {
        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| format!("{i:02}|{row}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Test harness wiring a [`StubBackend`] and an in-memory preference
/// store into an [`App`] rendered against a [`TestBackend`].
pub struct TuiTestHarness {
    terminal: Terminal<TestBackend>,
    pub app: App,
}

impl TuiTestHarness {
    pub fn new(stub: StubBackend) -> Self {
        Self::with_size(stub, 100, 36)
    }

    pub fn with_size(stub: StubBackend, width: u16, height: u16) -> Self {
        let backend = TestBackend::new(width, height);
        let terminal = Terminal::new(backend).expect("Failed to create test terminal");

        let app = App::new(
            AppOptions {
                backend_url: "http://localhost:8080".to_string(),
                ..AppOptions::default()
            },
            Arc::new(stub),
            Box::new(MemoryPreferenceStore::new()),
        );
        Self { terminal, app }
    }

    /// Render the current app state and return a screen snapshot
    pub fn render(&mut self) -> ScreenSnapshot {
        self.terminal
            .draw(|frame| ui::draw(frame, &self.app))
            .expect("Failed to draw");
        ScreenSnapshot::from_backend(self.terminal.backend())
    }

    pub fn send_key(&mut self, key: KeyEvent) {
        self.app.handle_key(key);
    }

    pub fn press(&mut self, code: KeyCode) {
        self.send_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    pub fn press_ctrl(&mut self, c: char) {
        self.send_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL));
    }

    pub fn type_text(&mut self, text: &str) {
        for c in text.chars() {
            self.press(KeyCode::Char(c));
        }
    }

    /// Poll tick until no request is in flight (or timeout).
    pub fn wait_for_idle(&mut self, timeout: Duration) {
        let start = Instant::now();
        while start.elapsed() < timeout
            && (self.app.search.loading || self.app.detail.loading)
        {
            self.app.tick();
            std::thread::sleep(Duration::from_millis(5));
        }
        self.app.tick();
    }

    /// Type a query, submit it, wait for the response, render.
    pub fn search_and_wait(&mut self, query: &str, timeout: Duration) -> ScreenSnapshot {
        self.type_text(query);
        self.press(KeyCode::Enter);
        self.wait_for_idle(timeout);
        self.render()
    }
}
