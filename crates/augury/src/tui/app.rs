//! Application state for the TUI.
//!
//! The event loop is the only writer of this state. Searches and detail
//! lookups run on worker threads and come back over bounded channels that
//! [`App::tick`] drains, so every mutation happens on the UI thread.

use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;

use augury_protocol::ResultPayload;

use crate::api::Backend;
use crate::config::{PreferenceStore, Theme, PREF_THEME, PREF_USER_NAME};
use crate::links::{lookup_links, LookupLink};

use super::render::{link_positions, payload_lines};
use super::session::TabStore;

const STATUS_TTL: Duration = Duration::from_secs(4);

/// Current view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Search,
    Detail,
    Settings,
}

/// Startup values resolved from config and CLI flags. The preference
/// store takes precedence for identity and theme once hydrated.
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    pub backend_url: String,
    pub user_name: Option<String>,
    pub theme: Option<String>,
}

/// Search view state: the input line and the results cursor.
#[derive(Debug, Default)]
pub struct SearchState {
    pub input: String,
    pub cursor: usize,
    pub selected_row: usize,
    pub loading: bool,
}

/// Single-source detail view state.
#[derive(Debug, Default)]
pub struct DetailState {
    pub source: String,
    pub ioc: String,
    pub payload: Option<ResultPayload>,
    /// Blocking parameter error; set instead of issuing a request.
    pub error: Option<String>,
    pub loading: bool,
    pub scroll: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SettingsItem {
    #[default]
    Identity,
    Theme,
}

#[derive(Debug, Default)]
pub struct SettingsState {
    pub selected: SettingsItem,
    pub editing: bool,
    pub edit_value: String,
}

/// Transient message shown in the footer.
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub message: String,
    pub is_error: bool,
    pub expires_at: Instant,
}

struct SearchOutcome {
    token: u64,
    query: String,
    payload: ResultPayload,
}

struct DetailOutcome {
    source: String,
    ioc: String,
    payload: ResultPayload,
}

struct InflightSearch {
    token: u64,
    query: String,
}

pub struct App {
    pub running: bool,
    pub mode: ViewMode,
    pub theme: Theme,
    pub user_name: Option<String>,
    pub backend_url: String,
    pub tabs: TabStore,
    pub search: SearchState,
    pub detail: DetailState,
    pub settings: SettingsState,
    pub status: Option<StatusMessage>,
    backend: Arc<dyn Backend>,
    prefs: Box<dyn PreferenceStore>,
    pending_search: Option<mpsc::Receiver<SearchOutcome>>,
    inflight: Option<InflightSearch>,
    /// Monotonic request token; tick discards responses older than this.
    search_token: u64,
    pending_detail: Option<mpsc::Receiver<DetailOutcome>>,
}

impl App {
    pub fn new(
        options: AppOptions,
        backend: Arc<dyn Backend>,
        prefs: Box<dyn PreferenceStore>,
    ) -> Self {
        // Hydrate once at startup: persisted preferences win over config.
        let user_name = prefs
            .get(PREF_USER_NAME)
            .or(options.user_name)
            .filter(|name| !name.trim().is_empty());
        let persisted_theme = prefs.get(PREF_THEME);
        let theme = Theme::parse(persisted_theme.as_deref().or(options.theme.as_deref()));

        Self {
            running: true,
            mode: ViewMode::Search,
            theme,
            user_name,
            backend_url: options.backend_url,
            tabs: TabStore::new(),
            search: SearchState::default(),
            detail: DetailState::default(),
            settings: SettingsState::default(),
            status: None,
            backend,
            prefs,
            pending_search: None,
            inflight: None,
            search_token: 0,
            pending_detail: None,
        }
    }

    // ======== Key dispatch ========

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.running = false;
            return;
        }
        match self.mode {
            ViewMode::Search => self.handle_search_key(key),
            ViewMode::Detail => self.handle_detail_key(key),
            ViewMode::Settings => self.handle_settings_key(key),
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.settings = SettingsState::default();
                self.mode = ViewMode::Settings;
            }
            KeyCode::Char('t') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.toggle_theme();
            }
            KeyCode::Char('w') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                if let Some(id) = self.tabs.active_id() {
                    self.tabs.close(id);
                    self.search.selected_row = 0;
                }
            }
            KeyCode::Tab => {
                self.tabs.activate_next();
                self.search.selected_row = 0;
            }
            KeyCode::BackTab => {
                self.tabs.activate_prev();
                self.search.selected_row = 0;
            }
            KeyCode::Enter => {
                if self.search.input.trim().is_empty() {
                    self.open_selected_link();
                } else {
                    self.submit();
                }
            }
            KeyCode::Up => {
                self.search.selected_row = self.search.selected_row.saturating_sub(1);
            }
            KeyCode::Down => {
                let max = self.active_line_count().saturating_sub(1);
                self.search.selected_row = (self.search.selected_row + 1).min(max);
            }
            KeyCode::Esc => {
                self.search.input.clear();
                self.search.cursor = 0;
            }
            KeyCode::Char(c) => {
                self.search.input.insert(self.search.cursor, c);
                self.search.cursor += c.len_utf8();
            }
            KeyCode::Backspace if self.search.cursor > 0 => {
                let prev = prev_char_boundary(&self.search.input, self.search.cursor);
                self.search.input.remove(prev);
                self.search.cursor = prev;
            }
            KeyCode::Delete if self.search.cursor < self.search.input.len() => {
                self.search.input.remove(self.search.cursor);
            }
            KeyCode::Left if self.search.cursor > 0 => {
                self.search.cursor = prev_char_boundary(&self.search.input, self.search.cursor);
            }
            KeyCode::Right if self.search.cursor < self.search.input.len() => {
                self.search.cursor = next_char_boundary(&self.search.input, self.search.cursor);
            }
            KeyCode::Home => {
                self.search.cursor = 0;
            }
            KeyCode::End => {
                self.search.cursor = self.search.input.len();
            }
            _ => {}
        }
    }

    fn handle_detail_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.mode = ViewMode::Search;
            }
            KeyCode::Up => {
                self.detail.scroll = self.detail.scroll.saturating_sub(1);
            }
            KeyCode::Down => {
                self.detail.scroll = self.detail.scroll.saturating_add(1);
            }
            _ => {}
        }
    }

    fn handle_settings_key(&mut self, key: KeyEvent) {
        if self.settings.editing {
            match key.code {
                KeyCode::Enter => {
                    let value = self.settings.edit_value.trim().to_string();
                    self.settings.editing = false;
                    // Empty identity submission is a no-op, same as empty search.
                    if !value.is_empty() {
                        self.save_identity(&value);
                    }
                }
                KeyCode::Esc => {
                    self.settings.editing = false;
                }
                KeyCode::Char(c) => {
                    self.settings.edit_value.push(c);
                }
                KeyCode::Backspace => {
                    self.settings.edit_value.pop();
                }
                _ => {}
            }
            return;
        }
        match key.code {
            KeyCode::Esc => {
                self.mode = ViewMode::Search;
            }
            KeyCode::Up | KeyCode::Down => {
                self.settings.selected = match self.settings.selected {
                    SettingsItem::Identity => SettingsItem::Theme,
                    SettingsItem::Theme => SettingsItem::Identity,
                };
            }
            KeyCode::Enter => match self.settings.selected {
                SettingsItem::Identity => {
                    self.settings.editing = true;
                    self.settings.edit_value = self.user_name.clone().unwrap_or_default();
                }
                SettingsItem::Theme => {
                    self.toggle_theme();
                }
            },
            KeyCode::Delete if self.settings.selected == SettingsItem::Identity => {
                self.clear_identity();
            }
            _ => {}
        }
    }

    // ======== Search controller ========

    /// Submit the current input. Empty or whitespace-only input is a
    /// silent no-op: no request, no tab mutation.
    pub fn submit(&mut self) {
        let query = self.search.input.trim().to_string();
        if query.is_empty() {
            return;
        }

        self.search_token += 1;
        let token = self.search_token;
        let (tx, rx) = mpsc::sync_channel(1);
        self.pending_search = Some(rx);
        self.inflight = Some(InflightSearch {
            token,
            query: query.clone(),
        });
        self.search.loading = true;

        let backend = Arc::clone(&self.backend);
        let user_name = self.user_name.clone();
        std::thread::spawn(move || {
            let payload = match backend.extract(&query, user_name.as_deref()) {
                Ok(payload) => payload,
                Err(err) => {
                    debug!("extract failed: {err:#}");
                    ResultPayload::fetch_error()
                }
            };
            let _ = tx.send(SearchOutcome {
                token,
                query,
                payload,
            });
        });
    }

    /// Enter the single-source detail view. Missing parameters are a
    /// blocking inline error; no request is issued.
    pub fn open_detail(&mut self, source: &str, ioc: &str) {
        self.detail = DetailState {
            source: source.trim().to_string(),
            ioc: ioc.trim().to_string(),
            ..DetailState::default()
        };
        self.mode = ViewMode::Detail;

        if self.detail.source.is_empty() || self.detail.ioc.is_empty() {
            self.detail.error = Some("Missing source or ioc parameter".to_string());
            return;
        }

        self.detail.loading = true;
        let (tx, rx) = mpsc::sync_channel(1);
        self.pending_detail = Some(rx);

        let backend = Arc::clone(&self.backend);
        let source = self.detail.source.clone();
        let ioc = self.detail.ioc.clone();
        std::thread::spawn(move || {
            let payload = match backend.source_lookup(&source, &ioc) {
                Ok(payload) => payload,
                Err(err) => {
                    debug!("source lookup failed: {err:#}");
                    ResultPayload::fetch_error()
                }
            };
            let _ = tx.send(DetailOutcome {
                source,
                ioc,
                payload,
            });
        });
    }

    fn open_selected_link(&mut self) {
        let Some(tab) = self.tabs.active_tab() else {
            return;
        };
        let Some(payload) = &tab.results else {
            return;
        };
        let lines = payload_lines(payload);
        let link = lines
            .get(self.search.selected_row)
            .and_then(|line| line.link.clone());
        if let Some(link) = link {
            self.open_detail(&link.source, &link.ioc);
        } else if let Some(&pos) = link_positions(&lines).first() {
            // Jump the cursor to the first activatable row as a hint.
            self.search.selected_row = pos;
        }
    }

    // ======== Tick: drain worker outcomes ========

    pub fn tick(&mut self) {
        if let Some(rx) = &self.pending_search {
            match rx.try_recv() {
                Ok(outcome) => {
                    self.pending_search = None;
                    self.search.loading = false;
                    self.inflight = None;
                    if outcome.token < self.search_token {
                        // A newer submission superseded this response.
                        debug!(token = outcome.token, "dropping stale search response");
                    } else {
                        self.tabs.create_or_update(&outcome.query, outcome.payload);
                        self.search.selected_row = 0;
                        self.search.input.clear();
                        self.search.cursor = 0;
                    }
                }
                Err(mpsc::TryRecvError::Empty) => {}
                Err(mpsc::TryRecvError::Disconnected) => {
                    // Worker died; surface the uniform error payload.
                    self.pending_search = None;
                    self.search.loading = false;
                    if let Some(inflight) = self.inflight.take() {
                        if inflight.token >= self.search_token {
                            self.tabs
                                .create_or_update(&inflight.query, ResultPayload::fetch_error());
                        }
                    }
                }
            }
        }

        if let Some(rx) = &self.pending_detail {
            match rx.try_recv() {
                Ok(outcome) => {
                    self.pending_detail = None;
                    // Apply only if the view still shows this lookup.
                    if outcome.source == self.detail.source && outcome.ioc == self.detail.ioc {
                        self.detail.loading = false;
                        self.detail.payload = Some(outcome.payload);
                        self.detail.scroll = 0;
                    }
                }
                Err(mpsc::TryRecvError::Empty) => {}
                Err(mpsc::TryRecvError::Disconnected) => {
                    self.pending_detail = None;
                    self.detail.loading = false;
                    self.detail.payload = Some(ResultPayload::fetch_error());
                }
            }
        }

        if let Some(status) = &self.status {
            if Instant::now() >= status.expires_at {
                self.status = None;
            }
        }
    }

    // ======== Identity and theme ========

    /// Non-empty identity submission: Unauthenticated -> Authenticated.
    pub fn save_identity(&mut self, name: &str) {
        match self.prefs.set(PREF_USER_NAME, name) {
            Ok(()) => {
                self.user_name = Some(name.to_string());
                self.set_status(format!("Identity saved: {name}"), false);
            }
            Err(err) => self.set_status(format!("Failed to save identity: {err}"), true),
        }
    }

    /// Explicit clear: back to Unauthenticated, persisted value removed.
    pub fn clear_identity(&mut self) {
        match self.prefs.remove(PREF_USER_NAME) {
            Ok(()) => {
                self.user_name = None;
                self.set_status("Identity cleared".to_string(), false);
            }
            Err(err) => self.set_status(format!("Failed to clear identity: {err}"), true),
        }
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggle();
        if let Err(err) = self.prefs.set(PREF_THEME, self.theme.as_str()) {
            self.set_status(format!("Failed to persist theme: {err}"), true);
        }
    }

    // ======== Helpers ========

    pub fn is_authenticated(&self) -> bool {
        self.user_name.is_some()
    }

    /// Lookup links for the active tab's first IOC, if any.
    pub fn active_links(&self) -> Vec<LookupLink> {
        self.tabs
            .active_tab()
            .and_then(|tab| tab.results.as_ref())
            .and_then(|payload| payload.first_ioc())
            .map(|ioc| lookup_links(&self.backend_url, ioc))
            .unwrap_or_default()
    }

    fn active_line_count(&self) -> usize {
        self.tabs
            .active_tab()
            .and_then(|tab| tab.results.as_ref())
            .map(|payload| payload_lines(payload).len())
            .unwrap_or(0)
    }

    fn set_status(&mut self, message: String, is_error: bool) {
        self.status = Some(StatusMessage {
            message,
            is_error,
            expires_at: Instant::now() + STATUS_TTL,
        });
    }
}

// Cursor positions are byte offsets into the input; these keep every
// move on a char boundary so multibyte input cannot split a char.
fn prev_char_boundary(s: &str, idx: usize) -> usize {
    s[..idx].char_indices().next_back().map_or(0, |(i, _)| i)
}

fn next_char_boundary(s: &str, idx: usize) -> usize {
    s[idx..].chars().next().map_or(idx, |c| idx + c.len_utf8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryPreferenceStore;
    use crate::tui::test_harness::StubBackend;

    fn app_with(backend: StubBackend) -> App {
        App::new(
            AppOptions {
                backend_url: "http://localhost:8080".to_string(),
                ..AppOptions::default()
            },
            Arc::new(backend),
            Box::new(MemoryPreferenceStore::new()),
        )
    }

    fn drain(app: &mut App) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while (app.search.loading || app.detail.loading) && Instant::now() < deadline {
            app.tick();
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_empty_query_is_silent_noop() {
        let mut app = app_with(StubBackend::default());
        app.search.input = "   ".to_string();
        app.submit();
        assert!(!app.search.loading);
        assert!(app.tabs.is_empty());
        assert!(app.status.is_none());
    }

    #[test]
    fn test_submit_routes_payload_into_tab_store() {
        let backend = StubBackend::default();
        backend.push_extract(Ok(StubBackend::geo_payload("8.8.8.8")));
        let mut app = app_with(backend);

        app.search.input = "8.8.8.8".to_string();
        app.search.cursor = app.search.input.len();
        app.submit();
        assert!(app.search.loading);
        drain(&mut app);

        assert_eq!(app.tabs.len(), 1);
        assert_eq!(app.tabs.tabs()[0].label, "8.8.8.8");
        assert!(app.search.input.is_empty());
    }

    #[test]
    fn test_transport_failure_becomes_error_tab() {
        let backend = StubBackend::default();
        backend.push_extract(Err("connection refused".to_string()));
        let mut app = app_with(backend);

        app.search.input = "bad".to_string();
        app.submit();
        drain(&mut app);

        assert_eq!(app.tabs.len(), 1);
        assert_eq!(app.tabs.tabs()[0].label, "Error");
        assert_eq!(
            app.tabs.tabs()[0].results,
            Some(ResultPayload::fetch_error())
        );
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let backend = StubBackend::default();
        backend.push_extract(Ok(StubBackend::geo_payload("1.1.1.1")));
        backend.push_extract(Ok(StubBackend::geo_payload("2.2.2.2")));
        let mut app = app_with(backend);

        // First submission's receiver is replaced before any tick drains
        // it, so its response must never reach the store.
        app.search.input = "first".to_string();
        app.submit();
        app.search.input = "second".to_string();
        app.submit();
        drain(&mut app);

        assert_eq!(app.tabs.len(), 1);
        assert_eq!(app.tabs.tabs()[0].query, "second");
    }

    #[test]
    fn test_multibyte_input_edits_on_char_boundaries() {
        let mut app = app_with(StubBackend::default());
        for c in "café".chars() {
            app.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
        // Typing after a multibyte char must not split it.
        app.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::NONE));
        assert_eq!(app.search.input, "cafés");

        // Left steps over the full 's' and 'é', not single bytes.
        app.handle_key(KeyEvent::new(KeyCode::Left, KeyModifiers::NONE));
        app.handle_key(KeyEvent::new(KeyCode::Left, KeyModifiers::NONE));
        app.handle_key(KeyEvent::new(KeyCode::Char('f'), KeyModifiers::NONE));
        assert_eq!(app.search.input, "caffés");

        // Backspace removes the whole preceding char.
        app.handle_key(KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE));
        app.handle_key(KeyEvent::new(KeyCode::Right, KeyModifiers::NONE));
        app.handle_key(KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE));
        assert_eq!(app.search.input, "cafs");
    }

    #[test]
    fn test_detail_missing_params_blocks_without_request() {
        let mut app = app_with(StubBackend::default());
        app.open_detail("", "8.8.8.8");
        assert_eq!(app.mode, ViewMode::Detail);
        assert!(app.detail.error.is_some());
        assert!(!app.detail.loading);
    }

    #[test]
    fn test_detail_lookup_populates_payload() {
        let backend = StubBackend::default();
        backend.push_source(Ok(StubBackend::geo_payload("8.8.8.8")));
        let mut app = app_with(backend);

        app.open_detail("geo", "8.8.8.8");
        assert!(app.detail.loading);
        drain(&mut app);
        assert!(app.detail.payload.is_some());
        assert!(app.detail.error.is_none());
    }

    #[test]
    fn test_identity_round_trip() {
        let mut app = app_with(StubBackend::default());
        assert!(!app.is_authenticated());

        app.save_identity("analyst1");
        assert_eq!(app.user_name.as_deref(), Some("analyst1"));
        assert!(app.is_authenticated());

        app.clear_identity();
        assert!(!app.is_authenticated());
    }

    #[test]
    fn test_theme_toggle_persists() {
        let mut app = app_with(StubBackend::default());
        assert_eq!(app.theme, Theme::Dark);
        app.toggle_theme();
        assert_eq!(app.theme, Theme::Light);
    }

    #[test]
    fn test_identity_header_flows_to_backend() {
        let backend = StubBackend::default();
        backend.push_extract(Ok(StubBackend::geo_payload("8.8.8.8")));
        let calls = backend.extract_calls();
        let mut app = app_with(backend);

        app.save_identity("analyst1");
        app.search.input = "8.8.8.8".to_string();
        app.submit();
        drain(&mut app);

        let recorded = calls.lock().unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0], ("8.8.8.8".to_string(), Some("analyst1".to_string())));
    }
}
