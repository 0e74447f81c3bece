//! Session/tab store: the in-memory collection of open query tabs.
//!
//! A tab is one query/result session. Re-submitting a query an open tab
//! already holds updates that tab in place instead of opening another one,
//! so the store is keyed by query string for updates and by [`TabId`] for
//! everything else. The session is ephemeral; nothing here persists.

use augury_protocol::ResultPayload;

/// Opaque tab identifier, unique within one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TabId(u64);

/// One open query/result session.
#[derive(Debug, Clone)]
pub struct Tab {
    pub id: TabId,
    pub label: String,
    pub query: String,
    pub results: Option<ResultPayload>,
}

/// Tab collection with a single active tab.
///
/// Invariants: at most one tab is active, the active id always references
/// an existing tab, and an empty store has no active id.
#[derive(Debug, Default)]
pub struct TabStore {
    tabs: Vec<Tab>,
    active: Option<TabId>,
    next_id: u64,
}

impl TabStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route a finished query into the store.
    ///
    /// A tab whose `query` matches is updated in place and re-activated,
    /// keeping its id and label. Otherwise a new tab is appended with a
    /// label derived from the payload's first IOC ("Error" for failure
    /// payloads, "Results" when the data map is empty), disambiguated
    /// against existing labels with a ` (n)` suffix.
    pub fn create_or_update(&mut self, query: &str, payload: ResultPayload) -> TabId {
        if let Some(tab) = self.tabs.iter_mut().find(|tab| tab.query == query) {
            tab.results = Some(payload);
            let id = tab.id;
            self.active = Some(id);
            return id;
        }

        let base = if payload.is_error() {
            "Error".to_string()
        } else {
            payload
                .first_ioc()
                .map(str::to_string)
                .unwrap_or_else(|| "Results".to_string())
        };
        let label = self.disambiguate(&base);

        let id = TabId(self.next_id);
        self.next_id += 1;
        self.tabs.push(Tab {
            id,
            label,
            query: query.to_string(),
            results: Some(payload),
        });
        self.active = Some(id);
        id
    }

    /// Close a tab. When the active tab closes, the first remaining tab in
    /// insertion order takes over, or the active id clears if none remain.
    /// Unknown ids are ignored; a late response may target a closed tab.
    pub fn close(&mut self, id: TabId) {
        let Some(index) = self.tabs.iter().position(|tab| tab.id == id) else {
            return;
        };
        self.tabs.remove(index);
        if self.active == Some(id) {
            self.active = self.tabs.first().map(|tab| tab.id);
        }
    }

    /// Activate a tab; ids not present are ignored.
    pub fn activate(&mut self, id: TabId) {
        if self.tabs.iter().any(|tab| tab.id == id) {
            self.active = Some(id);
        }
    }

    pub fn active_id(&self) -> Option<TabId> {
        self.active
    }

    pub fn active_tab(&self) -> Option<&Tab> {
        self.active
            .and_then(|id| self.tabs.iter().find(|tab| tab.id == id))
    }

    /// Position of the active tab in insertion order.
    pub fn active_index(&self) -> Option<usize> {
        self.active
            .and_then(|id| self.tabs.iter().position(|tab| tab.id == id))
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    /// Cycle activation forward in insertion order.
    pub fn activate_next(&mut self) {
        if let Some(index) = self.active_index() {
            let next = (index + 1) % self.tabs.len();
            self.active = Some(self.tabs[next].id);
        }
    }

    /// Cycle activation backward in insertion order.
    pub fn activate_prev(&mut self) {
        if let Some(index) = self.active_index() {
            let prev = (index + self.tabs.len() - 1) % self.tabs.len();
            self.active = Some(self.tabs[prev].id);
        }
    }

    fn disambiguate(&self, base: &str) -> String {
        if !self.tabs.iter().any(|tab| tab.label == base) {
            return base.to_string();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{base} ({n})");
            if !self.tabs.iter().any(|tab| tab.label == candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use augury_protocol::SourceRecords;
    use std::collections::BTreeMap;

    fn data_payload(ioc: &str) -> ResultPayload {
        let mut data = BTreeMap::new();
        data.insert(ioc.to_string(), SourceRecords::new());
        ResultPayload::Data {
            data,
            query_logs: BTreeMap::new(),
        }
    }

    fn empty_payload() -> ResultPayload {
        ResultPayload::Data {
            data: BTreeMap::new(),
            query_logs: BTreeMap::new(),
        }
    }

    #[test]
    fn test_new_tab_per_distinct_query() {
        let mut store = TabStore::new();
        let a = store.create_or_update("8.8.8.8", data_payload("8.8.8.8"));
        let b = store.create_or_update("1.1.1.1", data_payload("1.1.1.1"));
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
        assert_eq!(store.active_id(), Some(b));
        assert_eq!(store.tabs()[0].label, "8.8.8.8");
        assert_eq!(store.tabs()[1].label, "1.1.1.1");
    }

    #[test]
    fn test_duplicate_query_updates_in_place() {
        let mut store = TabStore::new();
        let first = store.create_or_update("8.8.8.8", data_payload("8.8.8.8"));
        store.create_or_update("1.1.1.1", data_payload("1.1.1.1"));

        let again = store.create_or_update("8.8.8.8", ResultPayload::fetch_error());
        assert_eq!(first, again);
        assert_eq!(store.len(), 2);
        assert_eq!(store.active_id(), Some(first));
        // Results reflect the second response.
        assert!(store.tabs()[0].results.as_ref().unwrap().is_error());
        // Label and id survive the update.
        assert_eq!(store.tabs()[0].label, "8.8.8.8");
    }

    #[test]
    fn test_label_fallbacks() {
        let mut store = TabStore::new();
        store.create_or_update("q1", empty_payload());
        store.create_or_update("q2", ResultPayload::fetch_error());
        assert_eq!(store.tabs()[0].label, "Results");
        assert_eq!(store.tabs()[1].label, "Error");
    }

    #[test]
    fn test_colliding_labels_get_suffix() {
        let mut store = TabStore::new();
        // Distinct queries whose payloads share the same first IOC.
        store.create_or_update("lookup a", data_payload("8.8.8.8"));
        store.create_or_update("lookup b", data_payload("8.8.8.8"));
        store.create_or_update("lookup c", data_payload("8.8.8.8"));
        let labels: Vec<&str> = store.tabs().iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["8.8.8.8", "8.8.8.8 (2)", "8.8.8.8 (3)"]);
    }

    #[test]
    fn test_suffix_skips_taken_slots() {
        let mut store = TabStore::new();
        store.create_or_update("a", data_payload("x"));
        store.create_or_update("b", data_payload("x"));
        // Close "x", keep "x (2)"; the next collision takes the freed base.
        let first = store.tabs()[0].id;
        store.close(first);
        store.create_or_update("c", data_payload("x"));
        let labels: Vec<&str> = store.tabs().iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["x (2)", "x"]);
    }

    #[test]
    fn test_close_active_activates_first_remaining() {
        let mut store = TabStore::new();
        let a = store.create_or_update("a", data_payload("a"));
        let b = store.create_or_update("b", data_payload("b"));
        let c = store.create_or_update("c", data_payload("c"));
        assert_eq!(store.active_id(), Some(c));

        store.close(c);
        assert_eq!(store.active_id(), Some(a));
        store.close(a);
        assert_eq!(store.active_id(), Some(b));
        store.close(b);
        assert_eq!(store.active_id(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_close_inactive_keeps_active() {
        let mut store = TabStore::new();
        let a = store.create_or_update("a", data_payload("a"));
        let b = store.create_or_update("b", data_payload("b"));
        store.activate(a);
        store.close(b);
        assert_eq!(store.active_id(), Some(a));
    }

    #[test]
    fn test_activate_unknown_id_is_ignored() {
        let mut store = TabStore::new();
        let a = store.create_or_update("a", data_payload("a"));
        store.close(a);
        store.activate(a);
        assert_eq!(store.active_id(), None);
    }

    #[test]
    fn test_cycling_wraps() {
        let mut store = TabStore::new();
        let a = store.create_or_update("a", data_payload("a"));
        let b = store.create_or_update("b", data_payload("b"));
        let c = store.create_or_update("c", data_payload("c"));
        assert_eq!(store.active_id(), Some(c));
        store.activate_next();
        assert_eq!(store.active_id(), Some(a));
        store.activate_prev();
        assert_eq!(store.active_id(), Some(c));
        store.activate_prev();
        assert_eq!(store.active_id(), Some(b));
    }

    #[test]
    fn test_ids_are_unique_across_close_and_reopen() {
        let mut store = TabStore::new();
        let a = store.create_or_update("a", data_payload("a"));
        store.close(a);
        let b = store.create_or_update("a", data_payload("a"));
        assert_ne!(a, b);
    }
}
