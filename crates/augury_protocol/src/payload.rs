//! Result payload types shared by the extraction and detail endpoints.
//!
//! A payload is either data or an error, never both. The error shape is
//! also what the client materializes locally on transport failure, so the
//! tab store handles both without caring where a payload came from.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error message materialized for any transport or HTTP failure.
/// Status-code detail is deliberately not preserved.
pub const FETCH_ERROR_MESSAGE: &str = "Failed to fetch results";

/// Records for one IOC, keyed by source name ("pdns", "geo", ...), each an
/// ordered sequence of entries.
pub type SourceRecords = BTreeMap<String, Vec<RecordEntry>>;

// ============================================================================
// Payload
// ============================================================================

/// One query's outcome: the backend's data map, or a terminal error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultPayload {
    Data {
        data: BTreeMap<String, SourceRecords>,
        /// Only the OIL endpoint populates this. Keyed by IOC, ordered
        /// newest-first as the backend returns them.
        #[serde(default, rename = "queryLogs", skip_serializing_if = "BTreeMap::is_empty")]
        query_logs: BTreeMap<String, Vec<QueryLogEntry>>,
    },
    Error { error: String },
}

impl ResultPayload {
    /// The uniform failure payload.
    pub fn fetch_error() -> Self {
        ResultPayload::Error {
            error: FETCH_ERROR_MESSAGE.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ResultPayload::Error { .. })
    }

    /// First IOC key of the data map, if any. Tab labels derive from this.
    pub fn first_ioc(&self) -> Option<&str> {
        match self {
            ResultPayload::Data { data, .. } => data.keys().next().map(String::as_str),
            ResultPayload::Error { .. } => None,
        }
    }
}

// ============================================================================
// Record entries
// ============================================================================

/// One raw record entry as the backend sent it.
///
/// Entries come in two wire shapes: keyed by the source name
/// (`{"geo": {"ip": ...}}`) or the field record directly. [`RecordEntry::fields`]
/// normalizes both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordEntry(pub Value);

impl RecordEntry {
    /// The field record for `source`, unwrapping the keyed shape when
    /// present. An entry keyed under a different structure type yields the
    /// canonical key's value (e.g. a "cbr" source carrying a "process"
    /// record). Non-object entries yield `Value::Null`.
    pub fn fields(&self, source: &str, canonical: &str) -> &Value {
        static NULL: Value = Value::Null;
        if let Value::Object(map) = &self.0 {
            if let Some(inner @ Value::Object(_)) = map.get(source) {
                return inner;
            }
            if let Some(inner @ Value::Object(_)) = map.get(canonical) {
                return inner;
            }
            return &self.0;
        }
        &NULL
    }
}

// ============================================================================
// Query logs
// ============================================================================

/// One lookup audit line, carried by OIL detail responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryLogEntry {
    pub log_id: i64,
    #[serde(default)]
    pub ioc: String,
    pub last_lookup: DateTime<Utc>,
    pub result_count: i64,
    pub user_name: String,
}

impl QueryLogEntry {
    /// Audit line as the OIL view prints it:
    /// `[<last_lookup>] — <user> queried <n> result(s)`.
    pub fn display_line(&self) -> String {
        format!(
            "[{}] — {} queried {} result(s)",
            self.last_lookup.format("%Y-%m-%d %H:%M:%S UTC"),
            self.user_name,
            self.result_count
        )
    }
}
