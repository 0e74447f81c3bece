//! Wire and display types for the Augury IOC lookup client.
//!
//! The backend answers extraction and single-source lookups with JSON of
//! the shape `{ "data": { <ioc>: { <source>: [entries] } } }`; OIL lookups
//! additionally carry `queryLogs`. Everything here is transport-agnostic:
//! the client crate owns the HTTP calls, this crate owns what the bytes
//! mean and how a record becomes display rows.

pub mod payload;
pub mod record;

pub use payload::{QueryLogEntry, RecordEntry, ResultPayload, SourceRecords, FETCH_ERROR_MESSAGE};
pub use record::{
    field_label, project_entry, DecodeError, DetailLink, FieldRow, RecordKind,
};
