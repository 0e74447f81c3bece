//! Payload-to-line projection for the results pane.
//!
//! The TUI widgets consume a flat list of [`RenderLine`]s so the whole
//! mapping from a [`ResultPayload`] to displayed text stays testable
//! without a terminal. Styling happens later, keyed off [`LineKind`].

use augury_protocol::{project_entry, DetailLink, RecordKind, ResultPayload};

/// Visual class of one rendered line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// `IOC: <value>` section header.
    IocHeader,
    /// `[<source>]` group header.
    SourceHeader,
    /// `Label: value` field row.
    Field,
    /// Non-fatal gap: missing template or a malformed record.
    Notice,
    /// Terminal failure message for the whole payload.
    Error,
    /// Query-log audit line (OIL detail view).
    QueryLog,
    Blank,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderLine {
    pub kind: LineKind,
    pub text: String,
    /// Present when activating this line jumps to a detail view.
    pub link: Option<DetailLink>,
}

impl RenderLine {
    fn plain(kind: LineKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            link: None,
        }
    }
}

/// Flatten one payload into display lines.
///
/// An error payload is a single error line. A data payload renders each
/// IOC, each source group under it, and each record's visible field rows;
/// sources without a display template and records that fail to decode
/// become notice lines instead of aborting the pane.
pub fn payload_lines(payload: &ResultPayload) -> Vec<RenderLine> {
    let (data, query_logs) = match payload {
        ResultPayload::Error { error } => {
            return vec![RenderLine::plain(LineKind::Error, error.clone())];
        }
        ResultPayload::Data { data, query_logs } => (data, query_logs),
    };

    let mut lines = Vec::new();
    if data.is_empty() {
        lines.push(RenderLine::plain(LineKind::Notice, "No results"));
    }
    for (ioc, sources) in data {
        lines.push(RenderLine::plain(LineKind::IocHeader, format!("IOC: {ioc}")));
        for (source, entries) in sources {
            lines.push(RenderLine::plain(
                LineKind::SourceHeader,
                format!("[{source}]"),
            ));
            if entries.is_empty() {
                lines.push(RenderLine::plain(LineKind::Notice, "no records"));
            }
            for (i, entry) in entries.iter().enumerate() {
                if i > 0 {
                    lines.push(RenderLine::plain(LineKind::Blank, ""));
                }
                let known = RecordKind::from_source(source).is_known();
                match project_entry(source, entry) {
                    Ok(rows) if rows.is_empty() => {
                        let text = if known {
                            "no visible fields".to_string()
                        } else {
                            format!("no display template for \"{source}\"")
                        };
                        lines.push(RenderLine::plain(LineKind::Notice, text));
                    }
                    Ok(rows) => {
                        for row in rows {
                            lines.push(RenderLine {
                                kind: LineKind::Field,
                                text: row.display(),
                                link: row.link,
                            });
                        }
                    }
                    Err(err) => {
                        lines.push(RenderLine::plain(LineKind::Notice, err.to_string()));
                    }
                }
            }
        }
        if let Some(logs) = query_logs.get(ioc) {
            lines.push(RenderLine::plain(LineKind::SourceHeader, "[query log]"));
            for log in logs {
                lines.push(RenderLine::plain(LineKind::QueryLog, log.display_line()));
            }
        }
    }
    lines
}

/// Indexes of lines that can be activated (carry a detail link).
pub fn link_positions(lines: &[RenderLine]) -> Vec<usize> {
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.link.is_some())
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: &str) -> ResultPayload {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_error_payload_is_single_error_line() {
        let lines = payload_lines(&ResultPayload::fetch_error());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].kind, LineKind::Error);
        assert_eq!(lines[0].text, "Failed to fetch results");
    }

    #[test]
    fn test_geo_lookup_renders_field_rows() {
        let p = payload(
            r#"{"data": {"8.8.8.8": {"geo": [
                {"geo": {"city": "Mountain View", "countryCode": "US"}}
            ]}}}"#,
        );
        let lines = payload_lines(&p);
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts[0], "IOC: 8.8.8.8");
        assert_eq!(texts[1], "[geo]");
        assert!(texts.contains(&"City: Mountain View"));
        assert!(texts.contains(&"Country Code: US"));
        assert!(lines.iter().all(|l| l.kind != LineKind::Error));
    }

    #[test]
    fn test_unknown_source_renders_notice_not_nothing() {
        let p = payload(r#"{"data": {"1.2.3.4": {"netflow": [{"src": "1.2.3.4"}]}}}"#);
        let lines = payload_lines(&p);
        let notice = lines.iter().find(|l| l.kind == LineKind::Notice).unwrap();
        assert!(notice.text.contains("netflow"));
    }

    #[test]
    fn test_malformed_record_becomes_inline_notice() {
        let p = payload(r#"{"data": {"h1": {"process": [{"process": {"pid": "oops"}}]}}}"#);
        let lines = payload_lines(&p);
        assert!(lines
            .iter()
            .any(|l| l.kind == LineKind::Notice && l.text.contains("malformed process record")));
    }

    #[test]
    fn test_process_host_name_line_carries_link() {
        let p = payload(r#"{"data": {"h": {"process": [{"process": {"host_name": "host1"}}]}}}"#);
        let lines = payload_lines(&p);
        let positions = link_positions(&lines);
        assert_eq!(positions.len(), 1);
        let link = lines[positions[0]].link.as_ref().unwrap();
        assert_eq!(link.source, "host");
        assert_eq!(link.ioc, "host1");
    }

    #[test]
    fn test_query_logs_render_after_records() {
        let p = payload(
            r#"{
                "data": {"1.2.3.4": {"oil": []}},
                "queryLogs": {"1.2.3.4": [
                    {"log_id": 1, "last_lookup": "2025-03-04T12:30:00Z",
                     "result_count": 2, "user_name": "analyst1"}
                ]}
            }"#,
        );
        let lines = payload_lines(&p);
        let log = lines.iter().find(|l| l.kind == LineKind::QueryLog).unwrap();
        assert!(log.text.contains("analyst1"));
        assert!(log.text.contains("2 result(s)"));
    }

    #[test]
    fn test_empty_data_map_notices() {
        let p = payload(r#"{"data": {}}"#);
        let lines = payload_lines(&p);
        assert_eq!(lines[0].kind, LineKind::Notice);
        assert_eq!(lines[0].text, "No results");
    }
}
