//! Typed record schemas and field projection.
//!
//! Each known structure type gets an explicit schema matching what the
//! backend parser emits, and projection is an exhaustive match over
//! [`RecordKind`] so adding a kind without a template is a compile error,
//! not a silent blank card. Wire names drift between snake_case and
//! camelCase across sources; serde aliases absorb that here so labels can
//! derive uniformly from the snake_case identifiers.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::payload::RecordEntry;

// ============================================================================
// Kinds
// ============================================================================

/// The declared record kind, selected by the source-name string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Oil,
    Client,
    Asset,
    Binary,
    Geo,
    Ldap,
    Pdns,
    /// EDR process telemetry; "cbr" is the wire alias.
    Process,
    Host,
    Unknown,
}

impl RecordKind {
    pub fn from_source(source: &str) -> Self {
        match source {
            "oil" => RecordKind::Oil,
            "client" => RecordKind::Client,
            "asset" => RecordKind::Asset,
            "binary" => RecordKind::Binary,
            "geo" => RecordKind::Geo,
            "ldap" => RecordKind::Ldap,
            "pdns" => RecordKind::Pdns,
            "process" | "cbr" => RecordKind::Process,
            "host" => RecordKind::Host,
            _ => RecordKind::Unknown,
        }
    }

    /// Canonical entry key for the kind, `None` for [`RecordKind::Unknown`].
    pub fn wire_name(self) -> Option<&'static str> {
        match self {
            RecordKind::Oil => Some("oil"),
            RecordKind::Client => Some("client"),
            RecordKind::Asset => Some("asset"),
            RecordKind::Binary => Some("binary"),
            RecordKind::Geo => Some("geo"),
            RecordKind::Ldap => Some("ldap"),
            RecordKind::Pdns => Some("pdns"),
            RecordKind::Process => Some("process"),
            RecordKind::Host => Some("host"),
            RecordKind::Unknown => None,
        }
    }

    pub fn is_known(self) -> bool {
        !matches!(self, RecordKind::Unknown)
    }
}

// ============================================================================
// Rows
// ============================================================================

/// One display-ready field line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRow {
    pub label: String,
    pub value: String,
    /// Set when the value doubles as a jump target into a detail view.
    pub link: Option<DetailLink>,
}

impl FieldRow {
    pub fn display(&self) -> String {
        format!("{}: {}", self.label, self.value)
    }
}

/// Structural detail-view target: the UI routes from this instead of
/// parsing a path back apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailLink {
    pub source: String,
    pub ioc: String,
}

/// `snake_case` identifier to a title-cased display label
/// (`country_code` -> `Country Code`).
pub fn field_label(name: &str) -> String {
    name.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// The field is `source_name`, not `source`: thiserror reserves `source`
// for the error-source chain and would require it to be an Error itself.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed {source_name} record: {reason}")]
    MalformedRecord { source_name: String, reason: String },
}

/// Project one entry into display rows.
///
/// Unknown kinds project no rows (the caller decides how to surface the
/// gap); schema mismatch is an error for the caller to render inline, not
/// a crash.
pub fn project_entry(source: &str, entry: &RecordEntry) -> Result<Vec<FieldRow>, DecodeError> {
    let kind = RecordKind::from_source(source);
    let canonical = kind.wire_name().unwrap_or(source);
    let fields = entry.fields(source, canonical);

    match kind {
        RecordKind::Oil => Ok(decode::<OilRecord>(source, fields)?.rows()),
        RecordKind::Client => Ok(decode::<ClientRecord>(source, fields)?.rows()),
        RecordKind::Asset => Ok(decode::<AssetRecord>(source, fields)?.rows()),
        RecordKind::Binary => Ok(decode::<BinaryRecord>(source, fields)?.rows()),
        RecordKind::Geo => Ok(decode::<GeoRecord>(source, fields)?.rows()),
        RecordKind::Ldap => Ok(decode::<LdapRecord>(source, fields)?.rows()),
        RecordKind::Pdns => Ok(decode::<PdnsRecord>(source, fields)?.rows()),
        RecordKind::Process => Ok(decode::<ProcessRecord>(source, fields)?.rows()),
        RecordKind::Host => Ok(decode::<HostRecord>(source, fields)?.rows()),
        RecordKind::Unknown => Ok(Vec::new()),
    }
}

fn decode<T: DeserializeOwned>(source: &str, fields: &Value) -> Result<T, DecodeError> {
    serde_json::from_value(fields.clone()).map_err(|err| DecodeError::MalformedRecord {
        source_name: source.to_string(),
        reason: err.to_string(),
    })
}

/// Row accumulator owning the visibility rule: a field is omitted when its
/// value is absent, a blank string, or an empty sequence. Present numbers
/// and booleans always render, `0` and `false` included.
struct Rows(Vec<FieldRow>);

impl Rows {
    fn new() -> Self {
        Rows(Vec::new())
    }

    fn push(&mut self, name: &str, value: String, link: Option<DetailLink>) {
        self.0.push(FieldRow {
            label: field_label(name),
            value,
            link,
        });
    }

    fn text(&mut self, name: &str, value: &Option<String>) {
        if let Some(v) = value {
            if !v.trim().is_empty() {
                self.push(name, v.clone(), None);
            }
        }
    }

    fn int(&mut self, name: &str, value: Option<i64>) {
        if let Some(v) = value {
            self.push(name, v.to_string(), None);
        }
    }

    fn flag(&mut self, name: &str, value: Option<bool>) {
        if let Some(v) = value {
            self.push(name, v.to_string(), None);
        }
    }

    fn list(&mut self, name: &str, values: &[String]) {
        if !values.is_empty() {
            self.push(name, values.join(", "), None);
        }
    }

    fn linked(&mut self, name: &str, value: &Option<String>, target_source: &str) {
        if let Some(v) = value {
            if !v.trim().is_empty() {
                let link = DetailLink {
                    source: target_source.to_string(),
                    ioc: v.clone(),
                };
                self.push(name, v.clone(), Some(link));
            }
        }
    }

    fn into_vec(self) -> Vec<FieldRow> {
        self.0
    }
}

// ============================================================================
// Schemas
// ============================================================================

/// Event-log entry from the OIL source. The backend flattens several
/// upstream log families into this one shape, hence the breadth.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OilRecord {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default, alias = "userPrincipalName")]
    pub user_principal_name: Option<String>,
    #[serde(default, alias = "displayName")]
    pub display_name: Option<String>,
    #[serde(default, alias = "clientIp")]
    pub client_ip: Option<String>,
    #[serde(default, alias = "clientAsOrg")]
    pub client_as_org: Option<String>,
    #[serde(default, alias = "eventType")]
    pub event_type: Option<String>,
    #[serde(default)]
    pub outcome: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, alias = "displayMessage")]
    pub display_message: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, alias = "eventStart")]
    pub event_start: Option<String>,
    #[serde(default, alias = "eventEnd")]
    pub event_end: Option<String>,
    #[serde(default, alias = "sourceASNOrg")]
    pub source_asn_org: Option<String>,
    #[serde(default, alias = "sourceASN")]
    pub source_asn: Option<String>,
    #[serde(default, alias = "sourceCountry")]
    pub source_country: Option<String>,
    #[serde(default, alias = "sourceCity")]
    pub source_city: Option<String>,
    #[serde(default, alias = "destinationIP")]
    pub destination_ip: Option<String>,
    #[serde(default, alias = "destinationPort")]
    pub destination_port: Option<String>,
    #[serde(default, alias = "destinationASN")]
    pub destination_asn: Option<String>,
    #[serde(default, alias = "destinationOrg")]
    pub destination_org: Option<String>,
}

impl OilRecord {
    fn rows(&self) -> Vec<FieldRow> {
        let mut rows = Rows::new();
        rows.text("timestamp", &self.timestamp);
        rows.text("user_principal_name", &self.user_principal_name);
        rows.text("display_name", &self.display_name);
        rows.text("client_ip", &self.client_ip);
        rows.text("client_as_org", &self.client_as_org);
        rows.text("event_type", &self.event_type);
        rows.text("outcome", &self.outcome);
        rows.text("message", &self.message);
        rows.text("display_message", &self.display_message);
        rows.list("tags", &self.tags);
        rows.text("event_start", &self.event_start);
        rows.text("event_end", &self.event_end);
        rows.text("source_asn_org", &self.source_asn_org);
        rows.text("source_asn", &self.source_asn);
        rows.text("source_country", &self.source_country);
        rows.text("source_city", &self.source_city);
        rows.text("destination_ip", &self.destination_ip);
        rows.text("destination_port", &self.destination_port);
        rows.text("destination_asn", &self.destination_asn);
        rows.text("destination_org", &self.destination_org);
        rows.into_vec()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ClientRecord {
    #[serde(default)]
    pub as_org: Option<String>,
    #[serde(default)]
    pub asn: Option<i64>,
    #[serde(default)]
    pub ip: Option<String>,
}

impl ClientRecord {
    fn rows(&self) -> Vec<FieldRow> {
        let mut rows = Rows::new();
        rows.text("as_org", &self.as_org);
        rows.int("asn", self.asn);
        rows.text("ip", &self.ip);
        rows.into_vec()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AssetRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default, alias = "platformName")]
    pub platform_name: Option<String>,
    #[serde(default, alias = "platformOwner")]
    pub platform_owner: Option<String>,
    #[serde(default)]
    pub executive: Option<String>,
    #[serde(default, alias = "stackName")]
    pub stack_name: Option<String>,
    #[serde(default, alias = "stackOwner")]
    pub stack_owner: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
}

impl AssetRecord {
    fn rows(&self) -> Vec<FieldRow> {
        let mut rows = Rows::new();
        rows.text("name", &self.name);
        rows.text("ip", &self.ip);
        rows.text("platform_name", &self.platform_name);
        rows.text("platform_owner", &self.platform_owner);
        rows.text("executive", &self.executive);
        rows.text("stack_name", &self.stack_name);
        rows.text("stack_owner", &self.stack_owner);
        rows.text("created", &self.created);
        rows.text("updated", &self.updated);
        rows.into_vec()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BinaryRecord {
    #[serde(default)]
    pub md5: Option<String>,
    #[serde(default)]
    pub sha256: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub accessed: Option<String>,
    #[serde(default)]
    pub hosts: Vec<String>,
    #[serde(default, alias = "codeSigned")]
    pub code_signed: Option<bool>,
    #[serde(default)]
    pub url: Option<String>,
}

impl BinaryRecord {
    fn rows(&self) -> Vec<FieldRow> {
        let mut rows = Rows::new();
        rows.text("md5", &self.md5);
        rows.text("sha256", &self.sha256);
        rows.text("filename", &self.filename);
        rows.text("accessed", &self.accessed);
        rows.list("hosts", &self.hosts);
        rows.flag("code_signed", self.code_signed);
        rows.text("url", &self.url);
        rows.into_vec()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GeoRecord {
    #[serde(default, alias = "countryCode")]
    pub country_code: Option<String>,
    #[serde(default, alias = "countryName")]
    pub country_name: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default, alias = "asNumber")]
    pub as_number: Option<String>,
    #[serde(default, alias = "asOrg")]
    pub as_org: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
}

impl GeoRecord {
    fn rows(&self) -> Vec<FieldRow> {
        let mut rows = Rows::new();
        rows.text("city", &self.city);
        rows.text("country_code", &self.country_code);
        rows.text("country_name", &self.country_name);
        rows.text("as_number", &self.as_number);
        rows.text("as_org", &self.as_org);
        rows.text("ip", &self.ip);
        rows.into_vec()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LdapRecord {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "fullName")]
    pub full_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "companyName")]
    pub company_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub manager: Option<String>,
    #[serde(default)]
    pub age: Option<String>,
}

impl LdapRecord {
    fn rows(&self) -> Vec<FieldRow> {
        let mut rows = Rows::new();
        rows.text("email", &self.email);
        rows.text("full_name", &self.full_name);
        rows.text("name", &self.name);
        rows.text("title", &self.title);
        rows.text("company_name", &self.company_name);
        rows.text("phone", &self.phone);
        rows.text("mobile", &self.mobile);
        rows.text("created", &self.created);
        rows.text("manager", &self.manager);
        rows.text("age", &self.age);
        rows.into_vec()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DnsAnswer {
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub record_type: Option<String>,
    #[serde(default)]
    pub count: Option<i64>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PdnsRecord {
    #[serde(default)]
    pub answers: Vec<DnsAnswer>,
}

impl PdnsRecord {
    // Answers repeat as row groups in order; a resolver answer with no
    // visible fields contributes nothing.
    fn rows(&self) -> Vec<FieldRow> {
        let mut rows = Rows::new();
        for answer in &self.answers {
            rows.text("data", &answer.data);
            rows.text("name", &answer.name);
            rows.text("type", &answer.record_type);
            rows.int("count", answer.count);
            rows.text("start", &answer.start);
            rows.text("end", &answer.end);
        }
        rows.into_vec()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProcessRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub command_line: Option<String>,
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub executable: Option<String>,
    #[serde(default)]
    pub pid: Option<i64>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub uptime: Option<i64>,
    #[serde(default)]
    pub parent_name: Option<String>,
    #[serde(default)]
    pub parent_pid: Option<i64>,
    #[serde(default)]
    pub parent_entity_id: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default, alias = "hostname")]
    pub host_name: Option<String>,
    #[serde(default)]
    pub host_type: Option<String>,
    #[serde(default)]
    pub host_ips: Vec<String>,
    #[serde(default)]
    pub host_os: Option<String>,
    #[serde(default)]
    pub code_signed: Option<bool>,
    #[serde(default)]
    pub url: Option<String>,
}

impl ProcessRecord {
    fn rows(&self) -> Vec<FieldRow> {
        let mut rows = Rows::new();
        rows.text("name", &self.name);
        rows.text("command_line", &self.command_line);
        rows.text("entity_id", &self.entity_id);
        rows.text("executable", &self.executable);
        rows.int("pid", self.pid);
        rows.text("start", &self.start);
        rows.int("uptime", self.uptime);
        rows.text("parent_name", &self.parent_name);
        rows.int("parent_pid", self.parent_pid);
        rows.text("parent_entity_id", &self.parent_entity_id);
        rows.text("user_name", &self.user_name);
        // The one link-annotated field: jump to the host detail view.
        rows.linked("host_name", &self.host_name, "host");
        rows.text("host_type", &self.host_type);
        rows.list("host_ips", &self.host_ips);
        rows.text("host_os", &self.host_os);
        rows.flag("code_signed", self.code_signed);
        rows.text("url", &self.url);
        rows.into_vec()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HostRecord {
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub ips: Vec<String>,
    #[serde(default)]
    pub macs: Vec<String>,
    #[serde(default)]
    pub uptime: Option<i64>,
    #[serde(default)]
    pub os_full: Option<String>,
    #[serde(default)]
    pub os_version: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl HostRecord {
    fn rows(&self) -> Vec<FieldRow> {
        let mut rows = Rows::new();
        rows.text("hostname", &self.hostname);
        rows.text("name", &self.name);
        rows.int("id", self.id);
        rows.list("ips", &self.ips);
        rows.list("macs", &self.macs);
        rows.int("uptime", self.uptime);
        rows.text("os_full", &self.os_full);
        rows.text("os_version", &self.os_version);
        rows.text("url", &self.url);
        rows.into_vec()
    }
}
