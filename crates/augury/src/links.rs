//! Lookup-link table rendered next to every extracted indicator.
//!
//! Internal entries open the in-app detail view; external entries carry an
//! absolute URL to a reference service. The set and order are fixed.

use crate::config::DEFAULT_BACKEND_URL;

/// Routing target for one lookup link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// In-app detail view for a single source.
    Detail { source: &'static str, ioc: String },
    /// Absolute URL to an external service.
    External(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupLink {
    pub label: &'static str,
    pub target: LinkTarget,
}

impl LookupLink {
    pub fn is_internal(&self) -> bool {
        matches!(self.target, LinkTarget::Detail { .. })
    }
}

/// Build the lookup-link table for one indicator. The IOC is percent-encoded
/// exactly once in external URLs; internal targets carry it raw so routing
/// never re-parses a URL.
pub fn lookup_links(backend_url: &str, ioc: &str) -> Vec<LookupLink> {
    let encoded = urlencoding::encode(ioc);
    let base = backend_url.trim_end_matches('/');

    let detail = |label: &'static str, source: &'static str| LookupLink {
        label,
        target: LinkTarget::Detail {
            source,
            ioc: ioc.to_string(),
        },
    };
    let external = |label: &'static str, url: String| LookupLink {
        label,
        target: LinkTarget::External(url),
    };

    vec![
        detail("PDNS", "pdns"),
        detail("LDAP", "ldap"),
        detail("GeoIP", "geo"),
        detail("Binary", "binary"),
        detail("OIL", "oil"),
        detail("CBR", "cbr"),
        external("VPN", format!("{base}/api/vpn?ioc={encoded}")),
        external(
            "Shodan",
            format!("https://www.shodan.io/search?query={encoded}"),
        ),
        external(
            "Censys",
            format!("https://search.censys.io/search?resource=hosts&q={encoded}"),
        ),
        external("Spur", format!("https://spur.us/search?q={encoded}")),
        external(
            "IP2Proxy",
            format!("https://www.ip2proxy.com/demo/{encoded}"),
        ),
        external("BGP View", format!("https://bgpview.io/ip/{encoded}")),
    ]
}

/// Table built against the default backend; used where no configured URL
/// is in scope.
pub fn default_lookup_links(ioc: &str) -> Vec<LookupLink> {
    lookup_links(DEFAULT_BACKEND_URL, ioc)
}
