//! BinaryLane wire types
//!
//! Request and response bodies of the BinaryLane API v2 DNS endpoints.

use serde::{Deserialize, Serialize};

/// A DNS record as returned by `GET /domains/{zone}/records`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NativeRecord {
    /// BinaryLane record ID
    pub id: u64,

    /// Host part relative to the zone (`@` or empty at the apex)
    #[serde(default)]
    pub name: String,

    /// Record type name (`A`, `MX`, `CAA`, ...)
    #[serde(rename = "type")]
    pub rtype: String,

    /// Type-specific presentation data
    #[serde(default)]
    pub data: String,

    #[serde(default)]
    pub ttl: u32,

    /// MX preference or SRV priority
    #[serde(default)]
    pub priority: Option<u16>,

    #[serde(default)]
    pub weight: Option<u16>,

    #[serde(default)]
    pub port: Option<u16>,

    /// CAA flags
    #[serde(default)]
    pub flags: Option<u8>,

    /// CAA tag
    #[serde(default)]
    pub tag: Option<String>,
}

/// Body of a create or update request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordParams {
    #[serde(rename = "type")]
    pub rtype: String,

    /// Label relative to the zone, `@` at the apex
    pub name: String,

    pub data: String,

    pub ttl: u32,

    /// Only sent for MX and SRV records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
}

/// Paging links attached to list responses
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Links {
    #[serde(default)]
    pub pages: Option<Pages>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pages {
    /// Absolute URL of the next page, absent on the last one
    #[serde(default)]
    pub next: Option<String>,
}

/// One page of `GET /domains/{zone}/records`
#[derive(Debug, Deserialize)]
pub struct RecordsPage {
    #[serde(default)]
    pub domain_records: Vec<NativeRecord>,
    #[serde(default)]
    pub links: Option<Links>,
}

#[derive(Debug, Deserialize)]
pub struct DomainSummary {
    pub name: String,
}

/// One page of `GET /domains`
#[derive(Debug, Deserialize)]
pub struct DomainsPage {
    #[serde(default)]
    pub domains: Vec<DomainSummary>,
    #[serde(default)]
    pub links: Option<Links>,
}

/// Response of `GET /domain/{zone}`
#[derive(Debug, Deserialize)]
pub struct NameserversResponse {
    #[serde(default)]
    pub current_nameservers: Vec<String>,
}

/// Error body returned with non-2xx statuses
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub detail: String,
}

/// The next page URL of a list response, if any
pub fn next_page(links: &Option<Links>) -> Option<&str> {
    links
        .as_ref()
        .and_then(|links| links.pages.as_ref())
        .and_then(|pages| pages.next.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_records_page() {
        let json = r#"{
            "domain_records": [
                {"id": 10, "name": "@", "type": "MX", "data": "mail.example.com", "ttl": 3600, "priority": 10, "weight": null, "port": null, "flags": null, "tag": null},
                {"id": 11, "name": "www", "type": "A", "data": "1.2.3.4", "ttl": 600}
            ],
            "links": {"pages": {"next": "https://api.binarylane.com.au/v2/domains/example.com/records?page=2"}},
            "meta": {"total": 4}
        }"#;

        let page: RecordsPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.domain_records.len(), 2);
        assert_eq!(page.domain_records[0].priority, Some(10));
        assert_eq!(page.domain_records[1].priority, None);
        assert_eq!(
            next_page(&page.links),
            Some("https://api.binarylane.com.au/v2/domains/example.com/records?page=2")
        );
    }

    #[test]
    fn test_last_page_has_no_next() {
        let page: DomainsPage =
            serde_json::from_str(r#"{"domains": [{"name": "example.com"}], "links": {"pages": {}}}"#)
                .unwrap();
        assert_eq!(next_page(&page.links), None);

        let page: DomainsPage = serde_json::from_str(r#"{"domains": []}"#).unwrap();
        assert_eq!(next_page(&page.links), None);
    }

    #[test]
    fn test_priority_only_sent_when_set() {
        let params = RecordParams {
            rtype: "A".to_string(),
            name: "www".to_string(),
            data: "1.2.3.4".to_string(),
            ttl: 600,
            priority: None,
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "A", "name": "www", "data": "1.2.3.4", "ttl": 600})
        );
    }
}
