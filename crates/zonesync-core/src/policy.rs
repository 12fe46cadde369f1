//! Pre-diff policy filter
//!
//! Normalizes the desired record set before it reaches the differ:
//!
//! - TTLs below the provider floor are raised to it
//! - NS records at the zone apex that point at the provider's own
//!   nameservers are removed, with a warning, since the provider manages them
//!
//! The filter never fails. Anything it drops is logged.

use crate::record::{CanonicalRecord, RecordData, normalize_name};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Provider policy values applied to desired records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Minimum TTL accepted by the provider, in seconds
    #[serde(default)]
    pub min_ttl: u32,

    /// Domain suffix of the provider's default nameservers
    ///
    /// Apex NS records targeting a host under this suffix are immutable.
    #[serde(default)]
    pub nameserver_suffix: Option<String>,
}

impl PolicyConfig {
    /// Create a policy with the given TTL floor and nameserver suffix
    pub fn new(min_ttl: u32, nameserver_suffix: Option<String>) -> Self {
        Self {
            min_ttl,
            nameserver_suffix,
        }
    }

    /// Raise `ttl` to the floor if it is below it
    pub fn fix_ttl(&self, ttl: u32) -> u32 {
        ttl.max(self.min_ttl)
    }

    /// True if `record` is an apex NS record pointing at one of the
    /// provider's default nameservers
    ///
    /// Such records are managed by the provider. They are removed from the
    /// desired side by [`apply_policy`] and must be left out of the existing
    /// side too, or they would be planned as deletes.
    pub fn is_immutable_ns(&self, record: &CanonicalRecord, zone: &str) -> bool {
        match &record.data {
            RecordData::Ns { target } => {
                record.name == normalize_name(zone) && self.is_default_nameserver(target)
            }
            _ => false,
        }
    }

    /// True if `target` is one of the provider's default nameservers
    pub fn is_default_nameserver(&self, target: &str) -> bool {
        let Some(suffix) = self.nameserver_suffix.as_deref() else {
            return false;
        };
        let suffix = normalize_name(suffix);
        let target = normalize_name(target);
        target == suffix || target.ends_with(&format!(".{}", suffix))
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self::new(0, None)
    }
}

/// Apply the provider policy to a desired record set
///
/// # Parameters
///
/// - `records`: Desired records for the zone
/// - `zone`: Zone name
/// - `policy`: Provider policy values
///
/// # Returns
///
/// The records that should be presented to the differ.
pub fn apply_policy(
    records: Vec<CanonicalRecord>,
    zone: &str,
    policy: &PolicyConfig,
) -> Vec<CanonicalRecord> {
    let apex = normalize_name(zone);

    records
        .into_iter()
        .filter_map(|mut record| {
            if policy.is_immutable_ns(&record, &apex) {
                warn!(
                    "Provider does not support modifying NS records on base domain {}. {} will not be added.",
                    apex,
                    record.target()
                );
                return None;
            }

            let ttl = policy.fix_ttl(record.ttl);
            if ttl != record.ttl {
                debug!("Raising TTL of {} from {} to {}", record.name, record.ttl, ttl);
                record.ttl = ttl;
            }
            Some(record)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> PolicyConfig {
        PolicyConfig::new(600, Some("binarylane.com.au".to_string()))
    }

    fn ns(label: &str, target: &str) -> CanonicalRecord {
        CanonicalRecord::new(
            label,
            "example.com",
            3600,
            RecordData::Ns {
                target: target.to_string(),
            },
        )
    }

    fn a_with_ttl(ttl: u32) -> CanonicalRecord {
        CanonicalRecord::new(
            "www",
            "example.com",
            ttl,
            RecordData::A {
                target: "1.2.3.4".to_string(),
            },
        )
    }

    #[test]
    fn test_ttl_floor() {
        let out = apply_policy(
            vec![a_with_ttl(60), a_with_ttl(600), a_with_ttl(86400)],
            "example.com",
            &policy(),
        );
        let ttls: Vec<u32> = out.iter().map(|r| r.ttl).collect();
        assert_eq!(ttls, vec![600, 600, 86400]);
    }

    #[test]
    fn test_apex_default_ns_dropped() {
        let out = apply_policy(
            vec![
                ns("@", "ns1.binarylane.com.au."),
                ns("@", "ns2.BinaryLane.com.au"),
                ns("@", "ns1.other-dns.net."),
                ns("sub", "ns1.binarylane.com.au."),
            ],
            "example.com",
            &policy(),
        );

        let kept: Vec<(String, String)> = out
            .iter()
            .map(|r| (r.label.clone(), r.target().to_string()))
            .collect();
        assert_eq!(
            kept,
            vec![
                ("@".to_string(), "ns1.other-dns.net.".to_string()),
                ("sub".to_string(), "ns1.binarylane.com.au.".to_string()),
            ]
        );
    }

    #[test]
    fn test_immutable_ns_detection() {
        let policy = policy();
        assert!(policy.is_immutable_ns(&ns("@", "ns1.binarylane.com.au"), "example.com."));
        assert!(!policy.is_immutable_ns(&ns("sub", "ns1.binarylane.com.au"), "example.com"));
        assert!(!policy.is_immutable_ns(&a_with_ttl(600), "example.com"));
    }

    #[test]
    fn test_suffix_must_match_on_label_boundary() {
        let policy = policy();
        assert!(policy.is_default_nameserver("ns3.binarylane.com.au."));
        assert!(!policy.is_default_nameserver("ns1.notbinarylane.com.au"));
        assert!(!PolicyConfig::default().is_default_nameserver("ns1.binarylane.com.au"));
    }
}
