//! Canonical record model
//!
//! [`CanonicalRecord`] is the provider-agnostic representation of a DNS
//! resource record. Desired records come from configuration, existing records
//! come from a provider's translator; both are compared in this form.
//!
//! Type-specific fields live in the closed [`RecordData`] enum so every
//! consumer matches on it exhaustively. Types with no native encoding end up
//! in [`RecordData::Other`] and are rejected when a native form is requested.
//!
//! Provider identifiers are deliberately not part of the record. See
//! [`crate::existing::ExistingRecords`].

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Label used for records at the zone apex
pub const APEX_LABEL: &str = "@";

/// DNS record type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecordType {
    A,
    Aaaa,
    Cname,
    Alias,
    Ns,
    Mx,
    Txt,
    Srv,
    Caa,
    Tlsa,
    Svcb,
    Https,
    /// Any other type name, kept uppercased
    Other(String),
}

impl RecordType {
    /// The wire name of the type (e.g. "AAAA")
    pub fn as_str(&self) -> &str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Cname => "CNAME",
            RecordType::Alias => "ALIAS",
            RecordType::Ns => "NS",
            RecordType::Mx => "MX",
            RecordType::Txt => "TXT",
            RecordType::Srv => "SRV",
            RecordType::Caa => "CAA",
            RecordType::Tlsa => "TLSA",
            RecordType::Svcb => "SVCB",
            RecordType::Https => "HTTPS",
            RecordType::Other(name) => name,
        }
    }
}

impl FromStr for RecordType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Ok(match upper.as_str() {
            "A" => RecordType::A,
            "AAAA" => RecordType::Aaaa,
            "CNAME" => RecordType::Cname,
            "ALIAS" => RecordType::Alias,
            "NS" => RecordType::Ns,
            "MX" => RecordType::Mx,
            "TXT" => RecordType::Txt,
            "SRV" => RecordType::Srv,
            "CAA" => RecordType::Caa,
            "TLSA" => RecordType::Tlsa,
            "SVCB" => RecordType::Svcb,
            "HTTPS" => RecordType::Https,
            _ => RecordType::Other(upper),
        })
    }
}

impl From<String> for RecordType {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(rtype) => rtype,
            Err(never) => match never {},
        }
    }
}

impl From<RecordType> for String {
    fn from(rtype: RecordType) -> Self {
        rtype.as_str().to_string()
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type-specific payload of a record
///
/// `target` is the main data field for every variant: an address for A/AAAA,
/// a hostname for CNAME/ALIAS/NS/MX/SRV/SVCB/HTTPS, the text for TXT, the CAA
/// value and the TLSA certificate data.
///
/// Serialized with the type name in a `type` field. Type names with no
/// variant of their own, such as `PTR`, become [`RecordData::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(remote = "Self", tag = "type", rename_all = "UPPERCASE")]
pub enum RecordData {
    A {
        target: String,
    },
    Aaaa {
        target: String,
    },
    Cname {
        target: String,
    },
    Alias {
        target: String,
    },
    Ns {
        target: String,
    },
    Mx {
        #[serde(default)]
        preference: u16,
        target: String,
    },
    Txt {
        target: String,
    },
    Srv {
        #[serde(default)]
        priority: u16,
        #[serde(default)]
        weight: u16,
        #[serde(default)]
        port: u16,
        target: String,
    },
    Caa {
        #[serde(default)]
        flag: u8,
        tag: String,
        target: String,
    },
    Tlsa {
        #[serde(default)]
        usage: u8,
        #[serde(default)]
        selector: u8,
        #[serde(default)]
        matching_type: u8,
        target: String,
    },
    Svcb {
        #[serde(default)]
        priority: u16,
        target: String,
        #[serde(default)]
        params: String,
    },
    Https {
        #[serde(default)]
        priority: u16,
        target: String,
        #[serde(default)]
        params: String,
    },
    /// A type this model has no structure for
    #[serde(skip)]
    Other {
        rtype: String,
        target: String,
    },
}

impl RecordData {
    /// The record type of this payload
    pub fn rtype(&self) -> RecordType {
        match self {
            RecordData::A { .. } => RecordType::A,
            RecordData::Aaaa { .. } => RecordType::Aaaa,
            RecordData::Cname { .. } => RecordType::Cname,
            RecordData::Alias { .. } => RecordType::Alias,
            RecordData::Ns { .. } => RecordType::Ns,
            RecordData::Mx { .. } => RecordType::Mx,
            RecordData::Txt { .. } => RecordType::Txt,
            RecordData::Srv { .. } => RecordType::Srv,
            RecordData::Caa { .. } => RecordType::Caa,
            RecordData::Tlsa { .. } => RecordType::Tlsa,
            RecordData::Svcb { .. } => RecordType::Svcb,
            RecordData::Https { .. } => RecordType::Https,
            RecordData::Other { rtype, .. } => rtype.clone().into(),
        }
    }

    /// The main data field
    pub fn target(&self) -> &str {
        match self {
            RecordData::A { target }
            | RecordData::Aaaa { target }
            | RecordData::Cname { target }
            | RecordData::Alias { target }
            | RecordData::Ns { target }
            | RecordData::Mx { target, .. }
            | RecordData::Txt { target }
            | RecordData::Srv { target, .. }
            | RecordData::Caa { target, .. }
            | RecordData::Tlsa { target, .. }
            | RecordData::Svcb { target, .. }
            | RecordData::Https { target, .. }
            | RecordData::Other { target, .. } => target,
        }
    }
}

impl Serialize for RecordData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RecordData::Other { rtype, target } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", rtype)?;
                map.serialize_entry("target", target)?;
                map.end()
            }
            known => RecordData::serialize(known, serializer),
        }
    }
}

impl<'de> Deserialize<'de> for RecordData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut value = Value::deserialize(deserializer)?;
        let Some(fields) = value.as_object_mut() else {
            return Err(D::Error::custom("record data must be an object"));
        };

        let rtype = match fields.get("type").and_then(Value::as_str) {
            Some(name) => RecordType::from(name.to_string()),
            None => return Err(D::Error::missing_field("type")),
        };

        match rtype {
            RecordType::Other(rtype) => {
                let target = fields
                    .get("target")
                    .and_then(Value::as_str)
                    .ok_or_else(|| D::Error::missing_field("target"))?
                    .to_string();
                Ok(RecordData::Other { rtype, target })
            }
            known => {
                fields.insert("type".to_string(), Value::String(known.as_str().to_string()));
                RecordData::deserialize(value).map_err(D::Error::custom)
            }
        }
    }
}

impl fmt::Display for RecordData {
    /// Presentation form of the payload, as it would appear in a zone file
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordData::Mx { preference, target } => write!(f, "{} {}", preference, target),
            RecordData::Srv {
                priority,
                weight,
                port,
                target,
            } => write!(f, "{} {} {} {}", priority, weight, port, target),
            RecordData::Caa { flag, tag, target } => write!(f, "{} {} \"{}\"", flag, tag, target),
            RecordData::Tlsa {
                usage,
                selector,
                matching_type,
                target,
            } => write!(f, "{} {} {} {}", usage, selector, matching_type, target),
            RecordData::Svcb {
                priority,
                target,
                params,
            }
            | RecordData::Https {
                priority,
                target,
                params,
            } => {
                if params.is_empty() {
                    write!(f, "{} {}", priority, target)
                } else {
                    write!(f, "{} {} {}", priority, target, params)
                }
            }
            other => f.write_str(other.target()),
        }
    }
}

/// Provider-agnostic DNS record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Host part relative to the zone, `@` at the apex
    pub label: String,

    /// Fully-qualified owner name, lowercase, without trailing dot
    ///
    /// May be left empty in configuration files; [`CanonicalRecord::qualify`]
    /// fills it in from the label.
    #[serde(default)]
    pub name: String,

    /// Time-to-live in seconds
    pub ttl: u32,

    /// Type and type-specific fields
    #[serde(flatten)]
    pub data: RecordData,

    /// Free-form metadata, only used by synthetic record types
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl CanonicalRecord {
    /// Create a record for `label` inside `zone`
    ///
    /// `label` may be relative (`www`), the apex (`@` or empty) or already
    /// fully-qualified (`www.example.com.`).
    pub fn new(label: &str, zone: &str, ttl: u32, data: RecordData) -> Self {
        let label = relative_label(label, zone);
        let name = fqdn(&label, zone);
        Self {
            label,
            name,
            ttl,
            data,
            metadata: BTreeMap::new(),
        }
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Normalize label and owner name against `zone`
    ///
    /// Used for records read from configuration, where only the label is
    /// usually given.
    pub fn qualify(mut self, zone: &str) -> Self {
        let source = if self.label.is_empty() && !self.name.is_empty() {
            format!("{}.", self.name.trim_end_matches('.'))
        } else {
            self.label.clone()
        };
        self.label = relative_label(&source, zone);
        self.name = fqdn(&self.label, zone);
        self
    }

    /// The record type
    pub fn rtype(&self) -> RecordType {
        self.data.rtype()
    }

    /// The main data field
    pub fn target(&self) -> &str {
        self.data.target()
    }

    /// True if the record sits at the apex of its zone
    pub fn is_apex(&self) -> bool {
        self.label == APEX_LABEL
    }

    /// True if both records carry the same data, TTL and metadata
    ///
    /// Owner name and label are not compared.
    pub fn same_content(&self, other: &Self) -> bool {
        self.ttl == other.ttl && self.data == other.data && self.metadata == other.metadata
    }

    /// True if both records differ at most in TTL
    pub fn same_data(&self, other: &Self) -> bool {
        self.data == other.data && self.metadata == other.metadata
    }
}

impl fmt::Display for CanonicalRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} ttl={}", self.name, self.rtype(), self.data, self.ttl)
    }
}

/// Lowercase a domain name and strip one trailing dot
pub fn normalize_name(name: &str) -> String {
    name.strip_suffix('.').unwrap_or(name).to_ascii_lowercase()
}

/// Fully-qualified owner name for `label` in `zone`
pub fn fqdn(label: &str, zone: &str) -> String {
    let zone = normalize_name(zone);
    if label.is_empty() || label == APEX_LABEL {
        zone
    } else {
        format!("{}.{}", label.to_ascii_lowercase(), zone)
    }
}

/// Label of `name` relative to `zone`
///
/// Names ending in a dot are treated as absolute and shortened when they fall
/// inside the zone; anything else is already relative.
pub fn relative_label(name: &str, zone: &str) -> String {
    let zone = normalize_name(zone);
    if name.is_empty() || name == APEX_LABEL {
        return APEX_LABEL.to_string();
    }

    if let Some(absolute) = name.strip_suffix('.') {
        let absolute = absolute.to_ascii_lowercase();
        if absolute == zone {
            return APEX_LABEL.to_string();
        }
        if let Some(label) = absolute.strip_suffix(&format!(".{}", zone)) {
            return label.to_string();
        }
        return absolute;
    }

    name.to_ascii_lowercase()
}
