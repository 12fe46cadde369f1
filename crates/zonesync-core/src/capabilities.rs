//! Provider capability matrix
//!
//! Each provider declares which record types and features it supports.
//! Desired records are audited against the matrix before planning so an
//! unsupported type fails fast instead of being mis-encoded.

use crate::error::{Error, Result};
use crate::record::{CanonicalRecord, RecordType};
use std::collections::BTreeMap;
use std::fmt;

/// A feature a provider may or may not support
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    AutoDnssec,
    GetZones,
    Concur,
    CreateDomains,
    UseAlias,
    UseCaa,
    UseDs,
    UseHttps,
    UseLoc,
    UseNaptr,
    UsePtr,
    UseSoa,
    UseSrv,
    UseSshfp,
    UseSvcb,
    UseTlsa,
}

impl Capability {
    /// Capability required to manage records of `rtype`
    ///
    /// A, AAAA, CNAME, MX, NS and TXT need no capability. Type names this
    /// crate does not know return `None` and are rejected by
    /// [`Capabilities::audit_records`] on their own.
    pub fn for_record_type(rtype: &RecordType) -> Option<Capability> {
        match rtype {
            RecordType::A
            | RecordType::Aaaa
            | RecordType::Cname
            | RecordType::Mx
            | RecordType::Ns
            | RecordType::Txt => None,
            RecordType::Alias => Some(Capability::UseAlias),
            RecordType::Caa => Some(Capability::UseCaa),
            RecordType::Srv => Some(Capability::UseSrv),
            RecordType::Tlsa => Some(Capability::UseTlsa),
            RecordType::Svcb => Some(Capability::UseSvcb),
            RecordType::Https => Some(Capability::UseHttps),
            RecordType::Other(name) => match name.as_str() {
                "DS" => Some(Capability::UseDs),
                "LOC" => Some(Capability::UseLoc),
                "NAPTR" => Some(Capability::UseNaptr),
                "PTR" => Some(Capability::UsePtr),
                "SOA" => Some(Capability::UseSoa),
                "SSHFP" => Some(Capability::UseSshfp),
                _ => None,
            },
        }
    }
}

/// Level of support for a capability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Support {
    /// Supported
    Can,
    /// Not possible with this provider
    Cannot,
    /// Possible upstream but not implemented here
    Unimplemented,
}

impl fmt::Display for Support {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Support::Can => "can",
            Support::Cannot => "cannot",
            Support::Unimplemented => "unimplemented",
        })
    }
}

/// Declared capabilities of a provider
///
/// Capabilities that are not listed default to [`Support::Cannot`].
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    entries: BTreeMap<Capability, Support>,
}

impl Capabilities {
    /// Create an empty matrix (everything unsupported)
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the support level of a capability
    pub fn with(mut self, capability: Capability, support: Support) -> Self {
        self.entries.insert(capability, support);
        self
    }

    /// Support level of a capability
    pub fn support(&self, capability: Capability) -> Support {
        self.entries
            .get(&capability)
            .copied()
            .unwrap_or(Support::Cannot)
    }

    /// True if the capability is fully supported
    pub fn can(&self, capability: Capability) -> bool {
        self.support(capability) == Support::Can
    }

    /// True if records of `rtype` can be managed
    pub fn supports_record_type(&self, rtype: &RecordType) -> bool {
        match (rtype, Capability::for_record_type(rtype)) {
            (RecordType::Other(_), None) => false,
            (_, None) => true,
            (_, Some(capability)) => self.can(capability),
        }
    }

    /// Check a desired record set against the matrix
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Every record has a supported type
    /// - `Err(Error::UnsupportedType)`: Naming the first offending record
    pub fn audit_records(&self, records: &[CanonicalRecord]) -> Result<()> {
        for record in records {
            let rtype = record.rtype();
            if !self.supports_record_type(&rtype) {
                let support = Capability::for_record_type(&rtype)
                    .map(|capability| self.support(capability))
                    .unwrap_or(Support::Cannot);
                return Err(Error::unsupported_type(format!(
                    "{} ({} {}: provider {})",
                    rtype, record.name, record.target(), support
                )));
            }
        }
        Ok(())
    }
}
