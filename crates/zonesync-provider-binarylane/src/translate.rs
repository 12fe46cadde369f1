//! Record translation between BinaryLane and canonical form
//!
//! BinaryLane packs the structured fields of most record types into the
//! `data` string (`0 issue "letsencrypt.org"` for CAA, `5 5060 sip.example.com`
//! for SRV). MX preference and SRV priority travel in the separate `priority`
//! field.
//!
//! Numeric fields that fail to parse become zero and are logged. A structured
//! record with too few fields is a parse error.

use crate::native::{NativeRecord, RecordParams};
use std::str::FromStr;
use tracing::warn;
use zonesync_core::error::{Error, Result};
use zonesync_core::record::{CanonicalRecord, RecordData, RecordType};

/// Convert a BinaryLane record into a canonical record of `zone`
pub fn to_canonical(zone: &str, native: &NativeRecord) -> Result<CanonicalRecord> {
    let rtype = RecordType::from(native.rtype.clone());
    let content = native.data.as_str();

    let data = match rtype {
        RecordType::A => RecordData::A {
            target: content.to_string(),
        },
        RecordType::Aaaa => RecordData::Aaaa {
            target: content.to_string(),
        },
        RecordType::Txt => RecordData::Txt {
            target: content.to_string(),
        },
        RecordType::Cname => RecordData::Cname {
            target: absolute(content),
        },
        RecordType::Alias => RecordData::Alias {
            target: absolute(content),
        },
        RecordType::Ns => RecordData::Ns {
            target: absolute(content),
        },
        RecordType::Mx => RecordData::Mx {
            preference: native.priority.unwrap_or_default(),
            target: absolute(content),
        },
        RecordType::Srv => {
            // weight port target
            let [weight, port, target] = fields::<3>(native)?;
            RecordData::Srv {
                priority: native.priority.unwrap_or_default(),
                weight: lenient(native, "weight", weight),
                port: lenient(native, "port", port),
                target: target.to_string(),
            }
        }
        RecordType::Caa => {
            // flag tag "value", where the value may contain spaces
            let [flag, tag, value] = fields::<3>(native)?;
            RecordData::Caa {
                flag: lenient(native, "flag", flag),
                tag: tag.to_string(),
                target: value.replace('"', ""),
            }
        }
        RecordType::Tlsa => {
            let [usage, selector, matching_type, cert] = fields::<4>(native)?;
            RecordData::Tlsa {
                usage: lenient(native, "usage", usage),
                selector: lenient(native, "selector", selector),
                matching_type: lenient(native, "matching type", matching_type),
                target: cert.to_string(),
            }
        }
        RecordType::Svcb => {
            let (priority, target, params) = service_fields(native)?;
            RecordData::Svcb {
                priority,
                target,
                params,
            }
        }
        RecordType::Https => {
            let (priority, target, params) = service_fields(native)?;
            RecordData::Https {
                priority,
                target,
                params,
            }
        }
        RecordType::Other(name) => RecordData::Other {
            rtype: name,
            target: content.to_string(),
        },
    };

    Ok(CanonicalRecord::new(&native.name, zone, native.ttl, data))
}

/// Build the create/update request body for a canonical record
///
/// # Returns
///
/// - `Ok(RecordParams)`: The request body
/// - `Err(Error::UnsupportedType)`: The record type has no BinaryLane encoding
pub fn to_native(record: &CanonicalRecord) -> Result<RecordParams> {
    let mut priority = None;

    let data = match &record.data {
        RecordData::A { target }
        | RecordData::Aaaa { target }
        | RecordData::Cname { target }
        | RecordData::Alias { target }
        | RecordData::Ns { target }
        | RecordData::Txt { target } => target.clone(),
        RecordData::Mx { preference, target } => {
            priority = Some(*preference);
            target.clone()
        }
        RecordData::Srv {
            priority: srv_priority,
            weight,
            port,
            target,
        } => {
            priority = Some(*srv_priority);
            format!("{} {} {}", weight, port, target)
        }
        // Same presentation form BinaryLane uses for these types
        data @ (RecordData::Caa { .. }
        | RecordData::Tlsa { .. }
        | RecordData::Svcb { .. }
        | RecordData::Https { .. }) => data.to_string(),
        RecordData::Other { rtype, .. } => {
            return Err(Error::unsupported_type(format!(
                "{} has no BinaryLane encoding ({})",
                rtype, record.name
            )));
        }
    };

    Ok(RecordParams {
        rtype: record.rtype().to_string(),
        name: record.label.clone(),
        data,
        ttl: record.ttl,
        priority,
    })
}

/// Make the hostname target of a desired record absolute
///
/// [`to_canonical`] reads MX, CNAME, ALIAS and NS targets back with a
/// trailing dot, so desired records must carry one too or they never compare
/// equal. Other types are returned unchanged.
pub fn qualify_target(mut record: CanonicalRecord) -> CanonicalRecord {
    match &mut record.data {
        RecordData::Cname { target }
        | RecordData::Alias { target }
        | RecordData::Ns { target }
        | RecordData::Mx { target, .. } => *target = absolute(target),
        _ => {}
    }
    record
}

/// Hostname with a trailing dot
fn absolute(target: &str) -> String {
    if target.ends_with('.') {
        target.to_string()
    } else {
        format!("{}.", target)
    }
}

/// Split `data` into exactly `N` space-separated fields, the last one
/// taking the remainder of the line
fn fields<const N: usize>(native: &NativeRecord) -> Result<[&str; N]> {
    let parts: Vec<&str> = native.data.splitn(N, ' ').collect();
    parts.try_into().map_err(|parts: Vec<&str>| {
        Error::parse(
            identity(native),
            format!("expected {} fields, found {} in {:?}", N, parts.len(), native.data),
        )
    })
}

/// `priority target [params]` of an SVCB or HTTPS record
fn service_fields(native: &NativeRecord) -> Result<(u16, String, String)> {
    let mut parts = native.data.splitn(3, ' ');
    let (Some(priority), Some(target)) = (parts.next(), parts.next()) else {
        return Err(Error::parse(
            identity(native),
            format!("expected at least 2 fields in {:?}", native.data),
        ));
    };
    Ok((
        lenient(native, "priority", priority),
        target.to_string(),
        parts.next().unwrap_or_default().to_string(),
    ))
}

fn lenient<T>(native: &NativeRecord, field: &str, value: &str) -> T
where
    T: FromStr + Default,
{
    value.parse().unwrap_or_else(|_| {
        warn!(
            "Record {}: invalid {} {:?}, using 0",
            identity(native),
            field,
            value
        );
        T::default()
    })
}

fn identity(native: &NativeRecord) -> String {
    format!("{} {} (binarylane ID: {})", native.name, native.rtype, native.id)
}
