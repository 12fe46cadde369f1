//! Record-level differ
//!
//! Computes the edit set that turns the existing records of a zone into the
//! desired ones.
//!
//! ## Grouping
//!
//! Both collections are grouped by [`IdentityKey`]: owner name, record type
//! and an extra comparable key supplied by the caller. The extra key lets
//! synthetic types that share a name and type (URL forwards, for instance)
//! occupy separate slots. For ordinary types it is empty.
//!
//! ## Classification
//!
//! Inside a group:
//!
//! 1. Records with identical content on both sides are left alone
//! 2. Remaining records that differ only in TTL are paired as `CHANGE`
//! 3. Any other remaining records are paired in sorted order as `CHANGE`
//! 4. Leftover desired records are `CREATE`, leftover existing ones `DELETE`
//!
//! For a slot with one record per side this is the familiar
//! create / delete / change / no-op split.
//!
//! ## Ordering
//!
//! Groups are visited in key order and records inside a group are sorted, so
//! the output does not depend on input order. The final list is emitted in
//! phases: reports, deletions, modifications, creations. A record being
//! replaced by a different type at the same name is therefore removed before
//! its replacement is added.

use crate::error::{Error, Result};
use crate::record::{CanonicalRecord, RecordType};
use std::collections::BTreeMap;
use std::fmt;

/// Classification of one change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChangeKind {
    /// Informational only, nothing to execute
    Report,
    /// Existing record has no desired counterpart
    Delete,
    /// Existing record must be updated in place
    Change,
    /// Desired record has no existing counterpart
    Create,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChangeKind::Report => "REPORT",
            ChangeKind::Delete => "DELETE",
            ChangeKind::Change => "CHANGE",
            ChangeKind::Create => "CREATE",
        })
    }
}

/// The slot a record occupies for diffing
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey {
    /// Fully-qualified owner name
    pub name: String,
    /// Record type
    pub rtype: RecordType,
    /// Extra comparable key, empty for ordinary types
    pub extra: String,
}

impl IdentityKey {
    /// Build the identity key of a record
    ///
    /// Fails for records without an owner name, which cannot be placed in
    /// any slot.
    pub fn of<F>(record: &CanonicalRecord, comparable: &F) -> Result<Self>
    where
        F: Fn(&CanonicalRecord) -> String,
    {
        if record.name.is_empty() {
            return Err(Error::diff(format!(
                "record has no owner name (label {:?}, type {})",
                record.label,
                record.rtype()
            )));
        }

        Ok(Self {
            name: record.name.clone(),
            rtype: record.rtype(),
            extra: comparable(record),
        })
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.extra.is_empty() {
            write!(f, "{} {}", self.name, self.rtype)
        } else {
            write!(f, "{} {} [{}]", self.name, self.rtype, self.extra)
        }
    }
}

/// One entry of the edit set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    /// What kind of change this is
    pub kind: ChangeKind,
    /// Slot the change applies to
    pub key: IdentityKey,
    /// The existing record (`CHANGE`, `DELETE`)
    pub old: Option<CanonicalRecord>,
    /// The desired record (`CREATE`, `CHANGE`)
    pub new: Option<CanonicalRecord>,
    /// Human-readable description lines
    pub msgs: Vec<String>,
}

impl Change {
    fn create(key: IdentityKey, new: CanonicalRecord) -> Self {
        let msg = format!("+ CREATE {}", new);
        Self {
            kind: ChangeKind::Create,
            key,
            old: None,
            new: Some(new),
            msgs: vec![msg],
        }
    }

    fn modify(key: IdentityKey, old: CanonicalRecord, new: CanonicalRecord) -> Self {
        let msg = format!(
            "± MODIFY {} {} ({} ttl={}) -> ({} ttl={})",
            new.name,
            new.rtype(),
            old.data,
            old.ttl,
            new.data,
            new.ttl
        );
        Self {
            kind: ChangeKind::Change,
            key,
            old: Some(old),
            new: Some(new),
            msgs: vec![msg],
        }
    }

    fn delete(key: IdentityKey, old: CanonicalRecord) -> Self {
        let msg = format!("- DELETE {}", old);
        Self {
            kind: ChangeKind::Delete,
            key,
            old: Some(old),
            new: None,
            msgs: vec![msg],
        }
    }

    fn report(key: IdentityKey, unchanged: usize) -> Self {
        let msg = format!("= UNCHANGED {} ({} record(s))", key, unchanged);
        Self {
            kind: ChangeKind::Report,
            key,
            old: None,
            new: None,
            msgs: vec![msg],
        }
    }

    /// All message lines joined with newlines
    pub fn msgs_joined(&self) -> String {
        self.msgs.join("\n")
    }
}

/// Differ options
#[derive(Debug, Clone, Default)]
pub struct DiffOptions {
    /// Emit a `REPORT` entry for every group that needs no change
    pub report_unchanged: bool,
}

/// Output of [`diff_by_record`]
#[derive(Debug, Clone, Default)]
pub struct DiffResult {
    /// Ordered edit set, including reports
    pub changes: Vec<Change>,
    /// Number of actionable changes (reports excluded)
    pub change_count: usize,
}

/// Extra comparable key for ordinary record types
pub fn no_extra_key(_record: &CanonicalRecord) -> String {
    String::new()
}

#[derive(Default)]
struct Group {
    existing: Vec<CanonicalRecord>,
    desired: Vec<CanonicalRecord>,
}

/// Diff existing records against desired records
///
/// # Parameters
///
/// - `existing`: Records currently held by the provider
/// - `desired`: Records after the policy filter
/// - `comparable`: Extra comparable key for a record (see [`no_extra_key`])
/// - `options`: Differ options
///
/// # Returns
///
/// - `Ok(DiffResult)`: The ordered edit set and its actionable count
/// - `Err(Error::Diff)`: If a record cannot be given an identity key
pub fn diff_by_record<F>(
    existing: &[CanonicalRecord],
    desired: &[CanonicalRecord],
    comparable: F,
    options: &DiffOptions,
) -> Result<DiffResult>
where
    F: Fn(&CanonicalRecord) -> String,
{
    let mut groups: BTreeMap<IdentityKey, Group> = BTreeMap::new();

    for record in existing {
        let key = IdentityKey::of(record, &comparable)?;
        groups.entry(key).or_default().existing.push(record.clone());
    }
    for record in desired {
        let key = IdentityKey::of(record, &comparable)?;
        groups.entry(key).or_default().desired.push(record.clone());
    }

    let mut changes = Vec::new();
    for (key, group) in groups {
        diff_group(key, group, options, &mut changes);
    }

    // Stable: key order is kept within each phase
    changes.sort_by_key(|change| change.kind);

    let change_count = changes
        .iter()
        .filter(|change| change.kind != ChangeKind::Report)
        .count();

    Ok(DiffResult {
        changes,
        change_count,
    })
}

fn diff_group(key: IdentityKey, group: Group, options: &DiffOptions, out: &mut Vec<Change>) {
    let Group {
        mut existing,
        mut desired,
    } = group;
    existing.sort();
    desired.sort();

    // Identical on both sides: nothing to do
    let mut unchanged = 0;
    let mut old_left = Vec::new();
    for old in existing {
        match desired.iter().position(|new| new.same_content(&old)) {
            Some(pos) => {
                desired.remove(pos);
                unchanged += 1;
            }
            None => old_left.push(old),
        }
    }

    // TTL-only differences pair up first
    let mut pairs = Vec::new();
    let mut old_rest = Vec::new();
    for old in old_left {
        match desired.iter().position(|new| new.same_data(&old)) {
            Some(pos) => {
                let new = desired.remove(pos);
                pairs.push((old, new));
            }
            None => old_rest.push(old),
        }
    }

    let mut old_iter = old_rest.into_iter();
    let mut new_iter = desired.into_iter();
    loop {
        match (old_iter.next(), new_iter.next()) {
            (Some(old), Some(new)) => pairs.push((old, new)),
            (Some(old), None) => out.push(Change::delete(key.clone(), old)),
            (None, Some(new)) => out.push(Change::create(key.clone(), new)),
            (None, None) => break,
        }
    }

    for (old, new) in pairs {
        out.push(Change::modify(key.clone(), old, new));
    }

    if unchanged > 0 && options.report_unchanged {
        out.push(Change::report(key, unchanged));
    }
}
