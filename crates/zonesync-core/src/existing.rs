//! Existing records and their provider identifiers
//!
//! Records loaded from a provider are kept next to a side table that maps
//! each record to the identifier the provider assigned it. The planner
//! consults the table when it needs an id for an update or delete.

use crate::record::CanonicalRecord;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;

/// Opaque provider-assigned record identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Records currently held by the provider, with their identifiers
///
/// Identical records may exist more than once upstream; each copy keeps its
/// own id and [`ExistingRecords::take_id`] hands them out in load order.
#[derive(Debug, Clone, Default)]
pub struct ExistingRecords {
    records: Vec<CanonicalRecord>,
    ids: HashMap<CanonicalRecord, VecDeque<RecordId>>,
}

impl ExistingRecords {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record loaded from the provider
    pub fn push(&mut self, record: CanonicalRecord, id: RecordId) {
        self.ids.entry(record.clone()).or_default().push_back(id);
        self.records.push(record);
    }

    /// All loaded records, in load order
    pub fn records(&self) -> &[CanonicalRecord] {
        &self.records
    }

    /// Number of loaded records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if the zone holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Peek at the first identifier for a record
    pub fn id_of(&self, record: &CanonicalRecord) -> Option<RecordId> {
        self.ids.get(record).and_then(|ids| ids.front().copied())
    }

    /// Remove and return the next identifier for a record
    pub fn take_id(&mut self, record: &CanonicalRecord) -> Option<RecordId> {
        self.ids.get_mut(record).and_then(|ids| ids.pop_front())
    }
}
