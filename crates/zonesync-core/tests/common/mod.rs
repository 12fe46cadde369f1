//! Test doubles and common utilities for reconciliation contract tests
//!
//! This module provides an in-memory provider that plans with the real
//! policy filter and differ and executes corrections against a shared
//! record store.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use zonesync_core::capabilities::{Capabilities, Capability, Support};
use zonesync_core::config::{EngineConfig, ExecutionPolicy, ZoneConfig};
use zonesync_core::correction::{Correction, Plan};
use zonesync_core::diff::{ChangeKind, DiffOptions, diff_by_record, no_extra_key};
use zonesync_core::error::{Error, Result};
use zonesync_core::existing::{ExistingRecords, RecordId};
use zonesync_core::policy::{PolicyConfig, apply_policy};
use zonesync_core::record::{CanonicalRecord, RecordData};
use zonesync_core::traits::DnsProvider;

type Store = Arc<Mutex<Vec<(RecordId, CanonicalRecord)>>>;

/// An in-memory DnsProvider that tracks calls
pub struct InMemoryProvider {
    /// Records currently "held upstream"
    store: Store,
    /// Next id to hand out
    next_id: Arc<AtomicU64>,
    /// Call counter for get_zone_records()
    fetch_call_count: Arc<AtomicUsize>,
    /// Call counter for executed mutations
    mutation_count: Arc<AtomicUsize>,
    /// Targets whose creation fails with a transport error
    failing_targets: Arc<Mutex<HashSet<String>>>,
    /// Provider policy
    policy: PolicyConfig,
    /// Capability matrix
    capabilities: Capabilities,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self {
            store: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(100)),
            fetch_call_count: Arc::new(AtomicUsize::new(0)),
            mutation_count: Arc::new(AtomicUsize::new(0)),
            failing_targets: Arc::new(Mutex::new(HashSet::new())),
            policy: PolicyConfig::new(600, Some("ns.test".to_string())),
            capabilities: Capabilities::new()
                .with(Capability::UseCaa, Support::Can)
                .with(Capability::UseSrv, Support::Can)
                .with(Capability::UsePtr, Support::Cannot),
        }
    }

    /// Create a provider that shares its store and counters with another one
    pub fn sharing_state_with(other: &Self) -> Self {
        Self {
            store: Arc::clone(&other.store),
            next_id: Arc::clone(&other.next_id),
            fetch_call_count: Arc::clone(&other.fetch_call_count),
            mutation_count: Arc::clone(&other.mutation_count),
            failing_targets: Arc::clone(&other.failing_targets),
            policy: other.policy.clone(),
            capabilities: other.capabilities.clone(),
        }
    }

    /// Seed a record upstream
    pub fn seed(&self, id: u64, record: CanonicalRecord) {
        self.store.lock().unwrap().push((RecordId(id), record));
    }

    /// Make creation of records with this target fail
    pub fn fail_target(&self, target: &str) {
        self.failing_targets
            .lock()
            .unwrap()
            .insert(target.to_string());
    }

    /// Snapshot of upstream records, sorted
    pub fn records(&self) -> Vec<CanonicalRecord> {
        let mut records: Vec<CanonicalRecord> = self
            .store
            .lock()
            .unwrap()
            .iter()
            .map(|(_, r)| r.clone())
            .collect();
        records.sort();
        records
    }

    pub fn fetch_call_count(&self) -> usize {
        self.fetch_call_count.load(Ordering::SeqCst)
    }

    pub fn mutation_count(&self) -> usize {
        self.mutation_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl DnsProvider for InMemoryProvider {
    async fn get_zone_records(&self, zone: &str) -> Result<ExistingRecords> {
        self.fetch_call_count.fetch_add(1, Ordering::SeqCst);

        let suffix = format!(".{}", zone);
        let mut existing = ExistingRecords::new();
        for (id, record) in self.store.lock().unwrap().iter() {
            if record.name == zone || record.name.ends_with(&suffix) {
                existing.push(record.clone(), *id);
            }
        }
        Ok(existing)
    }

    fn get_zone_records_corrections(
        &self,
        zone: &str,
        desired: Vec<CanonicalRecord>,
        mut existing: ExistingRecords,
    ) -> Result<Plan> {
        let desired = apply_policy(desired, zone, &self.policy);
        let diff = diff_by_record(
            existing.records(),
            &desired,
            no_extra_key,
            &DiffOptions::default(),
        )?;

        let mut corrections = Vec::new();
        for change in diff.changes {
            let msg = change.msgs_joined();
            let correction = match change.kind {
                ChangeKind::Report => Correction::report(msg),
                ChangeKind::Create => {
                    let new = change.new.ok_or_else(|| Error::diff("create without record"))?;
                    let store = Arc::clone(&self.store);
                    let next_id = Arc::clone(&self.next_id);
                    let mutations = Arc::clone(&self.mutation_count);
                    let failing = Arc::clone(&self.failing_targets);
                    Correction::new(msg, move || {
                        let store = Arc::clone(&store);
                        let next_id = Arc::clone(&next_id);
                        let mutations = Arc::clone(&mutations);
                        let failing = Arc::clone(&failing);
                        let new = new.clone();
                        async move {
                            if failing.lock().unwrap().contains(new.target()) {
                                return Err(Error::transport("HTTP 500 Internal Server Error"));
                            }
                            mutations.fetch_add(1, Ordering::SeqCst);
                            let id = RecordId(next_id.fetch_add(1, Ordering::SeqCst));
                            store.lock().unwrap().push((id, new));
                            Ok(())
                        }
                    })
                }
                ChangeKind::Change => {
                    let old = change.old.ok_or_else(|| Error::diff("change without old"))?;
                    let new = change.new.ok_or_else(|| Error::diff("change without new"))?;
                    let id = existing
                        .take_id(&old)
                        .ok_or_else(|| Error::diff(format!("no id for {}", old)))?;
                    let store = Arc::clone(&self.store);
                    let mutations = Arc::clone(&self.mutation_count);
                    Correction::new(format!("{}, id: {}", msg, id), move || {
                        let store = Arc::clone(&store);
                        let mutations = Arc::clone(&mutations);
                        let new = new.clone();
                        async move {
                            mutations.fetch_add(1, Ordering::SeqCst);
                            let mut store = store.lock().unwrap();
                            match store.iter_mut().find(|(rid, _)| *rid == id) {
                                Some(entry) => {
                                    entry.1 = new;
                                    Ok(())
                                }
                                None => Err(Error::transport("HTTP 404 Not Found")),
                            }
                        }
                    })
                }
                ChangeKind::Delete => {
                    let old = change.old.ok_or_else(|| Error::diff("delete without old"))?;
                    let id = existing
                        .take_id(&old)
                        .ok_or_else(|| Error::diff(format!("no id for {}", old)))?;
                    let store = Arc::clone(&self.store);
                    let mutations = Arc::clone(&self.mutation_count);
                    Correction::new(format!("{}, id: {}", msg, id), move || {
                        let store = Arc::clone(&store);
                        let mutations = Arc::clone(&mutations);
                        async move {
                            mutations.fetch_add(1, Ordering::SeqCst);
                            store.lock().unwrap().retain(|(rid, _)| *rid != id);
                            Ok(())
                        }
                    })
                }
            };
            corrections.push(correction);
        }

        Ok(Plan {
            corrections,
            change_count: diff.change_count,
        })
    }

    async fn list_zones(&self) -> Result<Vec<String>> {
        Ok(vec!["example.com".to_string()])
    }

    async fn get_nameservers(&self, _zone: &str) -> Result<Vec<String>> {
        Ok(vec!["ns1.ns.test".to_string(), "ns2.ns.test".to_string()])
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn provider_name(&self) -> &'static str {
        "in-memory"
    }
}

/// A record in example.com
pub fn a(label: &str, ip: &str, ttl: u32) -> CanonicalRecord {
    CanonicalRecord::new(
        label,
        "example.com",
        ttl,
        RecordData::A {
            target: ip.to_string(),
        },
    )
}

/// Helper to create an engine config for testing
pub fn engine_config(policy: ExecutionPolicy) -> EngineConfig {
    EngineConfig {
        dry_run: false,
        execution_policy: policy,
        report_unchanged: false,
        event_channel_capacity: 100,
    }
}

/// Helper to create a zone config for example.com
pub fn zone(records: Vec<CanonicalRecord>) -> ZoneConfig {
    ZoneConfig::new("example.com", records)
}
