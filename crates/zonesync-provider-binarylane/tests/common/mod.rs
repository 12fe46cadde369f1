//! Test doubles for BinaryLane provider tests
//!
//! `FakeRecordApi` keeps native records in memory and applies create,
//! update and delete requests to them the way the real API would.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use zonesync_core::error::{Error, Result};
use zonesync_core::existing::RecordId;
use zonesync_provider_binarylane::api::RecordApi;
use zonesync_provider_binarylane::native::{NativeRecord, RecordParams};

/// An in-memory BinaryLane API
pub struct FakeRecordApi {
    records: Mutex<Vec<NativeRecord>>,
    next_id: AtomicU64,
    fetch_call_count: AtomicUsize,
    mutation_count: AtomicUsize,
    /// When set, every mutation fails with this status message
    failure: Mutex<Option<String>>,
    nameservers: Vec<String>,
}

impl FakeRecordApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            records: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1000),
            fetch_call_count: AtomicUsize::new(0),
            mutation_count: AtomicUsize::new(0),
            failure: Mutex::new(None),
            nameservers: vec![
                "ns2.binarylane.com.au.".to_string(),
                "ns1.binarylane.com.au".to_string(),
            ],
        })
    }

    /// Seed a native record
    pub fn seed(&self, id: u64, name: &str, rtype: &str, data: &str, ttl: u32) {
        self.seed_native(NativeRecord {
            id,
            name: name.to_string(),
            rtype: rtype.to_string(),
            data: data.to_string(),
            ttl,
            ..Default::default()
        });
    }

    pub fn seed_native(&self, record: NativeRecord) {
        self.records.lock().unwrap().push(record);
    }

    /// Make every following mutation fail
    pub fn fail_mutations(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn records(&self) -> Vec<NativeRecord> {
        let mut records = self.records.lock().unwrap().clone();
        records.sort_by_key(|r| r.id);
        records
    }

    pub fn fetch_call_count(&self) -> usize {
        self.fetch_call_count.load(Ordering::SeqCst)
    }

    pub fn mutation_count(&self) -> usize {
        self.mutation_count.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> Result<()> {
        match self.failure.lock().unwrap().as_ref() {
            Some(message) => Err(Error::transport(message.clone())),
            None => Ok(()),
        }
    }

    fn stored(id: u64, params: &RecordParams) -> NativeRecord {
        NativeRecord {
            id,
            name: params.name.clone(),
            rtype: params.rtype.clone(),
            data: params.data.clone(),
            ttl: params.ttl,
            priority: params.priority,
            ..Default::default()
        }
    }
}

#[async_trait::async_trait]
impl RecordApi for FakeRecordApi {
    async fn fetch_records(&self, _zone: &str) -> Result<Vec<NativeRecord>> {
        self.fetch_call_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.lock().unwrap().clone())
    }

    async fn create_record(&self, _zone: &str, params: &RecordParams) -> Result<()> {
        self.check_failure()?;
        self.mutation_count.fetch_add(1, Ordering::SeqCst);
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.records.lock().unwrap().push(Self::stored(id, params));
        Ok(())
    }

    async fn update_record(&self, _zone: &str, id: RecordId, params: &RecordParams) -> Result<()> {
        self.check_failure()?;
        self.mutation_count.fetch_add(1, Ordering::SeqCst);
        let mut records = self.records.lock().unwrap();
        match records.iter_mut().find(|r| r.id == id.0) {
            Some(record) => {
                *record = Self::stored(id.0, params);
                Ok(())
            }
            None => Err(Error::transport(format!("binarylane API error: Not found ({})", id))),
        }
    }

    async fn delete_record(&self, _zone: &str, id: RecordId) -> Result<()> {
        self.check_failure()?;
        self.mutation_count.fetch_add(1, Ordering::SeqCst);
        self.records.lock().unwrap().retain(|r| r.id != id.0);
        Ok(())
    }

    async fn list_zones(&self) -> Result<Vec<String>> {
        Ok(vec!["example.com".to_string(), "example.net".to_string()])
    }

    async fn fetch_nameservers(&self, _zone: &str) -> Result<Vec<String>> {
        Ok(zonesync_provider_binarylane::api::normalize_nameservers(
            self.nameservers.clone(),
        ))
    }
}
