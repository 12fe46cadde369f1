//! Correction planner
//!
//! Binds each differ change to the BinaryLane call that performs it. Every
//! request body and record ID is resolved before the first correction is
//! returned, so a planning failure yields no corrections at all.

use crate::api::RecordApi;
use crate::translate::to_native;
use std::sync::Arc;
use zonesync_core::correction::Correction;
use zonesync_core::diff::{Change, ChangeKind};
use zonesync_core::error::{Error, Result};
use zonesync_core::existing::{ExistingRecords, RecordId};
use zonesync_core::record::CanonicalRecord;

/// Turn differ output into executable corrections
///
/// # Parameters
///
/// - `zone`: Zone name, as used in API paths
/// - `changes`: Ordered differ output
/// - `existing`: Loaded records and their BinaryLane IDs
/// - `api`: Collaborator the corrections call when executed
///
/// # Returns
///
/// - `Ok(Vec<Correction>)`: One correction per change, in the same order
/// - `Err(Error::Diff)`: A change is missing a record or an ID
/// - `Err(Error::UnsupportedType)`: A record has no native encoding
pub fn plan(
    zone: &str,
    changes: Vec<Change>,
    existing: &mut ExistingRecords,
    api: &Arc<dyn RecordApi>,
) -> Result<Vec<Correction>> {
    let mut corrections = Vec::with_capacity(changes.len());

    for change in changes {
        let msg = change.msgs_joined();

        let correction = match change.kind {
            ChangeKind::Report => Correction::report(msg),
            ChangeKind::Create => {
                let new = required(change.new, "CREATE", "new", &msg)?;
                let params = to_native(&new)?;
                let api = Arc::clone(api);
                let zone = zone.to_string();
                Correction::new(msg, move || {
                    let api = Arc::clone(&api);
                    let zone = zone.clone();
                    let params = params.clone();
                    async move { api.create_record(&zone, &params).await }
                })
            }
            ChangeKind::Change => {
                let old = required(change.old, "CHANGE", "old", &msg)?;
                let new = required(change.new, "CHANGE", "new", &msg)?;
                let id = record_id(existing, &old)?;
                let params = to_native(&new)?;
                let api = Arc::clone(api);
                let zone = zone.to_string();
                Correction::new(format!("{}, binarylane ID: {}", msg, id), move || {
                    let api = Arc::clone(&api);
                    let zone = zone.clone();
                    let params = params.clone();
                    async move { api.update_record(&zone, id, &params).await }
                })
            }
            ChangeKind::Delete => {
                let old = required(change.old, "DELETE", "old", &msg)?;
                let id = record_id(existing, &old)?;
                let api = Arc::clone(api);
                let zone = zone.to_string();
                Correction::new(format!("{}, binarylane ID: {}", msg, id), move || {
                    let api = Arc::clone(&api);
                    let zone = zone.clone();
                    async move { api.delete_record(&zone, id).await }
                })
            }
        };

        corrections.push(correction);
    }

    Ok(corrections)
}

fn required(
    record: Option<CanonicalRecord>,
    kind: &str,
    side: &str,
    msg: &str,
) -> Result<CanonicalRecord> {
    record.ok_or_else(|| Error::diff(format!("{} change without {} record: {}", kind, side, msg)))
}

fn record_id(existing: &mut ExistingRecords, record: &CanonicalRecord) -> Result<RecordId> {
    existing
        .take_id(record)
        .ok_or_else(|| Error::diff(format!("no binarylane ID for existing record {}", record)))
}
