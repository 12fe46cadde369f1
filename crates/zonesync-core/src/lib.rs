// # zonesync-core
//
// Core library for reconciling DNS zones against a hosting provider.
//
// ## Architecture Overview
//
// This library provides the provider-agnostic half of a reconciliation pass:
// - **CanonicalRecord**: Provider-agnostic record model
// - **Policy filter**: TTL floor and protected apex NS records
// - **Differ**: Minimal, deterministic edit set between two record sets
// - **Correction**: Describable, executable mutation of a remote zone
// - **DnsProvider**: Trait each provider implements (translate, plan, fetch)
// - **ZoneReconciler**: Runs plan/apply passes and reports events
//
// ## Design Principles
//
// 1. **Stateless**: Every pass starts from a fresh fetch, nothing is cached
// 2. **Plan before act**: If planning fails, nothing is executed
// 3. **Deterministic**: The same inputs always produce the same ordered plan
// 4. **Library-First**: The daemon is a thin layer over this crate

pub mod capabilities;
pub mod config;
pub mod correction;
pub mod diff;
pub mod engine;
pub mod error;
pub mod existing;
pub mod policy;
pub mod record;
pub mod traits;

// Re-export core types for convenience
pub use capabilities::{Capabilities, Capability, Support};
pub use config::{EngineConfig, ExecutionPolicy, ProviderConfig, ZoneConfig, ZoneSyncConfig};
pub use correction::{Correction, Plan};
pub use diff::{Change, ChangeKind, DiffOptions, DiffResult, IdentityKey, diff_by_record};
pub use engine::{ApplyReport, ReconcileEvent, ZoneReconciler};
pub use error::{Error, Result};
pub use existing::{ExistingRecords, RecordId};
pub use policy::{PolicyConfig, apply_policy};
pub use record::{CanonicalRecord, RecordData, RecordType};
pub use traits::DnsProvider;
