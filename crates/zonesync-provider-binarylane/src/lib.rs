// # BinaryLane DNS Provider
//
// This crate provides the BinaryLane implementation of
// [`zonesync_core::DnsProvider`].
//
// ## Responsibilities
//
// - Translate BinaryLane records to and from canonical records
// - Apply BinaryLane's policy: 600s minimum TTL, immutable apex NS records
//   on `*.binarylane.com.au`
// - Qualify desired hostname targets the way fetched records are read back
// - Plan corrections that call the BinaryLane API when executed
//
// ## What this crate does NOT do
//
// - ❌ Retry or back off (failures are returned to the reconciler)
// - ❌ Cache zone contents between passes
// - ❌ Execute corrections during planning
//
// ## Security Requirements
//
// - API token NEVER appears in logs
// - Provider MUST fail fast if token is empty

pub mod api;
pub mod native;
pub mod planner;
pub mod translate;

use api::{HttpClient, RecordApi};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use zonesync_core::capabilities::{Capabilities, Capability, Support};
use zonesync_core::config::{EngineConfig, ProviderConfig};
use zonesync_core::correction::Plan;
use zonesync_core::diff::{DiffOptions, diff_by_record};
use zonesync_core::existing::{ExistingRecords, RecordId};
use zonesync_core::policy::{PolicyConfig, apply_policy};
use zonesync_core::record::{CanonicalRecord, RecordType};
use zonesync_core::traits::DnsProvider;
use zonesync_core::{Error, Result};

pub use api::BINARYLANE_API_BASE;

/// BinaryLane rejects TTLs below this value
pub const MINIMUM_TTL: u32 = 600;

/// Domain of BinaryLane's own nameservers (`ns1.binarylane.com.au`, ...)
pub const DEFAULT_NAMESERVER_SUFFIX: &str = "binarylane.com.au";

/// Synthetic URL-forward type whose slots are keyed by metadata
const URLFWD_TYPE: &str = "PORKBUN_URLFWD";

/// Extra identity key for a record
///
/// URL-forward records sharing a name are distinguished by their forwarding
/// options; every other type returns an empty key.
pub fn gen_comparable(record: &CanonicalRecord) -> String {
    if record.rtype() != RecordType::Other(URLFWD_TYPE.to_string()) {
        return String::new();
    }

    let meta = |key: &str| record.metadata.get(key).map(String::as_str).unwrap_or_default();
    format!(
        "type={} includePath={} wildcard={}",
        meta("type"),
        meta("includePath"),
        meta("wildcard")
    )
}

/// Record types and features BinaryLane supports
pub fn binarylane_capabilities() -> Capabilities {
    Capabilities::new()
        .with(Capability::AutoDnssec, Support::Cannot)
        .with(Capability::GetZones, Support::Can)
        .with(Capability::Concur, Support::Unimplemented)
        .with(Capability::CreateDomains, Support::Cannot)
        .with(Capability::UseAlias, Support::Can)
        .with(Capability::UseCaa, Support::Can)
        .with(Capability::UseDs, Support::Cannot)
        .with(Capability::UseHttps, Support::Can)
        .with(Capability::UseLoc, Support::Cannot)
        .with(Capability::UseNaptr, Support::Cannot)
        .with(Capability::UsePtr, Support::Cannot)
        .with(Capability::UseSoa, Support::Cannot)
        .with(Capability::UseSrv, Support::Can)
        .with(Capability::UseSshfp, Support::Cannot)
        .with(Capability::UseSvcb, Support::Can)
        .with(Capability::UseTlsa, Support::Can)
}

/// BinaryLane DNS provider
///
/// Stateless: every call to [`DnsProvider::get_zone_records`] fetches the
/// zone again, and planning only reads its inputs.
pub struct BinaryLaneProvider {
    api: Arc<dyn RecordApi>,
    policy: PolicyConfig,
    diff_options: DiffOptions,
    capabilities: Capabilities,
}

// Token lives in the API client; keep it out of Debug output
impl std::fmt::Debug for BinaryLaneProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinaryLaneProvider")
            .field("api_token", &"<REDACTED>")
            .field("policy", &self.policy)
            .field("diff_options", &self.diff_options)
            .finish()
    }
}

impl BinaryLaneProvider {
    /// Create a provider talking to the BinaryLane API
    ///
    /// # Parameters
    ///
    /// - `api_token`: BinaryLane API token
    /// - `base_url`: API base URL override
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the token is empty.
    pub fn new(api_token: impl Into<String>, base_url: Option<String>) -> Result<Self> {
        let client = HttpClient::new(api_token, base_url)?;
        Ok(Self::with_api(Arc::new(client)))
    }

    /// Create a provider on top of any [`RecordApi`]
    pub fn with_api(api: Arc<dyn RecordApi>) -> Self {
        Self {
            api,
            policy: PolicyConfig::new(MINIMUM_TTL, Some(DEFAULT_NAMESERVER_SUFFIX.to_string())),
            diff_options: DiffOptions::default(),
            capabilities: binarylane_capabilities(),
        }
    }

    /// Replace the policy values
    pub fn with_policy(mut self, policy: PolicyConfig) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the differ options
    pub fn with_diff_options(mut self, options: DiffOptions) -> Self {
        self.diff_options = options;
        self
    }

    /// Build a provider from configuration
    pub fn from_config(config: &ProviderConfig, engine: &EngineConfig) -> Result<Self> {
        match config {
            ProviderConfig::BinaryLane {
                api_token,
                base_url,
                min_ttl,
                nameserver_suffix,
            } => {
                let policy = PolicyConfig::new(
                    min_ttl.unwrap_or(MINIMUM_TTL),
                    Some(
                        nameserver_suffix
                            .clone()
                            .unwrap_or_else(|| DEFAULT_NAMESERVER_SUFFIX.to_string()),
                    ),
                );

                Ok(Self::new(api_token.clone(), base_url.clone())?
                    .with_policy(policy)
                    .with_diff_options(DiffOptions {
                        report_unchanged: engine.report_unchanged,
                    }))
            }
            other => Err(Error::config(format!(
                "Invalid config for BinaryLane provider: {}",
                other.type_name()
            ))),
        }
    }

    /// Policy applied to desired records
    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }
}

#[async_trait]
impl DnsProvider for BinaryLaneProvider {
    async fn get_zone_records(&self, zone: &str) -> Result<ExistingRecords> {
        let natives = self.api.fetch_records(zone).await?;

        let mut existing = ExistingRecords::new();
        for native in &natives {
            let record = translate::to_canonical(zone, native)?;
            debug!("Loaded {} (binarylane ID: {})", record, native.id);
            existing.push(record, RecordId(native.id));
        }

        Ok(existing)
    }

    fn get_zone_records_corrections(
        &self,
        zone: &str,
        desired: Vec<CanonicalRecord>,
        mut existing: ExistingRecords,
    ) -> Result<Plan> {
        let desired: Vec<CanonicalRecord> = apply_policy(desired, zone, &self.policy)
            .into_iter()
            .map(translate::qualify_target)
            .collect();
        let current: Vec<CanonicalRecord> = existing
            .records()
            .iter()
            .filter(|record| !self.policy.is_immutable_ns(record, zone))
            .cloned()
            .collect();

        let diff = diff_by_record(
            &current,
            &desired,
            gen_comparable,
            &self.diff_options,
        )?;

        let corrections = planner::plan(zone, diff.changes, &mut existing, &self.api)?;

        Ok(Plan {
            corrections,
            change_count: diff.change_count,
        })
    }

    async fn list_zones(&self) -> Result<Vec<String>> {
        self.api.list_zones().await
    }

    async fn get_nameservers(&self, zone: &str) -> Result<Vec<String>> {
        self.api.fetch_nameservers(zone).await
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn provider_name(&self) -> &'static str {
        "binarylane"
    }
}
