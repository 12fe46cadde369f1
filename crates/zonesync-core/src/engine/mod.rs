//! Zone reconciler
//!
//! The ZoneReconciler is responsible for:
//! - Auditing desired records against the provider's capabilities
//! - Fetching the current records of a zone
//! - Asking the provider to plan corrections
//! - Executing corrections in order, according to the execution policy
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐
//! │ ZoneConfig  │─── desired records ──┐
//! └─────────────┘                      │
//!                                      ▼
//!                            ┌──────────────────┐
//!                            │  ZoneReconciler  │
//!                            └──────────────────┘
//!                                      │
//!         ┌────────────────────────────┼───────────────────────────┐
//!         │                            │                           │
//!         ▼                            ▼                           ▼
//! ┌──────────────┐           ┌──────────────────┐          ┌─────────────┐
//! │ Capabilities │           │   DnsProvider    │          │   Events    │
//! │   (audit)    │           │ (fetch + plan)   │          │  (notify)   │
//! └──────────────┘           └──────────────────┘          └─────────────┘
//! ```
//!
//! ## Flow
//!
//! 1. Audit desired records, failing fast on unsupported types
//! 2. Fetch existing records via `DnsProvider::get_zone_records()`
//! 3. Plan via `DnsProvider::get_zone_records_corrections()`
//! 4. Unless dry-run, execute each correction in order
//! 5. Emit events for monitoring/logging
//!
//! A zone whose planning fails executes nothing. Execution failures are
//! reported per correction.

use crate::config::{EngineConfig, ExecutionPolicy, ZoneConfig};
use crate::correction::Plan;
use crate::error::{Error, Result};
use crate::traits::DnsProvider;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Events emitted by the ZoneReconciler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileEvent {
    /// Planning a zone started
    PlanStarted { zone: String },

    /// Planning finished
    PlanReady { zone: String, change_count: usize },

    /// Planning failed; nothing was executed
    PlanFailed { zone: String, error: String },

    /// A correction was executed successfully
    CorrectionApplied { zone: String, description: String },

    /// A correction failed
    CorrectionFailed {
        zone: String,
        description: String,
        error: String,
    },

    /// Execution for a zone finished
    ZoneFinished {
        zone: String,
        applied: usize,
        failed: usize,
    },
}

/// Outcome of applying a plan to one zone
#[derive(Debug, Default)]
pub struct ApplyReport {
    /// Zone name
    pub zone: String,
    /// Actionable changes in the plan
    pub planned: usize,
    /// Corrections executed successfully
    pub applied: usize,
    /// Failed corrections, each attributable to its correction
    pub failures: Vec<Error>,
    /// Corrections not executed after an abort
    pub skipped: usize,
    /// True if the plan was not executed at all
    pub dry_run: bool,
}

impl ApplyReport {
    /// True if every planned correction was applied
    pub fn is_converged(&self) -> bool {
        !self.dry_run && self.failures.is_empty() && self.skipped == 0
    }
}

/// Reconciles zones against a DNS provider
///
/// ## Lifecycle
///
/// 1. Create with [`ZoneReconciler::new()`]
/// 2. Call [`ZoneReconciler::reconcile_zone()`] or
///    [`ZoneReconciler::reconcile_all()`] once per pass
/// 3. Drop when done
///
/// The reconciler holds no zone state between calls.
pub struct ZoneReconciler {
    /// DNS provider for loading and planning
    provider: Box<dyn DnsProvider>,

    /// Plan only
    dry_run: bool,

    /// Behaviour when a correction fails
    execution_policy: ExecutionPolicy,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<ReconcileEvent>,
}

impl ZoneReconciler {
    /// Create a new reconciler
    ///
    /// # Parameters
    ///
    /// - `provider`: DNS provider implementation
    /// - `config`: Engine configuration
    ///
    /// # Returns
    ///
    /// A tuple of (reconciler, event_receiver) where event_receiver yields reconcile events
    pub fn new(
        provider: Box<dyn DnsProvider>,
        config: EngineConfig,
    ) -> Result<(Self, mpsc::Receiver<ReconcileEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let reconciler = Self {
            provider,
            dry_run: config.dry_run,
            execution_policy: config.execution_policy,
            event_tx: tx,
        };

        Ok((reconciler, rx))
    }

    /// The provider this reconciler talks to
    pub fn provider(&self) -> &dyn DnsProvider {
        self.provider.as_ref()
    }

    /// Plan the corrections for one zone
    ///
    /// # Returns
    ///
    /// - `Ok(Plan)`: Corrections in execution order
    /// - `Err(Error::Zone)`: Audit, fetch or planning failed
    pub async fn plan_zone(&self, zone: &ZoneConfig) -> Result<Plan> {
        self.emit_event(ReconcileEvent::PlanStarted {
            zone: zone.name.clone(),
        });

        match self.plan_zone_inner(zone).await {
            Ok(plan) => {
                info!(
                    "Zone {}: {} change(s) planned via {}",
                    zone.name,
                    plan.change_count,
                    self.provider.provider_name()
                );
                self.emit_event(ReconcileEvent::PlanReady {
                    zone: zone.name.clone(),
                    change_count: plan.change_count,
                });
                Ok(plan)
            }
            Err(e) => {
                let e = e.in_zone(&zone.name);
                error!("Failed to plan zone {}: {}", zone.name, e);
                self.emit_event(ReconcileEvent::PlanFailed {
                    zone: zone.name.clone(),
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn plan_zone_inner(&self, zone: &ZoneConfig) -> Result<Plan> {
        let desired = zone.desired_records();
        self.provider.capabilities().audit_records(&desired)?;

        let existing = self.provider.get_zone_records(&zone.name).await?;
        debug!(
            "Zone {}: {} existing record(s), {} desired record(s)",
            zone.name,
            existing.len(),
            desired.len()
        );

        self.provider
            .get_zone_records_corrections(&zone.name, desired, existing)
    }

    /// Execute a plan against the provider
    ///
    /// Corrections run sequentially in plan order. Reports are logged and
    /// skipped. On failure the execution policy decides whether the
    /// remaining corrections still run.
    pub async fn apply(&self, zone: &str, plan: &Plan) -> ApplyReport {
        let mut report = ApplyReport {
            zone: zone.to_string(),
            planned: plan.change_count,
            ..Default::default()
        };

        let mut corrections = plan.corrections.iter();
        while let Some(correction) = corrections.next() {
            if correction.is_report() {
                info!("{}", correction.msg);
                continue;
            }

            info!("{}", correction.msg);
            match correction.execute().await {
                Ok(()) => {
                    report.applied += 1;
                    self.emit_event(ReconcileEvent::CorrectionApplied {
                        zone: zone.to_string(),
                        description: correction.msg.clone(),
                    });
                }
                Err(e) => {
                    error!("Zone {}: {}", zone, e);
                    self.emit_event(ReconcileEvent::CorrectionFailed {
                        zone: zone.to_string(),
                        description: correction.msg.clone(),
                        error: e.to_string(),
                    });
                    report.failures.push(e.in_zone(zone));

                    if self.execution_policy == ExecutionPolicy::AbortOnFirstError {
                        report.skipped = corrections.by_ref().filter(|c| !c.is_report()).count();
                        warn!(
                            "Zone {}: aborting after first failure, {} correction(s) skipped",
                            zone, report.skipped
                        );
                        break;
                    }
                }
            }
        }

        self.emit_event(ReconcileEvent::ZoneFinished {
            zone: zone.to_string(),
            applied: report.applied,
            failed: report.failures.len(),
        });

        report
    }

    /// Plan one zone and, unless in dry-run mode, apply the plan
    pub async fn reconcile_zone(&self, zone: &ZoneConfig) -> Result<ApplyReport> {
        let plan = self.plan_zone(zone).await?;

        if self.dry_run {
            for correction in &plan.corrections {
                info!("[DRY-RUN] {}", correction.msg);
            }
            return Ok(ApplyReport {
                zone: zone.name.clone(),
                planned: plan.change_count,
                dry_run: true,
                ..Default::default()
            });
        }

        Ok(self.apply(&zone.name, &plan).await)
    }

    /// Reconcile several zones, one after the other
    ///
    /// A zone that fails to plan does not stop the others.
    pub async fn reconcile_all(&self, zones: &[ZoneConfig]) -> Vec<Result<ApplyReport>> {
        let mut results = Vec::with_capacity(zones.len());
        for zone in zones {
            results.push(self.reconcile_zone(zone).await);
        }
        results
    }

    /// Emit a reconcile event
    fn emit_event(&self, event: ReconcileEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            // Dropped rather than blocking reconciliation
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("Event receiver dropped, event discarded");
            }
        }
    }
}
