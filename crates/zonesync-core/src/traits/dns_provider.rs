// # DNS Provider Trait
//
// Defines the interface a DNS hosting provider exposes to the reconciler.
//
// ## Implementations
//
// - BinaryLane: `zonesync-provider-binarylane` crate
//
// ## Usage
//
// ```rust,ignore
// use zonesync_core::DnsProvider;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     let existing = provider.get_zone_records("example.com").await?;
//     let plan = provider.get_zone_records_corrections("example.com", desired, existing)?;
//     for correction in &plan.corrections {
//         correction.execute().await?;
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::capabilities::Capabilities;
use crate::correction::Plan;
use crate::existing::ExistingRecords;
use crate::record::CanonicalRecord;

/// Trait for DNS provider implementations
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Responsibilities
///
/// Providers translate between their native records and
/// [`CanonicalRecord`], apply their own policy, and bind planned changes to
/// their API. They do not:
///
/// - retry or back off (failures are returned to the caller)
/// - cache zone contents between calls
/// - execute corrections themselves (the caller decides when and how)
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Fetch every record of a zone in canonical form
    ///
    /// The returned set carries the provider identifier of each record for
    /// later updates and deletes.
    ///
    /// # Returns
    ///
    /// - `Ok(ExistingRecords)`: The complete record set, across all pages
    /// - `Err(Error)`: Transport failure or a record that could not be parsed
    async fn get_zone_records(&self, zone: &str) -> Result<ExistingRecords, crate::Error>;

    /// Plan the corrections that turn `existing` into `desired`
    ///
    /// This is a pure compute step: nothing is sent to the provider until a
    /// returned correction is executed. If planning fails no correction is
    /// returned at all.
    ///
    /// # Parameters
    ///
    /// - `zone`: Zone name
    /// - `desired`: Desired records, before the provider's policy filter
    /// - `existing`: Result of [`DnsProvider::get_zone_records`]
    fn get_zone_records_corrections(
        &self,
        zone: &str,
        desired: Vec<CanonicalRecord>,
        existing: ExistingRecords,
    ) -> Result<Plan, crate::Error>;

    /// List every zone held by the account, sorted
    async fn list_zones(&self) -> Result<Vec<String>, crate::Error>;

    /// Nameservers currently serving a zone, sorted, without trailing dots
    async fn get_nameservers(&self, zone: &str) -> Result<Vec<String>, crate::Error>;

    /// Record types and features this provider supports
    fn capabilities(&self) -> &Capabilities;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
