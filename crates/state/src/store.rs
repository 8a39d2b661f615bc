use async_trait::async_trait;

use crate::models::Domain;
use beacon_common::error::BeaconResult;

#[async_trait]
pub trait DomainStore: Send + Sync {
    /// Load the domain to sync. One domain is processed per run.
    async fn load(&self) -> BeaconResult<Domain>;

    /// Persist the domain, including token and watermark mutations made
    /// during the run. Safe to call redundantly.
    async fn save(&self, domain: &Domain) -> BeaconResult<()>;
}
