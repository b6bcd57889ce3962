//! Provider gateway
//!
//! [`ProviderGateway`] is the single seam between the orchestration logic and
//! the two remote providers. It forwards each call exactly once and folds any
//! provider error outside the provider taxonomy into
//! [`Error::ProviderUnavailable`], so callers only ever see
//! `ProviderUnavailable` or `ResourceNotFound` from here.

use crate::error::{Error, Result};
use crate::traits::{
    ComputeProvider, DesiredState, DnsProvider, DnsRecord, RecordType, ResourceSnapshot,
    StateTransition,
};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::debug;

/// Gateway over a compute provider and a DNS provider
#[derive(Clone)]
pub struct ProviderGateway {
    compute: Arc<dyn ComputeProvider>,
    dns: Arc<dyn DnsProvider>,
}

impl std::fmt::Debug for ProviderGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderGateway")
            .field("compute", &self.compute.provider_name())
            .field("dns", &self.dns.provider_name())
            .finish()
    }
}

impl ProviderGateway {
    /// Create a gateway from the two providers
    pub fn new(compute: Arc<dyn ComputeProvider>, dns: Arc<dyn DnsProvider>) -> Self {
        Self { compute, dns }
    }

    /// Request a state change on the resource
    pub async fn change_state(
        &self,
        resource_id: &str,
        desired: DesiredState,
    ) -> Result<StateTransition> {
        debug!("Requesting {:?} for {}", desired, resource_id);
        self.compute
            .change_state(resource_id, desired)
            .await
            .map_err(|e| normalize(self.compute.provider_name(), e))
    }

    /// Describe the resource
    pub async fn describe(&self, resource_id: &str) -> Result<ResourceSnapshot> {
        self.compute
            .describe(resource_id)
            .await
            .map_err(|e| normalize(self.compute.provider_name(), e))
    }

    /// Associate a static address allocation with the resource
    pub async fn associate_address(&self, resource_id: &str, allocation_id: &str) -> Result<()> {
        debug!("Associating allocation {} with {}", allocation_id, resource_id);
        self.compute
            .associate_address(resource_id, allocation_id)
            .await
            .map_err(|e| normalize(self.compute.provider_name(), e))
    }

    /// Create or replace the single-value record `name → address`
    pub async fn upsert_record(&self, name: &str, address: IpAddr, ttl: u32) -> Result<()> {
        debug!(
            "Upserting {} {} -> {} (ttl {})",
            name,
            RecordType::for_address(&address),
            address,
            ttl
        );
        self.dns
            .upsert_record(name, address, ttl)
            .await
            .map_err(|e| normalize(self.dns.provider_name(), e))
    }

    /// Delete a record exactly as it was listed
    pub async fn delete_record_matching(&self, record: &DnsRecord) -> Result<()> {
        debug!("Deleting {} {} {:?}", record.name, record.record_type, record.values);
        self.dns
            .delete_record(record)
            .await
            .map_err(|e| normalize(self.dns.provider_name(), e))
    }

    /// List the records in the managed zone
    pub async fn list_records(&self) -> Result<Vec<DnsRecord>> {
        self.dns
            .list_records()
            .await
            .map_err(|e| normalize(self.dns.provider_name(), e))
    }

    /// Name of the compute provider
    pub fn compute_name(&self) -> &'static str {
        self.compute.provider_name()
    }

    /// Name of the DNS provider
    pub fn dns_name(&self) -> &'static str {
        self.dns.provider_name()
    }
}

fn normalize(provider: &str, err: Error) -> Error {
    if err.is_provider_error() {
        err
    } else {
        Error::provider_unavailable(provider, err.to_string())
    }
}
