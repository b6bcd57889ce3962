// # In-Memory Providers
//
// Simulated compute and DNS providers held in process memory.
//
// ## Purpose
//
// Lets the controller run end to end without cloud credentials: local dry
// runs of the daemon (`HOSTDNS_PROVIDER_TYPE=memory`), embedding tests, and
// the contract tests in `tests/`.
//
// ## Behavior
//
// - A started resource reports `pending` until it has been described
//   `boot_describes` times, then `running` with its address
// - Stopping is immediate and clears the public address
// - DNS upsert replaces the record with the same name and type; delete must
//   match the listed record exactly (name, type, TTL and values)
// - Failures can be injected per operation
//
// Nothing survives the process.

use async_trait::async_trait;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::HostDnsConfig;
use crate::gateway::ProviderGateway;
use crate::registry::GatewayFactory;
use crate::traits::{
    ComputeProvider, DesiredState, DnsProvider, DnsRecord, RecordType, ResourceSnapshot,
    ResourceState, StateTransition,
};
use crate::Error;

const COMPUTE_NAME: &str = "memory-compute";
const DNS_NAME: &str = "memory-dns";

#[derive(Debug, Clone)]
struct SimResource {
    state: ResourceState,
    /// Address the resource gets once running
    address: Option<IpAddr>,
    /// Describes left before a pending resource is running
    boot_remaining: u32,
}

#[derive(Debug, Default)]
struct ComputeInner {
    resources: HashMap<String, SimResource>,
    allocations: HashMap<String, IpAddr>,
    boot_describes: u32,
    describe_failures: u32,
    fail_change_state: bool,
    describe_calls: usize,
    change_state_calls: usize,
}

/// In-memory compute provider
///
/// # Example
///
/// ```rust,no_run
/// use hostdns_core::providers::memory::InMemoryCompute;
/// use hostdns_core::traits::{ComputeProvider, DesiredState, ResourceState};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let compute = InMemoryCompute::new();
///     compute
///         .insert_resource("i-0abc", ResourceState::Stopped, Some("203.0.113.7".parse()?))
///         .await;
///
///     let transition = compute.change_state("i-0abc", DesiredState::Running).await?;
///     assert_eq!(transition.current, ResourceState::Pending);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryCompute {
    inner: Arc<RwLock<ComputeInner>>,
}

impl InMemoryCompute {
    /// Create an empty provider; started resources boot on the first describe
    pub fn new() -> Self {
        Self::with_boot_describes(1)
    }

    /// Create a provider whose started resources need `describes` describe
    /// calls before they report `running`
    pub fn with_boot_describes(describes: u32) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ComputeInner {
                boot_describes: describes,
                ..ComputeInner::default()
            })),
        }
    }

    /// Add (or replace) a resource
    pub async fn insert_resource(&self, id: &str, state: ResourceState, address: Option<IpAddr>) {
        let mut guard = self.inner.write().await;
        guard.resources.insert(
            id.to_string(),
            SimResource {
                state,
                address,
                boot_remaining: 0,
            },
        );
    }

    /// Register a static address allocation
    pub async fn insert_allocation(&self, allocation_id: &str, address: IpAddr) {
        let mut guard = self.inner.write().await;
        guard.allocations.insert(allocation_id.to_string(), address);
    }

    /// Make the next `count` describe calls fail
    pub async fn fail_next_describes(&self, count: u32) {
        self.inner.write().await.describe_failures = count;
    }

    /// Make every state-change call fail
    pub async fn fail_change_state(&self, fail: bool) {
        self.inner.write().await.fail_change_state = fail;
    }

    /// Current state of a resource
    pub async fn state_of(&self, id: &str) -> Option<ResourceState> {
        self.inner.read().await.resources.get(id).map(|r| r.state)
    }

    /// Number of describe calls served (including failed ones)
    pub async fn describe_calls(&self) -> usize {
        self.inner.read().await.describe_calls
    }

    /// Number of state-change calls served (including failed ones)
    pub async fn change_state_calls(&self) -> usize {
        self.inner.read().await.change_state_calls
    }
}

impl Default for InMemoryCompute {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ComputeProvider for InMemoryCompute {
    async fn change_state(
        &self,
        resource_id: &str,
        desired: DesiredState,
    ) -> Result<StateTransition, Error> {
        let mut guard = self.inner.write().await;
        guard.change_state_calls += 1;

        if guard.fail_change_state {
            return Err(Error::provider_unavailable(COMPUTE_NAME, "injected failure"));
        }

        let boot_describes = guard.boot_describes;
        let resource = guard
            .resources
            .get_mut(resource_id)
            .ok_or_else(|| Error::resource_not_found(resource_id))?;

        let previous = resource.state;
        match desired {
            DesiredState::Running => {
                if matches!(previous, ResourceState::Stopped | ResourceState::Stopping) {
                    if boot_describes == 0 {
                        resource.state = ResourceState::Running;
                    } else {
                        resource.state = ResourceState::Pending;
                        resource.boot_remaining = boot_describes;
                    }
                }
            }
            DesiredState::Stopped => {
                resource.state = ResourceState::Stopped;
                resource.boot_remaining = 0;
            }
        }

        Ok(StateTransition::new(previous, resource.state))
    }

    async fn describe(&self, resource_id: &str) -> Result<ResourceSnapshot, Error> {
        let mut guard = self.inner.write().await;
        guard.describe_calls += 1;

        if guard.describe_failures > 0 {
            guard.describe_failures -= 1;
            return Err(Error::provider_unavailable(COMPUTE_NAME, "injected failure"));
        }

        let resource = guard
            .resources
            .get_mut(resource_id)
            .ok_or_else(|| Error::resource_not_found(resource_id))?;

        if resource.state == ResourceState::Pending {
            resource.boot_remaining = resource.boot_remaining.saturating_sub(1);
            if resource.boot_remaining == 0 {
                resource.state = ResourceState::Running;
            }
        }

        let public_address = match resource.state {
            ResourceState::Running => resource.address,
            _ => None,
        };

        Ok(ResourceSnapshot {
            id: resource_id.to_string(),
            state: resource.state,
            public_address,
        })
    }

    async fn associate_address(&self, resource_id: &str, allocation_id: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;

        let address = *guard
            .allocations
            .get(allocation_id)
            .ok_or_else(|| Error::invalid_input(format!("Unknown allocation: {}", allocation_id)))?;

        let resource = guard
            .resources
            .get_mut(resource_id)
            .ok_or_else(|| Error::resource_not_found(resource_id))?;
        resource.address = Some(address);

        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        COMPUTE_NAME
    }
}

#[derive(Debug, Default)]
struct DnsInner {
    records: Vec<DnsRecord>,
    fail_list: bool,
    fail_upsert: bool,
    fail_delete: bool,
    upsert_calls: usize,
    delete_calls: usize,
}

/// In-memory DNS provider holding one zone
#[derive(Debug, Clone, Default)]
pub struct InMemoryDns {
    inner: Arc<RwLock<DnsInner>>,
}

impl InMemoryDns {
    /// Create an empty zone
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record
    pub async fn insert_record(&self, record: DnsRecord) {
        self.inner.write().await.records.push(record);
    }

    /// All records in the zone
    pub async fn records(&self) -> Vec<DnsRecord> {
        self.inner.read().await.records.clone()
    }

    /// Records whose name is `hostname`
    pub async fn records_named(&self, hostname: &str) -> Vec<DnsRecord> {
        self.inner
            .read()
            .await
            .records
            .iter()
            .filter(|r| r.has_name(hostname))
            .cloned()
            .collect()
    }

    /// Make list calls fail
    pub async fn fail_list(&self, fail: bool) {
        self.inner.write().await.fail_list = fail;
    }

    /// Make upsert calls fail
    pub async fn fail_upsert(&self, fail: bool) {
        self.inner.write().await.fail_upsert = fail;
    }

    /// Make delete calls fail
    pub async fn fail_delete(&self, fail: bool) {
        self.inner.write().await.fail_delete = fail;
    }

    /// Number of upsert calls served (including failed ones)
    pub async fn upsert_calls(&self) -> usize {
        self.inner.read().await.upsert_calls
    }

    /// Number of delete calls served (including failed ones)
    pub async fn delete_calls(&self) -> usize {
        self.inner.read().await.delete_calls
    }
}

#[async_trait]
impl DnsProvider for InMemoryDns {
    async fn upsert_record(&self, name: &str, address: IpAddr, ttl: u32) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.upsert_calls += 1;

        if guard.fail_upsert {
            return Err(Error::provider_unavailable(DNS_NAME, "injected failure"));
        }

        let record_type = RecordType::for_address(&address);
        let replacement = DnsRecord::address(name, address, ttl);

        let existing = guard
            .records
            .iter()
            .position(|r| r.record_type == record_type && r.has_name(name));

        match existing {
            Some(index) => guard.records[index] = replacement,
            None => guard.records.push(replacement),
        }

        Ok(())
    }

    async fn delete_record(&self, record: &DnsRecord) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.delete_calls += 1;

        if guard.fail_delete {
            return Err(Error::provider_unavailable(DNS_NAME, "injected failure"));
        }

        let position = guard
            .records
            .iter()
            .position(|r| {
                r.has_name(&record.name)
                    && r.record_type == record.record_type
                    && r.ttl == record.ttl
                    && r.values == record.values
            })
            .ok_or_else(|| {
                Error::invalid_input(format!(
                    "Record set {} {} was not found",
                    record.name, record.record_type
                ))
            })?;

        guard.records.remove(position);
        Ok(())
    }

    async fn list_records(&self) -> Result<Vec<DnsRecord>, Error> {
        let guard = self.inner.read().await;
        if guard.fail_list {
            return Err(Error::provider_unavailable(DNS_NAME, "injected failure"));
        }
        Ok(guard.records.clone())
    }

    fn provider_name(&self) -> &'static str {
        DNS_NAME
    }
}

/// Factory for the in-memory gateway
///
/// Every configured resource starts out stopped. The n-th resource (in target
/// name order) is assigned `203.0.113.<n+1>`; a configured elastic allocation
/// resolves to `198.51.100.10`.
pub struct MemoryGatewayFactory;

#[async_trait]
impl GatewayFactory for MemoryGatewayFactory {
    async fn create(&self, config: &HostDnsConfig) -> Result<ProviderGateway, Error> {
        let compute = InMemoryCompute::new();

        for (index, resource_id) in config.resources.values().enumerate() {
            let octet = u8::try_from(index + 1)
                .map_err(|_| Error::config("Too many resources for the memory provider"))?;
            compute
                .insert_resource(
                    resource_id,
                    ResourceState::Stopped,
                    Some(IpAddr::from([203, 0, 113, octet])),
                )
                .await;
        }

        if let Some(ref allocation) = config.elastic_ip_allocation_id {
            compute
                .insert_allocation(allocation, IpAddr::from([198, 51, 100, 10]))
                .await;
        }

        tracing::warn!("Memory provider selected - no cloud resources will be touched");

        Ok(ProviderGateway::new(
            Arc::new(compute),
            Arc::new(InMemoryDns::new()),
        ))
    }
}

/// Register the memory provider with a registry
pub fn register(registry: &crate::ProviderRegistry) {
    registry.register_gateway("memory", Box::new(MemoryGatewayFactory));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_resource_boots_after_describes() {
        let compute = InMemoryCompute::with_boot_describes(2);
        compute
            .insert_resource("i-1", ResourceState::Stopped, Some(addr("203.0.113.7")))
            .await;

        let transition = compute.change_state("i-1", DesiredState::Running).await.unwrap();
        assert_eq!(transition.previous, ResourceState::Stopped);
        assert_eq!(transition.current, ResourceState::Pending);

        let first = compute.describe("i-1").await.unwrap();
        assert_eq!(first.state, ResourceState::Pending);
        assert_eq!(first.public_address, None);

        let second = compute.describe("i-1").await.unwrap();
        assert_eq!(second.state, ResourceState::Running);
        assert_eq!(second.public_address, Some(addr("203.0.113.7")));
    }

    #[tokio::test]
    async fn test_stop_clears_address() {
        let compute = InMemoryCompute::new();
        compute
            .insert_resource("i-1", ResourceState::Running, Some(addr("203.0.113.7")))
            .await;

        let transition = compute.change_state("i-1", DesiredState::Stopped).await.unwrap();
        assert_eq!(transition, StateTransition::new(ResourceState::Running, ResourceState::Stopped));

        let snapshot = compute.describe("i-1").await.unwrap();
        assert_eq!(snapshot.public_address, None);
    }

    #[tokio::test]
    async fn test_injected_describe_failures_are_consumed() {
        let compute = InMemoryCompute::new();
        compute.insert_resource("i-1", ResourceState::Running, None).await;
        compute.fail_next_describes(1).await;

        assert!(compute.describe("i-1").await.is_err());
        assert!(compute.describe("i-1").await.is_ok());
        assert_eq!(compute.describe_calls().await, 2);
    }

    #[tokio::test]
    async fn test_upsert_replaces_same_name_and_type() {
        let dns = InMemoryDns::new();
        dns.upsert_record("game.example.com", addr("203.0.113.7"), 300).await.unwrap();
        dns.upsert_record("game.example.com", addr("203.0.113.8"), 300).await.unwrap();
        dns.upsert_record("game.example.com", addr("2001:db8::8"), 300).await.unwrap();

        let records = dns.records_named("game.example.com").await;
        assert_eq!(records.len(), 2);
        assert!(records.iter().any(|r| r.values == vec!["203.0.113.8".to_string()]));
    }

    #[tokio::test]
    async fn test_delete_requires_exact_match() {
        let dns = InMemoryDns::new();
        dns.upsert_record("game.example.com", addr("203.0.113.7"), 300).await.unwrap();

        let stale = DnsRecord::address("game.example.com", addr("203.0.113.9"), 300);
        assert!(dns.delete_record(&stale).await.is_err());

        let listed = dns.list_records().await.unwrap();
        dns.delete_record(&listed[0]).await.unwrap();
        assert!(dns.records().await.is_empty());
    }

    #[tokio::test]
    async fn test_factory_seeds_configured_resources() {
        let config = HostDnsConfig::new(
            crate::config::ProviderConfig::Memory,
            "game",
            "i-game",
            "game.example.com",
        )
        .with_target("development", "i-dev");

        let gateway = MemoryGatewayFactory.create(&config).await.unwrap();
        let dev = gateway.describe("i-dev").await.unwrap();
        assert_eq!(dev.state, ResourceState::Stopped);
        assert!(gateway.describe("i-other").await.is_err());
    }
}
