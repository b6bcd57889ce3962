//! Fixtures shared by the contract tests
//!
//! Every test gets a controller wired to in-memory providers, plus handles
//! to those providers so it can seed state, inject failures and inspect
//! call counts.

#![allow(dead_code)]

use hostdns_core::config::{HostDnsConfig, PollConfig, ProviderConfig};
use hostdns_core::providers::memory::{InMemoryCompute, InMemoryDns};
use hostdns_core::traits::{DnsRecord, ResourceState};
use hostdns_core::{LifecycleController, ProviderGateway};
use std::net::IpAddr;
use std::sync::Arc;

pub const HOSTNAME: &str = "game.example.com";
pub const RESOURCE_ID: &str = "i-0game";
pub const DEV_RESOURCE_ID: &str = "i-0dev";

/// Controller plus the providers behind it
pub struct Harness {
    pub compute: InMemoryCompute,
    pub dns: InMemoryDns,
    pub controller: LifecycleController,
}

impl Harness {
    /// Resources boot after `boot_describes` describes; polling never sleeps
    pub fn new(boot_describes: u32, max_attempts: u32) -> Self {
        Self::with_config(boot_describes, config(max_attempts))
    }

    pub fn with_config(boot_describes: u32, config: HostDnsConfig) -> Self {
        let compute = InMemoryCompute::with_boot_describes(boot_describes);
        let dns = InMemoryDns::new();
        let gateway = ProviderGateway::new(Arc::new(compute.clone()), Arc::new(dns.clone()));
        let controller = LifecycleController::new(config, gateway).unwrap();

        Self {
            compute,
            dns,
            controller,
        }
    }

    /// Seed the primary resource
    pub async fn seed(&self, state: ResourceState, address: Option<&str>) {
        self.compute
            .insert_resource(RESOURCE_ID, state, address.map(addr))
            .await;
    }

    /// Values currently published for the managed hostname
    pub async fn bound_values(&self) -> Vec<String> {
        self.dns
            .records_named(HOSTNAME)
            .await
            .into_iter()
            .flat_map(|r| r.values)
            .collect()
    }

    /// Publish a record directly, bypassing the controller
    pub async fn publish(&self, name: &str, value: &str) {
        self.dns.insert_record(DnsRecord::address(name, addr(value), 300)).await;
    }
}

/// Configuration with a zero poll interval
pub fn config(max_attempts: u32) -> HostDnsConfig {
    HostDnsConfig::new(ProviderConfig::Memory, "game", RESOURCE_ID, HOSTNAME)
        .with_target("development", DEV_RESOURCE_ID)
        .with_poll(PollConfig::new(max_attempts, 0))
}

pub fn addr(s: &str) -> IpAddr {
    s.parse().unwrap()
}
