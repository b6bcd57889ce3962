// # Compute Provider Trait
//
// Defines the interface for starting, stopping and describing the remote
// compute resource.
//
// ## Implementations
//
// - EC2: `hostdns-provider-aws` crate
// - In-memory: `hostdns_core::providers::memory`
//
// ## Usage
//
// ```rust,ignore
// use hostdns_core::traits::{ComputeProvider, DesiredState};
//
// let transition = provider.change_state("i-0abc", DesiredState::Running).await?;
// let snapshot = provider.describe("i-0abc").await?;
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Lifecycle state of the remote resource as reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceState {
    /// Starting up
    Pending,
    /// Running
    Running,
    /// Shutting down
    Stopping,
    /// Stopped
    Stopped,
    /// Any state the provider reports that is not one of the above
    Unknown,
}

impl ResourceState {
    /// Map a provider state name onto a `ResourceState`
    ///
    /// Unrecognized names map to [`ResourceState::Unknown`].
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "pending" => Self::Pending,
            "running" => Self::Running,
            "stopping" => Self::Stopping,
            "stopped" => Self::Stopped,
            _ => Self::Unknown,
        }
    }

    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transition requested from the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesiredState {
    /// Start the resource
    Running,
    /// Stop the resource
    Stopped,
}

/// States reported by the provider for a state-change request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    /// State before the request
    pub previous: ResourceState,
    /// State right after the request was accepted
    pub current: ResourceState,
}

impl StateTransition {
    /// Create a new transition
    pub fn new(previous: ResourceState, current: ResourceState) -> Self {
        Self { previous, current }
    }
}

/// Point-in-time view of the remote resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSnapshot {
    /// Provider identifier
    pub id: String,
    /// Current state
    pub state: ResourceState,
    /// Public address, present only while running and assigned
    pub public_address: Option<IpAddr>,
}

impl ResourceSnapshot {
    /// True once the resource is running and has a routable address
    pub fn routable_address(&self) -> Option<IpAddr> {
        match (self.state, self.public_address) {
            (ResourceState::Running, Some(address)) => Some(address),
            _ => None,
        }
    }
}

/// Trait for compute provider implementations
///
/// # Contract
///
/// - One remote request per call. No retry, backoff or caching; the
///   [`AddressPoller`](crate::poller::AddressPoller) owns the only retry loop.
/// - Fail with [`Error::ResourceNotFound`](crate::Error::ResourceNotFound) when
///   the identifier does not resolve.
/// - Fail with [`Error::ProviderUnavailable`](crate::Error::ProviderUnavailable)
///   when the call cannot be completed.
#[async_trait]
pub trait ComputeProvider: Send + Sync {
    /// Request a state change and report the resulting transition
    async fn change_state(
        &self,
        resource_id: &str,
        desired: DesiredState,
    ) -> Result<StateTransition, crate::Error>;

    /// Describe the resource as it is right now
    async fn describe(&self, resource_id: &str) -> Result<ResourceSnapshot, crate::Error>;

    /// Associate a pre-allocated static address with the resource
    ///
    /// Providers without static addresses keep the default, which reports
    /// the capability as unavailable.
    async fn associate_address(
        &self,
        resource_id: &str,
        allocation_id: &str,
    ) -> Result<(), crate::Error> {
        let _ = (resource_id, allocation_id);
        Err(crate::Error::provider_unavailable(
            self.provider_name(),
            "static address association is not supported",
        ))
    }

    /// Provider name (for logging)
    fn provider_name(&self) -> &'static str;
}
