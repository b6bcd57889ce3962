// # hostdns-core
//
// Core library for starting and stopping a compute resource and keeping a
// DNS address record pointed at it.
//
// ## Architecture Overview
//
// - **ComputeProvider**: Trait for changing and describing resource state
// - **DnsProvider**: Trait for upserting, deleting and listing address records
// - **ProviderGateway**: Normalizes provider errors behind one handle
// - **AddressPoller**: Bounded describe loop that waits for a public address
// - **DnsBinder**: Binds and unbinds the managed hostname
// - **LifecycleController**: Orchestrates start → poll → bind and unbind → stop
// - **ProviderRegistry**: Plugin-based registry for gateway factories
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Orchestration is separate from provider SDKs
// 2. **Plugin-Based**: Providers are registered dynamically, no hard-coded if-else
// 3. **Library-First**: Harnesses only map parameters in and responses out
// 4. **Stateless**: Every invocation learns what it needs from the providers

pub mod binder;
pub mod config;
pub mod controller;
pub mod error;
pub mod gateway;
pub mod poller;
pub mod providers;
pub mod registry;
pub mod request;
pub mod traits;

// Re-export core types for convenience
pub use binder::{DnsBinder, UnbindOutcome};
pub use config::{HostDnsConfig, PollConfig, ProviderConfig, RecordConfig};
pub use controller::{Action, ActionResult, LifecycleController};
pub use error::{Error, Result};
pub use gateway::ProviderGateway;
pub use poller::{AddressPoller, PollOutcome, RetryBudget};
pub use registry::{GatewayFactory, ProviderRegistry};
pub use request::{ControlRequest, ControlResponse};
pub use traits::{ComputeProvider, DnsProvider, ResourceState};
