// # Provider Implementations
//
// Provider implementations that ship with the core library. Cloud providers
// live in their own crates (`hostdns-provider-aws`).

pub mod memory;

pub use memory::{InMemoryCompute, InMemoryDns, MemoryGatewayFactory};
