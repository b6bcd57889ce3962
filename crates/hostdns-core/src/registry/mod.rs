//! Plugin-based provider registry
//!
//! The registry maps provider type names to factories so the daemon can pick
//! providers from configuration without hardcoded if-else chains.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hostdns_core::ProviderRegistry;
//!
//! let registry = ProviderRegistry::new();
//! hostdns_core::providers::memory::register(&registry);
//! hostdns_provider_aws::register(&registry);
//!
//! let gateway = registry.create_gateway(&config).await?;
//! ```

use crate::config::HostDnsConfig;
use crate::error::{Error, Result};
use crate::gateway::ProviderGateway;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Factory for building a [`ProviderGateway`] from configuration
///
/// Creation is async because cloud SDKs resolve credentials and regions
/// while building their clients.
#[async_trait]
pub trait GatewayFactory: Send + Sync {
    /// Create a gateway for the given configuration
    async fn create(&self, config: &HostDnsConfig) -> Result<ProviderGateway>;
}

/// Provider registry
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ProviderRegistry {
    gateways: RwLock<HashMap<String, Arc<dyn GatewayFactory>>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a gateway factory
    ///
    /// # Parameters
    ///
    /// - `name`: Provider type name (e.g., "aws", "memory")
    /// - `factory`: Factory object for creating gateways
    pub fn register_gateway(&self, name: impl Into<String>, factory: Box<dyn GatewayFactory>) {
        let name = name.into();
        match self.gateways.write() {
            Ok(mut gateways) => {
                gateways.insert(name, Arc::from(factory));
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(name, Arc::from(factory));
            }
        }
    }

    /// Create a gateway for the configured provider type
    ///
    /// # Returns
    ///
    /// - `Ok(ProviderGateway)`: Created gateway
    /// - `Err(Error)`: If the provider type is not registered or creation fails
    pub async fn create_gateway(&self, config: &HostDnsConfig) -> Result<ProviderGateway> {
        let provider_type = config.provider.type_name();

        // Clone the factory out so the lock is not held across the await
        let factory = self
            .factory(provider_type)
            .ok_or_else(|| Error::config(format!("Unknown provider type: {}", provider_type)))?;

        factory.create(config).await
    }

    /// List all registered provider types
    pub fn list_providers(&self) -> Vec<String> {
        let mut names: Vec<String> = match self.gateways.read() {
            Ok(gateways) => gateways.keys().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().keys().cloned().collect(),
        };
        names.sort();
        names
    }

    /// Check if a provider type is registered
    pub fn has_provider(&self, name: &str) -> bool {
        self.factory(name).is_some()
    }

    fn factory(&self, name: &str) -> Option<Arc<dyn GatewayFactory>> {
        match self.gateways.read() {
            Ok(gateways) => gateways.get(name).cloned(),
            Err(poisoned) => poisoned.into_inner().get(name).cloned(),
        }
    }
}
