// # AWS Providers
//
// EC2 as the compute provider and Route53 as the DNS provider.
//
// ## Behavior
//
// - One SDK request per trait call; a Route53 listing follows pagination
//   markers, one request per page
// - No retry, backoff or caching here (the core's `AddressPoller` owns the
//   only retry loop); the SDK's own transport retries are left at defaults
// - Instance ids that EC2 rejects as unknown or malformed map to
//   `ResourceNotFound`; every other SDK failure maps to `ProviderUnavailable`
//
// ## Credentials
//
// Loaded through the standard AWS chain (environment, profile, instance or
// task role). Nothing is read from hostdns configuration except the region
// and the hosted zone id.
//
// ## API Reference
//
// - EC2: StartInstances, StopInstances, DescribeInstances, AssociateAddress
// - Route53: ChangeResourceRecordSets, ListResourceRecordSets

mod ec2;
mod route53;

pub use ec2::Ec2Compute;
pub use route53::Route53Dns;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use hostdns_core::config::{HostDnsConfig, ProviderConfig};
use hostdns_core::registry::GatewayFactory;
use hostdns_core::{Error, ProviderGateway, Result};
use std::sync::Arc;

/// Factory for the EC2 + Route53 gateway
pub struct AwsGatewayFactory;

#[async_trait]
impl GatewayFactory for AwsGatewayFactory {
    async fn create(&self, config: &HostDnsConfig) -> Result<ProviderGateway> {
        let (region, hosted_zone_id) = match &config.provider {
            ProviderConfig::Aws {
                region,
                hosted_zone_id,
            } => (region.clone(), hosted_zone_id.clone()),
            _ => return Err(Error::config("Invalid config for AWS provider")),
        };

        if hosted_zone_id.is_empty() {
            return Err(Error::config("Route53 hosted zone id is required"));
        }

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }
        let sdk_config = loader.load().await;

        tracing::info!(
            "AWS providers ready (region: {}, hosted zone: {})",
            sdk_config
                .region()
                .map(|r| r.as_ref())
                .unwrap_or("<unresolved>"),
            hosted_zone_id
        );

        let compute = Ec2Compute::new(aws_sdk_ec2::Client::new(&sdk_config));
        let dns = Route53Dns::new(aws_sdk_route53::Client::new(&sdk_config), hosted_zone_id);

        Ok(ProviderGateway::new(Arc::new(compute), Arc::new(dns)))
    }
}

/// Register the AWS provider with a registry
///
/// # Example
///
/// ```rust
/// use hostdns_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// hostdns_provider_aws::register(&registry);
/// assert!(registry.has_provider("aws"));
/// ```
pub fn register(registry: &hostdns_core::ProviderRegistry) {
    registry.register_gateway("aws", Box::new(AwsGatewayFactory));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_factory_rejects_other_provider_config() {
        let config = HostDnsConfig::new(ProviderConfig::Memory, "game", "i-1", "game.example.com");

        let err = AwsGatewayFactory.create(&config).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_factory_requires_hosted_zone() {
        let provider = ProviderConfig::Aws {
            region: Some("eu-west-1".to_string()),
            hosted_zone_id: String::new(),
        };
        let config = HostDnsConfig::new(provider, "game", "i-1", "game.example.com");

        let err = AwsGatewayFactory.create(&config).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_registration() {
        let registry = hostdns_core::ProviderRegistry::new();
        register(&registry);
        assert_eq!(registry.list_providers(), vec!["aws".to_string()]);
    }
}
