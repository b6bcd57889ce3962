//! Configuration types for hostdns
//!
//! Configuration is read once by the embedding application and handed to
//! [`LifecycleController::new`](crate::controller::LifecycleController::new).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Main hostdns configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostDnsConfig {
    /// Provider configuration
    pub provider: ProviderConfig,

    /// Resource identifier per named target (e.g. "game" → "i-0abc")
    pub resources: BTreeMap<String, String>,

    /// Target used when a request does not name one
    pub default_target: String,

    /// Managed DNS record
    pub record: RecordConfig,

    /// Address polling budget
    #[serde(default)]
    pub poll: PollConfig,

    /// Static address allocation to associate on start
    #[serde(default)]
    pub elastic_ip_allocation_id: Option<String>,
}

impl HostDnsConfig {
    /// Create a configuration with one target, which is also the default
    pub fn new(
        provider: ProviderConfig,
        target: impl Into<String>,
        resource_id: impl Into<String>,
        hostname: impl Into<String>,
    ) -> Self {
        let target = target.into();
        let mut resources = BTreeMap::new();
        resources.insert(target.clone(), resource_id.into());
        Self {
            provider,
            resources,
            default_target: target,
            record: RecordConfig::new(hostname),
            poll: PollConfig::default(),
            elastic_ip_allocation_id: None,
        }
    }

    /// Add another named target
    pub fn with_target(mut self, target: impl Into<String>, resource_id: impl Into<String>) -> Self {
        self.resources.insert(target.into(), resource_id.into());
        self
    }

    /// Set the poll budget
    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.resources.is_empty() {
            return Err(crate::Error::config("No resources configured"));
        }

        for (target, id) in &self.resources {
            if target.is_empty() {
                return Err(crate::Error::config("Target names cannot be empty"));
            }
            if id.is_empty() {
                return Err(crate::Error::config(format!(
                    "Resource id for target '{}' cannot be empty",
                    target
                )));
            }
        }

        if !self.resources.contains_key(&self.default_target) {
            return Err(crate::Error::config(format!(
                "Default target '{}' is not among the configured resources",
                self.default_target
            )));
        }

        if let Some(ref allocation) = self.elastic_ip_allocation_id
            && allocation.is_empty()
        {
            return Err(crate::Error::config(
                "Elastic IP allocation id cannot be empty when set",
            ));
        }

        self.provider.validate()?;
        self.record.validate()?;
        self.poll.validate()?;

        Ok(())
    }

    /// Resolve a target name (or the default target) to a resource id
    pub fn resource_id(&self, target: Option<&str>) -> Result<&str, crate::Error> {
        let target = match target {
            Some(t) if !t.is_empty() => t,
            _ => self.default_target.as_str(),
        };

        self.resources
            .get(target)
            .map(String::as_str)
            .ok_or_else(|| crate::Error::invalid_input(format!("Unknown target: {}", target)))
    }
}

/// Provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// EC2 for compute, Route53 for DNS
    Aws {
        /// Region for the compute provider (falls back to the SDK default chain)
        region: Option<String>,
        /// Route53 hosted zone holding the managed record
        hosted_zone_id: String,
    },

    /// Simulated providers held in process memory
    Memory,
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Aws { hosted_zone_id, region } => {
                if hosted_zone_id.is_empty() {
                    return Err(crate::Error::config("Hosted zone id cannot be empty"));
                }
                if region.as_ref().is_some_and(|r| r.is_empty()) {
                    return Err(crate::Error::config("Region cannot be empty when set"));
                }
                Ok(())
            }
            ProviderConfig::Memory => Ok(()),
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Aws { .. } => "aws",
            ProviderConfig::Memory => "memory",
        }
    }
}

/// Managed DNS record configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordConfig {
    /// Hostname to keep pointed at the running resource
    pub hostname: String,

    /// Record time-to-live (in seconds)
    #[serde(default = "default_ttl")]
    pub ttl: u32,
}

impl RecordConfig {
    /// Create a record configuration with the default TTL
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            ttl: default_ttl(),
        }
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Validate the record configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        validate_domain_name(&self.hostname)?;
        if self.ttl == 0 {
            return Err(crate::Error::config("Record TTL must be > 0"));
        }
        Ok(())
    }
}

/// Address polling configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Maximum number of describe calls
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay between describe calls (in seconds)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl PollConfig {
    /// Create a poll configuration
    pub fn new(max_attempts: u32, interval_secs: u64) -> Self {
        Self {
            max_attempts,
            interval_secs,
        }
    }

    /// Delay between describe calls
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Validate the poll configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.max_attempts == 0 {
            return Err(crate::Error::config("Poll max_attempts must be > 0"));
        }
        Ok(())
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            interval_secs: default_interval_secs(),
        }
    }
}

fn default_ttl() -> u32 {
    300
}

fn default_max_attempts() -> u32 {
    10
}

fn default_interval_secs() -> u64 {
    3
}

/// Validate that a string is a valid domain name
///
/// Basic RFC 1035 checks: total length, label length, label characters.
/// A single trailing root dot is accepted.
pub fn validate_domain_name(domain: &str) -> Result<(), crate::Error> {
    let domain = domain.strip_suffix('.').unwrap_or(domain);

    if domain.is_empty() {
        return Err(crate::Error::config("Domain name cannot be empty"));
    }

    if domain.len() > 253 {
        return Err(crate::Error::config(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(crate::Error::config(format!(
                "Domain name has empty label: '{}'",
                domain
            )));
        }

        if label.len() > 63 {
            return Err(crate::Error::config(format!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(crate::Error::config(format!(
                "Domain label contains invalid characters. Label: '{}'",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(crate::Error::config(format!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}
