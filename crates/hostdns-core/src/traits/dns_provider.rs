// # DNS Provider Trait
//
// Defines the interface for managing address records in a hosted zone.
//
// ## Implementations
//
// - Route53: `hostdns-provider-aws` crate
// - In-memory: `hostdns_core::providers::memory`
//
// ## Usage
//
// ```rust,ignore
// use hostdns_core::DnsProvider;
//
// provider.upsert_record("game.example.com", "203.0.113.7".parse()?, 300).await?;
// for record in provider.list_records().await? {
//     println!("{} {:?}", record.name, record.values);
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Address record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    /// IPv4 address record
    A,
    /// IPv6 address record
    #[serde(rename = "AAAA")]
    Aaaa,
    /// Any other record type found in the zone
    Other,
}

impl RecordType {
    /// Record type that publishes the given address
    pub fn for_address(address: &IpAddr) -> Self {
        match address {
            IpAddr::V4(_) => Self::A,
            IpAddr::V6(_) => Self::Aaaa,
        }
    }

    /// Parse a provider record type name
    pub fn from_name(name: &str) -> Self {
        match name {
            "A" => Self::A,
            "AAAA" => Self::Aaaa,
            _ => Self::Other,
        }
    }

    /// Wire name of the record type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::Aaaa => "AAAA",
            Self::Other => "OTHER",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A DNS resource record set as listed by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Record name, as the provider reports it (may carry a trailing dot)
    pub name: String,
    /// Record type
    pub record_type: RecordType,
    /// Time-to-live in seconds
    pub ttl: Option<u32>,
    /// Record values in provider order
    pub values: Vec<String>,
}

impl DnsRecord {
    /// Single-value address record
    pub fn address(name: impl Into<String>, address: IpAddr, ttl: u32) -> Self {
        Self {
            name: name.into(),
            record_type: RecordType::for_address(&address),
            ttl: Some(ttl),
            values: vec![address.to_string()],
        }
    }

    /// Whether this record's name is `hostname`
    ///
    /// Comparison ignores ASCII case and a trailing root dot.
    pub fn has_name(&self, hostname: &str) -> bool {
        normalize_name(&self.name) == normalize_name(hostname)
    }

    /// The value the record currently resolves to (the last one listed)
    pub fn current_value(&self) -> Option<&str> {
        self.values.last().map(String::as_str)
    }
}

/// Lowercase a DNS name and strip the trailing root dot
pub fn normalize_name(name: &str) -> String {
    name.trim_end_matches('.').to_ascii_lowercase()
}

/// Trait for DNS provider implementations
///
/// # Contract
///
/// - One remote request per call (a paginated listing may take one request
///   per page). No retry, backoff or caching.
/// - Operations are scoped to the zone the provider was built for.
/// - Fail with [`Error::ProviderUnavailable`](crate::Error::ProviderUnavailable)
///   when the call cannot be completed.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Create or replace the single-value address record `name → address`
    ///
    /// # Idempotency
    ///
    /// Calling this repeatedly with the same address leaves exactly one
    /// record with that value.
    async fn upsert_record(
        &self,
        name: &str,
        address: IpAddr,
        ttl: u32,
    ) -> Result<(), crate::Error>;

    /// Delete a record exactly as it was listed
    async fn delete_record(&self, record: &DnsRecord) -> Result<(), crate::Error>;

    /// List the records in the zone
    async fn list_records(&self) -> Result<Vec<DnsRecord>, crate::Error>;

    /// Provider name (for logging)
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_type_for_address() {
        let v4: IpAddr = "203.0.113.7".parse().unwrap();
        let v6: IpAddr = "2001:db8::7".parse().unwrap();
        assert_eq!(RecordType::for_address(&v4), RecordType::A);
        assert_eq!(RecordType::for_address(&v6), RecordType::Aaaa);
        assert_eq!(RecordType::from_name("CNAME"), RecordType::Other);
    }

    #[test]
    fn test_name_matching_ignores_case_and_root_dot() {
        let record = DnsRecord::address("Game.Example.com.", "203.0.113.7".parse().unwrap(), 300);
        assert!(record.has_name("game.example.com"));
        assert!(record.has_name("game.example.com."));
        assert!(!record.has_name("dev.example.com"));
    }

    #[test]
    fn test_current_value_is_last() {
        let record = DnsRecord {
            name: "game.example.com".to_string(),
            record_type: RecordType::A,
            ttl: Some(60),
            values: vec!["198.51.100.1".to_string(), "203.0.113.7".to_string()],
        };
        assert_eq!(record.current_value(), Some("203.0.113.7"));
    }
}
