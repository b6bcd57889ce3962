//! DNS binding
//!
//! [`DnsBinder`] keeps the managed hostname in step with the resource:
//! `bind` publishes the address, `unbind` removes the record that still
//! points at a given address.
//!
//! ## Matching on unbind
//!
//! A record is removed only when its name is the managed hostname **and** its
//! current value equals the address being unbound. Another invocation may
//! already have pointed the hostname at a different instance; that record is
//! left alone.
//!
//! "No record holds the prior address" is scoped to the managed hostname.
//! Records under other names that happen to carry the same value are not
//! managed here and survive an unbind.

use crate::error::{Error, Result};
use crate::gateway::ProviderGateway;
use crate::traits::{DnsRecord, RecordType};
use std::net::IpAddr;
use tracing::{debug, info};

/// Result of an unbind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnbindOutcome {
    /// These records were deleted
    Removed(Vec<DnsRecord>),
    /// No record pointed at the address
    NoMatch,
}

/// Binds and unbinds the managed address record
#[derive(Debug, Clone)]
pub struct DnsBinder {
    gateway: ProviderGateway,
}

impl DnsBinder {
    /// Create a binder over the given gateway
    pub fn new(gateway: ProviderGateway) -> Self {
        Self { gateway }
    }

    /// Publish `hostname → address`
    ///
    /// Create-or-replace; binding the same address twice leaves one record.
    ///
    /// # Errors
    ///
    /// [`Error::DnsBindingFailed`] when the provider rejects or cannot
    /// complete the upsert.
    pub async fn bind(&self, hostname: &str, address: IpAddr, ttl: u32) -> Result<()> {
        self.gateway
            .upsert_record(hostname, address, ttl)
            .await
            .map_err(|e| Error::dns_binding_failed(hostname, e.to_string()))?;

        info!("Bound {} -> {}", hostname, address);
        Ok(())
    }

    /// Remove the record for `hostname` whose current value is `address`
    ///
    /// Finding nothing to remove is not an error.
    ///
    /// # Errors
    ///
    /// [`Error::DnsUnbindFailed`] when listing or deleting fails.
    pub async fn unbind(&self, hostname: &str, address: IpAddr) -> Result<UnbindOutcome> {
        let records = self
            .gateway
            .list_records()
            .await
            .map_err(|e| Error::dns_unbind_failed(hostname, e.to_string()))?;

        let record_type = RecordType::for_address(&address);
        let value = address.to_string();
        let matching: Vec<DnsRecord> = records
            .into_iter()
            .filter(|r| {
                r.record_type == record_type
                    && r.has_name(hostname)
                    && r.current_value() == Some(value.as_str())
            })
            .collect();

        if matching.is_empty() {
            debug!("No record for {} points at {}, nothing to unbind", hostname, address);
            return Ok(UnbindOutcome::NoMatch);
        }

        for record in &matching {
            self.gateway
                .delete_record_matching(record)
                .await
                .map_err(|e| Error::dns_unbind_failed(hostname, e.to_string()))?;
        }

        info!("Unbound {} from {}", hostname, address);
        Ok(UnbindOutcome::Removed(matching))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::memory::{InMemoryCompute, InMemoryDns};
    use std::sync::Arc;

    const HOST: &str = "game.example.com";

    fn setup() -> (InMemoryDns, DnsBinder) {
        let dns = InMemoryDns::new();
        let gateway = ProviderGateway::new(Arc::new(InMemoryCompute::new()), Arc::new(dns.clone()));
        (dns, DnsBinder::new(gateway))
    }

    fn addr(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_bind_is_idempotent() {
        let (dns, binder) = setup();

        binder.bind(HOST, addr("203.0.113.7"), 300).await.unwrap();
        binder.bind(HOST, addr("203.0.113.7"), 300).await.unwrap();

        let records = dns.records_named(HOST).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].values, vec!["203.0.113.7".to_string()]);
        assert_eq!(records[0].ttl, Some(300));
    }

    #[tokio::test]
    async fn test_bind_failure_is_binding_error() {
        let (dns, binder) = setup();
        dns.fail_upsert(true).await;

        let err = binder.bind(HOST, addr("203.0.113.7"), 300).await.unwrap_err();
        assert!(matches!(err, Error::DnsBindingFailed { .. }));
    }

    #[tokio::test]
    async fn test_unbind_is_scoped_to_hostname() {
        let (dns, binder) = setup();
        binder.bind(HOST, addr("203.0.113.7"), 300).await.unwrap();
        dns.insert_record(DnsRecord::address("other.example.com", addr("203.0.113.7"), 300))
            .await;

        let outcome = binder.unbind(HOST, addr("203.0.113.7")).await.unwrap();
        assert!(matches!(outcome, UnbindOutcome::Removed(ref r) if r.len() == 1));

        assert!(dns.records_named(HOST).await.is_empty());
        assert_eq!(dns.records_named("other.example.com").await.len(), 1);
    }

    #[tokio::test]
    async fn test_unbind_leaves_record_bound_elsewhere() {
        let (dns, binder) = setup();
        binder.bind(HOST, addr("203.0.113.8"), 300).await.unwrap();

        let outcome = binder.unbind(HOST, addr("203.0.113.7")).await.unwrap();
        assert_eq!(outcome, UnbindOutcome::NoMatch);
        assert_eq!(dns.records_named(HOST).await.len(), 1);
        assert_eq!(dns.delete_calls().await, 0);
    }

    #[tokio::test]
    async fn test_unbind_matches_provider_style_names() {
        let (dns, binder) = setup();
        dns.insert_record(DnsRecord::address("game.example.com.", addr("203.0.113.7"), 60))
            .await;

        let outcome = binder.unbind(HOST, addr("203.0.113.7")).await.unwrap();
        assert!(matches!(outcome, UnbindOutcome::Removed(_)));
        assert!(dns.records().await.is_empty());
    }

    #[tokio::test]
    async fn test_unbind_failures_are_unbind_errors() {
        let (dns, binder) = setup();
        binder.bind(HOST, addr("203.0.113.7"), 300).await.unwrap();

        dns.fail_list(true).await;
        let err = binder.unbind(HOST, addr("203.0.113.7")).await.unwrap_err();
        assert!(matches!(err, Error::DnsUnbindFailed { .. }));

        dns.fail_list(false).await;
        dns.fail_delete(true).await;
        let err = binder.unbind(HOST, addr("203.0.113.7")).await.unwrap_err();
        assert!(matches!(err, Error::DnsUnbindFailed { .. }));
    }
}
