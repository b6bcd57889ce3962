//! Route53 DNS provider
//!
//! Records are read and written as simple record sets. Alias record sets and
//! record sets with a routing policy (those carrying a set identifier) are
//! left out of listings: they cannot be reproduced from a [`DnsRecord`] for
//! an exact-match delete, and hostdns never creates them.

use async_trait::async_trait;
use aws_sdk_route53::error::{BuildError, DisplayErrorContext, SdkError};
use aws_sdk_route53::types::{
    Change, ChangeAction, ChangeBatch, ResourceRecord, ResourceRecordSet, RrType,
};
use hostdns_core::traits::{DnsProvider, DnsRecord, RecordType};
use hostdns_core::{Error, Result};
use std::net::IpAddr;

const PROVIDER_NAME: &str = "route53";

/// Prefix Route53 puts on hosted zone ids in some responses and consoles
const HOSTED_ZONE_PREFIX: &str = "/hostedzone/";

/// DNS provider backed by one Route53 hosted zone
#[derive(Debug, Clone)]
pub struct Route53Dns {
    client: aws_sdk_route53::Client,
    hosted_zone_id: String,
}

impl Route53Dns {
    /// Create a provider for a hosted zone
    ///
    /// Accepts both `Z123...` and `/hostedzone/Z123...`.
    pub fn new(client: aws_sdk_route53::Client, hosted_zone_id: impl Into<String>) -> Self {
        let hosted_zone_id = hosted_zone_id.into();
        let hosted_zone_id = hosted_zone_id
            .strip_prefix(HOSTED_ZONE_PREFIX)
            .map(str::to_string)
            .unwrap_or(hosted_zone_id);

        Self {
            client,
            hosted_zone_id,
        }
    }

    /// Hosted zone this provider writes to
    pub fn hosted_zone_id(&self) -> &str {
        &self.hosted_zone_id
    }

    async fn submit(&self, action: ChangeAction, record_set: ResourceRecordSet) -> Result<()> {
        let name = record_set.name().to_string();
        let change = Change::builder()
            .action(action.clone())
            .resource_record_set(record_set)
            .build()
            .map_err(build_error)?;
        let batch = ChangeBatch::builder()
            .changes(change)
            .comment("hostdns")
            .build()
            .map_err(build_error)?;

        self.client
            .change_resource_record_sets()
            .hosted_zone_id(&self.hosted_zone_id)
            .change_batch(batch)
            .send()
            .await
            .map_err(sdk_error)?;

        tracing::debug!("Route53 {} {} submitted", action.as_str(), name);
        Ok(())
    }
}

#[async_trait]
impl DnsProvider for Route53Dns {
    async fn upsert_record(&self, name: &str, address: IpAddr, ttl: u32) -> Result<()> {
        let record = DnsRecord::address(name, address, ttl);
        self.submit(ChangeAction::Upsert, record_set_for(&record)?).await
    }

    async fn delete_record(&self, record: &DnsRecord) -> Result<()> {
        self.submit(ChangeAction::Delete, record_set_for(record)?).await
    }

    async fn list_records(&self) -> Result<Vec<DnsRecord>> {
        let mut records = Vec::new();
        let mut next: Option<(String, RrType, Option<String>)> = None;

        loop {
            let mut request = self
                .client
                .list_resource_record_sets()
                .hosted_zone_id(&self.hosted_zone_id);
            if let Some((name, rr_type, identifier)) = next.take() {
                request = request
                    .start_record_name(name)
                    .start_record_type(rr_type)
                    .set_start_record_identifier(identifier);
            }

            let page = request.send().await.map_err(sdk_error)?;
            records.extend(page.resource_record_sets().iter().filter_map(record_of));

            if !page.is_truncated() {
                break;
            }
            match (page.next_record_name(), page.next_record_type()) {
                (Some(name), Some(rr_type)) => {
                    next = Some((
                        name.to_string(),
                        rr_type.clone(),
                        page.next_record_identifier().map(str::to_string),
                    ));
                }
                _ => break,
            }
        }

        tracing::debug!(
            "Listed {} record set(s) in {}",
            records.len(),
            self.hosted_zone_id
        );
        Ok(records)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

fn rr_type_for(record_type: RecordType) -> Result<RrType> {
    match record_type {
        RecordType::A => Ok(RrType::A),
        RecordType::Aaaa => Ok(RrType::Aaaa),
        RecordType::Other => Err(Error::invalid_input(
            "Only A and AAAA records can be written",
        )),
    }
}

fn record_set_for(record: &DnsRecord) -> Result<ResourceRecordSet> {
    let mut builder = ResourceRecordSet::builder()
        .name(&record.name)
        .r#type(rr_type_for(record.record_type)?)
        .set_ttl(record.ttl.map(i64::from));

    for value in &record.values {
        builder = builder.resource_records(
            ResourceRecord::builder()
                .value(value)
                .build()
                .map_err(build_error)?,
        );
    }

    builder.build().map_err(build_error)
}

fn record_of(set: &ResourceRecordSet) -> Option<DnsRecord> {
    if set.alias_target().is_some() || set.set_identifier().is_some() {
        return None;
    }

    Some(DnsRecord {
        name: set.name().to_string(),
        record_type: RecordType::from_name(set.r#type().as_str()),
        ttl: set.ttl().and_then(|ttl| u32::try_from(ttl).ok()),
        values: set
            .resource_records()
            .iter()
            .map(|r| r.value().to_string())
            .collect(),
    })
}

fn build_error(err: BuildError) -> Error {
    Error::invalid_input(format!("Invalid Route53 request: {}", err))
}

fn sdk_error<E, R>(err: SdkError<E, R>) -> Error
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    Error::provider_unavailable(PROVIDER_NAME, DisplayErrorContext(&err).to_string())
}
