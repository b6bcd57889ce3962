//! Core traits for hostdns
//!
//! This module defines the abstract provider interfaces.
//!
//! - [`ComputeProvider`]: Start, stop and describe the compute resource
//! - [`DnsProvider`]: Upsert, delete and list address records

pub mod compute_provider;
pub mod dns_provider;

pub use compute_provider::{
    ComputeProvider, DesiredState, ResourceSnapshot, ResourceState, StateTransition,
};
pub use dns_provider::{DnsProvider, DnsRecord, RecordType, normalize_name};
