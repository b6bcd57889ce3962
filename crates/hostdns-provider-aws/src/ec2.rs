//! EC2 compute provider

use async_trait::async_trait;
use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_ec2::types::{Instance, InstanceState, InstanceStateChange};
use hostdns_core::traits::{
    ComputeProvider, DesiredState, ResourceSnapshot, ResourceState, StateTransition,
};
use hostdns_core::{Error, Result};
use std::net::IpAddr;

const PROVIDER_NAME: &str = "ec2";

/// Compute provider backed by EC2 instances
#[derive(Debug, Clone)]
pub struct Ec2Compute {
    client: aws_sdk_ec2::Client,
}

impl Ec2Compute {
    /// Create a provider over an EC2 client
    pub fn new(client: aws_sdk_ec2::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ComputeProvider for Ec2Compute {
    async fn change_state(
        &self,
        resource_id: &str,
        desired: DesiredState,
    ) -> Result<StateTransition> {
        tracing::debug!("EC2 {:?} for {}", desired, resource_id);

        match desired {
            DesiredState::Running => {
                let output = self
                    .client
                    .start_instances()
                    .instance_ids(resource_id)
                    .send()
                    .await
                    .map_err(|e| sdk_error(resource_id, e))?;
                transition_for(resource_id, output.starting_instances())
            }
            DesiredState::Stopped => {
                let output = self
                    .client
                    .stop_instances()
                    .instance_ids(resource_id)
                    .send()
                    .await
                    .map_err(|e| sdk_error(resource_id, e))?;
                transition_for(resource_id, output.stopping_instances())
            }
        }
    }

    async fn describe(&self, resource_id: &str) -> Result<ResourceSnapshot> {
        let output = self
            .client
            .describe_instances()
            .instance_ids(resource_id)
            .send()
            .await
            .map_err(|e| sdk_error(resource_id, e))?;

        let instance = output
            .reservations()
            .iter()
            .flat_map(|r| r.instances())
            .find(|i| i.instance_id() == Some(resource_id))
            .ok_or_else(|| Error::resource_not_found(resource_id))?;

        Ok(snapshot_of(resource_id, instance))
    }

    async fn associate_address(&self, resource_id: &str, allocation_id: &str) -> Result<()> {
        let output = self
            .client
            .associate_address()
            .allocation_id(allocation_id)
            .instance_id(resource_id)
            .send()
            .await
            .map_err(|e| sdk_error(resource_id, e))?;

        tracing::info!(
            "Associated {} with {} (association: {})",
            allocation_id,
            resource_id,
            output.association_id().unwrap_or("-")
        );
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

fn state_of(state: Option<&InstanceState>) -> ResourceState {
    state
        .and_then(|s| s.name())
        .map(|name| ResourceState::from_name(name.as_str()))
        .unwrap_or(ResourceState::Unknown)
}

fn transition_for(resource_id: &str, changes: &[InstanceStateChange]) -> Result<StateTransition> {
    let change = changes
        .iter()
        .find(|c| c.instance_id() == Some(resource_id))
        .ok_or_else(|| {
            Error::provider_unavailable(
                PROVIDER_NAME,
                format!("State change response did not include {}", resource_id),
            )
        })?;

    Ok(StateTransition::new(
        state_of(change.previous_state()),
        state_of(change.current_state()),
    ))
}

fn snapshot_of(resource_id: &str, instance: &Instance) -> ResourceSnapshot {
    let public_address = instance
        .public_ip_address()
        .and_then(|ip| match ip.parse::<IpAddr>() {
            Ok(address) => Some(address),
            Err(_) => {
                tracing::warn!("Ignoring unparsable public address {:?} on {}", ip, resource_id);
                None
            }
        });

    ResourceSnapshot {
        id: resource_id.to_string(),
        state: state_of(instance.state()),
        public_address,
    }
}

fn sdk_error<E, R>(resource_id: &str, err: SdkError<E, R>) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let code = err.code().map(str::to_string);
    classify(resource_id, code.as_deref(), DisplayErrorContext(&err).to_string())
}

/// Map an EC2 error code onto the core taxonomy
fn classify(resource_id: &str, code: Option<&str>, detail: String) -> Error {
    match code {
        Some(code) if code.starts_with("InvalidInstanceID") => {
            Error::resource_not_found(resource_id)
        }
        Some(code) if code.starts_with("InvalidAllocationID") => {
            Error::invalid_input(format!("{}: {}", code, detail))
        }
        _ => Error::provider_unavailable(PROVIDER_NAME, detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_ec2::types::InstanceStateName;

    fn state(name: InstanceStateName) -> InstanceState {
        InstanceState::builder().name(name).build()
    }

    #[test]
    fn test_state_mapping() {
        assert_eq!(state_of(Some(&state(InstanceStateName::Pending))), ResourceState::Pending);
        assert_eq!(state_of(Some(&state(InstanceStateName::Running))), ResourceState::Running);
        assert_eq!(state_of(Some(&state(InstanceStateName::Stopping))), ResourceState::Stopping);
        assert_eq!(state_of(Some(&state(InstanceStateName::Stopped))), ResourceState::Stopped);
        assert_eq!(
            state_of(Some(&state(InstanceStateName::Terminated))),
            ResourceState::Unknown
        );
        assert_eq!(state_of(None), ResourceState::Unknown);
    }

    #[test]
    fn test_transition_picks_requested_instance() {
        let changes = vec![
            InstanceStateChange::builder()
                .instance_id("i-other")
                .previous_state(state(InstanceStateName::Running))
                .current_state(state(InstanceStateName::Stopping))
                .build(),
            InstanceStateChange::builder()
                .instance_id("i-0game")
                .previous_state(state(InstanceStateName::Stopped))
                .current_state(state(InstanceStateName::Pending))
                .build(),
        ];

        let transition = transition_for("i-0game", &changes).unwrap();
        assert_eq!(
            transition,
            StateTransition::new(ResourceState::Stopped, ResourceState::Pending)
        );

        assert!(matches!(
            transition_for("i-missing", &changes),
            Err(Error::ProviderUnavailable { .. })
        ));
    }

    #[test]
    fn test_snapshot_address() {
        let instance = Instance::builder()
            .instance_id("i-0game")
            .state(state(InstanceStateName::Running))
            .public_ip_address("203.0.113.7")
            .build();
        let snapshot = snapshot_of("i-0game", &instance);
        assert_eq!(snapshot.state, ResourceState::Running);
        assert_eq!(snapshot.public_address, Some("203.0.113.7".parse().unwrap()));

        let booting = Instance::builder()
            .instance_id("i-0game")
            .state(state(InstanceStateName::Pending))
            .build();
        assert_eq!(snapshot_of("i-0game", &booting).public_address, None);
    }

    #[test]
    fn test_error_classification() {
        assert!(matches!(
            classify("i-0bad", Some("InvalidInstanceID.NotFound"), "gone".into()),
            Error::ResourceNotFound(ref id) if id == "i-0bad"
        ));
        assert!(matches!(
            classify("i-0bad", Some("InvalidInstanceID.Malformed"), "bad".into()),
            Error::ResourceNotFound(_)
        ));
        assert!(matches!(
            classify("i-0game", Some("InvalidAllocationID.NotFound"), "x".into()),
            Error::InvalidInput(_)
        ));
        assert!(matches!(
            classify("i-0game", Some("UnauthorizedOperation"), "denied".into()),
            Error::ProviderUnavailable { .. }
        ));
        assert!(matches!(
            classify("i-0game", None, "dispatch failure".into()),
            Error::ProviderUnavailable { .. }
        ));
    }
}
