//! Lifecycle controller
//!
//! The [`LifecycleController`] turns a start or stop intent into a sequence
//! of provider calls and assembles the [`ActionResult`].
//!
//! ## Start
//!
//! ```text
//! change_state(start) ──▶ [associate static address] ──▶ await_address
//!        │ error                                            │
//!        ▼                                         Found ───┴─── Exhausted
//!      fatal                                        │               │
//!                                                 bind        result, no ip
//!                                                   │
//!                                           result with ip
//! ```
//!
//! ## Stop
//!
//! ```text
//! describe ──▶ unbind(last known address) ──▶ change_state(stop) ──▶ result
//!  (best effort)      (best effort)                 │ error
//!                                                   ▼
//!                                                 fatal
//! ```
//!
//! ## Failure policy
//!
//! - A failed state change is always fatal, and no DNS change is made after it.
//! - Running out of poll budget is not fatal: the result reports the state and
//!   no bound address.
//! - A failed bind during start is fatal: the resource is running but the
//!   hostname does not resolve to it, and the caller has to know.
//! - A failed unbind during stop is logged; the resource is stopped anyway.

use crate::binder::DnsBinder;
use crate::config::HostDnsConfig;
use crate::error::{Error, Result};
use crate::gateway::ProviderGateway;
use crate::poller::{AddressPoller, PollOutcome, RetryBudget};
use crate::request::{ControlRequest, ControlResponse};
use crate::traits::{DesiredState, ResourceState};
use serde::{Serialize, Serializer};
use std::fmt;
use std::net::IpAddr;
use tracing::{debug, error, info, warn};

/// Requested lifecycle action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    /// Start the resource and bind its address
    Start,
    /// Unbind the address and stop the resource (default)
    #[default]
    Stop,
}

impl Action {
    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Stop => "stop",
        }
    }

    /// Map a request's `action` parameter
    ///
    /// Only `start` starts. Anything else, including a value this
    /// version does not know, stops the resource.
    pub fn from_param(param: &str) -> Self {
        match param.trim().to_ascii_lowercase().as_str() {
            "start" => Action::Start,
            "" | "stop" => Action::Stop,
            other => {
                warn!("Unknown action '{}', stopping instead", other);
                Action::Stop
            }
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one orchestration run
///
/// Serializes as `{"prev": "...", "cur": "...", "ip": "..."}` with an empty
/// `ip` when nothing is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActionResult {
    /// State before the action
    #[serde(rename = "prev")]
    pub previous_state: ResourceState,
    /// Best-known state after the action
    #[serde(rename = "cur")]
    pub current_state: ResourceState,
    /// Address published under the managed hostname
    #[serde(rename = "ip", serialize_with = "address_or_empty")]
    pub bound_address: Option<IpAddr>,
}

fn address_or_empty<S: Serializer>(
    address: &Option<IpAddr>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match address {
        Some(address) => serializer.collect_str(address),
        None => serializer.serialize_str(""),
    }
}

/// Top-level start/stop orchestrator
#[derive(Debug, Clone)]
pub struct LifecycleController {
    config: HostDnsConfig,
    gateway: ProviderGateway,
    poller: AddressPoller,
    binder: DnsBinder,
}

impl LifecycleController {
    /// Create a controller
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if the configuration does not validate.
    pub fn new(config: HostDnsConfig, gateway: ProviderGateway) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            poller: AddressPoller::new(gateway.clone()),
            binder: DnsBinder::new(gateway.clone()),
            gateway,
            config,
        })
    }

    /// The configuration this controller was built with
    pub fn config(&self) -> &HostDnsConfig {
        &self.config
    }

    /// Resolve and run a control request, producing the response the
    /// harness returns
    pub async fn handle(&self, request: &ControlRequest) -> ControlResponse {
        let outcome = match request.resolve(&self.config) {
            Ok((action, resource_id)) => self.execute(action, resource_id).await,
            Err(e) => {
                warn!("Rejected request {:?}: {}", request, e);
                Err(e)
            }
        };

        ControlResponse::from_outcome(outcome)
    }

    /// Run an action against a resource
    pub async fn execute(&self, action: Action, resource_id: &str) -> Result<ActionResult> {
        info!("Executing {} for {}", action, resource_id);

        let outcome = match action {
            Action::Start => self.start(resource_id).await,
            Action::Stop => self.stop(resource_id).await,
        };

        match &outcome {
            Ok(result) => info!(
                "{} {} finished: {} -> {} (ip: {})",
                action,
                resource_id,
                result.previous_state,
                result.current_state,
                result
                    .bound_address
                    .map(|a| a.to_string())
                    .unwrap_or_default()
            ),
            Err(e) => error!("{} {} failed: {}", action, resource_id, e),
        }

        outcome
    }

    /// Start the resource and bind its address to the managed hostname
    pub async fn start(&self, resource_id: &str) -> Result<ActionResult> {
        let transition = self
            .gateway
            .change_state(resource_id, DesiredState::Running)
            .await?;
        debug!(
            "Start accepted for {}: {} -> {}",
            resource_id, transition.previous, transition.current
        );

        if let Some(ref allocation_id) = self.config.elastic_ip_allocation_id
            && let Err(e) = self
                .gateway
                .associate_address(resource_id, allocation_id)
                .await
        {
            warn!(
                "Failed to associate allocation {} with {}: {}",
                allocation_id, resource_id, e
            );
        }

        let budget = RetryBudget::from(self.config.poll);
        match self.poller.await_address(resource_id, budget).await {
            PollOutcome::Found { address, state } => {
                let record = &self.config.record;
                self.binder.bind(&record.hostname, address, record.ttl).await?;

                Ok(ActionResult {
                    previous_state: transition.previous,
                    current_state: state,
                    bound_address: Some(address),
                })
            }
            PollOutcome::Exhausted {
                attempts,
                last_state,
            } => {
                warn!(
                    "{}; leaving {} unbound",
                    Error::address_not_ready(resource_id, attempts),
                    self.config.record.hostname
                );

                Ok(ActionResult {
                    previous_state: transition.previous,
                    current_state: last_state.unwrap_or(transition.current),
                    bound_address: None,
                })
            }
        }
    }

    /// Remove the hostname binding and stop the resource
    pub async fn stop(&self, resource_id: &str) -> Result<ActionResult> {
        let hostname = &self.config.record.hostname;

        let last_known = match self.gateway.describe(resource_id).await {
            Ok(snapshot) => snapshot.public_address,
            Err(e) => {
                warn!("Could not look up address of {} before stop: {}", resource_id, e);
                None
            }
        };

        match last_known {
            Some(address) => {
                if let Err(e) = self.binder.unbind(hostname, address).await {
                    warn!("Continuing with stop of {} after failed unbind: {}", resource_id, e);
                }
            }
            None => debug!("No known address for {}, skipping unbind", resource_id),
        }

        let transition = self
            .gateway
            .change_state(resource_id, DesiredState::Stopped)
            .await?;

        Ok(ActionResult {
            previous_state: transition.previous,
            current_state: transition.current,
            bound_address: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_parsing() {
        assert_eq!(Action::from_param("start"), Action::Start);
        assert_eq!(Action::from_param(" STOP "), Action::Stop);
        assert_eq!(Action::from_param("restart"), Action::Stop);
        assert_eq!(Action::from_param(""), Action::Stop);
        assert_eq!(Action::default(), Action::Stop);
    }

    #[test]
    fn test_result_wire_format() {
        let bound = ActionResult {
            previous_state: ResourceState::Stopped,
            current_state: ResourceState::Running,
            bound_address: Some("203.0.113.7".parse().unwrap()),
        };
        assert_eq!(
            serde_json::to_value(bound).unwrap(),
            serde_json::json!({ "prev": "stopped", "cur": "running", "ip": "203.0.113.7" })
        );

        let unbound = ActionResult {
            previous_state: ResourceState::Running,
            current_state: ResourceState::Stopping,
            bound_address: None,
        };
        assert_eq!(
            serde_json::to_string(&unbound).unwrap(),
            r#"{"prev":"running","cur":"stopping","ip":""}"#
        );
    }
}
