//! Address polling
//!
//! The compute provider does not push address-assignment events, so after a
//! start the only way to learn the public address is to describe the
//! resource on a fixed cadence until it reports one. The loop is bounded by a
//! [`RetryBudget`] so a stuck or slow-booting resource cannot hold the
//! invocation forever.
//!
//! ```text
//! attempt 1 ── describe ── running + address? ── yes ──▶ Found
//!                 │              │
//!               error            no
//!                 └──── sleep(interval) ◀──┘
//! attempt 2 ── describe ── ...
//!   ...
//! attempt max ─ describe ── no ──▶ Exhausted
//! ```

use crate::config::PollConfig;
use crate::gateway::ProviderGateway;
use crate::traits::ResourceState;
use std::net::IpAddr;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Bounded polling state for one [`AddressPoller::await_address`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    /// Describe calls made so far
    pub attempts_made: u32,
    /// Describe calls allowed
    pub max_attempts: u32,
    /// Sleep between describe calls
    pub interval: Duration,
}

impl RetryBudget {
    /// Create a fresh budget
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            attempts_made: 0,
            max_attempts,
            interval,
        }
    }

    /// Whether another attempt is allowed
    pub fn has_remaining(&self) -> bool {
        self.attempts_made < self.max_attempts
    }

    /// Record one consumed attempt
    pub fn consume(&mut self) {
        self.attempts_made = self.attempts_made.saturating_add(1);
    }
}

impl From<PollConfig> for RetryBudget {
    fn from(config: PollConfig) -> Self {
        Self::new(config.max_attempts, config.interval())
    }
}

/// Result of a polling run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The resource is running with a routable address
    Found {
        /// Public address
        address: IpAddr,
        /// State observed together with the address
        state: ResourceState,
    },
    /// The budget ran out first
    Exhausted {
        /// Attempts consumed
        attempts: u32,
        /// Last state a successful describe reported, if any
        last_state: Option<ResourceState>,
    },
}

impl PollOutcome {
    /// The address, if one was found
    pub fn address(&self) -> Option<IpAddr> {
        match self {
            Self::Found { address, .. } => Some(*address),
            Self::Exhausted { .. } => None,
        }
    }

    /// Convert into a `Result`, mapping exhaustion to
    /// [`Error::AddressNotReady`](crate::Error::AddressNotReady)
    pub fn into_result(self, resource_id: &str) -> crate::Result<IpAddr> {
        match self {
            Self::Found { address, .. } => Ok(address),
            Self::Exhausted { attempts, .. } => {
                Err(crate::Error::address_not_ready(resource_id, attempts))
            }
        }
    }
}

/// Polls the gateway until the resource reports a routable address
#[derive(Debug, Clone)]
pub struct AddressPoller {
    gateway: ProviderGateway,
}

impl AddressPoller {
    /// Create a poller over the given gateway
    pub fn new(gateway: ProviderGateway) -> Self {
        Self { gateway }
    }

    /// Describe the resource until it is running with an address, or until
    /// the budget is exhausted
    ///
    /// A failed describe is logged and consumes an attempt; it never ends
    /// the loop early. The first describe happens immediately; later ones
    /// follow `budget.interval` after the previous one.
    pub async fn await_address(&self, resource_id: &str, mut budget: RetryBudget) -> PollOutcome {
        let mut last_state = None;

        while budget.has_remaining() {
            if budget.attempts_made > 0 && !budget.interval.is_zero() {
                tokio::time::sleep(budget.interval).await;
            }
            budget.consume();

            match self.gateway.describe(resource_id).await {
                Ok(snapshot) => {
                    last_state = Some(snapshot.state);
                    if let Some(address) = snapshot.routable_address() {
                        info!(
                            "Resource {} reachable at {} (attempt {}/{})",
                            resource_id, address, budget.attempts_made, budget.max_attempts
                        );
                        return PollOutcome::Found {
                            address,
                            state: snapshot.state,
                        };
                    }
                    debug!(
                        "Waiting for public address of {} (state: {}, attempt {}/{})",
                        resource_id, snapshot.state, budget.attempts_made, budget.max_attempts
                    );
                }
                Err(e) => {
                    warn!(
                        "Describe attempt {}/{} failed for {}: {}",
                        budget.attempts_made, budget.max_attempts, resource_id, e
                    );
                }
            }
        }

        warn!(
            "No public address for {} after {} attempt(s)",
            resource_id, budget.attempts_made
        );
        PollOutcome::Exhausted {
            attempts: budget.attempts_made,
            last_state,
        }
    }
}
