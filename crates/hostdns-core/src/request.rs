//! Request and response mapping for invocation harnesses
//!
//! A harness (HTTP server, function runtime) receives two optional string
//! parameters and hands back a status code with a body. This module keeps
//! that mapping out of the harness so every harness answers the same way.
//!
//! | Parameter | Missing or empty | Unknown value         |
//! |-----------|------------------|-----------------------|
//! | `action`  | `stop`           | `stop`                |
//! | `target`  | default target   | `InvalidInput` (500)  |
//!
//! `machine` is accepted as an alias for `target`. When both are given,
//! `target` wins.

use crate::config::HostDnsConfig;
use crate::controller::{Action, ActionResult};
use crate::error::Result;
use serde::Deserialize;
use std::collections::HashMap;

/// Raw invocation parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ControlRequest {
    /// "start" or "stop"
    #[serde(default)]
    pub action: Option<String>,

    /// Configured target name
    #[serde(default, alias = "machine")]
    pub target: Option<String>,
}

impl ControlRequest {
    /// Create a request
    pub fn new(action: Option<&str>, target: Option<&str>) -> Self {
        Self {
            action: action.map(str::to_string),
            target: target.map(str::to_string),
        }
    }

    /// Build a request from raw query parameters
    ///
    /// Keys other than `action`, `target` and `machine` are ignored.
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        Self {
            action: params.get("action").cloned(),
            target: params.get("target").or_else(|| params.get("machine")).cloned(),
        }
    }

    /// Resolve the parameters against the configuration
    ///
    /// # Returns
    ///
    /// - `Ok((Action, resource_id))`: What to do and to which resource
    /// - `Err(Error::InvalidInput)`: Unknown target
    pub fn resolve<'a>(&self, config: &'a HostDnsConfig) -> Result<(Action, &'a str)> {
        let action = self
            .action
            .as_deref()
            .map(Action::from_param)
            .unwrap_or_default();
        let resource_id = config.resource_id(self.target.as_deref().map(str::trim))?;

        Ok((action, resource_id))
    }
}

/// Harness-neutral response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlResponse {
    /// HTTP-style status code
    pub status: u16,
    /// JSON result on success, error text on failure
    pub body: String,
}

impl ControlResponse {
    /// Status for a completed action
    pub const OK: u16 = 200;
    /// Status for any failure
    pub const INTERNAL_ERROR: u16 = 500;

    /// Map an orchestration outcome
    pub fn from_outcome(outcome: Result<ActionResult>) -> Self {
        match outcome.and_then(|result| Ok(serde_json::to_string(&result)?)) {
            Ok(body) => Self {
                status: Self::OK,
                body,
            },
            Err(e) => Self {
                status: Self::INTERNAL_ERROR,
                body: e.to_string(),
            },
        }
    }

    /// Whether the action completed
    pub fn is_success(&self) -> bool {
        self.status == Self::OK
    }

    /// Content type of `body`
    pub fn content_type(&self) -> &'static str {
        if self.is_success() {
            "application/json"
        } else {
            "text/plain; charset=utf-8"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::config::ProviderConfig;
    use crate::traits::ResourceState;

    fn config() -> HostDnsConfig {
        HostDnsConfig::new(ProviderConfig::Memory, "game", "i-game", "game.example.com")
            .with_target("development", "i-dev")
    }

    #[test]
    fn test_defaults() {
        let config = config();
        let (action, id) = ControlRequest::default().resolve(&config).unwrap();
        assert_eq!(action, Action::Stop);
        assert_eq!(id, "i-game");

        let (action, id) = ControlRequest::new(Some(""), Some(""))
            .resolve(&config)
            .unwrap();
        assert_eq!(action, Action::Stop);
        assert_eq!(id, "i-game");
    }

    #[test]
    fn test_named_target() {
        let config = config();
        let (action, id) = ControlRequest::new(Some("Start"), Some("development"))
            .resolve(&config)
            .unwrap();
        assert_eq!(action, Action::Start);
        assert_eq!(id, "i-dev");
    }

    #[test]
    fn test_unknown_action_stops() {
        let config = config();
        let (action, id) = ControlRequest::new(Some("reboot"), None)
            .resolve(&config)
            .unwrap();
        assert_eq!(action, Action::Stop);
        assert_eq!(id, "i-game");
    }

    #[test]
    fn test_unknown_target_is_rejected() {
        let config = config();
        let err = ControlRequest::new(Some("start"), Some("staging"))
            .resolve(&config)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_machine_alias() {
        let request: ControlRequest =
            serde_json::from_str(r#"{"action":"start","machine":"development"}"#).unwrap();
        assert_eq!(request, ControlRequest::new(Some("start"), Some("development")));
    }

    #[test]
    fn test_from_params_prefers_target() {
        let params: HashMap<String, String> = [
            ("action", "start"),
            ("machine", "game"),
            ("target", "development"),
            ("region", "eu-west-1"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        assert_eq!(
            ControlRequest::from_params(&params),
            ControlRequest::new(Some("start"), Some("development"))
        );

        let params = HashMap::from([("machine".to_string(), "development".to_string())]);
        assert_eq!(
            ControlRequest::from_params(&params),
            ControlRequest::new(None, Some("development"))
        );
        assert_eq!(
            ControlRequest::from_params(&HashMap::new()),
            ControlRequest::default()
        );
    }

    #[test]
    fn test_response_mapping() {
        let ok = ControlResponse::from_outcome(Ok(ActionResult {
            previous_state: ResourceState::Running,
            current_state: ResourceState::Stopped,
            bound_address: None,
        }));
        assert!(ok.is_success());
        assert_eq!(ok.body, r#"{"prev":"running","cur":"stopped","ip":""}"#);
        assert_eq!(ok.content_type(), "application/json");

        let failed = ControlResponse::from_outcome(Err(Error::resource_not_found("i-404")));
        assert_eq!(failed.status, 500);
        assert_eq!(failed.body, "Resource not found: i-404");
        assert!(failed.content_type().starts_with("text/plain"));
    }
}
