//! Automation engine contract: the opaque RPC dependency rules execute on.
//!
//! The engine answers an [`AutomationModel`] with a mapping of response
//! bundles, each carrying a mapping of sessions. The bridge always reads the
//! *last* session of the *last* bundle: one invocation drives one session.

pub mod http;

pub use http::HttpEngine;

use crate::rules::RuleModel;
use crate::types::Result;
use async_trait::async_trait;
use base64::Engine as _;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// Request
// =============================================================================

/// One engine invocation: the rules to run and the session to run them in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_session: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub driver_parameters: Map<String, Value>,
    #[serde(default)]
    pub rules: Vec<RuleModel>,
}

// =============================================================================
// Response
// =============================================================================

/// Engine response: bundle id → bundle, in the order the engine sent them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AutomationResponse(pub Map<String, Value>);

#[derive(Debug, Deserialize)]
struct ResponseBundle {
    #[serde(default, alias = "Sessions")]
    sessions: Map<String, Value>,
}

impl AutomationResponse {
    /// Last session of the last bundle, if the engine returned any.
    pub fn last_session(&self) -> Result<Option<(String, SessionState)>> {
        let Some(bundle) = self.0.values().last() else {
            return Ok(None);
        };
        let bundle: ResponseBundle = serde_json::from_value(bundle.clone())?;
        match bundle.sessions.into_iter().last() {
            Some((session_id, state)) => Ok(Some((session_id, serde_json::from_value(state)?))),
            None => Ok(None),
        }
    }
}

/// Engine-side state of one driver session. Fields the bridge does not read
/// are preserved in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    #[serde(default, alias = "ResponseTree")]
    pub response_tree: ResponseTree,
    #[serde(default, alias = "Environment")]
    pub environment: Environment,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SessionState {
    /// Result of the last plugin of the last job of the last stage.
    pub fn last_plugin(&self) -> Option<&Value> {
        self.response_tree
            .stages
            .last()?
            .jobs
            .last()?
            .plugins
            .last()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseTree {
    #[serde(default, alias = "Stages")]
    pub stages: Vec<Stage>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    #[serde(default, alias = "Jobs")]
    pub jobs: Vec<Job>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(default, alias = "Plugins")]
    pub plugins: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    #[serde(default, alias = "SessionParameters")]
    pub session_parameters: SessionParameters,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Session-scoped key/value store. String payloads are base64 by convention.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionParameters(pub Map<String, Value>);

impl SessionParameters {
    /// Raw value of `key` as text, or `default` when absent.
    pub fn get(&self, key: &str, default: &str) -> String {
        match self.0.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => default.to_string(),
            Some(other) => other.to_string(),
        }
    }

    /// Base64-decoded value of `key`, `None` when absent.
    pub fn get_decoded(&self, key: &str) -> Result<Option<String>> {
        let Some(Value::String(encoded)) = self.0.get(key) else {
            return Ok(None);
        };
        let bytes = base64::engine::general_purpose::STANDARD.decode(encoded.trim())?;
        Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
    }
}

/// What an engine-backed tool returns to the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionOutcome {
    pub session_id: String,
    pub value: Value,
}

// =============================================================================
// Engine trait
// =============================================================================

/// Executes automation models. Implementations perform network I/O and must
/// be cancel-safe: dropping the future abandons the outbound request.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AutomationEngine: Send + Sync {
    async fn invoke(&self, model: &AutomationModel) -> Result<AutomationResponse>;
}
