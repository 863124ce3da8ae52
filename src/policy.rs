//! Instruction policies: static guidance returned by `get_instructions`.
//!
//! Pure data: no I/O, safe to call from any number of invocations at once.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name of the built-in policy.
pub const DEFAULT_POLICY: &str = "default";

/// Current version of the policy payload layout.
pub const POLICY_VERSION: &str = "1.0";

/// Guidance a caller applies to its next tool calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PolicyPayload {
    pub policy: String,
    pub version: String,
    /// Values to merge into the next tool call's arguments when absent.
    pub defaults: Map<String, Value>,
    /// Preconditions that must hold before calling engine-backed tools.
    pub guards: Vec<String>,
    /// Non-negotiable rules.
    pub must: Vec<String>,
    /// Seconds after which the payload must be fetched again.
    pub ttl_seconds: u64,
}

/// Policy payload for `policy_name`. Unknown names get the default policy.
pub fn get_instructions(policy_name: &str) -> PolicyPayload {
    let name = policy_name.trim();
    if !name.is_empty() && !name.eq_ignore_ascii_case(DEFAULT_POLICY) {
        tracing::debug!(policy = name, "Unknown instruction policy; serving default");
    }
    default_policy()
}

fn default_policy() -> PolicyPayload {
    let defaults = serde_json::json!({
        "rule": {
            "properties": {
                "locator": "CssSelector"
            }
        },
        "driverParameters": {
            "driver": "ChromeDriver",
            "capabilities": {}
        }
    });

    PolicyPayload {
        policy: DEFAULT_POLICY.to_string(),
        version: POLICY_VERSION.to_string(),
        defaults: defaults.as_object().cloned().unwrap_or_default(),
        guards: vec![
            "A driverSession returned by start_session exists before any rule, DOM or locator call.".to_string(),
            "The target tool exists in the catalog (find_tool or get_tools) before it is used in a rule.".to_string(),
            "An element locator was resolved (resolve_locator) before a rule acts on that element.".to_string(),
        ],
        must: vec![
            "Pass the driverSession and token returned by the previous call unchanged.".to_string(),
            "Never invent tool names, parameters or selectors.".to_string(),
            "Put plugin arguments under rule.parameters and rule fields under rule.properties.".to_string(),
            "Treat an empty sessionId in a result as a failed call.".to_string(),
        ],
        ttl_seconds: 900,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_contents() {
        let payload = get_instructions(DEFAULT_POLICY);
        assert_eq!(payload.policy, "default");
        assert_eq!(payload.version, POLICY_VERSION);
        assert!(payload.ttl_seconds > 0);
        assert!(!payload.guards.is_empty());
        assert!(!payload.must.is_empty());
        assert_eq!(payload.defaults["rule"]["properties"]["locator"], "CssSelector");
    }

    #[test]
    fn test_unknown_and_empty_names_fall_back() {
        assert_eq!(get_instructions("nope"), get_instructions(DEFAULT_POLICY));
        assert_eq!(get_instructions(""), get_instructions(DEFAULT_POLICY));
    }

    #[test]
    fn test_payload_wire_names() {
        let value = serde_json::to_value(get_instructions("default")).unwrap();
        assert!(value.get("ttlSeconds").is_some());
        assert!(value.get("must").is_some());
    }
}
