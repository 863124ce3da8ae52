//! Configuration structures.
//!
//! Configuration is loaded from a JSON config file and then overridden from
//! environment variables.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Global bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Automation engine endpoint configuration.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Completion endpoint used by locator resolution.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Instruction policy configuration.
    #[serde(default)]
    pub policy: PolicyConfig,
}

impl Config {
    /// Load configuration from a JSON file. Missing sections take defaults.
    pub fn from_file(path: impl AsRef<Path>) -> crate::types::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Apply `RULEBRIDGE_*` environment overrides.
    pub fn apply_env(mut self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok());
        self
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("RULEBRIDGE_ENGINE_URL") {
            self.engine.endpoint = v;
        }
        if let Some(v) = lookup("RULEBRIDGE_LLM_URL") {
            self.llm.endpoint = v;
        }
        if let Some(v) = lookup("RULEBRIDGE_LLM_API_KEY") {
            self.llm.api_key = v;
        }
        if let Some(v) = lookup("RULEBRIDGE_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = lookup("RULEBRIDGE_LOG_FORMAT") {
            self.observability.json_logs = v.eq_ignore_ascii_case("json");
        }
    }
}

/// Automation engine endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Full URL the automation model is POSTed to.
    pub endpoint: String,

    /// Optional per-request timeout. Unset means no deadline.
    #[serde(default, with = "humantime_serde")]
    pub request_timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:9000/api/v3/rhino/automation/invoke".to_string(),
            request_timeout: None,
        }
    }
}

/// Completion endpoint configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Chat-completions URL.
    pub endpoint: String,

    /// Bearer token sent with every completion request.
    #[serde(default)]
    pub api_key: String,

    /// Model name placed in the request body.
    pub model: String,

    /// Optional per-request timeout. Unset means no deadline.
    #[serde(default, with = "humantime_serde")]
    pub request_timeout: Option<Duration>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: String::new(),
            model: "gpt-4o".to_string(),
            request_timeout: None,
        }
    }
}

// Keeps the key out of logs.
impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "***" })
            .field("model", &self.model)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Tracing log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable JSON log formatting.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Instruction policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Policy returned when `get_instructions` is called without a name.
    pub default_policy: String,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            default_policy: "default".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_from_file_partial_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"engine": {{"endpoint": "http://engine:9000/invoke", "request_timeout": "30s"}}}}"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.engine.endpoint, "http://engine:9000/invoke");
        assert_eq!(config.engine.request_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.policy.default_policy, "default");
    }

    #[test]
    fn test_from_file_missing() {
        let err = Config::from_file("/nonexistent/rulebridge.json").unwrap_err();
        assert_eq!(err.to_error_code(), "INTERNAL");
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("RULEBRIDGE_LLM_API_KEY", "sk-test"),
            ("RULEBRIDGE_LLM_MODEL", "gpt-4o-mini"),
            ("RULEBRIDGE_LOG_FORMAT", "JSON"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.llm.api_key, "sk-test");
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert!(config.observability.json_logs);
        assert_eq!(config.engine.endpoint, EngineConfig::default().endpoint);
    }

    #[test]
    fn test_llm_debug_hides_key() {
        let config = LlmConfig {
            api_key: "sk-secret".to_string(),
            ..LlmConfig::default()
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("***"));
    }
}
