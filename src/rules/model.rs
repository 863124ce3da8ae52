//! Rule model: the automation engine's unit of executable action.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One engine rule.
///
/// `engine_name` and `argument_template` are the fields the bridge computes;
/// everything else the caller supplied rides along in `properties`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleModel {
    #[serde(default, alias = "pluginName")]
    pub engine_name: String,

    #[serde(default, alias = "argument")]
    pub argument_template: String,

    /// Child rules, executed by the engine in the scope of this one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<RuleModel>,

    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl RuleModel {
    pub fn new(engine_name: impl Into<String>, argument_template: impl Into<String>) -> Self {
        Self {
            engine_name: engine_name.into(),
            argument_template: argument_template.into(),
            ..Self::default()
        }
    }

    /// Append a child rule.
    pub fn with_rule(mut self, rule: RuleModel) -> Self {
        self.rules.push(rule);
        self
    }
}
