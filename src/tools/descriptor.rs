//! Tool descriptors and the plugin manifests they are derived from.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Type tag carried by every built-in descriptor.
pub const BUILTIN_TOOL_TYPE: &str = "builtin";

// =============================================================================
// Tool descriptor
// =============================================================================

/// Catalog entry for one callable tool.
///
/// Immutable once published in a registry snapshot; a resync replaces the
/// whole snapshot instead of editing entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub tool_type: String,
    pub input_schema: Value,
    pub output_schema: Value,
    /// Automation engine plugin the tool resolves to. Empty for built-ins
    /// that never reach the engine as a rule.
    pub engine_name: String,
}

// =============================================================================
// Plugin manifest
// =============================================================================

/// Externally registered automation action, as reported by the manifest source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginManifest {
    /// Unique engine key, e.g. `GoToUrl`.
    pub key: String,
    #[serde(rename = "type", default)]
    pub plugin_type: String,
    /// Explicit caller-facing name. Derived from `key` when absent.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "empty_object_schema")]
    pub input_schema: Value,
    #[serde(default = "empty_object_schema")]
    pub output_schema: Value,
}

impl PluginManifest {
    /// Caller-facing tool name for this manifest.
    pub fn tool_name(&self) -> String {
        match &self.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => to_snake_case(&self.key),
        }
    }

    pub fn to_descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.tool_name(),
            description: self.description.clone(),
            tool_type: self.plugin_type.clone(),
            input_schema: self.input_schema.clone(),
            output_schema: self.output_schema.clone(),
            engine_name: self.key.clone(),
        }
    }
}

pub(crate) fn empty_object_schema() -> Value {
    serde_json::json!({ "type": "object" })
}

/// `GoToUrl` → `go_to_url`, `ClickElement` → `click_element`.
fn to_snake_case(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut out = String::with_capacity(key.len() + 4);
    for (i, &ch) in chars.iter().enumerate() {
        if ch == '-' || ch == ' ' {
            if !out.ends_with('_') {
                out.push('_');
            }
            continue;
        }
        if ch.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).map_or(false, |c| c.is_lowercase());
            if (prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower))
                && !out.ends_with('_')
            {
                out.push('_');
            }
        }
        out.extend(ch.to_lowercase());
    }
    out
}
