//! Built-in tools: fixed catalog entries handled by the bridge itself.
//!
//! The catalog is an explicit list of `(name, constructor)` pairs; there is no
//! runtime discovery. Argument structs double as the source of each tool's
//! input schema and as the shape the dispatcher parses arguments into.

use crate::dom::DomSnapshot;
use crate::engine::SessionOutcome;
use crate::policy::PolicyPayload;
use crate::tools::descriptor::{ToolDescriptor, BUILTIN_TOOL_TYPE};
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// Argument shapes
// =============================================================================

/// Arguments of `find_tool`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct FindToolArgs {
    /// Name of the tool to look up (case-insensitive).
    #[serde(default)]
    pub tool_name: String,
}

/// Session correlation carried by every engine-backed call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SessionArgs {
    /// Driver session returned by a previous `start_session` or `start_rule`.
    #[serde(
        rename = "driverSession",
        alias = "driver_session",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub driver_session: Option<String>,
    /// Engine access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Arguments of `resolve_locator`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ResolveLocatorArgs {
    #[serde(flatten)]
    pub session: SessionArgs,
    /// What the caller wants to interact with, in plain words.
    #[serde(default)]
    pub intent: String,
}

/// Arguments of `get_instructions`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct InstructionsArgs {
    /// Policy name; the configured default policy when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
}

/// Arguments of `get_tools`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct GetToolsArgs {
    /// Only return tools of these types. Empty returns the whole catalog.
    #[serde(default)]
    pub types: Vec<String>,
}

/// Arguments of `start_session`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct StartSessionArgs {
    #[serde(flatten)]
    pub session: SessionArgs,
    /// Driver selection and capabilities forwarded to the engine.
    #[serde(
        rename = "driverParameters",
        alias = "driver_parameters",
        default
    )]
    pub driver_parameters: Map<String, Value>,
}

/// Rule section of a `start_rule` (or any plugin tool) invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RuleArgs {
    /// Tool whose engine plugin executes the rule.
    #[serde(default)]
    pub tool_name: String,
    /// Plugin parameters, rendered into the rule's argument template.
    #[serde(default)]
    pub parameters: Map<String, Value>,
    /// Extra rule fields (locator, onElement, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
}

/// Arguments of `start_rule`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct StartRuleArgs {
    #[serde(flatten)]
    pub session: SessionArgs,
    #[serde(default)]
    pub rule: RuleArgs,
    #[serde(
        rename = "driverParameters",
        alias = "driver_parameters",
        default
    )]
    pub driver_parameters: Map<String, Value>,
}

// =============================================================================
// Built-in identity
// =============================================================================

/// Closed set of tools the dispatcher handles without a generic rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinTool {
    FindTool,
    GetApplicationDom,
    GetInstructions,
    ResolveLocator,
    GetTools,
    StartSession,
    StartRule,
}

impl BuiltinTool {
    pub const ALL: [BuiltinTool; 7] = [
        BuiltinTool::FindTool,
        BuiltinTool::GetApplicationDom,
        BuiltinTool::GetInstructions,
        BuiltinTool::ResolveLocator,
        BuiltinTool::GetTools,
        BuiltinTool::StartSession,
        BuiltinTool::StartRule,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BuiltinTool::FindTool => "find_tool",
            BuiltinTool::GetApplicationDom => "get_application_dom",
            BuiltinTool::GetInstructions => "get_instructions",
            BuiltinTool::ResolveLocator => "resolve_locator",
            BuiltinTool::GetTools => "get_tools",
            BuiltinTool::StartSession => "start_session",
            BuiltinTool::StartRule => "start_rule",
        }
    }

    /// Case-insensitive match against the built-in names.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|tool| tool.name().eq_ignore_ascii_case(name))
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// The fixed built-in catalog.
pub const BUILTINS: &[(&str, fn() -> ToolDescriptor)] = &[
    ("find_tool", find_tool),
    ("get_application_dom", get_application_dom),
    ("get_instructions", get_instructions),
    ("resolve_locator", resolve_locator),
    ("get_tools", get_tools),
    ("start_session", start_session),
    ("start_rule", start_rule),
];

/// Construct every built-in descriptor.
pub fn builtin_descriptors() -> Vec<ToolDescriptor> {
    BUILTINS.iter().map(|(_, build)| build()).collect()
}

fn schema_of<T: JsonSchema>() -> Value {
    serde_json::to_value(schema_for!(T))
        .unwrap_or_else(|_| crate::tools::descriptor::empty_object_schema())
}

fn builtin(
    tool: BuiltinTool,
    description: &str,
    input_schema: Value,
    output_schema: Value,
) -> ToolDescriptor {
    ToolDescriptor {
        name: tool.name().to_string(),
        description: description.to_string(),
        tool_type: BUILTIN_TOOL_TYPE.to_string(),
        input_schema,
        output_schema,
        engine_name: String::new(),
    }
}

fn find_tool() -> ToolDescriptor {
    builtin(
        BuiltinTool::FindTool,
        "Look up one tool by name and return its descriptor, or null when it does not exist.",
        schema_of::<FindToolArgs>(),
        schema_of::<Option<ToolDescriptor>>(),
    )
}

fn get_application_dom() -> ToolDescriptor {
    builtin(
        BuiltinTool::GetApplicationDom,
        "Return the sanitized HTML of the page open in a driver session.",
        schema_of::<SessionArgs>(),
        schema_of::<DomSnapshot>(),
    )
}

fn get_instructions() -> ToolDescriptor {
    builtin(
        BuiltinTool::GetInstructions,
        "Return the instruction policy: defaults, guards and rules to apply to the next tool calls.",
        schema_of::<InstructionsArgs>(),
        schema_of::<PolicyPayload>(),
    )
}

fn resolve_locator() -> ToolDescriptor {
    builtin(
        BuiltinTool::ResolveLocator,
        "Resolve an element locator for an intent using the live DOM of a driver session.",
        schema_of::<ResolveLocatorArgs>(),
        serde_json::json!({ "type": "string" }),
    )
}

fn get_tools() -> ToolDescriptor {
    builtin(
        BuiltinTool::GetTools,
        "List the tool catalog, optionally filtered by tool type.",
        schema_of::<GetToolsArgs>(),
        schema_of::<Vec<ToolDescriptor>>(),
    )
}

fn start_session() -> ToolDescriptor {
    builtin(
        BuiltinTool::StartSession,
        "Open a new driver session and return its identifier.",
        schema_of::<StartSessionArgs>(),
        schema_of::<SessionOutcome>(),
    )
}

fn start_rule() -> ToolDescriptor {
    builtin(
        BuiltinTool::StartRule,
        "Execute one automation rule against a driver session.",
        schema_of::<StartRuleArgs>(),
        schema_of::<SessionOutcome>(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_names_match_enum() {
        assert_eq!(BUILTINS.len(), BuiltinTool::ALL.len());
        for (name, build) in BUILTINS {
            let descriptor = build();
            assert_eq!(&descriptor.name, name);
            assert_eq!(descriptor.tool_type, BUILTIN_TOOL_TYPE);
            assert!(BuiltinTool::from_name(name).is_some());
        }
    }

    #[test]
    fn test_from_name_case_insensitive() {
        assert_eq!(BuiltinTool::from_name("Find_Tool"), Some(BuiltinTool::FindTool));
        assert_eq!(BuiltinTool::from_name("GET_TOOLS"), Some(BuiltinTool::GetTools));
        assert_eq!(BuiltinTool::from_name("click_element"), None);
    }

    #[test]
    fn test_input_schema_lists_properties() {
        let descriptor = find_tool();
        assert!(descriptor.input_schema["properties"]["tool_name"].is_object());

        let descriptor = resolve_locator();
        let props = &descriptor.input_schema["properties"];
        assert!(props["driverSession"].is_object());
        assert!(props["intent"].is_object());
    }

    #[test]
    fn test_session_args_accept_snake_alias() {
        let args: SessionArgs =
            serde_json::from_value(serde_json::json!({"driver_session": "S1", "token": "T1"}))
                .unwrap();
        assert_eq!(args.driver_session.as_deref(), Some("S1"));
        assert_eq!(args.token.as_deref(), Some("T1"));
    }
}
