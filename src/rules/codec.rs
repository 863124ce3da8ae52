//! Argument codec: JSON tool arguments to templated engine rules.
//!
//! Parameters render as `--Key:Value` tokens wrapped in `{{$ ... }}`:
//! ```text
//! {"driver_session": "S1", "tags": ["a", "b"], "force": true}
//!   → {{$ --DriverSession:S1 --Tags:a --Tags:b --Force}}
//! ```

use crate::rules::model::RuleModel;
use crate::tools::RegistrySnapshot;
use crate::types::Result;
use serde_json::{Map, Value};

/// Wrapper produced for a parameter object with no renderable values.
pub const EMPTY_TEMPLATE: &str = "{{$ }}";

// =============================================================================
// Parameter formatting
// =============================================================================

/// Render a parameters object into an argument template.
///
/// Returns the empty string for non-objects and for objects that yield no
/// tokens. Key order follows the input object.
pub fn format_parameters(parameters: &Value) -> String {
    let Some(map) = parameters.as_object() else {
        return String::new();
    };

    let mut tokens: Vec<String> = Vec::with_capacity(map.len());
    for (key, value) in map {
        push_tokens(&mut tokens, &normalize_key(key), value);
    }

    if tokens.is_empty() {
        return String::new();
    }
    format!("{{{{$ {}}}}}", tokens.join(" "))
}

fn push_tokens(tokens: &mut Vec<String>, key: &str, value: &Value) {
    match value {
        Value::Array(items) => {
            tokens.extend(
                items
                    .iter()
                    .filter_map(scalar_text)
                    .map(|text| format!("--{}:{}", key, text)),
            );
        }
        Value::Object(entries) => {
            tokens.extend(entries.iter().filter_map(|(sub_key, sub_value)| {
                scalar_text(sub_value).map(|text| format!("--{}:{}={}", key, sub_key, text))
            }));
        }
        // Switch parameters: bare flag when set, absent otherwise.
        Value::Bool(true) => tokens.push(format!("--{}", key)),
        Value::Bool(false) | Value::Null => {}
        scalar => {
            if let Some(text) = scalar_text(scalar) {
                tokens.push(format!("--{}:{}", key, text));
            }
        }
    }
}

/// Text of a value inside a token; `None` for null and empty strings.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        nested => Some(nested.to_string()),
    }
}

/// `driver_session` → `DriverSession`, `onElement` → `OnElement`.
fn normalize_key(key: &str) -> String {
    key.split(|c: char| c == '_' || c == '-' || c == ' ')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

// =============================================================================
// Rule conversion
// =============================================================================

/// Build a rule from invocation arguments of the form
/// `{rule: {tool_name, parameters, properties}}`.
///
/// An unknown `tool_name` yields an empty `engine_name` rather than an error;
/// the engine reports the missing plugin when the rule executes. Only a
/// `properties` value that cannot be read as a rule fails here.
pub fn convert_to_rule(arguments: &Value, registry: &RegistrySnapshot) -> Result<RuleModel> {
    let empty = Value::Object(Map::new());
    let rule = arguments.get("rule").unwrap_or(&empty);

    let tool_name = rule.get("tool_name").and_then(Value::as_str).unwrap_or("");
    let engine_name = registry
        .lookup(tool_name)
        .map(|descriptor| descriptor.engine_name.clone())
        .unwrap_or_default();

    let template = format_parameters(rule.get("parameters").unwrap_or(&empty));

    let properties = match rule.get("properties") {
        Some(properties) if !properties.is_null() => properties.clone(),
        _ => serde_json::json!({ "tool_name": engine_name }),
    };
    let mut model: RuleModel = serde_json::from_value(properties)?;

    model.engine_name = engine_name;
    if !template.is_empty() && template != EMPTY_TEMPLATE {
        model.argument_template = template;
    }

    if model.engine_name.is_empty() {
        tracing::debug!(tool_name, "Rule tool did not resolve to an engine plugin");
    }
    Ok(model)
}

// =============================================================================
// Tests
// =============================================================================
