//! DOM accessor: pulls the live page markup out of a driver session.
//!
//! The engine runs a script that reads `document.body.outerHTML` and keeps the
//! result in a session parameter (base64, by engine convention). The bridge
//! decodes it and strips noise elements before handing it to callers.

use crate::engine::{AutomationEngine, AutomationModel};
use crate::rules::RuleModel;
use crate::types::Result;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Session parameter the page markup is registered under.
pub const DOM_PARAMETER: &str = "ApplicationDom";
/// Script evaluated in the page.
pub const DOM_SCRIPT: &str = "return document.body.outerHTML;";
/// Returned when the engine reports no markup.
pub const EMPTY_HTML: &str = "<html></html>";

/// Elements removed wholesale, content included. Containers come first so
/// noise nested inside them goes with its parent.
const NOISE_ELEMENTS: &[&str] = &[
    "template", "svg", "noscript", "iframe", "canvas", "script", "style",
];

/// Sanitized markup of one driver session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DomSnapshot {
    pub session_id: String,
    pub html: String,
}

/// Rule that stores the page markup in a session-scoped parameter.
pub fn dom_rule() -> RuleModel {
    RuleModel::new(
        "RegisterParameter",
        format!("{{{{$ --Name:{} --Scope:Session}}}}", DOM_PARAMETER),
    )
    .with_rule(RuleModel::new("ExecuteScript", DOM_SCRIPT))
}

/// Fetch and sanitize the DOM of `driver_session`.
pub async fn get_application_dom(
    engine: &dyn AutomationEngine,
    driver_session: Option<&str>,
    token: Option<&str>,
) -> Result<DomSnapshot> {
    let model = AutomationModel {
        driver_session: driver_session.map(str::to_string),
        token: token.map(str::to_string),
        rules: vec![dom_rule()],
        ..AutomationModel::default()
    };

    let response = engine.invoke(&model).await?;

    let Some((session_id, state)) = response.last_session()? else {
        tracing::warn!("Engine returned no session for DOM retrieval");
        return Ok(DomSnapshot {
            session_id: driver_session.unwrap_or_default().to_string(),
            html: EMPTY_HTML.to_string(),
        });
    };

    let raw = state
        .environment
        .session_parameters
        .get_decoded(DOM_PARAMETER)?
        .unwrap_or_else(|| EMPTY_HTML.to_string());
    let html = clean_html(&raw);
    tracing::debug!(
        session_id = %session_id,
        raw_bytes = raw.len(),
        clean_bytes = html.len(),
        "Fetched application DOM"
    );

    Ok(DomSnapshot { session_id, html })
}

// =============================================================================
// Sanitation
// =============================================================================

/// Ordered `(pattern, replacement)` passes of the clean transform.
fn sanitation_passes() -> &'static [(Regex, &'static str)] {
    static PASSES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    PASSES.get_or_init(|| {
        // Tag names end at whitespace, `/` or `>`; `<svg-icon>` is not `<svg>`.
        let mut sources: Vec<(String, &'static str)> = vec![(r"(?s)<!--.*?-->".to_string(), "")];
        for tag in NOISE_ELEMENTS {
            sources.push((format!(r"(?is)<{tag}(?:\s[^>]*)?/>"), ""));
            sources.push((format!(r"(?is)<{tag}(?:\s[^>]*)?>.*?</{tag}\s*>"), ""));
        }
        sources.push((r"(?i)<(?:link|meta|base)(?:\s[^>]*)?/?>".to_string(), ""));
        sources.push((r">\s+<".to_string(), "><"));
        sources
            .into_iter()
            .filter_map(|(source, replacement)| match Regex::new(&source) {
                Ok(re) => Some((re, replacement)),
                Err(e) => {
                    tracing::error!("Invalid DOM sanitation pattern {}: {}", source, e);
                    None
                }
            })
            .collect()
    })
}

/// Remove comments and non-semantic elements, then collapse whitespace
/// between tags.
pub fn clean_html(html: &str) -> String {
    let mut cleaned = html.to_string();
    for (pattern, replacement) in sanitation_passes() {
        cleaned = pattern.replace_all(&cleaned, *replacement).into_owned();
    }
    cleaned.trim().to_string()
}
