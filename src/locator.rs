//! Locator resolution: DOM snapshot + intent, answered by a chat completion.
//!
//! The completion body is returned as-is; reading the locator out of it is
//! the caller's job.

use crate::dom::get_application_dom;
use crate::engine::AutomationEngine;
use crate::types::{Error, LlmConfig, Result};
use serde::Serialize;
use std::sync::OnceLock;

const LOCATOR_PROMPT_ASSET: &str = include_str!("../resources/locator_system_prompt.txt");

/// Fixed system prompt for locator resolution.
pub fn system_prompt() -> &'static str {
    static PROMPT: OnceLock<String> = OnceLock::new();
    PROMPT.get_or_init(|| LOCATOR_PROMPT_ASSET.trim().to_string())
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

/// Fetch the session DOM and ask the completion endpoint for a locator
/// matching `intent`. Waits for the completion; no retry.
pub async fn resolve_locator(
    engine: &dyn AutomationEngine,
    http: &reqwest::Client,
    llm: &LlmConfig,
    driver_session: Option<&str>,
    token: Option<&str>,
    intent: &str,
) -> Result<String> {
    let dom = get_application_dom(engine, driver_session, token).await?;

    let user_content = serde_json::json!({
        "intent": intent,
        "dom": dom.html,
    })
    .to_string();

    let request = CompletionRequest {
        model: &llm.model,
        messages: vec![
            ChatMessage {
                role: "system",
                content: system_prompt().to_string(),
            },
            ChatMessage {
                role: "user",
                content: user_content,
            },
        ],
    };

    let mut builder = http
        .post(&llm.endpoint)
        .bearer_auth(&llm.api_key)
        .json(&request);
    if let Some(timeout) = llm.request_timeout {
        builder = builder.timeout(timeout);
    }

    tracing::debug!(model = %llm.model, session_id = %dom.session_id, "Requesting locator completion");
    let response = builder.send().await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), "Locator completion failed");
        return Err(Error::Completion {
            status: status.as_u16(),
            body,
        });
    }

    Ok(response.text().await?)
}
