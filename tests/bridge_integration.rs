//! Bridge integration tests: dispatcher round-trips against mock engine and
//! completion servers.

use base64::Engine as _;
use rulebridge::engine::HttpEngine;
use rulebridge::session::SessionStore;
use rulebridge::tools::{PluginManifest, StaticManifests, ToolRegistry};
use rulebridge::types::LlmConfig;
use rulebridge::{Config, Dispatcher, InvocationRequest};
use serde_json::json;
use std::sync::Arc;
use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

/// Helper: dispatcher wired to mock engine and completion servers.
async fn start_bridge(engine: &MockServer, llm: &MockServer) -> Dispatcher {
    let mut config = Config::default();
    config.engine.endpoint = format!("{}/api/automation/invoke", engine.uri());
    config.llm = LlmConfig {
        endpoint: format!("{}/v1/chat/completions", llm.uri()),
        api_key: "sk-integration".to_string(),
        model: "gpt-integration".to_string(),
        request_timeout: None,
    };

    let engine_client = HttpEngine::new(&config.engine).unwrap();
    let dispatcher = Dispatcher::new(
        Arc::new(ToolRegistry::with_builtins()),
        Arc::new(SessionStore::new()),
        Arc::new(engine_client),
        reqwest::Client::new(),
        config,
    );

    let manifests: Vec<PluginManifest> = serde_json::from_value(json!([
        {"key": "GoToUrl", "type": "Action", "description": "Navigate to a URL"},
        {"key": "ClickElement", "type": "Action", "description": "Click an element"},
    ]))
    .unwrap();
    dispatcher.resync(&StaticManifests(manifests)).await.unwrap();

    dispatcher
}

#[tokio::test]
async fn test_find_tool_after_resync() {
    let engine = MockServer::start().await;
    let llm = MockServer::start().await;
    let bridge = start_bridge(&engine, &llm).await;

    let found = bridge
        .invoke(InvocationRequest::new("find_tool", json!({"tool_name": "click_element"})))
        .await
        .unwrap();
    assert_eq!(found["name"], "click_element");
    assert_eq!(found["engineName"], "ClickElement");

    let missing = bridge
        .invoke(InvocationRequest::new("find_tool", json!({"tool_name": "drag_and_drop"})))
        .await
        .unwrap();
    assert!(missing.is_null());
}

#[tokio::test]
async fn test_session_then_rule_round_trip() {
    let engine = MockServer::start().await;
    let llm = MockServer::start().await;

    Mock::given(matchers::method("POST"))
        .and(matchers::path("/api/automation/invoke"))
        .and(matchers::body_partial_json(json!({
            "driverSession": "drv-1",
            "token": "tok",
            "rules": [{
                "engineName": "GoToUrl",
                "argumentTemplate": "{{$ --Url:https://example.com}}"
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bundle": {"sessions": {"drv-1": {
                "responseTree": {"stages": [{"jobs": [{"plugins": [{"title": "Example Domain"}]}]}]}
            }}}
        })))
        .expect(1)
        .mount(&engine)
        .await;

    // Anything else is the session-opening call.
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/api/automation/invoke"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bundle": {"sessions": {"drv-1": {}}}
        })))
        .expect(1)
        .mount(&engine)
        .await;

    let bridge = start_bridge(&engine, &llm).await;

    let session = bridge
        .invoke(InvocationRequest::new(
            "start_session",
            json!({"token": "tok", "driverParameters": {"driver": "ChromeDriver"}}),
        ))
        .await
        .unwrap();
    assert_eq!(session["sessionId"], "drv-1");

    let outcome = bridge
        .invoke(InvocationRequest::new(
            "start_rule",
            json!({
                "driverSession": "drv-1",
                "token": "tok",
                "rule": {"tool_name": "go_to_url", "parameters": {"url": "https://example.com"}}
            }),
        ))
        .await
        .unwrap();

    assert_eq!(outcome, json!({"sessionId": "drv-1", "value": {"title": "Example Domain"}}));
    let entry = bridge.sessions().get("drv-1").unwrap();
    assert_eq!(entry.state.last_plugin(), Some(&json!({"title": "Example Domain"})));
}

#[tokio::test]
async fn test_resolve_locator_end_to_end() {
    let engine = MockServer::start().await;
    let llm = MockServer::start().await;

    let page = "<form><input id=\"q\" name=\"q\"><script>track()</script></form>";
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/api/automation/invoke"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bundle": {"sessions": {"drv-2": {"environment": {"sessionParameters": {
                "ApplicationDom": base64::engine::general_purpose::STANDARD.encode(page)
            }}}}}
        })))
        .expect(1)
        .mount(&engine)
        .await;

    let completion = r#"{"choices":[{"message":{"role":"assistant","content":"{\"locator\":\"Id\",\"onElement\":\"q\"}"}}]}"#;
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/v1/chat/completions"))
        .and(matchers::header("authorization", "Bearer sk-integration"))
        .and(matchers::body_partial_json(json!({"model": "gpt-integration"})))
        .respond_with(ResponseTemplate::new(200).set_body_string(completion))
        .expect(1)
        .mount(&llm)
        .await;

    let bridge = start_bridge(&engine, &llm).await;

    let raw = bridge
        .invoke(InvocationRequest::new(
            "resolve_locator",
            json!({"driverSession": "drv-2", "token": "tok", "intent": "the search box"}),
        ))
        .await
        .unwrap();

    assert_eq!(raw, json!(completion));
    assert!(bridge.sessions().is_empty());
}

#[tokio::test]
async fn test_completion_failure_is_an_error() {
    let engine = MockServer::start().await;
    let llm = MockServer::start().await;

    Mock::given(matchers::method("POST"))
        .and(matchers::path("/api/automation/invoke"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bundle": {"sessions": {"drv-3": {}}}
        })))
        .mount(&engine)
        .await;
    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .expect(1)
        .mount(&llm)
        .await;

    let bridge = start_bridge(&engine, &llm).await;

    let err = bridge
        .invoke(InvocationRequest::new(
            "resolve_locator",
            json!({"driverSession": "drv-3", "intent": "anything"}),
        ))
        .await
        .unwrap_err();

    assert_eq!(err.to_error_code(), "UNAVAILABLE");
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn test_concurrent_invocations_share_state() {
    let engine = MockServer::start().await;
    let llm = MockServer::start().await;

    Mock::given(matchers::method("POST"))
        .and(matchers::path("/api/automation/invoke"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bundle": {"sessions": {"shared": {}}}
        })))
        .expect(10)
        .mount(&engine)
        .await;

    let bridge = Arc::new(start_bridge(&engine, &llm).await);

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let bridge = Arc::clone(&bridge);
            tokio::spawn(async move {
                bridge
                    .invoke(InvocationRequest::new(
                        "start_rule",
                        json!({"rule": {"tool_name": "click_element", "parameters": {"n": i}}}),
                    ))
                    .await
            })
        })
        .collect();

    for handle in handles {
        let outcome = handle.await.unwrap().unwrap();
        assert_eq!(outcome["sessionId"], "shared");
    }
    assert_eq!(bridge.sessions().session_ids(), vec!["shared"]);
}
