//! HTTP client for the automation engine.

use crate::engine::{AutomationEngine, AutomationModel, AutomationResponse};
use crate::types::{EngineConfig, Error, Result};
use async_trait::async_trait;

/// Posts automation models to the engine's invoke endpoint.
#[derive(Debug, Clone)]
pub struct HttpEngine {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpEngine {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::with_client(builder.build()?, config.endpoint.clone()))
    }

    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AutomationEngine for HttpEngine {
    async fn invoke(&self, model: &AutomationModel) -> Result<AutomationResponse> {
        tracing::debug!(
            endpoint = %self.endpoint,
            rules = model.rules.len(),
            driver_session = model.driver_session.as_deref().unwrap_or(""),
            "Invoking automation engine"
        );

        let response = self.client.post(&self.endpoint).json(model).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Automation engine call failed");
            return Err(Error::Engine {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleModel;
    use serde_json::json;
    use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

    fn model() -> AutomationModel {
        AutomationModel {
            driver_session: Some("S1".to_string()),
            token: Some("T1".to_string()),
            rules: vec![RuleModel::new("Click", "{{$ --OnElement:#go}}")],
            ..AutomationModel::default()
        }
    }

    #[tokio::test]
    async fn test_invoke_success() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/invoke"))
            .and(matchers::body_partial_json(json!({
                "driverSession": "S1",
                "rules": [{"engineName": "Click"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "b1": {"sessions": {"S1": {}}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let engine = HttpEngine::with_client(reqwest::Client::new(), format!("{}/invoke", server.uri()));
        let response = engine.invoke(&model()).await.unwrap();

        let (session_id, _) = response.last_session().unwrap().unwrap();
        assert_eq!(session_id, "S1");
    }

    #[tokio::test]
    async fn test_invoke_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("plugin not found"))
            .expect(1)
            .mount(&server)
            .await;

        let engine = HttpEngine::with_client(reqwest::Client::new(), server.uri());
        let err = engine.invoke(&model()).await.unwrap_err();

        match err {
            Error::Engine { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "plugin not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_new_from_config() {
        let engine = HttpEngine::new(&EngineConfig::default()).unwrap();
        assert_eq!(engine.endpoint(), EngineConfig::default().endpoint);
    }
}
