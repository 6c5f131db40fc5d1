//! Chat-completion classifier (OpenAI-compatible API).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

use super::{AffiliationClassifier, Classification, ClassifierError};
use crate::config::ClassifierConfig;
use crate::utils::HttpClient;

/// Classifies affiliations by asking a chat model.
///
/// One `POST {base_url}/chat/completions` per call: the configured system
/// instruction followed by the affiliation as the user message.
#[derive(Debug, Clone)]
pub struct OpenAiClassifier {
    client: Arc<HttpClient>,
    endpoint: Url,
    api_key: String,
    model: String,
    system_prompt: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiClassifier {
    /// Create a classifier from configuration
    ///
    /// Fails with [`ClassifierError::MissingApiKey`] when no credential is given.
    pub fn from_config(
        client: Arc<HttpClient>,
        config: &ClassifierConfig,
        api_key: Option<String>,
    ) -> Result<Self, ClassifierError> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(ClassifierError::MissingApiKey)?;

        let base = config.base_url.trim_end_matches('/');
        let endpoint = Url::parse(&format!("{}/chat/completions", base))
            .map_err(|e| ClassifierError::InvalidRequest(format!("bad base URL: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            model: config.model.clone(),
            system_prompt: config.system_prompt.clone(),
        })
    }

    /// Chat model in use
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl AffiliationClassifier for OpenAiClassifier {
    fn name(&self) -> &str {
        "openai"
    }

    async fn classify(&self, affiliation: &str) -> Result<Classification, ClassifierError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &self.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: affiliation,
                },
            ],
        };

        tracing::debug!(model = %self.model, affiliation, "classifying affiliation");

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                ClassifierError::Network(format!("Failed to reach classification service: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Api(format!(
                "classification service returned status {}: {}",
                status,
                body.trim()
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::Parse(format!("unexpected response body: {}", e)))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ClassifierError::Parse("response contained no choices".to_string()))?;

        let label = Classification::from_label(&content);
        tracing::debug!(affiliation, label = %label, "affiliation classified");
        Ok(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> Arc<HttpClient> {
        Arc::new(HttpClient::new().unwrap())
    }

    #[test]
    fn test_missing_api_key() {
        let result = OpenAiClassifier::from_config(client(), &ClassifierConfig::default(), None);
        assert!(matches!(result, Err(ClassifierError::MissingApiKey)));

        let result = OpenAiClassifier::from_config(
            client(),
            &ClassifierConfig::default(),
            Some("  ".to_string()),
        );
        assert!(matches!(result, Err(ClassifierError::MissingApiKey)));
    }

    #[test]
    fn test_endpoint_from_base_url() {
        let config = ClassifierConfig {
            base_url: "http://localhost:8080/v1/".to_string(),
            ..ClassifierConfig::default()
        };
        let classifier =
            OpenAiClassifier::from_config(client(), &config, Some("key".to_string())).unwrap();
        assert_eq!(
            classifier.endpoint.as_str(),
            "http://localhost:8080/v1/chat/completions"
        );
        assert_eq!(classifier.model(), "gpt-4");
    }

    #[test]
    fn test_request_shape() {
        let request = ChatRequest {
            model: "gpt-4",
            messages: [
                ChatMessage {
                    role: "system",
                    content: "Classify the following affiliation as 'academic' or 'corporate'.",
                },
                ChatMessage {
                    role: "user",
                    content: "Acme Corp",
                },
            ],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "gpt-4");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "Acme Corp");
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"id":"chatcmpl-1","object":"chat.completion",
            "choices":[{"index":0,"message":{"role":"assistant","content":" Corporate "},"finish_reason":"stop"}]}"#;
        let response: ChatResponse = serde_json::from_str(body).unwrap();
        let content = response.choices[0].message.content.as_deref().unwrap();
        assert_eq!(Classification::from_label(content), Classification::Corporate);
    }
}
