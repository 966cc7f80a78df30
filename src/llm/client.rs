use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PipelineError, Result};

pub const DEFAULT_MODEL: &str = "mistralai/mistral-7b-instruct";
pub const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_ROLE: &str = "user";
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// Characters of the raw response body echoed to the debug log
const RAW_PREVIEW_CHARS: usize = 500;

/// A text-generation backend
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send one prompt as a single message with the given role and return the
    /// generated text
    async fn generate(&self, prompt: &str, model: &str, role: &str) -> Result<String>;
}

/// Configuration for the chat-completion client
#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    /// Bearer token (from OPENROUTER_API_KEY env var)
    pub api_key: String,
    /// Chat-completion endpoint URL
    pub endpoint: String,
}

impl OpenRouterConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| {
            PipelineError::Config(format!("{API_KEY_ENV} environment variable not set"))
        })?;

        Ok(Self::new(api_key))
    }

    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// OpenRouter-compatible chat-completion client
pub struct OpenRouterClient {
    client: Client,
    config: OpenRouterConfig,
}

impl OpenRouterClient {
    pub fn new(config: OpenRouterConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl ModelClient for OpenRouterClient {
    async fn generate(&self, prompt: &str, model: &str, role: &str) -> Result<String> {
        if prompt.trim().is_empty() {
            return Err(PipelineError::InvalidInput("prompt is empty".to_string()));
        }
        let model = if model.is_empty() { DEFAULT_MODEL } else { model };
        let role = if role.is_empty() { DEFAULT_ROLE } else { role };

        let request = ChatRequest {
            model,
            messages: vec![Message {
                role,
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                PipelineError::Transport(format!("request to model endpoint failed: {e}"))
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PipelineError::Transport(format!("failed to read model response: {e}")))?;

        debug!(
            "Raw response ({}): {}",
            status,
            body.chars().take(RAW_PREVIEW_CHARS).collect::<String>()
        );

        if !status.is_success() {
            return Err(PipelineError::Api {
                status: status.as_u16(),
                body,
            });
        }

        parse_chat_response(&body)
    }
}

/// Pull `choices[0].message.content` out of a response body
pub fn parse_chat_response(body: &str) -> Result<String> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| PipelineError::MalformedResponse(format!("response is not valid JSON: {e}")))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .ok_or_else(|| {
            PipelineError::MalformedResponse("missing choices[0].message.content".to_string())
        })
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> OpenRouterClient {
        let config = OpenRouterConfig::new("test-key".to_string())
            .with_endpoint(format!("{}/api/v1/chat/completions", server.uri()));
        OpenRouterClient::new(config)
    }

    #[test]
    fn test_parse_chat_response() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Hello"}}]}"#;
        assert_eq!(parse_chat_response(body).unwrap(), "Hello");
    }

    #[test]
    fn test_parse_missing_content() {
        for body in [
            r#"{"choices":[]}"#,
            r#"{"error":{"message":"rate limited"}}"#,
            r#"{"choices":[{"message":{"role":"assistant"}}]}"#,
            "not json",
        ] {
            let err = parse_chat_response(body).unwrap_err();
            assert!(matches!(err, PipelineError::MalformedResponse(_)), "{body}");
        }
    }

    #[tokio::test]
    async fn test_generate_sends_chat_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_json(serde_json::json!({
                "model": "some/model",
                "messages": [{"role": "user", "content": "Rewrite this"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "Rewritten"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client_for(&server)
            .generate("Rewrite this", "some/model", "user")
            .await
            .unwrap();
        assert_eq!(text, "Rewritten");
    }

    #[tokio::test]
    async fn test_generate_defaults_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(serde_json::json!({
                "model": DEFAULT_MODEL,
                "messages": [{"role": "user", "content": "hi"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "ok"}}]
            })))
            .mount(&server)
            .await;

        let text = client_for(&server).generate("hi", "", "").await.unwrap();
        assert_eq!(text, "ok");
    }

    #[tokio::test]
    async fn test_generate_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .generate("hi", DEFAULT_MODEL, "user")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Api { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_generate_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "x"})))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .generate("hi", DEFAULT_MODEL, "user")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_generate_transport_error() {
        // nothing listens on port 9 (discard) in the test environment
        let config = OpenRouterConfig::new("k".to_string())
            .with_endpoint("http://127.0.0.1:9/v1/chat/completions");
        let err = OpenRouterClient::new(config)
            .generate("hi", DEFAULT_MODEL, "user")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Transport(_)));
    }

    #[tokio::test]
    async fn test_empty_prompt_rejected() {
        let config = OpenRouterConfig::new("k".to_string())
            .with_endpoint("http://127.0.0.1:9/v1/chat/completions");
        let err = OpenRouterClient::new(config)
            .generate("   ", DEFAULT_MODEL, "user")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
    }
}
