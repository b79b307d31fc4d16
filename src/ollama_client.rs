// Ollama client for self-hosted models
// Docs: https://github.com/ollama/ollama/blob/main/docs/api.md#generate-a-chat-completion

use crate::completion::{post_json, CompletionBackend, CompletionError, RetryPolicy};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    timeout: Duration,
    retry: RetryPolicy,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct OllamaChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    pub options: OllamaOptions,
}

#[derive(Debug, Serialize)]
pub struct OllamaOptions {
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
pub struct OllamaChatResponse {
    pub message: Option<ChatMessage>,
}

impl OllamaClient {
    pub fn new(base_url: String, model: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            timeout: Duration::from_secs(120),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[async_trait]
impl CompletionBackend for OllamaClient {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, CompletionError> {
        let request = OllamaChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            stream: false,
            options: OllamaOptions { temperature },
        };

        tracing::debug!("Ollama request: model={} prompt_chars={}", self.model, prompt.len());

        let response: OllamaChatResponse = post_json(
            &self.client,
            &format!("{}/api/chat", self.base_url),
            None,
            &request,
            self.timeout,
            self.retry,
        )
        .await?;

        response
            .message
            .map(|m| m.content)
            .filter(|text| !text.is_empty())
            .ok_or(CompletionError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            initial_interval: Duration::from_millis(10),
            max_elapsed: Duration::from_millis(200),
        }
    }

    #[tokio::test]
    async fn test_chat_completion_reads_message_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(json!({
                "model": "llama2",
                "stream": false,
                "options": { "temperature": 0.7 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "llama2",
                "message": { "role": "assistant", "content": "Big news! 🚀" },
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OllamaClient::new(format!("{}/", server.uri()), "llama2".to_string());
        let text = client.complete("Write a post", 0.7).await.unwrap();
        assert_eq!(text, "Big news! 🚀");
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model 'llama9' not found"))
            .expect(1)
            .mount(&server)
            .await;

        let client = OllamaClient::new(server.uri(), "llama9".to_string())
            .with_retry_policy(fast_retry());
        let err = client.complete("hi", 0.7).await.unwrap_err();
        assert_eq!(
            err,
            CompletionError::Api {
                status: 404,
                body: "model 'llama9' not found".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_server_errors_are_retried_until_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(503).set_body_string("loading model"))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": { "role": "assistant", "content": "ok" },
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OllamaClient::new(server.uri(), "llama2".to_string())
            .with_retry_policy(fast_retry());
        assert_eq!(client.complete("hi", 0.7).await.unwrap(), "ok");
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_persistent_server_error_gives_up() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let client = OllamaClient::new(server.uri(), "llama2".to_string())
            .with_retry_policy(fast_retry());
        let err = client.complete("hi", 0.7).await.unwrap_err();
        assert!(matches!(err, CompletionError::Api { status: 503, .. }));
        assert!(server.received_requests().await.unwrap().len() > 1);
    }

    #[tokio::test]
    async fn test_empty_message_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "done": true })))
            .mount(&server)
            .await;

        let client = OllamaClient::new(server.uri(), "llama2".to_string());
        let err = client.complete("hi", 0.7).await.unwrap_err();
        assert_eq!(err, CompletionError::EmptyResponse);
    }
}
