// completion.rs - Language-model completion backends behind one trait
use crate::config::{LlmProvider, Settings};
use crate::grok_client::GrokClient;
use crate::ollama_client::OllamaClient;
use async_trait::async_trait;
use backoff::{future::retry, ExponentialBackoff};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Sampling temperature used for every post generation request.
pub const POST_TEMPERATURE: f32 = 0.7;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompletionError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("failed to parse response: {0}")]
    InvalidResponse(String),
    #[error("completion contained no text")]
    EmptyResponse,
}

/// A black-box text completion service.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, CompletionError>;
}

/// Builds the backend selected by `LLM_PROVIDER`.
pub fn build_backend(settings: &Settings) -> Arc<dyn CompletionBackend> {
    match settings.llm_provider {
        LlmProvider::Ollama => {
            tracing::info!("🦙 Using Ollama with model: {}", settings.ollama_model);
            Arc::new(
                OllamaClient::new(
                    settings.ollama_base_url.clone(),
                    settings.ollama_model.clone(),
                )
                .with_timeout(settings.http_timeout),
            )
        }
        LlmProvider::Grok => {
            tracing::info!("🤖 Using Grok/xAI with model: {}", settings.grok_model);
            Arc::new(
                GrokClient::new(settings.grok_api_key.clone(), settings.grok_model.clone())
                    .with_base_url(settings.grok_base_url.clone())
                    .with_timeout(settings.http_timeout),
            )
        }
    }
}

/// Retry window for transient completion failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub initial_interval: Duration,
    pub max_elapsed: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(1),
            max_elapsed: Duration::from_secs(60),
        }
    }
}

/// POSTs `body` as JSON and decodes the JSON reply.
///
/// Connection errors, timeouts, 429 and 5xx are retried with exponential
/// backoff until `policy.max_elapsed`; every other failure is returned at once.
pub(crate) async fn post_json<B, T>(
    client: &Client,
    url: &str,
    bearer: Option<&str>,
    body: &B,
    timeout: Duration,
    policy: RetryPolicy,
) -> Result<T, CompletionError>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let backoff_config = ExponentialBackoff {
        initial_interval: policy.initial_interval,
        max_interval: Duration::from_secs(10),
        multiplier: 2.0,
        max_elapsed_time: Some(policy.max_elapsed),
        ..Default::default()
    };

    let operation = || async {
        let mut request = client.post(url).timeout(timeout).json(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                tracing::warn!("Completion backend connection error (retrying): {}", e);
                backoff::Error::transient(CompletionError::Request(e.to_string()))
            } else {
                backoff::Error::permanent(CompletionError::Request(e.to_string()))
            }
        })?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| backoff::Error::permanent(CompletionError::Request(e.to_string())))?;

        tracing::debug!("Completion response (status {}): {}", status, response_text);

        if status.as_u16() == 429 || status.is_server_error() {
            tracing::warn!("Completion backend returned {} (retrying)", status);
            return Err(backoff::Error::transient(CompletionError::Api {
                status: status.as_u16(),
                body: response_text,
            }));
        }

        if !status.is_success() {
            return Err(backoff::Error::permanent(CompletionError::Api {
                status: status.as_u16(),
                body: response_text,
            }));
        }

        serde_json::from_str(&response_text).map_err(|e| {
            backoff::Error::permanent(CompletionError::InvalidResponse(format!(
                "{}. Response: {}",
                e, response_text
            )))
        })
    };

    retry(backoff_config, operation).await
}
