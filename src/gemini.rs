//! Model client boundary and the Gemini implementation
//!
//! Agents only see the `ModelClient` trait. `GeminiClient` keeps one
//! long-lived reqwest::Client for connection pooling.

use crate::config::Settings;
use crate::error::AgentError;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// One text-generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub system_instruction: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Reply from the model provider.
#[derive(Debug, Clone, Default)]
pub struct Generation {
    pub text: String,
    pub tokens_used: Option<u64>,
    pub model_version: Option<String>,
    pub finish_reason: Option<String>,
}

/// Text-generation collaborator.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn generate_text(&self, request: GenerationRequest) -> Result<Generation>;

    fn model_name(&self) -> &str;
}

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Reusable Gemini client (connection-pooled, retrying)
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl GeminiClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(settings.http_timeout)
            .build()
            .map_err(|e| AgentError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: settings.gemini_api_key.clone(),
            base_url: settings.gemini_base_url.clone(),
            model: settings.gemini_model.clone(),
            max_retries: settings.max_retries.max(1),
            retry_delay: settings.retry_delay,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(&Settings::from_env())
    }

    /// Linear backoff, saturating at `Duration::MAX`.
    fn backoff(&self, attempt: u32) -> Duration {
        self.retry_delay.saturating_mul(attempt)
    }

    async fn generate_once(&self, request: &GenerationRequest) -> Result<Generation> {
        let url = format!("{}/{}:generateContent", self.base_url, self.model);

        let body = GeminiRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: request.prompt.clone(),
                }],
            }],
            system_instruction: request.system_instruction.as_ref().map(|text| SystemInstruction {
                parts: vec![Part { text: text.clone() }],
            }),
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                let e = AgentError::from(e);
                error!("Gemini API request failed: {}", e);
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "Gemini API error response: {}", error_text);
            return Err(AgentError::Provider {
                service: "Gemini AI".to_string(),
                message: format!("HTTP {}: {}", status, error_text),
                retryable: status.is_server_error() || status.as_u16() == 429,
            });
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            let e = e.without_url();
            error!("Failed to parse Gemini response: {}", e);
            AgentError::provider(format!("Gemini parse error: {}", e))
        })?;

        let candidate = gemini_response
            .candidates
            .first()
            .ok_or_else(|| AgentError::provider("No response from Gemini API"))?;

        let text: String = candidate
            .content
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(AgentError::provider(format!(
                "Empty response from Gemini (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        Ok(Generation {
            text,
            tokens_used: gemini_response
                .usage_metadata
                .as_ref()
                .and_then(|u| u.total_token_count),
            model_version: gemini_response
                .model_version
                .clone()
                .or_else(|| Some(self.model.clone())),
            finish_reason: candidate.finish_reason.clone(),
        })
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn generate_text(&self, request: GenerationRequest) -> Result<Generation> {
        if self.api_key.trim().is_empty() {
            return Err(AgentError::Configuration(
                "GEMINI_API_KEY not configured".to_string(),
            ));
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            debug!(attempt, model = %self.model, "Calling Gemini API");

            match self.generate_once(&request).await {
                Ok(generation) => {
                    info!(
                        tokens_used = generation.tokens_used.unwrap_or(0),
                        "Gemini response received"
                    );
                    return Ok(generation);
                }
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    warn!(attempt, error = %e, "Gemini attempt failed, retrying");
                    tokio::time::sleep(self.backoff(attempt)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Content,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    total_token_count: Option<u64>,
}

//
// ================= Mock client =================
//

type Responder = dyn Fn(&GenerationRequest) -> Result<String> + Send + Sync;

/// Canned model client for development & testing.
///
/// Keeps the system functional without an API key and records every request.
pub struct MockModelClient {
    responder: Arc<Responder>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockModelClient {
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&GenerationRequest) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            delay: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_reply(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::with_responder(move |_| Ok(text.clone()))
    }

    pub fn failing(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::with_responder(move |_| Err(AgentError::provider(message.clone())))
    }

    /// Sleep before answering, to simulate a slow provider.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.lock_requests().clone()
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.lock_requests().last().cloned()
    }

    fn lock_requests(&self) -> MutexGuard<'_, Vec<GenerationRequest>> {
        self.requests.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ModelClient for MockModelClient {
    async fn generate_text(&self, request: GenerationRequest) -> Result<Generation> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.lock_requests().push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let text = (self.responder)(&request)?;
        let tokens_used = ((request.prompt.len() + text.len() + 3) / 4) as u64;

        Ok(Generation {
            text,
            tokens_used: Some(tokens_used),
            model_version: Some(self.model_name().to_string()),
            finish_reason: Some("STOP".to_string()),
        })
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn request(prompt: &str) -> GenerationRequest {
        GenerationRequest {
            prompt: prompt.to_string(),
            system_instruction: Some("You are a financial advisor".to_string()),
            max_tokens: 1024,
            temperature: 0.3,
        }
    }

    #[test]
    fn test_request_serialization() {
        let body = GeminiRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: "What is ROE?".to_string(),
                }],
            }],
            system_instruction: Some(SystemInstruction {
                parts: vec![Part {
                    text: "You are a financial advisor".to_string(),
                }],
            }),
            generation_config: GenerationConfig {
                temperature: 0.3,
                max_output_tokens: 1024,
            },
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "What is ROE?");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 1024);
        assert!(json.get("systemInstruction").is_some());
    }

    #[test]
    fn test_response_deserialization() {
        let raw = r#"{
            "candidates": [{"content": {"role": "model", "parts": [{"text": "Hello"}, {"text": " world"}]}, "finishReason": "STOP"}],
            "usageMetadata": {"promptTokenCount": 4, "candidatesTokenCount": 2, "totalTokenCount": 6},
            "modelVersion": "gemini-1.5-pro-002"
        }"#;
        let parsed: GeminiResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.candidates[0].content.parts.len(), 2);
        assert_eq!(parsed.usage_metadata.unwrap().total_token_count, Some(6));
        assert_eq!(parsed.model_version.as_deref(), Some("gemini-1.5-pro-002"));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_configuration_error() {
        let client = GeminiClient::new(&Settings::default()).unwrap();
        let err = client.generate_text(request("hi")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_transport_error_hides_api_key() {
        let settings = Settings {
            gemini_api_key: "SUPERSECRETKEY123".to_string(),
            gemini_base_url: "http://127.0.0.1:9".to_string(),
            max_retries: 1,
            ..Settings::default()
        };
        let client = GeminiClient::new(&settings).unwrap();

        let err = client.generate_text(request("hi")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Provider);
        assert!(!err.to_string().contains("SUPERSECRETKEY123"));
        assert!(!err.to_response().to_string().contains("SUPERSECRETKEY123"));
    }

    #[test]
    fn test_retry_backoff_saturates() {
        let client = GeminiClient::new(&Settings::default()).unwrap();
        assert_eq!(client.backoff(2), Duration::from_millis(4000));

        let settings = Settings {
            retry_delay: Duration::from_millis(u64::MAX),
            ..Settings::default()
        };
        let client = GeminiClient::new(&settings).unwrap();
        assert_eq!(client.backoff(3), Duration::MAX);
    }

    #[tokio::test]
    async fn test_mock_records_requests() {
        let client = MockModelClient::with_reply("ok");
        let generation = client.generate_text(request("first")).await.unwrap();
        assert_eq!(generation.text, "ok");
        assert_eq!(generation.model_version.as_deref(), Some("mock-model"));
        assert_eq!(client.call_count(), 1);
        assert_eq!(client.last_request().unwrap().prompt, "first");
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let client = MockModelClient::failing("quota exceeded");
        let err = client.generate_text(request("x")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Provider);
        assert_eq!(client.call_count(), 1);
    }
}
