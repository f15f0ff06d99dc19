//! # LLM Client
//!
//! Calls the external chat-completions service and enforces the structured
//! output contract used by both page extraction and chapter synthesis.
//! Request/response shapes mirror the teacher's OpenAI-compatible
//! `LocalAiProvider`; retry is composed explicitly via `retry::RetryPolicy`
//! instead of in-process exception control flow.

use crate::error::LlmError;
use crate::retry::{Classification, RetryPolicy};
use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt::Debug;
use std::time::Duration;
use tracing::{debug, info};

/// A chat-completions provider. One production implementation
/// (`HttpLlmClient`); tests substitute a `wiremock`-backed server or a
/// counting stub.
#[async_trait]
pub trait LlmClient: Send + Sync + Debug {
    /// Issues a single chat-completion request and returns the raw
    /// assistant text. Retries are the caller's responsibility via
    /// `invoke_structured`.
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, (Classification, LlmError)>;
}

#[derive(Serialize, Debug, Clone)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize, Debug)]
struct ChatRequest<'a> {
    messages: Vec<ChatMessage>,
    model: &'a str,
    temperature: f32,
    response_format: ResponseFormat,
    stream: bool,
}

#[derive(Serialize, Debug)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatMessage,
}

/// The production chat-completions client, speaking the same
/// OpenAI-compatible wire format the teacher's `LocalAiProvider` uses.
#[derive(Clone, Debug)]
pub struct HttpLlmClient {
    client: ReqwestClient,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
}

impl HttpLlmClient {
    pub fn new(
        endpoint: String,
        api_key: Option<String>,
        model: String,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(LlmError::ClientBuild)?;
        Ok(HttpLlmClient {
            client,
            endpoint,
            api_key,
            model,
            temperature,
        })
    }

    fn classify(status: StatusCode) -> Classification {
        if status == StatusCode::TOO_MANY_REQUESTS {
            Classification::RateLimited
        } else if status.is_server_error() {
            Classification::Transient
        } else {
            Classification::Permanent
        }
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, (Classification, LlmError)> {
        let request = ChatRequest {
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_prompt.to_string(),
                },
            ],
            model: &self.model,
            temperature: self.temperature,
            response_format: ResponseFormat { kind: "json_object" },
            stream: false,
        };

        debug!(endpoint = %self.endpoint, "--> dispatching LLM request");
        let mut builder = self.client.post(&self.endpoint);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.json(&request).send().await.map_err(|e| {
            let classification = if e.is_timeout() || e.is_connect() {
                Classification::Transient
            } else {
                Classification::Permanent
            };
            (classification, LlmError::Request(e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err((Self::classify(status), LlmError::Api(body)));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| (Classification::Transient, LlmError::Request(e)))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();
        Ok(content)
    }
}

/// Runs a single structured chat-completion call under `policy`: temperature
/// and endpoint come from the client, but validation failures are retried
/// within the same attempt budget as transport failures, per the LLM
/// invocation contract.
pub async fn invoke_structured<T: DeserializeOwned>(
    client: &dyn LlmClient,
    policy: &RetryPolicy,
    system_prompt: &str,
    user_prompt: &str,
) -> Result<T, LlmError> {
    policy
        .run(|_attempt| async move {
            let raw = client.complete(system_prompt, user_prompt).await?;
            let value: serde_json::Value = serde_json::from_str(&raw)
                .map_err(|e| (Classification::Transient, LlmError::SchemaValidation(e)))?;
            serde_json::from_value::<T>(value)
                .map_err(|e| (Classification::Transient, LlmError::SchemaValidation(e)))
        })
        .await
}
