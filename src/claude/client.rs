//! HTTP client for the Claude messages API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use super::error::ServiceError;
use super::generator::{CompletionRequest, TextGenerator};
use super::models::{ClaudeModel, CreateMessageRequest, Message, MessageResponse, Role};

/// Claude API client
pub struct ClaudeClient {
    client: Client,
    api_key: String,
    model: ClaudeModel,
}

impl ClaudeClient {
    const API_URL: &'static str = "https://api.anthropic.com/v1/messages";
    const API_VERSION: &'static str = "2023-06-01";

    /// Create a client; `timeout` bounds each HTTP request
    pub fn new(api_key: String, model: ClaudeModel, timeout: Duration) -> Result<Self, ServiceError> {
        if api_key.trim().is_empty() {
            return Err(ServiceError::MissingCredential);
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::TransportFailure(e.to_string()))?;

        Ok(Self { client, api_key, model })
    }

    /// Model this client sends requests to
    pub fn model(&self) -> ClaudeModel {
        self.model
    }

    /// Send a message request and return the parsed response
    pub async fn send_message(
        &self,
        request: CreateMessageRequest,
    ) -> Result<MessageResponse, ServiceError> {
        tracing::debug!(
            "Sending {} message(s) to {}",
            request.messages.len(),
            request.model
        );

        let response = self
            .client
            .post(Self::API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", Self::API_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse().ok());
            let body = response.text().await.unwrap_or_default();
            let err = classify_status(status, retry_after, body);
            tracing::warn!("Request failed: {}", err);
            return Err(err);
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(ServiceError::MalformedResponse("empty response body".to_string()));
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl TextGenerator for ClaudeClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ServiceError> {
        let mut body = CreateMessageRequest::new(self.model, normalize_messages(request.messages()));
        if let Some(system) = request.system {
            body = body.with_system(system);
        }
        if let Some(max_tokens) = request.max_tokens {
            body = body.with_max_tokens(max_tokens);
        }

        let response = self.send_message(body).await?;
        Ok(response.text())
    }
}

/// Map a non-success status to an error
pub fn classify_status(status: StatusCode, retry_after: Option<u64>, body: String) -> ServiceError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ServiceError::InvalidCredential,
        StatusCode::TOO_MANY_REQUESTS => {
            ServiceError::QuotaExceeded { retry_after_seconds: retry_after }
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ServiceError::TimedOut,
        _ => ServiceError::Rejected { status: status.as_u16(), message: body },
    }
}

/// Shape a turn list the way the API accepts it
///
/// The conversation must open with a user turn and alternate roles, so
/// leading assistant turns (such as a greeting) are dropped and consecutive
/// turns from the same role are merged.
pub fn normalize_messages(messages: Vec<Message>) -> Vec<Message> {
    let mut normalized: Vec<Message> = Vec::with_capacity(messages.len());

    for message in messages {
        if normalized.is_empty() && message.role == Role::Assistant {
            continue;
        }
        match normalized.last_mut() {
            Some(last) if last.role == message.role => {
                last.content.push_str("\n\n");
                last.content.push_str(&message.content);
            }
            _ => normalized.push(message),
        }
    }

    normalized
}
