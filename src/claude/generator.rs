//! The text generation seam
//!
//! Quiz generation and the assistant only ever see [`TextGenerator`], so
//! they can be driven by the real client or by a scripted fake in tests.

use std::time::Duration;

use async_trait::async_trait;

use super::error::ServiceError;
use super::models::Message;

/// One generation call: optional system instruction, prior turns, new prompt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub history: Vec<Message>,
    pub prompt: String,
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    /// A bare prompt with no history
    pub fn prompt(prompt: impl Into<String>) -> Self {
        Self { prompt: prompt.into(), ..Default::default() }
    }

    /// Set the system instruction
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set prior turns
    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }

    /// Cap the response length
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// History followed by the prompt as a user turn
    pub fn messages(&self) -> Vec<Message> {
        let mut messages = self.history.clone();
        messages.push(Message::user(self.prompt.clone()));
        messages
    }
}

/// Anything that can turn a prompt into text
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produce the full response text for `request`
    async fn complete(&self, request: CompletionRequest) -> Result<String, ServiceError>;
}

/// Run a generation call, giving up after `timeout`
pub async fn complete_with_timeout(
    generator: &dyn TextGenerator,
    request: CompletionRequest,
    timeout: Duration,
) -> Result<String, ServiceError> {
    match tokio::time::timeout(timeout, generator.complete(request)).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!("Generation request timed out after {:?}", timeout);
            Err(ServiceError::TimedOut)
        }
    }
}

/// Send a minimal request to check that the service accepts the key
pub async fn check_connection(generator: &dyn TextGenerator, timeout: Duration) -> Result<(), ServiceError> {
    let request = CompletionRequest::prompt("Hi").with_max_tokens(10);
    complete_with_timeout(generator, request, timeout).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claude::Role;

    struct Slow;

    #[async_trait]
    impl TextGenerator for Slow {
        async fn complete(&self, _request: CompletionRequest) -> Result<String, ServiceError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("late".into())
        }
    }

    struct Echo;

    #[async_trait]
    impl TextGenerator for Echo {
        async fn complete(&self, request: CompletionRequest) -> Result<String, ServiceError> {
            Ok(request.prompt)
        }
    }

    #[tokio::test]
    async fn timeout_maps_to_timed_out() {
        let result =
            complete_with_timeout(&Slow, CompletionRequest::prompt("hi"), Duration::from_millis(20))
                .await;
        assert_eq!(result, Err(ServiceError::TimedOut));
    }

    #[tokio::test]
    async fn completes_within_timeout() {
        let result =
            complete_with_timeout(&Echo, CompletionRequest::prompt("hi"), Duration::from_secs(5))
                .await;
        assert_eq!(result.unwrap(), "hi");
    }

    struct Rejecting;

    #[async_trait]
    impl TextGenerator for Rejecting {
        async fn complete(&self, _request: CompletionRequest) -> Result<String, ServiceError> {
            Err(ServiceError::InvalidCredential)
        }
    }

    #[tokio::test]
    async fn connection_check_reports_rejected_key() {
        let timeout = Duration::from_secs(5);
        assert_eq!(check_connection(&Echo, timeout).await, Ok(()));
        assert_eq!(check_connection(&Rejecting, timeout).await, Err(ServiceError::InvalidCredential));
        assert_eq!(
            check_connection(&Slow, Duration::from_millis(20)).await,
            Err(ServiceError::TimedOut)
        );
    }

    #[test]
    fn messages_end_with_prompt() {
        let request = CompletionRequest::prompt("second")
            .with_history(vec![Message::user("first"), Message::assistant("reply")]);
        let messages = request.messages();

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2].role, Role::User);
        assert_eq!(messages[2].content, "second");
    }
}
