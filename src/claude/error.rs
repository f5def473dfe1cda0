//! Failure taxonomy for the generation service

use thiserror::Error;

/// Errors that can occur when talking to the generation service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// No API key is configured
    #[error("API key not configured. Set ANTHROPIC_API_KEY or run `kasool key set`")]
    MissingCredential,

    /// The service rejected the key, or the key is not shaped like one
    #[error("API key was rejected. Check the key and try again")]
    InvalidCredential,

    /// Rate limit or quota reached
    #[error("Rate limited{}", retry_hint(.retry_after_seconds))]
    QuotaExceeded {
        /// Seconds to wait before retrying, when the service says
        retry_after_seconds: Option<u64>,
    },

    /// The request did not finish within the configured timeout
    #[error("Request timed out")]
    TimedOut,

    /// Network or connection failure
    #[error("HTTP request failed: {0}")]
    TransportFailure(String),

    /// Response arrived but could not be understood
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Any other non-success status
    #[error("API error ({status}): {message}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Error body from the service
        message: String,
    },

    /// Failed to access the system keyring
    #[error("Failed to access keyring: {0}")]
    Keyring(String),
}

fn retry_hint(retry_after_seconds: &Option<u64>) -> String {
    match retry_after_seconds {
        Some(secs) => format!(". Retry after {} seconds", secs),
        None => String::new(),
    }
}

impl ServiceError {
    /// Whether retrying the same request later could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::QuotaExceeded { .. } | Self::TimedOut | Self::TransportFailure(_)
        ) || matches!(self, Self::Rejected { status, .. } if *status >= 500)
    }

    /// Whether the user has to fix their API key before retrying
    pub fn requires_credential(&self) -> bool {
        matches!(self, Self::MissingCredential | Self::InvalidCredential)
    }

    /// Short message suitable for showing inside a conversation
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingCredential => {
                "Error: API key is missing. Please configure ANTHROPIC_API_KEY.".to_string()
            }
            Self::InvalidCredential => "Error: the API key is invalid.".to_string(),
            Self::QuotaExceeded { .. } => {
                "Error: request quota exceeded. Please try again later.".to_string()
            }
            Self::TimedOut => "Error: the request took too long. Please try again.".to_string(),
            Self::TransportFailure(_) => {
                "Error: connection failed. Check your network connection.".to_string()
            }
            Self::MalformedResponse(_) | Self::Rejected { .. } | Self::Keyring(_) => {
                format!("Error: {}", self)
            }
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::TimedOut
        } else if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else {
            Self::TransportFailure(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(ServiceError::TimedOut.is_retryable());
        assert!(ServiceError::QuotaExceeded { retry_after_seconds: Some(60) }.is_retryable());
        assert!(ServiceError::TransportFailure("reset".into()).is_retryable());
        assert!(ServiceError::Rejected { status: 503, message: String::new() }.is_retryable());

        assert!(!ServiceError::InvalidCredential.is_retryable());
        assert!(!ServiceError::MalformedResponse("x".into()).is_retryable());
        assert!(!ServiceError::Rejected { status: 400, message: String::new() }.is_retryable());
    }

    #[test]
    fn credential_errors() {
        assert!(ServiceError::MissingCredential.requires_credential());
        assert!(ServiceError::InvalidCredential.requires_credential());
        assert!(!ServiceError::TimedOut.requires_credential());
    }

    #[test]
    fn quota_display() {
        let with = ServiceError::QuotaExceeded { retry_after_seconds: Some(30) };
        let without = ServiceError::QuotaExceeded { retry_after_seconds: None };
        assert_eq!(with.to_string(), "Rate limited. Retry after 30 seconds");
        assert_eq!(without.to_string(), "Rate limited");
    }

    #[test]
    fn timeout_is_distinct_from_transport() {
        assert_ne!(
            ServiceError::TimedOut.user_message(),
            ServiceError::TransportFailure("x".into()).user_message()
        );
    }

    #[test]
    fn user_messages_are_prefixed() {
        let errors = [
            ServiceError::MissingCredential,
            ServiceError::InvalidCredential,
            ServiceError::QuotaExceeded { retry_after_seconds: None },
            ServiceError::TimedOut,
            ServiceError::TransportFailure("x".into()),
            ServiceError::MalformedResponse("x".into()),
        ];
        for err in errors {
            assert!(err.user_message().starts_with("Error:"), "{:?}", err);
        }
    }
}
