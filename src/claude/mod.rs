//! Claude API integration
//!
//! Key management, the HTTP client and the [`TextGenerator`] seam that quiz
//! generation and the assistant are written against.

pub mod auth;
pub mod client;
pub mod error;
pub mod generator;
pub mod models;

pub use auth::{ApiKeyManager, KeySource};
pub use client::ClaudeClient;
pub use error::ServiceError;
pub use generator::{CompletionRequest, TextGenerator, check_connection, complete_with_timeout};
pub use models::{ClaudeModel, CreateMessageRequest, Message, MessageResponse, Role};
