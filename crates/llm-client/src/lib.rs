//! # LLM provider abstraction
//!
//! Defines the [`LlmProvider`] capability contract and its two variants:
//! [`OpenAiProvider`] (async-openai) and [`AnthropicProvider`] (Messages API over reqwest SSE).
//!
//! A provider is selected once at startup via [`build_provider`]; callers only see
//! `Arc<dyn LlmProvider>` and never dispatch on the provider kind again.
//!
//! ## Stream contract
//!
//! [`LlmProvider::generate`] returns `Err` only when the stream could not be opened. Once the
//! stream exists, failures arrive as [`ChunkKind::Error`](prompt::ChunkKind::Error) chunks and the
//! stream ends after the first chunk with `is_final == true`.

use async_trait::async_trait;
use futures::stream::BoxStream;
use prompt::{AttachmentRef, ContentChunk, ConversationTurn, GenerationRequest};
use std::sync::Arc;

mod anthropic;
mod config;
mod openai_llm;

pub use anthropic::AnthropicProvider;
pub use config::{ProviderConfig, ProviderKind};
pub use openai_llm::OpenAiProvider;

/// Ordered, finite stream of content chunks for one generation.
pub type ChunkStream = BoxStream<'static, ContentChunk>;

/// Provider failures that happen before a chunk stream exists, or that classify an error chunk.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Provider timed out")]
    Timeout,

    #[error("Provider request failed: {0}")]
    Request(String),

    #[error("Provider stream failed: {0}")]
    Stream(String),

    #[error("Unsupported by provider: {0}")]
    Unsupported(String),

    #[error("Invalid provider request: {0}")]
    InvalidRequest(String),
}

/// Capability contract every AI provider satisfies.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short provider name for logs ("openai", "anthropic").
    fn name(&self) -> &str;

    /// Opens a streamed generation for `request`.
    async fn generate(&self, request: GenerationRequest) -> Result<ChunkStream, ProviderError>;

    /// Generates an image for `prompt` and returns a reference to it (a URL).
    async fn generate_image(&self, prompt: &str) -> Result<AttachmentRef, ProviderError>;
}

/// Builds the configured provider variant.
pub fn build_provider(config: &ProviderConfig) -> Result<Arc<dyn LlmProvider>, ProviderError> {
    let provider: Arc<dyn LlmProvider> = match config.kind {
        ProviderKind::OpenAi => {
            let api_key = require_key(config.openai_api_key.as_deref(), "OPENAI_API_KEY")?;
            Arc::new(OpenAiProvider::new(
                api_key,
                &config.openai_base_url,
                &config.openai_model,
                &config.openai_image_model,
            ))
        }
        ProviderKind::Anthropic => {
            let api_key = require_key(config.anthropic_api_key.as_deref(), "ANTHROPIC_API_KEY")?;
            Arc::new(AnthropicProvider::new(
                api_key,
                &config.anthropic_base_url,
                &config.anthropic_model,
            )?)
        }
    };
    tracing::info!(provider = provider.name(), "LLM provider initialized");
    Ok(provider)
}

fn require_key(key: Option<&str>, var: &str) -> Result<String, ProviderError> {
    match key.map(str::trim) {
        Some(k) if !k.is_empty() => Ok(k.to_string()),
        _ => Err(ProviderError::InvalidRequest(format!("{} not set", var))),
    }
}

/// Turn text with every attachment that is not an inline image described after the text.
pub(crate) fn text_with_attachments(turn: &ConversationTurn) -> String {
    let mut text = turn.text().to_string();
    for attachment in turn.attachments().iter().filter(|a| !a.is_inline_image()) {
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(&format!("[attachment: {}]", attachment));
    }
    text
}

/// Inline images of a turn, sent as image content to vision-capable APIs.
pub(crate) fn inline_images(turn: &ConversationTurn) -> Vec<&AttachmentRef> {
    turn.attachments()
        .iter()
        .filter(|a| a.is_inline_image())
        .collect()
}
