//! # OpenAI API client
//!
//! Thin wrapper around [async-openai] for streamed chat completion.
//! Provides token masking for safe logging and a delta stream the provider layer adapts into content chunks.

use async_openai::{config::OpenAIConfig, types::CreateChatCompletionRequestArgs, Client};
use futures::stream::BoxStream;
use futures::StreamExt;
use std::sync::Arc;

pub use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestMessageContentPartImage, ChatCompletionRequestMessageContentPartText,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionRequestUserMessageContent, ChatCompletionRequestUserMessageContentPart,
    ImageUrl,
};

/// Loggable form of a secret: `sk-proj***mnop`. Keys of 11 bytes or fewer, and non-ASCII
/// keys, become just `***`.
pub fn mask_token(token: &str) -> String {
    let len = token.len();
    if len <= 11 || !token.is_ascii() {
        return "***".to_string();
    }
    format!("{}***{}", &token[..7], &token[len - 4..])
}

/// Sampling options for one completion.
#[derive(Debug, Clone, Copy)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Text produced since the previous delta, and whether the model signalled a finish reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDelta {
    pub content: String,
    pub finished: bool,
}

/// Stream of deltas; an `Err` item means the HTTP stream broke mid-response.
pub type DeltaStream = BoxStream<'static, anyhow::Result<StreamDelta>>;

/// OpenAI chat client over any OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct OpenAIClient {
    client: Arc<Client<OpenAIConfig>>,
    /// Masked once at construction; the raw key lives only inside `client`.
    masked_key: String,
}

impl OpenAIClient {
    /// Builds a client for `base_url` (e.g. `https://api.openai.com/v1`, a proxy, or a
    /// compatible server).
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        let masked_key = mask_token(&api_key);
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(base_url);
        Self {
            client: Arc::new(Client::with_config(config)),
            masked_key,
        }
    }

    /// Opens a streamed chat completion and returns its deltas.
    ///
    /// Errors before the first byte (bad request, auth, network) are returned directly; errors after
    /// the stream is open surface as `Err` items. Empty deltas without a finish reason are dropped.
    #[allow(deprecated)]
    pub async fn chat_completion_stream(
        &self,
        model: &str,
        messages: Vec<ChatCompletionRequestMessage>,
        options: CompletionOptions,
    ) -> anyhow::Result<DeltaStream> {
        tracing::info!(
            model = %model,
            message_count = messages.len(),
            temperature = options.temperature,
            max_tokens = options.max_tokens,
            api_key = %self.masked_key,
            "OpenAI chat_completion_stream request"
        );

        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(messages)
            .temperature(options.temperature)
            .max_tokens(options.max_tokens)
            .build()?;

        if let Ok(json) = serde_json::to_string(&request) {
            tracing::debug!(request_json = %json, "OpenAI chat_completion_stream request JSON");
        }

        let stream = self.client.chat().create_stream(request).await?;

        let deltas = stream.filter_map(|result| async move {
            match result {
                Ok(chunk) => {
                    if let Some(ref u) = chunk.usage {
                        tracing::info!(
                            prompt_tokens = u.prompt_tokens,
                            completion_tokens = u.completion_tokens,
                            total_tokens = u.total_tokens,
                            "OpenAI chat_completion_stream usage"
                        );
                    }
                    let choice = chunk.choices.first()?;
                    let content = choice.delta.content.clone().unwrap_or_default();
                    let finished = choice.finish_reason.is_some();
                    if content.is_empty() && !finished {
                        return None;
                    }
                    Some(Ok(StreamDelta { content, finished }))
                }
                Err(e) => Some(Err(anyhow::anyhow!("Stream error: {}", e))),
            }
        });

        Ok(deltas.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Test: Keys of length ≤ 11 are fully masked.**
    #[test]
    fn mask_token_hides_short_keys() {
        assert_eq!(mask_token(""), "***");
        assert_eq!(mask_token("sk-12345"), "***");
        assert_eq!(mask_token("sk-ant-0123"), "***");
    }

    /// **Test: Longer keys keep the first 7 and last 4 characters.**
    #[test]
    fn mask_token_keeps_head_and_tail() {
        assert_eq!(mask_token("sk-proj-abcdefghijklmnop"), "sk-proj***mnop");
        assert_eq!(mask_token("sk-ant-api03-xyz9").len(), 7 + 3 + 4);
    }

    /// **Test: Non-ASCII keys are never sliced.**
    #[test]
    fn mask_token_non_ascii_is_fully_masked() {
        assert_eq!(mask_token("ключ-ключ-ключ-ключ"), "***");
    }

    #[test]
    fn client_keeps_only_masked_key() {
        let client = OpenAIClient::with_base_url(
            "sk-proj-abcdefghijklmnop".to_string(),
            "http://localhost:1234/v1".to_string(),
        );
        assert_eq!(client.masked_key, "sk-proj***mnop");
    }
}
