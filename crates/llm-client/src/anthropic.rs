//! Anthropic variant: Messages API with SSE streaming over reqwest.
//!
//! The system turn goes into the top-level `system` field; every other turn becomes a
//! `messages` entry. The SSE framing is parsed by `eventsource-stream`; each event's JSON payload
//! is dispatched on its `type`:
//! `content_block_delta`/`text_delta` yields text, `message_stop` ends the stream,
//! `error` becomes an error chunk.

use async_trait::async_trait;
use eventsource_stream::{EventStreamError, Eventsource};
use futures::{future, Stream, StreamExt};
use prompt::{AttachmentRef, ContentChunk, ConversationTurn, GenerationRequest, MessageRole};
use serde::Serialize;
use std::fmt::Display;
use tracing::{debug, instrument, trace, warn};

use crate::{inline_images, text_with_attachments, ChunkStream, LlmProvider, ProviderError};

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize, PartialEq)]
struct AnthropicMessage {
    role: &'static str,
    content: AnthropicContent,
}

/// A plain string, or content blocks when the turn carries inline images.
#[derive(Debug, Serialize, PartialEq)]
#[serde(untagged)]
enum AnthropicContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    Image { source: ImageSource },
}

#[derive(Debug, Serialize, PartialEq)]
struct ImageSource {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: String,
    data: String,
}

fn turn_content(turn: &ConversationTurn) -> AnthropicContent {
    let text = text_with_attachments(turn);
    let images: Vec<ContentBlock> = inline_images(turn)
        .into_iter()
        .filter_map(|image| image.data_url_parts())
        .map(|(media_type, data)| ContentBlock::Image {
            source: ImageSource {
                kind: "base64",
                media_type: media_type.to_string(),
                data: data.to_string(),
            },
        })
        .collect();
    if images.is_empty() {
        return AnthropicContent::Text(text);
    }
    let mut blocks = images;
    if !text.is_empty() {
        blocks.push(ContentBlock::Text { text });
    }
    AnthropicContent::Blocks(blocks)
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    messages: Vec<AnthropicMessage>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

impl AnthropicProvider {
    pub fn new(api_key: String, base_url: &str, model: &str) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| ProviderError::Request(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: model.to_string(),
            client,
        })
    }

    fn build_body<'a>(&'a self, request: &GenerationRequest) -> MessagesRequest<'a> {
        let system = request
            .system_turn()
            .map(|t| t.text().to_string())
            .or_else(|| request.params().system_text.clone());

        let messages = request
            .conversation()
            .iter()
            .filter_map(|turn| {
                let role = match turn.role() {
                    MessageRole::User => "user",
                    MessageRole::Assistant => "assistant",
                    MessageRole::System => return None,
                };
                Some(AnthropicMessage {
                    role,
                    content: turn_content(turn),
                })
            })
            .collect();

        MessagesRequest {
            model: &self.model,
            messages,
            max_tokens: request.params().max_tokens,
            temperature: request.params().temperature,
            stream: true,
            system,
        }
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    #[instrument(skip(self, request), fields(model = %self.model, turns = request.turns().len()))]
    async fn generate(&self, request: GenerationRequest) -> Result<ChunkStream, ProviderError> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = self.build_body(&request);

        debug!(
            message_count = body.messages.len(),
            api_key = %openai_client::mask_token(&self.api_key),
            "Sending Anthropic streaming request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Accept", "text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %error_body, "Anthropic API error");
            return Err(ProviderError::Request(format!(
                "HTTP {}: {}",
                status.as_u16(),
                error_body
            )));
        }

        Ok(sse_chunks(response.bytes_stream()))
    }

    async fn generate_image(&self, _prompt: &str) -> Result<AttachmentRef, ProviderError> {
        Err(ProviderError::Unsupported(
            "image generation is not available with the Anthropic provider".to_string(),
        ))
    }
}

/// Maps one SSE `data:` payload to a chunk, if it carries one.
pub(crate) fn event_to_chunk(data: &str) -> Option<ContentChunk> {
    let event: serde_json::Value = match serde_json::from_str(data) {
        Ok(v) => v,
        Err(e) => {
            trace!(error = %e, data = %data, "Ignoring unparseable Anthropic SSE");
            return None;
        }
    };

    match event["type"].as_str().unwrap_or("") {
        "content_block_delta" => {
            let delta = &event["delta"];
            if delta["type"].as_str() != Some("text_delta") {
                return None;
            }
            delta["text"]
                .as_str()
                .filter(|t| !t.is_empty())
                .map(ContentChunk::text)
        }
        "message_stop" => Some(ContentChunk::done()),
        "error" => {
            let message = event["error"]["message"]
                .as_str()
                .unwrap_or("unknown Anthropic stream error");
            Some(ContentChunk::error(message))
        }
        _ => None,
    }
}

/// Turns an SSE byte stream into a chunk stream that ends after its first final chunk.
///
/// A transport or framing error becomes an error chunk; a stream that closes without
/// `message_stop` ends with Done.
pub(crate) fn sse_chunks<S, B, E>(bytes: S) -> ChunkStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let chunks = bytes.eventsource().filter_map(|event| {
        future::ready(match event {
            Ok(event) => {
                trace!(event = %event.event, "Anthropic SSE event");
                event_to_chunk(&event.data)
            }
            Err(EventStreamError::Transport(e)) => Some(ContentChunk::error(e.to_string())),
            Err(e) => Some(ContentChunk::error(e.to_string())),
        })
    });
    let end = futures::stream::once(async {
        debug!("Anthropic stream ended without message_stop");
        ContentChunk::done()
    });

    chunks
        .chain(end)
        .scan(false, |finished, chunk| {
            if *finished {
                return future::ready(None);
            }
            *finished = chunk.is_final;
            future::ready(Some(chunk))
        })
        .boxed()
}
