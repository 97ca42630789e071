//! OpenAI variant: wraps openai-client for streamed chat and image-generation-client for images.

use async_trait::async_trait;
use futures::StreamExt;
use image_generation_client::ImageGenerationClient;
use openai_client::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestMessageContentPartImage, ChatCompletionRequestMessageContentPartText,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionRequestUserMessageContent, ChatCompletionRequestUserMessageContentPart,
    CompletionOptions, ImageUrl, OpenAIClient,
};
use prompt::{AttachmentRef, ContentChunk, ConversationTurn, GenerationRequest, MessageRole};
use tracing::instrument;

use crate::{inline_images, text_with_attachments, ChunkStream, LlmProvider, ProviderError};

#[derive(Clone)]
pub struct OpenAiProvider {
    client: OpenAIClient,
    images: ImageGenerationClient,
    model: String,
}

impl OpenAiProvider {
    pub fn new(api_key: String, base_url: &str, model: &str, image_model: &str) -> Self {
        Self {
            client: OpenAIClient::with_base_url(api_key.clone(), base_url.to_string()),
            images: ImageGenerationClient::with_base_url(api_key, base_url.to_string())
                .with_model(image_model),
            model: model.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// User content: plain text, or text followed by `image_url` parts when the turn has inline images.
fn user_content(turn: &ConversationTurn, text: String) -> ChatCompletionRequestUserMessageContent {
    let images = inline_images(turn);
    if images.is_empty() {
        return ChatCompletionRequestUserMessageContent::Text(text);
    }
    let mut parts = vec![ChatCompletionRequestUserMessageContentPart::Text(
        ChatCompletionRequestMessageContentPartText { text },
    )];
    parts.extend(images.into_iter().map(|image| {
        ChatCompletionRequestUserMessageContentPart::ImageUrl(
            ChatCompletionRequestMessageContentPartImage {
                image_url: ImageUrl {
                    url: image.as_str().to_string(),
                    detail: None,
                },
            },
        )
    }));
    ChatCompletionRequestUserMessageContent::Array(parts)
}

/// Converts a turn into OpenAI API message format.
fn turn_to_openai(turn: &ConversationTurn) -> Result<ChatCompletionRequestMessage, ProviderError> {
    let content = text_with_attachments(turn);
    let message: ChatCompletionRequestMessage = match turn.role() {
        MessageRole::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()
            .map_err(|e| ProviderError::InvalidRequest(e.to_string()))?
            .into(),
        MessageRole::User => ChatCompletionRequestUserMessageArgs::default()
            .content(user_content(turn, content))
            .build()
            .map_err(|e| ProviderError::InvalidRequest(e.to_string()))?
            .into(),
        MessageRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(content)
            .build()
            .map_err(|e| ProviderError::InvalidRequest(e.to_string()))?
            .into(),
    };
    Ok(message)
}

pub(crate) fn request_to_openai(
    request: &GenerationRequest,
) -> Result<Vec<ChatCompletionRequestMessage>, ProviderError> {
    let mut messages = Vec::with_capacity(request.turns().len() + 1);
    if request.system_turn().is_none() {
        if let Some(system) = request.params().system_text.as_deref() {
            messages.push(turn_to_openai(&ConversationTurn::system(system))?);
        }
    }
    for turn in request.turns() {
        messages.push(turn_to_openai(turn)?);
    }
    Ok(messages)
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    #[instrument(skip(self, request), fields(model = %self.model, turns = request.turns().len()))]
    async fn generate(&self, request: GenerationRequest) -> Result<ChunkStream, ProviderError> {
        let attachment_count: usize = request.turns().iter().map(|t| t.attachments().len()).sum();
        if attachment_count > 0 {
            tracing::debug!(attachment_count, "Request carries attachments");
        }

        let messages = request_to_openai(&request)?;
        let options = CompletionOptions {
            temperature: request.params().temperature,
            max_tokens: request.params().max_tokens,
        };

        let deltas = self
            .client
            .chat_completion_stream(&self.model, messages, options)
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        // Stop after the first final chunk so consumers never see items past it.
        let chunks = deltas
            .map(|delta| match delta {
                Ok(d) if d.finished => ContentChunk::final_text(d.content),
                Ok(d) => ContentChunk::text(d.content),
                Err(e) => ContentChunk::error(e.to_string()),
            })
            .chain(futures::stream::once(async { ContentChunk::done() }))
            .scan(false, |ended, chunk| {
                let item = if *ended {
                    None
                } else {
                    *ended = chunk.is_final;
                    Some(chunk)
                };
                futures::future::ready(item)
            });

        Ok(chunks.boxed())
    }

    #[instrument(skip(self, prompt))]
    async fn generate_image(&self, prompt: &str) -> Result<AttachmentRef, ProviderError> {
        self.images
            .generate_image(prompt)
            .await
            .map(AttachmentRef::new)
            .map_err(|e| ProviderError::Request(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prompt::GenerationParams;

    /// **Test: Turn order and roles are kept one-to-one.**
    #[test]
    fn request_maps_turns_in_order() {
        let request = GenerationRequest::new(
            vec![
                ConversationTurn::system("be brief"),
                ConversationTurn::user("hi"),
                ConversationTurn::assistant("hello"),
            ],
            GenerationParams::default(),
        );
        let messages = request_to_openai(&request).unwrap();
        assert_eq!(messages.len(), 3);
        assert!(matches!(messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(messages[1], ChatCompletionRequestMessage::User(_)));
        assert!(matches!(messages[2], ChatCompletionRequestMessage::Assistant(_)));
    }

    /// **Test: system_text is used only when the request has no System turn.**
    #[test]
    fn system_text_fallback() {
        let params = GenerationParams {
            system_text: Some("be brief".to_string()),
            ..GenerationParams::default()
        };
        let request = GenerationRequest::new(vec![ConversationTurn::user("hi")], params.clone());
        let messages = request_to_openai(&request).unwrap();
        assert_eq!(messages.len(), 2);
        assert!(matches!(messages[0], ChatCompletionRequestMessage::System(_)));

        let request = GenerationRequest::new(
            vec![ConversationTurn::system("own"), ConversationTurn::user("hi")],
            params,
        );
        assert_eq!(request_to_openai(&request).unwrap().len(), 2);
    }

    /// **Test: Inline images become image_url parts after the text part.**
    #[test]
    fn inline_images_become_image_parts() {
        let image = AttachmentRef::data_url("image/png", "iVBORw0KGgo=");
        let turn = ConversationTurn::new(MessageRole::User, "what is this?", vec![image]);

        let ChatCompletionRequestMessage::User(message) = turn_to_openai(&turn).unwrap() else {
            panic!("expected a user message");
        };
        let ChatCompletionRequestUserMessageContent::Array(parts) = message.content else {
            panic!("expected content parts");
        };
        assert_eq!(parts.len(), 2);
        assert!(matches!(
            &parts[0],
            ChatCompletionRequestUserMessageContentPart::Text(t) if t.text == "what is this?"
        ));
        assert!(matches!(
            &parts[1],
            ChatCompletionRequestUserMessageContentPart::ImageUrl(i)
                if i.image_url.url == "data:image/png;base64,iVBORw0KGgo="
        ));

        let plain = turn_to_openai(&ConversationTurn::user("hi")).unwrap();
        let ChatCompletionRequestMessage::User(message) = plain else {
            panic!("expected a user message");
        };
        assert_eq!(
            message.content,
            ChatCompletionRequestUserMessageContent::Text("hi".to_string())
        );
    }
}
