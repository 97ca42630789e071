//! # Prompt
//!
//! Conversation model shared by the provider clients and the relay pipeline.
//!
//! ## Types
//!
//! - **[`ConversationTurn`]**: one message of the conversation (role, text, attachments). Immutable.
//! - **[`GenerationRequest`]**: ordered turns (oldest → newest) plus [`GenerationParams`]. Built once per invocation.
//! - **[`ContentChunk`]**: one incremental unit of provider output (`Text`, `Error`, or `Done`).
//!
//! ## External interactions
//!
//! - **AI providers**: turns map one-to-one onto chat-completion `messages` entries.

use serde::{Deserialize, Serialize};

/// Role of a turn, one-to-one with chat-completion API `role` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instruction (API `role: "system"`).
    System,
    /// User message (API `role: "user"`).
    User,
    /// Assistant message (API `role: "assistant"`).
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// Reference to an attachment: a platform file id, a URL, or a `data:` URL carrying the bytes.
/// Providers decide how to use it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttachmentRef(pub String);

impl AttachmentRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the reference is an http(s) URL rather than a platform-local id.
    pub fn is_url(&self) -> bool {
        self.0.starts_with("https://") || self.0.starts_with("http://")
    }

    /// Builds a `data:` URL reference from base64-encoded bytes.
    pub fn data_url(media_type: &str, base64_data: &str) -> Self {
        Self(format!("data:{};base64,{}", media_type, base64_data))
    }

    /// Media type and base64 payload of a `data:<type>;base64,<payload>` reference.
    pub fn data_url_parts(&self) -> Option<(&str, &str)> {
        self.0.strip_prefix("data:")?.split_once(";base64,")
    }

    /// True for an image whose bytes travel inline, ready for a vision model.
    pub fn is_inline_image(&self) -> bool {
        self.data_url_parts()
            .is_some_and(|(media_type, _)| media_type.starts_with("image/"))
    }
}

impl std::fmt::Display for AttachmentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single conversation turn. Fields are private so a turn cannot change after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    role: MessageRole,
    text: String,
    attachments: Vec<AttachmentRef>,
}

impl ConversationTurn {
    pub fn new(role: MessageRole, text: impl Into<String>, attachments: Vec<AttachmentRef>) -> Self {
        Self {
            role,
            text: text.into(),
            attachments,
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(MessageRole::System, text, Vec::new())
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(MessageRole::User, text, Vec::new())
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, text, Vec::new())
    }

    pub fn role(&self) -> MessageRole {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn attachments(&self) -> &[AttachmentRef] {
        &self.attachments
    }
}

/// Sampling parameters for one generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
    /// System instruction; when set, the assembled request starts with a matching System turn.
    pub system_text: Option<String>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            max_tokens: 1024,
            system_text: None,
        }
    }
}

/// Everything a provider needs for one generation. Turns are ordered oldest → newest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    turns: Vec<ConversationTurn>,
    params: GenerationParams,
}

impl GenerationRequest {
    pub fn new(turns: Vec<ConversationTurn>, params: GenerationParams) -> Self {
        Self { turns, params }
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    /// The leading System turn, if the request carries one.
    pub fn system_turn(&self) -> Option<&ConversationTurn> {
        self.turns
            .first()
            .filter(|t| t.role() == MessageRole::System)
    }

    /// Turns after the optional leading System turn.
    pub fn conversation(&self) -> &[ConversationTurn] {
        match self.system_turn() {
            Some(_) => &self.turns[1..],
            None => &self.turns,
        }
    }
}

/// Kind of a streamed chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    /// Generated text in `delta_text`.
    Text,
    /// Provider failure mid-stream; `delta_text` carries the error message.
    Error,
    /// End of generation; `delta_text` is empty.
    Done,
}

/// One incremental unit of provider output. Consumers append, never mutate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentChunk {
    pub delta_text: String,
    pub is_final: bool,
    pub kind: ChunkKind,
}

impl ContentChunk {
    pub fn text(delta: impl Into<String>) -> Self {
        Self {
            delta_text: delta.into(),
            is_final: false,
            kind: ChunkKind::Text,
        }
    }

    /// Last text chunk of a stream (provider signalled a finish reason together with content).
    pub fn final_text(delta: impl Into<String>) -> Self {
        Self {
            delta_text: delta.into(),
            is_final: true,
            kind: ChunkKind::Text,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            delta_text: message.into(),
            is_final: true,
            kind: ChunkKind::Error,
        }
    }

    pub fn done() -> Self {
        Self {
            delta_text: String::new(),
            is_final: true,
            kind: ChunkKind::Done,
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == ChunkKind::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Test: system_turn and conversation split off a leading System turn.**
    #[test]
    fn request_splits_system_turn() {
        let request = GenerationRequest::new(
            vec![
                ConversationTurn::system("be brief"),
                ConversationTurn::user("hi"),
                ConversationTurn::assistant("hello"),
            ],
            GenerationParams::default(),
        );
        assert_eq!(request.system_turn().map(|t| t.text()), Some("be brief"));
        assert_eq!(request.conversation().len(), 2);
        assert_eq!(request.conversation()[0].role(), MessageRole::User);
    }

    /// **Test: Without a System turn, conversation is every turn.**
    #[test]
    fn request_without_system_turn() {
        let request = GenerationRequest::new(
            vec![ConversationTurn::user("hi")],
            GenerationParams::default(),
        );
        assert!(request.system_turn().is_none());
        assert_eq!(request.conversation().len(), 1);
    }

    /// **Test: Error and Done chunks are final; Text chunks are not unless built with final_text.**
    #[test]
    fn chunk_constructors_set_final_flag() {
        assert!(!ContentChunk::text("a").is_final);
        assert!(ContentChunk::final_text("a").is_final);
        assert!(ContentChunk::error("boom").is_final);
        assert!(ContentChunk::error("boom").is_error());
        assert_eq!(ContentChunk::done().kind, ChunkKind::Done);
    }

    /// **Test: Roles serialize with API role names.**
    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&MessageRole::Assistant).unwrap(), "\"assistant\"");
        assert_eq!(MessageRole::System.as_str(), "system");
    }

    /// **Test: AttachmentRef distinguishes URLs from platform ids.**
    #[test]
    fn attachment_ref_is_url() {
        assert!(AttachmentRef::new("https://example.com/a.png").is_url());
        assert!(!AttachmentRef::new("AgACAgIAAxkBAAIB").is_url());

        let image = AttachmentRef::data_url("image/png", "iVBORw0KGgo=");
        assert_eq!(image.as_str(), "data:image/png;base64,iVBORw0KGgo=");
        assert_eq!(image.data_url_parts(), Some(("image/png", "iVBORw0KGgo=")));
        assert!(image.is_inline_image());
        assert!(!image.is_url());
        assert!(!AttachmentRef::data_url("text/plain", "aGk=").is_inline_image());
        assert_eq!(AttachmentRef::new("https://example.com/a.png").data_url_parts(), None);
    }
}
