//! Wraps teloxide::Bot and implements [`crate::core::Bot`].
//!
//! Edits use HTML parse mode when markdown translation is on; everything else is sent as
//! plain text. The mode is fixed at construction.

use async_trait::async_trait;
use prompt::AttachmentRef;
use teloxide::{
    net::Download,
    prelude::*,
    types::{ChatId, FileId, InputFile, MessageId, ParseMode},
};

use crate::core::{parse_message_id, Bot as CoreBot, Chat, MessageHandle, RelayError, Result};

/// Thin wrapper around teloxide::Bot that implements core's Bot trait.
pub struct TelegramBotAdapter {
    bot: teloxide::Bot,
    parse_mode: Option<ParseMode>,
}

impl TelegramBotAdapter {
    /// Adapter that sends edits as plain text.
    pub fn new(bot: teloxide::Bot) -> Self {
        Self {
            bot,
            parse_mode: None,
        }
    }

    /// Adapter that sends edits with the given parse mode.
    pub fn with_parse_mode(bot: teloxide::Bot, parse_mode: ParseMode) -> Self {
        Self {
            bot,
            parse_mode: Some(parse_mode),
        }
    }

    /// Returns the underlying teloxide::Bot for direct API use when needed.
    pub fn inner(&self) -> &teloxide::Bot {
        &self.bot
    }
}

fn bot_error(e: teloxide::RequestError) -> RelayError {
    RelayError::Bot(e.to_string())
}

#[async_trait]
impl CoreBot for TelegramBotAdapter {
    async fn post(&self, chat: &Chat, text: &str) -> Result<MessageHandle> {
        let sent = self
            .bot
            .send_message(ChatId(chat.id), text.to_string())
            .await
            .map_err(bot_error)?;
        Ok(MessageHandle::new(chat.clone(), sent.id.to_string()))
    }

    async fn edit(&self, handle: &MessageHandle, text: &str) -> Result<()> {
        let id = parse_message_id(handle.message_id())?;
        let mut request =
            self.bot
                .edit_message_text(ChatId(handle.chat().id), MessageId(id), text.to_string());
        if let Some(mode) = self.parse_mode {
            request = request.parse_mode(mode);
        }
        request.await.map_err(bot_error)?;
        Ok(())
    }

    async fn send_message(&self, chat: &Chat, text: &str) -> Result<()> {
        self.bot
            .send_message(ChatId(chat.id), text.to_string())
            .await
            .map_err(bot_error)?;
        Ok(())
    }

    async fn send_image(
        &self,
        chat: &Chat,
        image: &AttachmentRef,
        caption: Option<&str>,
    ) -> Result<()> {
        if !image.is_url() {
            return Err(RelayError::Bot(format!(
                "Unsupported image reference: {}",
                image
            )));
        }
        let url = reqwest::Url::parse(image.as_str())
            .map_err(|e| RelayError::Bot(format!("Invalid image URL: {}", e)))?;
        let mut request = self.bot.send_photo(ChatId(chat.id), InputFile::url(url));
        if let Some(caption) = caption {
            request = request.caption(caption.to_string());
        }
        request.await.map_err(bot_error)?;
        Ok(())
    }

    async fn download(&self, file_id: &str) -> Result<Vec<u8>> {
        let file = self
            .bot
            .get_file(FileId(file_id.to_string()))
            .await
            .map_err(bot_error)?;
        let mut bytes = Vec::with_capacity(file.size as usize);
        self.bot
            .download_file(&file.path, &mut bytes)
            .await
            .map_err(|e| RelayError::Bot(format!("Failed to download file: {}", e)))?;
        Ok(bytes)
    }
}
