//! Adapters from Telegram (teloxide) types to core types.

use crate::core::{
    Chat, ChatKind, FileAttachment, Message, MessageDirection, ToCoreMessage, ToCoreUser, User,
};

/// Telegram re-encodes every photo as JPEG.
const PHOTO_MIME_TYPE: &str = "image/jpeg";

/// Wraps a teloxide User for conversion to core [`User`].
pub struct TelegramUserWrapper<'a>(pub &'a teloxide::types::User);

impl<'a> ToCoreUser for TelegramUserWrapper<'a> {
    fn to_core(&self) -> User {
        User {
            id: self.0.id.0 as i64,
            username: self.0.username.clone(),
            first_name: Some(self.0.first_name.clone()),
            last_name: self.0.last_name.clone(),
            is_bot: self.0.is_bot,
        }
    }
}

/// Wraps a teloxide Message for conversion to core [`Message`].
pub struct TelegramMessageWrapper<'a>(pub &'a teloxide::types::Message);

impl<'a> ToCoreMessage for TelegramMessageWrapper<'a> {
    fn to_core(&self) -> Message {
        Message {
            id: self.0.id.to_string(),
            user: self
                .0
                .from
                .as_ref()
                .map(|u| TelegramUserWrapper(u).to_core())
                .unwrap_or_else(User::unknown),
            chat: Chat {
                id: self.0.chat.id.0,
                chat_type: self.chat_kind(),
            },
            content: self
                .0
                .text()
                .or_else(|| self.0.caption())
                .unwrap_or("")
                .to_string(),
            attachments: self.attachments(),
            direction: MessageDirection::Incoming,
            created_at: self.0.date,
            reply_to_message_id: self.get_reply_to_message_id(),
            reply_to_message_from_bot: self.get_reply_to_message_from_bot(),
        }
    }
}

impl<'a> TelegramMessageWrapper<'a> {
    fn chat_kind(&self) -> ChatKind {
        let chat = &self.0.chat;
        if chat.is_private() {
            ChatKind::Private
        } else if chat.is_channel() {
            ChatKind::Channel
        } else {
            ChatKind::Group
        }
    }

    /// Largest photo size and any document.
    fn attachments(&self) -> Vec<FileAttachment> {
        let photo = self.0.photo().and_then(|sizes| sizes.last()).map(|p| {
            FileAttachment::new(p.file.id.to_string(), u64::from(p.file.size))
                .with_mime_type(PHOTO_MIME_TYPE)
        });
        let document = self.0.document().map(|d| FileAttachment {
            file_id: d.file.id.to_string(),
            file_name: d.file_name.clone(),
            mime_type: d.mime_type.as_ref().map(|m| m.essence_str().to_string()),
            size: u64::from(d.file.size),
        });
        photo.into_iter().chain(document).collect()
    }

    /// Returns the id of the replied-to message if present.
    fn get_reply_to_message_id(&self) -> Option<String> {
        self.0.reply_to_message().map(|msg| msg.id.to_string())
    }

    /// Returns true if the replied-to message was sent by a bot.
    fn get_reply_to_message_from_bot(&self) -> bool {
        self.0
            .reply_to_message()
            .and_then(|m| m.from.as_ref())
            .map(|u| u.is_bot)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telegram_user_wrapper_to_core() {
        let user = teloxide::types::User {
            id: teloxide::types::UserId(123),
            is_bot: false,
            first_name: "Test".to_string(),
            last_name: Some("User".to_string()),
            username: Some("testuser".to_string()),
            language_code: Some("en".to_string()),
            is_premium: false,
            added_to_attachment_menu: false,
        };

        let core_user = TelegramUserWrapper(&user).to_core();

        assert_eq!(core_user.id, 123);
        assert_eq!(core_user.username, Some("testuser".to_string()));
        assert_eq!(core_user.first_name, Some("Test".to_string()));
        assert_eq!(core_user.last_name, Some("User".to_string()));
        assert!(!core_user.is_bot);
    }

    /// **Test: Bot authors keep is_bot so the handler can ignore them.**
    #[test]
    fn test_telegram_user_wrapper_bot() {
        let user = teloxide::types::User {
            id: teloxide::types::UserId(456),
            is_bot: true,
            first_name: "Other".to_string(),
            last_name: None,
            username: None,
            language_code: None,
            is_premium: false,
            added_to_attachment_menu: false,
        };

        let core_user = TelegramUserWrapper(&user).to_core();

        assert_eq!(core_user.id, 456);
        assert_eq!(core_user.username, None);
        assert!(core_user.is_bot);
    }
}
