//! Trigger detection: when a message gets a reply, and what the question is.
//!
//! Private chats always trigger. In groups a message triggers when it replies to the bot or
//! @mentions it; the mention is stripped from the question.

use crate::core::Message;

/// Default prompt when a user only @mentions the bot with no text.
pub const DEFAULT_EMPTY_MENTION_PROMPT: &str =
    "The user only @mentioned you with no specific question. Please greet them briefly and invite them to ask.";

/// Returns true if `text` contains a @mention of the given bot username.
#[inline]
pub fn is_bot_mentioned(text: &str, bot_username: &str) -> bool {
    text.contains(&format!("@{}", bot_username))
}

/// Strips the bot @mention from `text` and returns the trimmed string.
#[inline]
pub fn extract_question(text: &str, bot_username: &str) -> String {
    text.replace(&format!("@{}", bot_username), "")
        .trim()
        .to_string()
}

/// Resolves the question if the message triggers a reply.
///
/// - **Private chat**: the message text (mention stripped); `None` when empty.
/// - **Reply-to-bot**: the message text.
/// - **@mention**: the text without the mention, or `empty_mention_default` when nothing is left.
/// - Otherwise `None`.
pub fn get_question(
    message: &Message,
    bot_username: Option<&str>,
    empty_mention_default: Option<&str>,
) -> Option<String> {
    let stripped = match bot_username {
        Some(username) => extract_question(&message.content, username),
        None => message.content.trim().to_string(),
    };

    if message.chat.is_private()
        || (message.reply_to_message_id.is_some() && message.reply_to_message_from_bot)
    {
        return Some(stripped).filter(|q| !q.is_empty());
    }

    let username = bot_username?;
    if !is_bot_mentioned(&message.content, username) {
        return None;
    }
    if !stripped.is_empty() {
        return Some(stripped);
    }
    empty_mention_default.map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Chat, User};

    fn message(chat: Chat, text: &str) -> Message {
        Message::incoming("1", User::unknown(), chat, text)
    }

    #[test]
    fn test_is_bot_mentioned() {
        assert!(is_bot_mentioned("hi @relay_bot", "relay_bot"));
        assert!(!is_bot_mentioned("hi relay_bot", "relay_bot"));
    }

    #[test]
    fn test_extract_question() {
        assert_eq!(extract_question("@relay_bot  what time is it ", "relay_bot"), "what time is it");
        assert_eq!(extract_question("@relay_bot", "relay_bot"), "");
    }

    /// **Test: Private chats trigger on any non-empty text, with or without a mention.**
    #[test]
    fn test_private_chat() {
        let private = Chat::private(1);
        assert_eq!(
            get_question(&message(private.clone(), "hello"), Some("relay_bot"), None),
            Some("hello".to_string())
        );
        assert_eq!(
            get_question(&message(private.clone(), "@relay_bot hello"), Some("relay_bot"), None),
            Some("hello".to_string())
        );
        assert_eq!(get_question(&message(private, "   "), None, None), None);
    }

    /// **Test: Groups trigger on a mention or a reply to the bot, nothing else.**
    #[test]
    fn test_group_chat() {
        let group = Chat::group(-1);
        assert_eq!(
            get_question(&message(group.clone(), "hello all"), Some("relay_bot"), None),
            None
        );
        assert_eq!(
            get_question(&message(group.clone(), "@relay_bot hi"), Some("relay_bot"), None),
            Some("hi".to_string())
        );
        assert_eq!(
            get_question(&message(group.clone(), "@relay_bot"), Some("relay_bot"), Some("greet")),
            Some("greet".to_string())
        );
        assert_eq!(
            get_question(&message(group.clone(), "@relay_bot"), Some("relay_bot"), None),
            None
        );
        assert_eq!(get_question(&message(group.clone(), "@relay_bot hi"), None, None), None);

        let mut reply = message(group, "go on");
        reply.reply_to_message_id = Some("9".to_string());
        reply.reply_to_message_from_bot = true;
        assert_eq!(get_question(&reply, Some("relay_bot"), None), Some("go on".to_string()));
        reply.reply_to_message_from_bot = false;
        assert_eq!(get_question(&reply, Some("relay_bot"), None), None);
    }
}
