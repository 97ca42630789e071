//! REPL runner: converts teloxide messages to core::Message and passes them to the handler.

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{error, info, instrument, warn};

use super::adapters::TelegramMessageWrapper;
use crate::core::{Handler, ToCoreMessage};

/// Bot username from `get_me`, used for @mention detection and the system text.
pub async fn resolve_bot_username(bot: &teloxide::Bot) -> Option<String> {
    match bot.get_me().await {
        Ok(me) => {
            let username = me.user.username.clone();
            if let Some(ref name) = username {
                info!(username = %name, "Bot username resolved");
            }
            username
        }
        Err(e) => {
            warn!(error = %e, "get_me failed; @mentions will not be detected");
            None
        }
    }
}

/// Starts the REPL. Each message is converted to core::Message and handled in a spawned
/// task so the REPL returns immediately. Returns when the REPL stops (Ctrl-C).
#[instrument(skip(bot, handler))]
pub async fn run_repl(bot: teloxide::Bot, handler: Arc<dyn Handler>) -> Result<()> {
    teloxide::repl(bot, move |_bot: Bot, msg: teloxide::types::Message| {
        let handler = handler.clone();

        async move {
            let core_msg = TelegramMessageWrapper(&msg).to_core();
            info!(
                user_id = core_msg.user.id,
                chat_id = core_msg.chat.id,
                message_id = %core_msg.id,
                content_len = core_msg.content.len(),
                attachments = core_msg.attachments.len(),
                "Received message"
            );

            tokio::spawn(async move {
                if let Err(e) = handler.handle(&core_msg).await {
                    error!(error = %e, user_id = core_msg.user.id, chat_id = core_msg.chat.id, "Handler failed");
                }
            });

            respond(())
        }
    })
    .await;

    Ok(())
}
