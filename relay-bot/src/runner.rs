//! Wires config, provider, Telegram adapter and handler, then runs the REPL.

use anyhow::{Context, Result};
use std::sync::Arc;
use teloxide::types::ParseMode;
use tracing::{error, info, instrument};

use crate::config::RelayConfig;
use crate::context::{ContextAssembler, ThreadHistory};
use crate::core::{init_tracing, Bot};
use crate::markdown::TranslationMode;
use crate::orchestrator::RelayHandler;
use crate::stream::StreamScheduler;
use crate::telegram::{resolve_bot_username, run_repl, TelegramBotAdapter};

/// Builds the teloxide bot, honouring a custom Bot API URL.
pub fn build_teloxide_bot(config: &RelayConfig) -> teloxide::Bot {
    let bot = teloxide::Bot::new(config.bot_token());
    match config.telegram_api_url() {
        Some(url_str) => match reqwest::Url::parse(url_str) {
            Ok(url) => bot.set_api_url(url),
            Err(e) => {
                error!(error = %e, url = %url_str, "Invalid TELEGRAM_API_URL, using default");
                bot
            }
        },
        None => bot,
    }
}

/// Builds the relay handler from config and already-resolved collaborators.
pub fn build_handler(
    config: &RelayConfig,
    bot: Arc<dyn Bot>,
    provider: Arc<dyn llm_client::LlmProvider>,
    bot_username: Option<String>,
) -> RelayHandler {
    let pipeline = &config.pipeline;
    let assembler = ContextAssembler::new(pipeline.generation_params(), pipeline.redaction.clone())
        .with_bot_username(bot_username.as_deref());
    let scheduler = StreamScheduler::new(
        bot.clone(),
        pipeline.stream_settings(),
        pipeline.redaction.clone(),
    );
    RelayHandler::new(
        bot,
        provider,
        assembler,
        scheduler,
        Arc::new(ThreadHistory::new(pipeline.history_limit)),
        pipeline.redaction.clone(),
        bot_username,
        pipeline.relay_options(),
    )
}

/// Main entry: validate config, init logging, build provider and handler, run REPL, then
/// cancel whatever is still streaming.
#[instrument(skip(config))]
pub async fn run_bot(config: RelayConfig) -> Result<()> {
    config.validate()?;
    init_tracing(config.log_file())?;

    let provider = llm_client::build_provider(&config.provider)
        .context("Failed to build AI provider")?;
    info!(
        provider = provider.name(),
        model = %config.provider.model(),
        translate_markdown = config.pipeline.translate_markdown,
        inbound_redaction = config.pipeline.redaction.inbound_enabled(),
        outbound_redaction = config.pipeline.redaction.outbound_enabled(),
        "Initializing bot"
    );

    let teloxide_bot = build_teloxide_bot(&config);
    let bot_username = resolve_bot_username(&teloxide_bot).await;

    let adapter = match config.pipeline.translation_mode() {
        TranslationMode::TelegramHtml => {
            TelegramBotAdapter::with_parse_mode(teloxide_bot.clone(), ParseMode::Html)
        }
        TranslationMode::Passthrough => TelegramBotAdapter::new(teloxide_bot.clone()),
    };
    let handler = Arc::new(build_handler(
        &config,
        Arc::new(adapter),
        provider,
        bot_username,
    ));

    info!("Bot started successfully");
    run_repl(teloxide_bot, handler.clone()).await?;

    handler.shutdown().await;
    info!("Bot stopped");
    Ok(())
}
