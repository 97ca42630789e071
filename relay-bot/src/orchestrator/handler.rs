//! Relay handler: one live-edited reply per triggering message, at most one per thread.
//!
//! **Data flow:** `Handler::handle` → trigger check → (image command | stream start).
//! Stream start locks the thread slot, cancels and awaits the previous response, records the
//! user message, posts the placeholder, assembles context and spawns the task that opens the
//! provider stream and runs the [`StreamScheduler`]. The task records the reply in history.

use async_trait::async_trait;
use dashmap::DashMap;
use futures::StreamExt;
use llm_client::{LlmProvider, ProviderError};
use prompt::{ContentChunk, GenerationRequest};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::commands::{parse_command, Command};
use crate::context::{ContextAssembler, HistoryEntry, ThreadHistory};
use crate::core::{Bot, Chat, Handler, HandlerResponse, Message, MessageHandle, Result};
use crate::files::{FileResolver, FileSettings, DEFAULT_MAX_FILE_SIZE};
use crate::mention::{get_question, DEFAULT_EMPTY_MENTION_PROMPT};
use crate::redaction::RedactionPolicy;
use crate::stream::{StreamScheduler, TerminalOutcome};

pub const DEFAULT_THINKING_MESSAGE: &str = "Thinking...";
pub const DEFAULT_CONTEXT_TOKEN_BUDGET: usize = 4096;

const MSG_IMAGE_USAGE: &str = "Usage: /image <description>";
const MSG_IMAGE_FAILED: &str = "⚠️ Failed to generate an image";

/// Tunables of the relay handler.
#[derive(Debug, Clone)]
pub struct RelayOptions {
    /// Placeholder posted before the first chunk arrives.
    pub thinking_message: String,
    pub token_budget: usize,
    /// Download image attachments and send them to the model.
    pub image_file_access: bool,
    /// Attachments larger than this are skipped.
    pub max_file_size: u64,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            thinking_message: DEFAULT_THINKING_MESSAGE.to_string(),
            token_budget: DEFAULT_CONTEXT_TOKEN_BUDGET,
            image_file_access: false,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

/// The response currently streaming in a thread.
struct ActiveResponse {
    cancel: CancellationToken,
    task: JoinHandle<TerminalOutcome>,
}

type Slot = Arc<Mutex<Option<ActiveResponse>>>;

/// **Entry point.** Relays triggering messages to the provider and streams replies back.
pub struct RelayHandler {
    bot: Arc<dyn Bot>,
    provider: Arc<dyn LlmProvider>,
    assembler: Arc<ContextAssembler>,
    scheduler: Arc<StreamScheduler>,
    history: Arc<ThreadHistory>,
    redaction: RedactionPolicy,
    files: FileResolver,
    bot_username: Option<String>,
    options: RelayOptions,
    slots: DashMap<String, Slot>,
}

impl RelayHandler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        bot: Arc<dyn Bot>,
        provider: Arc<dyn LlmProvider>,
        assembler: ContextAssembler,
        scheduler: StreamScheduler,
        history: Arc<ThreadHistory>,
        redaction: RedactionPolicy,
        bot_username: Option<String>,
        options: RelayOptions,
    ) -> Self {
        let files = FileResolver::new(
            bot.clone(),
            FileSettings {
                image_access: options.image_file_access,
                max_file_size: options.max_file_size,
            },
        );
        Self {
            bot,
            provider,
            assembler: Arc::new(assembler),
            scheduler: Arc::new(scheduler),
            history,
            redaction,
            files,
            bot_username,
            options,
            slots: DashMap::new(),
        }
    }

    pub fn history(&self) -> &Arc<ThreadHistory> {
        &self.history
    }

    /// Question text if the message should get a reply; `None` otherwise.
    pub fn get_question(&self, message: &Message) -> Option<String> {
        get_question(
            message,
            self.bot_username.as_deref(),
            Some(DEFAULT_EMPTY_MENTION_PROMPT),
        )
    }

    fn slot(&self, thread_id: &str) -> Slot {
        self.slots
            .entry(thread_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone()
    }

    /// Cancels the thread's active response and waits for it to finish.
    /// Returns its outcome, or `None` when nothing was running.
    #[instrument(skip(self))]
    pub async fn abort(&self, thread_id: &str) -> Option<TerminalOutcome> {
        let slot = self.slots.get(thread_id).map(|s| s.clone())?;
        let mut active = slot.lock().await;
        let previous = active.take()?;
        Self::stop_active(previous, thread_id).await
    }

    /// Cancels every active response and waits for all of them.
    pub async fn shutdown(&self) {
        let thread_ids: Vec<String> = self.slots.iter().map(|e| e.key().clone()).collect();
        info!(threads = thread_ids.len(), "Shutting down active responses");
        for thread_id in thread_ids {
            self.abort(&thread_id).await;
        }
    }

    async fn stop_active(active: ActiveResponse, thread_id: &str) -> Option<TerminalOutcome> {
        active.cancel.cancel();
        match active.task.await {
            Ok(outcome) => {
                debug!(thread_id = %thread_id, outcome = outcome.label(), "Previous response ended");
                Some(outcome)
            }
            Err(e) => {
                error!(thread_id = %thread_id, error = %e, "Response task panicked");
                None
            }
        }
    }

    #[instrument(skip(self, message, question), fields(thread_id = %message.chat.thread_id()))]
    async fn start_response(&self, message: &Message, question: String) -> Result<()> {
        let thread_id = message.chat.thread_id();
        let files = self.files.resolve(&message.attachments).await;
        let text = files.apply_to(&question);

        let slot = self.slot(&thread_id);
        let mut active = slot.lock().await;

        if let Some(previous) = active.take() {
            if !previous.task.is_finished() {
                info!("Superseding active response");
            }
            Self::stop_active(previous, &thread_id).await;
        }

        self.history.push(
            &thread_id,
            HistoryEntry::from_message(message, text).with_attachments(files.images),
        );

        let handle = self
            .bot
            .post(&message.chat, &self.options.thinking_message)
            .await?;
        let request = self
            .assembler
            .assemble(&self.history.snapshot(&thread_id), self.options.token_budget);

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_response(
            self.provider.clone(),
            self.scheduler.clone(),
            self.history.clone(),
            thread_id,
            request,
            handle,
            cancel.clone(),
        ));
        *active = Some(ActiveResponse { cancel, task });
        Ok(())
    }

    #[instrument(skip(self, chat, prompt), fields(chat_id = chat.id))]
    async fn generate_image(&self, chat: &Chat, prompt: &str) -> Result<HandlerResponse> {
        if prompt.is_empty() {
            self.bot.send_message(chat, MSG_IMAGE_USAGE).await?;
            return Ok(HandlerResponse::Stop);
        }

        let prompt = self.redaction.redact_inbound(prompt);
        let timeout = self.scheduler.settings().timeout;
        let result = tokio::time::timeout(timeout, self.provider.generate_image(&prompt))
            .await
            .unwrap_or(Err(ProviderError::Timeout));

        match result {
            Ok(image) => {
                info!(image = %image, "Image generated");
                self.bot.send_image(chat, &image, Some(prompt.as_ref())).await?;
            }
            Err(e) => {
                warn!(error = %e, "Image generation failed");
                self.bot
                    .send_message(chat, &format!("{}: {}", MSG_IMAGE_FAILED, e))
                    .await?;
            }
        }
        Ok(HandlerResponse::Started)
    }
}

/// Opens the provider stream and runs the scheduler; records the reply when done.
async fn run_response(
    provider: Arc<dyn LlmProvider>,
    scheduler: Arc<StreamScheduler>,
    history: Arc<ThreadHistory>,
    thread_id: String,
    request: GenerationRequest,
    handle: MessageHandle,
    cancel: CancellationToken,
) -> TerminalOutcome {
    // One deadline covers opening the stream and consuming it.
    let deadline = Instant::now() + scheduler.settings().timeout;
    let opened = tokio::select! {
        biased;
        _ = cancel.cancelled() => Ok(futures::stream::empty::<ContentChunk>().boxed()),
        result = tokio::time::timeout_at(deadline, provider.generate(request)) => {
            result.unwrap_or(Err(ProviderError::Timeout))
        }
    };

    let outcome = match opened {
        Ok(stream) => scheduler.run_until(stream, handle, cancel, deadline).await,
        Err(e) => {
            warn!(thread_id = %thread_id, provider = provider.name(), error = %e, "Provider request failed");
            scheduler.fail(handle, e).await
        }
    };

    if let Some(reply) = outcome.reply_for_history() {
        history.push(&thread_id, HistoryEntry::from_bot(reply));
    }
    info!(
        thread_id = %thread_id,
        outcome = outcome.label(),
        shown_len = outcome.shown_text().len(),
        "Response ended"
    );
    outcome
}

#[async_trait]
impl Handler for RelayHandler {
    #[instrument(skip(self, message), fields(chat_id = message.chat.id, user_id = message.user.id))]
    async fn handle(&self, message: &Message) -> Result<HandlerResponse> {
        if message.user.is_bot {
            debug!("Ignoring message from a bot");
            return Ok(HandlerResponse::Ignore);
        }
        let Some(question) = self.get_question(message) else {
            return Ok(HandlerResponse::Ignore);
        };

        match parse_command(&question) {
            Some(Command::Image(prompt)) => return self.generate_image(&message.chat, prompt).await,
            Some(Command::Stop) => {
                let stopped = self.abort(&message.chat.thread_id()).await;
                debug!(stopped = stopped.is_some(), "Stop command");
                return Ok(HandlerResponse::Stop);
            }
            None => {}
        }

        self.start_response(message, question).await?;
        Ok(HandlerResponse::Started)
    }
}
