//! Drives one response: chunk stream in, throttled edits of one message out.

use futures::StreamExt;
use llm_client::{ChunkStream, ProviderError};
use prompt::ChunkKind;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::edit::{edit_final, edit_intermediate};
use super::outcome::TerminalOutcome;
use super::pages::{first_page, split_pages, MAX_MESSAGE_CHARS};
use crate::core::{Bot, MessageHandle};
use crate::markdown::{escape_html, TranslationMode, TranslationState};
use crate::redaction::RedactionPolicy;

/// Shown when a completed reply rendered to nothing.
pub const NO_REPLY_TEXT: &str = "(no reply)";
/// Shown when a reply was cancelled before anything was rendered.
pub const CANCELLED_TEXT: &str = "(cancelled)";
/// Start of the notice appended to a failed reply.
pub const ERROR_NOTICE_PREFIX: &str = "⚠️ Failed to generate a response: ";
/// Posted for each overflow page before its text is edited in.
const OVERFLOW_PLACEHOLDER: &str = "…";

pub const DEFAULT_EDIT_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_FINAL_EDIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Cadence and limits for a scheduler run.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamSettings {
    pub mode: TranslationMode,
    /// Minimum time between two intermediate edits.
    pub edit_interval: Duration,
    /// Overall time allowed for the stream.
    pub timeout: Duration,
    /// Retry budget for the final edit.
    pub final_edit_timeout: Duration,
    /// Longest text one message may carry; longer replies continue in follow-up messages.
    pub max_message_chars: usize,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            mode: TranslationMode::TelegramHtml,
            edit_interval: DEFAULT_EDIT_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
            final_edit_timeout: DEFAULT_FINAL_EDIT_TIMEOUT,
            max_message_chars: MAX_MESSAGE_CHARS,
        }
    }
}

enum End {
    Completed,
    Cancelled,
    Failed(ProviderError),
}

/// Intermediate edit bookkeeping for one run.
#[derive(Debug, Default)]
struct Cadence {
    /// Rendered output changed since the last flush.
    dirty: bool,
    last_attempt: Option<Instant>,
    /// Char length of the last delivered intermediate edit.
    last_len: usize,
    edits: usize,
}

impl Cadence {
    /// When the next flush may happen; `None` before the first edit (flush immediately).
    fn next_flush(&self, interval: Duration) -> Option<Instant> {
        self.last_attempt.map(|t| t + interval)
    }

    fn is_due(&self, interval: Duration) -> bool {
        self.next_flush(interval)
            .map_or(true, |at| Instant::now() >= at)
    }

    /// Clears the dirty flag and decides whether `text` is worth an edit; returns its length.
    ///
    /// Empty, unchanged and shorter-than-delivered texts are skipped. A skipped shorter text
    /// waits until new output makes the display dirty again.
    fn admit(&mut self, text: &str, handle: &MessageHandle) -> Option<usize> {
        self.dirty = false;
        if text.trim().is_empty() || handle.is_unchanged(text) {
            return None;
        }
        let len = text.chars().count();
        if len < self.last_len {
            debug!(len, last_len = self.last_len, "Deferring shorter intermediate edit");
            return None;
        }
        self.last_attempt = Some(Instant::now());
        Some(len)
    }
}

/// Prefix of `text` up to and including its last line break.
fn settled_lines(text: &str) -> &str {
    text.rfind('\n').map_or("", |i| &text[..=i])
}

/// True when `text` opened more code blocks than it closed.
fn has_open_block(text: &str) -> bool {
    text.matches("<pre").count() > text.matches("</pre>").count()
}

/// Consumes a chunk stream and keeps one posted message up to date.
///
/// The first displayable output is shown at once; after that at most one edit per
/// `edit_interval`, carrying everything received in between. Cancellation and the deadline
/// interrupt both waiting for chunks and intermediate edits. Every run ends with exactly one
/// final edit, retried until `final_edit_timeout`; a reply longer than `max_message_chars`
/// continues in follow-up messages.
pub struct StreamScheduler {
    bot: Arc<dyn Bot>,
    settings: StreamSettings,
    redaction: RedactionPolicy,
}

impl StreamScheduler {
    pub fn new(bot: Arc<dyn Bot>, settings: StreamSettings, redaction: RedactionPolicy) -> Self {
        Self {
            bot,
            settings,
            redaction,
        }
    }

    pub fn settings(&self) -> &StreamSettings {
        &self.settings
    }

    /// Intermediate display: redacted rendered output plus closing tags for still-open
    /// constructs, cut to the first page.
    ///
    /// With outbound redaction on, only complete lines are shown. A value split across chunks
    /// cannot match its pattern yet, so the unfinished line waits until it is whole.
    fn display(&self, state: &TranslationState) -> String {
        let redacted = self.redaction.redact_outbound(state.rendered());
        let mut text = if self.redaction.outbound_enabled() {
            settled_lines(&redacted).to_string()
        } else {
            redacted.into_owned()
        };
        if has_open_block(&text) {
            text.push_str(&state.open_suffix());
        }
        first_page(&text, self.settings.max_message_chars, self.settings.mode)
    }

    fn error_notice(&self, error: &ProviderError) -> String {
        let notice = format!("{}{}", ERROR_NOTICE_PREFIX, error);
        match self.settings.mode {
            TranslationMode::TelegramHtml => escape_html(&notice),
            TranslationMode::Passthrough => notice,
        }
    }

    /// Runs with a deadline of `timeout` from now.
    pub async fn run(
        &self,
        stream: ChunkStream,
        handle: MessageHandle,
        cancel: CancellationToken,
    ) -> TerminalOutcome {
        let deadline = Instant::now() + self.settings.timeout;
        self.run_until(stream, handle, cancel, deadline).await
    }

    /// Runs until the stream ends, `cancel` fires or `deadline` passes.
    #[instrument(skip_all, fields(chat_id = handle.chat().id, message_id = %handle.message_id()))]
    pub async fn run_until(
        &self,
        mut stream: ChunkStream,
        mut handle: MessageHandle,
        cancel: CancellationToken,
        deadline: Instant,
    ) -> TerminalOutcome {
        let mut state = TranslationState::new(self.settings.mode);
        let mut cadence = Cadence::default();
        let interval = self.settings.edit_interval;
        let mut chunk_count = 0usize;

        let end = loop {
            if cancel.is_cancelled() {
                break End::Cancelled;
            }
            let flush_at = cadence.next_flush(interval).unwrap_or(deadline);

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break End::Cancelled,
                _ = sleep_until(deadline) => break timed_out(chunk_count),
                _ = sleep_until(flush_at), if cadence.dirty => {
                    let flush = self.flush(&mut handle, &state, &mut cadence);
                    if let Some(end) = interrupt(flush, &cancel, deadline, chunk_count).await {
                        break end;
                    }
                }
                next = stream.next() => {
                    let Some(chunk) = next else {
                        debug!(chunk_count, "Stream ended without a final chunk");
                        break End::Completed;
                    };
                    chunk_count += 1;
                    match chunk.kind {
                        ChunkKind::Error => {
                            warn!(error = %chunk.delta_text, chunk_count, "Provider error chunk");
                            break End::Failed(ProviderError::Stream(chunk.delta_text));
                        }
                        ChunkKind::Done => break End::Completed,
                        ChunkKind::Text => {
                            if !state.feed(&chunk.delta_text).is_empty() {
                                cadence.dirty = true;
                            }
                            if chunk.is_final {
                                break End::Completed;
                            }
                            if cadence.dirty && cadence.is_due(interval) {
                                let flush = self.flush(&mut handle, &state, &mut cadence);
                                if let Some(end) = interrupt(flush, &cancel, deadline, chunk_count).await {
                                    break end;
                                }
                            }
                        }
                    }
                }
            }
        };

        debug!(chunk_count, intermediate_edits = cadence.edits, "Stream consumed");
        self.finish(end, state, handle).await
    }

    /// Ends a response whose stream never opened: error notice in the placeholder.
    #[instrument(skip_all, fields(chat_id = handle.chat().id, message_id = %handle.message_id()))]
    pub async fn fail(&self, handle: MessageHandle, error: ProviderError) -> TerminalOutcome {
        self.finish(End::Failed(error), TranslationState::new(self.settings.mode), handle)
            .await
    }

    /// Issues an intermediate edit if the display changed and did not shrink.
    async fn flush(&self, handle: &mut MessageHandle, state: &TranslationState, cadence: &mut Cadence) {
        let text = self.display(state);
        let Some(len) = cadence.admit(&text, handle) else {
            return;
        };
        let max_wait = self.settings.edit_interval;
        if edit_intermediate(self.bot.as_ref(), handle, &text, max_wait).await {
            cadence.last_len = len;
            cadence.edits += 1;
        }
    }

    /// Final edit of the placeholder, then one follow-up message per overflow page.
    async fn deliver(&self, handle: &mut MessageHandle, text: &str) -> bool {
        let budget = self.settings.final_edit_timeout;
        let mut pages = split_pages(text, self.settings.max_message_chars, self.settings.mode)
            .into_iter();
        let first = pages.next().unwrap_or_default();
        let mut delivered = edit_final(self.bot.as_ref(), handle, &first, budget).await;

        for (index, page) in pages.enumerate() {
            let mut overflow = match self.bot.post(handle.chat(), OVERFLOW_PLACEHOLDER).await {
                Ok(overflow) => overflow,
                Err(e) => {
                    warn!(error = %e, page = index + 2, "Failed to post overflow page");
                    return false;
                }
            };
            delivered &= edit_final(self.bot.as_ref(), &mut overflow, &page, budget).await;
        }
        delivered
    }

    async fn finish(
        &self,
        end: End,
        mut state: TranslationState,
        mut handle: MessageHandle,
    ) -> TerminalOutcome {
        state.finalize();
        let rendered = self.redaction.redact_outbound(state.rendered()).into_owned();
        let raw = state.raw().to_string();
        let has_output = !rendered.trim().is_empty();

        let outcome = match end {
            End::Completed => TerminalOutcome::Completed {
                text: if has_output { rendered } else { NO_REPLY_TEXT.to_string() },
                raw,
            },
            End::Cancelled => TerminalOutcome::Cancelled {
                partial_text: if has_output { rendered } else { CANCELLED_TEXT.to_string() },
                raw,
            },
            End::Failed(error) => {
                let notice = self.error_notice(&error);
                let partial_text = if has_output {
                    format!("{}\n\n{}", rendered, notice)
                } else {
                    notice
                };
                TerminalOutcome::Failed {
                    partial_text,
                    error,
                }
            }
        };

        let delivered = self.deliver(&mut handle, outcome.shown_text()).await;

        info!(
            outcome = outcome.label(),
            delivered,
            text_len = outcome.shown_text().len(),
            "Response finished"
        );
        outcome
    }
}

fn timed_out(chunk_count: usize) -> End {
    warn!(chunk_count, "Stream timed out");
    End::Failed(ProviderError::Timeout)
}

/// Awaits an intermediate flush unless `cancel` or `deadline` comes first.
async fn interrupt(
    flush: impl std::future::Future<Output = ()>,
    cancel: &CancellationToken,
    deadline: Instant,
    chunk_count: usize,
) -> Option<End> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!("Intermediate edit interrupted by cancellation");
            Some(End::Cancelled)
        }
        _ = sleep_until(deadline) => Some(timed_out(chunk_count)),
        _ = flush => None,
    }
}
