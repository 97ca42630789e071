//! Builds a token-budgeted [`GenerationRequest`] from thread history.

use prompt::{ConversationTurn, GenerationParams, GenerationRequest, MessageRole};
use tracing::{debug, instrument};

use super::format::prefix_for;
use super::history::HistoryEntry;
use super::utils::estimate_tokens;
use crate::redaction::RedactionPolicy;

/// Placeholder in the system text replaced by the bot's username.
pub const BOT_USERNAME_PLACEHOLDER: &str = "{bot_username}";

/// Turns thread history into provider input.
///
/// History is walked newest-first; each entry is redacted (inbound) before its tokens are
/// counted, and entries are taken until the next-oldest would exceed the budget. The newest
/// entry is always taken so the request never lacks the message being answered. The system
/// turn comes from `params.system_text`, is always present when configured and is not
/// counted against the budget.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    params: GenerationParams,
    redaction: RedactionPolicy,
}

impl ContextAssembler {
    pub fn new(params: GenerationParams, redaction: RedactionPolicy) -> Self {
        Self { params, redaction }
    }

    /// Substitutes `{bot_username}` in the system text.
    pub fn with_bot_username(mut self, bot_username: Option<&str>) -> Self {
        if let (Some(name), Some(text)) = (bot_username, self.params.system_text.as_mut()) {
            *text = text.replace(BOT_USERNAME_PLACEHOLDER, name);
        }
        self
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    fn entry_to_turn(&self, entry: &HistoryEntry) -> ConversationTurn {
        let text = self.redaction.redact_inbound(&entry.text);
        let text = match (entry.role, entry.author.as_ref()) {
            (MessageRole::User, Some(author)) => format!("{}{}", prefix_for(author), text),
            _ => text.into_owned(),
        };
        ConversationTurn::new(entry.role, text, entry.attachments.clone())
    }

    #[instrument(skip(self, history), fields(history_len = history.len()))]
    pub fn assemble(&self, history: &[HistoryEntry], token_budget: usize) -> GenerationRequest {
        let mut selected = Vec::new();
        let mut used = 0usize;

        for entry in history.iter().rev() {
            let turn = self.entry_to_turn(entry);
            let cost = estimate_tokens(turn.text());
            if !selected.is_empty() && used + cost > token_budget {
                break;
            }
            used += cost;
            selected.push(turn);
        }

        let dropped = history.len() - selected.len();
        if dropped > 0 {
            debug!(
                dropped,
                kept = selected.len(),
                used_tokens = used,
                token_budget,
                "Context truncated to token budget"
            );
        }

        selected.reverse();
        let mut turns = Vec::with_capacity(selected.len() + 1);
        if let Some(system) = self.params.system_text.as_deref() {
            turns.push(ConversationTurn::system(system));
        }
        turns.extend(selected);

        debug!(turns = turns.len(), used_tokens = used, "Context assembled");
        GenerationRequest::new(turns, self.params.clone())
    }
}
