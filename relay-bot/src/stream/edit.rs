//! Edit delivery with Telegram's retry semantics.
//!
//! - **[`is_message_not_modified_error`]**: "message is not modified" means the text is already shown; success.
//! - **[`extract_retry_after_seconds`]**: parses "Retry after Ns" from a rate-limit error.
//! - **[`edit_intermediate`]**: at most one retry within `max_wait`, then give up.
//! - **[`edit_final`]**: capped exponential backoff until a deadline.

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, warn};

use crate::core::{Bot, MessageHandle};

/// Backoff before the single retry of an intermediate edit when Telegram gives no Retry-After.
const INTERMEDIATE_RETRY_BACKOFF: Duration = Duration::from_millis(500);
/// First backoff step for the final edit.
const FINAL_INITIAL_BACKOFF: Duration = Duration::from_millis(500);
/// Upper bound for one backoff step of the final edit.
const FINAL_MAX_BACKOFF: Duration = Duration::from_secs(8);

/// True when Telegram returns "message is not modified" (content unchanged); treat as success.
pub fn is_message_not_modified_error(error: &str) -> bool {
    error.contains("message is not modified") || error.contains("exactly the same")
}

/// Parses "Retry after Ns" from a Telegram API error string.
pub fn extract_retry_after_seconds(error: &str) -> Option<u64> {
    let pattern = "Retry after ";
    let start = error.find(pattern)? + pattern.len();
    let end = error[start..].find('s')?;
    error[start..start + end].trim().parse().ok()
}

enum Attempt {
    Delivered,
    Failed { retry_after: Option<Duration>, error: String },
}

async fn attempt(bot: &dyn Bot, handle: &mut MessageHandle, text: &str) -> Attempt {
    match bot.edit(handle, text).await {
        Ok(()) => {
            handle.mark_edited(text);
            Attempt::Delivered
        }
        Err(e) => {
            let error = e.to_string();
            if is_message_not_modified_error(&error) {
                handle.mark_edited(text);
                return Attempt::Delivered;
            }
            Attempt::Failed {
                retry_after: extract_retry_after_seconds(&error).map(Duration::from_secs),
                error,
            }
        }
    }
}

/// Edits with one retry (honouring Retry-After). Returns whether the text was delivered.
///
/// A Retry-After longer than `max_wait` drops the edit without waiting; the next one carries
/// the text anyway.
pub async fn edit_intermediate(
    bot: &dyn Bot,
    handle: &mut MessageHandle,
    text: &str,
    max_wait: Duration,
) -> bool {
    let (retry_after, first_error) = match attempt(bot, handle, text).await {
        Attempt::Delivered => return true,
        Attempt::Failed { retry_after, error } => (retry_after, error),
    };

    if let Some(retry_after) = retry_after.filter(|r| *r > max_wait) {
        warn!(
            error = %first_error,
            retry_after_secs = retry_after.as_secs(),
            message_id = %handle.message_id(),
            "Intermediate edit dropped, rate limited"
        );
        return false;
    }
    let delay = retry_after.unwrap_or(INTERMEDIATE_RETRY_BACKOFF.min(max_wait));
    debug!(
        error = %first_error,
        delay_ms = delay.as_millis() as u64,
        "Intermediate edit failed, retrying once"
    );
    tokio::time::sleep(delay).await;

    match attempt(bot, handle, text).await {
        Attempt::Delivered => true,
        Attempt::Failed { error, .. } => {
            warn!(
                error = %error,
                message_id = %handle.message_id(),
                "Intermediate edit dropped"
            );
            false
        }
    }
}

/// Edits until delivered or `budget` elapses. Backoff doubles from 500ms up to 8s; a
/// Retry-After from Telegram replaces the step when longer.
pub async fn edit_final(
    bot: &dyn Bot,
    handle: &mut MessageHandle,
    text: &str,
    budget: Duration,
) -> bool {
    let deadline = Instant::now() + budget;
    let mut backoff = FINAL_INITIAL_BACKOFF;
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        let (retry_after, last_error) = match attempt(bot, handle, text).await {
            Attempt::Delivered => {
                if attempts > 1 {
                    debug!(attempts, "Final edit delivered after retry");
                }
                return true;
            }
            Attempt::Failed { retry_after, error } => (retry_after, error),
        };

        let delay = retry_after.map_or(backoff, |r| r.max(backoff));
        if Instant::now() + delay > deadline {
            error!(
                error = %last_error,
                attempts,
                message_id = %handle.message_id(),
                "Final edit failed, giving up"
            );
            return false;
        }
        warn!(error = %last_error, attempts, delay_ms = delay.as_millis() as u64, "Final edit failed, retrying");
        tokio::time::sleep(delay).await;
        backoff = (backoff * 2).min(FINAL_MAX_BACKOFF);
    }
}
