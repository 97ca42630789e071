//! Handler result type.

/// What the handler did with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerResponse {
    /// Message did not trigger the bot.
    Ignore,
    /// A response was started (streaming reply or image request).
    Started,
    /// The message was handled and nothing further happens.
    Stop,
}
