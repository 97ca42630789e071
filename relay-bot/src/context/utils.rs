//! Utility functions for context assembly.

/// Estimates the token count for a text string: one token per four bytes, at least one.
pub fn estimate_tokens(text: &str) -> usize {
    ((text.len() as f64) / 4.0).ceil().max(1.0) as usize
}
