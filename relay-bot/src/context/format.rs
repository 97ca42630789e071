//! Author prefix for user turns, so the model can tell speakers apart in group chats.
//!
//! Format: `[User: {display_name} / {username_part}] `. Missing parts are rendered as `-`.

use crate::core::User;

/// Builds the prefix for a single user turn.
///
/// - `display_name`: `first_name` + optional `last_name`, trimmed; `-` when both are missing.
/// - `username_part`: `@username`, or `-` when missing.
///
/// **Example**: `[User: Alice Smith / @alice] ` or `[User: - / -] `.
pub fn user_info_prefix(
    first_name: Option<&str>,
    last_name: Option<&str>,
    username: Option<&str>,
) -> String {
    let display_name = [
        first_name.unwrap_or("").trim(),
        last_name.unwrap_or("").trim(),
    ]
    .join(" ")
    .trim()
    .to_string();
    let display_name = if display_name.is_empty() {
        "-".to_string()
    } else {
        display_name
    };
    let username_part = username
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(|u| format!("@{}", u))
        .unwrap_or_else(|| "-".to_string());
    format!("[User: {} / {}] ", display_name, username_part)
}

/// Prefix for a core [`User`].
pub fn prefix_for(user: &User) -> String {
    user_info_prefix(
        user.first_name.as_deref(),
        user.last_name.as_deref(),
        user.username.as_deref(),
    )
}
