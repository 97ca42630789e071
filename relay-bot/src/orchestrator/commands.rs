//! Slash commands understood by the relay.

/// A recognised command in a triggering message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    /// `/image <prompt>` or `/draw <prompt>`; the prompt may be empty.
    Image(&'a str),
    /// `/stop`: cancel the active response in this chat.
    Stop,
}

const IMAGE_COMMANDS: [&str; 2] = ["/image", "/draw"];

/// Parses a command at the start of `text`. Accepts the `/cmd@botname` form.
pub fn parse_command(text: &str) -> Option<Command<'_>> {
    let text = text.trim_start();
    if !text.starts_with('/') {
        return None;
    }
    let (head, rest) = match text.find(char::is_whitespace) {
        Some(pos) => (&text[..pos], text[pos..].trim()),
        None => (text, ""),
    };
    let name = head.split('@').next().unwrap_or(head);

    if IMAGE_COMMANDS.contains(&name) {
        Some(Command::Image(rest))
    } else if name == "/stop" {
        Some(Command::Stop)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_image_commands() {
        assert_eq!(parse_command("/image a red fox"), Some(Command::Image("a red fox")));
        assert_eq!(parse_command("/draw   sunset "), Some(Command::Image("sunset")));
        assert_eq!(parse_command("/image@relay_bot cat"), Some(Command::Image("cat")));
        assert_eq!(parse_command("/image"), Some(Command::Image("")));
    }

    #[test]
    fn test_parse_other_text() {
        assert_eq!(parse_command("/stop"), Some(Command::Stop));
        assert_eq!(parse_command("/imagine this"), None);
        assert_eq!(parse_command("draw a cat"), None);
        assert_eq!(parse_command("/help"), None);
    }
}
