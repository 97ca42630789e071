//! Splitting a rendered reply into messages that fit Telegram's length limit.
//!
//! Pages break after a line where possible, then after whitespace, and never inside an HTML tag
//! or entity. Tags open at a break are closed at the end of the page and reopened at the start
//! of the next one, so every page is well-formed on its own.

use crate::markdown::TranslationMode;

/// Telegram's limit for the text of one message.
pub const MAX_MESSAGE_CHARS: usize = 4096;

#[derive(Debug, Clone, PartialEq)]
enum Atom<'a> {
    Char(&'a str),
    Entity(&'a str),
    Open { tag: &'a str, name: &'a str },
    Close(&'a str),
}

impl<'a> Atom<'a> {
    fn text(&self) -> &'a str {
        match self {
            Atom::Char(s) | Atom::Entity(s) | Atom::Close(s) => *s,
            Atom::Open { tag, .. } => *tag,
        }
    }
}

#[derive(Debug, Clone)]
struct OpenTag<'a> {
    tag: &'a str,
    name: &'a str,
}

/// Chars needed to close every tag in `stack`.
fn closers_len(stack: &[OpenTag<'_>]) -> usize {
    stack.iter().map(|t| t.name.chars().count() + 3).sum()
}

fn closers(stack: &[OpenTag<'_>]) -> String {
    stack
        .iter()
        .rev()
        .map(|t| format!("</{}>", t.name))
        .collect()
}

fn tokenize(text: &str, mode: TranslationMode) -> Vec<Atom<'_>> {
    let mut atoms = Vec::new();
    let mut rest = text;
    while let Some(c) = rest.chars().next() {
        let (atom, len) = match c {
            '<' if mode == TranslationMode::TelegramHtml => match rest.find('>') {
                Some(end) => {
                    let tag = &rest[..=end];
                    let atom = if tag.starts_with("</") {
                        Atom::Close(tag)
                    } else if tag.ends_with("/>") {
                        Atom::Entity(tag)
                    } else {
                        let name = tag[1..tag.len() - 1]
                            .split(|c: char| c.is_whitespace())
                            .next()
                            .unwrap_or_default();
                        Atom::Open { tag, name }
                    };
                    (atom, end + 1)
                }
                None => (Atom::Char(&rest[..1]), 1),
            },
            '&' if mode == TranslationMode::TelegramHtml => match entity_len(rest) {
                Some(len) => (Atom::Entity(&rest[..len]), len),
                None => (Atom::Char(&rest[..1]), 1),
            },
            _ => (Atom::Char(&rest[..c.len_utf8()]), c.len_utf8()),
        };
        atoms.push(atom);
        rest = &rest[len..];
    }
    atoms
}

/// Byte length of an entity like `&amp;` or `&#39;` at the start of `text`.
fn entity_len(text: &str) -> Option<usize> {
    let end = text.char_indices().take(12).find(|(_, c)| *c == ';')?.0;
    let body = &text[1..end];
    let valid = !body.is_empty()
        && body
            .trim_start_matches('#')
            .chars()
            .all(|c| c.is_ascii_alphanumeric());
    valid.then_some(end + 1)
}

/// Splits `text` into pages of at most `max_chars` characters.
///
/// Text that already fits comes back as a single page. Pages with nothing visible are dropped.
/// A single tag longer than a page is kept whole and may exceed the limit.
pub fn split_pages(text: &str, max_chars: usize, mode: TranslationMode) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let atoms = tokenize(text, mode);
    let mut pages = Vec::new();
    let mut stack: Vec<OpenTag<'_>> = Vec::new();
    let mut start = 0;

    while start < atoms.len() {
        let prefix: String = stack.iter().map(|t| t.tag).collect();
        let mut len = prefix.chars().count();
        let mut sim = stack.clone();
        let mut line_break: Option<(usize, Vec<OpenTag<'_>>)> = None;
        let mut space_break: Option<(usize, Vec<OpenTag<'_>>)> = None;
        let mut end = start;

        while end < atoms.len() {
            let atom = &atoms[end];
            let mut next = sim.clone();
            match atom {
                Atom::Open { tag, name } => next.push(OpenTag {
                    tag: *tag,
                    name: *name,
                }),
                Atom::Close(_) => {
                    next.pop();
                }
                _ => {}
            }
            let atom_len = atom.text().chars().count();
            if end > start && len + atom_len + closers_len(&next) > max_chars {
                break;
            }
            len += atom_len;
            sim = next;
            end += 1;
            match atom {
                Atom::Char("\n") => line_break = Some((end, sim.clone())),
                Atom::Char(c) if c.chars().all(char::is_whitespace) => {
                    space_break = Some((end, sim.clone()))
                }
                _ => {}
            }
        }

        let (cut, open) = if end == atoms.len() {
            (end, sim)
        } else {
            line_break.or(space_break).unwrap_or((end, sim))
        };

        let body: String = atoms[start..cut].iter().map(Atom::text).collect();
        let visible = atoms[start..cut]
            .iter()
            .any(|a| matches!(a, Atom::Entity(_)) || matches!(a, Atom::Char(c) if !c.trim().is_empty()));
        if visible {
            pages.push(format!("{}{}{}", prefix, body, closers(&open)));
        }
        stack = open;
        start = cut;
    }

    if pages.is_empty() {
        pages.push(String::new());
    }
    pages
}

/// The first page of `text`, or `text` itself when it fits.
pub fn first_page(text: &str, max_chars: usize, mode: TranslationMode) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    split_pages(text, max_chars, mode)
        .into_iter()
        .next()
        .unwrap_or_default()
}
