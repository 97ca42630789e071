//! Incremental generic-markdown → Telegram HTML translation.
//!
//! Input arrives in arbitrary chunks. The translator consumes a prefix of its pending input only
//! when no further input could change how that prefix renders; otherwise it holds the prefix back.
//! This makes the output for any split of the input identical to translating the whole text at once.
//!
//! Every decision is made by [`step`], a pure function of the pending text, the line state and
//! whether the stream has ended. It either emits output for a consumed prefix or asks for more input.

use super::escape::{escape_attr, push_escaped, push_escaped_char};

/// Whether replies are translated to Telegram HTML or passed through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TranslationMode {
    #[default]
    TelegramHtml,
    Passthrough,
}

/// A construct that stays open across emissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Construct {
    CodeFence { lang: Option<String> },
}

impl Construct {
    fn closing_tags(&self) -> &'static str {
        match self {
            Construct::CodeFence { .. } => "</code></pre>",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    /// At the first character of a line outside a code fence.
    LineStart,
    /// Inside a line outside a code fence.
    Inline,
    /// At the first character of a line inside a code fence.
    FenceLineStart,
    /// Inside a line inside a code fence.
    FenceBody,
}

#[derive(Debug, Clone)]
struct LineState {
    block: Block,
    /// Last consumed character on the current line; `_` cannot open right after an alphanumeric.
    prev_char: Option<char>,
    /// Backtick count of the open fence; closing needs at least as many.
    fence_len: usize,
    /// Language tag of the open fence.
    fence_lang: Option<String>,
    /// A newline inside a fence not yet emitted; dropped if the next line closes the fence.
    held_newline: bool,
}

impl Default for LineState {
    fn default() -> Self {
        Self {
            block: Block::LineStart,
            prev_char: None,
            fence_len: 0,
            fence_lang: None,
            held_newline: false,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Step {
    /// Output for the first `consumed` bytes of pending input. `consumed` may be 0 when only the
    /// line state changed.
    Emit { out: String, consumed: usize },
    /// The decision depends on input that has not arrived yet.
    NeedMore,
}

fn emit(out: impl Into<String>, consumed: usize) -> Step {
    Step::Emit {
        out: out.into(),
        consumed,
    }
}

/// Translation state for one response. Owned by exactly one scheduler run.
#[derive(Debug, Clone)]
pub struct TranslationState {
    mode: TranslationMode,
    raw_buffer: String,
    pending: String,
    open_constructs: Vec<Construct>,
    rendered_output: String,
    line: LineState,
    finalized: bool,
}

impl TranslationState {
    pub fn new(mode: TranslationMode) -> Self {
        Self {
            mode,
            raw_buffer: String::new(),
            pending: String::new(),
            open_constructs: Vec::new(),
            rendered_output: String::new(),
            line: LineState::default(),
            finalized: false,
        }
    }

    pub fn mode(&self) -> TranslationMode {
        self.mode
    }

    /// Everything fed so far, untranslated.
    pub fn raw(&self) -> &str {
        &self.raw_buffer
    }

    /// Everything emitted so far.
    pub fn rendered(&self) -> &str {
        &self.rendered_output
    }

    /// Input received but not yet emitted.
    pub fn pending(&self) -> &str {
        &self.pending
    }

    pub fn open_constructs(&self) -> &[Construct] {
        &self.open_constructs
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Closing tags for constructs still open, so an intermediate display is well-formed.
    pub fn open_suffix(&self) -> String {
        self.open_constructs
            .iter()
            .rev()
            .map(Construct::closing_tags)
            .collect()
    }

    /// Appends `delta` and returns the newly emitted output.
    pub fn feed(&mut self, delta: &str) -> String {
        if self.finalized || delta.is_empty() {
            return String::new();
        }
        self.raw_buffer.push_str(delta);
        if self.mode == TranslationMode::Passthrough {
            self.rendered_output.push_str(delta);
            return delta.to_string();
        }
        self.pending.push_str(delta);
        let out = self.drain(false);
        self.rendered_output.push_str(&out);
        out
    }

    /// Ends the input: resolves held-back text as literal and closes an open code fence.
    pub fn finalize(&mut self) -> String {
        if self.finalized {
            return String::new();
        }
        self.finalized = true;
        if self.mode == TranslationMode::Passthrough {
            return String::new();
        }
        let mut out = self.drain(true);
        if !self.pending.is_empty() {
            push_escaped(&mut out, &self.pending);
            self.pending.clear();
        }
        out.push_str(&self.open_suffix());
        self.open_constructs.clear();
        self.rendered_output.push_str(&out);
        out
    }

    fn drain(&mut self, at_end: bool) -> String {
        let mut out = String::new();
        while !self.pending.is_empty() {
            let before = self.line.block;
            match step(&mut self.line, &self.pending, at_end) {
                Step::NeedMore => break,
                Step::Emit { out: text, consumed } => {
                    out.push_str(&text);
                    self.pending.drain(..consumed);
                    self.track_constructs(before);
                }
            }
        }
        out
    }

    fn track_constructs(&mut self, before: Block) {
        let in_fence = |b: Block| matches!(b, Block::FenceLineStart | Block::FenceBody);
        match (in_fence(before), in_fence(self.line.block)) {
            (false, true) => self.open_constructs.push(Construct::CodeFence {
                lang: self.line.fence_lang.clone(),
            }),
            (true, false) => {
                self.open_constructs.pop();
            }
            _ => {}
        }
    }
}

/// Free-function form of [`TranslationState::feed`].
pub fn feed(state: &mut TranslationState, delta: &str) -> String {
    state.feed(delta)
}

/// Free-function form of [`TranslationState::finalize`].
pub fn finalize(state: &mut TranslationState) -> String {
    state.finalize()
}

/// Translates a complete text in one go.
pub fn translate(text: &str, mode: TranslationMode) -> String {
    let mut state = TranslationState::new(mode);
    let mut out = state.feed(text);
    out.push_str(&state.finalize());
    out
}

// ---------- Block level ----------

fn step(line: &mut LineState, input: &str, at_end: bool) -> Step {
    match line.block {
        Block::LineStart => line_start_step(line, input, at_end),
        Block::Inline => {
            if input.starts_with('\n') {
                line.block = Block::LineStart;
                line.prev_char = None;
                return emit("\n", 1);
            }
            let result = inline_step(input, at_end, line.prev_char);
            if let Step::Emit { consumed, .. } = &result {
                if let Some(last) = input[..*consumed].chars().next_back() {
                    line.prev_char = Some(last);
                }
            }
            result
        }
        Block::FenceLineStart => fence_line_start_step(line, input, at_end),
        Block::FenceBody => {
            if input.starts_with('\n') {
                line.block = Block::FenceLineStart;
                line.held_newline = true;
                return emit("", 1);
            }
            let end = input.find('\n').unwrap_or(input.len());
            let mut out = String::new();
            push_escaped(&mut out, &input[..end]);
            emit(out, end)
        }
    }
}

fn line_start_step(line: &mut LineState, input: &str, at_end: bool) -> Step {
    if input.starts_with('`') {
        let run = run_len(input, '`');
        if run == input.len() && !at_end {
            return Step::NeedMore;
        }
        if run >= 3 {
            let (text, complete) = line_of(input, at_end);
            if !complete {
                return Step::NeedMore;
            }
            let info = text[run..].trim();
            if !info.contains('`') {
                let lang = info.split_whitespace().next().map(str::to_string);
                let mut out = String::from("<pre><code");
                if let Some(lang) = &lang {
                    out.push_str(&format!(" class=\"language-{}\"", escape_attr(lang)));
                }
                out.push('>');
                let consumed = if text.len() < input.len() {
                    text.len() + 1
                } else {
                    text.len()
                };
                line.block = Block::FenceLineStart;
                line.fence_len = run;
                line.fence_lang = lang;
                line.held_newline = false;
                line.prev_char = None;
                return emit(out, consumed);
            }
        }
        line.block = Block::Inline;
        return emit("", 0);
    }

    let indent = input.len() - input.trim_start_matches(' ').len();
    if indent == input.len() && !at_end {
        return Step::NeedMore;
    }
    let rest = &input[indent..];
    let bytes = rest.as_bytes();

    match bytes.first() {
        Some(b'-') | Some(b'*') | Some(b'+') => {
            if bytes.len() == 1 && !at_end {
                return Step::NeedMore;
            }
            if bytes.get(1) == Some(&b' ') {
                line.block = Block::Inline;
                line.prev_char = Some(' ');
                return emit(format!("{}• ", &input[..indent]), indent + 2);
            }
        }
        Some(b) if b.is_ascii_digit() => {
            let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
            if digits <= 9 {
                if digits == bytes.len() && !at_end {
                    return Step::NeedMore;
                }
                if matches!(bytes.get(digits), Some(b'.') | Some(b')')) {
                    if digits + 1 == bytes.len() && !at_end {
                        return Step::NeedMore;
                    }
                    if bytes.get(digits + 1) == Some(&b' ') {
                        line.block = Block::Inline;
                        line.prev_char = Some(' ');
                        let out = format!("{}{}. ", &input[..indent], &rest[..digits]);
                        return emit(out, indent + digits + 2);
                    }
                }
            }
        }
        _ => {}
    }

    line.block = Block::Inline;
    emit("", 0)
}

fn fence_line_start_step(line: &mut LineState, input: &str, at_end: bool) -> Step {
    let run = run_len(input, '`');
    if run > 0 && run == input.len() && !at_end {
        return Step::NeedMore;
    }
    if run >= line.fence_len {
        let (text, complete) = line_of(input, at_end);
        let rest = &text[run..];
        if rest.chars().all(|c| c == ' ' || c == '\t') {
            if !complete {
                return Step::NeedMore;
            }
            line.block = Block::Inline;
            line.held_newline = false;
            line.fence_lang = None;
            line.prev_char = Some('`');
            return emit("</code></pre>", text.len());
        }
    }
    let out = if line.held_newline { "\n" } else { "" };
    line.held_newline = false;
    line.block = Block::FenceBody;
    emit(out, 0)
}

// ---------- Inline level ----------

const SPECIAL: [char; 7] = ['\n', '\\', '`', '*', '_', '~', '['];

/// One inline decision on text that does not start with a newline.
fn inline_step(input: &str, at_end: bool, prev: Option<char>) -> Step {
    let Some(c) = input.chars().next() else {
        return Step::NeedMore;
    };
    match c {
        '\\' => escape_step(input, at_end),
        '`' => code_span_step(input, at_end),
        '*' | '_' | '~' => emphasis_step(input, at_end, prev, c),
        '[' => link_step(input, at_end),
        _ => {
            let end = input
                .find(|ch: char| SPECIAL.contains(&ch))
                .unwrap_or(input.len());
            let mut out = String::with_capacity(end);
            push_escaped(&mut out, &input[..end]);
            emit(out, end)
        }
    }
}

/// Renders a complete single-line fragment (the inside of a construct).
fn render_inline(text: &str, prev: Option<char>) -> String {
    let mut out = String::new();
    let mut rest = text;
    let mut prev = prev;
    while !rest.is_empty() {
        match inline_step(rest, true, prev) {
            Step::Emit { out: piece, consumed } if consumed > 0 => {
                out.push_str(&piece);
                prev = rest[..consumed].chars().next_back();
                rest = &rest[consumed..];
            }
            _ => {
                push_escaped(&mut out, rest);
                break;
            }
        }
    }
    out
}

fn escape_step(input: &str, at_end: bool) -> Step {
    match input[1..].chars().next() {
        None if at_end => emit("\\", 1),
        None => Step::NeedMore,
        Some(ch) if ch.is_ascii_punctuation() => {
            let mut out = String::new();
            push_escaped_char(&mut out, ch);
            emit(out, 2)
        }
        Some(_) => emit("\\", 1),
    }
}

fn code_span_step(input: &str, at_end: bool) -> Step {
    let n = run_len(input, '`');
    if n == input.len() && !at_end {
        return Step::NeedMore;
    }
    let (text, complete) = line_of(input, at_end);
    let body = &text[n..];
    for (start, end) in runs(body, '`') {
        if end == body.len() && !complete {
            return Step::NeedMore;
        }
        if end - start == n {
            let mut out = String::from("<code>");
            push_escaped(&mut out, &body[..start]);
            out.push_str("</code>");
            return emit(out, n + end);
        }
    }
    if complete {
        emit("`".repeat(n), n)
    } else {
        Step::NeedMore
    }
}

fn emphasis_step(input: &str, at_end: bool, prev: Option<char>, delim: char) -> Step {
    let n = run_len(input, delim);
    if n == input.len() && !at_end {
        return Step::NeedMore;
    }
    let literal = || emit(delim.to_string().repeat(n), n);
    if delim == '~' && n == 1 {
        return literal();
    }
    let width = if n >= 2 { 2 } else { 1 };

    match input[width..].chars().next() {
        Some(next) if !next.is_whitespace() => {}
        _ => return literal(),
    }
    if delim == '_' && prev.is_some_and(|p| p.is_alphanumeric()) {
        return literal();
    }

    let (text, complete) = line_of(input, at_end);
    let body = &text[width..];
    for (start, end) in runs(body, delim) {
        if end == body.len() && !complete {
            return Step::NeedMore;
        }
        let len = end - start;
        let before = body[..start].chars().next_back();
        let after = body[end..].chars().next();
        if before.map_or(true, char::is_whitespace) {
            continue;
        }
        if delim == '_' && after.is_some_and(|a| a.is_alphanumeric()) {
            continue;
        }
        let inner_end = match (width, len) {
            (1, 1) => start,
            (2, l) if l >= 2 => end - 2,
            _ => continue,
        };
        let tag = match (delim, width) {
            ('~', _) => "s",
            (_, 2) => "b",
            _ => "i",
        };
        let out = format!(
            "<{tag}>{}</{tag}>",
            render_inline(&body[..inner_end], Some(delim))
        );
        return emit(out, width + end);
    }
    if complete {
        literal()
    } else {
        Step::NeedMore
    }
}

fn link_step(input: &str, at_end: bool) -> Step {
    let literal = || emit("[", 1);
    let (text, complete) = line_of(input, at_end);
    let Some(close) = text.find(']') else {
        return if complete { literal() } else { Step::NeedMore };
    };
    let label = &text[1..close];
    let after = &text[close + 1..];
    if after.is_empty() {
        return if complete { literal() } else { Step::NeedMore };
    }
    if !after.starts_with('(') {
        return literal();
    }
    let Some(paren) = after[1..].find(')') else {
        return if complete { literal() } else { Step::NeedMore };
    };
    let url = &after[1..1 + paren];
    if label.is_empty() || url.is_empty() || url.contains(char::is_whitespace) {
        return literal();
    }
    let out = format!(
        "<a href=\"{}\">{}</a>",
        escape_attr(url),
        render_inline(label, Some('['))
    );
    emit(out, close + 1 + paren + 2)
}

// ---------- Scanning helpers ----------

fn run_len(input: &str, c: char) -> usize {
    input.chars().take_while(|&x| x == c).count() * c.len_utf8()
}

/// Text up to (not including) the first newline, and whether that line is complete.
fn line_of(input: &str, at_end: bool) -> (&str, bool) {
    match input.find('\n') {
        Some(i) => (&input[..i], true),
        None => (input, at_end),
    }
}

/// Byte ranges of maximal runs of `c` in `text`.
fn runs(text: &str, c: char) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut start: Option<usize> = None;
    for (i, ch) in text.char_indices() {
        match (ch == c, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                out.push((s, i));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        out.push((s, text.len()));
    }
    out
}
