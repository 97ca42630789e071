//! # Markdown translation
//!
//! Streams generic model markdown into Telegram HTML (`parse_mode = HTML`).
//!
//! | Markdown | Telegram HTML |
//! |---|---|
//! | `**x**`, `__x__` | `<b>x</b>` |
//! | `*x*`, `_x_` | `<i>x</i>` |
//! | `~~x~~` | `<s>x</s>` |
//! | `` `x` `` | `<code>x</code>` |
//! | fenced block with `lang` | `<pre><code class="language-lang">…</code></pre>` |
//! | `- x`, `* x`, `+ x` | `• x` |
//! | `1. x`, `1) x` | `1. x` |
//! | `[text](url)` | `<a href="url">text</a>` |
//! | `\*` | `*` |
//!
//! Anything else (headings, tables, quotes) is kept as escaped literal text. Inline constructs
//! never span lines.

mod escape;
mod translator;

pub use escape::{escape_attr, escape_html};
pub use translator::{feed, finalize, translate, Construct, TranslationMode, TranslationState};
