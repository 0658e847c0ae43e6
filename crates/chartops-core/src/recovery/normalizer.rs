//! Stage 1: formatting noise removal
//!
//! Works on raw text without tracking string context, so comment or fence
//! look-alikes inside a quoted value are rewritten too.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref CODE_FENCE: Regex = Regex::new(r"```[A-Za-z0-9_+-]*").unwrap();
    static ref COMMENTARY_PREFIX: Regex = Regex::new(
        r"(?i)^\s*(?:here\s+is|here's|output|results?|responses?)\b[^{\n]*"
    )
    .unwrap();
    static ref LINE_COMMENT: Regex = Regex::new(r"//[^\n]*").unwrap();
    static ref BLOCK_COMMENT: Regex = Regex::new(r"(?s)/\*.*?\*/").unwrap();
    static ref TRAILING_COMMA: Regex = Regex::new(r",\s*([\]}])").unwrap();
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
    static ref SPACED_COLON: Regex = Regex::new(r"\s*:\s*").unwrap();
    static ref SPACED_COMMA: Regex = Regex::new(r"\s*,\s*").unwrap();
    static ref SPACED_OPEN_BRACE: Regex = Regex::new(r"\{\s*").unwrap();
    static ref SPACED_CLOSE_BRACE: Regex = Regex::new(r"\s*\}").unwrap();
}

/// Produce candidate text from a raw completion
pub fn normalize(raw: &str) -> String {
    let text = CODE_FENCE.replace_all(raw, "");
    let text = text.replace('`', "");
    let text = COMMENTARY_PREFIX.replace(&text, "");
    let text = LINE_COMMENT.replace_all(&text, "");
    let text = BLOCK_COMMENT.replace_all(&text, "");
    let text = TRAILING_COMMA.replace_all(&text, "$1");
    let text = replace_typographic_quotes(&text);

    let text = WHITESPACE_RUN.replace_all(&text, " ");
    let text = SPACED_COLON.replace_all(&text, ":");
    let text = SPACED_COMMA.replace_all(&text, ",");
    let text = SPACED_OPEN_BRACE.replace_all(&text, "{");
    let text = SPACED_CLOSE_BRACE.replace_all(&text, "}");

    text.trim().to_string()
}

fn replace_typographic_quotes(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' => '"',
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' => '\'',
            other => other,
        })
        .collect()
}
