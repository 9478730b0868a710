//! Escaping terminal output for embedding in a single-quoted script literal.
//!
//! The renderer pastes each timeline entry verbatim between the brackets of a
//! script array, so every entry must already be a complete single-quoted
//! string literal. The convention below is part of the renderer contract and
//! must not change without a matching template change:
//!
//! | input                         | output        |
//! |-------------------------------|---------------|
//! | `\`                           | `\\`          |
//! | tab, newline, carriage return | `\t` `\n` `\r`|
//! | `'`                           | `\'`          |
//! | other C0 controls, U+007F..=U+00FF | `\xhh`   |
//! | U+0100..=U+FFFF               | `\uhhhh`      |
//! | above U+FFFF                  | `\Uhhhhhhhh`  |
//! | printable ASCII (incl. `"`)   | unchanged     |
//!
//! Hex digits are lower case. The result is pure ASCII.

use std::fmt::Write;

/// Escape `text` without adding the surrounding quotes.
#[must_use]
pub fn escape_str(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    push_escaped(&mut out, text);
    out
}

/// Escape `text` and wrap it in single quotes.
#[must_use]
pub fn quote_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8 + 2);
    out.push('\'');
    push_escaped(&mut out, text);
    out.push('\'');
    out
}

fn push_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\'' => out.push_str("\\'"),
            ' '..='~' => out.push(c),
            // Writing to a String cannot fail.
            c if (c as u32) < 0x100 => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c if (c as u32) < 0x1_0000 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => {
                let _ = write!(out, "\\U{:08x}", c as u32);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_ascii_is_untouched() {
        assert_eq!(escape_str("ls -la ~/src"), "ls -la ~/src");
        assert_eq!(quote_literal("a"), "'a'");
    }

    #[test]
    fn quotes() {
        assert_eq!(escape_str("it's"), "it\\'s");
        assert_eq!(escape_str("say \"hi\""), "say \"hi\"");
    }

    #[test]
    fn backslash_and_whitespace_controls() {
        assert_eq!(escape_str("a\\b"), "a\\\\b");
        assert_eq!(escape_str("\t\r\n"), "\\t\\r\\n");
    }

    #[test]
    fn other_controls_use_hex() {
        assert_eq!(escape_str("\x1b[0m"), "\\x1b[0m");
        assert_eq!(escape_str("\x07\x00\x7f"), "\\x07\\x00\\x7f");
    }

    #[test]
    fn non_ascii() {
        assert_eq!(escape_str("é"), "\\xe9");
        assert_eq!(escape_str("\u{fffd}"), "\\ufffd");
        assert_eq!(escape_str("日本"), "\\u65e5\\u672c");
        assert_eq!(escape_str("🦀"), "\\U0001f980");
    }

    #[test]
    fn empty() {
        assert_eq!(escape_str(""), "");
        assert_eq!(quote_literal(""), "''");
    }

    #[test]
    fn output_is_ascii() {
        let escaped = quote_literal("prompt$ \x1b]0;tïtle\x07 ✓\n");
        assert!(escaped.is_ascii());
        assert!(escaped.starts_with('\'') && escaped.ends_with('\''));
    }
}
