//! Lossy UTF-8 decoding of terminal output.
//!
//! Terminal output routinely contains bytes that are not valid UTF-8 (binary
//! dumps, legacy encodings, multi-byte characters split across frames). A bad
//! chunk is never fatal: every maximal invalid sequence becomes one U+FFFD.

/// Text decoded from a frame payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    /// The decoded text.
    pub text: String,
    /// Number of replacement characters inserted.
    pub replacements: usize,
}

impl DecodedText {
    /// Whether any invalid sequences were replaced.
    #[must_use]
    pub const fn had_errors(&self) -> bool {
        self.replacements > 0
    }
}

/// Decode bytes as UTF-8, replacing invalid sequences.
///
/// Produces the same text as [`String::from_utf8_lossy`], but counts only
/// the replacements it made; a U+FFFD already present in the input is not
/// counted.
#[must_use]
pub fn decode_utf8_lossy(bytes: &[u8]) -> DecodedText {
    let mut text = String::with_capacity(bytes.len());
    let mut replacements = 0;

    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
        if !chunk.invalid().is_empty() {
            text.push(char::REPLACEMENT_CHARACTER);
            replacements += 1;
        }
    }

    DecodedText { text, replacements }
}
