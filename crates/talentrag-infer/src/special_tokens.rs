//! Removal of special/control tokens from decoded generator output.

use once_cell::sync::Lazy;
use regex::Regex;

/// `<|endoftext|>`-style markers plus the usual BERT/SentencePiece specials.
static SPECIAL_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<\|[^|<>]*\|>|</?s>|<pad>|<unk>|<mask>|\[(?:CLS|SEP|PAD|UNK|MASK)\]")
        .expect("valid special token regex")
});

/// Strip special tokens and control characters (newline and tab survive),
/// then trim surrounding whitespace.
pub fn strip_special_tokens(text: &str) -> String {
    let without_specials = SPECIAL_TOKEN_RE.replace_all(text, "");
    without_specials
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect::<String>()
        .trim()
        .to_string()
}
