//! Text normalization
//!
//! Restricts raw input to ASCII letters and digits, precomposed Vietnamese
//! letters and a small punctuation set. Everything else becomes a space.
//!
//! # Example
//!
//! ```ignore
//! use vietvoice_text_processing::clean_text;
//!
//! assert_eq!(clean_text("Xin chào 👋 bạn\nkhỏe không"), "Xin chào bạn. khỏe không.");
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

use vietvoice_config::constants::chunking::{PAUSE_PUNCTUATION, PAUSE_PUNCTUATION_WEIGHT};

/// Lowercase Vietnamese letters outside ASCII
const VIETNAMESE_CHARS: &str =
    "àáảãạăằắẳẵặâầấẩẫậèéẻẽẹêềếểễệđìíỉĩịòóỏõọôồốổỗộơờớởỡợùúủũụưừứửữựỳỵỷỹý";

const PUNCTUATION_CHARS: &str = " .,!?'@$%&/:;()";

/// Lines must end with one of these before being joined
const LINE_TERMINATORS: &[char] = &['.', '!', '?'];

/// Cleaned text always ends with one of these
const FINAL_TERMINATORS: &[char] = &['.', '?', '!', ','];

static CLAUSE_MARKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[;:()]").unwrap());
static REPEATED_PERIODS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.+").unwrap());
static REPEATED_COMMAS: Lazy<Regex> = Lazy::new(|| Regex::new(r",+").unwrap());
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

fn is_allowed(c: char) -> bool {
    if c.is_ascii_alphanumeric() || PUNCTUATION_CHARS.contains(c) {
        return true;
    }
    if c.is_ascii() {
        return false;
    }
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => VIETNAMESE_CHARS.contains(l),
        _ => false,
    }
}

/// Treat newlines as paragraph breaks, terminating each non-empty line
fn join_lines(text: &str) -> String {
    text.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            if line.ends_with(LINE_TERMINATORS) {
                line.to_string()
            } else {
                format!("{}.", line)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalize raw text into the speakable alphabet
///
/// Never fails. Empty or whitespace-only input yields `"."`. The result is a
/// fixed point: cleaning it again returns it unchanged.
pub fn clean_text(text: &str) -> String {
    let joined;
    let text = if text.contains('\n') {
        joined = join_lines(text);
        joined.as_str()
    } else {
        text
    };

    let filtered: String = text
        .chars()
        .map(|c| if is_allowed(c) { c } else { ' ' })
        .collect();

    let text = CLAUSE_MARKS.replace_all(filtered.trim(), ",");
    let text = REPEATED_PERIODS.replace_all(&text, ".");
    let text = REPEATED_COMMAS.replace_all(&text, ",");
    let mut text = WHITESPACE_RUN.replace_all(&text, " ").into_owned();

    if !text.ends_with(FINAL_TERMINATORS) {
        text.push('.');
    }
    text
}

/// Whether cleaned text contains anything a speaker could say
pub fn has_speakable_content(text: &str) -> bool {
    text.chars().any(char::is_alphanumeric)
}

/// Length estimate for duration scaling
///
/// UTF-8 byte length plus a fixed weight per pause punctuation mark, so
/// accented and punctuated text counts as longer to speak.
pub fn weighted_length(text: &str) -> usize {
    let pauses = text.chars().filter(|c| PAUSE_PUNCTUATION.contains(c)).count();
    text.len() + PAUSE_PUNCTUATION_WEIGHT * pauses
}
