//! Plate-string normalization.
//!
//! Cleans raw OCR text into a canonical plate string using the regional
//! plate grammars, recovering from the common OCR misreads seen at the
//! gate cameras. Total and deterministic: invalid input yields an empty
//! string, never an error.

use once_cell::sync::Lazy;
use regex::Regex;

/// Minimum cleaned length for a string to be considered at all
const MIN_PLATE_LEN: usize = 4;

/// Regional plate grammars, tried in order of prevalence. The first match
/// wins; order matters more than fit.
static GRAMMARS: Lazy<[Regex; 4]> = Lazy::new(|| {
    [
        compile(r"^\d{4}[A-Z]{3}$"),
        // Partial read of the four-digit format (last letter dropped)
        compile(r"^\d{4}[A-Z]{2}$"),
        compile(r"^[A-Z]{3}\d{4}$"),
        compile(r"^\d{3}[A-Z]{3}$"),
    ]
});

static DIGITS_THEN_LETTERS: Lazy<Regex> = Lazy::new(|| compile(r"^\d{4}[A-Z]{3}$"));
static LETTERS_THEN_DIGITS: Lazy<Regex> = Lazy::new(|| compile(r"^([A-Z]{3})(\d{4})$"));
static EMBEDDED_PLATE: Lazy<Regex> = Lazy::new(|| compile(r"\d{4}[A-Z]{3}"));

#[allow(clippy::expect_used)]
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static plate pattern must compile")
}

/// Normalize raw OCR output into a canonical plate string.
///
/// Returns the empty string when no plausible plate can be extracted.
/// Idempotent: normalizing its own output is a no-op.
pub fn normalize(raw_text: &str) -> String {
    let text: String = raw_text
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        .collect();

    if text.len() < MIN_PLATE_LEN {
        return String::new();
    }

    // A leading '1' on an 8-char read is almost always the plate border
    // misread as a digit.
    if text.len() == 8 && text.starts_with('1') {
        if let Some(recovered) = recover_leading_one(&text[1..]) {
            return recovered;
        }
    }

    for grammar in GRAMMARS.iter() {
        if grammar.is_match(&text) {
            return text;
        }
    }

    let has_letters = text.chars().any(|c| c.is_ascii_uppercase());
    let has_digits = text.chars().any(|c| c.is_ascii_digit());

    if text.len() > 7 && has_letters && has_digits {
        if let Some(found) = EMBEDDED_PLATE.find(&text) {
            return found.as_str().to_string();
        }
        // Truncation can strip all of one character class; the prefix must
        // still pass the mixed-content test or it is not plate-like.
        let prefix = &text[..7];
        if prefix.chars().any(|c| c.is_ascii_uppercase())
            && prefix.chars().any(|c| c.is_ascii_digit())
        {
            return prefix.to_string();
        }
        return String::new();
    }

    if text.len() >= 5 && has_letters && has_digits {
        // Matches no grammar but looks plate-like; the caller treats this
        // as a lower-confidence partial result.
        return text;
    }

    String::new()
}

/// Retry the four-digit/three-letter grammar against the remainder after
/// dropping the artifact digit, accepting either group order and emitting
/// the canonical digits-then-letters form.
fn recover_leading_one(remainder: &str) -> Option<String> {
    if DIGITS_THEN_LETTERS.is_match(remainder) {
        return Some(remainder.to_string());
    }
    if let Some(captures) = LETTERS_THEN_DIGITS.captures(remainder) {
        return Some(format!("{}{}", &captures[2], &captures[1]));
    }
    None
}
