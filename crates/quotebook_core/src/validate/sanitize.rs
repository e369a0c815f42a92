//! Pure text normalization for tag and author names.
//!
//! # Responsibility
//! - Reduce tag names to one lowercase ASCII alphanumeric token.
//! - Reformat author names: ASCII-only, capitalized words, dotted initials
//!   and abbreviations, tight hyphen joins.
//!
//! # Invariants
//! - Both functions are idempotent.
//! - Output is always ASCII.
//! - Accented characters are decomposed to their ASCII base before any
//!   character is dropped.

use crate::validate::{ValidationError, MAX_TAG_NAME_CHARS};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use unicode_normalization::UnicodeNormalization;

static NAME_ILLEGAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z\s\-.]").expect("valid illegal-char regex"));
static NAME_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+|-|[^\s\-]+").expect("valid token regex"));
static SPACE_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid space-run regex"));
static SPACE_BEFORE_PERIOD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+\.").expect("valid space-period regex"));
static SPACE_AFTER_HYPHEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-\s+").expect("valid hyphen-space regex"));
static LOWER_AFTER_HYPHEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(-\s*)([a-z])").expect("valid hyphen-letter regex"));

/// Normalizes a tag name to a single lowercase alphanumeric token.
///
/// Lowercases and trims the input, decomposes accented characters and drops
/// every non-ASCII scalar, then strips everything outside `[a-z0-9]`. No
/// spaces, hyphens or punctuation survive.
///
/// # Errors
/// - [`ValidationError::TagNotAlphanumeric`] when nothing survives.
/// - [`ValidationError::TagNameTooLong`] when the token exceeds 100 chars.
pub fn sanitize_tag_name(name: &str) -> Result<String, ValidationError> {
    let lowered = name.trim().to_lowercase();
    let token: String = lowered
        .nfkd()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect();

    if token.is_empty() {
        return Err(ValidationError::TagNotAlphanumeric);
    }

    let chars = token.chars().count();
    if chars > MAX_TAG_NAME_CHARS {
        return Err(ValidationError::TagNameTooLong { chars });
    }

    Ok(token)
}

/// Normalizes an author name for display and uniqueness comparison.
///
/// Pipeline:
/// 1. Decompose accents, keep ASCII plus whitespace.
/// 2. Strip characters outside `[A-Za-z \-.]` (any whitespace allowed).
/// 3. Tokenize, keeping whitespace runs and hyphens as delimiters.
/// 4. Word tokens: single letters become dotted initials, two-letter
///    uppercase abbreviations gain a trailing period, everything else is
///    capitalized.
/// 5. Rejoin, collapse whitespace, tighten periods and hyphens, uppercase
///    the letter after a hyphen, trim.
pub fn sanitize_author_name(name: &str) -> String {
    let ascii: String = name
        .nfkd()
        .filter(|c| c.is_ascii() || c.is_whitespace())
        .collect();
    let cleaned = NAME_ILLEGAL_RE.replace_all(&ascii, "");

    let mut parts: Vec<String> = Vec::new();
    for token in NAME_TOKEN_RE.find_iter(&cleaned) {
        let token = token.as_str();
        if token.chars().all(char::is_whitespace) {
            if parts.last().map(String::as_str) != Some(" ") {
                parts.push(" ".to_string());
            }
        } else if token == "-" {
            parts.push("-".to_string());
        } else {
            parts.push(format_name_word(token));
        }
    }

    let joined = parts.concat();
    let spaced = SPACE_RUN_RE.replace_all(&joined, " ");
    let tight_periods = SPACE_BEFORE_PERIOD_RE.replace_all(&spaced, ".");
    let tight_hyphens = SPACE_AFTER_HYPHEN_RE.replace_all(&tight_periods, "-");
    let capitalized = LOWER_AFTER_HYPHEN_RE.replace_all(&tight_hyphens, |caps: &Captures<'_>| {
        format!("{}{}", &caps[1], caps[2].to_uppercase())
    });

    capitalized.trim().to_string()
}

fn format_name_word(word: &str) -> String {
    let chars = word.chars().count();
    if chars == 1 {
        return format!("{}.", word.to_uppercase());
    }

    // Abbreviations like "JR" or "AB." keep their casing and end in a period.
    if is_upper_abbreviation(word) && (chars == 2 || (chars == 3 && word.ends_with('.'))) {
        return if word.ends_with('.') {
            word.to_string()
        } else {
            format!("{word}.")
        };
    }

    capitalize_word(word)
}

fn is_upper_abbreviation(word: &str) -> bool {
    word.chars().any(|c| c.is_ascii_uppercase())
        && !word.chars().any(|c| c.is_ascii_lowercase())
}

fn capitalize_word(word: &str) -> String {
    let mut rest = word.chars();
    let Some(first) = rest.next() else {
        return String::new();
    };
    first
        .to_uppercase()
        .chain(rest.flat_map(char::to_lowercase))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{sanitize_author_name, sanitize_tag_name};
    use crate::validate::ValidationError;

    #[test]
    fn tag_drops_accents_case_and_punctuation() {
        assert_eq!(sanitize_tag_name("Café-Time!").unwrap(), "cafetime");
        assert_eq!(sanitize_tag_name("  Self Help  ").unwrap(), "selfhelp");
        assert_eq!(sanitize_tag_name("año2024").unwrap(), "ano2024");
    }

    #[test]
    fn tag_with_no_alphanumeric_content_is_rejected() {
        assert_eq!(
            sanitize_tag_name("!!! ---"),
            Err(ValidationError::TagNotAlphanumeric)
        );
        assert_eq!(sanitize_tag_name(""), Err(ValidationError::TagNotAlphanumeric));
    }

    #[test]
    fn tag_length_is_capped_at_100_chars() {
        assert_eq!(sanitize_tag_name(&"a".repeat(100)).unwrap().len(), 100);
        assert_eq!(
            sanitize_tag_name(&"a".repeat(101)),
            Err(ValidationError::TagNameTooLong { chars: 101 })
        );
    }

    #[test]
    fn tag_sanitization_is_idempotent() {
        for raw in ["Café-Time!", "LOVE", "déjà vu", "a1 b2"] {
            let once = sanitize_tag_name(raw).unwrap();
            assert_eq!(sanitize_tag_name(&once).unwrap(), once);
        }
    }

    #[test]
    fn single_letters_become_dotted_initials() {
        assert_eq!(sanitize_author_name("j k rowling"), "J. K. Rowling");
    }

    #[test]
    fn hyphenated_names_capitalize_each_segment() {
        assert_eq!(sanitize_author_name("jean-paul sartre"), "Jean-Paul Sartre");
        assert_eq!(sanitize_author_name("jean-paul o'brien"), "Jean-Paul Obrien");
    }

    #[test]
    fn two_letter_abbreviations_gain_a_period() {
        assert_eq!(sanitize_author_name("martin luther KG"), "Martin Luther KG.");
        assert_eq!(sanitize_author_name("KG. lewis"), "KG. Lewis");
    }

    #[test]
    fn accents_reduce_to_ascii_base_letters() {
        assert_eq!(sanitize_author_name("gabriel garcía márquez"), "Gabriel Garcia Marquez");
    }

    #[test]
    fn whitespace_runs_collapse_to_one_space() {
        assert_eq!(sanitize_author_name("  mark    twain  "), "Mark Twain");
    }

    #[test]
    fn author_sanitization_is_idempotent() {
        for raw in [
            "j k rowling",
            "jean-paul sartre",
            "MARK TWAIN",
            "KG. lewis",
            "gabriel garcía márquez",
        ] {
            let once = sanitize_author_name(raw);
            assert_eq!(sanitize_author_name(&once), once);
        }
    }
}
