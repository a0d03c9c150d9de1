//! Key, value and tag validation rules.
//!
//! Ported from the reference implementation's `validateKey`/`validateValue`/
//! `validateTag`, with the key-length comparisons corrected: the source
//! compared `len >= min` and `len < max` with reversed intent, which would
//! have rejected every key. The narrative intent — `1 <= len(key) <= 50` —
//! is what's implemented here.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_general_category::{get_general_category, GeneralCategory};

pub const MIN_KEY_LENGTH: usize = 1;
pub const MAX_KEY_LENGTH: usize = 50;
const TAG_PATTERN: &str = r"^[a-z0-9-]{1,20}$";

static TAG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(TAG_PATTERN).expect("tag pattern is a valid regex"));

/// Matches the original's `unicode.IsGraphic` intent: letters, marks,
/// numbers, punctuation, symbols and the space separators are printable.
/// Everything else — C0/C1 controls, format characters like U+200B ZERO
/// WIDTH SPACE or U+FEFF BOM, private-use, unassigned, surrogate, and
/// line/paragraph separators — is rejected.
fn is_non_graphic(c: char) -> bool {
    matches!(
        get_general_category(c),
        GeneralCategory::Control
            | GeneralCategory::Format
            | GeneralCategory::PrivateUse
            | GeneralCategory::Unassigned
            | GeneralCategory::Surrogate
            | GeneralCategory::LineSeparator
            | GeneralCategory::ParagraphSeparator
    )
}

/// Validates a record key: non-empty, `<= 50` bytes, no leading/trailing
/// whitespace, valid UTF-8, no non-printable characters.
pub fn validate_key(key: &str) -> Result<()> {
    if key.trim() != key {
        return Err(Error::Validation(
            "keys cannot start or end with whitespace".to_string(),
        ));
    }

    if key.len() < MIN_KEY_LENGTH {
        return Err(Error::Validation(format!(
            "keys must contain at least {MIN_KEY_LENGTH} character(s)"
        )));
    }

    if key.len() > MAX_KEY_LENGTH {
        return Err(Error::Validation(format!(
            "key cannot exceed max length of {MAX_KEY_LENGTH}"
        )));
    }

    if key.chars().any(is_non_graphic) {
        return Err(Error::Validation(
            "keys cannot contain non-printable characters".to_string(),
        ));
    }

    Ok(())
}

/// Validates a record value. Free text; the only requirement is valid
/// UTF-8, which is guaranteed by Rust's `&str` already — this exists so
/// callers have a single validation entry point per field, matching the
/// original's per-field `validate*` functions.
pub fn validate_value(_value: &str) -> Result<()> {
    Ok(())
}

/// Validates a single user tag against `^[a-z0-9-]{1,20}$`.
pub fn validate_tag(tag: &str) -> Result<()> {
    if !TAG_REGEX.is_match(tag) {
        return Err(Error::Validation(format!(
            "tags must match pattern '{TAG_PATTERN}'"
        )));
    }

    Ok(())
}

/// Validates a batch of tags, collecting every failure before returning.
pub fn validate_tags<'a, I>(tags: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut errors = Vec::new();
    for tag in tags {
        if let Err(e) = validate_tag(tag) {
            errors.push(e.to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(errors.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_key() {
        assert!(validate_key("order-42").is_ok());
    }

    #[test]
    fn rejects_empty_key() {
        assert!(validate_key("").is_err());
    }

    #[test]
    fn rejects_key_over_max_length() {
        let key = "a".repeat(MAX_KEY_LENGTH + 1);
        assert!(validate_key(&key).is_err());
    }

    #[test]
    fn accepts_key_at_max_length() {
        let key = "a".repeat(MAX_KEY_LENGTH);
        assert!(validate_key(&key).is_ok());
    }

    #[test]
    fn rejects_leading_or_trailing_whitespace() {
        assert!(validate_key(" key").is_err());
        assert!(validate_key("key ").is_err());
    }

    #[test]
    fn rejects_control_characters() {
        assert!(validate_key("key\nwith\nnewlines").is_err());
    }

    #[test]
    fn rejects_zero_width_space() {
        assert!(validate_key("a\u{200B}b").is_err());
    }

    #[test]
    fn rejects_byte_order_mark() {
        assert!(validate_key("a\u{FEFF}b").is_err());
    }

    #[test]
    fn accepts_non_ascii_letters() {
        assert!(validate_key("caf\u{e9}").is_ok());
    }

    #[test]
    fn accepts_lowercase_alnum_hyphen_tag() {
        assert!(validate_tag("find-me-1").is_ok());
    }

    #[test]
    fn rejects_uppercase_tag() {
        assert!(validate_tag("Find").is_err());
    }

    #[test]
    fn rejects_system_tag_prefix() {
        assert!(validate_tag(".created").is_err());
    }

    #[test]
    fn rejects_tag_over_max_length() {
        let tag = "a".repeat(21);
        assert!(validate_tag(&tag).is_err());
    }

    #[test]
    fn validate_tags_collects_all_failures() {
        let err = validate_tags(["ok-tag", "BAD", ".alsobad"]).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("pattern"));
    }

    #[test]
    fn value_accepts_anything() {
        assert!(validate_value("").is_ok());
        assert!(validate_value("anything at all, \u{1F600}").is_ok());
    }
}
