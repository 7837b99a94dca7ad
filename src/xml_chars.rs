//! XML character validity checks.
//!
//! A character is rejected when its Unicode general category is one that
//! XML 1.0 documents cannot carry: control, format, line separator,
//! paragraph separator or unassigned.
//! See <https://www.w3.org/TR/REC-xml/#charsets>.

use thiserror::Error;
use unicode_general_category::{GeneralCategory, get_general_category};

/// A string contained at least one character that is not valid in XML.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Default)]
#[error("string contains a character that is not valid in XML")]
pub struct IllegalCharacterError;

/// Returns `true` when `c` may not appear in an XML document.
///
/// With `allow_crlf`, `'\r'` and `'\n'` are accepted even though they are
/// control characters. Characters outside the Basic Multilingual Plane are
/// judged by their own category, never as surrogate halves.
///
/// # Examples
/// ```rust
/// # use ad_invalid_chars::is_illegal;
/// assert!(is_illegal('\u{1}', true));
/// assert!(is_illegal('\n', false));
/// assert!(!is_illegal('\n', true));
/// assert!(!is_illegal('A', false));
/// ```
#[must_use]
#[inline]
pub fn is_illegal(c: char, allow_crlf: bool) -> bool {
    if allow_crlf && matches!(c, '\r' | '\n') {
        return false;
    }
    matches!(
        get_general_category(c),
        GeneralCategory::LineSeparator
            | GeneralCategory::ParagraphSeparator
            | GeneralCategory::Control
            | GeneralCategory::Format
            | GeneralCategory::Unassigned
    )
}

/// Checks every character of `s`, stopping at the first illegal one.
///
/// # Errors
/// [`IllegalCharacterError`] if any character is illegal per [`is_illegal`].
#[inline]
pub fn validate_str(s: &str, allow_crlf: bool) -> Result<(), IllegalCharacterError> {
    validate_chars(s.chars(), allow_crlf)
}

/// Same check as [`validate_str`] over any character source. Characters after
/// the first illegal one are never pulled from `chars`.
///
/// # Errors
/// [`IllegalCharacterError`] if any character is illegal per [`is_illegal`].
#[inline]
pub fn validate_chars<I>(chars: I, allow_crlf: bool) -> Result<(), IllegalCharacterError>
where
    I: IntoIterator<Item = char>,
{
    if chars.into_iter().any(|c| is_illegal(c, allow_crlf)) {
        Err(IllegalCharacterError)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    #[test]
    fn rejected_categories() {
        for (c, category) in [
            ('\u{0}', "control"),
            ('\u{1}', "control"),
            ('\t', "control"),
            ('\u{7f}', "control"),
            ('\u{85}', "control"),
            ('\u{ad}', "format"),
            ('\u{200b}', "format"),
            ('\u{feff}', "format"),
            ('\u{2028}', "line separator"),
            ('\u{2029}', "paragraph separator"),
            ('\u{378}', "unassigned"),
            ('\u{ffff}', "unassigned"),
        ] {
            assert!(is_illegal(c, false), "{category} U+{:04X}", u32::from(c));
            assert!(is_illegal(c, true), "{category} U+{:04X}", u32::from(c));
        }
    }

    #[test]
    fn crlf_depends_on_allowance() {
        for c in ['\r', '\n'] {
            assert!(is_illegal(c, false), "U+{:04X} is a control", u32::from(c));
            assert!(!is_illegal(c, true), "U+{:04X} is allowed", u32::from(c));
        }
    }

    #[test]
    fn accepted_categories() {
        for c in ['A', 'z', '0', ' ', '\u{a0}', 'é', '€', '中', '\u{301}', '😀', '\u{e000}'] {
            assert!(!is_illegal(c, false), "U+{:04X}", u32::from(c));
        }
    }

    #[test]
    fn astral_characters_are_judged_by_their_own_category() {
        for (c, category) in [
            ('\u{e0001}', "format, language tag"),
            ('\u{1d173}', "format, musical symbol begin beam"),
            ('\u{e0080}', "unassigned"),
            ('\u{10ffff}', "noncharacter, unassigned"),
        ] {
            assert!(is_illegal(c, true), "{category} U+{:04X}", u32::from(c));
        }
        for c in ['\u{10000}', '\u{1f600}', '\u{20000}', '\u{f0000}'] {
            assert!(!is_illegal(c, true), "U+{:04X}", u32::from(c));
        }
        assert_eq!(validate_str("tag\u{e0001}", true), Err(IllegalCharacterError));
    }

    #[test]
    fn validate_str_results() {
        assert_eq!(validate_str("", false), Ok(()));
        assert_eq!(validate_str("Jane Doe", false), Ok(()));
        assert_eq!(validate_str("line one\r\nline two", true), Ok(()));
        assert_eq!(
            validate_str("line one\r\nline two", false),
            Err(IllegalCharacterError)
        );
        assert_eq!(
            validate_str("hello\u{7}world", true),
            Err(IllegalCharacterError)
        );
    }

    #[test]
    fn stops_at_first_illegal_character() {
        let pulled = Cell::new(0usize);
        let counted = "ab\u{1}cd\u{2}".chars().inspect(|_| pulled.set(pulled.get() + 1));
        assert_eq!(validate_chars(counted, true), Err(IllegalCharacterError));
        assert_eq!(pulled.get(), 3, "characters after U+0001 were read");
    }
}
