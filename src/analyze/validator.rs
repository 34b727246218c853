//! Input gate: runs before any normalization so malformed text never reaches
//! the classifier.

use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

/// Inclusive lower bound on trimmed length, in characters.
pub const MIN_INPUT_CHARS: usize = 5;

/// Why a request was rejected. User-correctable, never a system fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputRejection {
    #[error("input is empty")]
    Empty,
    #[error("input too short: {chars} chars (minimum {min})")]
    TooShort { chars: usize, min: usize },
}

impl InputRejection {
    /// End-user facing message.
    pub fn user_message(&self) -> &'static str {
        match self {
            InputRejection::Empty => "Câu không hợp lệ, thử lại.",
            InputRejection::TooShort { .. } => "Câu quá ngắn! (≥ 5 ký tự)",
        }
    }
}

/// Trim, enforce the minimum length, then compose to NFC.
///
/// Length is counted in chars of the trimmed input as typed; composition only
/// shapes the returned text.
pub fn validate(text: &str) -> Result<String, InputRejection> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(InputRejection::Empty);
    }
    let chars = trimmed.chars().count();
    if chars < MIN_INPUT_CHARS {
        return Err(InputRejection::TooShort {
            chars,
            min: MIN_INPUT_CHARS,
        });
    }
    Ok(trimmed.nfc().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_is_inclusive() {
        assert_eq!(
            validate("abcd"),
            Err(InputRejection::TooShort { chars: 4, min: 5 })
        );
        assert_eq!(validate("abcde").as_deref(), Ok("abcde"));
    }

    #[test]
    fn whitespace_only_is_empty() {
        assert_eq!(validate(""), Err(InputRejection::Empty));
        assert_eq!(validate(" \t\n "), Err(InputRejection::Empty));
    }

    #[test]
    fn trims_before_counting() {
        assert!(matches!(
            validate("   ok   "),
            Err(InputRejection::TooShort { chars: 2, .. })
        ));
        assert_eq!(validate("  Hôm nay  ").as_deref(), Ok("Hôm nay"));
    }

    #[test]
    fn combining_marks_count_as_typed_and_output_is_composed() {
        // "vuiệ" spelled with combining marks: e + U+0302 + U+0323, 6 chars
        let decomposed = "vuie\u{0302}\u{0323}";
        assert_eq!(validate(decomposed).as_deref(), Ok("vui\u{1ec7}"));
        assert_eq!(
            validate("vie\u{0302}"),
            Err(InputRejection::TooShort { chars: 4, min: 5 })
        );
        let ok = validate("Tốt la\u{0302}\u{0301}m").unwrap();
        assert_eq!(ok, "Tốt lấm");
    }

    #[test]
    fn user_messages_are_vietnamese() {
        assert_eq!(InputRejection::Empty.user_message(), "Câu không hợp lệ, thử lại.");
        assert!(InputRejection::TooShort { chars: 2, min: 5 }
            .user_message()
            .contains("≥ 5"));
    }
}
