//! Input validation applied before anything is sent.

use crate::error::{Error, Result};

/// Default maximum message length, in characters.
pub const DEFAULT_MAX_MESSAGE_CHARS: usize = 500;

/// Validates raw input and returns the text to send.
///
/// Surrounding whitespace is trimmed. Empty input yields
/// [`Error::EmptyInput`]; input longer than `max_chars` characters yields
/// [`Error::InputTooLong`].
pub fn validate_input(raw: &str, max_chars: usize) -> Result<String> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(Error::EmptyInput);
    }
    let length = text.chars().count();
    if length > max_chars {
        return Err(Error::input_too_long(length, max_chars));
    }
    Ok(text.to_string())
}
