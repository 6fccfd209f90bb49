//! Speech payload conversion (base64 text to raw bytes)
//!
//! The speech provider returns audio as standard-alphabet base64 with
//! canonical `=` padding. URL-safe text, stray characters and bad padding
//! are rejected; nothing is silently skipped.

use crate::error::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Decode a standard base64 string into bytes
///
/// # Errors
/// `Error::Decode` if the text contains characters outside the standard
/// alphabet or has invalid padding.
///
/// # Examples
///
/// ```
/// use tangshi_audio::decode_base64;
///
/// assert_eq!(decode_base64("AID/fw==").unwrap(), vec![0x00, 0x80, 0xFF, 0x7F]);
/// assert!(decode_base64("AID_fw==").is_err());
/// ```
pub fn decode_base64(text: &str) -> Result<Vec<u8>> {
    Ok(STANDARD.decode(text)?)
}

/// Remove all ASCII whitespace (line breaks from text files, wrapped output)
pub fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_ascii_whitespace()).collect()
}
