//! # Encoding Utilities
//!
//! Binary ⇄ text conversion for everything that crosses the JSON/HTTP
//! boundary: keys, salts, nonces and ciphertexts.
//!
//! Encoding is plain standard base64 with padding. Decoding is defensive:
//! key material that passed through a careless object-to-string step on the
//! way from the server tends to arrive with whitespace, URL-safe characters,
//! missing padding, or as the literal text of a missing value. The first
//! three are repaired; anything else fails with
//! [`Error::InvalidEncoding`](crate::Error::InvalidEncoding) instead of
//! producing silently wrong bytes.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::error::{Error, Result};

/// Literal strings that mean "a previous step lost the value".
const MISSING_VALUE_PLACEHOLDERS: &[&str] = &["undefined", "null", "None", "[object Object]"];

/// Encode bytes as standard, padded base64.
pub fn to_text(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

/// Decode base64 text, repairing common transport damage.
///
/// Normalization steps:
/// 1. trim surrounding whitespace and drop embedded line breaks
/// 2. map the URL-safe alphabet (`-`, `_`) onto the standard one
/// 3. re-pad to a multiple of four characters
pub fn to_bytes(text: &str) -> Result<Vec<u8>> {
    let trimmed = text.trim();

    if MISSING_VALUE_PLACEHOLDERS.contains(&trimmed) {
        return Err(Error::InvalidEncoding(
            "input is a missing-value placeholder".into(),
        ));
    }

    let mut normalized: String = trimmed
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();

    let unpadded_len = normalized.trim_end_matches('=').len();
    normalized.truncate(unpadded_len);
    if normalized.is_empty() {
        return Err(Error::InvalidEncoding("input is empty".into()));
    }
    if unpadded_len % 4 == 1 {
        return Err(Error::InvalidEncoding("input has an impossible length".into()));
    }
    while normalized.len() % 4 != 0 {
        normalized.push('=');
    }

    // DecodeError carries offsets and byte values; keep them out of the message.
    BASE64
        .decode(normalized.as_bytes())
        .map_err(|_| Error::InvalidEncoding("input is not valid base64".into()))
}

/// Decode an optional field, treating absence as an encoding failure.
pub fn to_bytes_opt(text: Option<&str>) -> Result<Vec<u8>> {
    match text {
        Some(t) => to_bytes(t),
        None => Err(Error::InvalidEncoding("input is absent".into())),
    }
}

/// Whether `segment` is non-empty and uses only the standard base64 alphabet.
///
/// Used by the message codec to tell envelopes from legacy plaintext that
/// happens to contain a colon.
pub(crate) fn is_wire_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/' || b == b'=')
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let data: Vec<u8> = (0u8..=255).collect();
        assert_eq!(to_bytes(&to_text(&data)).unwrap(), data);
    }

    #[test]
    fn test_trims_whitespace_and_line_breaks() {
        let text = format!("  {}\r\n", to_text(b"hello world"));
        assert_eq!(to_bytes(&text).unwrap(), b"hello world");

        assert_eq!(to_bytes("aGVs\nbG8=").unwrap(), b"hello");
    }

    #[test]
    fn test_url_safe_alphabet_normalized() {
        let bytes = [0xfbu8, 0xff, 0xbf];
        assert_eq!(to_text(&bytes), "+/+/");
        assert_eq!(to_bytes("-_-_").unwrap(), bytes);
    }

    #[test]
    fn test_missing_padding_repaired() {
        assert_eq!(to_bytes("aGVsbG8").unwrap(), b"hello");
        assert_eq!(to_bytes("aGk").unwrap(), b"hi");
        assert_eq!(to_bytes("aGk==").unwrap(), b"hi");
    }

    #[test]
    fn test_placeholders_rejected() {
        for placeholder in ["undefined", "null", " null ", "[object Object]"] {
            assert!(matches!(
                to_bytes(placeholder),
                Err(Error::InvalidEncoding(_))
            ));
        }
        assert!(matches!(to_bytes_opt(None), Err(Error::InvalidEncoding(_))));
        for empty in ["", "   ", "=", "==", "====", " = = "] {
            assert!(matches!(to_bytes(empty), Err(Error::InvalidEncoding(_))));
        }
    }

    #[test]
    fn test_garbage_rejected_without_position() {
        let err = to_bytes("abc$def").unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, Error::InvalidEncoding(_)));
        assert!(!msg.contains('3'));
        assert!(!msg.contains('$'));

        assert!(to_bytes("a").is_err());
    }

    #[test]
    fn test_wire_segment() {
        assert!(is_wire_segment("AAAA+/=="));
        assert!(!is_wire_segment(""));
        assert!(is_wire_segment("data"));
        assert!(!is_wire_segment(" world"));
        assert!(!is_wire_segment("image/png;base64,AAAA"));
    }
}
