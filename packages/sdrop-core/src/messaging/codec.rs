//! # Message Codec
//!
//! Converts message text to and from its wire form.
//!
//! ## Wire Format
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        MESSAGE CONTENT ON THE WIRE                      │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Encrypted:   base64(nonce) ":" base64(ciphertext || tag)              │
//! │               └── 16 chars ─┘   └─────── variable ───────┘             │
//! │                                                                         │
//! │  Legacy:      anything else, shown as-is                               │
//! │                                                                         │
//! │  Classification of incoming content:                                   │
//! │                                                                         │
//! │    no ':'                                  → legacy plaintext          │
//! │    ':' but a segment is empty or not       → legacy plaintext          │
//! │        in [A-Za-z0-9+/=]                     ("data:image/png;...",    │
//! │                                               "note: see above")       │
//! │    otherwise                               → envelope, decrypt it      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A message that looks like an envelope but cannot be opened decodes to
//! [`DecodedMessage::Undecryptable`]. It never becomes an error, so one bad
//! message cannot stop the rest of a conversation from rendering.

use serde::Serialize;

use crate::crypto::{CryptoProvider, SealedPayload, SymmetricKey, SEGMENT_SEPARATOR};
use crate::encoding;
use crate::error::Result;

/// Marker shown in place of a message that could not be decrypted
pub const DEFAULT_UNDECRYPTABLE_MARKER: &str = "[Decryption Error]";

/// Result of decoding one incoming message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum DecodedMessage {
    /// Content was never encrypted
    Plaintext(String),
    /// Content was an envelope and decrypted cleanly
    Decrypted(String),
    /// Content was an envelope that could not be opened
    Undecryptable,
}

impl DecodedMessage {
    /// Text to display, substituting `marker` for undecryptable messages
    pub fn display_text<'a>(&'a self, marker: &'a str) -> &'a str {
        match self {
            DecodedMessage::Plaintext(text) | DecodedMessage::Decrypted(text) => text,
            DecodedMessage::Undecryptable => marker,
        }
    }

    /// Whether decryption failed
    pub fn is_undecryptable(&self) -> bool {
        matches!(self, DecodedMessage::Undecryptable)
    }
}

/// Why an envelope could not be opened. Only ever logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UndecryptableCause {
    /// Segments are base64-shaped but do not decode, or the nonce length is wrong
    MalformedEnvelope,
    /// Tag mismatch: wrong session key, corruption or tampering
    Authentication,
    /// Decrypted bytes are not UTF-8
    InvalidUtf8,
}

/// Whether incoming content is an envelope rather than legacy plaintext
pub fn is_envelope(wire: &str) -> bool {
    match wire.split_once(SEGMENT_SEPARATOR) {
        Some((nonce, ciphertext)) => {
            encoding::is_wire_segment(nonce) && encoding::is_wire_segment(ciphertext)
        }
        None => false,
    }
}

/// Encrypt message text under a session key into its wire form
pub fn encode_outgoing(
    provider: &dyn CryptoProvider,
    plain_text: &str,
    session_key: &SymmetricKey,
) -> Result<String> {
    Ok(SealedPayload::seal(provider, session_key, plain_text.as_bytes())?.pack())
}

/// Decode incoming wire content with a session key
pub fn decode_incoming(wire: &str, session_key: &SymmetricKey) -> DecodedMessage {
    if !is_envelope(wire) {
        return DecodedMessage::Plaintext(wire.to_string());
    }

    match open_envelope(wire, session_key) {
        Ok(text) => DecodedMessage::Decrypted(text),
        Err(cause) => {
            tracing::warn!(?cause, wire_len = wire.len(), "message could not be decrypted");
            DecodedMessage::Undecryptable
        }
    }
}

fn open_envelope(
    wire: &str,
    session_key: &SymmetricKey,
) -> std::result::Result<String, UndecryptableCause> {
    let sealed = SealedPayload::unpack(wire).map_err(|_| UndecryptableCause::MalformedEnvelope)?;
    let bytes = sealed
        .open(session_key)
        .map_err(|_| UndecryptableCause::Authentication)?;
    String::from_utf8(bytes).map_err(|_| UndecryptableCause::InvalidUtf8)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Nonce, OsCryptoProvider, NONCE_SIZE};

    fn key() -> SymmetricKey {
        SymmetricKey::from_bytes([7u8; 32])
    }

    #[test]
    fn test_round_trip() {
        for text in ["hi", "", "Привет, мир", "emoji 🔒 and: colons", "a:b:c"] {
            let wire = encode_outgoing(&OsCryptoProvider, text, &key()).unwrap();
            assert!(is_envelope(&wire));
            assert_eq!(
                decode_incoming(&wire, &key()),
                DecodedMessage::Decrypted(text.to_string())
            );
        }
    }

    #[test]
    fn test_wire_shape() {
        let wire = encode_outgoing(&OsCryptoProvider, "hello", &key()).unwrap();
        let (nonce, ciphertext) = wire.split_once(':').unwrap();

        assert_eq!(encoding::to_bytes(nonce).unwrap().len(), NONCE_SIZE);
        assert_eq!(encoding::to_bytes(ciphertext).unwrap().len(), 5 + 16);
    }

    #[test]
    fn test_legacy_passthrough() {
        assert_eq!(
            decode_incoming("hello world", &key()),
            DecodedMessage::Plaintext("hello world".into())
        );
    }

    #[test]
    fn test_colon_bearing_plaintext_passthrough() {
        for text in [
            "data:image/png;base64,iVBORw0KGgo=",
            "note: see above",
            "12:30 works for me",
            "ends with colon:",
            ":starts with colon",
        ] {
            assert_eq!(
                decode_incoming(text, &key()),
                DecodedMessage::Plaintext(text.into()),
                "{text}"
            );
        }
    }

    #[test]
    fn test_wrong_key_is_undecryptable() {
        let wire = encode_outgoing(&OsCryptoProvider, "secret", &key()).unwrap();
        let other = SymmetricKey::from_bytes([8u8; 32]);

        let decoded = decode_incoming(&wire, &other);
        assert!(decoded.is_undecryptable());
        assert_eq!(decoded.display_text(DEFAULT_UNDECRYPTABLE_MARKER), "[Decryption Error]");
    }

    #[test]
    fn test_malformed_envelope_is_undecryptable() {
        // both segments look like base64 but the nonce is 3 bytes
        assert!(decode_incoming("AAAA:AAAAAAAAAAAAAAAAAAAAAA==", &key()).is_undecryptable());
    }

    #[test]
    fn test_non_utf8_plaintext_is_undecryptable() {
        let sealed = SealedPayload::seal(&OsCryptoProvider, &key(), &[0xff, 0xfe, 0xfd]).unwrap();
        assert!(decode_incoming(&sealed.pack(), &key()).is_undecryptable());
    }

    #[test]
    fn test_tampered_envelope_is_undecryptable() {
        let mut sealed = SealedPayload::seal(&OsCryptoProvider, &key(), b"original").unwrap();
        sealed.ciphertext[2] ^= 0x40;
        assert!(decode_incoming(&sealed.pack(), &key()).is_undecryptable());

        let mut sealed = SealedPayload::seal(&OsCryptoProvider, &key(), b"original").unwrap();
        let mut nonce = *sealed.nonce.as_bytes();
        nonce[0] ^= 1;
        sealed.nonce = Nonce::from_bytes(nonce);
        assert!(decode_incoming(&sealed.pack(), &key()).is_undecryptable());
    }

    #[test]
    fn test_display_text() {
        let plain = DecodedMessage::Plaintext("p".into());
        let dec = DecodedMessage::Decrypted("d".into());
        assert_eq!(plain.display_text("X"), "p");
        assert_eq!(dec.display_text("X"), "d");
        assert_eq!(DecodedMessage::Undecryptable.display_text("X"), "X");
    }
}
