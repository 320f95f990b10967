//! # Messaging Module
//!
//! Per-conversation session keys and the message wire codec.
//!
//! ## Message Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        MESSAGE FLOW                                     │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  open conversation                                                     │
//! │    peer public key ──► derive_session_key ──► SessionKeyCache          │
//! │                                                                         │
//! │  send                                                                  │
//! │    text ──► encode_outgoing(key) ──► "nonce:ciphertext" ──► server     │
//! │                                                                         │
//! │  receive / load history                                                │
//! │    wire ──► decode_incoming(key) ──► Plaintext | Decrypted |           │
//! │                                      Undecryptable                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod codec;
mod sessions;

pub use codec::{
    decode_incoming, encode_outgoing, is_envelope, DecodedMessage, DEFAULT_UNDECRYPTABLE_MARKER,
};
pub use sessions::{ConversationId, ConversationStatus, SessionKeyCache};
