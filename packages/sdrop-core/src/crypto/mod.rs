//! # Cryptography Module
//!
//! All cryptographic primitives used by the Secure Drop core.
//!
//! ## Security Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    CRYPTOGRAPHIC ARCHITECTURE                           │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    KEY HIERARCHY                                │   │
//! │  ├─────────────────────────────────────────────────────────────────┤   │
//! │  │                                                                 │   │
//! │  │  Identity KeyPair (P-256 ECDH, one per user)                   │   │
//! │  │     │                          │                                │   │
//! │  │     │ private (pkcs8)          │ public (spki)                  │   │
//! │  │     ▼                          ▼                                │   │
//! │  │  ┌──────────────────┐     ┌──────────────────┐                 │   │
//! │  │  │ Local device     │     │ Server profile   │                 │   │
//! │  │  │ storage          │     │ (non-secret)     │                 │   │
//! │  │  └──────────────────┘     └──────────────────┘                 │   │
//! │  │     │                                                           │   │
//! │  │     │ wrapped with PBKDF2(password, salt) key                  │   │
//! │  │     ▼                                                           │   │
//! │  │  ┌──────────────────┐                                          │   │
//! │  │  │ Escrow record    │  encrypted_private_key + key_salt        │   │
//! │  │  └──────────────────┘                                          │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 ENCRYPTION SCHEME                               │   │
//! │  ├─────────────────────────────────────────────────────────────────┤   │
//! │  │                                                                 │   │
//! │  │  1. Key Exchange: P-256 ECDH                                   │   │
//! │  │     Alice's Private × Bob's Public = Shared x-coordinate       │   │
//! │  │                                                                 │   │
//! │  │  2. Session Key: raw x-coordinate, or HKDF-SHA256 of it        │   │
//! │  │                                                                 │   │
//! │  │  3. Encryption: AES-256-GCM                                    │   │
//! │  │     • 256-bit key                                              │   │
//! │  │     • 96-bit nonce (random per message)                        │   │
//! │  │     • 128-bit authentication tag                               │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Algorithm Choices
//!
//! | Algorithm | Purpose |
//! |-----------|---------|
//! | P-256 ECDH | Key agreement, WebCrypto compatible |
//! | AES-256-GCM | Message and key wrapping AEAD |
//! | PBKDF2-HMAC-SHA256 | Recovery password stretching |
//! | HKDF-SHA256 | Optional session key expansion |
//!
//! ## Security Considerations
//!
//! 1. **Key Zeroization**: Secret keys are zeroized when dropped
//! 2. **Injected Randomness**: Every nonce, salt and key is drawn from a
//!    [`CryptoProvider`]
//! 3. **No Key Reuse**: Unique nonces for every encryption operation

mod agreement;
mod encryption;
mod kdf;
mod keys;
mod provider;

pub use agreement::{derive_session_key, derive_session_key_from_text, SessionKeyMode};
pub use encryption::{
    decrypt, encrypt, Nonce, SealedPayload, SymmetricKey, KEY_SIZE, NONCE_SIZE, SEGMENT_SEPARATOR,
    TAG_SIZE,
};
pub use kdf::{
    derive_key_from_password, derive_session_key_material, generate_salt, KdfParams, Salt,
    DEFAULT_PBKDF2_ITERATIONS, MIN_PBKDF2_ITERATIONS, SALT_SIZE,
};
pub use keys::{
    export_key, import_private_key, import_public_key, IdentityKeyPair, IdentityPrivateKey,
    IdentityPublicKey, KeyRef, KeyRole,
};
pub use provider::{CryptoProvider, OsCryptoProvider, SeededCryptoProvider};
