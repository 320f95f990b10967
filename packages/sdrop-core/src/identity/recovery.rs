//! # Password-Based Key Recovery
//!
//! Wraps the identity private key under a password-derived key so the server
//! can hold a copy it cannot read, and unwraps it again on a new device.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         KEY ESCROW                                      │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Registration (device A)                                               │
//! │  ───────────────────────                                                │
//! │  salt     = 16 random bytes                                            │
//! │  wrap_key = PBKDF2(password, salt)                                     │
//! │  sealed   = AES-256-GCM(wrap_key, private_key_text)                    │
//! │                                                                         │
//! │  Server stores, opaque to it:                                          │
//! │  ┌──────────────────────────────────────────────────────────────┐     │
//! │  │ { "encrypted_private_key": "<nonce>:<ciphertext>",          │     │
//! │  │   "key_salt":              "<salt>" }                        │     │
//! │  └──────────────────────────────────────────────────────────────┘     │
//! │                                                                         │
//! │  Recovery (device B)                                                   │
//! │  ───────────────────                                                    │
//! │  wrap_key = PBKDF2(password', salt)                                    │
//! │  private_key_text = open(wrap_key, sealed)   or   RecoveryFailed       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Losing the password makes the record permanently unrecoverable. There is
//! no other way back in.
//!
//! Every unwrap failure (malformed record, wrong password, tampering, garbage
//! plaintext) surfaces as the same [`Error::RecoveryFailed`]; the distinct
//! cause only reaches debug logs.

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::crypto::{
    derive_key_from_password, generate_salt, CryptoProvider, KdfParams, Salt, SealedPayload,
    SymmetricKey,
};
use crate::encoding;
use crate::error::{RecoveryFailure, Result};

/// The wrapped private key as stored on the user's server profile
///
/// Field names match the profile record the transport layer exchanges.
/// Safe to hand to an untrusted server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowRecord {
    /// `base64(nonce):base64(ciphertext)` of the private key text
    pub encrypted_private_key: String,
    /// base64 of the 16-byte PBKDF2 salt
    pub key_salt: String,
}

impl EscrowRecord {
    /// Build a record from the sealed key and the salt its wrapping key used
    pub fn from_parts(sealed: &SealedPayload, salt: &Salt) -> Self {
        Self {
            encrypted_private_key: sealed.pack(),
            key_salt: encoding::to_text(salt.as_bytes()),
        }
    }

    fn parse(&self) -> std::result::Result<(Salt, SealedPayload), RecoveryFailure> {
        let salt = encoding::to_bytes(&self.key_salt)
            .and_then(|bytes| Salt::from_slice(&bytes))
            .map_err(|_| RecoveryFailure::MalformedRecord)?;
        let sealed = SealedPayload::unpack(&self.encrypted_private_key)
            .map_err(|_| RecoveryFailure::MalformedRecord)?;
        Ok((salt, sealed))
    }

    /// Whether both fields parse, without attempting decryption
    pub fn is_well_formed(&self) -> bool {
        self.parse().is_ok()
    }
}

/// Wrap private key text under an already derived password key
///
/// `salt` must be the salt `password_key` was derived with; it is stored in
/// the record unchanged.
pub fn wrap_private_key(
    provider: &dyn CryptoProvider,
    private_key_text: &str,
    password_key: &SymmetricKey,
    salt: &Salt,
) -> Result<EscrowRecord> {
    let sealed = SealedPayload::seal(provider, password_key, private_key_text.as_bytes())?;
    Ok(EscrowRecord::from_parts(&sealed, salt))
}

/// Generate a salt, derive the password key and wrap in one step
pub fn wrap_with_password(
    provider: &dyn CryptoProvider,
    private_key_text: &str,
    password: &str,
    params: &KdfParams,
) -> Result<EscrowRecord> {
    let salt = generate_salt(provider)?;
    let password_key = derive_key_from_password(password, &salt, params)?;
    wrap_private_key(provider, private_key_text, &password_key, &salt)
}

/// Recover private key text from an escrow record and a password
///
/// ## Errors
///
/// `RecoveryFailed` for any failure. Retrying with another password is
/// always allowed.
pub fn unwrap_private_key(
    record: &EscrowRecord,
    password: &str,
    params: &KdfParams,
) -> Result<Zeroizing<String>> {
    unwrap_inner(record, password, params).map_err(RecoveryFailure::into_public)
}

fn unwrap_inner(
    record: &EscrowRecord,
    password: &str,
    params: &KdfParams,
) -> std::result::Result<Zeroizing<String>, RecoveryFailure> {
    let (salt, sealed) = record.parse()?;

    let password_key = derive_key_from_password(password, &salt, params)
        .map_err(|_| RecoveryFailure::Authentication)?;

    let plaintext = Zeroizing::new(
        sealed
            .open(&password_key)
            .map_err(|_| RecoveryFailure::Authentication)?,
    );

    let text = std::str::from_utf8(&plaintext).map_err(|_| RecoveryFailure::InvalidPlaintext)?;
    Ok(Zeroizing::new(text.to_owned()))
}

// ============================================================================
// TESTS
// ============================================================================
