//! # Error Handling
//!
//! Error types for the Secure Drop key custody and message encryption core.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Encoding Errors                                                   │
//! │  │   └── InvalidEncoding       - Malformed base64 / placeholder text   │
//! │  │                                                                      │
//! │  ├── Key Errors                                                        │
//! │  │   ├── KeyImport             - Malformed or wrong-curve key          │
//! │  │   ├── KeyAgreement          - Incompatible keys at derivation       │
//! │  │   ├── KeyGeneration         - Keypair generation failed             │
//! │  │   └── KeyDerivationFailed   - KDF / HKDF failure                    │
//! │  │                                                                      │
//! │  ├── Cipher Errors                                                     │
//! │  │   ├── EncryptionFailed      - AEAD seal failed                      │
//! │  │   ├── DecryptionFailed      - Authentication tag mismatch           │
//! │  │   └── RngFailed             - Crypto provider had no randomness     │
//! │  │                                                                      │
//! │  ├── Recovery Errors                                                   │
//! │  │   └── RecoveryFailed        - Wrong password OR corrupted record    │
//! │  │                                                                      │
//! │  ├── Client Errors                                                     │
//! │  │   ├── InvalidState          - Onboarding step out of order          │
//! │  │   ├── EncryptionUnavailable - Conversation has no session key       │
//! │  │   └── InvalidConfig         - Rejected configuration value          │
//! │  │                                                                      │
//! │  └── Storage / Internal Errors                                         │
//! │      ├── StorageReadError / StorageWriteError                          │
//! │      ├── SerializationError                                            │
//! │      └── Internal                                                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Oracle Resistance
//!
//! `RecoveryFailed` deliberately merges "wrong password", "corrupted record"
//! and "tampered record". The distinct causes live in [`RecoveryFailure`],
//! which is crate-private and only ever reaches `tracing` output.
//! `DecryptionFailed` carries no detail at all.

use thiserror::Error;

/// Result type alias for Secure Drop core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the Secure Drop core
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Encoding Errors (100-199)
    // ========================================================================

    /// Input text is absent, a propagated placeholder, or not base64
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    // ========================================================================
    // Key Errors (200-299)
    // ========================================================================

    /// Malformed or wrong-curve key material
    #[error("Key import failed: {0}")]
    KeyImport(String),

    /// Keys cannot be combined into a session key
    #[error("Key agreement failed: {0}")]
    KeyAgreement(String),

    /// Keypair generation failed
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    /// Key derivation failed
    #[error("Failed to derive keys: {0}")]
    KeyDerivationFailed(String),

    // ========================================================================
    // Cipher Errors (300-399)
    // ========================================================================

    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Authentication tag did not verify (wrong key, corruption or tampering)
    #[error("Decryption failed")]
    DecryptionFailed,

    /// Random number generation failed
    #[error("Random number generation failed")]
    RngFailed,

    // ========================================================================
    // Recovery Errors (400-499)
    // ========================================================================

    /// The escrowed private key could not be recovered.
    ///
    /// Shown to users as "incorrect password"; retryable without limit.
    #[error("Key recovery failed: incorrect password")]
    RecoveryFailed,

    // ========================================================================
    // Client Errors (500-599)
    // ========================================================================

    /// An onboarding step was invoked from the wrong state
    #[error("Invalid onboarding state: {0}")]
    InvalidState(String),

    /// The conversation has no usable session key
    #[error("Encryption unavailable for this conversation: {0}")]
    EncryptionUnavailable(String),

    /// A configuration value was rejected
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ========================================================================
    // Storage Errors (600-699)
    // ========================================================================

    /// Failed to read from local key storage
    #[error("Failed to read from storage: {0}")]
    StorageReadError(String),

    /// Failed to write to local key storage
    #[error("Failed to write to storage: {0}")]
    StorageWriteError(String),

    // ========================================================================
    // Internal Errors (900-999)
    // ========================================================================

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Get the numeric error code for the UI boundary
    ///
    /// Error codes are organized by category:
    /// - 100-199: Encoding
    /// - 200-299: Keys
    /// - 300-399: Cipher
    /// - 400-499: Recovery
    /// - 500-599: Client
    /// - 600-699: Storage
    /// - 900-999: Internal
    pub fn code(&self) -> i32 {
        match self {
            Error::InvalidEncoding(_) => 100,

            Error::KeyImport(_) => 200,
            Error::KeyAgreement(_) => 201,
            Error::KeyGeneration(_) => 202,
            Error::KeyDerivationFailed(_) => 203,

            Error::EncryptionFailed(_) => 300,
            Error::DecryptionFailed => 301,
            Error::RngFailed => 302,

            Error::RecoveryFailed => 400,

            Error::InvalidState(_) => 501,
            Error::EncryptionUnavailable(_) => 502,
            Error::InvalidConfig(_) => 503,

            Error::StorageReadError(_) => 600,
            Error::StorageWriteError(_) => 601,

            Error::SerializationError(_) => 900,
            Error::Internal(_) => 901,
        }
    }

    /// Check if this error is recoverable by retrying the same operation
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::RecoveryFailed
                | Error::RngFailed
                | Error::StorageReadError(_)
                | Error::StorageWriteError(_)
        )
    }

    /// Check if this error requires user action
    pub fn requires_user_action(&self) -> bool {
        matches!(
            self,
            Error::RecoveryFailed | Error::EncryptionUnavailable(_)
        )
    }
}

// ============================================================================
// INTERNAL CAUSES
// ============================================================================

/// Why an unwrap attempt failed. Never crosses the public API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RecoveryFailure {
    /// The packed `nonce:ciphertext` or the salt could not be parsed
    MalformedRecord,
    /// Wrong password, or the record was corrupted or tampered with
    Authentication,
    /// Decrypted bytes are not a usable private key text
    InvalidPlaintext,
}

impl RecoveryFailure {
    /// Collapse into the single externally visible error.
    pub(crate) fn into_public(self) -> Error {
        tracing::debug!(cause = ?self, "private key unwrap failed");
        Error::RecoveryFailed
    }
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Internal(format!("background task failed: {}", err))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::InvalidEncoding("x".into()).code(), 100);
        assert_eq!(Error::KeyImport("x".into()).code(), 200);
        assert_eq!(Error::DecryptionFailed.code(), 301);
        assert_eq!(Error::RecoveryFailed.code(), 400);
        assert_eq!(Error::InvalidState("x".into()).code(), 501);
        assert_eq!(Error::StorageReadError("x".into()).code(), 600);
        assert_eq!(Error::Internal("x".into()).code(), 901);
    }

    #[test]
    fn test_recovery_failure_causes_merge() {
        for cause in [
            RecoveryFailure::MalformedRecord,
            RecoveryFailure::Authentication,
            RecoveryFailure::InvalidPlaintext,
        ] {
            let err = cause.into_public();
            assert!(matches!(err, Error::RecoveryFailed));
            assert_eq!(err.to_string(), "Key recovery failed: incorrect password");
        }
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(Error::RecoveryFailed.is_recoverable());
        assert!(Error::RecoveryFailed.requires_user_action());
        assert!(!Error::DecryptionFailed.is_recoverable());
        assert!(!Error::KeyImport("bad".into()).is_recoverable());
    }
}
