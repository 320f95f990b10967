//! # Secure Drop Core
//!
//! Client-side key custody and message encryption for the Secure Drop
//! end-to-end encrypted messenger.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       SECURE DROP CORE MODULES                          │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                     SecureDropClient                             │  │
//! │  │   register · start_session · restore_with_password · sign_out   │  │
//! │  │   open_conversation · encode_outgoing · decode_incoming/history │  │
//! │  └──────┬──────────────────────┬──────────────────────┬────────────┘  │
//! │         │                      │                      │               │
//! │  ┌──────▼──────┐        ┌──────▼──────┐        ┌──────▼───────┐       │
//! │  │  Identity   │        │  Messaging  │        │   Storage    │       │
//! │  │             │        │             │        │              │       │
//! │  │ - Escrow    │        │ - Codec     │        │ - KeyStore   │       │
//! │  │ - Onboarding│        │ - Sessions  │        │ - Memory     │       │
//! │  │             │        │             │        │ - File       │       │
//! │  └──────┬──────┘        └──────┬──────┘        └──────────────┘       │
//! │         └──────────┬───────────┘                                      │
//! │             ┌──────▼──────────────────────────────────────┐           │
//! │             │                 Crypto                      │           │
//! │             │ - P-256 keys   - ECDH     - AES-256-GCM     │           │
//! │             │ - PBKDF2       - HKDF     - CryptoProvider  │           │
//! │             └──────┬──────────────────────────────────────┘           │
//! │             ┌──────▼──────┐                                           │
//! │             │  Encoding   │  base64 in, base64 out                    │
//! │             └─────────────┘                                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire library
//! - [`encoding`] - Defensive base64 conversion
//! - [`config`] - Client configuration
//! - [`crypto`] - Keys, key agreement, AEAD, KDFs, randomness
//! - [`identity`] - Key escrow and device onboarding
//! - [`storage`] - Local key storage
//! - [`messaging`] - Session key cache and wire codec
//!
//! ## Security Model
//!
//! | Data | Where it lives | Form |
//! |------|----------------|------|
//! | Private key | this device | plain text in the local key store |
//! | Private key | server | wrapped under the recovery password |
//! | Public key | server, peers | SPKI base64 |
//! | Session keys | memory only | never stored or sent |
//! | Messages | server | `nonce:ciphertext` |
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use sdrop_core::{storage::MemoryKeyStore, messaging::ConversationId, SecureDropClient};
//!
//! let client = SecureDropClient::with_store(Arc::new(MemoryKeyStore::new()));
//! let bundle = client.register("correct-horse-42").await?;
//! // send `bundle` to the server
//!
//! let conv = ConversationId::between("alice", "bob");
//! client.open_conversation(&conv, Some(&bob_public_key)).await;
//! let wire = client.encode_outgoing(&conv, "hello")?;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod config;
pub mod crypto;
pub mod encoding;
pub mod error;
pub mod identity;
pub mod messaging;
pub mod storage;

mod client;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use client::SecureDropClient;
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use identity::{EscrowRecord, OnboardingState, RegistrationBundle};
pub use messaging::{ConversationId, ConversationStatus, DecodedMessage};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Returns the version of Secure Drop Core
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Returns build information for debugging
pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        target: std::env::consts::OS,
        profile: if cfg!(debug_assertions) {
            "debug"
        } else {
            "release"
        },
    }
}

/// Build information for debugging
#[derive(Debug, Clone)]
pub struct BuildInfo {
    /// Crate version
    pub version: &'static str,
    /// Target operating system
    pub target: &'static str,
    /// Build profile (debug/release)
    pub profile: &'static str,
}

// ============================================================================
// TESTS
// ============================================================================
