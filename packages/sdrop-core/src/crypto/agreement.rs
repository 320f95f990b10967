//! # Session Key Agreement
//!
//! Combines my private key with a peer's public key into the symmetric key
//! for our conversation.
//!
//! ```text
//!   Alice                                   Bob
//!     │── Alice's public key (server) ──────►│
//!     │◄────── Bob's public key (server) ────│
//!     ▼                                      ▼
//!  ECDH(alice_priv, bob_pub)   ==   ECDH(bob_priv, alice_pub)
//!     │                                      │
//!     └──────────► same session key ◄────────┘
//! ```
//!
//! Two constructions turn the ECDH x-coordinate into an AES-256 key:
//!
//! | Mode | Key | Interop |
//! |------|-----|---------|
//! | `Raw` | the 32-byte x-coordinate itself | WebCrypto `deriveKey(ECDH → AES-GCM-256)` |
//! | `HkdfSha256` | HKDF-SHA256(x, info = `sdrop-session-key-v1`) | this crate only |
//!
//! Both peers must use the same mode. The result is never persisted or
//! transmitted.

use p256::ecdh::diffie_hellman;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::encryption::{SymmetricKey, KEY_SIZE};
use super::kdf::derive_session_key_material;
use super::keys::{IdentityPrivateKey, IdentityPublicKey};
use crate::error::{Error, Result};

/// How the ECDH output becomes a cipher key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKeyMode {
    /// Use the shared x-coordinate directly
    #[default]
    Raw,
    /// Expand the shared x-coordinate with HKDF-SHA256
    HkdfSha256,
}

/// Derive the session key for (my private key, peer public key)
///
/// Pure and deterministic; swapping roles yields the same key.
pub fn derive_session_key(
    my_private: &IdentityPrivateKey,
    peer_public: &IdentityPublicKey,
    mode: SessionKeyMode,
) -> Result<SymmetricKey> {
    let shared = diffie_hellman(
        my_private.inner().to_nonzero_scalar(),
        peer_public.inner().as_affine(),
    );

    let mut x = Zeroizing::new([0u8; KEY_SIZE]);
    x.copy_from_slice(shared.raw_secret_bytes());

    let key = match mode {
        SessionKeyMode::Raw => *x,
        SessionKeyMode::HkdfSha256 => derive_session_key_material(&x[..])?,
    };

    Ok(SymmetricKey::from_bytes(key))
}

/// Derive a session key from the text forms of both keys
///
/// Any import failure here means the two keys cannot be combined and is
/// reported as `KeyAgreement`.
pub fn derive_session_key_from_text(
    my_private_text: &str,
    peer_public_text: &str,
    mode: SessionKeyMode,
) -> Result<SymmetricKey> {
    let my_private = IdentityPrivateKey::from_text(my_private_text).map_err(|e| {
        tracing::debug!("own private key unusable for agreement: {}", e);
        Error::KeyAgreement("own private key is not a P-256 key".into())
    })?;
    let peer_public = IdentityPublicKey::from_text(peer_public_text).map_err(|e| {
        tracing::debug!("peer public key unusable for agreement: {}", e);
        Error::KeyAgreement("peer public key is not a P-256 key".into())
    })?;

    derive_session_key(&my_private, &peer_public, mode)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{decrypt, encrypt, IdentityKeyPair, OsCryptoProvider, SeededCryptoProvider};
    use crate::encoding;

    #[test]
    fn test_agreement_is_symmetric() {
        let provider = SeededCryptoProvider::new(21);
        for _ in 0..16 {
            let alice = IdentityKeyPair::generate(&provider).unwrap();
            let bob = IdentityKeyPair::generate(&provider).unwrap();

            for mode in [SessionKeyMode::Raw, SessionKeyMode::HkdfSha256] {
                let ab = derive_session_key(alice.private(), bob.public(), mode).unwrap();
                let ba = derive_session_key(bob.private(), alice.public(), mode).unwrap();
                assert_eq!(ab, ba);
            }
        }
    }

    #[test]
    fn test_modes_differ() {
        let alice = IdentityKeyPair::generate(&OsCryptoProvider).unwrap();
        let bob = IdentityKeyPair::generate(&OsCryptoProvider).unwrap();

        let raw = derive_session_key(alice.private(), bob.public(), SessionKeyMode::Raw).unwrap();
        let hkdf =
            derive_session_key(alice.private(), bob.public(), SessionKeyMode::HkdfSha256).unwrap();
        assert_ne!(raw, hkdf);
    }

    #[test]
    fn test_third_party_gets_different_key() {
        let alice = IdentityKeyPair::generate(&OsCryptoProvider).unwrap();
        let bob = IdentityKeyPair::generate(&OsCryptoProvider).unwrap();
        let eve = IdentityKeyPair::generate(&OsCryptoProvider).unwrap();

        let ab = derive_session_key(alice.private(), bob.public(), SessionKeyMode::Raw).unwrap();
        let eb = derive_session_key(eve.private(), bob.public(), SessionKeyMode::Raw).unwrap();
        assert_ne!(ab, eb);
    }

    #[test]
    fn test_session_key_encrypts_across_parties() {
        let alice = IdentityKeyPair::generate(&OsCryptoProvider).unwrap();
        let bob = IdentityKeyPair::generate(&OsCryptoProvider).unwrap();

        let alice_key =
            derive_session_key(alice.private(), bob.public(), SessionKeyMode::Raw).unwrap();
        let bob_key =
            derive_session_key(bob.private(), alice.public(), SessionKeyMode::Raw).unwrap();

        let (nonce, ct) = encrypt(&OsCryptoProvider, &alice_key, b"Secret message for Bob").unwrap();
        assert_eq!(decrypt(&bob_key, &nonce, &ct).unwrap(), b"Secret message for Bob");
    }

    #[test]
    fn test_from_text_matches_typed() {
        let alice = IdentityKeyPair::generate(&OsCryptoProvider).unwrap();
        let bob = IdentityKeyPair::generate(&OsCryptoProvider).unwrap();

        let typed = derive_session_key(alice.private(), bob.public(), SessionKeyMode::Raw).unwrap();
        let texted = derive_session_key_from_text(
            &alice.private().to_text().unwrap(),
            &bob.public().to_text().unwrap(),
            SessionKeyMode::Raw,
        )
        .unwrap();
        assert_eq!(typed, texted);
    }

    #[test]
    fn test_malformed_peer_key_is_agreement_error() {
        let alice = IdentityKeyPair::generate(&OsCryptoProvider).unwrap();
        let private_text = alice.private().to_text().unwrap();

        let fallback = encoding::to_text(&[1u8; 32]);
        for peer in ["", "null", fallback.as_str()] {
            assert!(matches!(
                derive_session_key_from_text(&private_text, peer, SessionKeyMode::Raw),
                Err(Error::KeyAgreement(_))
            ));
        }
    }
}
