//! # Identity Keys
//!
//! Each user owns one long-lived NIST P-256 key-agreement keypair. The curve
//! is fixed system-wide: every peer must use P-256 or no session key can be
//! agreed.
//!
//! ## Interchange Formats
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        KEY INTERCHANGE                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Public key                                                            │
//! │  ──────────                                                             │
//! │  DER SubjectPublicKeyInfo ("spki") → base64                            │
//! │  Sent to the server, shared freely.                                    │
//! │                                                                         │
//! │  Private key                                                           │
//! │  ───────────                                                            │
//! │  DER PKCS#8 PrivateKeyInfo ("pkcs8") → base64                          │
//! │  Stays on the device. Leaves it only wrapped (see identity::recovery). │
//! │                                                                         │
//! │  Both formats are the ones a WebCrypto client exports for             │
//! │  { name: "ECDH", namedCurve: "P-256" }, so keys move freely between   │
//! │  this crate and browser clients.                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Imported keys are only ever usable for key agreement. There is no signing
//! API on these types.

use p256::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use p256::{FieldBytes, PublicKey, SecretKey};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::provider::CryptoProvider;
use crate::encoding;
use crate::error::{Error, Result};

/// Scalar candidates outside [1, n) are redrawn; the chance of needing even
/// one redraw is about 2^-32.
const MAX_GENERATION_ATTEMPTS: usize = 8;

/// Which half of a keypair a value is, and therefore its interchange format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRole {
    /// SubjectPublicKeyInfo
    Public,
    /// PKCS#8 PrivateKeyInfo
    Private,
}

/// A borrowed key of either role, for [`export_key`]
#[derive(Debug, Clone, Copy)]
pub enum KeyRef<'a> {
    /// A public key
    Public(&'a IdentityPublicKey),
    /// A private key
    Private(&'a IdentityPrivateKey),
}

impl KeyRef<'_> {
    /// The role of the referenced key
    pub fn role(&self) -> KeyRole {
        match self {
            KeyRef::Public(_) => KeyRole::Public,
            KeyRef::Private(_) => KeyRole::Private,
        }
    }
}

/// The public half of an identity keypair
#[derive(Clone, PartialEq, Eq)]
pub struct IdentityPublicKey(PublicKey);

impl IdentityPublicKey {
    /// Import from base64 SPKI text
    ///
    /// Fails with `KeyImport` for malformed input, for keys on any other
    /// curve, and for keys of any other algorithm.
    pub fn from_text(text: &str) -> Result<Self> {
        let der = encoding::to_bytes(text)
            .map_err(|_| Error::KeyImport("public key text is not valid base64".into()))?;

        PublicKey::from_public_key_der(&der)
            .map(Self)
            .map_err(|_| Error::KeyImport("public key is not a P-256 SPKI document".into()))
    }

    /// Export as base64 SPKI text
    pub fn to_text(&self) -> Result<String> {
        let der = self
            .0
            .to_public_key_der()
            .map_err(|e| Error::Internal(format!("SPKI encoding failed: {}", e)))?;
        Ok(encoding::to_text(der.as_bytes()))
    }

    /// Short hex fingerprint of the SPKI encoding, safe for logs
    pub fn fingerprint(&self) -> String {
        match self.0.to_public_key_der() {
            Ok(der) => hex::encode(&Sha256::digest(der.as_bytes())[..8]),
            Err(_) => "unencodable".to_string(),
        }
    }

    pub(crate) fn inner(&self) -> &PublicKey {
        &self.0
    }
}

impl std::fmt::Debug for IdentityPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IdentityPublicKey({})", self.fingerprint())
    }
}

/// The private half of an identity keypair
///
/// ## Security
///
/// - Not `Serialize`, not `Clone`; `Debug` is redacted
/// - The underlying scalar is zeroized on drop
/// - The only byte-level export is [`to_text`](Self::to_text), which the
///   client writes to local device storage or wraps for escrow
pub struct IdentityPrivateKey(SecretKey);

impl IdentityPrivateKey {
    /// Import from base64 PKCS#8 text
    pub fn from_text(text: &str) -> Result<Self> {
        let der = Zeroizing::new(
            encoding::to_bytes(text)
                .map_err(|_| Error::KeyImport("private key text is not valid base64".into()))?,
        );

        SecretKey::from_pkcs8_der(&der)
            .map(Self)
            .map_err(|_| Error::KeyImport("private key is not a P-256 PKCS#8 document".into()))
    }

    /// Export as base64 PKCS#8 text
    pub fn to_text(&self) -> Result<Zeroizing<String>> {
        let der = self
            .0
            .to_pkcs8_der()
            .map_err(|e| Error::Internal(format!("PKCS#8 encoding failed: {}", e)))?;
        Ok(Zeroizing::new(encoding::to_text(der.as_bytes())))
    }

    /// The matching public key
    pub fn public_key(&self) -> IdentityPublicKey {
        IdentityPublicKey(self.0.public_key())
    }

    pub(crate) fn inner(&self) -> &SecretKey {
        &self.0
    }
}

impl std::fmt::Debug for IdentityPrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IdentityPrivateKey([REDACTED])")
    }
}

/// A user's identity keypair
#[derive(Debug)]
pub struct IdentityKeyPair {
    private: IdentityPrivateKey,
    public: IdentityPublicKey,
}

impl IdentityKeyPair {
    /// Generate a fresh keypair from the provider's randomness
    ///
    /// Pure generation: persisting either half is the caller's job.
    pub fn generate(provider: &dyn CryptoProvider) -> Result<Self> {
        for _ in 0..MAX_GENERATION_ATTEMPTS {
            let mut candidate = Zeroizing::new([0u8; 32]);
            provider.fill_random(&mut candidate[..])?;

            if let Ok(secret) = SecretKey::from_bytes(FieldBytes::from_slice(&candidate[..])) {
                return Ok(Self::from_private(IdentityPrivateKey(secret)));
            }
        }

        Err(Error::KeyGeneration(
            "random source kept producing out-of-range scalars".into(),
        ))
    }

    /// Rebuild the keypair around an imported private key
    pub fn from_private(private: IdentityPrivateKey) -> Self {
        let public = private.public_key();
        Self { private, public }
    }

    /// The private half
    pub fn private(&self) -> &IdentityPrivateKey {
        &self.private
    }

    /// The public half
    pub fn public(&self) -> &IdentityPublicKey {
        &self.public
    }
}

/// Export either half of a keypair in its role's interchange format
pub fn export_key(key: KeyRef<'_>) -> Result<Zeroizing<String>> {
    match key {
        KeyRef::Public(public) => public.to_text().map(Zeroizing::new),
        KeyRef::Private(private) => private.to_text(),
    }
}

/// Import a peer's or our own public key from SPKI text
pub fn import_public_key(text: &str) -> Result<IdentityPublicKey> {
    IdentityPublicKey::from_text(text)
}

/// Import our private key from PKCS#8 text
pub fn import_private_key(text: &str) -> Result<IdentityPrivateKey> {
    IdentityPrivateKey::from_text(text)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{OsCryptoProvider, SeededCryptoProvider};

    /// SPKI prefix for an X25519 key (RFC 8410), followed by 32 key bytes.
    fn x25519_spki_text() -> String {
        let mut der = vec![
            0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x6e, 0x03, 0x21, 0x00,
        ];
        der.extend_from_slice(&[9u8; 32]);
        encoding::to_text(&der)
    }

    #[test]
    fn test_keypair_generation() {
        let kp1 = IdentityKeyPair::generate(&OsCryptoProvider).unwrap();
        let kp2 = IdentityKeyPair::generate(&OsCryptoProvider).unwrap();
        assert_ne!(kp1.public(), kp2.public());
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let kp1 = IdentityKeyPair::generate(&SeededCryptoProvider::new(11)).unwrap();
        let kp2 = IdentityKeyPair::generate(&SeededCryptoProvider::new(11)).unwrap();
        assert_eq!(kp1.public(), kp2.public());
    }

    #[test]
    fn test_public_key_round_trip() {
        let kp = IdentityKeyPair::generate(&OsCryptoProvider).unwrap();
        let text = kp.public().to_text().unwrap();

        // DER SPKI for P-256 always starts with this prefix
        assert!(text.starts_with("MFkwEwYHKoZIzj0CAQYIKoZIzj0DAQcDQgAE"));
        assert_eq!(import_public_key(&text).unwrap(), *kp.public());
    }

    #[test]
    fn test_private_key_round_trip() {
        let kp = IdentityKeyPair::generate(&OsCryptoProvider).unwrap();
        let text = export_key(KeyRef::Private(kp.private())).unwrap();

        let restored = import_private_key(&text).unwrap();
        assert_eq!(restored.public_key(), *kp.public());
    }

    #[test]
    fn test_export_dispatches_on_role() {
        let kp = IdentityKeyPair::generate(&OsCryptoProvider).unwrap();
        let public_text = export_key(KeyRef::Public(kp.public())).unwrap();
        let private_text = export_key(KeyRef::Private(kp.private())).unwrap();

        assert_eq!(KeyRef::Public(kp.public()).role(), KeyRole::Public);
        assert_ne!(*public_text, *private_text);
        assert!(import_public_key(&public_text).is_ok());
        assert!(import_private_key(&private_text).is_ok());
    }

    #[test]
    fn test_roles_not_interchangeable() {
        let kp = IdentityKeyPair::generate(&OsCryptoProvider).unwrap();
        let public_text = kp.public().to_text().unwrap();
        let private_text = kp.private().to_text().unwrap();

        assert!(matches!(import_private_key(&public_text), Err(Error::KeyImport(_))));
        assert!(matches!(import_public_key(&private_text), Err(Error::KeyImport(_))));
    }

    #[test]
    fn test_wrong_curve_rejected() {
        assert!(matches!(
            import_public_key(&x25519_spki_text()),
            Err(Error::KeyImport(_))
        ));
    }

    #[test]
    fn test_malformed_input_rejected() {
        // 32 random bytes: what a client without ECDH support publishes
        let fallback = encoding::to_text(&[5u8; 32]);
        for text in [fallback.as_str(), "undefined", "", "not base64 at all!"] {
            assert!(matches!(import_public_key(text), Err(Error::KeyImport(_))));
            assert!(matches!(import_private_key(text), Err(Error::KeyImport(_))));
        }
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let kp = IdentityKeyPair::generate(&OsCryptoProvider).unwrap();
        let debug = format!("{:?}", kp.private());
        assert!(debug.contains("REDACTED"));

        let fp = kp.public().fingerprint();
        assert_eq!(fp.len(), 16);
        assert!(format!("{:?}", kp.public()).contains(&fp));
    }
}
