//! # Symmetric Cipher
//!
//! AES-256-GCM authenticated encryption of arbitrary payloads.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      AEAD SEAL / OPEN                                   │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  encrypt(key, plaintext)                                               │
//! │  ┌─────────────────────────────────────────────────────────────┐       │
//! │  │  nonce = 12 fresh bytes from the CryptoProvider             │       │
//! │  │  ciphertext = AES-256-GCM(key, nonce, plaintext) || tag16   │       │
//! │  └─────────────────────────────────────────────────────────────┘       │
//! │  Output: (nonce, ciphertext_with_tag)                                  │
//! │                                                                         │
//! │  decrypt(key, nonce, ciphertext_with_tag)                              │
//! │  ┌─────────────────────────────────────────────────────────────┐       │
//! │  │  verify tag, then return plaintext                          │       │
//! │  │  any mismatch => DecryptionFailed, never partial output     │       │
//! │  └─────────────────────────────────────────────────────────────┘       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Security Properties
//!
//! | Property | Guarantee |
//! |----------|-----------|
//! | Confidentiality | Only holders of the key can read the payload |
//! | Integrity | Any modification of nonce or ciphertext is detected |
//! | Nonce uniqueness | Random 96-bit nonce per call |

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce as AesNonce,
};
use zeroize::ZeroizeOnDrop;

use super::provider::{random_array, CryptoProvider};
use crate::encoding;
use crate::error::{Error, Result};

/// Size of the AES-GCM nonce in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Size of the AES-GCM authentication tag in bytes (128 bits)
pub const TAG_SIZE: usize = 16;

/// Size of the symmetric key in bytes (256 bits)
pub const KEY_SIZE: usize = 32;

/// A nonce (number used once) for AES-GCM encryption
///
/// ## Critical Security Requirement
///
/// **NEVER reuse a nonce with the same key!**
///
/// Nonce reuse under GCM leaks the XOR of plaintexts and lets an attacker
/// forge tags. Random nonces are safe for up to 2^32 messages per key
/// (birthday bound for 96-bit nonces).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Nonce([u8; NONCE_SIZE]);

impl Nonce {
    /// Generate a random nonce from the provider
    pub fn random(provider: &dyn CryptoProvider) -> Result<Self> {
        Ok(Self(random_array(provider)?))
    }

    /// Create from existing bytes
    pub fn from_bytes(bytes: [u8; NONCE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create from a slice that must be exactly [`NONCE_SIZE`] bytes long
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; NONCE_SIZE] = bytes
            .try_into()
            .map_err(|_| Error::InvalidEncoding("nonce has the wrong length".into()))?;
        Ok(Self(arr))
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.0
    }
}

/// An AES-256-GCM key
///
/// Used both for per-conversation session keys and for password-derived
/// wrapping keys. Zeroized when dropped; `Debug` never prints the bytes.
#[derive(ZeroizeOnDrop)]
pub struct SymmetricKey([u8; KEY_SIZE]);

impl SymmetricKey {
    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }
}

impl PartialEq for SymmetricKey {
    fn eq(&self, other: &Self) -> bool {
        use p256::elliptic_curve::subtle::ConstantTimeEq;
        self.0[..].ct_eq(&other.0[..]).into()
    }
}

impl Eq for SymmetricKey {}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SymmetricKey([REDACTED])")
    }
}

/// Encrypt a payload with AES-256-GCM under a fresh random nonce
///
/// ## Returns
///
/// Tuple of (nonce, ciphertext_with_tag)
pub fn encrypt(
    provider: &dyn CryptoProvider,
    key: &SymmetricKey,
    plaintext: &[u8],
) -> Result<(Nonce, Vec<u8>)> {
    let nonce = Nonce::random(provider)?;
    let cipher = Aes256Gcm::new_from_slice(&key.0)
        .map_err(|e| Error::EncryptionFailed(format!("Invalid key: {}", e)))?;

    let ciphertext = cipher
        .encrypt(AesNonce::from_slice(&nonce.0), plaintext)
        .map_err(|e| Error::EncryptionFailed(format!("Encryption failed: {}", e)))?;

    Ok((nonce, ciphertext))
}

/// Decrypt and verify a payload produced by [`encrypt`]
///
/// ## Errors
///
/// Returns `DecryptionFailed` if:
/// - The ciphertext or nonce was tampered with
/// - The key is wrong
/// - The ciphertext is shorter than the tag
pub fn decrypt(key: &SymmetricKey, nonce: &Nonce, ciphertext: &[u8]) -> Result<Vec<u8>> {
    if ciphertext.len() < TAG_SIZE {
        return Err(Error::DecryptionFailed);
    }

    let cipher = Aes256Gcm::new_from_slice(&key.0).map_err(|_| Error::DecryptionFailed)?;

    cipher
        .decrypt(AesNonce::from_slice(&nonce.0), ciphertext)
        .map_err(|_| Error::DecryptionFailed)
}

// ============================================================================
// PACKED FORM
// ============================================================================

/// Separator between the nonce and ciphertext segments
pub const SEGMENT_SEPARATOR: char = ':';

/// A nonce and its ciphertext, packed as `base64(nonce):base64(ciphertext)`
///
/// This one text shape is used both for message envelopes and for the
/// escrowed private key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SealedPayload {
    /// Nonce used for this encryption
    pub nonce: Nonce,
    /// Ciphertext with the authentication tag appended
    pub ciphertext: Vec<u8>,
}

impl SealedPayload {
    /// Encrypt `plaintext` under `key` into a new payload
    pub fn seal(provider: &dyn CryptoProvider, key: &SymmetricKey, plaintext: &[u8]) -> Result<Self> {
        let (nonce, ciphertext) = encrypt(provider, key, plaintext)?;
        Ok(Self { nonce, ciphertext })
    }

    /// Decrypt and verify this payload
    pub fn open(&self, key: &SymmetricKey) -> Result<Vec<u8>> {
        decrypt(key, &self.nonce, &self.ciphertext)
    }

    /// Pack into `nonce:ciphertext` text
    pub fn pack(&self) -> String {
        format!(
            "{}{}{}",
            encoding::to_text(&self.nonce.0),
            SEGMENT_SEPARATOR,
            encoding::to_text(&self.ciphertext)
        )
    }

    /// Parse `nonce:ciphertext` text, splitting on the first separator
    ///
    /// Fails with `InvalidEncoding` when the separator is missing, either
    /// segment is not base64, or the nonce is not [`NONCE_SIZE`] bytes.
    pub fn unpack(text: &str) -> Result<Self> {
        let (nonce_text, ciphertext_text) = text
            .split_once(SEGMENT_SEPARATOR)
            .ok_or_else(|| Error::InvalidEncoding("packed payload has no separator".into()))?;

        let nonce = Nonce::from_slice(&encoding::to_bytes(nonce_text)?)?;
        let ciphertext = encoding::to_bytes(ciphertext_text)?;

        Ok(Self { nonce, ciphertext })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{OsCryptoProvider, SeededCryptoProvider};
    use std::collections::HashSet;

    fn key() -> SymmetricKey {
        SymmetricKey::from_bytes([42u8; 32])
    }

    #[test]
    fn test_encrypt_decrypt_basic() {
        let (nonce, ciphertext) = encrypt(&OsCryptoProvider, &key(), b"Hello, World!").unwrap();
        assert_eq!(ciphertext.len(), 13 + TAG_SIZE);

        let decrypted = decrypt(&key(), &nonce, &ciphertext).unwrap();
        assert_eq!(decrypted, b"Hello, World!");
    }

    #[test]
    fn test_encrypt_decrypt_empty() {
        let (nonce, ciphertext) = encrypt(&OsCryptoProvider, &key(), b"").unwrap();
        let decrypted = decrypt(&key(), &nonce, &ciphertext).unwrap();
        assert!(decrypted.is_empty());
    }

    #[test]
    fn test_wrong_key_fails() {
        let (nonce, ciphertext) = encrypt(&OsCryptoProvider, &key(), b"secret").unwrap();
        let other = SymmetricKey::from_bytes([99u8; 32]);

        assert!(matches!(
            decrypt(&other, &nonce, &ciphertext),
            Err(Error::DecryptionFailed)
        ));
    }

    #[test]
    fn test_every_single_bit_flip_detected() {
        let (nonce, ciphertext) = encrypt(&OsCryptoProvider, &key(), b"tamper me").unwrap();

        for byte in 0..ciphertext.len() {
            for bit in 0..8 {
                let mut tampered = ciphertext.clone();
                tampered[byte] ^= 1 << bit;
                assert!(matches!(
                    decrypt(&key(), &nonce, &tampered),
                    Err(Error::DecryptionFailed)
                ));
            }
        }

        for byte in 0..NONCE_SIZE {
            for bit in 0..8 {
                let mut bytes = *nonce.as_bytes();
                bytes[byte] ^= 1 << bit;
                assert!(matches!(
                    decrypt(&key(), &Nonce::from_bytes(bytes), &ciphertext),
                    Err(Error::DecryptionFailed)
                ));
            }
        }
    }

    #[test]
    fn test_truncated_ciphertext_fails() {
        assert!(matches!(
            decrypt(&key(), &Nonce::from_bytes([0u8; NONCE_SIZE]), &[1, 2, 3]),
            Err(Error::DecryptionFailed)
        ));
    }

    #[test]
    fn test_nonces_unique_over_many_calls() {
        let provider = SeededCryptoProvider::new(1);
        let mut seen = HashSet::new();
        for _ in 0..1000 {
            let (nonce, _) = encrypt(&provider, &key(), b"x").unwrap();
            assert!(seen.insert(nonce), "nonce repeated");
        }
    }

    #[test]
    fn test_different_nonces_produce_different_ciphertext() {
        let (_, ct1) = encrypt(&OsCryptoProvider, &key(), b"Hello, World!").unwrap();
        let (_, ct2) = encrypt(&OsCryptoProvider, &key(), b"Hello, World!").unwrap();
        assert_ne!(ct1, ct2);
    }

    #[test]
    fn test_nonce_from_slice_length() {
        assert!(Nonce::from_slice(&[0u8; 12]).is_ok());
        assert!(Nonce::from_slice(&[0u8; 16]).is_err());
    }

    #[test]
    fn test_sealed_payload_pack_unpack() {
        let sealed = SealedPayload::seal(&OsCryptoProvider, &key(), b"packed").unwrap();
        let text = sealed.pack();
        assert_eq!(text.matches(SEGMENT_SEPARATOR).count(), 1);

        let parsed = SealedPayload::unpack(&text).unwrap();
        assert_eq!(parsed, sealed);
        assert_eq!(parsed.open(&key()).unwrap(), b"packed");
    }

    #[test]
    fn test_sealed_payload_rejects_malformed() {
        let ct = encoding::to_text(&[0u8; 20]);
        let short_nonce = format!("{}:{}", encoding::to_text(&[0u8; 8]), ct);

        for text in ["no separator", ":", "AAAA:", short_nonce.as_str()] {
            assert!(matches!(
                SealedPayload::unpack(text),
                Err(Error::InvalidEncoding(_))
            ));
        }
    }

    #[test]
    fn test_key_debug_redacted() {
        assert_eq!(format!("{:?}", key()), "SymmetricKey([REDACTED])");
    }
}
