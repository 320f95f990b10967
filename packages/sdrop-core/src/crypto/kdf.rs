//! # Key Derivation
//!
//! Two derivations live here:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 RECOVERY PASSWORD → WRAPPING KEY                        │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  PBKDF2-HMAC-SHA256(                                                   │
//! │    password   = recovery password (UTF-8),                             │
//! │    salt       = 16 random bytes, stored next to the wrapped key,       │
//! │    iterations = 100 000 (minimum),                                     │
//! │  )                                                                     │
//! │           ↓                                                             │
//! │  32-byte AES-256-GCM wrapping key                                      │
//! │                                                                         │
//! │  Deterministic: the same password and salt on another device yield     │
//! │  the same key, which is what makes recovery possible at all.           │
//! │                                                                         │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                 ECDH OUTPUT → SESSION KEY (hkdf mode)                   │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  HKDF-SHA256(                                                          │
//! │    ikm  = P-256 shared x-coordinate,                                   │
//! │    salt = none,                                                        │
//! │    info = "sdrop-session-key-v1"                                       │
//! │  )                                                                     │
//! │           ↓                                                             │
//! │  32-byte AES-256-GCM session key                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Security Considerations
//!
//! | Aspect | Design Choice |
//! |--------|---------------|
//! | Password KDF | PBKDF2-HMAC-SHA256, available in every WebCrypto client |
//! | Iterations | 100 000 floor; tunable upward, identical on every device |
//! | Salt | 128 bits from the CryptoProvider, unique per registration |
//! | Version String | "-v1" suffix on the HKDF domain |

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;

use super::encryption::{SymmetricKey, KEY_SIZE};
use super::provider::{random_array, CryptoProvider};
use crate::error::{Error, Result};

/// Size of the password salt in bytes (128 bits)
pub const SALT_SIZE: usize = 16;

/// Lowest PBKDF2 iteration count this crate accepts
pub const MIN_PBKDF2_ITERATIONS: u32 = 100_000;

/// Default PBKDF2 iteration count
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 100_000;

/// Domain separation strings for HKDF
pub mod domain {
    /// Domain for session key derivation from the ECDH output
    pub const SESSION_KEY: &[u8] = b"sdrop-session-key-v1";
}

/// A random salt for password-based key derivation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Salt([u8; SALT_SIZE]);

impl Salt {
    /// Create from existing bytes
    pub fn from_bytes(bytes: [u8; SALT_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create from a slice that must be exactly [`SALT_SIZE`] bytes long
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; SALT_SIZE] = bytes
            .try_into()
            .map_err(|_| Error::InvalidEncoding("salt has the wrong length".into()))?;
        Ok(Self(arr))
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; SALT_SIZE] {
        &self.0
    }
}

/// Generate a fresh 128-bit salt
pub fn generate_salt(provider: &dyn CryptoProvider) -> Result<Salt> {
    Ok(Salt(random_array(provider)?))
}

/// Tunable cost of the password KDF
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KdfParams {
    iterations: u32,
}

impl KdfParams {
    /// Create parameters, rejecting iteration counts below the floor
    pub fn new(iterations: u32) -> Result<Self> {
        if iterations < MIN_PBKDF2_ITERATIONS {
            return Err(Error::InvalidConfig(format!(
                "kdf_iterations must be at least {}, got {}",
                MIN_PBKDF2_ITERATIONS, iterations
            )));
        }
        Ok(Self { iterations })
    }

    /// PBKDF2 iteration count
    pub fn iterations(&self) -> u32 {
        self.iterations
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_PBKDF2_ITERATIONS,
        }
    }
}

/// Derive an AES-256-GCM wrapping key from a recovery password
///
/// This is deliberately slow. Async callers should run it on a blocking
/// thread (the client does).
pub fn derive_key_from_password(
    password: &str,
    salt: &Salt,
    params: &KdfParams,
) -> Result<SymmetricKey> {
    if password.is_empty() {
        return Err(Error::KeyDerivationFailed("password cannot be empty".into()));
    }

    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt.0, params.iterations, &mut *key);

    Ok(SymmetricKey::from_bytes(*key))
}

/// Derive a session key from raw ECDH output with HKDF-SHA256
pub fn derive_session_key_material(dh_output: &[u8]) -> Result<[u8; KEY_SIZE]> {
    let hkdf = Hkdf::<Sha256>::new(None, dh_output);

    let mut key = [0u8; KEY_SIZE];
    hkdf.expand(domain::SESSION_KEY, &mut key)
        .map_err(|_| Error::KeyDerivationFailed("Failed to derive session key".into()))?;

    Ok(key)
}

// ============================================================================
// TESTS
// ============================================================================
