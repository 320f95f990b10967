//! # Crypto Provider
//!
//! The one capability the protocol needs from its environment: secure
//! randomness. It is passed in explicitly instead of being read from ambient
//! global state, so tests can substitute a deterministic source.
//!
//! Everything random in this crate (identity keys, salts, nonces) is drawn
//! through a [`CryptoProvider`].

use parking_lot::Mutex;
use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};

use crate::error::{Error, Result};

/// Source of cryptographically secure random bytes.
pub trait CryptoProvider: Send + Sync {
    /// Fill `dest` entirely with random bytes.
    fn fill_random(&self, dest: &mut [u8]) -> Result<()>;
}

/// Draw a fixed-size random array from a provider.
pub(crate) fn random_array<const N: usize>(provider: &dyn CryptoProvider) -> Result<[u8; N]> {
    let mut bytes = [0u8; N];
    provider.fill_random(&mut bytes)?;
    Ok(bytes)
}

/// Provider backed by the operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsCryptoProvider;

impl CryptoProvider for OsCryptoProvider {
    fn fill_random(&self, dest: &mut [u8]) -> Result<()> {
        OsRng.try_fill_bytes(dest).map_err(|e| {
            tracing::error!("OS random source failed: {}", e);
            Error::RngFailed
        })
    }
}

/// Deterministic provider for tests and reproducible demos.
///
/// ## Security Warning
///
/// The output is fully determined by the seed. Never use this outside tests.
pub struct SeededCryptoProvider {
    rng: Mutex<StdRng>,
}

impl SeededCryptoProvider {
    /// Create a provider whose stream is fixed by `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl CryptoProvider for SeededCryptoProvider {
    fn fill_random(&self, dest: &mut [u8]) -> Result<()> {
        self.rng
            .lock()
            .try_fill_bytes(dest)
            .map_err(|_| Error::RngFailed)
    }
}

impl std::fmt::Debug for SeededCryptoProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SeededCryptoProvider")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_provider_fills() {
        let a: [u8; 32] = random_array(&OsCryptoProvider).unwrap();
        let b: [u8; 32] = random_array(&OsCryptoProvider).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_seeded_provider_is_deterministic() {
        let p1 = SeededCryptoProvider::new(7);
        let p2 = SeededCryptoProvider::new(7);
        let a: [u8; 16] = random_array(&p1).unwrap();
        let b: [u8; 16] = random_array(&p2).unwrap();
        assert_eq!(a, b);

        let c: [u8; 16] = random_array(&p1).unwrap();
        assert_ne!(a, c);
    }
}
