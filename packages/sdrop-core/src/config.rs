//! # Client Configuration
//!
//! Tunables for [`SecureDropClient`](crate::SecureDropClient). Every field has
//! a default, so an empty JSON object is a valid configuration.
//!
//! ```json
//! {
//!   "kdf_iterations": 100000,
//!   "session_key_mode": "raw",
//!   "undecryptable_marker": "[Decryption Error]",
//!   "decrypt_concurrency": 8
//! }
//! ```
//!
//! `kdf_iterations` and `session_key_mode` must match on every device and
//! every peer: the escrow record does not carry the iteration count, and
//! peers in different modes derive different session keys.

use serde::{Deserialize, Serialize};

use crate::crypto::{KdfParams, SessionKeyMode, DEFAULT_PBKDF2_ITERATIONS, MIN_PBKDF2_ITERATIONS};
use crate::error::{Error, Result};
use crate::messaging::DEFAULT_UNDECRYPTABLE_MARKER;

/// Default number of messages decrypted at once by `decode_history`
pub const DEFAULT_DECRYPT_CONCURRENCY: usize = 8;

/// Configuration for the Secure Drop client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// PBKDF2 iteration count for the recovery password
    pub kdf_iterations: u32,
    /// How the ECDH output becomes a session key
    pub session_key_mode: SessionKeyMode,
    /// Text shown in place of a message that cannot be decrypted
    pub undecryptable_marker: String,
    /// Upper bound on concurrent decryptions per history batch
    pub decrypt_concurrency: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            kdf_iterations: DEFAULT_PBKDF2_ITERATIONS,
            session_key_mode: SessionKeyMode::default(),
            undecryptable_marker: DEFAULT_UNDECRYPTABLE_MARKER.to_string(),
            decrypt_concurrency: DEFAULT_DECRYPT_CONCURRENCY,
        }
    }
}

impl ClientConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the client cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.kdf_iterations < MIN_PBKDF2_ITERATIONS {
            return Err(Error::InvalidConfig(format!(
                "kdf_iterations must be at least {}, got {}",
                MIN_PBKDF2_ITERATIONS, self.kdf_iterations
            )));
        }
        if self.decrypt_concurrency == 0 {
            return Err(Error::InvalidConfig(
                "decrypt_concurrency must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// KDF parameters for this configuration
    pub fn kdf_params(&self) -> Result<KdfParams> {
        KdfParams::new(self.kdf_iterations)
    }
}
