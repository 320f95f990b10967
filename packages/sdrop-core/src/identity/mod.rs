//! # Identity Module
//!
//! Custody of the user's private key across devices.
//!
//! ## Identity Lifecycle
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         IDENTITY LIFECYCLE                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Registration                                                          │
//! │  ────────────                                                           │
//! │  1. Generate P-256 keypair                                             │
//! │  2. Store both halves in local device storage                          │
//! │  3. Wrap the private half under the recovery password                  │
//! │  4. Hand { public_key, escrow record } to the server                  │
//! │                                                                         │
//! │  Login on a new device                                                 │
//! │  ─────────────────────                                                  │
//! │  1. Local storage is empty, server profile has an escrow record       │
//! │  2. Ask for the recovery password                                      │
//! │  3. Unwrap; on success store the private key locally                   │
//! │  4. On failure ask again (no lockout here)                             │
//! │                                                                         │
//! │  The unwrapped private key never leaves the device.                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod onboarding;
mod recovery;

pub use onboarding::{OnboardingEvent, OnboardingState};
pub use recovery::{unwrap_private_key, wrap_private_key, wrap_with_password, EscrowRecord};

use serde::{Deserialize, Serialize};

/// What registration hands to the transport layer
///
/// Contains nothing secret: the public key and the wrapped private key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationBundle {
    /// base64 SPKI public key
    pub public_key: String,
    /// Wrapped private key and salt
    #[serde(flatten)]
    pub escrow: EscrowRecord,
}
