//! # Device Onboarding
//!
//! Where a device stands with respect to the user's private key.
//!
//! ```text
//!                     ┌──────────────┐
//!                     │ NoLocalKey   │
//!                     └──────┬───────┘
//!        escrow found        │        nothing found
//!          ┌─────────────────┼───────────────────┐
//!          ▼                 │ local key found   ▼
//!  ┌──────────────────┐      │          ┌─────────────────┐
//!  │ AwaitingPassword │◄─┐   │          │ KeyUnavailable  │
//!  └────────┬─────────┘  │   │          └─────────────────┘
//!           │   unwrap   │   │
//!           │   failed ──┘   │
//!           │ unwrap ok      │
//!           ▼                ▼
//!       ┌────────────────────────┐
//!       │      KeyRestored       │
//!       └────────────────────────┘
//! ```
//!
//! `SignedOut` returns any state to `NoLocalKey`. Wrong passwords never lock
//! the user out at this layer.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Onboarding state of this device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OnboardingState {
    /// Nothing has been checked yet, or the device holds no private key
    #[default]
    NoLocalKey,
    /// An escrow record exists and the recovery password is needed
    AwaitingPassword,
    /// The private key is in local storage and usable
    KeyRestored,
    /// No local key and no escrow record; only re-registration helps
    KeyUnavailable,
}

/// Something that happened during onboarding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnboardingEvent {
    /// Local storage already holds a private key
    LocalKeyFound,
    /// No local key, but the account has an escrow record
    EscrowFound,
    /// No local key and no usable escrow record
    NothingFound,
    /// A fresh keypair was generated and stored
    Registered,
    /// The escrow record was unwrapped and stored locally
    UnwrapSucceeded,
    /// The password was wrong or the record was unusable
    UnwrapFailed,
    /// Local key slots were wiped
    SignedOut,
}

impl OnboardingState {
    /// Apply an event, rejecting transitions the state machine does not have
    pub fn next(self, event: OnboardingEvent) -> Result<Self> {
        use OnboardingEvent as E;
        use OnboardingState as S;

        let next = match (self, event) {
            (_, E::SignedOut) => S::NoLocalKey,
            (_, E::Registered) => S::KeyRestored,

            (S::NoLocalKey, E::LocalKeyFound) => S::KeyRestored,
            (S::NoLocalKey, E::EscrowFound) => S::AwaitingPassword,
            (S::NoLocalKey, E::NothingFound) => S::KeyUnavailable,

            (S::AwaitingPassword, E::UnwrapSucceeded) => S::KeyRestored,
            (S::AwaitingPassword, E::UnwrapFailed) => S::AwaitingPassword,

            (state, event) => {
                return Err(Error::InvalidState(format!(
                    "{:?} cannot follow {:?}",
                    event, state
                )))
            }
        };

        tracing::debug!(from = ?self, to = ?next, ?event, "onboarding transition");
        Ok(next)
    }

    /// Whether the private key is loaded and conversations can be encrypted
    pub fn is_ready(&self) -> bool {
        matches!(self, OnboardingState::KeyRestored)
    }
}

#[cfg(test)]
mod tests {
    use super::{OnboardingEvent as E, OnboardingState as S};
    use crate::error::Error;

    #[test]
    fn test_recovery_path() {
        let state = S::NoLocalKey.next(E::EscrowFound).unwrap();
        assert_eq!(state, S::AwaitingPassword);

        let state = state.next(E::UnwrapFailed).unwrap();
        assert_eq!(state, S::AwaitingPassword);
        let state = state.next(E::UnwrapFailed).unwrap();
        assert_eq!(state, S::AwaitingPassword);

        let state = state.next(E::UnwrapSucceeded).unwrap();
        assert_eq!(state, S::KeyRestored);
        assert!(state.is_ready());
    }

    #[test]
    fn test_start_outcomes() {
        assert_eq!(S::NoLocalKey.next(E::LocalKeyFound).unwrap(), S::KeyRestored);
        assert_eq!(S::NoLocalKey.next(E::NothingFound).unwrap(), S::KeyUnavailable);
        assert!(!S::KeyUnavailable.is_ready());
    }

    #[test]
    fn test_registration_and_sign_out_from_anywhere() {
        for state in [S::NoLocalKey, S::AwaitingPassword, S::KeyRestored, S::KeyUnavailable] {
            assert_eq!(state.next(E::Registered).unwrap(), S::KeyRestored);
            assert_eq!(state.next(E::SignedOut).unwrap(), S::NoLocalKey);
        }
    }

    #[test]
    fn test_invalid_transitions_rejected() {
        assert!(matches!(
            S::NoLocalKey.next(E::UnwrapSucceeded),
            Err(Error::InvalidState(_))
        ));
        assert!(S::KeyRestored.next(E::UnwrapFailed).is_err());
        assert!(S::KeyUnavailable.next(E::EscrowFound).is_err());
    }

    #[test]
    fn test_serialized_names() {
        assert_eq!(
            serde_json::to_string(&S::AwaitingPassword).unwrap(),
            "\"AWAITING_PASSWORD\""
        );
        assert_eq!(
            serde_json::to_string(&S::KeyUnavailable).unwrap(),
            "\"KEY_UNAVAILABLE\""
        );
    }
}
