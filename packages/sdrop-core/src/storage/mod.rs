//! # Storage Module
//!
//! Local device storage for key material.
//!
//! Only the identity key text is stored here. Session keys are never
//! persisted, and messages are stored (encrypted) by the server, not by this
//! crate.

mod key_store;

pub use key_store::{FileKeyStore, KeySlot, KeyStore, MemoryKeyStore};
