//! # Session Key Cache
//!
//! One derived key per open conversation, held in memory for the life of the
//! process (or until sign-out). Keys are never written to storage.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::crypto::SymmetricKey;

/// Identity of a two-party conversation
///
/// Built from the two participant ids in either order; both sides of a
/// conversation get the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConversationId {
    low: String,
    high: String,
}

impl ConversationId {
    /// Conversation between two participants, order-insensitive
    pub fn between(a: impl Into<String>, b: impl Into<String>) -> Self {
        let (a, b) = (a.into(), b.into());
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    /// The two participant ids in canonical order
    pub fn participants(&self) -> (&str, &str) {
        (&self.low, &self.high)
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}|{}", self.low, self.high)
    }
}

/// Whether a conversation can be encrypted right now
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConversationStatus {
    /// A session key is cached
    Ready,
    /// No session key could be derived
    Unavailable {
        /// Human-readable cause, free of key material
        reason: String,
    },
}

impl ConversationStatus {
    /// Whether messages can be encrypted and decrypted
    pub fn is_ready(&self) -> bool {
        matches!(self, ConversationStatus::Ready)
    }
}

/// In-memory map from conversation to session key
///
/// No eviction; the number of open conversations is small.
#[derive(Default)]
pub struct SessionKeyCache {
    keys: RwLock<HashMap<ConversationId, Arc<SymmetricKey>>>,
}

impl SessionKeyCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached key for a conversation
    pub fn get(&self, conversation: &ConversationId) -> Option<Arc<SymmetricKey>> {
        self.keys.read().get(conversation).cloned()
    }

    /// Cache a key, keeping an existing entry if another caller got there first
    pub fn insert(&self, conversation: ConversationId, key: SymmetricKey) -> Arc<SymmetricKey> {
        self.keys
            .write()
            .entry(conversation)
            .or_insert_with(|| Arc::new(key))
            .clone()
    }

    /// Whether a conversation has a cached key
    pub fn contains(&self, conversation: &ConversationId) -> bool {
        self.keys.read().contains_key(conversation)
    }

    /// Number of cached keys
    pub fn len(&self) -> usize {
        self.keys.read().len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.keys.read().is_empty()
    }

    /// Drop every cached key
    pub fn clear(&self) {
        self.keys.write().clear();
    }
}

impl std::fmt::Debug for SessionKeyCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeyCache")
            .field("conversations", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_id_is_order_insensitive() {
        let ab = ConversationId::between("alice", "bob");
        let ba = ConversationId::between("bob", "alice");
        assert_eq!(ab, ba);
        assert_eq!(ab.participants(), ("alice", "bob"));
        assert_eq!(ab.to_string(), "alice|bob");
        assert_ne!(ab, ConversationId::between("alice", "carol"));
    }

    #[test]
    fn test_cache_first_insert_wins() {
        let cache = SessionKeyCache::new();
        let conv = ConversationId::between("a", "b");

        let first = cache.insert(conv.clone(), SymmetricKey::from_bytes([1u8; 32]));
        let second = cache.insert(conv.clone(), SymmetricKey::from_bytes([2u8; 32]));

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*cache.get(&conv).unwrap(), SymmetricKey::from_bytes([1u8; 32]));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_clear() {
        let cache = SessionKeyCache::new();
        cache.insert(ConversationId::between("a", "b"), SymmetricKey::from_bytes([1u8; 32]));
        assert!(!cache.is_empty());

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get(&ConversationId::between("a", "b")).is_none());
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_value(ConversationStatus::Unavailable {
            reason: "peer has no public key".into(),
        })
        .unwrap();
        assert_eq!(json["status"], "unavailable");
        assert!(ConversationStatus::Ready.is_ready());
    }
}
