//! # Local Key Store
//!
//! Device-local persistence for the identity key text.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        KEY STORE CONTRACT                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Slots:   "private_key"  base64 PKCS#8                                 │
//! │           "public_key"   base64 SPKI                                   │
//! │                                                                         │
//! │  • load(slot)   → Some(text) | None                                    │
//! │  • save(slot)   written at registration or after recovery             │
//! │  • clear(slot)  on sign-out                                            │
//! │                                                                         │
//! │  An empty slot is a normal state (new device), never corruption.      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Local device storage is trusted: the private key is stored as plain text.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// A named slot in local key storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeySlot {
    /// Our private key text
    PrivateKey,
    /// Our public key text
    PublicKey,
}

impl KeySlot {
    /// Every slot, in a stable order
    pub const ALL: [KeySlot; 2] = [KeySlot::PrivateKey, KeySlot::PublicKey];

    /// Storage name of the slot
    pub fn name(&self) -> &'static str {
        match self {
            KeySlot::PrivateKey => "private_key",
            KeySlot::PublicKey => "public_key",
        }
    }
}

/// Device-local key storage
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// Read a slot; `None` when it has never been written or was cleared
    async fn load(&self, slot: KeySlot) -> Result<Option<Zeroizing<String>>>;

    /// Overwrite a slot
    async fn save(&self, slot: KeySlot, value: &str) -> Result<()>;

    /// Empty a slot; clearing an empty slot is not an error
    async fn clear(&self, slot: KeySlot) -> Result<()>;
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

/// Key store that lives only as long as the process
///
/// Used by tests and by sessions that must not touch disk.
#[derive(Default)]
pub struct MemoryKeyStore {
    slots: RwLock<HashMap<KeySlot, Zeroizing<String>>>,
}

impl MemoryKeyStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    /// Whether every slot is empty
    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }
}

#[async_trait]
impl KeyStore for MemoryKeyStore {
    async fn load(&self, slot: KeySlot) -> Result<Option<Zeroizing<String>>> {
        Ok(self.slots.read().get(&slot).cloned())
    }

    async fn save(&self, slot: KeySlot, value: &str) -> Result<()> {
        self.slots
            .write()
            .insert(slot, Zeroizing::new(value.to_string()));
        Ok(())
    }

    async fn clear(&self, slot: KeySlot) -> Result<()> {
        self.slots.write().remove(&slot);
        Ok(())
    }
}

impl std::fmt::Debug for MemoryKeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryKeyStore")
            .field("occupied", &self.len())
            .finish()
    }
}

// ============================================================================
// FILE STORE
// ============================================================================

type SlotFile = BTreeMap<String, String>;

/// Key store backed by one JSON file
///
/// The file holds `{ "private_key": "...", "public_key": "..." }`. A missing
/// file reads as an empty store. Writes go to a sibling temp file first and
/// are then renamed over the original.
#[derive(Debug)]
pub struct FileKeyStore {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl FileKeyStore {
    /// Use (or later create) the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_file(&self) -> Result<SlotFile> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => Zeroizing::new(raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(SlotFile::new()),
            Err(e) => return Err(Error::StorageReadError(e.to_string())),
        };

        serde_json::from_slice(&raw).map_err(|e| {
            Error::StorageReadError(format!("key file is not valid JSON ({:?})", e.classify()))
        })
    }

    async fn write_file(&self, contents: &SlotFile) -> Result<()> {
        let json = Zeroizing::new(serde_json::to_vec_pretty(contents)?);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| Error::StorageWriteError(e.to_string()))?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &json[..])
            .await
            .map_err(|e| Error::StorageWriteError(e.to_string()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(|e| Error::StorageWriteError(e.to_string()))?;
        }

        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| Error::StorageWriteError(e.to_string()))
    }

    async fn update<F>(&self, apply: F) -> Result<()>
    where
        F: FnOnce(&mut SlotFile) + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut contents = self.read_file().await?;
        apply(&mut contents);
        let result = self.write_file(&contents).await;
        for value in contents.values_mut() {
            zeroize::Zeroize::zeroize(value);
        }
        result
    }
}

#[async_trait]
impl KeyStore for FileKeyStore {
    async fn load(&self, slot: KeySlot) -> Result<Option<Zeroizing<String>>> {
        let mut contents = self.read_file().await?;
        let value = contents.remove(slot.name()).map(Zeroizing::new);
        for other in contents.values_mut() {
            zeroize::Zeroize::zeroize(other);
        }
        Ok(value)
    }

    async fn save(&self, slot: KeySlot, value: &str) -> Result<()> {
        let value = value.to_string();
        self.update(move |contents| {
            contents.insert(slot.name().to_string(), value);
        })
        .await
    }

    async fn clear(&self, slot: KeySlot) -> Result<()> {
        self.update(move |contents| {
            if let Some(mut old) = contents.remove(slot.name()) {
                zeroize::Zeroize::zeroize(&mut old);
            }
        })
        .await
    }
}

// ============================================================================
// TESTS
// ============================================================================
