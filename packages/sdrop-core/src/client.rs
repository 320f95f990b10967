//! # Secure Drop Client
//!
//! The single entry point a UI talks to. It owns the injected
//! [`CryptoProvider`] and [`KeyStore`], the loaded identity, and the session
//! key cache.
//!
//! ## Lifecycle
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        CLIENT LIFECYCLE                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  1. Construct                                                          │
//! │     SecureDropClient::new(config, provider, key_store)                 │
//! │            │                                                           │
//! │            ▼                                                           │
//! │  2. Identity                                                           │
//! │     register(password)            ──► RegistrationBundle for server   │
//! │       or                                                               │
//! │     start_session(escrow)         ──► KeyRestored                     │
//! │                                   ──► AwaitingPassword                │
//! │                                   ──► KeyUnavailable                  │
//! │     restore_with_password(pw, escrow)  (AwaitingPassword only)        │
//! │            │                                                           │
//! │            ▼                                                           │
//! │  3. Conversations                                                      │
//! │     open_conversation(id, peer_public_key) ──► Ready | Unavailable    │
//! │     encode_outgoing / decode_incoming / decode_history                │
//! │            │                                                           │
//! │            ▼                                                           │
//! │  4. sign_out()  wipes local key slots and cached session keys          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The UI never sees raw key bytes or nonces. The only key material that
//! leaves the client is the public key and the wrapped escrow record.

use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::config::ClientConfig;
use crate::crypto::{
    derive_key_from_password, derive_session_key, generate_salt, import_private_key,
    import_public_key, CryptoProvider, IdentityKeyPair, KdfParams, OsCryptoProvider, Salt,
    SymmetricKey,
};
use crate::error::{Error, RecoveryFailure, Result};
use crate::identity::{
    unwrap_private_key, wrap_private_key, EscrowRecord, OnboardingEvent, OnboardingState,
    RegistrationBundle,
};
use crate::messaging::{
    self, is_envelope, ConversationId, ConversationStatus, DecodedMessage, SessionKeyCache,
};
use crate::storage::{KeySlot, KeyStore};

struct IdentityState {
    onboarding: OnboardingState,
    keypair: Option<Arc<IdentityKeyPair>>,
}

/// Client-side key custody and message encryption
pub struct SecureDropClient {
    config: ClientConfig,
    kdf: KdfParams,
    provider: Arc<dyn CryptoProvider>,
    store: Arc<dyn KeyStore>,
    identity: RwLock<IdentityState>,
    sessions: SessionKeyCache,
}

impl SecureDropClient {
    /// Create a client from explicit dependencies
    pub fn new(
        config: ClientConfig,
        provider: Arc<dyn CryptoProvider>,
        store: Arc<dyn KeyStore>,
    ) -> Result<Self> {
        config.validate()?;
        let kdf = config.kdf_params()?;

        Ok(Self {
            config,
            kdf,
            provider,
            store,
            identity: RwLock::new(IdentityState {
                onboarding: OnboardingState::NoLocalKey,
                keypair: None,
            }),
            sessions: SessionKeyCache::new(),
        })
    }

    /// Default configuration and the OS random source
    pub fn with_store(store: Arc<dyn KeyStore>) -> Self {
        Self {
            config: ClientConfig::default(),
            kdf: KdfParams::default(),
            provider: Arc::new(OsCryptoProvider),
            store,
            identity: RwLock::new(IdentityState {
                onboarding: OnboardingState::NoLocalKey,
                keypair: None,
            }),
            sessions: SessionKeyCache::new(),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ========================================================================
    // IDENTITY
    // ========================================================================

    /// Create a new identity protected by a recovery password
    ///
    /// Generates a keypair, stores both halves locally and returns what the
    /// server should keep. Refused with `InvalidState` while an identity is
    /// loaded; call [`sign_out`](Self::sign_out) first to replace it.
    pub async fn register(&self, password: &str) -> Result<RegistrationBundle> {
        let mut identity = self.identity.write().await;
        if identity.keypair.is_some() {
            return Err(Error::InvalidState(
                "an identity is already loaded; sign out before registering".into(),
            ));
        }

        let provider = &*self.provider;

        let keypair = IdentityKeyPair::generate(provider)?;
        let private_text = keypair.private().to_text()?;
        let public_text = keypair.public().to_text()?;

        let salt = generate_salt(provider)?;
        let password_key = self.derive_password_key(password, salt).await?;
        let escrow = wrap_private_key(provider, &private_text, &password_key, &salt)?;

        self.persist_identity(&private_text, &public_text).await?;

        identity.onboarding = identity.onboarding.next(OnboardingEvent::Registered)?;
        info!(fingerprint = %keypair.public().fingerprint(), "registered new identity");
        identity.keypair = Some(Arc::new(keypair));
        self.sessions.clear();

        Ok(RegistrationBundle {
            public_key: public_text,
            escrow,
        })
    }

    /// Load the identity at session start
    ///
    /// `escrow` is the record on the user's server profile, if any. A usable
    /// local key wins; otherwise the escrow decides between
    /// `AwaitingPassword` and `KeyUnavailable`.
    pub async fn start_session(&self, escrow: Option<&EscrowRecord>) -> Result<OnboardingState> {
        let mut identity = self.identity.write().await;
        self.sessions.clear();

        let start = OnboardingState::NoLocalKey;

        if let Some(private_text) = self.store.load(KeySlot::PrivateKey).await? {
            match import_private_key(&private_text) {
                Ok(private) => {
                    let keypair = IdentityKeyPair::from_private(private);
                    self.sync_public_slot(&keypair).await?;

                    identity.onboarding = start.next(OnboardingEvent::LocalKeyFound)?;
                    debug!(fingerprint = %keypair.public().fingerprint(), "loaded local identity");
                    identity.keypair = Some(Arc::new(keypair));
                    return Ok(identity.onboarding);
                }
                Err(e) => warn!("stored private key is unusable, ignoring it: {}", e),
            }
        }

        identity.keypair = None;
        identity.onboarding = match escrow {
            Some(record) if record.is_well_formed() => start.next(OnboardingEvent::EscrowFound)?,
            Some(_) => {
                warn!("escrow record on profile is malformed");
                start.next(OnboardingEvent::NothingFound)?
            }
            None => start.next(OnboardingEvent::NothingFound)?,
        };

        Ok(identity.onboarding)
    }

    /// Unwrap the escrowed private key with the recovery password
    ///
    /// Only valid in `AwaitingPassword`. On failure the state and the local
    /// store are unchanged and the caller may retry.
    pub async fn restore_with_password(&self, password: &str, escrow: &EscrowRecord) -> Result<()> {
        let mut identity = self.identity.write().await;
        if identity.onboarding != OnboardingState::AwaitingPassword {
            return Err(Error::InvalidState(format!(
                "cannot restore a key while {:?}",
                identity.onboarding
            )));
        }

        let record = escrow.clone();
        let password = Zeroizing::new(password.to_string());
        let params = self.kdf;
        let unwrapped =
            tokio::task::spawn_blocking(move || unwrap_private_key(&record, &password, &params))
                .await?;

        let outcome = unwrapped.and_then(|text| {
            import_private_key(&text)
                .map(|private| (text, IdentityKeyPair::from_private(private)))
                .map_err(|_| RecoveryFailure::InvalidPlaintext.into_public())
        });

        let (private_text, keypair) = match outcome {
            Ok(restored) => restored,
            Err(e) => {
                identity.onboarding = identity.onboarding.next(OnboardingEvent::UnwrapFailed)?;
                info!("recovery attempt failed");
                return Err(e);
            }
        };

        let public_text = keypair.public().to_text()?;
        self.persist_identity(&private_text, &public_text).await?;

        identity.onboarding = identity.onboarding.next(OnboardingEvent::UnwrapSucceeded)?;
        info!(fingerprint = %keypair.public().fingerprint(), "private key restored from escrow");
        identity.keypair = Some(Arc::new(keypair));
        self.sessions.clear();

        Ok(())
    }

    /// Current onboarding state
    pub async fn onboarding_state(&self) -> OnboardingState {
        self.identity.read().await.onboarding
    }

    /// Our public key text, once an identity is loaded
    pub async fn public_key_text(&self) -> Option<String> {
        let identity = self.identity.read().await;
        identity
            .keypair
            .as_ref()
            .and_then(|kp| kp.public().to_text().ok())
    }

    /// Wipe local key slots and every cached session key
    pub async fn sign_out(&self) -> Result<()> {
        let mut identity = self.identity.write().await;

        for slot in KeySlot::ALL {
            self.store.clear(slot).await?;
        }
        self.sessions.clear();
        identity.keypair = None;
        identity.onboarding = identity.onboarding.next(OnboardingEvent::SignedOut)?;

        info!("signed out, local keys cleared");
        Ok(())
    }

    // ========================================================================
    // CONVERSATIONS
    // ========================================================================

    /// Derive and cache the session key for a conversation
    ///
    /// Problems with either key make the conversation `Unavailable`; they are
    /// never returned as errors.
    pub async fn open_conversation(
        &self,
        conversation: &ConversationId,
        peer_public_key: Option<&str>,
    ) -> ConversationStatus {
        if self.sessions.contains(conversation) {
            return ConversationStatus::Ready;
        }

        // Held until the key is cached so sign_out cannot slip in between.
        let identity = self.identity.read().await;
        let Some(keypair) = identity.keypair.as_ref() else {
            return unavailable(conversation, "no private key on this device");
        };
        let Some(peer_text) = peer_public_key else {
            return unavailable(conversation, "peer has no public key");
        };

        let derived = import_public_key(peer_text).and_then(|peer| {
            derive_session_key(keypair.private(), &peer, self.config.session_key_mode)
        });

        match derived {
            Ok(key) => {
                self.sessions.insert(conversation.clone(), key);
                debug!(%conversation, "session key ready");
                ConversationStatus::Ready
            }
            Err(e) => unavailable(conversation, &e.to_string()),
        }
    }

    /// Whether a conversation has a cached session key
    pub fn has_session(&self, conversation: &ConversationId) -> bool {
        self.sessions.contains(conversation)
    }

    /// Encrypt message text for a conversation
    pub fn encode_outgoing(&self, conversation: &ConversationId, text: &str) -> Result<String> {
        let key = self.session_key(conversation)?;
        messaging::encode_outgoing(&*self.provider, text, &key)
    }

    /// Decode one incoming message
    ///
    /// Legacy plaintext decodes even without a session key; an envelope
    /// without one is `EncryptionUnavailable`.
    pub fn decode_incoming(&self, conversation: &ConversationId, wire: &str) -> Result<DecodedMessage> {
        if !is_envelope(wire) {
            return Ok(DecodedMessage::Plaintext(wire.to_string()));
        }
        let key = self.session_key(conversation)?;
        Ok(messaging::decode_incoming(wire, &key))
    }

    /// Decode a batch of messages concurrently, keeping their original order
    ///
    /// At most `decrypt_concurrency` decryptions run at once. Dropping the
    /// returned future aborts the outstanding work; nothing is cached.
    pub async fn decode_history(
        &self,
        conversation: &ConversationId,
        wires: Vec<String>,
    ) -> Result<Vec<DecodedMessage>> {
        let key = self.sessions.get(conversation);
        if key.is_none() && wires.iter().any(|w| is_envelope(w)) {
            return Err(Error::EncryptionUnavailable(conversation.to_string()));
        }

        let limit = self.config.decrypt_concurrency;
        let mut decoded: Vec<Option<DecodedMessage>> = vec![None; wires.len()];
        let mut tasks = JoinSet::new();

        for (index, wire) in wires.into_iter().enumerate() {
            while tasks.len() >= limit {
                if let Some(done) = tasks.join_next().await {
                    let (i, message) = done?;
                    decoded[i] = Some(message);
                }
            }

            let key = key.clone();
            tasks.spawn(async move {
                let message = match key {
                    Some(key) => messaging::decode_incoming(&wire, &key),
                    None => DecodedMessage::Plaintext(wire),
                };
                (index, message)
            });
        }

        while let Some(done) = tasks.join_next().await {
            let (i, message) = done?;
            decoded[i] = Some(message);
        }

        let undecryptable = decoded
            .iter()
            .filter(|m| matches!(m, Some(DecodedMessage::Undecryptable)))
            .count();
        debug!(%conversation, total = decoded.len(), undecryptable, "history decoded");

        decoded
            .into_iter()
            .map(|m| m.ok_or_else(|| Error::Internal("history message was never decoded".into())))
            .collect()
    }

    /// Display text for a decoded message using the configured marker
    pub fn render<'a>(&'a self, message: &'a DecodedMessage) -> &'a str {
        message.display_text(&self.config.undecryptable_marker)
    }

    // ========================================================================
    // INTERNALS
    // ========================================================================

    fn session_key(&self, conversation: &ConversationId) -> Result<Arc<SymmetricKey>> {
        self.sessions
            .get(conversation)
            .ok_or_else(|| Error::EncryptionUnavailable(conversation.to_string()))
    }

    async fn derive_password_key(&self, password: &str, salt: Salt) -> Result<SymmetricKey> {
        let password = Zeroizing::new(password.to_string());
        let params = self.kdf;
        tokio::task::spawn_blocking(move || derive_key_from_password(&password, &salt, &params))
            .await?
    }

    /// Write both slots, leaving neither behind if the second write fails
    async fn persist_identity(&self, private_text: &str, public_text: &str) -> Result<()> {
        self.store.save(KeySlot::PrivateKey, private_text).await?;
        if let Err(e) = self.store.save(KeySlot::PublicKey, public_text).await {
            if let Err(cleanup) = self.store.clear(KeySlot::PrivateKey).await {
                warn!("could not roll back private key slot: {}", cleanup);
            }
            return Err(e);
        }
        Ok(())
    }

    async fn sync_public_slot(&self, keypair: &IdentityKeyPair) -> Result<()> {
        let expected = keypair.public().to_text()?;
        let stored = self.store.load(KeySlot::PublicKey).await?;
        if stored.as_deref().map(String::as_str) != Some(expected.as_str()) {
            debug!("public key slot out of date, rewriting it");
            self.store.save(KeySlot::PublicKey, &expected).await?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for SecureDropClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureDropClient")
            .field("config", &self.config)
            .field("sessions", &self.sessions)
            .finish_non_exhaustive()
    }
}

fn unavailable(conversation: &ConversationId, reason: &str) -> ConversationStatus {
    warn!(%conversation, reason, "encryption unavailable for conversation");
    ConversationStatus::Unavailable {
        reason: reason.to_string(),
    }
}

// ============================================================================
// TESTS
// ============================================================================
