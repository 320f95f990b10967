//! # Recovery Demo
//!
//! Registers Alice on one device, then recovers her key on a fresh device
//! with the recovery password.
//!
//! ## Run
//!
//! ```bash
//! RUST_LOG=sdrop_core=info cargo run --example recovery_demo
//! ```

use std::sync::Arc;

use sdrop_core::storage::MemoryKeyStore;
use sdrop_core::{ConversationId, OnboardingState, SecureDropClient};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Secure Drop Core: Key Recovery Demo ===\n");

    println!("  ┌─────────────────────────────────────────────────────────────┐");
    println!("  │                    KEY ESCROW                               │");
    println!("  ├─────────────────────────────────────────────────────────────┤");
    println!("  │                                                             │");
    println!("  │  password + salt ──► PBKDF2-SHA256 (100k) ──► wrap key     │");
    println!("  │  private key ──► AES-256-GCM(wrap key) ──► escrow record   │");
    println!("  │                                                             │");
    println!("  │  The server stores the record but cannot open it.          │");
    println!("  │                                                             │");
    println!("  └─────────────────────────────────────────────────────────────┘");
    println!();

    // Step 1: Register on the first device
    println!("Step 1: Alice registers on her laptop...");

    let laptop = SecureDropClient::with_store(Arc::new(MemoryKeyStore::new()));
    let bundle = laptop
        .register("correct-horse-42")
        .await
        .expect("Registration failed");

    println!("  public_key:            {}...", &bundle.public_key[..40]);
    println!("  encrypted_private_key: {}...", &bundle.escrow.encrypted_private_key[..40]);
    println!("  key_salt:              {}", bundle.escrow.key_salt);
    println!();

    let bob = SecureDropClient::with_store(Arc::new(MemoryKeyStore::new()));
    let bob_bundle = bob.register("bobs-password").await.expect("Bob failed to register");

    // Step 2: Fresh device
    println!("Step 2: Alice logs in on a new phone (empty key store)...");

    let phone = SecureDropClient::with_store(Arc::new(MemoryKeyStore::new()));
    let state = phone
        .start_session(Some(&bundle.escrow))
        .await
        .expect("Session start failed");
    println!("  State: {:?}", state);
    assert_eq!(state, OnboardingState::AwaitingPassword);
    println!();

    // Step 3: Wrong password
    println!("Step 3: Alice mistypes her password...");
    match phone.restore_with_password("wrong-password", &bundle.escrow).await {
        Ok(()) => println!("  [FAILED] wrong password was accepted!"),
        Err(e) => println!("  [OK] {} (code {})", e, e.code()),
    }
    println!("  State: {:?}", phone.onboarding_state().await);
    println!();

    // Step 4: Correct password
    println!("Step 4: Alice enters the right password...");
    phone
        .restore_with_password("correct-horse-42", &bundle.escrow)
        .await
        .expect("Recovery failed");
    println!("  State: {:?}", phone.onboarding_state().await);
    println!(
        "  Same public key as the laptop: {}",
        phone.public_key_text().await.as_deref() == Some(bundle.public_key.as_str())
    );
    println!();

    // Step 5: Talk to Bob from the phone
    println!("Step 5: Alice messages Bob from the phone...");
    let conv = ConversationId::between("alice", "bob");
    phone.open_conversation(&conv, Some(&bob_bundle.public_key)).await;
    bob.open_conversation(&conv, Some(&bundle.public_key)).await;

    let wire = phone
        .encode_outgoing(&conv, "Got a new phone!")
        .expect("Encryption failed");
    let decoded = bob.decode_incoming(&conv, &wire).expect("No session key");
    println!("  Bob reads: \"{}\"", bob.render(&decoded));

    println!();
    println!("=== Demo Complete ===");
}
