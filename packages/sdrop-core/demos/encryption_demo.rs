//! # Encryption Demo
//!
//! Demonstrates end-to-end encryption between two parties.
//!
//! ## Run
//!
//! ```bash
//! RUST_LOG=sdrop_core=debug cargo run --example encryption_demo
//! ```

use sdrop_core::crypto::{derive_session_key, IdentityKeyPair, OsCryptoProvider, SessionKeyMode};
use sdrop_core::messaging::{
    decode_incoming, encode_outgoing, DecodedMessage, DEFAULT_UNDECRYPTABLE_MARKER,
};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Secure Drop Core: End-to-End Encryption Demo ===\n");

    // Step 1: Create two parties (Alice and Bob)
    println!("Step 1: Creating P-256 keypairs for Alice and Bob...");

    let provider = OsCryptoProvider;
    let alice = IdentityKeyPair::generate(&provider).expect("Failed to create Alice's keypair");
    let bob = IdentityKeyPair::generate(&provider).expect("Failed to create Bob's keypair");

    let alice_public = alice.public().to_text().expect("SPKI export failed");
    println!("  Alice's public key (SPKI): {}...", &alice_public[..40]);
    println!("  Alice's fingerprint:       {}", alice.public().fingerprint());
    println!("  Bob's fingerprint:         {}", bob.public().fingerprint());
    println!();

    // Step 2: Derive the session key using ECDH (P-256)
    println!("Step 2: Deriving the session key (P-256 ECDH)...");
    println!();
    println!("  ┌─────────────────────────────────────────────────────────────┐");
    println!("  │                    KEY AGREEMENT FLOW                       │");
    println!("  ├─────────────────────────────────────────────────────────────┤");
    println!("  │                                                             │");
    println!("  │   Alice                              Bob                    │");
    println!("  │     │──── Alice's Public Key ─────────►│                    │");
    println!("  │     │◄──── Bob's Public Key ───────────│                    │");
    println!("  │     ▼                                  ▼                    │");
    println!("  │  ECDH(a, B)          ==           ECDH(b, A)                │");
    println!("  │              ┌─────────────────┐                           │");
    println!("  │              │  SAME SESSION   │                           │");
    println!("  │              │      KEY        │                           │");
    println!("  │              └─────────────────┘                           │");
    println!("  │                                                             │");
    println!("  └─────────────────────────────────────────────────────────────┘");
    println!();

    let alice_key = derive_session_key(alice.private(), bob.public(), SessionKeyMode::Raw)
        .expect("Alice's agreement failed");
    let bob_key = derive_session_key(bob.private(), alice.public(), SessionKeyMode::Raw)
        .expect("Bob's agreement failed");

    if alice_key == bob_key {
        println!("  [OK] Session keys match!");
    } else {
        println!("  [FAILED] Session keys don't match!");
        return;
    }
    println!();

    // Step 3: Alice encrypts a message
    println!("Step 3: Alice encrypts a message...");

    let message = "Hello Bob! This is a secret message from Alice.";
    let wire = encode_outgoing(&provider, message, &alice_key).expect("Encryption failed");

    println!("  Plaintext: \"{}\"", message);
    println!("  On the wire: {}", wire);
    println!();

    // Step 4: Bob decrypts it
    println!("Step 4: Bob decrypts the message...");

    let decoded = decode_incoming(&wire, &bob_key);
    println!(
        "  Decrypted: \"{}\"",
        decoded.display_text(DEFAULT_UNDECRYPTABLE_MARKER)
    );
    println!();

    // Step 5: Tampering and legacy content
    println!("Step 5: What the codec does with other content...");

    let mut tampered = wire.clone().into_bytes();
    let last = tampered.len() - 3;
    tampered[last] = if tampered[last] == b'A' { b'B' } else { b'A' };
    let tampered = String::from_utf8(tampered).expect("still ASCII");

    for (label, content) in [
        ("tampered", tampered.as_str()),
        ("legacy", "sent before encryption existed"),
        ("data URL", "data:image/png;base64,iVBORw0KGgo="),
    ] {
        let decoded = decode_incoming(content, &bob_key);
        let kind = match decoded {
            DecodedMessage::Plaintext(_) => "plaintext",
            DecodedMessage::Decrypted(_) => "decrypted",
            DecodedMessage::Undecryptable => "undecryptable",
        };
        println!(
            "  {:<9} => {:<13} \"{}\"",
            label,
            kind,
            decoded.display_text(DEFAULT_UNDECRYPTABLE_MARKER)
        );
    }

    println!();
    println!("=== Demo Complete ===");
}
