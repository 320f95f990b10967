//! Benchmarks for key custody and message encryption.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use sdrop_core::crypto::{
    decrypt, derive_key_from_password, derive_session_key, encrypt, IdentityKeyPair, KdfParams,
    OsCryptoProvider, Salt, SessionKeyMode, SymmetricKey,
};
use sdrop_core::messaging::{decode_incoming, encode_outgoing};

fn bench_key_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("key_generation");
    group.bench_function("p256_keypair", |b| {
        b.iter(|| IdentityKeyPair::generate(&OsCryptoProvider))
    });

    let kp = IdentityKeyPair::generate(&OsCryptoProvider).unwrap();
    let text = kp.private().to_text().unwrap();
    group.bench_function("pkcs8_import", |b| {
        b.iter(|| sdrop_core::crypto::import_private_key(black_box(&text)))
    });

    group.finish();
}

fn bench_password_kdf(c: &mut Criterion) {
    let mut group = c.benchmark_group("password_kdf");
    // each iteration is a full login attempt
    group.sample_size(10);

    let salt = Salt::from_bytes([7u8; 16]);
    for iterations in [100_000u32, 300_000] {
        let params = KdfParams::new(iterations).unwrap();
        group.bench_function(format!("pbkdf2_sha256_{}", iterations), |b| {
            b.iter(|| derive_key_from_password(black_box("correct-horse-42"), &salt, &params))
        });
    }

    group.finish();
}

fn bench_session_key(c: &mut Criterion) {
    let mut group = c.benchmark_group("session_key");
    let alice = IdentityKeyPair::generate(&OsCryptoProvider).unwrap();
    let bob = IdentityKeyPair::generate(&OsCryptoProvider).unwrap();

    group.bench_function("ecdh_raw", |b| {
        b.iter(|| derive_session_key(alice.private(), bob.public(), SessionKeyMode::Raw))
    });
    group.bench_function("ecdh_hkdf", |b| {
        b.iter(|| derive_session_key(alice.private(), bob.public(), SessionKeyMode::HkdfSha256))
    });

    group.finish();
}

fn bench_aead(c: &mut Criterion) {
    let mut group = c.benchmark_group("aead");
    let key = SymmetricKey::from_bytes([42u8; 32]);

    for size in [64usize, 1024, 64 * 1024] {
        let data = vec![0u8; size];
        let (nonce, ciphertext) = encrypt(&OsCryptoProvider, &key, &data).unwrap();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_function(format!("encrypt_{}b", size), |b| {
            b.iter(|| encrypt(&OsCryptoProvider, &key, black_box(&data)))
        });
        group.bench_function(format!("decrypt_{}b", size), |b| {
            b.iter(|| decrypt(&key, &nonce, black_box(&ciphertext)))
        });
    }

    group.finish();
}

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");
    let key = SymmetricKey::from_bytes([42u8; 32]);
    let text = "A typical chat message, about a sentence long.";
    let wire = encode_outgoing(&OsCryptoProvider, text, &key).unwrap();

    group.bench_function("encode_outgoing", |b| {
        b.iter(|| encode_outgoing(&OsCryptoProvider, black_box(text), &key))
    });
    group.bench_function("decode_incoming", |b| {
        b.iter(|| decode_incoming(black_box(&wire), &key))
    });
    group.bench_function("decode_legacy", |b| {
        b.iter(|| decode_incoming(black_box("no separator here"), &key))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_key_generation,
    bench_password_kdf,
    bench_session_key,
    bench_aead,
    bench_codec,
);

criterion_main!(benches);
