//! Derivation pipeline benchmarks
//!
//! Stretching dominates: 2048 PBKDF2 rounds per phrase. Per-account derivation
//! over a cached seed should stay well under a millisecond.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sol_hd_keyring::core::mnemonic::FixedEntropy;
use sol_hd_keyring::crypto::seed::SeedDeriver;
use sol_hd_keyring::{AccountRegistry, KeyEngine};

const ABANDON_ABOUT: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

fn bench_phrase_to_seed(c: &mut Criterion) {
    c.bench_function("phrase_to_master_seed", |b| {
        b.iter(|| SeedDeriver.to_seed_str(black_box(ABANDON_ABOUT), black_box("")).expect("valid phrase"));
    });
}

fn bench_account_derivation(c: &mut Criterion) {
    let engine = KeyEngine::default();
    let seed = SeedDeriver.to_seed_str(ABANDON_ABOUT, "").expect("valid phrase");

    c.bench_function("derive_identity_cached_seed", |b| {
        b.iter(|| engine.derive_identity(black_box(&seed), black_box(7)).expect("derive failed"));
    });
}

fn bench_registry_add(c: &mut Criterion) {
    c.bench_function("registry_add_identity", |b| {
        let mut registry =
            AccountRegistry::new(KeyEngine::default(), Box::new(FixedEntropy::new(vec![0u8])));
        registry.create_wallet(12).expect("create failed");
        b.iter(|| registry.add_identity().expect("add failed"));
    });
}

fn bench_signing(c: &mut Criterion) {
    let keypair = KeyEngine::default()
        .keypair_from_phrase(ABANDON_ABOUT, "", 0)
        .expect("derive failed");
    let message = [0x5au8; 256];

    c.bench_function("sign_message", |b| {
        b.iter(|| keypair.sign(black_box(&message)));
    });
}

criterion_group!(
    benches,
    bench_phrase_to_seed,
    bench_account_derivation,
    bench_registry_add,
    bench_signing
);
criterion_main!(benches);
