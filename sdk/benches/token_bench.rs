// Profile token and ECIES benchmarks.
//
// Covers ES256K profile token signing and verification (against a raw key
// and against an address), plus ECIES encrypt/decrypt at a few payload sizes.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;

use stackid::crypto::{decrypt_ecies, encrypt_ecies, PrivateKey};
use stackid::token::{sign_profile_token, verify_profile_token, SignOptions};

fn person() -> serde_json::Value {
    json!({
        "@context": "http://schema.org",
        "@type": "Person",
        "@id": "some-name.id",
        "name": "John Doe",
        "description": "Benchmark profile",
        "account": [
            {"@type": "Account", "service": "twitter", "identifier": "jdoe", "proofType": "http"}
        ]
    })
}

fn bench_sign_profile_token(c: &mut Criterion) {
    let key = PrivateKey::generate().to_hex();
    let claim = person();

    c.bench_function("token/sign_profile_token", |b| {
        b.iter(|| sign_profile_token(&claim, &key, SignOptions::default()));
    });
}

fn bench_verify_profile_token(c: &mut Criterion) {
    let key = PrivateKey::generate();
    let token = sign_profile_token(&person(), &key.to_hex(), SignOptions::default()).unwrap();
    let public_key = key.public_key().to_hex();
    let address = key.address();

    c.bench_function("token/verify_against_public_key", |b| {
        b.iter(|| verify_profile_token(&token, &public_key));
    });
    c.bench_function("token/verify_against_address", |b| {
        b.iter(|| verify_profile_token(&token, &address));
    });
}

fn bench_ecies(c: &mut Criterion) {
    let key = PrivateKey::generate();
    let private_key = key.to_hex();
    let public_key = key.public_key().to_hex();

    let mut group = c.benchmark_group("ecies");
    for size in [64usize, 1024, 16 * 1024] {
        let payload = vec![0xA5u8; size];
        let cipher = encrypt_ecies(&public_key, payload.clone()).unwrap();
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("encrypt", size), &payload, |b, payload| {
            b.iter(|| encrypt_ecies(&public_key, payload.clone()));
        });
        group.bench_with_input(BenchmarkId::new("decrypt", size), &cipher, |b, cipher| {
            b.iter(|| decrypt_ecies(&private_key, cipher));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_sign_profile_token,
    bench_verify_profile_token,
    bench_ecies,
);
criterion_main!(benches);
