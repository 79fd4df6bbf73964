use secrecy::ExposeSecret;
use wc_crypto::{decrypt_bytes, encrypt_bytes, generate_keypair, SharedKey};

fn make_data(size: usize) -> Vec<u8> {
    (0..size)
        .map(|i| (i.wrapping_mul(7) ^ (i >> 3)) as u8)
        .collect()
}

#[divan::bench(args = [1024, 65536, 1048576])]
fn bench_encrypt_bytes(bencher: divan::Bencher, size: usize) {
    let sender = generate_keypair().unwrap();
    let recipient = generate_keypair().unwrap();
    let data = make_data(size);
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| {
            encrypt_bytes(
                divan::black_box(&data),
                divan::black_box(&recipient.public_key),
                divan::black_box(sender.secret_key.expose_secret()),
            )
            .unwrap()
        });
}

#[divan::bench(args = [1024, 65536, 1048576])]
fn bench_decrypt_bytes(bencher: divan::Bencher, size: usize) {
    let sender = generate_keypair().unwrap();
    let recipient = generate_keypair().unwrap();
    let data = make_data(size);
    let env = encrypt_bytes(&data, &recipient.public_key, sender.secret_key.expose_secret()).unwrap();
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| {
            decrypt_bytes(
                divan::black_box(&env.ciphertext),
                divan::black_box(&env.nonce),
                divan::black_box(&sender.public_key),
                divan::black_box(recipient.secret_key.expose_secret()),
            )
            .unwrap()
        });
}

#[divan::bench(args = [1024, 65536, 1048576])]
fn bench_shared_key_seal(bencher: divan::Bencher, size: usize) {
    let a = generate_keypair().unwrap();
    let b = generate_keypair().unwrap();
    let key = SharedKey::derive(&b.public_key, a.secret_key.expose_secret()).unwrap();
    let data = make_data(size);
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| key.seal(divan::black_box(&data)).unwrap());
}

#[divan::bench]
fn bench_derive_shared_key(bencher: divan::Bencher) {
    let a = generate_keypair().unwrap();
    let b = generate_keypair().unwrap();
    bencher.bench(|| {
        SharedKey::derive(
            divan::black_box(&b.public_key),
            divan::black_box(a.secret_key.expose_secret()),
        )
        .unwrap()
    });
}

fn main() {
    divan::main();
}
