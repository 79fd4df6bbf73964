//! wc-crypto: end-to-end encryption for WhiteClaws vulnerability reports
//!
//! A researcher seals a report so that only the target protocol can read it.
//! Wire format is NaCl `box` (tweetnacl compatible): X25519 key agreement,
//! HSalsa20 key derivation, XSalsa20-Poly1305 authenticated encryption.
//!
//! ```text
//! researcher (sender)                         protocol (recipient)
//!   secret_key ─┐                          ┌─ secret_key
//!               ├─ X25519 ─ HSalsa20 ─ k ──┤
//!   protocol pk ┘                          └─ researcher pk
//!
//! envelope = { ciphertext: b64(XSalsa20-Poly1305(k, nonce, msg)), nonce: b64(24 random bytes) }
//! ```
//!
//! Every binary value crossing the API is standard base64; plaintext is UTF-8.
//! Opening never reports *why* it failed: a wrong key and a tampered envelope
//! both yield `None`.

pub mod envelope;
pub mod error;
pub mod keys;
pub mod payload;
pub mod shared;

pub use envelope::{decrypt_bytes, decrypt_message, encrypt_bytes, encrypt_message, EncryptedEnvelope};
pub use error::{CryptoError, CryptoResult};
pub use keys::{generate_keypair, parse_public_key, parse_secret_key, KeyPair};
pub use payload::{EncryptedPayload, PAYLOAD_VERSION};
pub use shared::{generate_shared_secret, SharedKey};

/// Size of an X25519 public or secret key, and of a derived shared key (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of an XSalsa20 nonce (192-bit)
pub const NONCE_SIZE: usize = 24;

/// Size of a Poly1305 authentication tag
pub const TAG_SIZE: usize = 16;

pub(crate) fn b64_encode(data: &[u8]) -> String {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    STANDARD.encode(data)
}

pub(crate) fn b64_decode(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    STANDARD.decode(s)
}
