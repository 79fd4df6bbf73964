//! Shared-secret derivation and precomputed-key sealing
//!
//! `k = HSalsa20(X25519(secret, public), 0^16)`, NaCl's `box.before`. Sealing
//! with `k` directly (XSalsa20-Poly1305, NaCl's `box.after`) produces the same
//! envelopes as the public-key box, so either side may switch to the
//! precomputed key without affecting the peer.

use crypto_secretbox::aead::{generic_array::GenericArray, Aead, KeyInit};
use crypto_secretbox::XSalsa20Poly1305;
use salsa20::cipher::consts::U10;
use x25519_dalek::{PublicKey as DhPublicKey, StaticSecret};
use zeroize::Zeroize;

use crate::envelope::{random_nonce, EncryptedEnvelope};
use crate::error::{CryptoError, CryptoResult};
use crate::keys::{decode_public_key, decode_secret_bytes};
use crate::{b64_decode, b64_encode, KEY_SIZE};

/// A 256-bit key agreed between two key pairs. Zeroized on drop.
#[derive(Clone)]
pub struct SharedKey {
    bytes: [u8; KEY_SIZE],
}

impl SharedKey {
    /// Agree on a key from one party's secret key and the other's public key.
    ///
    /// Symmetric: `derive(b.public, a.secret) == derive(a.public, b.secret)`.
    pub fn derive(public_key: &str, secret_key: &str) -> CryptoResult<Self> {
        let public = decode_public_key(public_key, "public key")?;
        let secret = StaticSecret::from(*decode_secret_bytes(secret_key, "secret key")?);

        let dh = secret.diffie_hellman(&DhPublicKey::from(*public.as_bytes()));
        let mut derived = salsa20::hsalsa::<U10>(
            GenericArray::from_slice(dh.as_bytes()),
            &GenericArray::default(),
        );

        let mut bytes = [0u8; KEY_SIZE];
        bytes.copy_from_slice(&derived);
        derived.as_mut_slice().zeroize();
        Ok(Self { bytes })
    }

    /// Wrap an existing 32-byte box key.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Parse a key previously produced by [`SharedKey::to_base64`].
    pub fn from_base64(encoded: &str) -> CryptoResult<Self> {
        let mut raw = b64_decode(encoded.trim())
            .map_err(|_| CryptoError::key_format("shared key", "not valid base64"))?;
        let parsed = <[u8; KEY_SIZE]>::try_from(raw.as_slice()).map_err(|_| {
            CryptoError::key_format(
                "shared key",
                format!("expected {KEY_SIZE} bytes, got {}", raw.len()),
            )
        });
        raw.zeroize();
        Ok(Self::from_bytes(parsed?))
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    /// Standard base64, the form `generate_shared_secret` returns.
    pub fn to_base64(&self) -> String {
        b64_encode(&self.bytes)
    }

    /// Seal with the precomputed key. Opens with the public-key box as well.
    pub fn seal(&self, plaintext: &[u8]) -> CryptoResult<EncryptedEnvelope> {
        let nonce = random_nonce()?;
        let ciphertext = self
            .cipher()
            .encrypt(GenericArray::from_slice(&nonce), plaintext)
            .map_err(|e| CryptoError::Encryption(format!("secretbox seal: {e}")))?;
        Ok(EncryptedEnvelope::from_parts(&ciphertext, &nonce))
    }

    /// Open with the precomputed key; `None` on any failure.
    pub fn open(&self, ciphertext: &str, nonce: &str) -> Option<Vec<u8>> {
        let (ciphertext, nonce) = EncryptedEnvelope::decode(ciphertext, nonce)?;
        self.cipher()
            .decrypt(GenericArray::from_slice(&nonce), ciphertext.as_slice())
            .ok()
    }

    fn cipher(&self) -> XSalsa20Poly1305 {
        XSalsa20Poly1305::new(GenericArray::from_slice(&self.bytes))
    }
}

impl PartialEq for SharedKey {
    fn eq(&self, other: &Self) -> bool {
        // constant-time over the full key
        self.bytes
            .iter()
            .zip(other.bytes.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl Eq for SharedKey {}

impl Drop for SharedKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for SharedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Base64 shared secret for `(public_key, secret_key)`; see [`SharedKey::derive`].
pub fn generate_shared_secret(public_key: &str, secret_key: &str) -> CryptoResult<String> {
    Ok(SharedKey::derive(public_key, secret_key)?.to_base64())
}
