//! Public-key sealing and opening (NaCl `box`)
//!
//! Sealing uses the recipient's public key and the sender's secret key;
//! opening swaps the roles (sender public, recipient secret). Both sides
//! arrive at the same XSalsa20-Poly1305 key.
//!
//! Envelope format (both fields standard base64):
//! ```text
//! nonce      = 24 random bytes, fresh per call
//! ciphertext = [16-byte Poly1305 tag][N bytes: XSalsa20 stream ciphertext]
//! ```

use crypto_box::aead::{generic_array::GenericArray, Aead};
use crypto_box::SalsaBox;
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::error::{CryptoError, CryptoResult};
use crate::keys::{decode_public_key, decode_secret_key};
use crate::{b64_decode, b64_encode, NONCE_SIZE, TAG_SIZE};

/// Sealed message as it travels: ciphertext and the nonce it was sealed under.
///
/// Replays are not detected here; an envelope opens as often as it is
/// presented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedEnvelope {
    /// Tag and ciphertext (base64)
    pub ciphertext: String,
    /// 24-byte nonce (base64)
    pub nonce: String,
}

impl EncryptedEnvelope {
    pub(crate) fn from_parts(ciphertext: &[u8], nonce: &[u8; NONCE_SIZE]) -> Self {
        Self {
            ciphertext: b64_encode(ciphertext),
            nonce: b64_encode(nonce),
        }
    }

    /// Decoded `(ciphertext, nonce)`, or `None` if either field could not
    /// have come from a seal operation.
    pub(crate) fn decode(ciphertext: &str, nonce: &str) -> Option<(Vec<u8>, [u8; NONCE_SIZE])> {
        let ciphertext = b64_decode(ciphertext).ok()?;
        if ciphertext.len() < TAG_SIZE {
            return None;
        }
        let nonce: [u8; NONCE_SIZE] = b64_decode(nonce).ok()?.try_into().ok()?;
        Some((ciphertext, nonce))
    }
}

/// Encrypt UTF-8 text for `recipient_public_key`, authenticated as the holder
/// of `sender_secret_key`.
pub fn encrypt_message(
    message: &str,
    recipient_public_key: &str,
    sender_secret_key: &str,
) -> CryptoResult<EncryptedEnvelope> {
    encrypt_bytes(message.as_bytes(), recipient_public_key, sender_secret_key)
}

/// Encrypt raw bytes (file attachments). Same key roles as [`encrypt_message`].
pub fn encrypt_bytes(
    plaintext: &[u8],
    recipient_public_key: &str,
    sender_secret_key: &str,
) -> CryptoResult<EncryptedEnvelope> {
    let recipient = decode_public_key(recipient_public_key, "recipient public key")?;
    let sender = decode_secret_key(sender_secret_key, "sender secret key")?;

    let nonce = random_nonce()?;
    let ciphertext = SalsaBox::new(&recipient, &sender)
        .encrypt(GenericArray::from_slice(&nonce), plaintext)
        .map_err(|e| CryptoError::Encryption(format!("box seal: {e}")))?;

    tracing::trace!(len = plaintext.len(), "sealed envelope");
    Ok(EncryptedEnvelope::from_parts(&ciphertext, &nonce))
}

/// Decrypt an envelope produced by [`encrypt_message`].
///
/// Returns `Ok(None)` when the keys do not match the ones used to seal, when
/// the ciphertext or nonce was altered, or when the authenticated plaintext
/// is not UTF-8. Malformed *key* strings are a caller bug and return
/// [`CryptoError::KeyFormat`].
pub fn decrypt_message(
    ciphertext: &str,
    nonce: &str,
    sender_public_key: &str,
    recipient_secret_key: &str,
) -> CryptoResult<Option<String>> {
    let Some(plaintext) = decrypt_bytes(ciphertext, nonce, sender_public_key, recipient_secret_key)?
    else {
        return Ok(None);
    };

    match String::from_utf8(plaintext) {
        Ok(text) => Ok(Some(text)),
        Err(e) => {
            e.into_bytes().zeroize();
            Ok(None)
        }
    }
}

/// Decrypt an envelope produced by [`encrypt_bytes`]. Same failure policy as
/// [`decrypt_message`].
pub fn decrypt_bytes(
    ciphertext: &str,
    nonce: &str,
    sender_public_key: &str,
    recipient_secret_key: &str,
) -> CryptoResult<Option<Vec<u8>>> {
    let sender = decode_public_key(sender_public_key, "sender public key")?;
    let recipient = decode_secret_key(recipient_secret_key, "recipient secret key")?;

    let Some((ciphertext, nonce)) = EncryptedEnvelope::decode(ciphertext, nonce) else {
        tracing::trace!("envelope rejected");
        return Ok(None);
    };

    let opened = SalsaBox::new(&sender, &recipient)
        .decrypt(GenericArray::from_slice(&nonce), ciphertext.as_slice())
        .ok();
    if opened.is_none() {
        tracing::trace!("envelope rejected");
    }
    Ok(opened)
}

/// A fresh nonce from the OS random source.
pub(crate) fn random_nonce() -> CryptoResult<[u8; NONCE_SIZE]> {
    let mut nonce = [0u8; NONCE_SIZE];
    OsRng
        .try_fill_bytes(&mut nonce)
        .map_err(|e| CryptoError::Encryption(format!("secure randomness unavailable for nonce: {e}")))?;
    Ok(nonce)
}
