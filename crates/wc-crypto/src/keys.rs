//! X25519 key pairs: generation, base64 encoding, parsing

use crypto_box::{PublicKey, SecretKey};
use rand::{rngs::OsRng, RngCore};
use secrecy::SecretString;
use zeroize::{Zeroize, Zeroizing};

use crate::error::{CryptoError, CryptoResult};
use crate::{b64_decode, b64_encode, KEY_SIZE};

/// A box key pair, both halves base64-encoded.
///
/// `public_key` is freely shareable. `secret_key` must stay on the holder's
/// device; it is kept in a [`SecretString`] so it is zeroized on drop and
/// never printed by `Debug`.
pub struct KeyPair {
    pub public_key: String,
    pub secret_key: SecretString,
}

impl KeyPair {
    /// Rebuild a key pair from its secret half, re-deriving the public key.
    pub fn from_secret_key(secret_key: &str) -> CryptoResult<Self> {
        let secret = parse_secret_key(secret_key)?;
        Ok(Self::from_box_secret(&secret))
    }

    fn from_box_secret(secret: &SecretKey) -> Self {
        let mut secret_bytes = secret.to_bytes();
        let encoded_secret = b64_encode(&secret_bytes);
        secret_bytes.zeroize();

        Self {
            public_key: b64_encode(secret.public_key().as_bytes()),
            secret_key: SecretString::from(encoded_secret),
        }
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

/// Generate a fresh key pair from the OS random source.
///
/// Fails with [`CryptoError::KeyGeneration`] if the random source is
/// unavailable; never falls back to a weaker generator.
pub fn generate_keypair() -> CryptoResult<KeyPair> {
    let mut bytes = Zeroizing::new([0u8; KEY_SIZE]);
    OsRng
        .try_fill_bytes(&mut bytes[..])
        .map_err(|e| CryptoError::KeyGeneration(format!("secure randomness unavailable: {e}")))?;

    let secret = SecretKey::from(*bytes);
    let pair = KeyPair::from_box_secret(&secret);
    tracing::debug!(public_key = %pair.public_key, "generated key pair");
    Ok(pair)
}

/// Parse a base64 public key.
pub fn parse_public_key(encoded: &str) -> CryptoResult<PublicKey> {
    decode_public_key(encoded, "public key")
}

/// Parse a base64 secret key.
pub fn parse_secret_key(encoded: &str) -> CryptoResult<SecretKey> {
    decode_secret_key(encoded, "secret key")
}

pub(crate) fn decode_public_key(encoded: &str, role: &'static str) -> CryptoResult<PublicKey> {
    Ok(PublicKey::from(decode_key_bytes(encoded, role)?))
}

pub(crate) fn decode_secret_key(encoded: &str, role: &'static str) -> CryptoResult<SecretKey> {
    let bytes = decode_secret_bytes(encoded, role)?;
    Ok(SecretKey::from(*bytes))
}

/// Secret key bytes in a buffer that is wiped when dropped.
pub(crate) fn decode_secret_bytes(
    encoded: &str,
    role: &'static str,
) -> CryptoResult<Zeroizing<[u8; KEY_SIZE]>> {
    decode_key_bytes(encoded, role).map(Zeroizing::new)
}

fn decode_key_bytes(encoded: &str, role: &'static str) -> CryptoResult<[u8; KEY_SIZE]> {
    // The decode error is not forwarded: it can echo input bytes.
    let mut raw = b64_decode(encoded.trim())
        .map_err(|_| CryptoError::key_format(role, "not valid base64"))?;

    if raw.len() != KEY_SIZE {
        let len = raw.len();
        raw.zeroize();
        tracing::debug!(role, len, "rejected key with wrong length");
        return Err(CryptoError::key_format(
            role,
            format!("expected {KEY_SIZE} bytes, got {len}"),
        ));
    }

    let mut key = [0u8; KEY_SIZE];
    key.copy_from_slice(&raw);
    raw.zeroize();
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_keypair_fields_are_base64_keys() {
        let pair = generate_keypair().unwrap();

        // 32 bytes -> 44 base64 characters with one '=' of padding
        assert_eq!(pair.public_key.len(), 44);
        assert_eq!(pair.secret_key.expose_secret().len(), 44);
        assert_eq!(b64_decode(&pair.public_key).unwrap().len(), KEY_SIZE);
        assert_eq!(
            b64_decode(pair.secret_key.expose_secret()).unwrap().len(),
            KEY_SIZE
        );
    }

    #[test]
    fn test_keypairs_are_unique() {
        let a = generate_keypair().unwrap();
        let b = generate_keypair().unwrap();

        assert_ne!(a.public_key, b.public_key, "public keys must differ");
        assert_ne!(
            a.secret_key.expose_secret(),
            b.secret_key.expose_secret(),
            "secret keys must differ"
        );
    }

    #[test]
    fn test_from_secret_key_rederives_public_key() {
        let pair = generate_keypair().unwrap();
        let rebuilt = KeyPair::from_secret_key(pair.secret_key.expose_secret()).unwrap();

        assert_eq!(rebuilt.public_key, pair.public_key);
        assert_eq!(
            rebuilt.secret_key.expose_secret(),
            pair.secret_key.expose_secret()
        );
    }

    #[test]
    fn test_public_key_is_derived_from_secret() {
        // all-ones secret: public key must be stable across calls
        let secret = b64_encode(&[1u8; KEY_SIZE]);
        let a = KeyPair::from_secret_key(&secret).unwrap();
        let b = KeyPair::from_secret_key(&secret).unwrap();
        assert_eq!(a.public_key, b.public_key);
        assert_ne!(a.public_key, secret);
    }

    #[test]
    fn test_parse_rejects_bad_base64() {
        let err = parse_public_key("not*base64!").unwrap_err();
        assert!(matches!(err, CryptoError::KeyFormat { role: "public key", .. }));
    }

    #[test]
    fn test_parse_rejects_non_canonical_base64() {
        let canonical = b64_encode(&[0u8; KEY_SIZE]);
        assert!(parse_public_key(&canonical).is_ok());

        // "...A=" -> "...B=": same length, non-zero trailing bits
        let non_canonical = format!("{}B=", &canonical[..canonical.len() - 2]);
        let err = parse_public_key(&non_canonical).unwrap_err();
        assert!(matches!(err, CryptoError::KeyFormat { role: "public key", .. }));
        assert!(parse_secret_key(&non_canonical).is_err());
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        let short = b64_encode(&[7u8; 31]);
        let err = parse_secret_key(&short).unwrap_err();
        match err {
            CryptoError::KeyFormat { role, reason } => {
                assert_eq!(role, "secret key");
                assert!(reason.contains("got 31"), "reason: {reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(parse_public_key("").is_err());
        assert!(parse_secret_key("").is_err());
    }

    #[test]
    fn test_parse_tolerates_surrounding_whitespace() {
        let pair = generate_keypair().unwrap();
        let padded = format!("  {}\n", pair.public_key);
        let key = parse_public_key(&padded).unwrap();
        assert_eq!(b64_encode(key.as_bytes()), pair.public_key);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let pair = generate_keypair().unwrap();
        let debug = format!("{pair:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains(pair.secret_key.expose_secret()));
    }
}
