//! Versioned transport payload for encrypted submissions
//!
//! JSON (camelCase) as stored alongside a finding:
//! ```text
//! { "version": 1, "protocolPublicKey": "..", "senderPublicKey": "..",
//!   "encryptedData": "..", "nonce": "..", "createdAt": 1760000000 }
//! ```
//!
//! The sender's public key travels with the payload so the protocol can open
//! it without an out-of-band lookup. `createdAt` is informational only.

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::envelope::{decrypt_bytes, decrypt_message, encrypt_bytes, EncryptedEnvelope};
use crate::error::{CryptoError, CryptoResult};
use crate::keys::KeyPair;

/// Current payload format version
pub const PAYLOAD_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedPayload {
    /// Payload format version
    pub version: u32,
    /// Recipient (protocol team) public key, base64
    pub protocol_public_key: String,
    /// Sender (researcher) public key, base64
    pub sender_public_key: String,
    /// Box ciphertext, base64
    pub encrypted_data: String,
    /// Box nonce, base64
    pub nonce: String,
    /// Unix timestamp (seconds) of sealing
    pub created_at: u64,
}

impl EncryptedPayload {
    /// Seal a text report for a protocol.
    pub fn seal(message: &str, protocol_public_key: &str, sender: &KeyPair) -> CryptoResult<Self> {
        Self::seal_bytes(message.as_bytes(), protocol_public_key, sender)
    }

    /// Seal a binary attachment for a protocol.
    pub fn seal_bytes(
        data: &[u8],
        protocol_public_key: &str,
        sender: &KeyPair,
    ) -> CryptoResult<Self> {
        let envelope = encrypt_bytes(data, protocol_public_key, sender.secret_key.expose_secret())?;
        let created_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        Ok(Self {
            version: PAYLOAD_VERSION,
            protocol_public_key: protocol_public_key.trim().to_string(),
            sender_public_key: sender.public_key.clone(),
            encrypted_data: envelope.ciphertext,
            nonce: envelope.nonce,
            created_at,
        })
    }

    /// Open as text with the protocol's secret key.
    ///
    /// Unknown versions are an error; authentication failures are `Ok(None)`.
    pub fn open(&self, recipient_secret_key: &str) -> CryptoResult<Option<String>> {
        self.check_version()?;
        decrypt_message(
            &self.encrypted_data,
            &self.nonce,
            &self.sender_public_key,
            recipient_secret_key,
        )
    }

    /// Open as bytes with the protocol's secret key.
    pub fn open_bytes(&self, recipient_secret_key: &str) -> CryptoResult<Option<Vec<u8>>> {
        self.check_version()?;
        decrypt_bytes(
            &self.encrypted_data,
            &self.nonce,
            &self.sender_public_key,
            recipient_secret_key,
        )
    }

    /// The bare envelope, without payload metadata.
    pub fn envelope(&self) -> EncryptedEnvelope {
        EncryptedEnvelope {
            ciphertext: self.encrypted_data.clone(),
            nonce: self.nonce.clone(),
        }
    }

    /// Serialize to JSON bytes
    pub fn to_bytes(&self) -> CryptoResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| CryptoError::Encoding(format!("payload serialization: {e}")))
    }

    /// Deserialize from JSON bytes
    pub fn from_bytes(data: &[u8]) -> CryptoResult<Self> {
        serde_json::from_slice(data)
            .map_err(|e| CryptoError::Encoding(format!("payload deserialization: {e}")))
    }

    fn check_version(&self) -> CryptoResult<()> {
        if self.version != PAYLOAD_VERSION {
            return Err(CryptoError::PayloadVersion {
                found: self.version,
                expected: PAYLOAD_VERSION,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::generate_keypair;

    #[test]
    fn test_payload_roundtrip() {
        let researcher = generate_keypair().unwrap();
        let protocol = generate_keypair().unwrap();

        let payload =
            EncryptedPayload::seal("reentrancy in withdraw()", &protocol.public_key, &researcher)
                .unwrap();
        assert_eq!(payload.version, PAYLOAD_VERSION);
        assert_eq!(payload.sender_public_key, researcher.public_key);
        assert_eq!(payload.protocol_public_key, protocol.public_key);
        assert!(payload.created_at > 0);

        let bytes = payload.to_bytes().unwrap();
        let restored = EncryptedPayload::from_bytes(&bytes).unwrap();
        assert_eq!(restored, payload);

        let opened = restored.open(protocol.secret_key.expose_secret()).unwrap();
        assert_eq!(opened.as_deref(), Some("reentrancy in withdraw()"));
    }

    #[test]
    fn test_payload_json_field_names() {
        let researcher = generate_keypair().unwrap();
        let protocol = generate_keypair().unwrap();
        let payload = EncryptedPayload::seal("x", &protocol.public_key, &researcher).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&payload.to_bytes().unwrap()).unwrap();
        for field in [
            "version",
            "protocolPublicKey",
            "senderPublicKey",
            "encryptedData",
            "nonce",
            "createdAt",
        ] {
            assert!(value.get(field).is_some(), "missing field {field}");
        }
    }

    #[test]
    fn test_payload_wrong_recipient() {
        let researcher = generate_keypair().unwrap();
        let protocol = generate_keypair().unwrap();
        let other = generate_keypair().unwrap();

        let payload = EncryptedPayload::seal("secret", &protocol.public_key, &researcher).unwrap();
        assert_eq!(payload.open(other.secret_key.expose_secret()).unwrap(), None);
    }

    #[test]
    fn test_payload_substituted_sender_fails() {
        let researcher = generate_keypair().unwrap();
        let protocol = generate_keypair().unwrap();
        let impostor = generate_keypair().unwrap();

        let mut payload =
            EncryptedPayload::seal("secret", &protocol.public_key, &researcher).unwrap();
        payload.sender_public_key = impostor.public_key.clone();
        assert_eq!(payload.open(protocol.secret_key.expose_secret()).unwrap(), None);
    }

    #[test]
    fn test_payload_unknown_version() {
        let researcher = generate_keypair().unwrap();
        let protocol = generate_keypair().unwrap();

        let mut payload = EncryptedPayload::seal("secret", &protocol.public_key, &researcher).unwrap();
        payload.version = 2;

        let err = payload.open(protocol.secret_key.expose_secret()).unwrap_err();
        assert!(matches!(err, CryptoError::PayloadVersion { found: 2, expected: 1 }));
    }

    #[test]
    fn test_payload_bytes_and_envelope() {
        let researcher = generate_keypair().unwrap();
        let protocol = generate_keypair().unwrap();
        let poc = vec![0u8, 1, 2, 3, 255];

        let payload = EncryptedPayload::seal_bytes(&poc, &protocol.public_key, &researcher).unwrap();
        assert_eq!(
            payload.open_bytes(protocol.secret_key.expose_secret()).unwrap(),
            Some(poc.clone())
        );

        let env = payload.envelope();
        let opened = decrypt_bytes(
            &env.ciphertext,
            &env.nonce,
            &researcher.public_key,
            protocol.secret_key.expose_secret(),
        )
        .unwrap();
        assert_eq!(opened, Some(poc));
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        let err = EncryptedPayload::from_bytes(b"{not json").unwrap_err();
        assert!(matches!(err, CryptoError::Encoding(_)));
    }
}
