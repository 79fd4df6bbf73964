use thiserror::Error;

pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors surfaced to callers.
///
/// A failed authentication check on open is deliberately absent: those
/// return `Ok(None)` so the failure cause cannot be observed.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The OS random source could not produce key material.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// A key string is not standard base64 or not 32 bytes once decoded.
    #[error("invalid {role}: {reason}")]
    KeyFormat { role: &'static str, reason: String },

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("unsupported payload version {found} (expected {expected})")]
    PayloadVersion { found: u32, expected: u32 },

    #[error("encoding error: {0}")]
    Encoding(String),
}

impl CryptoError {
    pub(crate) fn key_format(role: &'static str, reason: impl Into<String>) -> Self {
        Self::KeyFormat {
            role,
            reason: reason.into(),
        }
    }
}
