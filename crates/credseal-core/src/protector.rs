use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use thiserror::Error;

/// Errors produced by protector implementations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtectError {
    /// Key material could not be obtained.
    #[error("key unavailable: {0}")]
    Key(String),
    #[error("encrypt failed: {0}")]
    Encrypt(String),
    /// The payload was rejected (corrupted, truncated or forged).
    #[error("decrypt failed: {0}")]
    Decrypt(String),
    #[error("encoding error: {0}")]
    Encoding(String),
    /// The payload was protected under a different purpose.
    #[error("payload was protected under a different purpose")]
    PurposeMismatch,
}

/// Reversible text protection scoped to a single purpose.
///
/// Ciphertext is opaque text; callers must not assume `protect` is deterministic.
pub trait Protector: Send + Sync {
    fn protect(&self, plaintext: &str) -> Result<String, ProtectError>;

    /// Fails for payloads produced under another purpose or by another key.
    fn unprotect(&self, protected: &str) -> Result<String, ProtectError>;
}

/// Hands out protectors whose key material is isolated per purpose string.
pub trait ProtectionProvider {
    type Protector: Protector;

    fn create_protector(&self, purpose: &str) -> Result<Self::Protector, ProtectError>;
}

#[derive(Debug, Default)]
struct CallCounts {
    protect: AtomicUsize,
    unprotect: AtomicUsize,
}

/// In-memory protection provider for tests and smoke runs.
/// This is not cryptographically secure; the payload only masks the plaintext and
/// tags it with its purpose so that cross-purpose reads fail like a real protector.
#[derive(Debug, Default, Clone)]
pub struct InMemoryProtectionProvider {
    calls: Arc<CallCounts>,
}

impl InMemoryProtectionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `protect` calls made by every protector created from this provider.
    pub fn protect_calls(&self) -> usize {
        self.calls.protect.load(Ordering::SeqCst)
    }

    pub fn unprotect_calls(&self) -> usize {
        self.calls.unprotect.load(Ordering::SeqCst)
    }
}

impl ProtectionProvider for InMemoryProtectionProvider {
    type Protector = InMemoryProtector;

    fn create_protector(&self, purpose: &str) -> Result<InMemoryProtector, ProtectError> {
        if purpose.is_empty() {
            return Err(ProtectError::Key("purpose must not be empty".to_string()));
        }
        Ok(InMemoryProtector {
            purpose: purpose.to_string(),
            calls: Arc::clone(&self.calls),
        })
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryProtector {
    purpose: String,
    calls: Arc<CallCounts>,
}

impl Protector for InMemoryProtector {
    fn protect(&self, plaintext: &str) -> Result<String, ProtectError> {
        self.calls.protect.fetch_add(1, Ordering::SeqCst);

        // Layout: purpose length (u32, big endian) | purpose | masked plaintext.
        let purpose = self.purpose.as_bytes();
        let purpose_len = u32::try_from(purpose.len())
            .map_err(|_| ProtectError::Encrypt("purpose too long".to_string()))?;
        let mut payload = Vec::with_capacity(4 + purpose.len() + plaintext.len());
        payload.extend_from_slice(&purpose_len.to_be_bytes());
        payload.extend_from_slice(purpose);
        payload.extend(mask(plaintext.as_bytes()));
        Ok(URL_SAFE_NO_PAD.encode(payload))
    }

    fn unprotect(&self, protected: &str) -> Result<String, ProtectError> {
        self.calls.unprotect.fetch_add(1, Ordering::SeqCst);

        let payload = URL_SAFE_NO_PAD
            .decode(protected)
            .map_err(|e| ProtectError::Encoding(e.to_string()))?;
        if payload.len() < 4 {
            return Err(ProtectError::Decrypt("payload too short".to_string()));
        }
        let (len_bytes, rest) = payload.split_at(4);
        let purpose_len =
            u32::from_be_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]]) as usize;
        if rest.len() < purpose_len {
            return Err(ProtectError::Decrypt("payload truncated".to_string()));
        }
        let (purpose, masked) = rest.split_at(purpose_len);
        if purpose != self.purpose.as_bytes() {
            return Err(ProtectError::PurposeMismatch);
        }
        String::from_utf8(unmask(masked)).map_err(|e| ProtectError::Encoding(e.to_string()))
    }
}

const MASK_BYTE: u8 = 0xA5;

fn mask(input: &[u8]) -> Vec<u8> {
    input.iter().map(|b| b ^ MASK_BYTE).collect()
}

fn unmask(input: &[u8]) -> Vec<u8> {
    mask(input) // XOR twice restores original.
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_masks_and_unmasks() {
        let provider = InMemoryProtectionProvider::new();
        let protector = provider.create_protector("app:creds").expect("protector");

        let protected = protector.protect("top-secret").expect("protect");
        assert!(!protected.contains("top-secret"));
        assert_eq!(protector.unprotect(&protected).expect("unprotect"), "top-secret");
        assert_eq!(provider.protect_calls(), 1);
        assert_eq!(provider.unprotect_calls(), 1);
    }

    #[test]
    fn other_purpose_is_rejected() {
        let provider = InMemoryProtectionProvider::new();
        let writer = provider.create_protector("app:creds").expect("writer");
        let reader = provider.create_protector("app:other").expect("reader");

        let protected = writer.protect("s3cret").expect("protect");
        let err = reader.unprotect(&protected).expect_err("purpose must match");
        assert_eq!(err, ProtectError::PurposeMismatch);
    }

    #[test]
    fn empty_payload_is_rejected() {
        let protector = InMemoryProtectionProvider::new()
            .create_protector("app:creds")
            .expect("protector");
        let err = protector.unprotect("").expect_err("empty payload");
        assert!(matches!(err, ProtectError::Decrypt(_)));
    }

    #[test]
    fn empty_purpose_is_rejected() {
        let err = InMemoryProtectionProvider::new()
            .create_protector("")
            .expect_err("empty purpose");
        assert!(matches!(err, ProtectError::Key(_)));
    }
}
