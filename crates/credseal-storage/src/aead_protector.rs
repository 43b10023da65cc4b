use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng, Payload},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use credseal_core::protector::{ProtectError, ProtectionProvider, Protector};
use tracing::debug;

use crate::key_provider::{KeyMaterial, KeyProvider};

const NONCE_LEN: usize = 12;

/// AES-256-GCM protection provider keyed by a `KeyProvider`.
///
/// The purpose string is bound as associated data, so payloads only open under
/// the purpose they were sealed with.
pub struct AesGcmProtectionProvider<K: KeyProvider> {
    key_provider: K,
}

impl<K: KeyProvider> AesGcmProtectionProvider<K> {
    pub fn new(key_provider: K) -> Self {
        Self { key_provider }
    }
}

impl<K: KeyProvider> ProtectionProvider for AesGcmProtectionProvider<K> {
    type Protector = AesGcmProtector;

    fn create_protector(&self, purpose: &str) -> Result<AesGcmProtector, ProtectError> {
        if purpose.is_empty() {
            return Err(ProtectError::Key("purpose must not be empty".to_string()));
        }
        let material = self
            .key_provider
            .get_or_create()
            .map_err(|e| ProtectError::Key(format!("key provider: {e}")))?;
        debug!(key_id = %material.id, purpose, "creating protector");

        Ok(AesGcmProtector {
            cipher: build_cipher(&material)?,
            purpose: purpose.to_string(),
        })
    }
}

/// Protector producing `base64url(nonce || ciphertext || tag)` payloads.
pub struct AesGcmProtector {
    cipher: Aes256Gcm,
    purpose: String,
}

impl Protector for AesGcmProtector {
    fn protect(&self, plaintext: &str) -> Result<String, ProtectError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(
                &nonce,
                Payload {
                    msg: plaintext.as_bytes(),
                    aad: self.purpose.as_bytes(),
                },
            )
            .map_err(|e| ProtectError::Encrypt(e.to_string()))?;

        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(nonce.as_slice());
        blob.extend_from_slice(&ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(blob))
    }

    fn unprotect(&self, protected: &str) -> Result<String, ProtectError> {
        let blob = URL_SAFE_NO_PAD
            .decode(protected)
            .map_err(|e| ProtectError::Encoding(format!("payload decode failed: {e}")))?;
        if blob.len() < NONCE_LEN {
            return Err(ProtectError::Decrypt(format!(
                "payload too short: {} bytes",
                blob.len()
            )));
        }

        let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(
                Nonce::from_slice(nonce_bytes),
                Payload {
                    msg: ciphertext,
                    aad: self.purpose.as_bytes(),
                },
            )
            .map_err(|e| ProtectError::Decrypt(e.to_string()))?;

        String::from_utf8(plaintext).map_err(|e| ProtectError::Encoding(e.to_string()))
    }
}

fn build_cipher(material: &KeyMaterial) -> Result<Aes256Gcm, ProtectError> {
    Aes256Gcm::new_from_slice(&material.bytes)
        .map_err(|e| ProtectError::Key(format!("cipher init failed: {e}")))
}
