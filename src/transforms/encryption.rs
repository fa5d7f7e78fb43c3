//! Encryption transform
//!
//! AES-256-GCM with a key derived from the configured passphrase. The
//! random nonce is prepended to the ciphertext and the whole frame is
//! base64 encoded, mirroring the compression transforms' text-safe
//! output.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use sha2::{Digest, Sha256};

use crate::context::Context;
use crate::error::{EdgeflowError, Result};
use crate::function::{FunctionOutcome, PipelineFunction, Value};

const NONCE_LEN: usize = 12;

/// Encrypts the value with AES-256-GCM and emits base64 text bytes
pub struct AesEncryptor {
    key: [u8; 32],
}

impl AesEncryptor {
    /// Derive the cipher key from `key_phrase` via Sha256.
    pub fn new(key_phrase: impl AsRef<[u8]>) -> Self {
        Self {
            key: Sha256::digest(key_phrase.as_ref()).into(),
        }
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|_| EdgeflowError::pipeline("invalid encryption key length"))?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let ciphertext = cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| EdgeflowError::pipeline("encryption failed"))?;

        let mut framed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        framed.extend_from_slice(&nonce);
        framed.extend_from_slice(&ciphertext);
        Ok(framed)
    }

    /// Reverse of [`AesEncryptor::encrypt`] plus the base64 framing.
    /// Exposed for sinks that need to verify round trips.
    pub fn decrypt(key_phrase: impl AsRef<[u8]>, encoded: &[u8]) -> Result<Vec<u8>> {
        let framed = BASE64
            .decode(encoded)
            .map_err(|e| EdgeflowError::Decode(format!("invalid base64 ciphertext: {e}")))?;
        if framed.len() < NONCE_LEN {
            return Err(EdgeflowError::Decode("ciphertext too short".to_string()));
        }

        let key: [u8; 32] = Sha256::digest(key_phrase.as_ref()).into();
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|_| EdgeflowError::pipeline("invalid encryption key length"))?;

        let (nonce, ciphertext) = framed.split_at(NONCE_LEN);
        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| EdgeflowError::pipeline("decryption failed"))
    }
}

#[async_trait]
impl PipelineFunction for AesEncryptor {
    fn name(&self) -> &str {
        "EncryptWithAes"
    }

    async fn call(&self, _ctx: &mut Context, input: Value) -> FunctionOutcome {
        let data = match input.coerce_bytes() {
            Ok(data) => data,
            Err(error) => return FunctionOutcome::Failed(error),
        };

        match self.encrypt(&data) {
            Ok(framed) => {
                let encoded = BASE64.encode(framed);
                FunctionOutcome::Next(Value::Bytes(Bytes::from(encoded.into_bytes())))
            }
            Err(error) => FunctionOutcome::Failed(error),
        }
    }
}
