use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::Sha256;

use crate::error::AuthError;

type HmacSha256 = Hmac<Sha256>;

const NONCE_LEN: usize = 12;
const MAC_LEN: usize = 32;

fn new_hmac(key: &[u8]) -> Result<HmacSha256, AuthError> {
    <HmacSha256 as Mac>::new_from_slice(key)
        .map_err(|e| AuthError::CryptoError(format!("HMAC init failed: {e}")))
}

fn decode_key(name: &str, b64: &str) -> Result<Vec<u8>, AuthError> {
    let key = STANDARD
        .decode(b64)
        .map_err(|e| AuthError::CryptoError(format!("Invalid {name} base64: {e}")))?;
    if key.len() != 32 {
        return Err(AuthError::CryptoError(format!(
            "{name} must be 32 bytes, got {}",
            key.len()
        )));
    }
    Ok(key)
}

/// Seals session payloads with AES-256-GCM and signs OAuth state with HMAC-SHA256.
///
/// Both outputs are URL-safe base64 so they can travel in cookies and query strings
/// without further escaping.
pub struct CryptoEngine {
    cipher: Aes256Gcm,
    hmac_key: Vec<u8>,
}

impl CryptoEngine {
    /// Create a new CryptoEngine from base64-encoded 32-byte keys.
    pub fn new(master_key_b64: &str, hmac_secret_b64: &str) -> Result<Self, AuthError> {
        let master_key = decode_key("MASTER_KEY", master_key_b64)?;
        let hmac_key = decode_key("HMAC_SECRET", hmac_secret_b64)?;

        let cipher = Aes256Gcm::new_from_slice(&master_key)
            .map_err(|e| AuthError::CryptoError(format!("Failed to init AES cipher: {e}")))?;

        Ok(Self { cipher, hmac_key })
    }

    /// Serialize `value` to JSON and encrypt it. Returns base64url(nonce || ciphertext).
    pub fn seal<T: Serialize>(&self, value: &T) -> Result<String, AuthError> {
        let plaintext = serde_json::to_vec(value)
            .map_err(|e| AuthError::CryptoError(format!("Failed to encode payload: {e}")))?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_slice())
            .map_err(|e| AuthError::CryptoError(format!("Encryption failed: {e}")))?;

        let mut combined = nonce_bytes.to_vec();
        combined.extend_from_slice(&ciphertext);

        Ok(URL_SAFE_NO_PAD.encode(&combined))
    }

    /// Decrypt and deserialize a value produced by [`CryptoEngine::seal`].
    pub fn open<T: DeserializeOwned>(&self, sealed: &str) -> Result<T, AuthError> {
        let combined = URL_SAFE_NO_PAD
            .decode(sealed)
            .map_err(|e| AuthError::CryptoError(format!("Invalid base64: {e}")))?;

        if combined.len() < NONCE_LEN {
            return Err(AuthError::CryptoError("Ciphertext too short".into()));
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|e| AuthError::CryptoError(format!("Decryption failed: {e}")))?;

        serde_json::from_slice(&plaintext)
            .map_err(|e| AuthError::CryptoError(format!("Invalid sealed payload: {e}")))
    }

    /// Sign `value` as JSON. Returns base64url(hmac || payload).
    pub fn sign_state<T: Serialize>(&self, value: &T) -> Result<String, AuthError> {
        let payload = serde_json::to_vec(value)
            .map_err(|e| AuthError::CryptoError(format!("Failed to encode state: {e}")))?;

        let mut mac = new_hmac(&self.hmac_key)?;
        mac.update(&payload);
        let signature = mac.finalize().into_bytes();

        let mut combined = signature.to_vec();
        combined.extend_from_slice(&payload);

        Ok(URL_SAFE_NO_PAD.encode(&combined))
    }

    /// Verify a signed state parameter and decode its payload.
    pub fn verify_state<T: DeserializeOwned>(&self, signed: &str) -> Result<T, AuthError> {
        let combined = URL_SAFE_NO_PAD
            .decode(signed)
            .map_err(|_| AuthError::InvalidState)?;

        if combined.len() < MAC_LEN {
            return Err(AuthError::InvalidState);
        }

        let (signature, payload) = combined.split_at(MAC_LEN);

        let mut mac = new_hmac(&self.hmac_key)?;
        mac.update(payload);
        mac.verify_slice(signature)
            .map_err(|_| AuthError::InvalidState)?;

        serde_json::from_slice(payload).map_err(|_| AuthError::InvalidState)
    }
}

#[cfg(test)]
pub(crate) fn test_engine() -> CryptoEngine {
    let key = STANDARD.encode([0x42u8; 32]);
    let hmac = STANDARD.encode([0x43u8; 32]);
    CryptoEngine::new(&key, &hmac).unwrap()
}
