//! Cryptographic Utilities
//!
//! Random bytes, SHA-256, Base64 and the symmetric cipher used to keep
//! client secrets encrypted at rest.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use base64::{Engine, engine::general_purpose};
use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// AES-GCM nonce length in bytes
const NONCE_LEN: usize = 12;

/// Generate cryptographically secure random bytes
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Compute SHA-256 hash
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Encode bytes as base64
pub fn to_base64(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

/// Decode base64 to bytes
pub fn from_base64(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    general_purpose::STANDARD.decode(s)
}

/// Constant-time comparison to prevent timing attacks
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

// ============================================================================
// Secret cipher
// ============================================================================

#[derive(Debug, Error)]
pub enum CipherError {
    #[error("Encryption failed")]
    Encrypt,

    #[error("Decryption failed")]
    Decrypt,

    #[error("Malformed ciphertext: {0}")]
    Malformed(String),
}

/// AES-256-GCM cipher for values stored encrypted (client secrets).
///
/// The 256-bit key is the SHA-256 digest of the configured secret, so any
/// non-empty passphrase can be used. Output is `base64(nonce || ciphertext)`
/// with a fresh random nonce per call.
///
/// ## Examples
/// ```rust
/// use platform::crypto::SecretCipher;
///
/// let cipher = SecretCipher::new("server-side key");
/// let sealed = cipher.encrypt("s3cret").unwrap();
/// assert_eq!(cipher.decrypt(&sealed).unwrap(), "s3cret");
/// ```
#[derive(Clone)]
pub struct SecretCipher {
    cipher: Aes256Gcm,
}

impl SecretCipher {
    pub fn new(secret: &str) -> Self {
        let key = sha256(secret.as_bytes());
        Self {
            cipher: Aes256Gcm::new(&key.into()),
        }
    }

    /// Encrypt a plaintext value
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let nonce_bytes = random_bytes(NONCE_LEN);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| CipherError::Encrypt)?;

        let mut sealed = nonce_bytes;
        sealed.extend_from_slice(&ciphertext);
        Ok(to_base64(&sealed))
    }

    /// Decrypt a value produced by [`SecretCipher::encrypt`]
    pub fn decrypt(&self, sealed: &str) -> Result<String, CipherError> {
        let bytes = from_base64(sealed).map_err(|e| CipherError::Malformed(e.to_string()))?;
        if bytes.len() <= NONCE_LEN {
            return Err(CipherError::Malformed("ciphertext too short".into()));
        }

        let (nonce_bytes, ciphertext) = bytes.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| CipherError::Decrypt)?;

        String::from_utf8(plaintext).map_err(|e| CipherError::Malformed(e.to_string()))
    }

    /// Decrypt `sealed` and compare it with `candidate` in constant time.
    /// Any decryption failure counts as a mismatch.
    pub fn matches(&self, sealed: &str, candidate: &str) -> bool {
        match self.decrypt(sealed) {
            Ok(plain) => constant_time_eq(plain.as_bytes(), candidate.as_bytes()),
            Err(_) => false,
        }
    }
}

impl std::fmt::Debug for SecretCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretCipher").field("key", &"[REDACTED]").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_values() {
        let hash = sha256(b"");
        let expected =
            hex::decode("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
                .unwrap();
        assert_eq!(hash.to_vec(), expected);
    }

    #[test]
    fn test_random_bytes() {
        let bytes = random_bytes(32);
        assert_eq!(bytes.len(), 32);
        assert!(bytes.iter().any(|&b| b != 0));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abcd", b"abcd"));
        assert!(!constant_time_eq(b"abcd", b"abce"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }

    #[test]
    fn test_cipher_roundtrip_uses_fresh_nonce() {
        let cipher = SecretCipher::new("key");
        let a = cipher.encrypt("client-secret").unwrap();
        let b = cipher.encrypt("client-secret").unwrap();

        assert_ne!(a, b);
        assert_eq!(cipher.decrypt(&a).unwrap(), "client-secret");
        assert_eq!(cipher.decrypt(&b).unwrap(), "client-secret");
    }

    #[test]
    fn test_cipher_wrong_key() {
        let sealed = SecretCipher::new("key-a").encrypt("secret").unwrap();
        let other = SecretCipher::new("key-b");

        assert!(matches!(other.decrypt(&sealed), Err(CipherError::Decrypt)));
        assert!(!other.matches(&sealed, "secret"));
    }

    #[test]
    fn test_cipher_matches() {
        let cipher = SecretCipher::new("key");
        let sealed = cipher.encrypt("secret").unwrap();

        assert!(cipher.matches(&sealed, "secret"));
        assert!(!cipher.matches(&sealed, "Secret"));
        assert!(!cipher.matches("not-base64!", "secret"));
        assert!(!cipher.matches(&to_base64(b"short"), "secret"));
    }
}
