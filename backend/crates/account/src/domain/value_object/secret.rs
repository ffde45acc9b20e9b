//! Client secret as stored: encrypted, never plaintext.

use std::fmt;

use platform::crypto::SecretCipher;
use serde::{Deserialize, Serialize};

use crate::error::{AccountError, AccountResult};

/// `base64(nonce || ciphertext)` produced by [`SecretCipher`]
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedSecret(String);

impl EncryptedSecret {
    pub fn seal(cipher: &SecretCipher, plaintext: &str) -> AccountResult<Self> {
        cipher
            .encrypt(plaintext)
            .map(Self)
            .map_err(|e| AccountError::Internal(e.to_string()))
    }

    pub fn from_db(sealed: impl Into<String>) -> Self {
        Self(sealed.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `candidate` is the sealed plaintext; undecryptable values never match
    pub fn matches(&self, cipher: &SecretCipher, candidate: &str) -> bool {
        cipher.matches(&self.0, candidate)
    }
}

impl fmt::Debug for EncryptedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EncryptedSecret").field(&"[SEALED]").finish()
    }
}
