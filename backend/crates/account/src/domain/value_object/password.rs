//! Account Password Value Objects
//!
//! Delegates to `platform::password` for cryptographic operations.
//!
//! ## Usage
//! ```rust
//! use account::domain::value_object::password::{PasswordHash, RawPassword};
//!
//! let raw = RawPassword::new("pass1".to_string()).unwrap();
//! let hashed = PasswordHash::from_raw(&raw, None).unwrap();
//! assert!(hashed.verify(&raw, None));
//! ```

use std::fmt;

use platform::password::{ClearTextPassword, HashedPassword, PasswordPolicyError};
use serde::{Deserialize, Serialize};

use crate::error::{AccountError, AccountResult, ValidationError};

// ============================================================================
// Raw Password (User Input)
// ============================================================================

/// Raw password from user input
///
/// Memory is zeroized when dropped.
pub struct RawPassword(ClearTextPassword);

impl RawPassword {
    /// Create a new raw password, enforcing the 5 to 8 character policy
    pub fn new(raw: String) -> Result<Self, ValidationError> {
        let clear_text = ClearTextPassword::new(raw).map_err(|e| match e {
            PasswordPolicyError::Empty => ValidationError::EmptyPassword,
            PasswordPolicyError::TooShort { .. } => ValidationError::MinimumPassword,
            PasswordPolicyError::TooLong { .. } => ValidationError::MaximumPassword,
        })?;

        Ok(Self(clear_text))
    }

    /// Validate a password together with its confirmation
    pub fn confirmed(password: String, confirmation: String) -> Result<Self, ValidationError> {
        let password = Self::new(password)?;
        let confirmation =
            Self::new(confirmation).map_err(|_| ValidationError::PasswordConfirmation)?;

        if !password.0.matches(&confirmation.0) {
            return Err(ValidationError::PasswordConfirmation);
        }

        Ok(password)
    }
}

impl fmt::Debug for RawPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawPassword").field(&"[REDACTED]").finish()
    }
}

// ============================================================================
// Password Hash (stored)
// ============================================================================

/// Argon2id PHC string as stored in the `password` column
///
/// Serialized as the bare string so cached accounts carry the hash the
/// verification flow needs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn from_raw(raw: &RawPassword, pepper: Option<&[u8]>) -> AccountResult<Self> {
        let hashed = raw
            .0
            .hash(pepper)
            .map_err(|e| AccountError::Internal(e.to_string()))?;

        Ok(Self(hashed.as_phc_string().to_string()))
    }

    /// Create from database value
    pub fn from_db(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Verify a raw password against this hash; a malformed hash never matches
    pub fn verify(&self, raw: &RawPassword, pepper: Option<&[u8]>) -> bool {
        match HashedPassword::from_phc_string(self.0.as_str()) {
            Ok(hashed) => hashed.verify(&raw.0, pepper),
            Err(_) => false,
        }
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PasswordHash").field(&"[HASH]").finish()
    }
}
