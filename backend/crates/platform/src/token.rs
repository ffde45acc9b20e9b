//! Bearer Token Signing
//!
//! HMAC-SHA512 signed JWTs carrying `{id, username, exp, scope}`.

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind as JwtErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Token type reported to clients
pub const TOKEN_TYPE_BEARER: &str = "Bearer";

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account identity
    pub id: i64,
    /// Account email
    pub username: String,
    /// Expiry (unix seconds)
    pub exp: i64,
    /// Scope of the role the token was issued for
    pub scope: String,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token signing failed: {0}")]
    Signing(jsonwebtoken::errors::Error),

    #[error("Token expired")]
    Expired,

    #[error("Invalid token: {0}")]
    Invalid(jsonwebtoken::errors::Error),
}

/// Signs and verifies HS512 tokens with a shared secret
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenSigner {
    pub fn hs512(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS512);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS512), claims, &self.encoding).map_err(TokenError::Signing)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                JwtErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e),
            })
    }
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("algorithm", &"HS512")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64
    }

    fn claims(exp: i64) -> Claims {
        Claims {
            id: 1,
            username: "a@b.com".into(),
            exp,
            scope: "sup".into(),
        }
    }

    #[test]
    fn test_sign_and_verify() {
        let signer = TokenSigner::hs512(b"secret");
        let token = signer.sign(&claims(now() + 60)).unwrap();

        let decoded = signer.verify(&token).unwrap();
        assert_eq!(decoded.username, "a@b.com");
        assert_eq!(decoded.scope, "sup");
    }

    #[test]
    fn test_header_is_hs512() {
        let token = TokenSigner::hs512(b"secret")
            .sign(&claims(now() + 60))
            .unwrap();
        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::HS512);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = TokenSigner::hs512(b"secret")
            .sign(&claims(now() + 60))
            .unwrap();
        let result = TokenSigner::hs512(b"other").verify(&token);
        assert!(matches!(result, Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_expired_rejected() {
        let signer = TokenSigner::hs512(b"secret");
        let token = signer.sign(&claims(now() - 10)).unwrap();
        assert!(matches!(signer.verify(&token), Err(TokenError::Expired)));
    }
}
