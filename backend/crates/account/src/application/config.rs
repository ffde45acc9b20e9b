//! Application Configuration
//!
//! Configuration for the Account application layer.

use std::time::Duration;

use platform::crypto::{SecretCipher, random_bytes, to_base64};
use platform::token::TokenSigner;

use crate::infra::cache_aside::RepositorySettings;

/// Account application configuration
#[derive(Debug, Clone)]
pub struct AccountConfig {
    /// HS512 signing secret for access tokens
    pub token_secret: Vec<u8>,
    /// Access token lifetime
    pub token_timeout: Duration,
    /// Key the stored client secrets are encrypted with
    pub client_secret_key: String,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    pub accounts: RepositorySettings,
    pub roles: RepositorySettings,
    pub account_roles: RepositorySettings,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            token_secret: Vec::new(),
            token_timeout: Duration::from_secs(3600), // 1 hour
            client_secret_key: String::new(),
            password_pepper: None,
            accounts: RepositorySettings::for_entity("Account"),
            roles: RepositorySettings::for_entity("Role"),
            account_roles: RepositorySettings::for_entity("AccountRole"),
        }
    }
}

impl AccountConfig {
    /// Create config with random token and cipher secrets
    ///
    /// Secrets do not survive a restart: issued tokens and stored client
    /// secrets become unreadable.
    pub fn with_random_secrets() -> Self {
        Self {
            token_secret: random_bytes(64),
            client_secret_key: to_base64(&random_bytes(32)),
            ..Default::default()
        }
    }

    /// Create config for development
    pub fn development() -> Self {
        Self::with_random_secrets()
    }

    pub fn token_signer(&self) -> TokenSigner {
        TokenSigner::hs512(&self.token_secret)
    }

    pub fn secret_cipher(&self) -> SecretCipher {
        SecretCipher::new(&self.client_secret_key)
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AccountConfig::default();
        assert_eq!(config.token_timeout, Duration::from_secs(3600));
        assert_eq!(config.accounts.page_limit, 10);
        assert_eq!(config.roles.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.account_roles.keys.single, "gspAccountRole:");
    }

    #[test]
    fn test_development_secrets_are_random() {
        let a = AccountConfig::development();
        let b = AccountConfig::development();
        assert_eq!(a.token_secret.len(), 64);
        assert_ne!(a.token_secret, b.token_secret);
        assert_ne!(a.client_secret_key, b.client_secret_key);
    }
}
