//! Email Value Object
//!
//! Represents a validated email address.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ValidationError;

/// Longest top-level domain accepted
const TLD_MAX_LENGTH: usize = 10;

/// Email address value object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// Create a new email with validation
    ///
    /// Input is trimmed and lowercased before the format check.
    pub fn new(email: impl Into<String>) -> Result<Self, ValidationError> {
        let email = email.into().trim().to_lowercase();

        if email.is_empty() {
            return Err(ValidationError::EmptyEmail);
        }

        if !Self::is_valid_format(&email) {
            return Err(ValidationError::EmailFormat);
        }

        Ok(Self(email))
    }

    /// `local@domain.tld`
    ///
    /// - local: letters, digits and `._+-`
    /// - domain: starts with a letter or digit, then letters, digits, `.` or `-`
    /// - tld: 2 to 10 letters
    fn is_valid_format(email: &str) -> bool {
        let Some((local, domain)) = email.split_once('@') else {
            return false;
        };

        if local.is_empty()
            || !local
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+' | '-'))
        {
            return false;
        }

        let Some((host, tld)) = domain.rsplit_once('.') else {
            return false;
        };

        if !(2..=TLD_MAX_LENGTH).contains(&tld.len()) || !tld.chars().all(|c| c.is_ascii_alphabetic())
        {
            return false;
        }

        host.starts_with(|c: char| c.is_ascii_alphanumeric())
            && host
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    }

    /// Create from database value (assumed already validated)
    pub fn from_db(email: impl Into<String>) -> Self {
        Self(email.into())
    }

    /// Get the email as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to string for database storage
    pub fn into_db(self) -> String {
        self.0
    }
}

impl FromStr for Email {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Email::new(s)
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_valid() {
        assert!(Email::new("a@b.com").is_ok());
        assert!(Email::new("user.name@example.co.id").is_ok());
        assert!(Email::new("user+tag@mail-server.com").is_ok());
        assert!(Email::new("  padded@example.org  ").is_ok());
    }

    #[test]
    fn test_email_empty() {
        assert_eq!(Email::new(""), Err(ValidationError::EmptyEmail));
        assert_eq!(Email::new("   "), Err(ValidationError::EmptyEmail));
    }

    #[test]
    fn test_email_invalid_format() {
        for bad in [
            "userexample.com",
            "user@",
            "@example.com",
            "user@@example.com",
            "user@example",
            "user@.com",
            "user@-ab.com",
            "user@example.c",
            "user@example.abcdefghijk",
            "user@example.c0m",
            "us er@example.com",
        ] {
            assert_eq!(Email::new(bad), Err(ValidationError::EmailFormat), "{bad}");
        }
    }

    #[test]
    fn test_email_case_normalization() {
        let email = Email::new("User@Example.COM").unwrap();
        assert_eq!(email.as_str(), "user@example.com");
    }

    #[test]
    fn test_email_serializes_as_string() {
        let email = Email::new("a@b.com").unwrap();
        assert_eq!(serde_json::to_string(&email).unwrap(), "\"a@b.com\"");
    }
}
