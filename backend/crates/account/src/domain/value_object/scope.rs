//! Authorization scope carried by a Role and its tokens.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope(String);

impl Scope {
    /// Super administrator
    pub const SUPER_ADMIN: &'static str = "sup";
    pub const STORE: &'static str = "sto";
    pub const CUSTOMER: &'static str = "cus";

    pub fn new(scope: impl Into<String>) -> Result<Self, ValidationError> {
        let scope = scope.into().trim().to_string();
        if scope.is_empty() {
            return Err(ValidationError::InvalidScope);
        }
        Ok(Self(scope))
    }

    pub fn from_db(scope: impl Into<String>) -> Self {
        Self(scope.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_super_admin(&self) -> bool {
        self.0 == Self::SUPER_ADMIN
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
