//! Request actor, decoded from the bearer token at the transport boundary.

use super::{ids::AccountId, scope::Scope};
use crate::error::{AccountError, AccountResult};

/// Actor id recorded for self-registration
pub const SELF_REGISTERED: i64 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: AccountId,
    pub scope: Scope,
}

impl Actor {
    pub fn new(id: AccountId, scope: Scope) -> Self {
        Self { id, scope }
    }

    /// Raw id written into audit columns
    pub fn audit_id(&self) -> i64 {
        self.id.value()
    }

    /// Scope gate for privileged operations
    pub fn require_super_admin(&self) -> AccountResult<()> {
        if self.scope.is_super_admin() {
            Ok(())
        } else {
            Err(AccountError::Forbidden)
        }
    }
}
