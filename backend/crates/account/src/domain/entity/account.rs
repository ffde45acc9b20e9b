//! Account Entity
//!
//! A person who can sign in. The password is only ever held hashed.

use kernel::audit::Audit;
use serde::{Deserialize, Serialize};

use crate::domain::filter::AccountFilter;
use crate::domain::repository::Entity;
use crate::domain::value_object::{AccountId, Email, PasswordHash};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    /// Unique among live accounts
    pub email: Email,
    pub password: PasswordHash,
    pub audit: Audit,
}

impl Account {
    /// Create a new, not yet persisted account
    pub fn new(name: String, email: Email, password: PasswordHash, created_by: i64) -> Self {
        Self {
            id: AccountId::unassigned(),
            name,
            email,
            password,
            audit: Audit::created(created_by),
        }
    }

    /// Rename; returns false when the name is unchanged
    pub fn rename(&mut self, name: String, actor: i64) -> bool {
        if self.name == name {
            return false;
        }
        self.name = name;
        self.audit.touch(actor);
        true
    }

    pub fn change_password(&mut self, password: PasswordHash, actor: i64) {
        self.password = password;
        self.audit.touch(actor);
    }
}

impl Entity for Account {
    type Filter = AccountFilter;

    const NAME: &'static str = "Account";
    const SORTABLE_FIELDS: &'static [&'static str] =
        &["id", "name", "email", "created_at", "updated_at"];

    fn id(&self) -> i64 {
        self.id.value()
    }

    fn assign_id(&mut self, id: i64) {
        self.id = AccountId::new(id);
    }

    fn audit(&self) -> &Audit {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut Audit {
        &mut self.audit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Account {
        Account::new(
            "Alice".into(),
            Email::new("a@b.com").unwrap(),
            PasswordHash::from_db("hash"),
            0,
        )
    }

    #[test]
    fn test_new_account_is_unassigned_and_live() {
        let account = account();
        assert!(!account.id.is_assigned());
        assert_eq!(account.audit.created_by, 0);
        assert!(account.audit.is_live());
    }

    #[test]
    fn test_rename() {
        let mut account = account();
        assert!(!account.rename("Alice".into(), 5));
        assert_eq!(account.audit.updated_by, 0);

        assert!(account.rename("Bob".into(), 5));
        assert_eq!(account.name, "Bob");
        assert_eq!(account.audit.updated_by, 5);
    }

    #[test]
    fn test_cache_roundtrip_keeps_hash() {
        let account = account();
        let json = serde_json::to_string(&account).unwrap();
        let back: Account = serde_json::from_str(&json).unwrap();
        assert_eq!(back, account);
    }
}
