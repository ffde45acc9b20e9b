//! AccountRole Entity
//!
//! Membership join between an account and a role.

use kernel::audit::Audit;
use serde::{Deserialize, Serialize};

use crate::domain::filter::AccountRoleFilter;
use crate::domain::repository::Entity;
use crate::domain::value_object::{AccountId, AccountRoleId, RoleId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRole {
    pub id: AccountRoleId,
    pub account_id: AccountId,
    pub role_id: RoleId,
    pub audit: Audit,
}

impl AccountRole {
    pub fn new(account_id: AccountId, role_id: RoleId, created_by: i64) -> Self {
        Self {
            id: AccountRoleId::unassigned(),
            account_id,
            role_id,
            audit: Audit::created(created_by),
        }
    }
}

impl Entity for AccountRole {
    type Filter = AccountRoleFilter;

    const NAME: &'static str = "AccountRole";
    const SORTABLE_FIELDS: &'static [&'static str] =
        &["id", "account_id", "role_id", "created_at", "updated_at"];

    fn id(&self) -> i64 {
        self.id.value()
    }

    fn assign_id(&mut self, id: i64) {
        self.id = AccountRoleId::new(id);
    }

    fn audit(&self) -> &Audit {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut Audit {
        &mut self.audit
    }
}
