//! Typed identities of the account domain.

use kernel::id::Id;

pub mod markers {
    #[derive(Debug)]
    pub struct Account;
    #[derive(Debug)]
    pub struct Role;
    #[derive(Debug)]
    pub struct AccountRole;
}

pub type AccountId = Id<markers::Account>;
pub type RoleId = Id<markers::Role>;
pub type AccountRoleId = Id<markers::AccountRole>;
