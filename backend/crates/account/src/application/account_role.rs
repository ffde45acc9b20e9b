//! AccountRole Use Cases
//!
//! Granting roles to accounts.

use std::sync::Arc;

use kernel::cache_control::CacheDirective;
use kernel::pagination::Pagination;

use super::{load_live, soft_delete};
use crate::domain::entity::{Account, AccountRole, Role};
use crate::domain::filter::{AccountRoleFilter, ListQuery};
use crate::domain::repository::{EntityFilter, Repository};
use crate::domain::value_object::{AccountId, AccountRoleId, Actor, RoleId};
use crate::error::{AccountError, AccountResult};

/// AccountRole use cases
pub struct AccountRoleUseCase<M, A, R>
where
    M: Repository<Entity = AccountRole>,
    A: Repository<Entity = Account>,
    R: Repository<Entity = Role>,
{
    account_roles: Arc<M>,
    accounts: Arc<A>,
    roles: Arc<R>,
}

impl<M, A, R> AccountRoleUseCase<M, A, R>
where
    M: Repository<Entity = AccountRole> + Sync,
    A: Repository<Entity = Account> + Sync,
    R: Repository<Entity = Role> + Sync,
{
    pub fn new(account_roles: Arc<M>, accounts: Arc<A>, roles: Arc<R>) -> Self {
        Self {
            account_roles,
            accounts,
            roles,
        }
    }

    /// Grant `role_id` to `account_id`
    ///
    /// Both must be live. Non-administrators may only grant themselves a
    /// role whose scope is not super administrator.
    pub async fn create(
        &self,
        actor: &Actor,
        account_id: AccountId,
        role_id: RoleId,
    ) -> AccountResult<AccountRole> {
        let account = load_live(self.accounts.as_ref(), account_id.value()).await?;
        let role = load_live(self.roles.as_ref(), role_id.value()).await?;

        if !actor.scope.is_super_admin() && (account.id != actor.id || role.scope.is_super_admin())
        {
            return Err(AccountError::Forbidden);
        }

        let membership = AccountRoleFilter::membership(account.id, role.id);
        match self
            .account_roles
            .get_single_by_param(CacheDirective::MustRevalidate, &membership)
            .await
        {
            Ok(_) => {
                return Err(AccountError::BadRequest(
                    "account already holds this role".to_string(),
                ));
            }
            Err(AccountError::NotFound) => {}
            Err(err) => return Err(err),
        }

        let granted = self
            .account_roles
            .insert(AccountRole::new(account.id, role.id, actor.audit_id()))
            .await?;

        tracing::info!(
            account_role_id = granted.id.value(),
            account_id = account.id.value(),
            role_id = role.id.value(),
            "Role granted"
        );
        Ok(granted)
    }

    pub async fn list(
        &self,
        actor: &Actor,
        directive: CacheDirective,
        query: ListQuery<AccountRoleFilter>,
    ) -> AccountResult<(Vec<AccountRole>, Pagination)> {
        actor.require_super_admin()?;
        self.account_roles
            .get_by_param(directive, query)
            .await?
            .into_result()
    }

    pub async fn get_by_id(
        &self,
        actor: &Actor,
        directive: CacheDirective,
        id: AccountRoleId,
    ) -> AccountResult<AccountRole> {
        actor.require_super_admin()?;
        self.account_roles
            .get_single_by_param(directive, &AccountRoleFilter::by_id(id.value()))
            .await?
            .into_result()
    }

    /// Soft delete
    pub async fn delete_by_id(
        &self,
        actor: &Actor,
        id: AccountRoleId,
    ) -> AccountResult<AccountRole> {
        actor.require_super_admin()?;
        soft_delete(self.account_roles.as_ref(), id.value(), actor.audit_id()).await
    }
}
