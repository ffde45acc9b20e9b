//! Account Use Cases
//!
//! Registration, administration and self-service of accounts.

use std::sync::Arc;

use kernel::cache_control::CacheDirective;
use kernel::pagination::Pagination;

use super::{load_live, reload, soft_delete};
use crate::application::config::AccountConfig;
use crate::domain::entity::Account;
use crate::domain::filter::{AccountFilter, ListQuery};
use crate::domain::repository::{EntityFilter, Repository};
use crate::domain::value_object::actor::SELF_REGISTERED;
use crate::domain::value_object::{AccountId, Actor, Email, PasswordHash, RawPassword};
use crate::error::{AccountError, AccountResult, ValidationError};

/// Registration input
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Password change input
pub struct PasswordChange {
    pub password: String,
    pub confirm_password: String,
}

pub(crate) fn validate_name(name: String) -> Result<String, ValidationError> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(name)
}

/// Account use cases
pub struct AccountUseCase<A>
where
    A: Repository<Entity = Account>,
{
    accounts: Arc<A>,
    config: Arc<AccountConfig>,
}

impl<A> AccountUseCase<A>
where
    A: Repository<Entity = Account> + Sync,
{
    pub fn new(accounts: Arc<A>, config: Arc<AccountConfig>) -> Self {
        Self { accounts, config }
    }

    /// Self-registration; the account records itself as nobody's creation
    pub async fn register(&self, input: RegisterInput) -> AccountResult<Account> {
        self.create_as(SELF_REGISTERED, input).await
    }

    /// Account created on behalf of `actor`
    pub async fn create(&self, actor: &Actor, input: RegisterInput) -> AccountResult<Account> {
        self.create_as(actor.audit_id(), input).await
    }

    async fn create_as(&self, created_by: i64, input: RegisterInput) -> AccountResult<Account> {
        let name = validate_name(input.name)?;
        let email = Email::new(input.email)?;
        let password = RawPassword::confirmed(input.password, input.confirm_password)?;
        let hash = PasswordHash::from_raw(&password, self.config.pepper())?;

        let account = self
            .accounts
            .insert(Account::new(name, email, hash, created_by))
            .await?;

        tracing::info!(account_id = account.id.value(), created_by, "Account registered");
        Ok(account)
    }

    /// Listing every account is reserved to super administrators
    pub async fn list(
        &self,
        actor: &Actor,
        directive: CacheDirective,
        query: ListQuery<AccountFilter>,
    ) -> AccountResult<(Vec<Account>, Pagination)> {
        actor.require_super_admin()?;
        self.accounts
            .get_by_param(directive, query)
            .await?
            .into_result()
    }

    pub async fn get_by_id(
        &self,
        actor: &Actor,
        directive: CacheDirective,
        id: AccountId,
    ) -> AccountResult<Account> {
        ensure_self_or_admin(actor, id)?;
        self.accounts
            .get_single_by_param(directive, &AccountFilter::by_id(id.value()))
            .await?
            .into_result()
    }

    /// The actor's own account
    pub async fn current(&self, actor: &Actor, directive: CacheDirective) -> AccountResult<Account> {
        self.get_by_id(actor, directive, actor.id).await
    }

    /// Rename; an unchanged name returns the current record without writing
    pub async fn update_name(
        &self,
        actor: &Actor,
        id: AccountId,
        name: String,
    ) -> AccountResult<Account> {
        ensure_self_or_admin(actor, id)?;
        let name = validate_name(name)?;

        let mut account = load_live(self.accounts.as_ref(), id.value()).await?;
        if !account.rename(name, actor.audit_id()) {
            return Ok(account);
        }

        self.accounts.update(&account).await?;
        reload(self.accounts.as_ref(), id.value()).await
    }

    pub async fn update_password(
        &self,
        actor: &Actor,
        id: AccountId,
        change: PasswordChange,
    ) -> AccountResult<Account> {
        ensure_self_or_admin(actor, id)?;
        let password = RawPassword::confirmed(change.password, change.confirm_password)?;
        let hash = PasswordHash::from_raw(&password, self.config.pepper())?;

        let mut account = load_live(self.accounts.as_ref(), id.value()).await?;
        account.change_password(hash, actor.audit_id());

        self.accounts.update(&account).await?;
        tracing::info!(account_id = id.value(), actor = actor.audit_id(), "Password changed");
        reload(self.accounts.as_ref(), id.value()).await
    }

    /// Soft delete
    pub async fn delete_by_id(&self, actor: &Actor, id: AccountId) -> AccountResult<Account> {
        ensure_self_or_admin(actor, id)?;
        soft_delete(self.accounts.as_ref(), id.value(), actor.audit_id()).await
    }
}

/// Non-administrators may only act on their own account
fn ensure_self_or_admin(actor: &Actor, id: AccountId) -> AccountResult<()> {
    if actor.scope.is_super_admin() || actor.id == id {
        Ok(())
    } else {
        Err(AccountError::Forbidden)
    }
}
