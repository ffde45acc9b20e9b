//! Role Use Cases
//!
//! Management of OAuth2 clients. Every operation is reserved to super
//! administrators.

use std::sync::Arc;

use kernel::cache_control::CacheDirective;
use kernel::pagination::Pagination;
use platform::crypto::SecretCipher;

use super::{load_live, reload, soft_delete};
use crate::application::config::AccountConfig;
use crate::domain::entity::Role;
use crate::domain::filter::{ListQuery, RoleFilter};
use crate::domain::repository::{EntityFilter, Repository};
use crate::domain::value_object::{Actor, EncryptedSecret, RoleId, Scope};
use crate::error::{AccountResult, ValidationError};

/// Role creation input
pub struct CreateRoleInput {
    pub scope: String,
    pub client_id: String,
    pub client_secret: String,
}

/// Role update input; unset fields are left unchanged
#[derive(Default)]
pub struct UpdateRoleInput {
    pub scope: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

fn client_credential(value: String) -> Result<String, ValidationError> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(ValidationError::EmptyClientCredentials);
    }
    Ok(value)
}

/// Role use cases
pub struct RoleUseCase<R>
where
    R: Repository<Entity = Role>,
{
    roles: Arc<R>,
    cipher: SecretCipher,
}

impl<R> RoleUseCase<R>
where
    R: Repository<Entity = Role> + Sync,
{
    pub fn new(roles: Arc<R>, config: Arc<AccountConfig>) -> Self {
        Self {
            roles,
            cipher: config.secret_cipher(),
        }
    }

    pub async fn create(&self, actor: &Actor, input: CreateRoleInput) -> AccountResult<Role> {
        actor.require_super_admin()?;

        let scope = Scope::new(input.scope)?;
        let client_id = client_credential(input.client_id)?;
        let secret = client_credential(input.client_secret)?;
        let sealed = EncryptedSecret::seal(&self.cipher, &secret)?;

        let role = self
            .roles
            .insert(Role::new(scope, client_id, sealed, actor.audit_id()))
            .await?;

        tracing::info!(role_id = role.id.value(), scope = %role.scope, "Role created");
        Ok(role)
    }

    pub async fn list(
        &self,
        actor: &Actor,
        directive: CacheDirective,
        query: ListQuery<RoleFilter>,
    ) -> AccountResult<(Vec<Role>, Pagination)> {
        actor.require_super_admin()?;
        self.roles.get_by_param(directive, query).await?.into_result()
    }

    pub async fn get_by_id(
        &self,
        actor: &Actor,
        directive: CacheDirective,
        id: RoleId,
    ) -> AccountResult<Role> {
        actor.require_super_admin()?;
        self.roles
            .get_single_by_param(directive, &RoleFilter::by_id(id.value()))
            .await?
            .into_result()
    }

    /// Apply the supplied fields; a new secret is encrypted again
    pub async fn update_by_id(
        &self,
        actor: &Actor,
        id: RoleId,
        input: UpdateRoleInput,
    ) -> AccountResult<Role> {
        actor.require_super_admin()?;

        let scope = input.scope.map(Scope::new).transpose()?;
        let client_id = input.client_id.map(client_credential).transpose()?;
        let sealed = match input.client_secret {
            Some(secret) => Some(EncryptedSecret::seal(
                &self.cipher,
                &client_credential(secret)?,
            )?),
            None => None,
        };

        let mut role = load_live(self.roles.as_ref(), id.value()).await?;
        if !role.apply(scope, client_id, sealed, actor.audit_id()) {
            return Ok(role);
        }

        self.roles.update(&role).await?;
        reload(self.roles.as_ref(), id.value()).await
    }

    /// Soft delete
    pub async fn delete_by_id(&self, actor: &Actor, id: RoleId) -> AccountResult<Role> {
        actor.require_super_admin()?;
        soft_delete(self.roles.as_ref(), id.value(), actor.audit_id()).await
    }
}
