//! Issue Token Use Case
//!
//! Password grant for an OAuth2 client. Verification runs in a fixed
//! order and never reads from cache:
//!
//! 1. validate the login fields
//! 2. resolve the role by client id
//! 3. compare the client secret
//! 4. resolve the account by email
//! 5. resolve the account's membership in the role
//! 6. verify the password
//! 7. sign the token
//!
//! Stages 2 to 5 all fail with [`AccountError::NotAuthorized`] so a caller
//! cannot tell an unknown client from a wrong secret, an unknown account
//! or a missing membership. Only stage 6 reports its own reason.

use std::sync::Arc;

use chrono::Utc;
use kernel::cache_control::CacheDirective;
use platform::crypto::SecretCipher;
use platform::token::{Claims, TOKEN_TYPE_BEARER, TokenSigner};

use crate::application::config::AccountConfig;
use crate::domain::entity::{Account, AccountRole, Auth, Role};
use crate::domain::filter::{AccountFilter, AccountRoleFilter, RoleFilter};
use crate::domain::repository::Repository;
use crate::domain::value_object::{Email, RawPassword};
use crate::error::{AccountError, AccountResult};

/// Login input
pub struct LoginInput {
    pub email: String,
    pub password: String,
    pub client_id: String,
    pub client_secret: String,
}

/// Collapse "absent" into the flow's single ambiguous failure
fn unauthorized(stage: &'static str) -> impl FnOnce(AccountError) -> AccountError {
    move |err| match err {
        AccountError::NotFound => {
            tracing::warn!(stage, "Credential verification failed");
            AccountError::NotAuthorized
        }
        other => other,
    }
}

/// Issue token use case
pub struct IssueTokenUseCase<A, R, M>
where
    A: Repository<Entity = Account>,
    R: Repository<Entity = Role>,
    M: Repository<Entity = AccountRole>,
{
    accounts: Arc<A>,
    roles: Arc<R>,
    account_roles: Arc<M>,
    config: Arc<AccountConfig>,
    signer: TokenSigner,
    cipher: SecretCipher,
}

impl<A, R, M> IssueTokenUseCase<A, R, M>
where
    A: Repository<Entity = Account> + Sync,
    R: Repository<Entity = Role> + Sync,
    M: Repository<Entity = AccountRole> + Sync,
{
    pub fn new(
        accounts: Arc<A>,
        roles: Arc<R>,
        account_roles: Arc<M>,
        config: Arc<AccountConfig>,
    ) -> Self {
        Self {
            accounts,
            roles,
            account_roles,
            signer: config.token_signer(),
            cipher: config.secret_cipher(),
            config,
        }
    }

    pub async fn execute(&self, input: LoginInput) -> AccountResult<Auth> {
        // 1. Structural validation
        let email = Email::new(input.email)?;
        let password = RawPassword::new(input.password)?;

        // 2. Role by client id
        let role = self
            .roles
            .get_single_by_param(
                CacheDirective::MustRevalidate,
                &RoleFilter::by_client_id(input.client_id),
            )
            .await
            .map_err(unauthorized("role"))?
            .into_result()?;

        // 3. Client secret
        if !role.client_secret.matches(&self.cipher, &input.client_secret) {
            tracing::warn!(stage = "client_secret", role_id = role.id.value(), "Credential verification failed");
            return Err(AccountError::NotAuthorized);
        }

        // 4. Account by email
        let account = self
            .accounts
            .get_single_by_param(CacheDirective::MustRevalidate, &AccountFilter::by_email(&email))
            .await
            .map_err(unauthorized("account"))?
            .into_result()?;

        // 5. Membership
        self.account_roles
            .get_single_by_param(
                CacheDirective::MustRevalidate,
                &AccountRoleFilter::membership(account.id, role.id),
            )
            .await
            .map_err(unauthorized("membership"))?
            .into_result()?;

        // 6. Password
        if !account.password.verify(&password, self.config.pepper()) {
            tracing::warn!(account_id = account.id.value(), "Password mismatch");
            return Err(AccountError::PasswordMismatch);
        }

        // 7. Token
        let timeout = chrono::Duration::from_std(self.config.token_timeout)
            .map_err(|e| AccountError::Internal(e.to_string()))?;
        let exp = Utc::now() + timeout;

        let claims = Claims {
            id: account.id.value(),
            username: account.email.as_str().to_string(),
            exp: exp.timestamp(),
            scope: role.scope.as_str().to_string(),
        };
        let access_token = self
            .signer
            .sign(&claims)
            .map_err(|e| AccountError::Internal(e.to_string()))?;

        tracing::info!(
            account_id = account.id.value(),
            role_id = role.id.value(),
            scope = %role.scope,
            "Access token issued"
        );

        Ok(Auth {
            access_token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
            exp,
            scope: claims.scope,
        })
    }
}
