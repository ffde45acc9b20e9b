//! HTTP Handlers
//!
//! Thin adapters: decode the request, call a use case with the actor taken
//! from the bearer token, wrap the result in the response envelope.

use std::sync::Arc;

use axum::{
    Extension, Form, Json,
    extract::{FromRequest, Path, Query, Request, State, rejection::JsonRejection},
    http::{HeaderMap, header::AUTHORIZATION, header::CONTENT_TYPE},
};
use platform::crypto::from_base64;
use platform::token::TokenSigner;

use super::dto::*;
use super::extract::{CacheControl, RequestMeta, accepted};
use super::response::{ApiError, ApiResponse, Data, Page};
use crate::application::account::AccountUseCase;
use crate::application::account_role::AccountRoleUseCase;
use crate::application::config::AccountConfig;
use crate::application::issue_token::{IssueTokenUseCase, LoginInput};
use crate::application::role::RoleUseCase;
use crate::domain::entity::Auth;
use crate::domain::repository::RepositorySet;
use crate::domain::value_object::{AccountId, AccountRoleId, Actor, RoleId};
use crate::error::{AccountResult, ValidationError};

type Handled<T> = Result<ApiResponse<T>, ApiError>;

// ============================================================================
// State
// ============================================================================

/// Shared state of the account router
pub struct AccountAppState<R: RepositorySet> {
    pub accounts: Arc<R::Accounts>,
    pub roles: Arc<R::Roles>,
    pub account_roles: Arc<R::AccountRoles>,
    pub config: Arc<AccountConfig>,
    pub signer: Arc<TokenSigner>,
}

impl<R: RepositorySet> Clone for AccountAppState<R> {
    fn clone(&self) -> Self {
        Self {
            accounts: Arc::clone(&self.accounts),
            roles: Arc::clone(&self.roles),
            account_roles: Arc::clone(&self.account_roles),
            config: Arc::clone(&self.config),
            signer: Arc::clone(&self.signer),
        }
    }
}

impl<R: RepositorySet> AccountAppState<R> {
    pub fn new(
        accounts: R::Accounts,
        roles: R::Roles,
        account_roles: R::AccountRoles,
        config: AccountConfig,
    ) -> Self {
        Self {
            accounts: Arc::new(accounts),
            roles: Arc::new(roles),
            account_roles: Arc::new(account_roles),
            signer: Arc::new(config.token_signer()),
            config: Arc::new(config),
        }
    }

    fn account_use_case(&self) -> AccountUseCase<R::Accounts> {
        AccountUseCase::new(self.accounts.clone(), self.config.clone())
    }

    fn role_use_case(&self) -> RoleUseCase<R::Roles> {
        RoleUseCase::new(self.roles.clone(), self.config.clone())
    }

    fn account_role_use_case(&self) -> AccountRoleUseCase<R::AccountRoles, R::Accounts, R::Roles> {
        AccountRoleUseCase::new(
            self.account_roles.clone(),
            self.accounts.clone(),
            self.roles.clone(),
        )
    }

    fn issue_token_use_case(&self) -> IssueTokenUseCase<R::Accounts, R::Roles, R::AccountRoles> {
        IssueTokenUseCase::new(
            self.accounts.clone(),
            self.roles.clone(),
            self.account_roles.clone(),
            self.config.clone(),
        )
    }
}

// ============================================================================
// Oauth2
// ============================================================================

/// Client credentials: HTTP Basic, else `client_id` / `client_secret` headers
fn client_credentials(headers: &HeaderMap) -> AccountResult<(String, String)> {
    let (client_id, client_secret) = basic_credentials(headers).unwrap_or_else(|| {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string()
        };
        (header("client_id"), header("client_secret"))
    });

    if client_id.trim().is_empty() || client_secret.trim().is_empty() {
        return Err(ValidationError::EmptyClientCredentials.into());
    }
    Ok((client_id, client_secret))
}

fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = String::from_utf8(from_base64(encoded.trim()).ok()?).ok()?;
    let (client_id, client_secret) = decoded.split_once(':')?;
    Some((client_id.to_string(), client_secret.to_string()))
}

/// Login body, form-encoded or JSON depending on `Content-Type`
async fn login_body(req: Request) -> AccountResult<LoginRequest> {
    let is_form = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

    if is_form {
        let Form(body) = accepted(Form::<LoginRequest>::from_request(req, &()).await)?;
        Ok(body)
    } else {
        let Json(body) = accepted(Json::<LoginRequest>::from_request(req, &()).await)?;
        Ok(body)
    }
}

/// POST /api/oauth2
///
/// Password grant; the token fields are the top level of the response.
pub async fn oauth2<R: RepositorySet>(
    State(state): State<AccountAppState<R>>,
    meta: RequestMeta,
    req: Request,
) -> Handled<Auth> {
    meta.run(async {
        let (client_id, client_secret) = client_credentials(req.headers())?;
        let body = login_body(req).await?;

        let auth = state
            .issue_token_use_case()
            .execute(LoginInput {
                email: body.username,
                password: body.password,
                client_id,
                client_secret,
            })
            .await?;
        Ok(ApiResponse::ok(auth))
    })
    .await
}

// ============================================================================
// Registration
// ============================================================================

/// POST /api/register
pub async fn register<R: RepositorySet>(
    State(state): State<AccountAppState<R>>,
    meta: RequestMeta,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Handled<Data<AccountView>> {
    meta.run(async {
        let Json(body) = accepted(body)?;
        let account = state.account_use_case().register(body.into()).await?;
        Ok(ApiResponse::created(Data::new(account.into())))
    })
    .await
}

// ============================================================================
// Me
// ============================================================================

/// GET /api/me
pub async fn me<R: RepositorySet>(
    State(state): State<AccountAppState<R>>,
    meta: RequestMeta,
    CacheControl(directive): CacheControl,
    Extension(actor): Extension<Actor>,
) -> Handled<Data<AccountView>> {
    meta.run(async {
        let account = state.account_use_case().current(&actor, directive).await?;
        Ok(ApiResponse::ok(Data::new(account.into())))
    })
    .await
}

/// PUT /api/me
pub async fn update_me<R: RepositorySet>(
    State(state): State<AccountAppState<R>>,
    meta: RequestMeta,
    Extension(actor): Extension<Actor>,
    body: Result<Json<UpdateAccountRequest>, JsonRejection>,
) -> Handled<Data<AccountView>> {
    meta.run(async {
        let Json(body) = accepted(body)?;
        let account = state
            .account_use_case()
            .update_name(&actor, actor.id, body.name)
            .await?;
        Ok(ApiResponse::ok(Data::new(account.into())))
    })
    .await
}

/// PUT /api/me/password
pub async fn update_my_password<R: RepositorySet>(
    State(state): State<AccountAppState<R>>,
    meta: RequestMeta,
    Extension(actor): Extension<Actor>,
    body: Result<Json<UpdatePasswordRequest>, JsonRejection>,
) -> Handled<Data<AccountView>> {
    meta.run(async {
        let Json(body) = accepted(body)?;
        let account = state
            .account_use_case()
            .update_password(&actor, actor.id, body.into())
            .await?;
        Ok(ApiResponse::ok(Data::new(account.into())))
    })
    .await
}

// ============================================================================
// Account
// ============================================================================

/// POST /api/account
pub async fn create_account<R: RepositorySet>(
    State(state): State<AccountAppState<R>>,
    meta: RequestMeta,
    Extension(actor): Extension<Actor>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Handled<Data<AccountView>> {
    meta.run(async {
        let Json(body) = accepted(body)?;
        let account = state.account_use_case().create(&actor, body.into()).await?;
        Ok(ApiResponse::created(Data::new(account.into())))
    })
    .await
}

/// GET /api/account
pub async fn list_accounts<R: RepositorySet>(
    State(state): State<AccountAppState<R>>,
    meta: RequestMeta,
    CacheControl(directive): CacheControl,
    Extension(actor): Extension<Actor>,
    params: Result<Query<AccountListParams>, axum::extract::rejection::QueryRejection>,
) -> Handled<Page<AccountView>> {
    meta.run(async {
        let Query(params) = accepted(params)?;
        let (accounts, pagination) = state
            .account_use_case()
            .list(&actor, directive, params.into())
            .await?;
        Ok(ApiResponse::ok(Page {
            data: accounts.into_iter().map(Into::into).collect(),
            pagination,
        }))
    })
    .await
}

/// GET /api/account/{id}
pub async fn get_account<R: RepositorySet>(
    State(state): State<AccountAppState<R>>,
    meta: RequestMeta,
    CacheControl(directive): CacheControl,
    Extension(actor): Extension<Actor>,
    id: Result<Path<i64>, axum::extract::rejection::PathRejection>,
) -> Handled<Data<AccountView>> {
    meta.run(async {
        let Path(id) = accepted(id)?;
        let account = state
            .account_use_case()
            .get_by_id(&actor, directive, AccountId::new(id))
            .await?;
        Ok(ApiResponse::ok(Data::new(account.into())))
    })
    .await
}

/// PUT /api/account/{id}
pub async fn update_account<R: RepositorySet>(
    State(state): State<AccountAppState<R>>,
    meta: RequestMeta,
    Extension(actor): Extension<Actor>,
    id: Result<Path<i64>, axum::extract::rejection::PathRejection>,
    body: Result<Json<UpdateAccountRequest>, JsonRejection>,
) -> Handled<Data<AccountView>> {
    meta.run(async {
        let Path(id) = accepted(id)?;
        let Json(body) = accepted(body)?;
        let account = state
            .account_use_case()
            .update_name(&actor, AccountId::new(id), body.name)
            .await?;
        Ok(ApiResponse::ok(Data::new(account.into())))
    })
    .await
}

/// PUT /api/account/{id}/password
pub async fn update_account_password<R: RepositorySet>(
    State(state): State<AccountAppState<R>>,
    meta: RequestMeta,
    Extension(actor): Extension<Actor>,
    id: Result<Path<i64>, axum::extract::rejection::PathRejection>,
    body: Result<Json<UpdatePasswordRequest>, JsonRejection>,
) -> Handled<Data<AccountView>> {
    meta.run(async {
        let Path(id) = accepted(id)?;
        let Json(body) = accepted(body)?;
        let account = state
            .account_use_case()
            .update_password(&actor, AccountId::new(id), body.into())
            .await?;
        Ok(ApiResponse::ok(Data::new(account.into())))
    })
    .await
}

/// DELETE /api/account/{id}
pub async fn delete_account<R: RepositorySet>(
    State(state): State<AccountAppState<R>>,
    meta: RequestMeta,
    Extension(actor): Extension<Actor>,
    id: Result<Path<i64>, axum::extract::rejection::PathRejection>,
) -> Handled<Data<AccountView>> {
    meta.run(async {
        let Path(id) = accepted(id)?;
        let account = state
            .account_use_case()
            .delete_by_id(&actor, AccountId::new(id))
            .await?;
        Ok(ApiResponse::ok(Data::new(account.into())))
    })
    .await
}

// ============================================================================
// Role
// ============================================================================

/// POST /api/role
pub async fn create_role<R: RepositorySet>(
    State(state): State<AccountAppState<R>>,
    meta: RequestMeta,
    Extension(actor): Extension<Actor>,
    body: Result<Json<CreateRoleRequest>, JsonRejection>,
) -> Handled<Data<RoleView>> {
    meta.run(async {
        let Json(body) = accepted(body)?;
        let role = state.role_use_case().create(&actor, body.into()).await?;
        Ok(ApiResponse::created(Data::new(role.into())))
    })
    .await
}

/// GET /api/role
pub async fn list_roles<R: RepositorySet>(
    State(state): State<AccountAppState<R>>,
    meta: RequestMeta,
    CacheControl(directive): CacheControl,
    Extension(actor): Extension<Actor>,
    params: Result<Query<RoleListParams>, axum::extract::rejection::QueryRejection>,
) -> Handled<Page<RoleView>> {
    meta.run(async {
        let Query(params) = accepted(params)?;
        let (roles, pagination) = state
            .role_use_case()
            .list(&actor, directive, params.into())
            .await?;
        Ok(ApiResponse::ok(Page {
            data: roles.into_iter().map(Into::into).collect(),
            pagination,
        }))
    })
    .await
}

/// GET /api/role/{id}
pub async fn get_role<R: RepositorySet>(
    State(state): State<AccountAppState<R>>,
    meta: RequestMeta,
    CacheControl(directive): CacheControl,
    Extension(actor): Extension<Actor>,
    id: Result<Path<i64>, axum::extract::rejection::PathRejection>,
) -> Handled<Data<RoleView>> {
    meta.run(async {
        let Path(id) = accepted(id)?;
        let role = state
            .role_use_case()
            .get_by_id(&actor, directive, RoleId::new(id))
            .await?;
        Ok(ApiResponse::ok(Data::new(role.into())))
    })
    .await
}

/// PUT /api/role/{id}
pub async fn update_role<R: RepositorySet>(
    State(state): State<AccountAppState<R>>,
    meta: RequestMeta,
    Extension(actor): Extension<Actor>,
    id: Result<Path<i64>, axum::extract::rejection::PathRejection>,
    body: Result<Json<UpdateRoleRequest>, JsonRejection>,
) -> Handled<Data<RoleView>> {
    meta.run(async {
        let Path(id) = accepted(id)?;
        let Json(body) = accepted(body)?;
        let role = state
            .role_use_case()
            .update_by_id(&actor, RoleId::new(id), body.into())
            .await?;
        Ok(ApiResponse::ok(Data::new(role.into())))
    })
    .await
}

/// DELETE /api/role/{id}
pub async fn delete_role<R: RepositorySet>(
    State(state): State<AccountAppState<R>>,
    meta: RequestMeta,
    Extension(actor): Extension<Actor>,
    id: Result<Path<i64>, axum::extract::rejection::PathRejection>,
) -> Handled<Data<RoleView>> {
    meta.run(async {
        let Path(id) = accepted(id)?;
        let role = state
            .role_use_case()
            .delete_by_id(&actor, RoleId::new(id))
            .await?;
        Ok(ApiResponse::ok(Data::new(role.into())))
    })
    .await
}

// ============================================================================
// AccountRole
// ============================================================================

/// POST /api/account-role
pub async fn create_account_role<R: RepositorySet>(
    State(state): State<AccountAppState<R>>,
    meta: RequestMeta,
    Extension(actor): Extension<Actor>,
    body: Result<Json<CreateAccountRoleRequest>, JsonRejection>,
) -> Handled<Data<AccountRoleView>> {
    meta.run(async {
        let Json(body) = accepted(body)?;
        let account_role = state
            .account_role_use_case()
            .create(
                &actor,
                AccountId::new(body.account_id),
                RoleId::new(body.role_id),
            )
            .await?;
        Ok(ApiResponse::created(Data::new(account_role.into())))
    })
    .await
}

/// GET /api/account-role
pub async fn list_account_roles<R: RepositorySet>(
    State(state): State<AccountAppState<R>>,
    meta: RequestMeta,
    CacheControl(directive): CacheControl,
    Extension(actor): Extension<Actor>,
    params: Result<Query<AccountRoleListParams>, axum::extract::rejection::QueryRejection>,
) -> Handled<Page<AccountRoleView>> {
    meta.run(async {
        let Query(params) = accepted(params)?;
        let (account_roles, pagination) = state
            .account_role_use_case()
            .list(&actor, directive, params.into())
            .await?;
        Ok(ApiResponse::ok(Page {
            data: account_roles.into_iter().map(Into::into).collect(),
            pagination,
        }))
    })
    .await
}

/// GET /api/account-role/{id}
pub async fn get_account_role<R: RepositorySet>(
    State(state): State<AccountAppState<R>>,
    meta: RequestMeta,
    CacheControl(directive): CacheControl,
    Extension(actor): Extension<Actor>,
    id: Result<Path<i64>, axum::extract::rejection::PathRejection>,
) -> Handled<Data<AccountRoleView>> {
    meta.run(async {
        let Path(id) = accepted(id)?;
        let account_role = state
            .account_role_use_case()
            .get_by_id(&actor, directive, AccountRoleId::new(id))
            .await?;
        Ok(ApiResponse::ok(Data::new(account_role.into())))
    })
    .await
}

/// DELETE /api/account-role/{id}
pub async fn delete_account_role<R: RepositorySet>(
    State(state): State<AccountAppState<R>>,
    meta: RequestMeta,
    Extension(actor): Extension<Actor>,
    id: Result<Path<i64>, axum::extract::rejection::PathRejection>,
) -> Handled<Data<AccountRoleView>> {
    meta.run(async {
        let Path(id) = accepted(id)?;
        let account_role = state
            .account_role_use_case()
            .delete_by_id(&actor, AccountRoleId::new(id))
            .await?;
        Ok(ApiResponse::ok(Data::new(account_role.into())))
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AccountError;
    use axum::http::HeaderValue;

    #[test]
    fn test_basic_credentials_take_precedence() {
        let mut headers = HeaderMap::new();
        let encoded = platform::crypto::to_base64(b"c1:s3cret");
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Basic {encoded}")).unwrap(),
        );
        headers.insert("client_id", HeaderValue::from_static("other"));

        let (id, secret) = client_credentials(&headers).unwrap();
        assert_eq!(id, "c1");
        assert_eq!(secret, "s3cret");
    }

    #[test]
    fn test_header_credentials() {
        let mut headers = HeaderMap::new();
        headers.insert("client_id", HeaderValue::from_static("c1"));
        headers.insert("client_secret", HeaderValue::from_static("s"));
        assert_eq!(
            client_credentials(&headers).unwrap(),
            ("c1".to_string(), "s".to_string())
        );
    }

    #[test]
    fn test_missing_credentials() {
        let mut headers = HeaderMap::new();
        headers.insert("client_id", HeaderValue::from_static("c1"));
        assert!(matches!(
            client_credentials(&headers),
            Err(AccountError::Validation(ValidationError::EmptyClientCredentials))
        ));
    }
}
