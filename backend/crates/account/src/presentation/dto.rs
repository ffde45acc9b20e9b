//! API DTOs (Data Transfer Objects)
//!
//! Request bodies default missing fields to empty so validation, not
//! decoding, reports what is missing.

use kernel::audit::Audit;
use kernel::pagination::PageRequest;
use serde::{Deserialize, Serialize};

use crate::application::account::{PasswordChange, RegisterInput};
use crate::application::role::{CreateRoleInput, UpdateRoleInput};
use crate::domain::entity::{Account, AccountRole, Role};
use crate::domain::filter::{AccountFilter, AccountRoleFilter, ListQuery, RoleFilter};

// ============================================================================
// Oauth2
// ============================================================================

/// Password grant body (form or JSON)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    /// Account email
    pub username: String,
    pub password: String,
}

// ============================================================================
// Account
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl From<RegisterRequest> for RegisterInput {
    fn from(req: RegisterRequest) -> Self {
        RegisterInput {
            name: req.name,
            email: req.email,
            password: req.password,
            confirm_password: req.confirm_password,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateAccountRequest {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdatePasswordRequest {
    pub password: String,
    pub confirm_password: String,
}

impl From<UpdatePasswordRequest> for PasswordChange {
    fn from(req: UpdatePasswordRequest) -> Self {
        PasswordChange {
            password: req.password,
            confirm_password: req.confirm_password,
        }
    }
}

/// Account as returned to clients; the password hash never leaves
#[derive(Debug, Clone, Serialize)]
pub struct AccountView {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(flatten)]
    pub audit: Audit,
}

impl From<Account> for AccountView {
    fn from(account: Account) -> Self {
        Self {
            id: account.id.value(),
            name: account.name,
            email: account.email.into_db(),
            audit: account.audit,
        }
    }
}

// ============================================================================
// Role
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateRoleRequest {
    pub scope: String,
    pub client_id: String,
    pub client_secret: String,
}

impl From<CreateRoleRequest> for CreateRoleInput {
    fn from(req: CreateRoleRequest) -> Self {
        CreateRoleInput {
            scope: req.scope,
            client_id: req.client_id,
            client_secret: req.client_secret,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRoleRequest {
    pub scope: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl From<UpdateRoleRequest> for UpdateRoleInput {
    fn from(req: UpdateRoleRequest) -> Self {
        UpdateRoleInput {
            scope: req.scope,
            client_id: req.client_id,
            client_secret: req.client_secret,
        }
    }
}

/// Role as returned to clients; the client secret never leaves
#[derive(Debug, Clone, Serialize)]
pub struct RoleView {
    pub id: i64,
    pub scope: String,
    pub client_id: String,
    #[serde(flatten)]
    pub audit: Audit,
}

impl From<Role> for RoleView {
    fn from(role: Role) -> Self {
        Self {
            id: role.id.value(),
            scope: role.scope.as_str().to_string(),
            client_id: role.client_id,
            audit: role.audit,
        }
    }
}

// ============================================================================
// AccountRole
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAccountRoleRequest {
    pub account_id: i64,
    pub role_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountRoleView {
    pub id: i64,
    pub account_id: i64,
    pub role_id: i64,
    #[serde(flatten)]
    pub audit: Audit,
}

impl From<AccountRole> for AccountRoleView {
    fn from(account_role: AccountRole) -> Self {
        Self {
            id: account_role.id.value(),
            account_id: account_role.account_id.value(),
            role_id: account_role.role_id.value(),
            audit: account_role.audit,
        }
    }
}

// ============================================================================
// List query parameters
// ============================================================================

fn page_request(page: Option<i64>, limit: Option<i64>, order_by: Option<String>) -> PageRequest {
    PageRequest {
        page: page.unwrap_or_default(),
        limit: limit.unwrap_or_default(),
        order_by,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountListParams {
    pub id: Option<i64>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub order_by: Option<String>,
}

impl From<AccountListParams> for ListQuery<AccountFilter> {
    fn from(params: AccountListParams) -> Self {
        ListQuery::new(
            AccountFilter {
                id: params.id,
                // Stored emails are lowercase.
                email: non_empty(params.email).map(|email| email.trim().to_lowercase()),
                name: non_empty(params.name),
            },
            page_request(params.page, params.limit, params.order_by),
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleListParams {
    pub id: Option<i64>,
    pub scope: Option<String>,
    #[serde(alias = "cid")]
    pub client_id: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub order_by: Option<String>,
}

impl From<RoleListParams> for ListQuery<RoleFilter> {
    fn from(params: RoleListParams) -> Self {
        ListQuery::new(
            RoleFilter {
                id: params.id,
                scope: non_empty(params.scope),
                client_id: non_empty(params.client_id),
            },
            page_request(params.page, params.limit, params.order_by),
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountRoleListParams {
    pub id: Option<i64>,
    pub account_id: Option<i64>,
    pub role_id: Option<i64>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub order_by: Option<String>,
}

impl From<AccountRoleListParams> for ListQuery<AccountRoleFilter> {
    fn from(params: AccountRoleListParams) -> Self {
        ListQuery::new(
            AccountRoleFilter {
                id: params.id,
                account_id: params.account_id,
                role_id: params.role_id,
            },
            page_request(params.page, params.limit, params.order_by),
        )
    }
}
