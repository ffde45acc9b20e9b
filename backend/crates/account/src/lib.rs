//! Account Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, filters, repository traits
//! - `application/` - Use cases and the credential verification flow
//! - `infra/` - Cache-aside repository, PostgreSQL and in-memory stores
//! - `presentation/` - HTTP handlers, DTOs, router, middleware
//!
//! ## Features
//! - Account registration and self-service (`/me`)
//! - Role (OAuth2 client) and account-role membership management
//! - OAuth2 password grant issuing HS512 bearer tokens
//! - Every entity read goes through one generic cache-aside repository
//!
//! ## Security Model
//! - Passwords hashed with Argon2id
//! - Client secrets stored AES-256-GCM encrypted
//! - Credential verification never reads from cache and reports unknown
//!   client, wrong secret, unknown account and missing membership identically

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::AccountConfig;
pub use error::{AccountError, AccountResult};
pub use infra::PgRepositories;
pub use presentation::router::{account_router, account_router_generic};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::filter::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}
