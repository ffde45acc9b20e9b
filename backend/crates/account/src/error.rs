//! Account Error Types
//!
//! Account-specific error variants carrying the service's stable numeric
//! codes and bilingual messages. Every variant renders through
//! `kernel::error::AppError`.

use std::error::Error;

use axum::response::{IntoResponse, Response};
use derive_more::Display;
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::cache::CacheError;
use thiserror::Error;

/// Account-specific result type alias
pub type AccountResult<T> = Result<T, AccountError>;

/// Store operation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum StoreOp {
    #[display("transaction")]
    Transaction,
    #[display("commit")]
    Commit,
    #[display("rollback")]
    Rollback,
    #[display("insert")]
    Insert,
    #[display("update")]
    Update,
    #[display("delete")]
    Delete,
    #[display("get")]
    Get,
}

impl StoreOp {
    pub const fn code(&self) -> u32 {
        match self {
            StoreOp::Transaction => 40001,
            StoreOp::Commit => 40002,
            StoreOp::Rollback => 40003,
            StoreOp::Insert => 40004,
            StoreOp::Update => 40005,
            StoreOp::Delete => 40006,
            StoreOp::Get => 40007,
        }
    }

    fn messages(&self) -> (&'static str, &'static str) {
        match self {
            StoreOp::Transaction | StoreOp::Commit | StoreOp::Rollback | StoreOp::Insert => (
                "Terdapat kesalahan dalam pembuatan data!",
                "There was an error in creating the data",
            ),
            StoreOp::Update => (
                "Terdapat kesalahan dalam mengubah data!",
                "There was an error in updating the data",
            ),
            StoreOp::Delete => (
                "Terdapat kesalahan dalam menghapus data!",
                "There was an error in deleting the data",
            ),
            StoreOp::Get => (
                "Terdapat kesalahan dalam pengambilan data!",
                "There was an error in get data!",
            ),
        }
    }
}

/// Input validation failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("name should not be empty")]
    EmptyName,

    #[error("email should not be empty")]
    EmptyEmail,

    #[error("wrong email format")]
    EmailFormat,

    #[error("password should not be empty")]
    EmptyPassword,

    #[error("password is shorter than the minimum length")]
    MinimumPassword,

    #[error("password is longer than the maximum length")]
    MaximumPassword,

    #[error("password and confirmation do not match")]
    PasswordConfirmation,

    #[error("invalid scope")]
    InvalidScope,

    #[error("client id and client secret should not be empty")]
    EmptyClientCredentials,
}

impl ValidationError {
    pub const fn code(&self) -> u32 {
        match self {
            ValidationError::EmptyName => 40008,
            ValidationError::EmptyEmail => 40009,
            ValidationError::EmailFormat => 40010,
            ValidationError::EmptyPassword => 40011,
            ValidationError::MinimumPassword => 40012,
            ValidationError::MaximumPassword => 40013,
            ValidationError::PasswordConfirmation => 40014,
            ValidationError::InvalidScope => 40016,
            ValidationError::EmptyClientCredentials => 40017,
        }
    }

    fn messages(&self) -> (&'static str, &'static str) {
        match self {
            ValidationError::EmptyName => ("Nama tidak boleh kosong!", "Name should not be empty!"),
            ValidationError::EmptyEmail => {
                ("Email tidak boleh kosong!", "Email should not be empty!")
            }
            ValidationError::EmailFormat => ("Format email salah!", "Wrong email format!"),
            ValidationError::EmptyPassword => (
                "Kata sandi tidak boleh kosong!",
                "Password should not be empty!",
            ),
            ValidationError::MinimumPassword => (
                "Kata sandi minimal 5 karakter!",
                "Minimum password is 5 character!",
            ),
            ValidationError::MaximumPassword => (
                "Kata sandi maksimal 8 karakter!",
                "Maximum password is 8 character!",
            ),
            ValidationError::PasswordConfirmation => (
                "Kata sandi dan konfirmasi kata sandi tidak sama!",
                "Password and password confirmation doesn't match!",
            ),
            ValidationError::InvalidScope => ("Scope tidak valid", "Invalid scope!"),
            ValidationError::EmptyClientCredentials => (
                "Client ID/Client Secret harus diisi!",
                "Client ID/Client Secret should not be empty",
            ),
        }
    }
}

/// Account-specific error variants
#[derive(Debug, Error)]
pub enum AccountError {
    /// Malformed input (bad query, unknown sort field, undecodable body)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Field validation failure
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Credential or membership failure, deliberately coarse
    #[error("Access not authorized")]
    NotAuthorized,

    /// Valid token whose scope may not use the operation
    #[error("Access forbidden for scope")]
    Forbidden,

    #[error("Data not found")]
    NotFound,

    /// Wrong password once client, account and membership are established
    #[error("Wrong password")]
    PasswordMismatch,

    #[error("Store {op} failed: {source}")]
    Store {
        op: StoreOp,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },

    /// Cache backend or (de)serialization failure, never a miss
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AccountError {
    pub fn store(op: StoreOp, source: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        AccountError::Store {
            op,
            source: source.into(),
        }
    }

    /// Stable service code
    pub fn code(&self) -> u32 {
        match self {
            AccountError::BadRequest(_) => 40000,
            AccountError::Validation(v) => v.code(),
            AccountError::NotAuthorized => 401000,
            AccountError::Forbidden => 403000,
            AccountError::NotFound => 404000,
            AccountError::PasswordMismatch => 40015,
            AccountError::Store { op, .. } => op.code(),
            AccountError::Cache(_) => 50001,
            AccountError::Internal(_) => 50002,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AccountError::BadRequest(_)
            | AccountError::Validation(_)
            | AccountError::Store { .. } => ErrorKind::BadRequest,
            AccountError::NotAuthorized | AccountError::PasswordMismatch => {
                ErrorKind::Unauthorized
            }
            AccountError::Forbidden => ErrorKind::Forbidden,
            AccountError::NotFound => ErrorKind::NotFound,
            AccountError::Cache(_) => ErrorKind::ServiceUnavailable,
            AccountError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Primary message and its English translation
    pub fn messages(&self) -> (&'static str, &'static str) {
        match self {
            AccountError::BadRequest(_) => (
                "Kesalahan input. Silakan cek kembali masukan anda!",
                "Invalid input. Please validate your input!",
            ),
            AccountError::Validation(v) => v.messages(),
            AccountError::NotAuthorized => (
                "Akses tidak diijinkan! Silakan login kembali!",
                "Access not authorized! Please login again!",
            ),
            AccountError::Forbidden => (
                "Akses tidak diijinkan untuk scope ini!",
                "Access forbidden for this scope!",
            ),
            AccountError::NotFound => ("Data tidak ditemukan!", "Data not found!"),
            AccountError::PasswordMismatch => ("Kata sandi salah!", "Wrong password!"),
            AccountError::Store { op, .. } => op.messages(),
            AccountError::Cache(_) => (
                "Terdapat kesalahan pada cache!",
                "There was an error in the cache!",
            ),
            AccountError::Internal(_) => (
                "Terdapat kesalahan pada server!",
                "Internal server error!",
            ),
        }
    }

    /// Developer-facing cause echoed in `transaction_info.cause`
    ///
    /// Driver messages never reach the client; they are logged instead.
    fn cause(&self) -> Option<String> {
        match self {
            AccountError::BadRequest(detail) => Some(detail.clone()),
            AccountError::Validation(v) => Some(v.to_string()),
            AccountError::Store { op, .. } => Some(format!("error {op} data")),
            AccountError::Cache(_) => Some("cache unavailable".to_string()),
            _ => None,
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        let (message, translation) = self.messages();
        let err = AppError::new(self.kind(), message)
            .with_code(self.code())
            .with_translation(translation);

        match self.cause() {
            Some(cause) => err.with_cause(cause),
            None => err,
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            AccountError::Store { op, source } => {
                tracing::error!(op = %op, error = %source, "Account store error");
            }
            AccountError::Cache(e) => {
                tracing::error!(error = %e, "Account cache error");
            }
            AccountError::Internal(msg) => {
                tracing::error!(message = %msg, "Account internal error");
            }
            AccountError::NotAuthorized | AccountError::PasswordMismatch => {
                tracing::warn!(code = self.code(), "Unauthorized request");
            }
            AccountError::Forbidden => {
                tracing::warn!("Request rejected by scope gate");
            }
            _ => {
                tracing::debug!(error = %self, "Account error");
            }
        }
    }
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(AccountError::BadRequest("x".into()).code(), 40000);
        assert_eq!(AccountError::store(StoreOp::Transaction, "x").code(), 40001);
        assert_eq!(AccountError::store(StoreOp::Get, "x").code(), 40007);
        assert_eq!(AccountError::from(ValidationError::EmptyName).code(), 40008);
        assert_eq!(AccountError::from(ValidationError::MaximumPassword).code(), 40013);
        assert_eq!(AccountError::PasswordMismatch.code(), 40015);
        assert_eq!(
            AccountError::from(ValidationError::EmptyClientCredentials).code(),
            40017
        );
        assert_eq!(AccountError::NotAuthorized.code(), 401000);
        assert_eq!(AccountError::NotFound.code(), 404000);
    }

    #[test]
    fn test_password_mismatch_is_unauthorized() {
        let app = AccountError::PasswordMismatch.to_app_error();
        assert_eq!(app.status_code(), 401);
        assert_eq!(app.code(), 40015);
        assert_eq!(app.translation(), Some("Wrong password!"));
    }

    #[test]
    fn test_store_cause_hides_driver_message() {
        let app = AccountError::store(StoreOp::Insert, "duplicate key value").to_app_error();
        assert_eq!(app.code(), 40004);
        assert_eq!(app.cause(), Some("error insert data"));
    }

    #[test]
    fn test_cache_error_is_service_unavailable() {
        let err = AccountError::from(CacheError::Backend("down".into()));
        assert_eq!(err.code(), 50001);
        assert_eq!(err.to_app_error().status_code(), 503);
    }
}
