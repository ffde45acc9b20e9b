//! Response envelope
//!
//! Success: `{ "status_code", "data", "pagination"? }`, or the token fields
//! at top level for `/oauth2`. Failure: the `AppError` envelope with the
//! request's `transaction_info`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::app_error::RequestInfo;
use kernel::pagination::Pagination;
use serde::Serialize;

use crate::error::AccountError;

/// `{ "data": ... }`
#[derive(Debug, Serialize)]
pub struct Data<T> {
    pub data: T,
}

impl<T> Data<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// `{ "data": [...], "pagination": ... }`
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

/// Successful response; `body` is flattened next to `status_code`
#[derive(Debug)]
pub struct ApiResponse<T> {
    status: StatusCode,
    body: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(body: T) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    pub fn created(body: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            body,
        }
    }
}

#[derive(Serialize)]
struct Envelope<B> {
    status_code: u16,
    #[serde(flatten)]
    body: B,
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let envelope = Envelope {
            status_code: self.status.as_u16(),
            body: self.body,
        };
        (self.status, Json(envelope)).into_response()
    }
}

/// Failed response carrying the request it answers
#[derive(Debug)]
pub struct ApiError {
    request: RequestInfo,
    error: AccountError,
}

impl ApiError {
    pub fn new(request: RequestInfo, error: AccountError) -> Self {
        Self { request, error }
    }

    pub fn error(&self) -> &AccountError {
        &self.error
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.error.log();
        self.error
            .to_app_error()
            .with_request(self.request)
            .into_response()
    }
}
