//! Request extractors
//!
//! - [`RequestMeta`]: uri, method and request id echoed in error envelopes
//! - [`CacheControl`]: the `Cache-Control` request header as a directive

use std::convert::Infallible;
use std::future::Future;

use axum::extract::FromRequestParts;
use axum::http::header::CACHE_CONTROL;
use axum::http::request::Parts;
use axum::http::{HeaderMap, Method, Uri};
use kernel::cache_control::CacheDirective;
use kernel::error::app_error::RequestInfo;

use super::response::ApiError;
use crate::error::{AccountError, AccountResult};

/// Request id header, assigned by [`super::middleware::assign_request_id`]
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Identity of the request being answered
#[derive(Debug, Clone, Default)]
pub struct RequestMeta(pub RequestInfo);

impl RequestMeta {
    pub fn from_parts(method: &Method, uri: &Uri, headers: &HeaderMap) -> Self {
        let request_id = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        Self(RequestInfo {
            request_uri: uri.path().to_string(),
            request_method: method.as_str().to_string(),
            request_id,
        })
    }

    /// Run a handler body, attaching this request to its failure
    pub async fn run<T>(self, body: impl Future<Output = AccountResult<T>>) -> Result<T, ApiError> {
        body.await.map_err(|error| ApiError::new(self.0, error))
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RequestMeta {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(&parts.method, &parts.uri, &parts.headers))
    }
}

/// Read directive from `Cache-Control`
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheControl(pub CacheDirective);

impl<S: Send + Sync> FromRequestParts<S> for CacheControl {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(CACHE_CONTROL)
            .and_then(|v| v.to_str().ok());
        Ok(Self(CacheDirective::parse(header)))
    }
}

/// Turn an extractor rejection into a `BadRequest`
pub fn accepted<T, E: std::fmt::Display>(extracted: Result<T, E>) -> AccountResult<T> {
    extracted.map_err(|e| AccountError::BadRequest(e.to_string()))
}
