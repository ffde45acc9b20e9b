//! HTTP Middleware
//!
//! - `assign_request_id`: gives every request an `X-Request-Id`
//! - `require_bearer`: verifies the bearer token and attaches the [`Actor`]

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, Request, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use platform::token::{TOKEN_TYPE_BEARER, TokenError, TokenSigner};

use super::extract::{REQUEST_ID_HEADER, RequestMeta};
use super::response::ApiError;
use crate::domain::value_object::{AccountId, Actor, Scope};
use crate::error::{AccountError, AccountResult};

// ============================================================================
// Request id
// ============================================================================

/// Keep the caller's request id, or mint one; echo it on the response
pub async fn assign_request_id(mut req: Request<Body>, next: Next) -> Response {
    let request_id = match req.headers().get(REQUEST_ID_HEADER) {
        Some(value) => value.clone(),
        None => {
            let minted = HeaderValue::from_str(&uuid::Uuid::new_v4().to_string());
            match minted {
                Ok(value) => {
                    req.headers_mut().insert(REQUEST_ID_HEADER, value.clone());
                    value
                }
                Err(_) => return next.run(req).await,
            }
        }
    };

    let mut response = next.run(req).await;
    response.headers_mut().insert(REQUEST_ID_HEADER, request_id);
    response
}

// ============================================================================
// Bearer authentication
// ============================================================================

/// Reject requests without a valid bearer token (401000)
pub async fn require_bearer(
    State(signer): State<Arc<TokenSigner>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    match authenticate(&signer, req.headers()) {
        Ok(actor) => {
            req.extensions_mut().insert(actor);
            next.run(req).await
        }
        Err(err) => {
            let meta = RequestMeta::from_parts(req.method(), req.uri(), req.headers());
            ApiError::new(meta.0, err).into_response()
        }
    }
}

fn authenticate(signer: &TokenSigner, headers: &HeaderMap) -> AccountResult<Actor> {
    let token = bearer_token(headers).ok_or(AccountError::NotAuthorized)?;

    let claims = signer.verify(token).map_err(|e| {
        match e {
            TokenError::Expired => tracing::debug!("Bearer token expired"),
            other => tracing::debug!(error = %other, "Bearer token rejected"),
        }
        AccountError::NotAuthorized
    })?;

    Ok(Actor::new(AccountId::new(claims.id), Scope::from_db(claims.scope)))
}

/// Token of an `Authorization: Bearer <token>` header
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case(TOKEN_TYPE_BEARER) && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(authorization: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(authorization).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&headers("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("bearer  abc ")), Some("abc"));
        assert_eq!(bearer_token(&headers("Basic abc")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_authenticate_builds_actor() {
        let signer = TokenSigner::hs512(b"middleware-test-secret");
        let token = signer
            .sign(&platform::token::Claims {
                id: 7,
                username: "a@b.com".into(),
                exp: chrono::Utc::now().timestamp() + 60,
                scope: "sup".into(),
            })
            .unwrap();

        let actor = authenticate(&signer, &headers(&format!("Bearer {token}"))).unwrap();
        assert_eq!(actor.id.value(), 7);
        assert!(actor.scope.is_super_admin());

        let other = TokenSigner::hs512(b"another-secret");
        assert!(matches!(
            authenticate(&other, &headers(&format!("Bearer {token}"))),
            Err(AccountError::NotAuthorized)
        ));
    }
}
