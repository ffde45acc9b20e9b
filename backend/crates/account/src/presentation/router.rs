//! Account Router

use std::sync::Arc;

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
};
use platform::cache::RedisCache;
use sqlx::PgPool;

use super::handlers::{self, AccountAppState};
use super::middleware::{assign_request_id, require_bearer};
use crate::application::config::AccountConfig;
use crate::domain::repository::RepositorySet;
use crate::infra::{CacheAsideRepository, PgRepositories, PgStore};

/// Router over PostgreSQL and Redis
pub fn account_router(pool: PgPool, cache: RedisCache, config: AccountConfig) -> Router {
    let cache = Arc::new(cache);
    let state = AccountAppState::<PgRepositories>::new(
        CacheAsideRepository::new(
            Arc::new(PgStore::new(pool.clone())),
            cache.clone(),
            config.accounts.clone(),
        ),
        CacheAsideRepository::new(
            Arc::new(PgStore::new(pool.clone())),
            cache.clone(),
            config.roles.clone(),
        ),
        CacheAsideRepository::new(
            Arc::new(PgStore::new(pool)),
            cache,
            config.account_roles.clone(),
        ),
        config,
    );

    account_router_generic(state)
}

/// Router over any repository set
pub fn account_router_generic<R: RepositorySet>(state: AccountAppState<R>) -> Router {
    let protected = Router::new()
        .route(
            "/me",
            get(handlers::me::<R>).put(handlers::update_me::<R>),
        )
        .route("/me/password", put(handlers::update_my_password::<R>))
        .route(
            "/account",
            post(handlers::create_account::<R>).get(handlers::list_accounts::<R>),
        )
        .route(
            "/account/{id}",
            get(handlers::get_account::<R>)
                .put(handlers::update_account::<R>)
                .delete(handlers::delete_account::<R>),
        )
        .route(
            "/account/{id}/password",
            put(handlers::update_account_password::<R>),
        )
        .route(
            "/role",
            post(handlers::create_role::<R>).get(handlers::list_roles::<R>),
        )
        .route(
            "/role/{id}",
            get(handlers::get_role::<R>)
                .put(handlers::update_role::<R>)
                .delete(handlers::delete_role::<R>),
        )
        .route(
            "/account-role",
            post(handlers::create_account_role::<R>).get(handlers::list_account_roles::<R>),
        )
        .route(
            "/account-role/{id}",
            get(handlers::get_account_role::<R>).delete(handlers::delete_account_role::<R>),
        )
        .route_layer(from_fn_with_state(state.signer.clone(), require_bearer));

    Router::new()
        .route("/oauth2", post(handlers::oauth2::<R>))
        .route("/register", post(handlers::register::<R>))
        .merge(protected)
        .layer(from_fn(assign_request_id))
        .with_state(state)
}
