//! Server configuration from the environment
//!
//! Secrets are mandatory in release builds. Debug builds fall back to
//! random ones that do not survive a restart.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use account::AccountConfig;
use anyhow::{Context, bail};

const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:31113";

pub struct ServerConfig {
    pub database_url: String,
    pub redis_url: String,
    pub listen_addr: SocketAddr,
    pub frontend_origins: Vec<String>,
    pub account: AccountConfig,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let redis_url = env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string());
        let listen_addr: SocketAddr =
            parse_or("LISTEN_ADDR", DEFAULT_LISTEN_ADDR.parse::<SocketAddr>()?)?;

        let frontend_origins = env::var("FRONTEND_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            database_url,
            redis_url,
            listen_addr,
            frontend_origins,
            account: account_config()?,
        })
    }
}

fn account_config() -> anyhow::Result<AccountConfig> {
    let mut config = if cfg!(debug_assertions) {
        AccountConfig::development()
    } else {
        AccountConfig::default()
    };

    match env::var("TOKEN_SECRET") {
        Ok(secret) => config.token_secret = secret.into_bytes(),
        Err(_) if cfg!(debug_assertions) => {
            tracing::warn!("TOKEN_SECRET not set, using a random secret");
        }
        Err(_) => bail!("TOKEN_SECRET must be set in production"),
    }

    match env::var("CLIENT_SECRET_KEY") {
        Ok(key) => config.client_secret_key = key,
        Err(_) if cfg!(debug_assertions) => {
            tracing::warn!("CLIENT_SECRET_KEY not set, stored client secrets will not survive a restart");
        }
        Err(_) => bail!("CLIENT_SECRET_KEY must be set in production"),
    }

    if let Ok(pepper) = env::var("PASSWORD_PEPPER") {
        config.password_pepper = Some(pepper.into_bytes());
    }

    config.token_timeout = Duration::from_secs(parse_or("TOKEN_TIMEOUT_SECS", 3600)?);

    let cache_ttl = Duration::from_secs(parse_or(
        "CACHE_TTL_SECS",
        config.accounts.cache_ttl.as_secs(),
    )?);
    for settings in [
        &mut config.accounts,
        &mut config.roles,
        &mut config.account_roles,
    ] {
        settings.cache_ttl = cache_ttl;
    }

    config.accounts.page_limit = parse_or("ACCOUNT_PAGE_LIMIT", config.accounts.page_limit)?;
    config.roles.page_limit = parse_or("ROLE_PAGE_LIMIT", config.roles.page_limit)?;
    config.account_roles.page_limit =
        parse_or("ACCOUNT_ROLE_PAGE_LIMIT", config.account_roles.page_limit)?;

    Ok(config)
}

/// Parse `name` when set, else `default`
fn parse_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} is not valid: {raw}")),
        Err(_) => Ok(default),
    }
}
