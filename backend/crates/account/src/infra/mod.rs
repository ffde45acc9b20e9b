//! Infrastructure Layer
//!
//! Cache-aside repository and the store implementations behind it.

pub mod cache_aside;
pub mod memory;
pub mod postgres;

use platform::cache::{MemoryCache, RedisCache};

use crate::domain::entity::{Account, AccountRole, Role};
use crate::domain::repository::RepositorySet;

pub use cache_aside::{CacheAsideRepository, CacheKeys, RepositorySettings};
pub use memory::MemoryStore;
pub use postgres::PgStore;

/// PostgreSQL stores behind a Redis cache
pub struct PgRepositories;

impl RepositorySet for PgRepositories {
    type Accounts = CacheAsideRepository<PgStore<Account>, RedisCache>;
    type Roles = CacheAsideRepository<PgStore<Role>, RedisCache>;
    type AccountRoles = CacheAsideRepository<PgStore<AccountRole>, RedisCache>;
}

/// In-process stores behind an in-process cache
pub struct MemoryRepositories;

impl RepositorySet for MemoryRepositories {
    type Accounts = CacheAsideRepository<MemoryStore<Account>, MemoryCache>;
    type Roles = CacheAsideRepository<MemoryStore<Role>, MemoryCache>;
    type AccountRoles = CacheAsideRepository<MemoryStore<AccountRole>, MemoryCache>;
}
