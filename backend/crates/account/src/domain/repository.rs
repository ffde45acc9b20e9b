//! Repository Traits
//!
//! Two seams per entity:
//! - [`EntityStore`]: the relational store adapter (authoritative data)
//! - [`Repository`]: the read/write contract use cases program against,
//!   implemented once generically by the cache-aside repository
//!
//! [`RepositorySet`] bundles the three concrete repositories an HTTP
//! state is built from.

use kernel::audit::Audit;
use kernel::cache_control::CacheDirective;
use kernel::pagination::{Pagination, SortKey};
use serde::{Serialize, de::DeserializeOwned};

use super::entity::{Account, AccountRole, Role};
use super::filter::ListQuery;
use crate::error::{AccountError, AccountResult};

// ============================================================================
// Entity Abstraction
// ============================================================================

/// A persisted entity with a numeric identity and an audit block
///
/// Entities round-trip through JSON for caching.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    type Filter: EntityFilter;

    /// Name used in logs and default cache key prefixes
    const NAME: &'static str;

    /// Fields a caller may sort list reads by
    const SORTABLE_FIELDS: &'static [&'static str];

    fn id(&self) -> i64;

    /// Set the store-assigned identity after insert
    fn assign_id(&mut self, id: i64);

    fn audit(&self) -> &Audit;

    fn audit_mut(&mut self) -> &mut Audit;
}

/// Filter of an entity's read operations
///
/// Serializes to canonical JSON (fixed field order, unset fields omitted);
/// that JSON is also the cache key suffix.
pub trait EntityFilter: Serialize + Clone + Default + Send + Sync + 'static {
    /// Filter selecting exactly the record with `id`
    fn by_id(id: i64) -> Self;

    /// Whether the filter constrains nothing but `id`
    ///
    /// Identity lookups also see soft-deleted rows.
    fn is_identity_lookup(&self) -> bool;
}

pub type FilterOf<E> = <E as Entity>::Filter;

// ============================================================================
// Store Adapter
// ============================================================================

/// Relational store adapter for one entity
///
/// Single reads match filter fields exactly; list reads (`count`, `query`)
/// prefix-match string fields. List reads see live rows only.
#[trait_variant::make(EntityStore: Send)]
pub trait LocalEntityStore {
    type Entity: Entity;

    /// Number of live rows matching `filter`
    async fn count(&self, filter: &FilterOf<Self::Entity>) -> AccountResult<i64>;

    /// The single row matching `filter`; [`AccountError::NotFound`] on zero rows
    async fn find_one(&self, filter: &FilterOf<Self::Entity>) -> AccountResult<Self::Entity>;

    /// A page of live rows matching `filter`
    async fn query(
        &self,
        filter: &FilterOf<Self::Entity>,
        offset: i64,
        limit: i64,
        order_by: &[SortKey],
    ) -> AccountResult<Vec<Self::Entity>>;

    /// Insert in its own transaction; returns the record with its identity
    async fn insert(&self, record: Self::Entity) -> AccountResult<Self::Entity>;

    /// Update every column of the row with the record's identity
    async fn update(&self, record: &Self::Entity) -> AccountResult<()>;

    /// Soft delete writes the record's (already marked) audit block;
    /// hard delete removes the row
    async fn delete(&self, record: &Self::Entity, hard: bool) -> AccountResult<()>;
}

// ============================================================================
// Repository
// ============================================================================

/// A successful read, plus the error of a failed cache refresh if any
///
/// The value is always the store's (or the cache's) answer. A refresh
/// failure means the next default read may not hit; callers that care
/// retry with must-revalidate.
#[must_use]
#[derive(Debug)]
pub struct Fetched<T> {
    value: T,
    refresh_error: Option<AccountError>,
}

impl<T> Fetched<T> {
    pub fn fresh(value: T) -> Self {
        Self {
            value,
            refresh_error: None,
        }
    }

    pub fn with_refresh_error(value: T, error: AccountError) -> Self {
        Self {
            value,
            refresh_error: Some(error),
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn refresh_error(&self) -> Option<&AccountError> {
        self.refresh_error.as_ref()
    }

    /// The value, or the refresh error if the cache could not be warmed
    pub fn into_result(self) -> AccountResult<T> {
        match self.refresh_error {
            Some(err) => Err(err),
            None => Ok(self.value),
        }
    }
}

/// Read/write contract of one entity
#[trait_variant::make(Repository: Send)]
pub trait LocalRepository {
    type Entity: Entity;

    /// Write through to the store; the cache is not touched
    async fn insert(&self, record: Self::Entity) -> AccountResult<Self::Entity>;

    /// Single read honoring the cache directive
    async fn get_single_by_param(
        &self,
        directive: CacheDirective,
        filter: &FilterOf<Self::Entity>,
    ) -> AccountResult<Fetched<Self::Entity>>;

    /// Paginated list read honoring the cache directive
    async fn get_by_param(
        &self,
        directive: CacheDirective,
        query: ListQuery<FilterOf<Self::Entity>>,
    ) -> AccountResult<Fetched<(Vec<Self::Entity>, Pagination)>>;

    /// Write through to the store; cached copies stay until evicted or expired
    async fn update(&self, record: &Self::Entity) -> AccountResult<()>;

    /// Soft (audit-marked) or hard delete on behalf of `actor`
    async fn delete(
        &self,
        record: Self::Entity,
        actor: i64,
        hard: bool,
    ) -> AccountResult<Self::Entity>;

    /// Drop the single-read cache entry for `filter`
    async fn evict(&self, filter: &FilterOf<Self::Entity>) -> AccountResult<()>;
}

/// The repositories backing one running service
pub trait RepositorySet: Send + Sync + 'static {
    type Accounts: Repository<Entity = Account> + Send + Sync + 'static;
    type Roles: Repository<Entity = Role> + Send + Sync + 'static;
    type AccountRoles: Repository<Entity = AccountRole> + Send + Sync + 'static;
}
