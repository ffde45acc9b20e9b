//! Cache-Aside Repository
//!
//! One generic [`Repository`] implementation composing an [`EntityStore`]
//! with a [`CacheStore`]:
//!
//! - default reads serve cache hits and fill the cache on a miss
//! - must-revalidate reads always hit the store, then replace the entry
//! - a cache entry is deleted before it is set again
//! - writes go to the store only; eviction is the caller's call
//!
//! A cache miss is never an error. A cache backend error on a default
//! single read is surfaced rather than falling through to the store.

use std::sync::Arc;
use std::time::Duration;

use kernel::cache_control::CacheDirective;
use kernel::pagination::Pagination;
use platform::cache::{CacheError, CacheStore, DEFAULT_CACHE_TTL};
use serde::{Serialize, de::DeserializeOwned};

use crate::domain::filter::ListQuery;
use crate::domain::repository::{Entity, EntityStore, Fetched, FilterOf, Repository};
use crate::error::{AccountError, AccountResult};

/// Page size used when a list read does not ask for one
pub const DEFAULT_PAGE_LIMIT: i64 = 10;

// ============================================================================
// Configuration
// ============================================================================

/// Key prefixes of one entity
///
/// A key is `prefix + canonical JSON of the filter`. Prefixes differ per
/// entity and per read shape so unrelated queries never collide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeys {
    /// Single reads
    pub single: String,
    /// List reads (rows)
    pub list: String,
    /// List reads (pagination block)
    pub pagination: String,
}

impl CacheKeys {
    /// `gsp<Name>:`, `gp<Name>:` and `gppg<Name>:`
    pub fn for_entity(name: &str) -> Self {
        Self {
            single: format!("gsp{name}:"),
            list: format!("gp{name}:"),
            pagination: format!("gppg{name}:"),
        }
    }

    pub fn single_key<F: Serialize>(&self, filter: &F) -> AccountResult<String> {
        Self::key(&self.single, filter)
    }

    pub fn list_key<F: Serialize>(&self, query: &ListQuery<F>) -> AccountResult<String> {
        Self::key(&self.list, query)
    }

    pub fn pagination_key<F: Serialize>(&self, query: &ListQuery<F>) -> AccountResult<String> {
        Self::key(&self.pagination, query)
    }

    fn key<P: Serialize + ?Sized>(prefix: &str, params: &P) -> AccountResult<String> {
        let json = serde_json::to_string(params).map_err(CacheError::from)?;
        Ok(format!("{prefix}{json}"))
    }
}

/// Per-entity repository settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySettings {
    pub keys: CacheKeys,
    pub cache_ttl: Duration,
    /// Page size applied when a list read asks for none
    pub page_limit: i64,
}

impl RepositorySettings {
    pub fn for_entity(name: &str) -> Self {
        Self {
            keys: CacheKeys::for_entity(name),
            cache_ttl: DEFAULT_CACHE_TTL,
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

// ============================================================================
// Repository
// ============================================================================

pub struct CacheAsideRepository<S, C> {
    store: Arc<S>,
    cache: Arc<C>,
    settings: RepositorySettings,
}

impl<S, C> Clone for CacheAsideRepository<S, C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: Arc::clone(&self.cache),
            settings: self.settings.clone(),
        }
    }
}

impl<S, C> CacheAsideRepository<S, C>
where
    S: EntityStore + Send + Sync + 'static,
    C: CacheStore + Send + Sync + 'static,
{
    pub fn new(store: Arc<S>, cache: Arc<C>, settings: RepositorySettings) -> Self {
        Self {
            store,
            cache,
            settings,
        }
    }

    pub fn settings(&self) -> &RepositorySettings {
        &self.settings
    }

    fn entity() -> &'static str {
        <S::Entity as Entity>::NAME
    }

    /// Replace the entry under `key`: delete, then set
    async fn warm<T: Serialize + Sync>(&self, key: &str, value: &T) -> AccountResult<()> {
        let payload = serde_json::to_string(value).map_err(CacheError::from)?;
        self.cache.delete(key).await?;
        self.cache
            .set(key, &payload, self.settings.cache_ttl)
            .await?;
        Ok(())
    }

    fn fetched<T>(value: T, warmed: AccountResult<()>) -> Fetched<T> {
        match warmed {
            Ok(()) => Fetched::fresh(value),
            Err(err) => {
                tracing::warn!(entity = Self::entity(), error = %err, "Cache refresh failed");
                Fetched::with_refresh_error(value, err)
            }
        }
    }
}

fn decode<T: DeserializeOwned>(payload: &str) -> AccountResult<T> {
    Ok(serde_json::from_str(payload).map_err(CacheError::from)?)
}

impl<S, C> Repository for CacheAsideRepository<S, C>
where
    S: EntityStore + Send + Sync + 'static,
    C: CacheStore + Send + Sync + 'static,
{
    type Entity = S::Entity;

    async fn insert(&self, record: S::Entity) -> AccountResult<S::Entity> {
        let record = self.store.insert(record).await?;
        tracing::info!(entity = Self::entity(), id = record.id(), "Record inserted");
        Ok(record)
    }

    async fn get_single_by_param(
        &self,
        directive: CacheDirective,
        filter: &FilterOf<S::Entity>,
    ) -> AccountResult<Fetched<S::Entity>> {
        let key = self.settings.keys.single_key(filter)?;

        if !directive.is_must_revalidate() {
            if let Some(cached) = self.cache.get(&key).await? {
                tracing::debug!(entity = Self::entity(), key = %key, "Cache hit");
                return Ok(Fetched::fresh(decode(&cached)?));
            }
            tracing::debug!(entity = Self::entity(), key = %key, "Cache miss");
        }

        let record = self.store.find_one(filter).await?;
        let warmed = self.warm(&key, &record).await;
        Ok(Self::fetched(record, warmed))
    }

    async fn get_by_param(
        &self,
        directive: CacheDirective,
        query: ListQuery<FilterOf<S::Entity>>,
    ) -> AccountResult<Fetched<(Vec<S::Entity>, Pagination)>> {
        let ListQuery { filter, page } = query;
        let page = page
            .normalized(self.settings.page_limit)
            .map_err(|e| AccountError::BadRequest(e.to_string()))?;
        let query = ListQuery::new(filter, page);

        let order_by = query
            .page
            .sort_keys(<S::Entity as Entity>::SORTABLE_FIELDS)
            .map_err(|e| AccountError::BadRequest(e.to_string()))?;

        let list_key = self.settings.keys.list_key(&query)?;
        let pagination_key = self.settings.keys.pagination_key(&query)?;

        if !directive.is_must_revalidate() {
            let rows = self.cache.get(&list_key).await;
            let pagination = self.cache.get(&pagination_key).await;

            // Both halves must hit; a miss on either side wins over an error.
            match (rows, pagination) {
                (Ok(Some(rows)), Ok(Some(pagination))) => {
                    tracing::debug!(entity = Self::entity(), key = %list_key, "Cache hit");
                    return Ok(Fetched::fresh((decode(&rows)?, decode(&pagination)?)));
                }
                (Ok(None), _) | (_, Ok(None)) => {
                    tracing::debug!(entity = Self::entity(), key = %list_key, "Cache miss");
                }
                (Err(err), _) | (_, Err(err)) => return Err(err.into()),
            }
        }

        let total = self.store.count(&query.filter).await?;
        let rows = self
            .store
            .query(
                &query.filter,
                query.page.offset(),
                query.page.limit,
                &order_by,
            )
            .await?;
        let pagination = Pagination::new(&query.page, rows.len(), total);

        let rows_warmed = self.warm(&list_key, &rows).await;
        let pagination_warmed = self.warm(&pagination_key, &pagination).await;

        Ok(Self::fetched(
            (rows, pagination),
            rows_warmed.and(pagination_warmed),
        ))
    }

    async fn update(&self, record: &S::Entity) -> AccountResult<()> {
        self.store.update(record).await?;
        tracing::info!(entity = Self::entity(), id = record.id(), "Record updated");
        Ok(())
    }

    async fn delete(
        &self,
        mut record: S::Entity,
        actor: i64,
        hard: bool,
    ) -> AccountResult<S::Entity> {
        record.audit_mut().mark_deleted(actor);
        self.store.delete(&record, hard).await?;
        tracing::info!(
            entity = Self::entity(),
            id = record.id(),
            hard,
            actor,
            "Record deleted"
        );
        Ok(record)
    }

    async fn evict(&self, filter: &FilterOf<S::Entity>) -> AccountResult<()> {
        let key = self.settings.keys.single_key(filter)?;
        self.cache.delete(&key).await?;
        Ok(())
    }
}
