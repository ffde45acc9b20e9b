pub mod account;
pub mod account_role;
pub mod config;
pub mod issue_token;
pub mod role;

use kernel::cache_control::CacheDirective;

use crate::domain::repository::{Entity, EntityFilter, Repository};
use crate::error::{AccountError, AccountResult};

/// Fresh copy of a live record, for use before mutating it
pub(crate) async fn load_live<R>(repo: &R, id: i64) -> AccountResult<R::Entity>
where
    R: Repository + Sync,
{
    let filter = <R::Entity as Entity>::Filter::by_id(id);
    let record = repo
        .get_single_by_param(CacheDirective::MustRevalidate, &filter)
        .await?
        .into_result()?;

    if !record.audit().is_live() {
        return Err(AccountError::NotFound);
    }
    Ok(record)
}

/// Evict the identity's single-read entry, then read it back from the store
pub(crate) async fn reload<R>(repo: &R, id: i64) -> AccountResult<R::Entity>
where
    R: Repository + Sync,
{
    let filter = <R::Entity as Entity>::Filter::by_id(id);
    repo.evict(&filter).await?;
    repo.get_single_by_param(CacheDirective::MustRevalidate, &filter)
        .await?
        .into_result()
}

/// Soft delete a live record and evict its single-read entry
pub(crate) async fn soft_delete<R>(repo: &R, id: i64, actor: i64) -> AccountResult<R::Entity>
where
    R: Repository + Sync,
{
    let record = load_live(repo, id).await?;
    let deleted = repo.delete(record, actor, false).await?;
    repo.evict(&<R::Entity as Entity>::Filter::by_id(id)).await?;
    Ok(deleted)
}
