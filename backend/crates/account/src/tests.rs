//! Crate-level tests
//! Cache-aside behaviour, use cases, credential flow and HTTP surface

#[cfg(test)]
mod support {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use platform::cache::{CacheError, CacheStore, MemoryCache};

    use crate::application::account::{AccountUseCase, RegisterInput};
    use crate::application::account_role::AccountRoleUseCase;
    use crate::application::config::AccountConfig;
    use crate::application::issue_token::{IssueTokenUseCase, LoginInput};
    use crate::application::role::{CreateRoleInput, RoleUseCase};
    use crate::domain::entity::{Account, AccountRole, Role};
    use crate::domain::value_object::{AccountId, Actor, Email, PasswordHash, Scope};
    use crate::infra::{CacheAsideRepository, MemoryStore, RepositorySettings};

    pub type Repo<E> = CacheAsideRepository<MemoryStore<E>, MemoryCache>;

    /// Cache whose backend is down
    #[derive(Default)]
    pub struct FailingCache {
        pub fail: AtomicBool,
    }

    impl FailingCache {
        pub fn down() -> Self {
            Self {
                fail: AtomicBool::new(true),
            }
        }

        fn check(&self) -> Result<(), CacheError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(CacheError::Backend("connection refused".into()));
            }
            Ok(())
        }
    }

    impl CacheStore for FailingCache {
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            self.check()?;
            Ok(None)
        }

        async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
            self.check()
        }

        async fn delete(&self, _key: &str) -> Result<(), CacheError> {
            self.check()
        }
    }

    /// Shared cache where one key's backend is down
    pub struct SplitCache {
        inner: Arc<MemoryCache>,
        broken_key: String,
    }

    impl SplitCache {
        pub fn new(inner: Arc<MemoryCache>, broken_key: &str) -> Self {
            Self {
                inner,
                broken_key: broken_key.to_string(),
            }
        }

        fn check(&self, key: &str) -> Result<(), CacheError> {
            if key == self.broken_key {
                return Err(CacheError::Backend("connection reset".into()));
            }
            Ok(())
        }
    }

    impl CacheStore for SplitCache {
        async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
            self.check(key)?;
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
            self.check(key)?;
            self.inner.set(key, value, ttl).await
        }

        async fn delete(&self, key: &str) -> Result<(), CacheError> {
            self.check(key)?;
            self.inner.delete(key).await
        }
    }

    pub fn account(name: &str, email: &str) -> Account {
        Account::new(
            name.into(),
            Email::new(email).unwrap(),
            PasswordHash::from_db("hash"),
            0,
        )
    }

    pub fn account_repo() -> (Arc<MemoryStore<Account>>, Arc<MemoryCache>, Repo<Account>) {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(MemoryCache::new());
        let repo = CacheAsideRepository::new(
            store.clone(),
            cache.clone(),
            RepositorySettings::for_entity("Account"),
        );
        (store, cache, repo)
    }

    pub fn sup() -> Actor {
        Actor::new(AccountId::new(999), Scope::from_db(Scope::SUPER_ADMIN))
    }

    pub fn customer(id: i64) -> Actor {
        Actor::new(AccountId::new(id), Scope::from_db(Scope::CUSTOMER))
    }

    pub fn register_input(email: &str, password: &str) -> RegisterInput {
        RegisterInput {
            name: "A".into(),
            email: email.into(),
            password: password.into(),
            confirm_password: password.into(),
        }
    }

    pub fn login(email: &str, password: &str, client_id: &str, secret: &str) -> LoginInput {
        LoginInput {
            email: email.into(),
            password: password.into(),
            client_id: client_id.into(),
            client_secret: secret.into(),
        }
    }

    /// In-memory repositories with handles on every store and the shared cache
    pub struct Harness {
        pub config: Arc<AccountConfig>,
        pub cache: Arc<MemoryCache>,
        pub account_store: Arc<MemoryStore<Account>>,
        pub accounts: Arc<Repo<Account>>,
        pub roles: Arc<Repo<Role>>,
        pub account_roles: Arc<Repo<AccountRole>>,
    }

    impl Harness {
        pub fn new() -> Self {
            let config = AccountConfig::with_random_secrets();
            let cache = Arc::new(MemoryCache::new());
            let account_store = Arc::new(MemoryStore::new());

            Self {
                accounts: Arc::new(CacheAsideRepository::new(
                    account_store.clone(),
                    cache.clone(),
                    config.accounts.clone(),
                )),
                roles: Arc::new(CacheAsideRepository::new(
                    Arc::new(MemoryStore::new()),
                    cache.clone(),
                    config.roles.clone(),
                )),
                account_roles: Arc::new(CacheAsideRepository::new(
                    Arc::new(MemoryStore::new()),
                    cache.clone(),
                    config.account_roles.clone(),
                )),
                config: Arc::new(config),
                cache,
                account_store,
            }
        }

        pub fn accounts(&self) -> AccountUseCase<Repo<Account>> {
            AccountUseCase::new(self.accounts.clone(), self.config.clone())
        }

        pub fn roles(&self) -> RoleUseCase<Repo<Role>> {
            RoleUseCase::new(self.roles.clone(), self.config.clone())
        }

        pub fn account_roles(&self) -> AccountRoleUseCase<Repo<AccountRole>, Repo<Account>, Repo<Role>> {
            AccountRoleUseCase::new(
                self.account_roles.clone(),
                self.accounts.clone(),
                self.roles.clone(),
            )
        }

        pub fn issue_token(&self) -> IssueTokenUseCase<Repo<Account>, Repo<Role>, Repo<AccountRole>> {
            IssueTokenUseCase::new(
                self.accounts.clone(),
                self.roles.clone(),
                self.account_roles.clone(),
                self.config.clone(),
            )
        }

        pub async fn create_role(&self, scope: &str, client_id: &str, secret: &str) -> Role {
            self.roles()
                .create(
                    &sup(),
                    CreateRoleInput {
                        scope: scope.into(),
                        client_id: client_id.into(),
                        client_secret: secret.into(),
                    },
                )
                .await
                .unwrap()
        }

        /// `a@b.com` / `pass1` holding role `admin` of client `c1`
        pub async fn seed(&self) -> (Account, Role) {
            let account = self
                .accounts()
                .register(register_input("a@b.com", "pass1"))
                .await
                .unwrap();
            let role = self.create_role("admin", "c1", "s3cret").await;
            self.account_roles()
                .create(&sup(), account.id, role.id)
                .await
                .unwrap();
            (account, role)
        }
    }
}

#[cfg(test)]
mod repository_tests {
    use std::sync::Arc;

    use kernel::cache_control::CacheDirective;
    use kernel::pagination::PageRequest;
    use platform::cache::{CacheStore, DEFAULT_CACHE_TTL};

    use super::support::*;
    use crate::domain::filter::{AccountFilter, ListQuery};
    use crate::domain::repository::{EntityFilter, Repository};
    use crate::error::AccountError;
    use crate::infra::{CacheAsideRepository, MemoryStore, RepositorySettings};

    fn page(page: i64, limit: i64) -> PageRequest {
        PageRequest {
            page,
            limit,
            order_by: None,
        }
    }

    #[tokio::test]
    async fn test_repeated_default_reads_hit_store_once() {
        let (store, cache, repo) = account_repo();
        repo.insert(account("A", "a@b.com")).await.unwrap();

        let filter = AccountFilter::by_id(1);
        let first = repo
            .get_single_by_param(CacheDirective::Default, &filter)
            .await
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(store.reads(), 1);

        let second = repo
            .get_single_by_param(CacheDirective::Default, &filter)
            .await
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(store.reads(), 1);
        assert_eq!(cache.reads(), 2);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_cache_miss_falls_back_to_store() {
        let (store, cache, repo) = account_repo();
        repo.insert(account("A", "a@b.com")).await.unwrap();
        let filter = AccountFilter::by_id(1);

        repo.get_single_by_param(CacheDirective::Default, &filter)
            .await
            .unwrap();
        let key = repo.settings().keys.single_key(&filter).unwrap();
        assert!(cache.contains_key(&key));

        cache.delete(&key).await.unwrap();
        let fetched = repo
            .get_single_by_param(CacheDirective::Default, &filter)
            .await
            .unwrap();
        assert!(fetched.refresh_error().is_none());
        assert_eq!(fetched.value().name, "A");
        assert_eq!(store.reads(), 2);
        assert!(cache.contains_key(&key));
    }

    #[tokio::test]
    async fn test_update_leaves_cache_until_revalidated() {
        let (store, _cache, repo) = account_repo();
        repo.insert(account("Old", "a@b.com")).await.unwrap();
        let filter = AccountFilter::by_id(1);

        let mut record = repo
            .get_single_by_param(CacheDirective::Default, &filter)
            .await
            .unwrap()
            .into_result()
            .unwrap();
        assert!(record.rename("New".into(), 1));
        repo.update(&record).await.unwrap();

        let stale = repo
            .get_single_by_param(CacheDirective::Default, &filter)
            .await
            .unwrap();
        assert_eq!(stale.value().name, "Old");

        let fresh = repo
            .get_single_by_param(CacheDirective::MustRevalidate, &filter)
            .await
            .unwrap();
        assert_eq!(fresh.value().name, "New");

        // The revalidating read replaced the entry.
        let reads = store.reads();
        let cached = repo
            .get_single_by_param(CacheDirective::Default, &filter)
            .await
            .unwrap();
        assert_eq!(cached.value().name, "New");
        assert_eq!(store.reads(), reads);
    }

    #[tokio::test]
    async fn test_evict_forces_next_default_read_to_store() {
        let (store, _cache, repo) = account_repo();
        repo.insert(account("A", "a@b.com")).await.unwrap();
        let filter = AccountFilter::by_id(1);

        repo.get_single_by_param(CacheDirective::Default, &filter)
            .await
            .unwrap();
        repo.evict(&filter).await.unwrap();
        repo.get_single_by_param(CacheDirective::Default, &filter)
            .await
            .unwrap();
        assert_eq!(store.reads(), 2);
    }

    #[tokio::test]
    async fn test_absent_record_is_not_found() {
        let (_store, cache, repo) = account_repo();
        let result = repo
            .get_single_by_param(CacheDirective::Default, &AccountFilter::by_id(42))
            .await;
        assert!(matches!(result, Err(AccountError::NotFound)));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_cache_backend_failure() {
        let store = Arc::new(MemoryStore::new());
        let repo = CacheAsideRepository::new(
            store.clone(),
            Arc::new(FailingCache::down()),
            RepositorySettings::for_entity("Account"),
        );
        repo.insert(account("A", "a@b.com")).await.unwrap();
        let filter = AccountFilter::by_id(1);

        let result = repo
            .get_single_by_param(CacheDirective::Default, &filter)
            .await;
        assert!(matches!(result, Err(AccountError::Cache(_))));
        assert_eq!(store.reads(), 0);

        // The store read succeeds; the failed refresh rides along.
        let fetched = repo
            .get_single_by_param(CacheDirective::MustRevalidate, &filter)
            .await
            .unwrap();
        assert_eq!(fetched.value().name, "A");
        assert!(matches!(
            fetched.refresh_error(),
            Some(AccountError::Cache(_))
        ));
        assert!(matches!(fetched.into_result(), Err(AccountError::Cache(_))));
    }

    #[tokio::test]
    async fn test_list_pagination_and_caching() {
        let (store, cache, repo) = account_repo();
        for i in 0..25 {
            repo.insert(account(&format!("user{i:02}"), &format!("u{i}@b.com")))
                .await
                .unwrap();
        }

        let query = ListQuery::new(AccountFilter::default(), page(3, 10));
        let (rows, pagination) = repo
            .get_by_param(CacheDirective::Default, query.clone())
            .await
            .unwrap()
            .into_result()
            .unwrap();

        assert_eq!(rows.len(), 5);
        assert_eq!(pagination.current_page, 3);
        assert_eq!(pagination.current_elements, 5);
        assert_eq!(pagination.total_elements, 25);
        assert_eq!(pagination.total_pages, 3);
        assert_eq!(store.reads(), 2);

        let keys = &repo.settings().keys;
        assert!(cache.contains_key(&keys.list_key(&query).unwrap()));
        assert!(cache.contains_key(&keys.pagination_key(&query).unwrap()));

        let (cached_rows, cached_pagination) = repo
            .get_by_param(CacheDirective::Default, query.clone())
            .await
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(store.reads(), 2);
        assert_eq!(cached_rows, rows);
        assert_eq!(cached_pagination, pagination);

        // Either half missing is a miss.
        cache
            .delete(&keys.pagination_key(&query).unwrap())
            .await
            .unwrap();
        repo.get_by_param(CacheDirective::Default, query)
            .await
            .unwrap();
        assert_eq!(store.reads(), 4);
    }

    #[tokio::test]
    async fn test_list_total_pages_is_literal() {
        let (_store, _cache, repo) = account_repo();
        for i in 0..20 {
            repo.insert(account("u", &format!("u{i}@b.com"))).await.unwrap();
        }

        let (_, pagination) = repo
            .get_by_param(
                CacheDirective::MustRevalidate,
                ListQuery::new(AccountFilter::default(), page(1, 10)),
            )
            .await
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(pagination.total_pages, 3);

        let (rows, empty) = repo
            .get_by_param(
                CacheDirective::MustRevalidate,
                ListQuery::new(
                    AccountFilter {
                        name: Some("nobody".into()),
                        ..AccountFilter::default()
                    },
                    page(1, 10),
                ),
            )
            .await
            .unwrap()
            .into_result()
            .unwrap();
        assert!(rows.is_empty());
        assert_eq!(empty.total_pages, 1);
    }

    #[tokio::test]
    async fn test_list_defaults_and_order_by() {
        let (_store, _cache, repo) = account_repo();
        for name in ["b", "c", "a"] {
            repo.insert(account(name, &format!("{name}@b.com")))
                .await
                .unwrap();
        }

        let (rows, pagination) = repo
            .get_by_param(
                CacheDirective::Default,
                ListQuery::new(
                    AccountFilter::default(),
                    PageRequest {
                        page: 0,
                        limit: 0,
                        order_by: Some("name".into()),
                    },
                ),
            )
            .await
            .unwrap()
            .into_result()
            .unwrap();
        let names: Vec<_> = rows.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert_eq!(pagination.current_page, 1);
        assert_eq!(pagination.limit, 10);
        assert_eq!(pagination.sort_by, "name");

        let rejected = repo
            .get_by_param(
                CacheDirective::Default,
                ListQuery::new(
                    AccountFilter::default(),
                    PageRequest {
                        page: 1,
                        limit: 10,
                        order_by: Some("password; drop table account".into()),
                    },
                ),
            )
            .await;
        assert!(matches!(rejected, Err(AccountError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_list_page_overflowing_offset_is_bad_request() {
        let (store, cache, repo) = account_repo();
        repo.insert(account("A", "a@b.com")).await.unwrap();

        let result = repo
            .get_by_param(
                CacheDirective::Default,
                ListQuery::new(AccountFilter::default(), page(i64::MAX, 10)),
            )
            .await;
        assert!(matches!(result, Err(AccountError::BadRequest(_))));
        assert_eq!(store.reads(), 0);
        assert_eq!(cache.reads(), 0);
    }

    #[tokio::test]
    async fn test_list_cache_backend_failure() {
        let store = Arc::new(MemoryStore::new());
        let repo = CacheAsideRepository::new(
            store.clone(),
            Arc::new(FailingCache::down()),
            RepositorySettings::for_entity("Account"),
        );
        repo.insert(account("A", "a@b.com")).await.unwrap();
        let query = ListQuery::new(AccountFilter::default(), page(1, 10));

        let result = repo
            .get_by_param(CacheDirective::Default, query.clone())
            .await;
        assert!(matches!(result, Err(AccountError::Cache(_))));
        assert_eq!(store.reads(), 0);

        let fetched = repo
            .get_by_param(CacheDirective::MustRevalidate, query)
            .await
            .unwrap();
        assert_eq!(fetched.value().0.len(), 1);
        assert_eq!(fetched.value().1.total_elements, 1);
        assert!(matches!(
            fetched.refresh_error(),
            Some(AccountError::Cache(_))
        ));
        assert!(matches!(fetched.into_result(), Err(AccountError::Cache(_))));
        assert_eq!(store.reads(), 2);
    }

    #[tokio::test]
    async fn test_list_miss_wins_over_error() {
        let (store, cache, repo) = account_repo();
        repo.insert(account("A", "a@b.com")).await.unwrap();
        let query = ListQuery::new(AccountFilter::default(), page(1, 10));
        let list_key = repo.settings().keys.list_key(&query).unwrap();
        let pagination_key = repo.settings().keys.pagination_key(&query).unwrap();

        // Rows cached, pagination lookup fails.
        let split = Arc::new(SplitCache::new(cache.clone(), &pagination_key));
        let split_repo = CacheAsideRepository::new(
            store.clone(),
            split,
            RepositorySettings::for_entity("Account"),
        );
        cache.set(&list_key, "[]", DEFAULT_CACHE_TTL).await.unwrap();
        let result = split_repo
            .get_by_param(CacheDirective::Default, query.clone())
            .await;
        assert!(matches!(result, Err(AccountError::Cache(_))));
        assert_eq!(store.reads(), 0);

        // Rows missing, pagination lookup fails: served from the store.
        cache.delete(&list_key).await.unwrap();
        let fetched = split_repo
            .get_by_param(CacheDirective::Default, query)
            .await
            .unwrap();
        assert_eq!(fetched.value().0.len(), 1);
        assert_eq!(store.reads(), 2);
        assert!(matches!(
            fetched.refresh_error(),
            Some(AccountError::Cache(_))
        ));
        assert!(cache.contains_key(&list_key));
    }
}

#[cfg(test)]
mod use_case_tests {
    use kernel::cache_control::CacheDirective;
    use kernel::pagination::PageRequest;

    use super::support::*;
    use crate::application::account::PasswordChange;
    use crate::application::role::UpdateRoleInput;
    use crate::domain::filter::{AccountFilter, ListQuery};
    use crate::domain::value_object::{AccountId, RoleId};
    use crate::error::{AccountError, ValidationError};

    #[tokio::test]
    async fn test_register_validation() {
        let h = Harness::new();
        let accounts = h.accounts();

        let mut input = register_input("a@b.com", "pass1");
        input.confirm_password = "pass2".into();
        assert!(matches!(
            accounts.register(input).await,
            Err(AccountError::Validation(ValidationError::PasswordConfirmation))
        ));

        assert!(matches!(
            accounts.register(register_input("a@b.com", "123456789")).await,
            Err(AccountError::Validation(ValidationError::MaximumPassword))
        ));
        assert!(matches!(
            accounts.register(register_input("not-an-email", "pass1")).await,
            Err(AccountError::Validation(ValidationError::EmailFormat))
        ));

        let mut nameless = register_input("a@b.com", "pass1");
        nameless.name = "  ".into();
        assert!(matches!(
            accounts.register(nameless).await,
            Err(AccountError::Validation(ValidationError::EmptyName))
        ));
        assert_eq!(h.account_store.writes(), 0);
    }

    #[tokio::test]
    async fn test_register_stores_hash_and_self_audit() {
        let h = Harness::new();
        let account = h
            .accounts()
            .register(register_input("A@B.com", "pass1"))
            .await
            .unwrap();

        assert_eq!(account.email.as_str(), "a@b.com");
        assert_eq!(account.audit.created_by, 0);
        assert_ne!(account.password.as_str(), "pass1");
    }

    #[tokio::test]
    async fn test_scope_gates() {
        let h = Harness::new();
        let own = h
            .accounts()
            .register(register_input("a@b.com", "pass1"))
            .await
            .unwrap();
        let other = h
            .accounts()
            .register(register_input("o@b.com", "pass1"))
            .await
            .unwrap();
        let me = customer(own.id.value());

        let query = ListQuery::new(AccountFilter::default(), PageRequest::default());
        assert!(matches!(
            h.accounts().list(&me, CacheDirective::Default, query.clone()).await,
            Err(AccountError::Forbidden)
        ));
        assert!(matches!(
            h.accounts()
                .get_by_id(&me, CacheDirective::Default, other.id)
                .await,
            Err(AccountError::Forbidden)
        ));
        assert_eq!(
            h.accounts()
                .current(&me, CacheDirective::Default)
                .await
                .unwrap()
                .id,
            own.id
        );

        let (all, _) = h
            .accounts()
            .list(&sup(), CacheDirective::Default, query)
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        assert!(matches!(
            h.roles()
                .get_by_id(&me, CacheDirective::Default, RoleId::new(1))
                .await,
            Err(AccountError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_update_name_is_visible_to_default_reads() {
        let h = Harness::new();
        let account = h
            .accounts()
            .register(register_input("a@b.com", "pass1"))
            .await
            .unwrap();
        let me = customer(account.id.value());

        // Prime the single-read entry.
        h.accounts()
            .get_by_id(&me, CacheDirective::Default, account.id)
            .await
            .unwrap();

        let renamed = h
            .accounts()
            .update_name(&me, account.id, "Renamed".into())
            .await
            .unwrap();
        assert_eq!(renamed.name, "Renamed");
        assert_eq!(renamed.audit.updated_by, account.id.value());

        let read = h
            .accounts()
            .get_by_id(&me, CacheDirective::Default, account.id)
            .await
            .unwrap();
        assert_eq!(read.name, "Renamed");
    }

    #[tokio::test]
    async fn test_unchanged_name_skips_write() {
        let h = Harness::new();
        let account = h
            .accounts()
            .register(register_input("a@b.com", "pass1"))
            .await
            .unwrap();
        let writes = h.account_store.writes();

        h.accounts()
            .update_name(&sup(), account.id, " A ".into())
            .await
            .unwrap();
        assert_eq!(h.account_store.writes(), writes);
    }

    #[tokio::test]
    async fn test_password_change_takes_effect_at_login() {
        let h = Harness::new();
        let (account, _) = h.seed().await;

        h.accounts()
            .update_password(
                &customer(account.id.value()),
                account.id,
                PasswordChange {
                    password: "newpw".into(),
                    confirm_password: "newpw".into(),
                },
            )
            .await
            .unwrap();

        assert!(matches!(
            h.issue_token()
                .execute(login("a@b.com", "pass1", "c1", "s3cret"))
                .await,
            Err(AccountError::PasswordMismatch)
        ));
        h.issue_token()
            .execute(login("a@b.com", "newpw", "c1", "s3cret"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_soft_delete() {
        let h = Harness::new();
        let account = h
            .accounts()
            .register(register_input("a@b.com", "pass1"))
            .await
            .unwrap();

        let deleted = h
            .accounts()
            .delete_by_id(&sup(), account.id)
            .await
            .unwrap();
        assert_eq!(deleted.audit.deleted_by, Some(999));

        // Identity reads still see the record, mutations do not.
        let read = h
            .accounts()
            .get_by_id(&sup(), CacheDirective::Default, account.id)
            .await
            .unwrap();
        assert!(read.audit.deleted_at.is_some());
        assert!(matches!(
            h.accounts().delete_by_id(&sup(), account.id).await,
            Err(AccountError::NotFound)
        ));

        let role = h.create_role("admin", "c1", "s3cret").await;
        assert!(matches!(
            h.account_roles().create(&sup(), account.id, role.id).await,
            Err(AccountError::NotFound)
        ));

        // The email is free again.
        h.accounts()
            .register(register_input("a@b.com", "pass1"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_account_role_rules() {
        let h = Harness::new();
        let (account, role) = h.seed().await;

        assert!(matches!(
            h.account_roles().create(&sup(), account.id, role.id).await,
            Err(AccountError::BadRequest(_))
        ));

        let me = customer(account.id.value());
        let root = h.create_role("sup", "root", "s3cret").await;
        assert!(matches!(
            h.account_roles().create(&me, account.id, root.id).await,
            Err(AccountError::Forbidden)
        ));

        let other = h
            .accounts()
            .register(register_input("o@b.com", "pass1"))
            .await
            .unwrap();
        let store_role = h.create_role("sto", "c2", "s3cret").await;
        assert!(matches!(
            h.account_roles().create(&me, other.id, store_role.id).await,
            Err(AccountError::Forbidden)
        ));

        let granted = h
            .account_roles()
            .create(&me, account.id, store_role.id)
            .await
            .unwrap();
        assert_eq!(granted.audit.created_by, account.id.value());

        assert!(matches!(
            h.account_roles()
                .create(&sup(), AccountId::new(77), store_role.id)
                .await,
            Err(AccountError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_role_update_reseals_secret() {
        let h = Harness::new();
        let (_, role) = h.seed().await;

        let updated = h
            .roles()
            .update_by_id(
                &sup(),
                role.id,
                UpdateRoleInput {
                    client_secret: Some("rotated".into()),
                    ..UpdateRoleInput::default()
                },
            )
            .await
            .unwrap();
        assert_ne!(updated.client_secret, role.client_secret);
        assert_eq!(updated.client_id, "c1");

        assert!(
            h.issue_token()
                .execute(login("a@b.com", "pass1", "c1", "rotated"))
                .await
                .is_ok()
        );

        assert!(matches!(
            h.roles()
                .update_by_id(
                    &sup(),
                    role.id,
                    UpdateRoleInput {
                        scope: Some(" ".into()),
                        ..UpdateRoleInput::default()
                    },
                )
                .await,
            Err(AccountError::Validation(ValidationError::InvalidScope))
        ));
    }
}

#[cfg(test)]
mod issue_token_tests {
    use chrono::Utc;

    use super::support::*;
    use crate::error::{AccountError, ValidationError};

    #[tokio::test]
    async fn test_end_to_end_token() {
        let h = Harness::new();
        let (account, role) = h.seed().await;

        let auth = h
            .issue_token()
            .execute(login("a@b.com", "pass1", "c1", "s3cret"))
            .await
            .unwrap();

        assert_eq!(auth.scope, "admin");
        assert_eq!(auth.token_type, "Bearer");

        let expected = Utc::now() + chrono::Duration::seconds(3600);
        assert!((auth.exp - expected).num_seconds().abs() <= 5);

        let claims = h.config.token_signer().verify(&auth.access_token).unwrap();
        assert_eq!(claims.id, account.id.value());
        assert_eq!(claims.username, "a@b.com");
        assert_eq!(claims.scope, role.scope.as_str());
        assert_eq!(claims.exp, auth.exp.timestamp());
    }

    #[tokio::test]
    async fn test_flow_never_reads_cache() {
        let h = Harness::new();
        h.seed().await;

        let before = h.cache.reads();
        h.issue_token()
            .execute(login("a@b.com", "pass1", "c1", "s3cret"))
            .await
            .unwrap();
        assert_eq!(h.cache.reads(), before);
    }

    #[tokio::test]
    async fn test_client_failures_are_indistinguishable() {
        let h = Harness::new();
        h.seed().await;

        let unknown_client = h
            .issue_token()
            .execute(login("a@b.com", "pass1", "nope", "s3cret"))
            .await
            .unwrap_err();
        let wrong_secret = h
            .issue_token()
            .execute(login("a@b.com", "pass1", "c1", "wrong"))
            .await
            .unwrap_err();
        let unknown_account = h
            .issue_token()
            .execute(login("x@b.com", "pass1", "c1", "s3cret"))
            .await
            .unwrap_err();

        for err in [&unknown_client, &wrong_secret, &unknown_account] {
            assert!(matches!(err, AccountError::NotAuthorized));
            assert_eq!(err.code(), 401000);
        }
    }

    #[tokio::test]
    async fn test_membership_checked_before_password() {
        let h = Harness::new();
        h.seed().await;
        h.accounts()
            .register(register_input("b@b.com", "pass1"))
            .await
            .unwrap();

        // No membership: the wrong password is never reached.
        assert!(matches!(
            h.issue_token()
                .execute(login("b@b.com", "wrong", "c1", "s3cret"))
                .await,
            Err(AccountError::NotAuthorized)
        ));

        let mismatch = h
            .issue_token()
            .execute(login("a@b.com", "wrong", "c1", "s3cret"))
            .await
            .unwrap_err();
        assert!(matches!(mismatch, AccountError::PasswordMismatch));
        assert_eq!(mismatch.code(), 40015);
    }

    #[tokio::test]
    async fn test_login_field_validation() {
        let h = Harness::new();
        h.seed().await;

        assert!(matches!(
            h.issue_token().execute(login(" ", "pass1", "c1", "s3cret")).await,
            Err(AccountError::Validation(ValidationError::EmptyEmail))
        ));
        assert!(matches!(
            h.issue_token().execute(login("a@b.com", "", "c1", "s3cret")).await,
            Err(AccountError::Validation(ValidationError::EmptyPassword))
        ));
        assert!(matches!(
            h.issue_token().execute(login("a@b.com", "abc", "c1", "s3cret")).await,
            Err(AccountError::Validation(ValidationError::MinimumPassword))
        ));
    }
}

#[cfg(test)]
mod router_tests {
    use std::sync::Arc;

    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use platform::cache::MemoryCache;
    use platform::crypto::to_base64;
    use platform::token::Claims;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::application::config::AccountConfig;
    use crate::infra::{CacheAsideRepository, MemoryRepositories, MemoryStore};
    use crate::presentation::handlers::AccountAppState;
    use crate::presentation::router::account_router_generic;

    fn app() -> (Router, AccountConfig) {
        let config = AccountConfig::with_random_secrets();
        let cache = Arc::new(MemoryCache::new());
        let state = AccountAppState::<MemoryRepositories>::new(
            CacheAsideRepository::new(
                Arc::new(MemoryStore::new()),
                cache.clone(),
                config.accounts.clone(),
            ),
            CacheAsideRepository::new(
                Arc::new(MemoryStore::new()),
                cache.clone(),
                config.roles.clone(),
            ),
            CacheAsideRepository::new(
                Arc::new(MemoryStore::new()),
                cache,
                config.account_roles.clone(),
            ),
            config.clone(),
        );
        (account_router_generic(state), config)
    }

    fn token(config: &AccountConfig, id: i64, scope: &str) -> String {
        config
            .token_signer()
            .sign(&Claims {
                id,
                username: "root@b.com".into(),
                exp: chrono::Utc::now().timestamp() + 600,
                scope: scope.into(),
            })
            .unwrap()
    }

    fn json_request(method: &str, uri: &str, bearer: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn register_body(email: &str) -> Value {
        json!({
            "name": "A",
            "email": email,
            "password": "pass1",
            "confirm_password": "pass1",
        })
    }

    #[tokio::test]
    async fn test_register_then_login_over_http() {
        let (app, config) = app();
        let sup = token(&config, 999, "sup");

        let (status, body) = send(
            &app,
            json_request("POST", "/register", None, register_body("a@b.com")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status_code"], 201);
        assert_eq!(body["data"]["email"], "a@b.com");
        assert!(body["data"].get("password").is_none());
        let account_id = body["data"]["id"].as_i64().unwrap();

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/role",
                Some(&sup),
                json!({ "scope": "admin", "client_id": "c1", "client_secret": "s3cret" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["data"].get("client_secret").is_none());
        let role_id = body["data"]["id"].as_i64().unwrap();

        let (status, _) = send(
            &app,
            json_request(
                "POST",
                "/account-role",
                Some(&sup),
                json!({ "account_id": account_id, "role_id": role_id }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let login = Request::builder()
            .method("POST")
            .uri("/oauth2")
            .header(
                header::AUTHORIZATION,
                format!("Basic {}", to_base64(b"c1:s3cret")),
            )
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("username=a%40b.com&password=pass1"))
            .unwrap();
        let (status, body) = send(&app, login).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status_code"], 200);
        assert_eq!(body["token_type"], "Bearer");
        assert_eq!(body["scope"], "admin");
        let access_token = body["access_token"].as_str().unwrap().to_string();

        let me = Request::builder()
            .uri("/me")
            .header(header::AUTHORIZATION, format!("Bearer {access_token}"))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, me).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["id"], account_id);
    }

    #[tokio::test]
    async fn test_json_login_with_header_credentials() {
        let (app, config) = app();
        let sup = token(&config, 999, "sup");
        send(&app, json_request("POST", "/register", None, register_body("a@b.com"))).await;
        send(
            &app,
            json_request(
                "POST",
                "/role",
                Some(&sup),
                json!({ "scope": "cus", "client_id": "c1", "client_secret": "s3cret" }),
            ),
        )
        .await;
        send(
            &app,
            json_request(
                "POST",
                "/account-role",
                Some(&sup),
                json!({ "account_id": 1, "role_id": 1 }),
            ),
        )
        .await;

        let mut req = json_request(
            "POST",
            "/oauth2",
            None,
            json!({ "username": "a@b.com", "password": "pass1" }),
        );
        req.headers_mut()
            .insert("client_id", "c1".parse().unwrap());
        req.headers_mut()
            .insert("client_secret", "s3cret".parse().unwrap());

        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["scope"], "cus");
    }

    #[tokio::test]
    async fn test_missing_token_envelope() {
        let (app, _) = app();
        let req = Request::builder()
            .uri("/me")
            .header("x-request-id", "req-42")
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["status_code"], 401);
        assert_eq!(body["transaction_info"]["error_code"], 401000);
        assert_eq!(body["transaction_info"]["request_id"], "req-42");
        assert_eq!(body["transaction_info"]["request_uri"], "/me");
        assert_eq!(body["transaction_info"]["request_method"], "GET");
        assert_eq!(
            body["translation"]["en"],
            "Access not authorized! Please login again!"
        );
    }

    #[tokio::test]
    async fn test_generated_request_id() {
        let (app, _) = app();
        let response = app
            .oneshot(json_request("POST", "/register", None, json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let request_id = response.headers()["x-request-id"].to_str().unwrap().to_string();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["transaction_info"]["request_id"], request_id.as_str());
        assert_eq!(body["transaction_info"]["error_code"], 40008);
    }

    #[tokio::test]
    async fn test_scope_gate_and_validation_codes() {
        let (app, config) = app();
        let customer = token(&config, 5, "cus");
        let sup = token(&config, 999, "sup");

        let (status, body) = send(&app, json_request("GET", "/role", Some(&customer), json!({}))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["transaction_info"]["error_code"], 403000);

        let oauth = json_request(
            "POST",
            "/oauth2",
            None,
            json!({ "username": "a@b.com", "password": "pass1" }),
        );
        let (status, body) = send(&app, oauth).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["transaction_info"]["error_code"], 40017);

        let (status, body) = send(
            &app,
            json_request("GET", "/role?order_by=client_secret", Some(&sup), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["transaction_info"]["error_code"], 40000);

        let (status, _) = send(&app, json_request("GET", "/account/abc", Some(&sup), json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_role_list_by_client_id_alias() {
        let (app, config) = app();
        let sup = token(&config, 999, "sup");
        for client_id in ["c1", "c2"] {
            send(
                &app,
                json_request(
                    "POST",
                    "/role",
                    Some(&sup),
                    json!({ "scope": "cus", "client_id": client_id, "client_secret": "s" }),
                ),
            )
            .await;
        }

        let req = Request::builder()
            .uri("/role?cid=c2&limit=5")
            .header(header::AUTHORIZATION, format!("Bearer {sup}"))
            .header(header::CACHE_CONTROL, "must-revalidate")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["client_id"], "c2");
        assert_eq!(body["pagination"]["total_elements"], 1);
        assert_eq!(body["pagination"]["total_pages"], 1);
        assert_eq!(body["pagination"]["limit"], 5);
    }

    #[tokio::test]
    async fn test_account_list_email_filter_ignores_case() {
        let (app, config) = app();
        let sup = token(&config, 999, "sup");
        for email in ["alice@b.com", "bob@b.com"] {
            send(&app, json_request("POST", "/register", None, register_body(email))).await;
        }

        let (status, body) = send(
            &app,
            json_request("GET", "/account?email=Alice@B.COM", Some(&sup), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["email"], "alice@b.com");
    }

    #[tokio::test]
    async fn test_list_page_past_offset_range_is_bad_request() {
        let (app, config) = app();
        let sup = token(&config, 999, "sup");

        let (status, body) = send(
            &app,
            json_request(
                "GET",
                "/account?page=9223372036854775807",
                Some(&sup),
                json!({}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["transaction_info"]["error_code"], 40000);
    }

    #[tokio::test]
    async fn test_customer_cannot_touch_other_accounts() {
        let (app, config) = app();
        send(&app, json_request("POST", "/register", None, register_body("a@b.com"))).await;
        send(&app, json_request("POST", "/register", None, register_body("o@b.com"))).await;
        let customer = token(&config, 1, "cus");

        let (status, _) = send(
            &app,
            json_request("PUT", "/account/2", Some(&customer), json!({ "name": "X" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(
            &app,
            json_request("PUT", "/me", Some(&customer), json!({ "name": "Me" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Me");

        let (status, body) = send(
            &app,
            json_request("DELETE", "/account/1", Some(&customer), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["deleted_at"].is_string());
    }
}
