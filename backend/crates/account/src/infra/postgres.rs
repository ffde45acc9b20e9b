//! PostgreSQL Store Implementation
//!
//! One generic [`EntityStore`] over [`PgRecord`], the per-entity table
//! mapping. Every write runs in its own transaction that is committed on
//! success and rolled back on any failure before the call returns.

use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use kernel::audit::Audit;
use kernel::pagination::SortKey;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction};

use crate::domain::entity::{Account, AccountRole, Role};
use crate::domain::filter::{AccountFilter, AccountRoleFilter, RoleFilter};
use crate::domain::repository::{Entity, EntityFilter, EntityStore, FilterOf};
use crate::domain::value_object::{
    AccountId, AccountRoleId, Email, EncryptedSecret, PasswordHash, RoleId, Scope,
};
use crate::error::{AccountError, AccountResult, StoreOp};

// ============================================================================
// Table mapping
// ============================================================================

/// A bindable column value
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    BigInt(i64),
    NullableBigInt(Option<i64>),
    Timestamp(DateTime<Utc>),
    NullableTimestamp(Option<DateTime<Utc>>),
}

/// Mapping of an entity onto its table
pub trait PgRecord: Entity {
    const TABLE: &'static str;

    /// Select list, identity and audit columns included
    const COLUMNS: &'static str;

    type Row: for<'r> FromRow<'r, PgRow> + Send + Unpin;

    fn from_row(row: Self::Row) -> Self;

    /// Natural columns, in insert order
    fn values(&self) -> Vec<(&'static str, SqlValue)>;

    /// Constraints set on `filter`
    fn filter_values(filter: &Self::Filter) -> Vec<(&'static str, SqlValue)>;
}

fn audit_values(audit: &Audit) -> [(&'static str, SqlValue); 6] {
    [
        ("created_by", SqlValue::BigInt(audit.created_by)),
        ("created_at", SqlValue::Timestamp(audit.created_at)),
        ("updated_by", SqlValue::BigInt(audit.updated_by)),
        ("updated_at", SqlValue::Timestamp(audit.updated_at)),
        ("deleted_by", SqlValue::NullableBigInt(audit.deleted_by)),
        ("deleted_at", SqlValue::NullableTimestamp(audit.deleted_at)),
    ]
}

fn push_value(qb: &mut QueryBuilder<'_, Postgres>, value: SqlValue) {
    match value {
        SqlValue::Text(v) => qb.push_bind(v),
        SqlValue::BigInt(v) => qb.push_bind(v),
        SqlValue::NullableBigInt(v) => qb.push_bind(v),
        SqlValue::Timestamp(v) => qb.push_bind(v),
        SqlValue::NullableTimestamp(v) => qb.push_bind(v),
    };
}

/// Escape `LIKE` metacharacters so user input only ever matches literally
fn escape_like(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Append ` AND column = $n` per constraint; text uses `LIKE 'x%'` when `prefix`
fn push_filter<E: PgRecord>(qb: &mut QueryBuilder<'_, Postgres>, filter: &E::Filter, prefix: bool) {
    for (column, value) in E::filter_values(filter) {
        match value {
            SqlValue::Text(text) if prefix => {
                qb.push(format!(" AND {column} LIKE "));
                qb.push_bind(format!("{}%", escape_like(&text)));
            }
            value => {
                qb.push(format!(" AND {column} = "));
                push_value(qb, value);
            }
        }
    }
}

/// Commit on success; on failure roll back and return the original error
async fn settle<T>(tx: Transaction<'static, Postgres>, result: AccountResult<T>) -> AccountResult<T> {
    match result {
        Ok(value) => {
            tx.commit()
                .await
                .map_err(|e| AccountError::store(StoreOp::Commit, e))?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback) = tx.rollback().await {
                tracing::warn!(error = %rollback, "Rollback failed");
            }
            Err(err)
        }
    }
}

// ============================================================================
// Store
// ============================================================================

/// PostgreSQL-backed store of one entity
pub struct PgStore<E> {
    pool: PgPool,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for PgStore<E> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: PgRecord> PgStore<E> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    async fn begin(&self) -> AccountResult<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|e| AccountError::store(StoreOp::Transaction, e))
    }

    /// `UPDATE ... SET <every column> WHERE id = $n`
    async fn write_all_columns(&self, record: &E, op: StoreOp) -> AccountResult<()> {
        let mut tx = self.begin().await?;

        let mut qb = QueryBuilder::<Postgres>::new(format!("UPDATE {} SET ", E::TABLE));
        let columns = record.values().into_iter().chain(audit_values(record.audit()));
        for (i, (column, value)) in columns.enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(format!("{column} = "));
            push_value(&mut qb, value);
        }
        qb.push(" WHERE id = ");
        qb.push_bind(record.id());

        let result = match qb.build().execute(&mut *tx).await {
            Ok(done) if done.rows_affected() == 0 => Err(AccountError::NotFound),
            Ok(_) => Ok(()),
            Err(e) => Err(AccountError::store(op, e)),
        };

        settle(tx, result).await
    }
}

impl<E: PgRecord> EntityStore for PgStore<E> {
    type Entity = E;

    async fn count(&self, filter: &FilterOf<E>) -> AccountResult<i64> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT COUNT(*) FROM {} WHERE deleted_at IS NULL",
            E::TABLE
        ));
        push_filter::<E>(&mut qb, filter, true);

        qb.build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AccountError::store(StoreOp::Get, e))
    }

    async fn find_one(&self, filter: &FilterOf<E>) -> AccountResult<E> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM {} WHERE TRUE",
            E::COLUMNS,
            E::TABLE
        ));
        if !filter.is_identity_lookup() {
            qb.push(" AND deleted_at IS NULL");
        }
        push_filter::<E>(&mut qb, filter, false);
        qb.push(" ORDER BY id LIMIT 1");

        let row = qb
            .build_query_as::<E::Row>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AccountError::store(StoreOp::Get, e))?;

        row.map(E::from_row).ok_or(AccountError::NotFound)
    }

    async fn query(
        &self,
        filter: &FilterOf<E>,
        offset: i64,
        limit: i64,
        order_by: &[SortKey],
    ) -> AccountResult<Vec<E>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM {} WHERE deleted_at IS NULL",
            E::COLUMNS,
            E::TABLE
        ));
        push_filter::<E>(&mut qb, filter, true);

        // Sort fields were checked against SORTABLE_FIELDS.
        qb.push(" ORDER BY ");
        for key in order_by {
            qb.push(format!("{} {}, ", key.field, key.direction()));
        }
        qb.push("id ASC LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let rows = qb
            .build_query_as::<E::Row>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AccountError::store(StoreOp::Get, e))?;

        Ok(rows.into_iter().map(E::from_row).collect())
    }

    async fn insert(&self, mut record: E) -> AccountResult<E> {
        let mut tx = self.begin().await?;

        let columns: Vec<_> = record
            .values()
            .into_iter()
            .chain(audit_values(record.audit()))
            .collect();

        let mut qb = QueryBuilder::<Postgres>::new(format!("INSERT INTO {} (", E::TABLE));
        let names: Vec<_> = columns.iter().map(|(column, _)| *column).collect();
        qb.push(names.join(", "));
        qb.push(") VALUES (");
        for (i, (_, value)) in columns.into_iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            push_value(&mut qb, value);
        }
        qb.push(") RETURNING id");

        let result = qb
            .build_query_scalar::<i64>()
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| AccountError::store(StoreOp::Insert, e));

        let id = settle(tx, result).await?;
        record.assign_id(id);
        Ok(record)
    }

    async fn update(&self, record: &E) -> AccountResult<()> {
        self.write_all_columns(record, StoreOp::Update).await
    }

    async fn delete(&self, record: &E, hard: bool) -> AccountResult<()> {
        if !hard {
            return self.write_all_columns(record, StoreOp::Delete).await;
        }

        let mut tx = self.begin().await?;

        let mut qb = QueryBuilder::<Postgres>::new(format!("DELETE FROM {} WHERE id = ", E::TABLE));
        qb.push_bind(record.id());

        let result = match qb.build().execute(&mut *tx).await {
            Ok(done) if done.rows_affected() == 0 => Err(AccountError::NotFound),
            Ok(_) => Ok(()),
            Err(e) => Err(AccountError::store(StoreOp::Delete, e)),
        };

        settle(tx, result).await
    }
}

// ============================================================================
// Row mappings
// ============================================================================

#[derive(FromRow)]
struct AuditRow {
    created_by: i64,
    created_at: DateTime<Utc>,
    updated_by: i64,
    updated_at: DateTime<Utc>,
    deleted_by: Option<i64>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<AuditRow> for Audit {
    fn from(row: AuditRow) -> Self {
        Audit {
            created_by: row.created_by,
            created_at: row.created_at,
            updated_by: row.updated_by,
            updated_at: row.updated_at,
            deleted_by: row.deleted_by,
            deleted_at: row.deleted_at,
        }
    }
}

fn text(value: &Option<String>) -> Option<SqlValue> {
    value.clone().map(SqlValue::Text)
}

fn bigint(value: Option<i64>) -> Option<SqlValue> {
    value.map(SqlValue::BigInt)
}

#[derive(FromRow)]
pub struct AccountRow {
    id: i64,
    name: String,
    email: String,
    password: String,
    #[sqlx(flatten)]
    audit: AuditRow,
}

impl PgRecord for Account {
    const TABLE: &'static str = "account";
    const COLUMNS: &'static str = "id, name, email, password, \
        created_by, created_at, updated_by, updated_at, deleted_by, deleted_at";

    type Row = AccountRow;

    fn from_row(row: AccountRow) -> Self {
        Account {
            id: AccountId::new(row.id),
            name: row.name,
            email: Email::from_db(row.email),
            password: PasswordHash::from_db(row.password),
            audit: row.audit.into(),
        }
    }

    fn values(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("name", SqlValue::Text(self.name.clone())),
            ("email", SqlValue::Text(self.email.as_str().to_string())),
            ("password", SqlValue::Text(self.password.as_str().to_string())),
        ]
    }

    fn filter_values(filter: &AccountFilter) -> Vec<(&'static str, SqlValue)> {
        [
            ("id", bigint(filter.id)),
            ("email", text(&filter.email)),
            ("name", text(&filter.name)),
        ]
        .into_iter()
        .filter_map(|(column, value)| value.map(|v| (column, v)))
        .collect()
    }
}

#[derive(FromRow)]
pub struct RoleRow {
    id: i64,
    scope: String,
    client_id: String,
    client_secret: String,
    #[sqlx(flatten)]
    audit: AuditRow,
}

impl PgRecord for Role {
    const TABLE: &'static str = "role";
    const COLUMNS: &'static str = "id, scope, client_id, client_secret, \
        created_by, created_at, updated_by, updated_at, deleted_by, deleted_at";

    type Row = RoleRow;

    fn from_row(row: RoleRow) -> Self {
        Role {
            id: RoleId::new(row.id),
            scope: Scope::from_db(row.scope),
            client_id: row.client_id,
            client_secret: EncryptedSecret::from_db(row.client_secret),
            audit: row.audit.into(),
        }
    }

    fn values(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("scope", SqlValue::Text(self.scope.as_str().to_string())),
            ("client_id", SqlValue::Text(self.client_id.clone())),
            (
                "client_secret",
                SqlValue::Text(self.client_secret.as_str().to_string()),
            ),
        ]
    }

    fn filter_values(filter: &RoleFilter) -> Vec<(&'static str, SqlValue)> {
        [
            ("id", bigint(filter.id)),
            ("scope", text(&filter.scope)),
            ("client_id", text(&filter.client_id)),
        ]
        .into_iter()
        .filter_map(|(column, value)| value.map(|v| (column, v)))
        .collect()
    }
}

#[derive(FromRow)]
pub struct AccountRoleRow {
    id: i64,
    account_id: i64,
    role_id: i64,
    #[sqlx(flatten)]
    audit: AuditRow,
}

impl PgRecord for AccountRole {
    const TABLE: &'static str = "account_role";
    const COLUMNS: &'static str = "id, account_id, role_id, \
        created_by, created_at, updated_by, updated_at, deleted_by, deleted_at";

    type Row = AccountRoleRow;

    fn from_row(row: AccountRoleRow) -> Self {
        AccountRole {
            id: AccountRoleId::new(row.id),
            account_id: AccountId::new(row.account_id),
            role_id: RoleId::new(row.role_id),
            audit: row.audit.into(),
        }
    }

    fn values(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("account_id", SqlValue::BigInt(self.account_id.value())),
            ("role_id", SqlValue::BigInt(self.role_id.value())),
        ]
    }

    fn filter_values(filter: &AccountRoleFilter) -> Vec<(&'static str, SqlValue)> {
        [
            ("id", bigint(filter.id)),
            ("account_id", bigint(filter.account_id)),
            ("role_id", bigint(filter.role_id)),
        ]
        .into_iter()
        .filter_map(|(column, value)| value.map(|v| (column, v)))
        .collect()
    }
}
