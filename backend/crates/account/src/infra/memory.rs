//! In-memory store for development and tests
//!
//! Matches filters against each record's JSON form, so one implementation
//! serves every entity. Counts reads and writes for spy assertions.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering as AtomicOrdering};

use kernel::pagination::SortKey;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::repository::{Entity, EntityFilter, EntityStore, FilterOf};
use crate::error::{AccountError, AccountResult, StoreOp};

pub struct MemoryStore<E> {
    rows: RwLock<BTreeMap<i64, E>>,
    next_id: AtomicI64,
    reads: AtomicUsize,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl<E> Default for MemoryStore<E> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            fail_writes: AtomicBool::new(false),
        }
    }
}

impl<E: Entity> MemoryStore<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of read calls (`count`, `find_one`, `query`) served
    pub fn reads(&self) -> usize {
        self.reads.load(AtomicOrdering::SeqCst)
    }

    /// Number of write calls attempted
    pub fn writes(&self) -> usize {
        self.writes.load(AtomicOrdering::SeqCst)
    }

    /// Make every following write fail as a store error
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, AtomicOrdering::SeqCst);
    }

    /// Stored row by identity, deleted or not, bypassing the counters
    pub fn row(&self, id: i64) -> Option<E> {
        self.rows.read().get(&id).cloned()
    }

    fn begin_write(&self, op: StoreOp) -> AccountResult<()> {
        self.writes.fetch_add(1, AtomicOrdering::SeqCst);
        if self.fail_writes.load(AtomicOrdering::SeqCst) {
            return Err(AccountError::store(op, "store unavailable"));
        }
        Ok(())
    }

    /// Live (or, for identity lookups, all) rows matching `filter`
    fn select(&self, filter: &FilterOf<E>, prefix: bool) -> AccountResult<Vec<(E, Value)>> {
        let constraints = to_object(filter)?;
        let include_deleted = !prefix && filter.is_identity_lookup();

        let rows = self.rows.read();
        let mut selected = Vec::new();
        for record in rows.values() {
            if !include_deleted && !record.audit().is_live() {
                continue;
            }
            let json = serde_json::to_value(record)
                .map_err(|e| AccountError::store(StoreOp::Get, e))?;
            if matches_all(&constraints, &json, prefix) {
                selected.push((record.clone(), json));
            }
        }
        Ok(selected)
    }
}

fn to_object<T: Serialize>(value: &T) -> AccountResult<Map<String, Value>> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(AccountError::Internal(format!(
            "filter is not an object: {other}"
        ))),
        Err(e) => Err(AccountError::Internal(e.to_string())),
    }
}

/// Field of a record, looking into the audit block for audit columns
fn field<'a>(record: &'a Value, name: &str) -> Option<&'a Value> {
    record
        .get(name)
        .or_else(|| record.get("audit").and_then(|audit| audit.get(name)))
}

fn matches_all(constraints: &Map<String, Value>, record: &Value, prefix: bool) -> bool {
    constraints.iter().all(|(name, expected)| {
        match (field(record, name), expected) {
            (Some(Value::String(actual)), Value::String(wanted)) if prefix => {
                actual.starts_with(wanted.as_str())
            }
            (Some(actual), wanted) => actual == wanted,
            (None, _) => false,
        }
    })
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

impl<E: Entity> EntityStore for MemoryStore<E> {
    type Entity = E;

    async fn count(&self, filter: &FilterOf<E>) -> AccountResult<i64> {
        self.reads.fetch_add(1, AtomicOrdering::SeqCst);
        Ok(self.select(filter, true)?.len() as i64)
    }

    async fn find_one(&self, filter: &FilterOf<E>) -> AccountResult<E> {
        self.reads.fetch_add(1, AtomicOrdering::SeqCst);
        self.select(filter, false)?
            .into_iter()
            .next()
            .map(|(record, _)| record)
            .ok_or(AccountError::NotFound)
    }

    async fn query(
        &self,
        filter: &FilterOf<E>,
        offset: i64,
        limit: i64,
        order_by: &[SortKey],
    ) -> AccountResult<Vec<E>> {
        self.reads.fetch_add(1, AtomicOrdering::SeqCst);
        let mut rows = self.select(filter, true)?;

        // Stable sort keeps identity order as the final tiebreak.
        rows.sort_by(|(_, a), (_, b)| {
            order_by
                .iter()
                .map(|key| {
                    let ordering = compare(field(a, &key.field), field(b, &key.field));
                    if key.descending {
                        ordering.reverse()
                    } else {
                        ordering
                    }
                })
                .find(|ordering| ordering.is_ne())
                .unwrap_or(Ordering::Equal)
        });

        Ok(rows
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|(record, _)| record)
            .collect())
    }

    async fn insert(&self, mut record: E) -> AccountResult<E> {
        self.begin_write(StoreOp::Insert)?;
        let id = self.next_id.fetch_add(1, AtomicOrdering::SeqCst);
        record.assign_id(id);
        self.rows.write().insert(id, record.clone());
        Ok(record)
    }

    async fn update(&self, record: &E) -> AccountResult<()> {
        self.begin_write(StoreOp::Update)?;
        match self.rows.write().get_mut(&record.id()) {
            Some(row) => {
                *row = record.clone();
                Ok(())
            }
            None => Err(AccountError::NotFound),
        }
    }

    async fn delete(&self, record: &E, hard: bool) -> AccountResult<()> {
        self.begin_write(StoreOp::Delete)?;
        let mut rows = self.rows.write();
        if !rows.contains_key(&record.id()) {
            return Err(AccountError::NotFound);
        }

        if hard {
            rows.remove(&record.id());
        } else {
            rows.insert(record.id(), record.clone());
        }
        Ok(())
    }
}
