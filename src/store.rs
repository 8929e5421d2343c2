//! Collaborator contracts for filters that talk to a database or a cache.
//!
//! reef never calls these itself. Applications hand `Arc<dyn Storage>` /
//! `Arc<dyn Cache>` handles to the filters that need them, and those filters
//! translate a missing result into a status on the context:
//!
//! ```rust
//! use std::sync::Arc;
//! use reef::{Context, Filter, Status};
//! use reef::store::Storage;
//!
//! struct LoadUser {
//!     db: Arc<dyn Storage>,
//! }
//!
//! #[reef::async_trait]
//! impl Filter for LoadUser {
//!     async fn call(&self, ctx: &mut Context) -> bool {
//!         let id = ctx.int("id").unwrap_or_default();
//!         match self.db.select("select * from user where id = ?", &[id.into()]).await {
//!             Some(rows) => {
//!                 ctx.set_data(rows);
//!                 true
//!             }
//!             None => ctx.fail(Status::ERROR_DB, "user lookup failed"),
//!         }
//!     }
//! }
//! ```

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};

/// One result row, column name to value.
pub type Row = Map<String, Value>;

/// A relational store. `None` means the operation failed; the implementation
/// logs the cause.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    async fn select(&self, query: &str, args: &[Value]) -> Option<Vec<Row>>;

    /// Returns the number of affected rows.
    async fn update(&self, query: &str, args: &[Value]) -> Option<u64>;

    /// Returns the id of the inserted row.
    async fn insert(&self, query: &str, args: &[Value]) -> Option<i64>;

    async fn begin(&self) -> Option<Box<dyn Transaction>>;
}

/// An open transaction. Dropping it without [`commit`](Transaction::commit)
/// is up to the implementation; call [`rollback`](Transaction::rollback) to
/// be explicit.
#[async_trait]
pub trait Transaction: Send {
    async fn select(&mut self, query: &str, args: &[Value]) -> Option<Vec<Row>>;
    async fn update(&mut self, query: &str, args: &[Value]) -> Option<u64>;
    async fn insert(&mut self, query: &str, args: &[Value]) -> Option<i64>;

    async fn commit(self: Box<Self>) -> bool;
    async fn rollback(self: Box<Self>) -> bool;
}

/// A key-value cache.
#[async_trait]
pub trait Cache: Send + Sync + 'static {
    async fn get(&self, key: &str) -> Option<Value>;
    async fn set(&self, key: &str, value: Value) -> bool;

    /// Sets a time to live on an existing key. Returns `false` if the key is
    /// absent.
    async fn expire(&self, key: &str, ttl: Duration) -> bool;
}

struct Entry {
    value: Value,
    deadline: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.deadline.is_none_or(|d| now < d)
    }
}

/// In-process [`Cache`]. Expired keys are evicted when next touched.
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<String, Entry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys, expired ones included until they are touched.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Option<Value> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if entry.is_live(now) {
                return Some(entry.value.clone());
            }
        }
        self.entries.remove_if(key, |_, e| !e.is_live(now));
        None
    }

    async fn set(&self, key: &str, value: Value) -> bool {
        self.entries.insert(key.to_owned(), Entry { value, deadline: None });
        true
    }

    async fn expire(&self, key: &str, ttl: Duration) -> bool {
        let now = Instant::now();
        match self.entries.get_mut(key) {
            Some(mut entry) if entry.is_live(now) => {
                entry.deadline = Some(now + ttl);
                true
            }
            _ => false,
        }
    }
}
