//! Filters and the chain that runs them.
//!
//! # What counts as a filter
//!
//! Any `Fn(&mut Context) -> bool` closure or function is a filter:
//!
//! ```rust
//! use reef::Context;
//!
//! fn hello(ctx: &mut Context) -> bool {
//!     ctx.set_data("hello");
//!     true
//! }
//! ```
//!
//! Filters that need to await something (a cache, a database) implement
//! [`Filter`] on a struct that owns their collaborator handles:
//!
//! ```rust
//! use std::sync::Arc;
//! use reef::{Context, Filter};
//! use reef::store::Cache;
//!
//! struct Lookup {
//!     cache: Arc<dyn Cache>,
//! }
//!
//! #[reef::async_trait]
//! impl Filter for Lookup {
//!     async fn call(&self, ctx: &mut Context) -> bool {
//!         let key = ctx.string("key").unwrap_or_default();
//!         let hit = self.cache.get(&key).await;
//!         ctx.set_data(hit.unwrap_or_default());
//!         true
//!     }
//! }
//! ```
//!
//! # How a chain runs
//!
//! Strictly in order. `true` hands the context to the next filter, `false`
//! stops the chain on the spot. A filter that stops the chain should say why
//! with [`Context::fail`]; if it does not, the chain fills in
//! [`Status::ERROR_UNKNOWN`] and a generic message.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::context::Context;
use crate::status::Status;

/// Message used when a filter stops the chain without setting one.
pub const ABORTED_ERRMSG: &str = "filter aborted";

/// One step of a route's chain.
#[async_trait]
pub trait Filter: Send + Sync + 'static {
    /// Returns `true` to continue with the next filter, `false` to stop.
    async fn call(&self, ctx: &mut Context) -> bool;

    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

#[async_trait]
impl<F> Filter for F
where
    F: Fn(&mut Context) -> bool + Send + Sync + 'static,
{
    async fn call(&self, ctx: &mut Context) -> bool {
        (self)(ctx)
    }
}

/// Type-erased filter, shared by every request hitting the route.
pub(crate) type BoxedFilter = Arc<dyn Filter>;

/// An ordered list of filters.
#[derive(Clone, Default)]
pub struct FilterChain {
    filters: Vec<BoxedFilter>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, filter: impl Filter) {
        self.filters.push(Arc::new(filter));
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Runs every filter in order. Returns `false` if one of them stopped
    /// the chain, after making sure the context carries a failure status and
    /// message.
    pub async fn run(&self, ctx: &mut Context) -> bool {
        for (index, filter) in self.filters.iter().enumerate() {
            if filter.call(ctx).await {
                continue;
            }

            warn!(path = ctx.path(), index, filter = filter.name(), "filter stopped the chain");
            if ctx.status().is_success() {
                ctx.set_status(Status::ERROR_UNKNOWN);
            }
            if ctx.errmsg().is_empty() {
                ctx.set_errmsg(ABORTED_ERRMSG);
            }
            return false;
        }
        true
    }
}

impl std::fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.filters.iter().map(|x| x.name())).finish()
    }
}
