//! The route tree and the lookup table compiled from it.
//!
//! Routes are declared as a tree: each child's path is its parent's path
//! plus a relative segment, and every route gets a sibling `doc` path. The
//! tree is only a registration device. [`Router::build`] flattens it into a
//! [`RouteTable`] of exact paths, which is what serves requests and is never
//! modified again.
//!
//! ```rust
//! use reef::{Checker, Context, Router};
//!
//! let app = Router::new().route("/", |root| {
//!     root.child("math", |math| {
//!         math.child("add", |add| {
//!             add.describe("adds two integers")
//!                 .input(Checker::new().rule("a", "int").rule("b", "int"))
//!                 .filter(|ctx: &mut Context| {
//!                     let sum = ctx.int("a").unwrap_or(0) + ctx.int("b").unwrap_or(0);
//!                     ctx.set_data(sum);
//!                     true
//!                 })
//!         })
//!     })
//! });
//!
//! let table = app.build().unwrap();
//! assert!(table.contains("/math/add"));
//! assert!(table.contains("/math/add/doc"));
//! assert!(!table.contains("/math/add/"));
//! ```

use std::sync::Arc;

use matchit::Router as MatchitRouter;
use tracing::{debug, error, info};

use crate::checker::Checker;
use crate::context::Context;
use crate::doc::{self, Doc};
use crate::endpoint::Endpoint;
use crate::error::Error;
use crate::filter::{Filter, FilterChain};
use crate::request::Request;
use crate::response::{ContentType, Response};

// ── Path composition ──────────────────────────────────────────────────────────

/// Joins a parent path and a relative segment with exactly one `/` between
/// them. `None` for an empty segment.
pub fn join_path(parent: &str, relative: &str) -> Option<String> {
    if relative.is_empty() {
        return None;
    }
    let joined = match (parent.ends_with('/'), relative.starts_with('/')) {
        (true, true) => format!("{parent}{}", &relative[1..]),
        (false, false) => format!("{parent}/{relative}"),
        _ => format!("{parent}{relative}"),
    };
    Some(joined)
}

/// `path` + `/doc`, with the same separator handling as [`join_path`].
pub fn doc_path_of(path: &str) -> String {
    if path.ends_with('/') { format!("{path}doc") } else { format!("{path}/doc") }
}

// ── Route ─────────────────────────────────────────────────────────────────────

/// One node of the tree: a path, its docs and checkers, a filter chain, and
/// children.
pub struct Route {
    doc: Doc,
    chain: FilterChain,
    children: Vec<Route>,
}

impl Route {
    fn new(path: String) -> Self {
        let doc = Doc { doc_path: doc_path_of(&path), path, ..Doc::default() };
        Self { doc, chain: FilterChain::new(), children: Vec::new() }
    }

    pub fn path(&self) -> &str { &self.doc.path }
    pub fn doc_path(&self) -> &str { &self.doc.doc_path }
    pub fn doc(&self) -> &Doc { &self.doc }
    pub fn chain(&self) -> &FilterChain { &self.chain }
    pub fn children(&self) -> &[Route] { &self.children }

    /// Free text shown on the doc page.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.doc.description = description.into();
        self
    }

    /// Parameters are checked against `checker` before any filter runs.
    pub fn input(mut self, checker: Checker) -> Self {
        self.doc.input = Some(checker);
        self
    }

    /// The `{status, data, errmsg}` envelope is checked against `checker`
    /// after the chain completes.
    pub fn output(mut self, checker: Checker) -> Self {
        self.doc.output = Some(checker);
        self
    }

    /// Appends a filter to the chain.
    pub fn filter(mut self, filter: impl Filter) -> Self {
        self.chain.push(filter);
        self
    }

    /// Registers a child at `self.path() + relative`. An empty `relative`
    /// is logged and the child is not registered.
    pub fn child(mut self, relative: &str, build: impl FnOnce(Route) -> Route) -> Self {
        match join_path(self.path(), relative) {
            Some(path) => self.children.push(build(Route::new(path))),
            None => error!(parent = self.path(), "empty route path, child not registered"),
        }
        self
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("path", &self.doc.path)
            .field("chain", &self.chain)
            .field("children", &self.children)
            .finish()
    }
}

// ── Router ────────────────────────────────────────────────────────────────────

/// The set of top-level routes. Build it once at startup.
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a top-level route. A missing leading `/` is added.
    pub fn route(mut self, path: &str, build: impl FnOnce(Route) -> Route) -> Self {
        let path = if path.starts_with('/') { path.to_owned() } else { format!("/{path}") };
        self.routes.push(build(Route::new(path)));
        self
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Flattens the tree into a lookup table. Every route and every doc page
    /// gets its own exact path; two registrations of the same path are an
    /// error.
    pub fn build(self) -> Result<RouteTable, Error> {
        let mut table = RouteTable { tree: MatchitRouter::new(), paths: Vec::new() };
        for route in &self.routes {
            table.register_docs(route)?;
        }
        for route in self.routes {
            table.register(route)?;
        }
        Ok(table)
    }
}

// ── RouteTable ────────────────────────────────────────────────────────────────

/// Exact-path lookup over every registered route. Read-only once built.
pub struct RouteTable {
    tree: MatchitRouter<Arc<Endpoint>>,
    paths: Vec<String>,
}

impl RouteTable {
    /// Registered paths, routes and doc pages, in registration order.
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn contains(&self, path: &str) -> bool {
        self.lookup(path).is_some()
    }

    /// Dispatches one request. Unknown paths get a 404.
    pub async fn handle(&self, req: Request) -> Response {
        match self.lookup(req.path()) {
            Some(endpoint) => endpoint.handle(req).await,
            None => {
                debug!(path = req.path(), "no route");
                Response::not_found()
            }
        }
    }

    pub(crate) fn lookup(&self, path: &str) -> Option<Arc<Endpoint>> {
        let matched = self.tree.at(path).ok()?;
        Some(Arc::clone(matched.value))
    }

    fn insert(&mut self, path: &str, endpoint: Endpoint) -> Result<(), Error> {
        self.tree
            .insert(escape(path), Arc::new(endpoint))
            .map_err(|source| Error::Route { path: path.to_owned(), source })?;
        self.paths.push(path.to_owned());
        Ok(())
    }

    fn register(&mut self, route: Route) -> Result<(), Error> {
        info!(path = route.path(), filters = route.chain.len(), "register route");
        let Route { doc, chain, children } = route;
        self.insert(&doc.path, Endpoint::new(doc.path.clone(), doc.input, doc.output, chain))?;
        for child in children {
            self.register(child)?;
        }
        Ok(())
    }

    fn register_docs(&mut self, route: &Route) -> Result<(), Error> {
        info!(path = route.doc_path(), "register route doc");
        let html = doc::render_tree(route)
            .to_html()
            .map_err(|source| Error::Doc { path: route.doc_path().to_owned(), source })?;

        let mut chain = FilterChain::new();
        chain.push(move |ctx: &mut Context| {
            ctx.set_raw_as(ContentType::Html);
            ctx.set_data(html.as_str());
            true
        });
        self.insert(route.doc_path(), Endpoint::new(route.doc_path().to_owned(), None, None, chain))?;

        for child in route.children() {
            self.register_docs(child)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteTable").field("paths", &self.paths).finish()
    }
}

/// Paths are literal; braces must not read as matchit parameters.
fn escape(path: &str) -> String {
    path.replace('{', "{{").replace('}', "}}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_inserts_exactly_one_separator() {
        assert_eq!(join_path("/", "param").as_deref(), Some("/param"));
        assert_eq!(join_path("/param", "check").as_deref(), Some("/param/check"));
        assert_eq!(join_path("/param", "/check").as_deref(), Some("/param/check"));
        assert_eq!(join_path("/param/", "check").as_deref(), Some("/param/check"));
        assert_eq!(join_path("/param/", "/check").as_deref(), Some("/param/check"));
        assert_eq!(join_path("/param", ""), None);
    }

    #[test]
    fn doc_paths() {
        assert_eq!(doc_path_of("/"), "/doc");
        assert_eq!(doc_path_of("/math/add"), "/math/add/doc");
        assert_eq!(doc_path_of("/dir/"), "/dir/doc");
    }

    #[test]
    fn tree_composition() {
        let router = Router::new()
            .route("api", |api| api.child("users", |u| u.child("list", |l| l)))
            .route("/", |root| root.child("", |r| r.describe("never registered")));

        let api = &router.routes()[0];
        assert_eq!(api.path(), "/api");
        assert_eq!(api.children()[0].path(), "/api/users");
        assert_eq!(api.children()[0].children()[0].path(), "/api/users/list");
        assert_eq!(api.children()[0].children()[0].doc_path(), "/api/users/list/doc");
        assert!(router.routes()[1].children().is_empty());
    }

    #[test]
    fn table_holds_routes_and_docs() {
        let table = Router::new()
            .route("/", |root| root.child("a", |a| a.child("b", |b| b)))
            .build()
            .unwrap();

        for path in ["/", "/doc", "/a", "/a/doc", "/a/b", "/a/b/doc"] {
            assert!(table.contains(path), "missing {path}");
        }
        assert!(!table.contains("/a/"));
        assert!(!table.contains("/b"));
        assert_eq!(table.paths().len(), 6);
    }

    #[test]
    fn duplicate_paths_fail_to_build() {
        let err = Router::new()
            .route("/a", |a| a)
            .route("a", |a| a)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Route { ref path, .. } if path == "/a/doc" || path == "/a"));

        // A child called `doc` collides with its parent's doc page.
        let err = Router::new().route("/a", |a| a.child("doc", |d| d)).build().unwrap_err();
        assert!(matches!(err, Error::Route { .. }));
    }

    #[test]
    fn braces_are_literal() {
        let table = Router::new().route("/{id}", |r| r).build().unwrap();
        assert!(table.contains("/{id}"));
        assert!(!table.contains("/42"));
    }
}
