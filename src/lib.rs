//! # reef
//!
//! A small framework for JSON APIs built from a tree of routes. Each route
//! owns a chain of filters, an optional input schema and an optional output
//! schema, and answers every request with the same envelope:
//!
//! ```json
//! {"status": 0, "data": 5, "errmsg": ""}
//! ```
//!
//! ## The contract
//!
//! - Any path a route is registered at answers any HTTP method.
//! - Parameters come from the query string and form body, merged into one
//!   map. Values that are JSON objects become nested maps.
//! - `status` is `0` on success; framework failures use `1..=4`, and
//!   applications pick their own codes from `10000` up.
//! - Every route also serves a generated HTML description of itself and its
//!   children at `<path>/doc`.
//!
//! Routing is exact-match over a radix tree ([`matchit`]); the tree is
//! compiled once at startup and shared read-only by every connection.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use reef::{Checker, Context, Router, Server, Status};
//! use reef::rule::Rule;
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Router::new().route("/math", |math| {
//!         math.describe("arithmetic").child("add", |add| {
//!             add.describe("a + b")
//!                 .input(Checker::new().rule("a", "int").rule("b", "int"))
//!                 .output(Checker::new().rule("status", Rule::in_status(&[])))
//!                 .filter(add_numbers)
//!         })
//!     });
//!
//!     if let Err(e) = Server::bind("0.0.0.0:3000").unwrap().serve(app).await {
//!         reef::telemetry::fatal(e);
//!     }
//! }
//!
//! fn add_numbers(ctx: &mut Context) -> bool {
//!     match (ctx.int("a"), ctx.int("b")) {
//!         (Some(a), Some(b)) => {
//!             ctx.set_data(a + b);
//!             true
//!         }
//!         _ => ctx.fail(Status::INVALID_PARAM, "a and b are required"),
//!     }
//! }
//! ```

mod context;
mod endpoint;
mod error;
mod filter;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod checker;
pub mod config;
pub mod convert;
pub mod doc;
pub mod middleware;
pub mod rule;
pub mod store;
pub mod telemetry;

pub use async_trait::async_trait;
pub use checker::{Checker, Rejection, Schema};
pub use context::Context;
pub use doc::{Doc, DocPage};
pub use error::Error;
pub use filter::{ABORTED_ERRMSG, Filter, FilterChain};
pub use request::Request;
pub use response::{ContentType, Envelope, Response};
pub use router::{Route, RouteTable, Router, doc_path_of, join_path};
pub use rule::{Kind, Quantifier, Rule, RuleError, RuleSet};
pub use server::Server;
pub use status::Status;
