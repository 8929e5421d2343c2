//! Ready-made filters.
//!
//! Small building blocks that show up in most route trees: a constant
//! greeting, a parameter echo for debugging, a plain-text probe, and a
//! [`Checker`] that runs in the middle of a chain instead of in front of it.
//!
//! ```rust
//! use reef::{Checker, Router, middleware};
//!
//! let app = Router::new().route("/", |root| {
//!     root.filter(middleware::text("hello"))
//!         .child("ping", |r| r.filter(middleware::raw_text("pong")))
//!         .child("param", |r| r.filter(middleware::echo_params()))
//!         .child("login", |r| {
//!             r.filter(middleware::validate(Checker::new().rule("user", "string[3,32]")))
//!                 .filter(middleware::echo_params())
//!         })
//! });
//! ```

use serde_json::Value;
use tracing::debug;

use crate::checker::Checker;
use crate::context::Context;
use crate::filter::Filter;

/// Sets `data` to a constant string.
pub fn text(body: impl Into<String>) -> impl Filter {
    let body = body.into();
    move |ctx: &mut Context| {
        ctx.set_data(body.clone());
        true
    }
}

/// Answers with a literal body, bypassing the envelope.
pub fn raw_text(body: impl Into<String>) -> impl Filter {
    let body = body.into();
    move |ctx: &mut Context| {
        ctx.set_raw(true);
        ctx.set_data(body.clone());
        true
    }
}

/// Sets `data` to the request parameters.
pub fn echo_params() -> impl Filter {
    |ctx: &mut Context| {
        let params = Value::Object(ctx.params().clone());
        ctx.set_data(params);
        true
    }
}

/// Validates the parameters as they are at this point of the chain, so
/// earlier filters may have filled in or rewritten some of them. Stops the
/// chain with the rejecting rule's status.
pub fn validate(checker: Checker) -> impl Filter {
    move |ctx: &mut Context| match checker.check(ctx.params()) {
        Ok(()) => true,
        Err(rejection) => {
            debug!(path = ctx.path(), %rejection, "parameters rejected mid-chain");
            ctx.fail(rejection.status, rejection.to_string())
        }
    }
}
