//! A small reef service: greetings, a parameter echo, arithmetic with
//! checked input and output, and a cache.
//!
//! Run with:
//!   cargo run --example basic -- --config demos/basic.toml
//!
//! Try:
//!   curl 'http://localhost:8080/'
//!   curl 'http://localhost:8080/ping'
//!   curl -g 'http://localhost:8080/param?a=1&obj={"k":"v"}'
//!   curl 'http://localhost:8080/param/check?name=al'
//!   curl 'http://localhost:8080/math/add?a=2&b=3'
//!   curl 'http://localhost:8080/math/add?a=foo&b=3'
//!   curl -d 'key=greeting&value=hi' 'http://localhost:8080/cache/set'
//!   curl 'http://localhost:8080/cache/get?key=greeting'
//!   open 'http://localhost:8080/doc'

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use reef::config::Config;
use reef::store::{Cache, MemoryCache};
use reef::{Checker, Context, Filter, Router, Rule, Server, Status, middleware, telemetry};
use tracing::warn;

const SUM_TOO_LARGE: Status = Status::app(10_001);
const CACHE_MISS: Status = Status::app(10_002);

#[derive(Parser)]
#[command(about = "reef demo service")]
struct Args {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::from_file(path).unwrap_or_else(|e| telemetry::fatal(e)),
        None => Config::default(),
    }
    .with_env();

    let _guard = telemetry::init(&config.log).unwrap_or_else(|e| telemetry::fatal(e));

    let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new());
    let app = app(cache);

    let server = Server::bind(&config.server.host).unwrap_or_else(|e| telemetry::fatal(e));
    if let Err(e) = server.serve(app).await {
        telemetry::fatal(e);
    }
}

fn app(cache: Arc<dyn Cache>) -> Router {
    Router::new().route("/", |root| {
        root.describe("says hello")
            .filter(middleware::text("hello reef"))
            .child("ping", |ping| {
                ping.describe("liveness probe, answers a bare `pong`")
                    .filter(middleware::raw_text("pong"))
            })
            .child("param", |param| {
                param
                    .describe("echoes the request parameters")
                    .filter(middleware::echo_params())
                    .child("check", |check| {
                        check
                            .describe("echoes the parameters once they pass the schema")
                            .input(
                                Checker::new()
                                    .rule("name", Rule::format("string[2,16]", Status::app(10_003), "user name"))
                                    .rule("age", "int[0,150]"),
                            )
                            .filter(middleware::echo_params())
                    })
            })
            .child("math", |math| {
                math.describe("integer arithmetic").child("add", |r| {
                    r.describe("a + b, while the sum stays below 1000")
                        .input(Checker::new().rule("a", "int").rule("b", "int"))
                        .output(
                            Checker::new()
                                .rule("status", Rule::in_status(&[SUM_TOO_LARGE]))
                                .rule("data", "int"),
                        )
                        .filter(add)
                })
            })
            .child("cache", |c| {
                c.describe("a process-local key value store")
                    .child("set", |set| {
                        set.describe("stores `value` under `key` for ten minutes")
                            .input(Checker::new().rule("key", "string[1,64]").rule("value", "string"))
                            .filter(CacheSet { cache: Arc::clone(&cache) })
                    })
                    .child("get", |get| {
                        get.describe("reads `key`")
                            .input(Checker::new().rule("key", "string[1,64]"))
                            .filter(CacheGet { cache })
                    })
            })
    })
}

fn add(ctx: &mut Context) -> bool {
    let (Some(a), Some(b)) = (ctx.int("a"), ctx.int("b")) else {
        return ctx.fail(Status::INVALID_PARAM, "a and b must be integers");
    };
    let sum = a.saturating_add(b);
    if sum >= 1000 {
        return ctx.fail(SUM_TOO_LARGE, format!("{a} + {b} is too large"));
    }
    ctx.set_data(sum);
    true
}

struct CacheSet {
    cache: Arc<dyn Cache>,
}

#[reef::async_trait]
impl Filter for CacheSet {
    async fn call(&self, ctx: &mut Context) -> bool {
        let key = ctx.string("key").unwrap_or_default();
        let value = ctx.param("value").cloned().unwrap_or_default();
        if !self.cache.set(&key, value).await {
            return ctx.fail(Status::ERROR_DB, "cache write failed");
        }
        if !self.cache.expire(&key, Duration::from_secs(600)).await {
            warn!(%key, "cache ttl not set");
            return ctx.fail(Status::ERROR_DB, "cache ttl not set");
        }
        true
    }
}

struct CacheGet {
    cache: Arc<dyn Cache>,
}

#[reef::async_trait]
impl Filter for CacheGet {
    async fn call(&self, ctx: &mut Context) -> bool {
        let key = ctx.string("key").unwrap_or_default();
        match self.cache.get(&key).await {
            Some(value) => {
                ctx.set_data(value);
                true
            }
            None => ctx.fail(CACHE_MISS, format!("no value for `{key}`")),
        }
    }
}
