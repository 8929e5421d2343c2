//! The per-request pipeline of a matched route.
//!
//! ```text
//! params ─▶ input check ─▶ filter chain ─▶ output check ─▶ envelope
//!               │ fail            │ stop          │ fail
//!               ▼                 ▼               ▼
//!          status set,       status set,     status replaced,
//!          chain skipped     output skipped  data kept
//! ```
//!
//! Raw responses leave the pipeline right after the chain: no envelope, no
//! output check.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::checker::Checker;
use crate::context::Context;
use crate::filter::FilterChain;
use crate::request::Request;
use crate::response::{Envelope, Response};

pub(crate) struct Endpoint {
    path: String,
    input: Option<Checker>,
    output: Option<Checker>,
    chain: FilterChain,
}

impl Endpoint {
    pub(crate) fn new(
        path: String,
        input: Option<Checker>,
        output: Option<Checker>,
        chain: FilterChain,
    ) -> Self {
        Self { path, input, output, chain }
    }

    pub(crate) async fn handle(&self, req: Request) -> Response {
        let started = Instant::now();
        let received_ms = unix_millis();

        let (host, _, params) = req.into_parts();
        let mut ctx = Context::new(host, self.path.as_str(), params);

        let mut completed = true;
        if let Some(input) = &self.input {
            if let Err(rejection) = input.check(ctx.params()) {
                debug!(path = %self.path, %rejection, "input check failed");
                ctx.fail(rejection.status, rejection.to_string());
                completed = false;
            }
        }
        if completed {
            completed = self.chain.run(&mut ctx).await;
        }

        if let Some(content_type) = ctx.raw_content_type() {
            let body = match ctx.take_data() {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            let params = Value::Object(ctx.params().clone());
            info!(
                received_ms,
                elapsed = ?started.elapsed(),
                host = ctx.host(),
                path = ctx.path(),
                params = %params,
                data = log_excerpt(&body),
                "raw response"
            );
            return Response::raw(content_type, body);
        }

        let mut envelope = Envelope {
            status: ctx.status(),
            data: ctx.take_data(),
            errmsg: ctx.errmsg().to_owned(),
        };

        if completed {
            if let Some(output) = &self.output {
                if let Err(rejection) = output.check(&shape_of(&envelope)) {
                    debug!(path = %self.path, %rejection, "output check failed");
                    envelope.status = rejection.status;
                }
            }
        }

        let params = Value::Object(ctx.params().clone());
        info!(
            received_ms,
            elapsed = ?started.elapsed(),
            host = ctx.host(),
            path = ctx.path(),
            params = %params,
            status = envelope.status.code(),
            data = %envelope.data,
            errmsg = %envelope.errmsg,
            "response"
        );
        Response::envelope(&envelope)
    }
}

/// The envelope as the generic map an output [`Checker`] walks.
fn shape_of(envelope: &Envelope) -> Map<String, Value> {
    let mut shape = Map::new();
    shape.insert("status".to_owned(), Value::from(envelope.status.code()));
    shape.insert("data".to_owned(), envelope.data.clone());
    shape.insert("errmsg".to_owned(), Value::from(envelope.errmsg.as_str()));
    shape
}

/// Raw bodies can be whole pages; only their head goes to the log.
const LOG_EXCERPT_CHARS: usize = 256;

fn log_excerpt(body: &str) -> &str {
    match body.char_indices().nth(LOG_EXCERPT_CHARS) {
        Some((cut, _)) => &body[..cut],
        None => body,
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
