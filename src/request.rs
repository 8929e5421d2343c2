//! Incoming requests, reduced to what routing and filters need.

use http_body_util::BodyExt;
use serde_json::{Map, Value};
use tracing::warn;

/// Host, path and parameters of one inbound request.
///
/// Parameters come from the query string and, for
/// `application/x-www-form-urlencoded` bodies, from the body; a key present
/// in both keeps the body's value. A value that is a JSON object is stored
/// as a nested map, anything else as the literal string.
#[derive(Clone, Debug, Default)]
pub struct Request {
    host: String,
    path: String,
    params: Map<String, Value>,
}

impl Request {
    pub fn new(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self { host: host.into(), path: path.into(), params: Map::new() }
    }

    /// Sets a parameter, replacing any previous value.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Adds form-encoded pairs (`a=1&b=2`). Keys already present are kept.
    pub fn query(mut self, encoded: &str) -> Self {
        merge_form(&mut self.params, encoded.as_bytes());
        self
    }

    pub fn host(&self) -> &str { &self.host }
    pub fn path(&self) -> &str { &self.path }
    pub fn params(&self) -> &Map<String, Value> { &self.params }

    pub(crate) fn into_parts(self) -> (String, String, Map<String, Value>) {
        (self.host, self.path, self.params)
    }

    pub(crate) async fn from_hyper(req: hyper::Request<hyper::body::Incoming>) -> Self {
        let (parts, body) = req.into_parts();

        let host = parts
            .headers
            .get(http::header::HOST)
            .and_then(|h| h.to_str().ok())
            .or_else(|| parts.uri.authority().map(|a| a.as_str()))
            .unwrap_or_default()
            .to_owned();
        let path = parts.uri.path().to_owned();

        let is_form = parts
            .headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        let mut params = Map::new();
        if is_form {
            match body.collect().await {
                Ok(collected) => merge_form(&mut params, &collected.to_bytes()),
                Err(e) => warn!(%path, "could not read request body: {e}"),
            }
        }
        if let Some(query) = parts.uri.query() {
            merge_form(&mut params, query.as_bytes());
        }

        Self { host, path, params }
    }
}

/// First value wins, both within `encoded` and against what `params`
/// already holds.
fn merge_form(params: &mut Map<String, Value>, encoded: &[u8]) {
    for (key, value) in url::form_urlencoded::parse(encoded) {
        if !params.contains_key(&*key) {
            params.insert(key.into_owned(), parse_value(&value));
        }
    }
}

fn parse_value(raw: &str) -> Value {
    match serde_json::from_str::<Map<String, Value>>(raw) {
        Ok(map) => Value::Object(map),
        Err(_) => Value::String(raw.to_owned()),
    }
}
