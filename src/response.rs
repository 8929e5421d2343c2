//! Outgoing responses: the JSON envelope and raw bodies.
//!
//! Routes answer in one of two shapes. The default is the envelope,
//!
//! ```text
//! {"status": 0, "data": ..., "errmsg": ""}
//! ```
//!
//! always with HTTP 200, the outcome living in `status`. A filter that sets
//! raw mode on the [`Context`](crate::Context) gets its `data` written as
//! literal bytes instead.

use bytes::Bytes;
use http_body_util::Full;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::status::Status;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Content types for raw responses.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContentType {
    Csv,          // text/csv
    Html,         // text/html; charset=utf-8
    Json,         // application/json
    OctetStream,  // application/octet-stream
    Text,         // text/plain; charset=utf-8
    Xml,          // application/xml
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv         => "text/csv",
            Self::Html        => "text/html; charset=utf-8",
            Self::Json        => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Text        => "text/plain; charset=utf-8",
            Self::Xml         => "application/xml",
        }
    }
}

// ── Envelope ──────────────────────────────────────────────────────────────────

/// The `{status, data, errmsg}` wrapper of every non-raw response.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Envelope {
    pub status: Status,
    pub data: Value,
    pub errmsg: String,
}

// ── Response ──────────────────────────────────────────────────────────────────

/// A finished response, ready to hand to hyper.
#[derive(Clone, Debug)]
pub struct Response {
    status: http::StatusCode,
    content_type: Option<&'static str>,
    body: Vec<u8>,
}

impl Response {
    /// `200 OK` carrying a serialized envelope.
    pub fn envelope(envelope: &Envelope) -> Self {
        // An envelope is a status, a JSON value and a string; it always
        // serializes.
        let body = serde_json::to_vec(envelope).unwrap_or_default();
        Self { status: http::StatusCode::OK, content_type: Some(ContentType::Json.as_str()), body }
    }

    /// `200 OK` with a literal body.
    pub fn raw(content_type: ContentType, body: impl Into<Vec<u8>>) -> Self {
        Self { status: http::StatusCode::OK, content_type: Some(content_type.as_str()), body: body.into() }
    }

    /// `404 Not Found`, empty body.
    pub fn not_found() -> Self {
        Self { status: http::StatusCode::NOT_FOUND, content_type: None, body: Vec::new() }
    }

    pub fn http_status(&self) -> http::StatusCode { self.status }
    pub fn content_type(&self) -> Option<&'static str> { self.content_type }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Parses the body back into an [`Envelope`]; `None` for raw bodies.
    pub fn to_envelope(&self) -> Option<Envelope> {
        serde_json::from_slice(&self.body).ok()
    }

    pub(crate) fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(Bytes::from(self.body)));
        *res.status_mut() = self.status;
        if let Some(ct) = self.content_type {
            res.headers_mut().insert(http::header::CONTENT_TYPE, http::HeaderValue::from_static(ct));
        }
        res
    }
}
