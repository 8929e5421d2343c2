//! Per-request state shared by a route's filters.

use serde_json::{Map, Value};

use crate::convert;
use crate::response::ContentType;
use crate::status::Status;

/// Everything a filter can see or change while one request is dispatched.
///
/// A `Context` is built fresh for every request, handed to each filter of the
/// matched route in turn, and dropped once the response is written. It is
/// never shared between requests.
///
/// ```rust
/// use reef::{Context, Status};
///
/// fn add(ctx: &mut Context) -> bool {
///     match (ctx.int("a"), ctx.int("b")) {
///         (Some(a), Some(b)) => {
///             ctx.set_data(a + b);
///             true
///         }
///         _ => ctx.fail(Status::app(10_001), "a and b must be ints"),
///     }
/// }
/// ```
#[derive(Debug)]
pub struct Context {
    host: String,
    path: String,
    params: Map<String, Value>,
    data: Value,
    status: Status,
    errmsg: String,
    raw: Option<ContentType>,
}

impl Context {
    pub fn new(host: impl Into<String>, path: impl Into<String>, params: Map<String, Value>) -> Self {
        Self {
            host: host.into(),
            path: path.into(),
            params,
            data: Value::Null,
            status: Status::SUCCESS,
            errmsg: String::new(),
            raw: None,
        }
    }

    pub fn host(&self) -> &str { &self.host }

    /// The registered path of the matched route.
    pub fn path(&self) -> &str { &self.path }

    pub fn params(&self) -> &Map<String, Value> { &self.params }
    pub fn params_mut(&mut self) -> &mut Map<String, Value> { &mut self.params }

    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    /// `key` coerced to an int. See [`convert::to_int`].
    pub fn int(&self, key: &str) -> Option<i64> {
        self.param(key).and_then(convert::to_int)
    }

    /// `key` coerced to a bool. See [`convert::to_bool`].
    pub fn bool(&self, key: &str) -> Option<bool> {
        self.param(key).and_then(convert::to_bool)
    }

    /// `key` coerced to a string. See [`convert::to_string`].
    pub fn string(&self, key: &str) -> Option<String> {
        self.param(key).and_then(convert::to_string)
    }

    pub fn data(&self) -> &Value { &self.data }

    pub fn set_data(&mut self, data: impl Into<Value>) {
        self.data = data.into();
    }

    pub fn status(&self) -> Status { self.status }

    pub fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    pub fn errmsg(&self) -> &str { &self.errmsg }

    pub fn set_errmsg(&mut self, errmsg: impl Into<String>) {
        self.errmsg = errmsg.into();
    }

    /// Records a failure and returns `false`, so a filter can
    /// `return ctx.fail(..)` to stop the chain.
    pub fn fail(&mut self, status: Status, errmsg: impl Into<String>) -> bool {
        self.status = status;
        self.errmsg = errmsg.into();
        false
    }

    pub fn is_raw(&self) -> bool { self.raw.is_some() }

    /// Raw mode writes `data` as literal `text/plain` bytes: no envelope, no
    /// output check.
    pub fn set_raw(&mut self, raw: bool) {
        self.raw = raw.then_some(ContentType::Text);
    }

    /// Raw mode with an explicit content type.
    pub fn set_raw_as(&mut self, content_type: ContentType) {
        self.raw = Some(content_type);
    }

    pub(crate) fn raw_content_type(&self) -> Option<ContentType> {
        self.raw
    }

    pub(crate) fn take_data(&mut self) -> Value {
        std::mem::take(&mut self.data)
    }
}
