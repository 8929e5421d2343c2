//! Recursive parameter schemas.
//!
//! A [`Checker`] maps field names to a [`Schema`]: a rule, a nested checker,
//! or an array of either. Arrays list one canonical element schema; any
//! further elements are padding for the docs and are never consulted.
//!
//! ```rust
//! use reef::{Checker, Status};
//! use serde_json::json;
//!
//! let input = Checker::new()
//!     .rule("a", "string(2)")
//!     .nested("b", Checker::new().rule("c", "int[1,10]"))
//!     .checkers("list", [Checker::new().rule("e", "int")]);
//!
//! let params = json!({"a": "xy", "b": {"c": 11}, "list": []});
//! let err = input.check(params.as_object().unwrap()).unwrap_err();
//! assert_eq!(err.status, Status::INVALID_PARAM);
//! assert_eq!(err.field, "b.c");
//! ```
//!
//! Fields are visited in sorted order, so the first failure reported for a
//! given input is always the same one.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};
use tracing::{debug, error};

use crate::rule::RuleSet;
use crate::status::Status;

static NULL: Value = Value::Null;

/// What a single field must look like.
#[derive(Clone, Debug, PartialEq)]
pub enum Schema {
    Rule(RuleSet),
    Nested(Checker),
    RuleArray(Vec<RuleSet>),
    CheckerArray(Vec<Checker>),
}

impl From<&str> for Schema {
    fn from(rule: &str) -> Self { Self::Rule(RuleSet::parse(rule)) }
}

impl From<String> for Schema {
    fn from(rule: String) -> Self { Self::Rule(RuleSet::parse(&rule)) }
}

impl From<RuleSet> for Schema {
    fn from(rules: RuleSet) -> Self { Self::Rule(rules) }
}

impl From<crate::rule::Rule> for Schema {
    fn from(rule: crate::rule::Rule) -> Self { Self::Rule(rule.into()) }
}

impl From<Checker> for Schema {
    fn from(checker: Checker) -> Self { Self::Nested(checker) }
}

/// Why a parameter tree was rejected.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Rejection {
    pub status: Status,
    /// Dotted path of the offending field, with `[i]` for array elements.
    pub field: String,
    pub reason: String,
}

impl Rejection {
    fn new(status: Status, field: String, reason: impl Into<String>) -> Self {
        Self { status, field, reason: reason.into() }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid `{}`: {}", self.field, self.reason)
    }
}

/// A schema for a whole parameter tree.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Checker {
    fields: BTreeMap<String, Schema>,
}

impl Checker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `key` with any schema.
    pub fn field(mut self, key: impl Into<String>, schema: impl Into<Schema>) -> Self {
        let key = key.into();
        let schema = schema.into();
        report_defects(&key, &schema);
        self.fields.insert(key, schema);
        self
    }

    /// Declares `key` as a scalar rule.
    pub fn rule(self, key: impl Into<String>, rule: impl Into<RuleSet>) -> Self {
        self.field(key, Schema::Rule(rule.into()))
    }

    /// Declares `key` as a nested map.
    pub fn nested(self, key: impl Into<String>, checker: Checker) -> Self {
        self.field(key, Schema::Nested(checker))
    }

    /// Declares `key` as an array of scalars. Only the first rule is used.
    pub fn rules<I, R>(self, key: impl Into<String>, rules: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<RuleSet>,
    {
        self.field(key, Schema::RuleArray(rules.into_iter().map(Into::into).collect()))
    }

    /// Declares `key` as an array of maps. Only the first checker is used.
    pub fn checkers(self, key: impl Into<String>, checkers: impl IntoIterator<Item = Checker>) -> Self {
        self.field(key, Schema::CheckerArray(checkers.into_iter().collect()))
    }

    pub fn get(&self, key: &str) -> Option<&Schema> {
        self.fields.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields in visiting order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Schema)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Validates `params`, stopping at the first failing field.
    pub fn check(&self, params: &Map<String, Value>) -> Result<(), Rejection> {
        self.check_at("", params)
    }

    fn check_at(&self, prefix: &str, params: &Map<String, Value>) -> Result<(), Rejection> {
        for (key, schema) in &self.fields {
            let path = if prefix.is_empty() { key.clone() } else { format!("{prefix}.{key}") };
            let value = params.get(key).unwrap_or(&NULL);

            match schema {
                Schema::Rule(rules) => {
                    rules
                        .evaluate(value)
                        .map_err(|status| Rejection::new(status, path, format!("expected {rules}")))?;
                }
                Schema::Nested(child) => match value {
                    Value::Object(map) => child.check_at(&path, map)?,
                    other => return Err(structural(path, "a map", other)),
                },
                Schema::RuleArray(rules) => {
                    let Some(rules) = rules.first() else { continue };
                    let Value::Array(items) = value else {
                        return Err(structural(path, "an array", value));
                    };
                    for (i, item) in items.iter().enumerate() {
                        rules.evaluate(item).map_err(|status| {
                            Rejection::new(status, format!("{path}[{i}]"), format!("expected {rules}"))
                        })?;
                    }
                }
                Schema::CheckerArray(checkers) => {
                    let Some(child) = checkers.first() else { continue };
                    let Value::Array(items) = value else {
                        return Err(structural(path, "an array", value));
                    };
                    for (i, item) in items.iter().enumerate() {
                        let at = format!("{path}[{i}]");
                        match item {
                            Value::Object(map) => child.check_at(&at, map)?,
                            other => return Err(structural(at, "a map", other)),
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Pretty-prints the schema, one field per line, each prefixed with
    /// `indent`. Nested levels add a tab. Array schemas end in `,...]`.
    pub fn render(&self, indent: &str) -> String {
        let deeper = format!("{indent}\t");
        let mut lines = Vec::with_capacity(self.fields.len());

        for (key, schema) in &self.fields {
            let line = match schema {
                Schema::Rule(rules) => format!("{indent}{key}: {rules}"),
                Schema::Nested(child) => {
                    format!("{indent}{key}: {{\n{}{indent}}}", child.render(&deeper))
                }
                Schema::RuleArray(rules) => {
                    let items: Vec<String> = rules.iter().map(ToString::to_string).collect();
                    format!("{indent}{key}: [{},...]", items.join(","))
                }
                Schema::CheckerArray(checkers) => {
                    let items: Vec<String> = checkers
                        .iter()
                        .map(|c| format!("{{\n{}{indent}}}", c.render(&deeper)))
                        .collect();
                    format!("{indent}{key}: [{},...]", items.join(&format!(",\n{indent}")))
                }
            };
            lines.push(line);
        }

        lines.join(",\n") + "\n"
    }
}

fn structural(field: String, expected: &str, got: &Value) -> Rejection {
    debug!(%field, %got, "expected {expected}");
    Rejection::new(Status::INVALID_PARAM, field, format!("expected {expected}"))
}

/// Logs authoring mistakes once, at registration.
fn report_defects(key: &str, schema: &Schema) {
    match schema {
        Schema::Rule(rules) => {
            for defect in rules.defects() {
                error!(field = key, rule = %rules, "schema defect: {defect}");
            }
        }
        Schema::Nested(_) => {}
        Schema::RuleArray(rules) => match rules.first() {
            Some(first) => {
                for defect in first.defects() {
                    error!(field = key, rule = %first, "schema defect: {defect}");
                }
            }
            None => error!(field = key, "schema defect: empty rule array, field is not checked"),
        },
        Schema::CheckerArray(checkers) => {
            if checkers.is_empty() {
                error!(field = key, "schema defect: empty checker array, field is not checked");
            }
        }
    }
}
