//! The rule grammar: scalar contracts written as short strings.
//!
//! ```text
//! TYPE [quantifier] ['#' STATUS] ['<' NOTE '>']
//!
//! string          any string
//! string(n)       a string of exactly n bytes
//! string[m,n]     a string of m..=n bytes
//! string{a,b,c}   one of a, b, c
//! int             any integer (numbers or numeric strings)
//! int(n)          exactly n
//! int[m,n]        m..=n
//! int{a,b,c}      one of a, b, c
//! mobile          an 11 byte string
//! md5             a 32 or 64 byte string
//! ```
//!
//! A bound that is empty or negative is open on that side: `int[0,-1]` is any
//! non-negative integer, `string[,8]` is at most eight bytes. Several
//! branches may be joined with `|`; a value is accepted when any branch
//! accepts it.
//!
//! Rules are parsed once, when a route is registered. Parsing never fails:
//! authoring mistakes are kept on the parsed rule, reported by
//! [`RuleSet::defects`], and make the branch reject everything it sees.

use std::fmt;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use crate::status::Status;

// ── Rule parts ────────────────────────────────────────────────────────────────

/// The value type a rule accepts.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Kind {
    String,
    Int,
    Mobile,
    Md5,
    /// A type name the grammar does not know. Always rejects.
    Unknown(String),
}

impl Kind {
    fn parse(name: &str) -> Self {
        match name {
            "string" => Self::String,
            "int"    => Self::Int,
            "mobile" => Self::Mobile,
            "md5"    => Self::Md5,
            other    => Self::Unknown(other.to_owned()),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String     => f.write_str("string"),
            Self::Int        => f.write_str("int"),
            Self::Mobile     => f.write_str("mobile"),
            Self::Md5        => f.write_str("md5"),
            Self::Unknown(s) => f.write_str(s),
        }
    }
}

/// Length (strings) or value (ints) constraint.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Quantifier {
    /// `(n)`
    Exact(i64),
    /// `[m,n]`, `None` meaning unbounded on that side.
    Range { min: Option<i64>, max: Option<i64> },
    /// `{a,b,c}`. For int rules the members are stored canonicalized.
    OneOf(Vec<String>),
    /// Text that could not be read as a quantifier. Always rejects.
    Malformed(String),
}

impl Quantifier {
    fn parse(kind: &Kind, text: &str) -> Self {
        let malformed = || Self::Malformed(text.to_owned());

        if matches!(kind, Kind::Mobile | Kind::Md5) {
            return malformed();
        }

        if let Some(inner) = text.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
            return match inner.trim().parse() {
                Ok(n) => Self::Exact(n),
                Err(_) => malformed(),
            };
        }

        if let Some(inner) = text.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
            let Some((lo, hi)) = inner.split_once(',') else { return malformed() };
            return match (parse_bound(lo), parse_bound(hi)) {
                (Ok(min), Ok(max)) => Self::Range { min, max },
                _ => malformed(),
            };
        }

        if let Some(inner) = text.strip_prefix('{').and_then(|t| t.strip_suffix('}')) {
            if inner.trim().is_empty() {
                return malformed();
            }
            let mut members = Vec::new();
            for member in inner.split(',').map(str::trim) {
                match kind {
                    Kind::Int => match member.parse::<i64>() {
                        Ok(n) => members.push(n.to_string()),
                        Err(_) => return malformed(),
                    },
                    _ => members.push(member.to_owned()),
                }
            }
            return Self::OneOf(members);
        }

        malformed()
    }

    fn admits(&self, measure: i64, literal: &str) -> bool {
        match self {
            Self::Exact(n) => measure == *n,
            Self::Range { min, max } => {
                min.is_none_or(|m| measure >= m) && max.is_none_or(|m| measure <= m)
            }
            Self::OneOf(members) => members.iter().any(|m| m == literal),
            Self::Malformed(_) => false,
        }
    }
}

/// Empty or negative bounds are open.
fn parse_bound(text: &str) -> Result<Option<i64>, std::num::ParseIntError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    let n: i64 = text.parse()?;
    Ok((n >= 0).then_some(n))
}

impl fmt::Display for Quantifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "({n})"),
            Self::Range { min, max } => {
                f.write_str("[")?;
                if let Some(m) = min { write!(f, "{m}")?; }
                f.write_str(",")?;
                if let Some(m) = max { write!(f, "{m}")?; }
                f.write_str("]")
            }
            Self::OneOf(members) => write!(f, "{{{}}}", members.join(",")),
            Self::Malformed(raw) => f.write_str(raw),
        }
    }
}

/// An authoring error found while parsing a rule.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum RuleError {
    #[error("empty rule")]
    Empty,
    #[error("unknown rule type `{0}`")]
    UnknownType(String),
    #[error("malformed quantifier `{quantifier}` for type `{kind}`")]
    MalformedQuantifier { kind: String, quantifier: String },
    #[error("status `{0}` is not an integer")]
    BadStatus(String),
}

// ── Rule ──────────────────────────────────────────────────────────────────────

/// One branch of a rule: type, optional quantifier, failure status, note.
#[derive(Clone, Debug, PartialEq)]
pub struct Rule {
    kind: Kind,
    quantifier: Option<Quantifier>,
    status: Status,
    note: Option<String>,
    bad_status: Option<String>,
}

impl Rule {
    /// A rule accepting any value of `kind`, failing with
    /// [`Status::INVALID_PARAM`].
    pub fn new(kind: Kind) -> Self {
        Self { kind, quantifier: None, status: Status::INVALID_PARAM, note: None, bad_status: None }
    }

    pub fn string() -> Self { Self::new(Kind::String) }
    pub fn int() -> Self { Self::new(Kind::Int) }

    /// `(n)`: exact length for strings, exact value for ints.
    pub fn exact(mut self, n: i64) -> Self {
        self.quantifier = Some(Quantifier::Exact(n));
        self
    }

    /// `[m,n]`: `None` or a negative bound leaves that side open.
    pub fn range(mut self, min: Option<i64>, max: Option<i64>) -> Self {
        let open = |b: Option<i64>| b.filter(|n| *n >= 0);
        self.quantifier = Some(Quantifier::Range { min: open(min), max: open(max) });
        self
    }

    /// `{a,b,c}`.
    pub fn one_of<I, T>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        let text = format!(
            "{{{}}}",
            members.into_iter().map(|m| m.to_string()).collect::<Vec<_>>().join(","),
        );
        self.quantifier = Some(Quantifier::parse(&self.kind, &text));
        self
    }

    /// Status reported when this branch rejects.
    pub fn status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// Documentation text. Never evaluated.
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn kind(&self) -> &Kind { &self.kind }
    pub fn quantifier(&self) -> Option<&Quantifier> { self.quantifier.as_ref() }
    pub fn failure_status(&self) -> Status { self.status }
    pub fn note_text(&self) -> Option<&str> { self.note.as_deref() }

    /// Parses a single branch (no `|`).
    pub fn parse(text: &str) -> Self {
        let text = text.trim();

        // The note goes first: it may contain `#`.
        let (head, note) = match text.split_once('<') {
            Some((head, rest)) => {
                let note = rest.strip_suffix('>').unwrap_or(rest);
                (head, Some(note.to_owned()))
            }
            None => (text, None),
        };

        let (head, status, bad_status) = match head.rsplit_once('#') {
            Some((head, code)) => match code.trim().parse::<i64>() {
                Ok(code) => (head, Status::from(code), None),
                Err(_) => (head, Status::INVALID_PARAM, Some(code.to_owned())),
            },
            None => (head, Status::INVALID_PARAM, None),
        };

        let head = head.trim();
        let split = head
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(head.len());
        let (name, quantifier) = head.split_at(split);
        let kind = Kind::parse(name);
        let quantifier = (!quantifier.is_empty()).then(|| Quantifier::parse(&kind, quantifier));

        Self { kind, quantifier, status, note, bad_status }
    }

    /// Builds the textual form of a rule: `base#status<note>`. The status is
    /// only appended when it is positive.
    pub fn format(base: &str, status: Status, note: &str) -> String {
        let mut out = base.to_owned();
        if status.code() > 0 {
            out.push('#');
            out.push_str(&status.to_string());
        }
        if !note.is_empty() {
            out.push('<');
            out.push_str(note);
            out.push('>');
        }
        out
    }

    /// An output rule for the envelope's `status` field: accepts the given
    /// application codes and the framework's own outcomes, and fails with
    /// [`Status::INVALID_STATUS`].
    pub fn in_status(codes: &[Status]) -> String {
        let members = codes
            .iter()
            .chain(&[Status::INVALID_PARAM, Status::ERROR_DB, Status::ERROR_UNKNOWN, Status::SUCCESS])
            .map(Status::to_string)
            .collect::<Vec<_>>()
            .join(",");
        Self::format(&format!("int{{{members}}}"), Status::INVALID_STATUS, "")
    }

    /// Authoring errors in this branch.
    pub fn defects(&self) -> Vec<RuleError> {
        let mut out = Vec::new();
        match &self.kind {
            Kind::Unknown(name) if name.is_empty() => out.push(RuleError::Empty),
            Kind::Unknown(name) => out.push(RuleError::UnknownType(name.clone())),
            _ => {}
        }
        if let Some(Quantifier::Malformed(raw)) = &self.quantifier {
            out.push(RuleError::MalformedQuantifier {
                kind: self.kind.to_string(),
                quantifier: raw.clone(),
            });
        }
        if let Some(raw) = &self.bad_status {
            out.push(RuleError::BadStatus(raw.clone()));
        }
        out
    }

    /// Whether `value` satisfies this branch.
    pub fn accepts(&self, value: &Value) -> bool {
        if let Some(q @ Quantifier::Malformed(_)) = &self.quantifier {
            error!(rule = %self, "malformed quantifier `{q}`, rejecting");
            return false;
        }
        let ok = match &self.kind {
            Kind::String => match value {
                Value::String(s) => self.admits(s.len() as i64, s),
                _ => false,
            },
            Kind::Int => match int_of(value) {
                Some(n) => self.admits(n, &n.to_string()),
                None => false,
            },
            Kind::Mobile => matches!(value, Value::String(s) if s.len() == 11),
            Kind::Md5 => {
                matches!(value, Value::String(s) if matches!(s.len(), 32 | 64))
            }
            Kind::Unknown(name) => {
                error!(rule = %self, "unknown rule type `{name}`, rejecting");
                false
            }
        };
        if !ok {
            debug!(rule = %self, %value, "rule rejected value");
        }
        ok
    }

    fn admits(&self, measure: i64, literal: &str) -> bool {
        self.quantifier.as_ref().is_none_or(|q| q.admits(measure, literal))
    }
}

/// Any JSON number, fractions truncated toward zero, and numeric strings
/// with surrounding whitespace ignored. Booleans and everything else are not
/// ints.
fn int_of(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(q) = &self.quantifier {
            write!(f, "{q}")?;
        }
        if self.status != Status::INVALID_PARAM {
            write!(f, "#{}", self.status)?;
        }
        if let Some(note) = &self.note {
            write!(f, "<{note}>")?;
        }
        Ok(())
    }
}

// ── RuleSet ───────────────────────────────────────────────────────────────────

/// One or more [`Rule`] branches joined by `|`.
#[derive(Clone, Debug, PartialEq)]
pub struct RuleSet {
    branches: Vec<Rule>,
}

impl RuleSet {
    pub fn parse(text: &str) -> Self {
        Self { branches: text.split('|').map(Rule::parse).collect() }
    }

    pub fn branches(&self) -> &[Rule] {
        &self.branches
    }

    /// Adds an alternative branch.
    pub fn or(mut self, rule: impl Into<RuleSet>) -> Self {
        self.branches.extend(rule.into().branches);
        self
    }

    /// Authoring errors across every branch.
    pub fn defects(&self) -> Vec<RuleError> {
        self.branches.iter().flat_map(Rule::defects).collect()
    }

    /// Accepts when any branch accepts. Otherwise fails with the status of
    /// the first branch.
    pub fn evaluate(&self, value: &Value) -> Result<(), Status> {
        if self.branches.iter().any(|b| b.accepts(value)) {
            return Ok(());
        }
        Err(self.branches.first().map_or(Status::INVALID_PARAM, |b| b.status))
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, branch) in self.branches.iter().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            write!(f, "{branch}")?;
        }
        Ok(())
    }
}

impl From<&str> for RuleSet {
    fn from(text: &str) -> Self { Self::parse(text) }
}

impl From<String> for RuleSet {
    fn from(text: String) -> Self { Self::parse(&text) }
}

impl From<Rule> for RuleSet {
    fn from(rule: Rule) -> Self { Self { branches: vec![rule] } }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn eval(rule: &str, value: Value) -> Result<(), Status> {
        RuleSet::parse(rule).evaluate(&value)
    }

    #[test]
    fn exact_string_length() {
        for s in ["", "a", "ab", "abc", "abcd", "ünï"] {
            let ok = eval("string(3)", json!(s)).is_ok();
            assert_eq!(ok, s.len() == 3, "string(3) on {s:?}");
        }
    }

    #[test]
    fn lengths_are_utf8_bytes() {
        assert!(eval("string(2)", json!("é")).is_ok());
        assert!(eval("string(1)", json!("é")).is_err());
        assert!(eval("string[,3]", json!("日")).is_ok());
        assert!(eval("string[,3]", json!("日本")).is_err());
        assert!(eval("mobile", json!("１３８００１３８０００")).is_err());
    }

    #[test]
    fn int_range_with_open_bounds() {
        let cases = [(1, 10), (-1, 10), (1, -1), (-1, -1), (0, 0)];
        for (m, n) in cases {
            let rule = format!("int[{m},{n}]");
            for v in -3..15 {
                let expect = (m < 0 || v >= m) && (n < 0 || v <= n);
                assert_eq!(eval(&rule, json!(v)).is_ok(), expect, "{rule} on {v}");
            }
        }
    }

    #[test]
    fn empty_bounds_are_open() {
        assert!(eval("string[,3]", json!("abc")).is_ok());
        assert!(eval("string[,3]", json!("abcd")).is_err());
        assert!(eval("int[5,]", json!(500)).is_ok());
        assert!(eval("int[5,]", json!(4)).is_err());
    }

    #[test]
    fn string_enumeration() {
        for s in ["a", "b", "c"] {
            assert_eq!(eval("string{a,b,c}", json!(s)), Ok(()));
        }
        assert_eq!(eval("string{a,b,c}", json!("d")), Err(Status::INVALID_PARAM));
        assert_eq!(eval("string{a,b,c}#10001", json!("ab")), Err(Status::app(10_001)));
    }

    #[test]
    fn int_enumeration_compares_canonical_forms() {
        assert!(eval("int{1, 02 ,3}", json!(2)).is_ok());
        assert!(eval("int{1,2,3}", json!("3")).is_ok());
        assert!(eval("int{1,2,3}", json!(3.0)).is_ok());
        assert!(eval("int{1,2,3}", json!(4)).is_err());
    }

    #[test]
    fn int_exact_value() {
        assert!(eval("int(7)", json!(7)).is_ok());
        assert!(eval("int(7)", json!("7")).is_ok());
        assert!(eval("int(7)", json!(8)).is_err());
    }

    #[test]
    fn int_coercion() {
        assert!(eval("int", json!(12)).is_ok());
        assert!(eval("int", json!("-12")).is_ok());
        assert!(eval("int", json!(2.5)).is_ok());
        assert!(eval("int[1,10]", json!(2.5)).is_ok());
        assert!(eval("int(2)", json!(2.9)).is_ok());
        assert!(eval("int(-2)", json!(-2.9)).is_ok());
        assert!(eval("int[3,]", json!(2.9)).is_err());
        assert!(eval("int", json!(" 42 ")).is_ok());
        assert!(eval("int(42)", json!("\t42\n")).is_ok());
        assert!(eval("int", json!("2.5")).is_err());
        assert!(eval("int", json!("foo")).is_err());
        assert!(eval("int", json!(true)).is_err());
        assert!(eval("int", Value::Null).is_err());
    }

    #[test]
    fn int_rule_reads_values_like_context_int() {
        let samples = [json!(7), json!(-7.8), json!(" 12 "), json!("0"), json!(2.5), json!("x1")];
        for value in samples {
            match crate::convert::to_int(&value) {
                Some(n) => assert!(eval(&format!("int({n})"), value.clone()).is_ok(), "{value}"),
                None => assert!(eval("int", value.clone()).is_err(), "{value}"),
            }
        }
    }

    #[test]
    fn string_rejects_non_strings() {
        assert!(eval("string", json!(1)).is_err());
        assert!(eval("string", Value::Null).is_err());
        assert!(eval("string", json!({"a": 1})).is_err());
    }

    #[test]
    fn mobile_and_md5() {
        assert!(eval("mobile", json!("13800138000")).is_ok());
        assert!(eval("mobile", json!("1380013800")).is_err());
        assert!(eval("mobile", json!(13800138000_i64)).is_err());
        assert!(eval("md5", json!("d41d8cd98f00b204e9800998ecf8427e")).is_ok());
        assert!(eval("md5", json!("a".repeat(64))).is_ok());
        assert!(eval("md5", json!("a".repeat(33))).is_err());
    }

    #[test]
    fn explicit_status_wins_over_default() {
        assert_eq!(eval("int#20001", json!("x")), Err(Status::app(20_001)));
        assert_eq!(eval("int", json!("x")), Err(Status::INVALID_PARAM));
        assert_eq!(eval("int#20001<the count>", json!("x")), Err(Status::app(20_001)));
    }

    #[test]
    fn note_is_not_evaluated() {
        let rule = Rule::parse("string(2)#10003<two letters, e.g. #ab>");
        assert_eq!(rule.note_text(), Some("two letters, e.g. #ab"));
        assert_eq!(rule.failure_status(), Status::app(10_003));
        assert!(rule.accepts(&json!("ab")));
    }

    #[test]
    fn branches_are_alternatives() {
        let rules = "int[1,5]#10001|string{none}#10002";
        assert!(eval(rules, json!(3)).is_ok());
        assert!(eval(rules, json!("none")).is_ok());
        assert_eq!(eval(rules, json!(9)), Err(Status::app(10_001)));
    }

    #[test]
    fn unknown_type_never_passes() {
        let rules = RuleSet::parse("uuid");
        assert_eq!(rules.defects(), vec![RuleError::UnknownType("uuid".into())]);
        assert_eq!(rules.evaluate(&json!("anything")), Err(Status::INVALID_PARAM));
        assert_eq!(RuleSet::parse("").defects(), vec![RuleError::Empty]);
    }

    #[test]
    fn malformed_quantifiers_reject() {
        for rule in ["int[1]", "int(x)", "string{}", "int{a,b}", "string<3>", "mobile(11)"] {
            let set = RuleSet::parse(rule);
            let defective = !set.defects().is_empty();
            let rejected = set.evaluate(&json!("13800138000")).is_err();
            assert!(defective || rule == "string<3>", "{rule} should be a defect");
            assert!(rejected || rule == "string<3>", "{rule} should reject");
        }
    }

    #[test]
    fn bad_status_falls_back_to_invalid_param() {
        let set = RuleSet::parse("int#oops");
        assert_eq!(set.defects(), vec![RuleError::BadStatus("oops".into())]);
        assert_eq!(set.evaluate(&json!("x")), Err(Status::INVALID_PARAM));
    }

    #[test]
    fn builder_displays_as_grammar() {
        let rule = Rule::int().range(Some(1), None).status(Status::app(10_001)).note("page");
        assert_eq!(rule.to_string(), "int[1,]#10001<page>");
        assert_eq!(Rule::parse(&rule.to_string()), rule);

        let set = RuleSet::from(Rule::string().one_of(["x", "y"])).or(Rule::int().exact(0));
        assert_eq!(set.to_string(), "string{x,y}|int(0)");
        assert!(set.evaluate(&json!(0)).is_ok());
    }

    #[test]
    fn format_and_in_status() {
        assert_eq!(Rule::format("int", Status::SUCCESS, ""), "int");
        assert_eq!(Rule::format("int", Status::app(10_001), "n"), "int#10001<n>");
        assert_eq!(Rule::in_status(&[Status::app(10_001)]), "int{10001,3,2,1,0}#4");

        let rules = RuleSet::parse(&Rule::in_status(&[Status::app(10_001)]));
        assert!(rules.evaluate(&json!(0)).is_ok());
        assert!(rules.evaluate(&json!(10_001)).is_ok());
        assert_eq!(rules.evaluate(&json!(10_002)), Err(Status::INVALID_STATUS));
    }
}
