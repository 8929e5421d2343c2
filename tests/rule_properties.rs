//! Rule and checker properties over generated values.

use proptest::prelude::*;
use reef::{Checker, RuleSet, Status};
use serde_json::{Map, Value, json};

fn bound(b: Option<i64>) -> String {
    b.map(|n| n.to_string()).unwrap_or_default()
}

/// `None` renders as an empty bound; negatives are open too.
fn open_or(b: Option<i64>, pass: impl Fn(i64) -> bool) -> bool {
    match b {
        Some(n) if n >= 0 => pass(n),
        _ => true,
    }
}

fn schema_rule() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "int",
        "int[1,]#10001",
        "string(3)",
        "string{a,b}<one letter>",
        "mobile",
        "md5|string(0)",
    ])
}

fn checker_from(fields: &[(String, &'static str)]) -> Checker {
    fields.iter().fold(Checker::new(), |c, (k, r)| c.rule(k.as_str(), *r))
}

proptest! {
    #[test]
    fn string_exact_length(s in "\\PC{0,12}", n in 0usize..16) {
        let accepted = RuleSet::parse(&format!("string({n})")).evaluate(&json!(s)).is_ok();
        prop_assert_eq!(accepted, s.len() == n);
    }

    #[test]
    fn int_range_bounds(
        m in prop::option::of(-5i64..40),
        n in prop::option::of(-5i64..40),
        v in -100i64..100,
    ) {
        let rules = RuleSet::parse(&format!("int[{},{}]", bound(m), bound(n)));
        let expect = open_or(m, |m| v >= m) && open_or(n, |n| v <= n);

        prop_assert_eq!(rules.evaluate(&json!(v)).is_ok(), expect);
        prop_assert_eq!(rules.evaluate(&json!(v.to_string())).is_ok(), expect);
    }

    #[test]
    fn string_membership(s in "[a-e]{0,2}") {
        let member = matches!(s.as_str(), "a" | "b" | "c");

        let default = RuleSet::parse("string{a,b,c}").evaluate(&json!(s));
        prop_assert_eq!(default, if member { Ok(()) } else { Err(Status::INVALID_PARAM) });

        let custom = RuleSet::parse("string{a,b,c}#10009").evaluate(&json!(s));
        prop_assert_eq!(custom, if member { Ok(()) } else { Err(Status::app(10_009)) });
    }

    #[test]
    fn render_ignores_insertion_order(
        fields in prop::collection::btree_map("[a-z]{1,6}", schema_rule(), 0..8),
    ) {
        let forward: Vec<_> = fields.iter().map(|(k, r)| (k.clone(), *r)).collect();
        let mut backward = forward.clone();
        backward.reverse();

        let a = checker_from(&forward);
        let b = checker_from(&backward);

        prop_assert_eq!(a.render("\t"), a.render("\t"));
        prop_assert_eq!(a.render("\t"), b.render("\t"));
        prop_assert_eq!(a, b);
    }

    #[test]
    fn first_rejection_ignores_insertion_order(
        fields in prop::collection::btree_map("[a-z]{1,6}", schema_rule(), 1..8),
        values in prop::collection::vec(prop_oneof![Just(json!(null)), Just(json!("ab")), Just(json!(7))], 8),
    ) {
        let forward: Vec<_> = fields.iter().map(|(k, r)| (k.clone(), *r)).collect();
        let mut backward = forward.clone();
        backward.reverse();

        let params: Map<String, Value> =
            fields.keys().cloned().zip(values.into_iter()).collect();

        prop_assert_eq!(checker_from(&forward).check(&params), checker_from(&backward).check(&params));
    }
}
