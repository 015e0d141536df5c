//! Property tests for integer semantics, sequence slicing and printed forms

use num_bigint::BigInt;
use num_integer::Integer;
use proptest::prelude::*;
use serpent::interp::Int;

fn eval_repr(source: &str) -> String {
    match serpent::evaluate(source) {
        Ok(value) => value.repr(),
        Err(e) => panic!("{} failed: {}", source, e),
    }
}

/// Printed form of an integer the way the interpreter shows it
fn expected_int(n: &BigInt) -> String {
    let small = i32::try_from(n.clone()).is_ok();
    if small { n.to_string() } else { format!("{}L", n) }
}

/// Source for a string built from character codes, so the source itself
/// needs no escaping while the printed form does
fn string_source() -> BoxedStrategy<String> {
    prop::collection::vec(0u8..128, 0..6).prop_map(|codes| {
        let mut source: Vec<String> = codes.iter().map(|c| format!("chr({})", c)).collect();
        source.push("''".to_string());
        format!("({})", source.join(" + "))
    })
    .boxed()
}

/// Source for a display of ints, longs, strings, tuples, lists and dicts
fn display_source() -> impl Strategy<Value = String> {
    let key = prop_oneof![any::<i32>().prop_map(|n| n.to_string()).boxed(), string_source()].boxed();
    let leaf = prop_oneof![
        any::<i32>().prop_map(|n| n.to_string()).boxed(),
        any::<i64>().prop_map(|n| format!("{}L", n)).boxed(),
        string_source(),
    ];
    leaf.prop_recursive(3, 24, 4, move |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(|items| match items.len() {
                1 => format!("({},)", items[0]),
                _ => format!("({})", items.join(", ")),
            }),
            prop::collection::vec(inner.clone(), 0..4)
                .prop_map(|items| format!("[{}]", items.join(", "))),
            prop::collection::vec((key.clone(), inner), 0..4).prop_map(|entries| {
                let entries: Vec<String> =
                    entries.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                format!("{{{}}}", entries.join(", "))
            }),
        ]
    })
}

proptest! {
    #[test]
    fn floor_division_law(a in any::<i32>(), b in any::<i32>().prop_filter("nonzero", |b| *b != 0)) {
        let source = format!("a = {}; b = {}; a / b * b + a % b == a", a, b);
        prop_assert_eq!(eval_repr(&source), "1");
    }

    #[test]
    fn modulo_takes_divisor_sign(a in any::<i32>(), b in any::<i32>().prop_filter("nonzero", |b| *b != 0)) {
        let source = format!("({}) % ({})", a, b);
        let expected = BigInt::from(a).mod_floor(&BigInt::from(b));
        prop_assert_eq!(eval_repr(&source), expected_int(&expected));
    }

    #[test]
    fn addition_promotes_on_overflow(a in any::<i32>(), b in any::<i32>()) {
        let source = format!("({}) + ({})", a, b);
        let expected = BigInt::from(a) + BigInt::from(b);
        prop_assert_eq!(eval_repr(&source), expected_int(&expected));
    }

    #[test]
    fn multiplication_matches_bigint(a in any::<i32>(), b in any::<i32>()) {
        let product = Int::Small(a).mul(&Int::Small(b));
        prop_assert_eq!(product.to_bigint(), BigInt::from(a) * BigInt::from(b));
    }

    #[test]
    fn tuple_slices_clamp(len in 0usize..8, lo in -12i32..12, hi in -12i32..12) {
        let items: Vec<String> = (0..len).map(|i| i.to_string()).collect();
        let source = format!("t = ({}{}); len(t[{}:{}])", items.join(", "), if len == 1 { "," } else { "" }, lo, hi);
        let clamp = |i: i32| -> i64 {
            let n = len as i64;
            let i = i64::from(i);
            let i = if i < 0 { i + n } else { i };
            i.clamp(0, n)
        };
        let expected = (clamp(hi) - clamp(lo)).max(0);
        prop_assert_eq!(eval_repr(&source), expected.to_string());
    }

    #[test]
    fn printed_form_reads_back(source in display_source()) {
        let value = serpent::evaluate(&source)
            .unwrap_or_else(|e| panic!("{} failed: {}", source, e));
        let printed = value.repr();
        let reread = serpent::evaluate(&printed)
            .unwrap_or_else(|e| panic!("printed form {} failed: {}", printed, e));
        prop_assert!(reread.equals(&value), "{} read back as {}", printed, reread.repr());
        prop_assert_eq!(reread.repr(), printed);
    }
}
