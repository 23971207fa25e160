/// Encoder contract tests: every value has exactly one encoding.
use std::collections::BTreeMap;

use bencoding::{encode, encode_to, Value};
use bytes::Bytes;
use num_bigint::BigInt;

fn dict(pairs: &[(&str, Value)]) -> Value {
    let mut entries = BTreeMap::new();
    for (k, v) in pairs {
        entries.insert(Bytes::copy_from_slice(k.as_bytes()), v.clone());
    }
    Value::Dict(entries)
}

// ============================================================================
// Byte Strings
// ============================================================================

#[test]
fn encode_bytestring() {
    assert_eq!(encode(&Value::string("spam")), b"4:spam");
}

#[test]
fn encode_empty_bytestring() {
    assert_eq!(encode(&Value::string("")), b"0:");
}

#[test]
fn encode_binary_bytestring() {
    let v = Value::bytes(vec![0u8, 0xff, b'e', b':']);
    assert_eq!(encode(&v), b"4:\x00\xffe:");
}

#[test]
fn encode_long_bytestring() {
    let v = Value::bytes(vec![b'x'; 1000]);
    let out = encode(&v);
    assert!(out.starts_with(b"1000:xxx"));
    assert_eq!(out.len(), 1005);
}

// ============================================================================
// Integers
// ============================================================================

#[test]
fn encode_integers() {
    assert_eq!(encode(&Value::from(3)), b"i3e");
    assert_eq!(encode(&Value::from(-3)), b"i-3e");
    assert_eq!(encode(&Value::from(0)), b"i0e");
}

#[test]
fn encode_negative_zero_is_zero() {
    let zero = -BigInt::from(0);
    assert_eq!(encode(&Value::Integer(zero)), b"i0e");
}

#[test]
fn encode_integer_extremes() {
    assert_eq!(encode(&Value::from(i64::MIN)), b"i-9223372036854775808e");
    assert_eq!(encode(&Value::from(u64::MAX)), b"i18446744073709551615e");
}

#[test]
fn encode_big_integer() {
    let n: BigInt = "-123456789012345678901234567890".parse().unwrap();
    assert_eq!(
        encode(&Value::Integer(n)),
        b"i-123456789012345678901234567890e"
    );
}

// ============================================================================
// Lists
// ============================================================================

#[test]
fn encode_list_preserves_order() {
    let v = Value::List(vec![
        Value::string("spam"),
        Value::string("eggs"),
        Value::string("ham"),
    ]);
    assert_eq!(encode(&v), b"l4:spam4:eggs3:hame");
}

#[test]
fn encode_empty_list() {
    assert_eq!(encode(&Value::List(vec![])), b"le");
}

#[test]
fn encode_nested_lists() {
    let v = Value::List(vec![
        Value::List(vec![Value::from(1), Value::List(vec![])]),
        Value::from(2),
    ]);
    assert_eq!(encode(&v), b"lli1eleei2ee");
}

// ============================================================================
// Dictionaries
// ============================================================================

#[test]
fn encode_dict_sorts_keys() {
    let v = dict(&[("spam", Value::from(1)), ("cow", Value::from(2))]);
    assert_eq!(encode(&v), b"d3:cowi2e4:spami1ee");
}

#[test]
fn encode_dict_sorts_by_unsigned_bytes() {
    let mut entries = BTreeMap::new();
    entries.insert(Bytes::from_static(b"\xff"), Value::from(1));
    entries.insert(Bytes::from_static(b"a"), Value::from(2));
    entries.insert(Bytes::from_static(b"B"), Value::from(3));
    entries.insert(Bytes::from_static(b"ab"), Value::from(4));
    assert_eq!(
        encode(&Value::Dict(entries)),
        b"d1:Bi3e1:ai2e2:abi4e1:\xffi1ee"
    );
}

#[test]
fn encode_empty_dict() {
    assert_eq!(encode(&Value::dict()), b"de");
}

#[test]
fn encode_nested_dict() {
    let v = dict(&[
        ("info", dict(&[("name", Value::string("a")), ("length", Value::from(1))])),
        ("announce", Value::string("udp://t")),
    ]);
    assert_eq!(
        encode(&v),
        b"d8:announce7:udp://t4:infod6:lengthi1e4:name1:aee"
    );
}

#[test]
fn encode_does_not_mutate_input() {
    let v = dict(&[("b", Value::from(1)), ("a", Value::List(vec![]))]);
    let before = v.clone();
    let _ = encode(&v);
    assert_eq!(v, before);
}

#[test]
fn encode_is_deterministic() {
    let v = dict(&[("z", Value::from(1)), ("a", Value::string("x"))]);
    assert_eq!(encode(&v), encode(&v.clone()));
}

// ============================================================================
// Output targets
// ============================================================================

#[test]
fn encode_deeply_nested_value() {
    let mut v = Value::List(vec![]);
    for _ in 0..10_000 {
        v = Value::List(vec![v]);
    }
    let out = encode(&v);
    assert_eq!(out.len(), 2 * 10_001);
    assert!(out.starts_with(b"llll"));
    assert!(out.ends_with(b"eeee"));
    // Unwind iteratively so dropping the tree does not recurse 10k deep.
    while let Value::List(mut items) = v {
        v = items.pop().unwrap_or_else(Value::dict);
    }
}

#[test]
fn encode_to_writer() {
    let mut out = Vec::new();
    encode_to(&Value::string("spam"), &mut out).unwrap();
    assert_eq!(out, b"4:spam");
}

#[test]
fn encoded_len_matches_output() {
    let v = dict(&[
        ("list", Value::List(vec![Value::from(-100), Value::string("")])),
        ("n", Value::from(1234567890)),
    ]);
    assert_eq!(v.encoded_len(), encode(&v).len());
}
