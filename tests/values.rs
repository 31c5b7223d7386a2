use std::sync::Arc;

use blue::{
    error::{Error, ErrorKind},
    get_result,
    interpreter::value::{
        collection::{MapValue, SetValue},
        core::Value,
    },
};
use num_bigint::BigInt;

fn value_of(src: &str) -> Value {
    get_result(src).unwrap_or_else(|e| panic!("Script failed: {e}\n{src}"))
}

fn error_of(src: &str) -> ErrorKind {
    match get_result(src) {
        Err(Error::Runtime(e)) => e.kind,
        other => panic!("expected a runtime error, got {other:?}"),
    }
}

#[test]
fn equal_values_hash_alike() {
    let pairs = [(Value::Integer(1), Value::UInteger(1)),
                 (Value::Integer(1), Value::Float(1.0)),
                 (Value::Integer(7), Value::from(BigInt::from(7))),
                 (Value::from("abc"), Value::from(String::from("abc"))),
                 (Value::from(vec![Value::Integer(1), Value::from("x")]),
                  Value::from(vec![Value::Float(1.0), Value::from("x")]))];
    for (a, b) in pairs {
        assert!(a.equals(&b), "{a} should equal {b}");
        assert_eq!(a.hash_key().unwrap(), b.hash_key().unwrap(), "{a} and {b}");
    }
}

#[test]
fn set_hash_ignores_insertion_order() {
    let forward = SetValue::from_values([Value::Integer(1), Value::Integer(2)]).unwrap();
    let backward = SetValue::from_values([Value::Integer(2), Value::Integer(1)]).unwrap();
    let (forward, backward) = (Value::from(forward), Value::from(backward));
    assert!(forward.equals(&backward));
    assert_eq!(forward.hash_key().unwrap(), backward.hash_key().unwrap());
}

#[test]
fn map_hash_is_stable_under_reinsertion() {
    let pairs = || [(Value::from("a"), Value::Integer(1)), (Value::from("b"), Value::Integer(2))];
    let mut map = MapValue::from_pairs(pairs()).unwrap();
    let before = Value::from(map.clone()).hash_key().unwrap();
    for (k, v) in pairs() {
        map.insert(k, v).unwrap();
    }
    assert_eq!(map.len(), 2);
    assert_eq!(Value::from(map).hash_key().unwrap(), before);
}

#[test]
fn handles_and_markers_are_not_hashable() {
    assert!(Value::Break.hash_key().is_err());
    assert!(Value::Return(Box::new(Value::Null)).hash_key().is_err());
    let error = Value::Error(Arc::new(blue::error::RuntimeError::new(ErrorKind::Host, "x")));
    assert!(error.hash_key().is_err());
}

#[test]
fn different_kinds_hash_apart() {
    let text = Value::from("1").hash_key().unwrap();
    let number = Value::Integer(1).hash_key().unwrap();
    assert_ne!(text, number);
    assert!(!Value::from("1").equals(&Value::Integer(1)));
}

#[test]
fn overflow_promotes_instead_of_wrapping() {
    let v = value_of("9223372036854775807 + 1");
    assert!(matches!(v, Value::BigInteger(_)));
    assert_eq!(v.inspect(), "9223372036854775808");

    let v = value_of("val min = -9223372036854775807 - 1; min / -1");
    assert!(matches!(v, Value::BigInteger(_)));
    assert_eq!(v.inspect(), "9223372036854775808");

    let v = value_of("(9223372036854775807 + 1) - 1");
    assert!(matches!(v, Value::Integer(i64::MAX)));
}

#[test]
fn unsigned_arithmetic_stays_unsigned_when_it_fits() {
    assert!(matches!(value_of("0u2 + 0u3"), Value::UInteger(5)));
    assert!(matches!(value_of("0u2 - 0u3"), Value::Integer(-1)));
    assert!(matches!(value_of("~0u0"), Value::UInteger(u64::MAX)));
    assert!(matches!(value_of("~5"), Value::Integer(-6)));
}

#[test]
fn float_division_by_zero_is_infinite() {
    match value_of("1.0 / 0.0") {
        Value::Float(x) => assert!(x.is_infinite() && x.is_sign_positive()),
        other => panic!("expected a float, got {other}"),
    }
    assert_eq!(error_of("1 / 0"), ErrorKind::Arithmetic);
    assert_eq!(error_of("1 // 0"), ErrorKind::Arithmetic);
}

#[test]
fn list_indexing_boundaries() {
    assert!(matches!(value_of("[4, 5, 6][-1]"), Value::Integer(6)));
    assert!(matches!(value_of("[4, 5, 6][-3]"), Value::Integer(4)));
    assert_eq!(error_of("[4, 5, 6][3]"), ErrorKind::Range);
    assert_eq!(error_of("[4, 5, 6][-4]"), ErrorKind::Range);
    assert_eq!(error_of("[][0]"), ErrorKind::Range);
}

#[test]
fn slices_clamp_their_bounds() {
    assert_eq!(value_of("[1, 2, 3][1..10]").inspect(), "[2, 3]");
    assert_eq!(value_of("\"hello\"[1..<3]").inspect(), "el");
}

#[test]
fn printable_forms() {
    assert_eq!(value_of("3.0").inspect(), "3.0");
    assert_eq!(value_of("set()").inspect(), "set()");
    assert_eq!(value_of("({1, \"a\"})").inspect(), "{1, a}");
    assert_eq!(value_of("bytes(\"hi\")").inspect(), "b\"hi\"");
    assert_eq!(value_of("[null, true, [1]]").inspect(), "[null, true, [1]]");
}

#[test]
fn type_names() {
    assert_eq!(value_of("type(1)").inspect(), "INTEGER");
    assert_eq!(value_of("type(0u1)").inspect(), "UINTEGER");
    assert_eq!(value_of("type(99999999999999999999)").inspect(), "BIG_INTEGER");
    assert_eq!(value_of("type(1.5)").inspect(), "FLOAT");
    assert_eq!(value_of("type({})").inspect(), "MAP");
    assert_eq!(value_of("type(set())").inspect(), "SET");
    assert_eq!(value_of("type(print)").inspect(), "BUILTIN");
    assert_eq!(value_of("type(math)").inspect(), "BUILTIN_OBJ");
}

#[test]
fn bigfloat_keeps_precision() {
    let v = value_of("bigfloat(\"0.1\") + bigfloat(\"0.2\") == bigfloat(\"0.3\")");
    assert!(matches!(v, Value::Boolean(true)));
    assert!(matches!(value_of("0.1 + 0.2 == 0.3"), Value::Boolean(false)));
}
