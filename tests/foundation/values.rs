//! Integration tests for values and object ids

use nml_foundation::{ObjectId, Value, ValueType};

// =============================================================================
// Truthiness
// =============================================================================

#[test]
fn falsy_values() {
    for value in [
        Value::Null,
        Value::Bool(false),
        Value::from(0),
        Value::Number(f64::NAN),
        Value::from(""),
    ] {
        assert!(!value.is_truthy(), "{value:?} should be falsy");
    }
}

#[test]
fn truthy_values() {
    for value in [
        Value::Bool(true),
        Value::from(-1),
        Value::from("0"),
        Value::Array(vec![]),
        Value::Object(ObjectId(0)),
    ] {
        assert!(value.is_truthy(), "{value:?} should be truthy");
    }
}

// =============================================================================
// Display
// =============================================================================

#[test]
fn whole_numbers_print_without_fraction() {
    assert_eq!(Value::from(42).to_string(), "42");
    assert_eq!(Value::from(-3.0).to_string(), "-3");
    assert_eq!(Value::from(2.5).to_string(), "2.5");
}

#[test]
fn nested_values_print() {
    let value = Value::Array(vec![
        Value::from("a"),
        Value::Null,
        Value::Array(vec![Value::from(true)]),
        Value::Object(ObjectId(0x2a)),
    ]);
    assert_eq!(value.to_string(), "[a, null, [true], #2a]");
}

// =============================================================================
// Accessors
// =============================================================================

#[test]
fn value_types() {
    assert_eq!(Value::Null.value_type(), ValueType::Null);
    assert_eq!(Value::from("x").value_type(), ValueType::String);
    assert_eq!(Value::from(ObjectId(1)).value_type(), ValueType::Object);
    assert_eq!(ValueType::Array.to_string(), "array");
}

#[test]
fn index_conversion() {
    assert_eq!(Value::from(3).as_index(), Some(3));
    assert_eq!(Value::from(1.5).as_index(), None);
    assert_eq!(Value::from(-1).as_index(), None);
    assert_eq!(Value::from("1").as_index(), None);
}

#[test]
fn object_ids_round_trip_through_hex() {
    let id = ObjectId::new(0xbeef);
    let text = id.to_string();
    assert_eq!(text, "#beef");
    assert_eq!(ObjectId::from_hex(&text[1..]), Some(id));
}
