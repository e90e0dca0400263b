use protoast_parse::ast::{Literal, LiteralKind};

use super::*;

fn int(negative: bool, value: u64) -> Literal {
    Literal {
        kind: LiteralKind::Int { negative, value },
        span: 0..1,
    }
}

fn ident(value: &str) -> Literal {
    Literal {
        kind: LiteralKind::Ident(value.to_owned()),
        span: 0..1,
    }
}

fn string(value: &str) -> Literal {
    Literal {
        kind: LiteralKind::String(value.to_owned()),
        span: 0..1,
    }
}

#[test]
fn ignored_options() {
    assert!(is_ignored(OptionCategory::File, "go_package"));
    assert!(is_ignored(OptionCategory::File, "java_multiple_files"));
    assert!(is_ignored(OptionCategory::Field, "packed"));
    assert!(is_ignored(OptionCategory::Field, "json_name"));
    assert!(is_ignored(OptionCategory::Enum, "allow_alias"));
    assert!(is_ignored(OptionCategory::Method, "idempotency_level"));
    for category in [
        OptionCategory::Message,
        OptionCategory::Oneof,
        OptionCategory::EnumValue,
        OptionCategory::Service,
    ] {
        assert!(is_ignored(category, "deprecated"));
    }

    assert!(!is_ignored(OptionCategory::Message, "packed"));
    assert!(!is_ignored(OptionCategory::File, "status"));
}

#[test]
fn signed_integers() {
    assert_eq!(
        convert_scalar(Scalar::Int32, &int(true, 5)),
        Ok(OptionValue::Int(-5))
    );
    assert_eq!(
        convert_scalar(Scalar::Sfixed64, &int(true, 1 << 63)),
        Ok(OptionValue::Int(i64::MIN))
    );
    assert_eq!(
        convert_scalar(Scalar::Sint32, &int(false, 1 << 31)),
        Err("value must be between -2147483648 and 2147483647".to_owned())
    );
    assert_eq!(
        convert_scalar(Scalar::Int64, &string("1")),
        Err("expected an integer".to_owned())
    );
}

#[test]
fn unsigned_integers() {
    assert_eq!(
        convert_scalar(Scalar::Fixed32, &int(false, 200)),
        Ok(OptionValue::Uint(200))
    );
    assert_eq!(
        convert_scalar(Scalar::Uint64, &int(false, u64::MAX)),
        Ok(OptionValue::Uint(u64::MAX))
    );
    assert_eq!(
        convert_scalar(Scalar::Uint32, &int(false, 1 << 32)),
        Err("value must be at most 4294967295".to_owned())
    );
    assert_eq!(
        convert_scalar(Scalar::Uint32, &int(true, 1)),
        Err("expected a non-negative integer".to_owned())
    );
}

#[test]
fn floats() {
    assert_eq!(
        convert_scalar(Scalar::Double, &int(true, 2)),
        Ok(OptionValue::Float(-2.0))
    );
    assert_eq!(
        convert_scalar(
            Scalar::Float,
            &Literal {
                kind: LiteralKind::Float(1.5),
                span: 0..3,
            }
        ),
        Ok(OptionValue::Float(1.5))
    );
    assert_eq!(
        convert_scalar(Scalar::Double, &ident("inf")),
        Ok(OptionValue::Float(f64::INFINITY))
    );
    assert!(matches!(
        convert_scalar(Scalar::Double, &ident("nan")),
        Ok(OptionValue::Float(value)) if value.is_nan()
    ));
    assert_eq!(
        convert_scalar(Scalar::Float, &ident("one")),
        Err("expected a number".to_owned())
    );
}

#[test]
fn bools_and_strings() {
    assert_eq!(
        convert_scalar(Scalar::Bool, &ident("true")),
        Ok(OptionValue::Bool(true))
    );
    assert_eq!(
        convert_scalar(Scalar::Bool, &ident("false")),
        Ok(OptionValue::Bool(false))
    );
    assert_eq!(
        convert_scalar(Scalar::Bool, &int(false, 1)),
        Err("expected 'true' or 'false'".to_owned())
    );
    assert_eq!(
        convert_scalar(Scalar::String, &string("hello")),
        Ok(OptionValue::String("hello".to_owned()))
    );
    assert_eq!(
        convert_scalar(Scalar::Bytes, &ident("hello")),
        Err("expected a string".to_owned())
    );
}

#[test]
fn flat_literal_text() {
    assert_eq!(literal_text(&string("a \"b\"")), "a \"b\"");
    assert_eq!(literal_text(&int(true, 3)), "-3");
    assert_eq!(literal_text(&ident("GET")), "GET");
}
