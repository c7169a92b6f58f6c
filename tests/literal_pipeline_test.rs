// Literal pipeline: standard round-trips and user-registered handlers

use forthic::prelude::*;
use std::rc::Rc;

#[test]
fn test_literal_round_trips() {
    // Parsing a literal's own canonical rendering yields an equal value
    let mut interp = Interpreter::new("UTC");
    interp
        .run("42 -17 3.5 TRUE FALSE 2024-06-05 14:30:00 2024-06-05T10:15:00Z")
        .unwrap();

    let first_pass = interp.get_stack().items();

    let rendered: Vec<String> = first_pass.iter().map(|v| v.to_string()).collect();
    let mut second = Interpreter::new("UTC");
    second.run(&rendered.join(" ")).unwrap();

    assert_eq!(second.get_stack().items(), first_pass);
}

#[test]
fn test_int_does_not_claim_floats() {
    let mut interp = Interpreter::new("UTC");
    interp.run("3.5").unwrap();
    assert_eq!(interp.stack_pop().unwrap(), Value::Float(3.5));
}

#[test]
fn test_leading_dot_float() {
    let mut interp = Interpreter::new("UTC");
    interp.run(".5").unwrap();
    assert_eq!(interp.stack_pop().unwrap(), Value::Float(0.5));
}

#[test]
fn test_case_sensitive_booleans() {
    let mut interp = Interpreter::new("UTC");
    assert!(matches!(
        interp.run("true").unwrap_err(),
        ForthicError::UnknownWord { .. }
    ));
}

fn hex_color_handler() -> LiteralHandler {
    Rc::new(|s: &str| {
        let hex = s.strip_prefix("0x")?;
        if hex.len() != 6 {
            return None;
        }
        let r = i64::from_str_radix(&hex[0..2], 16).ok()?;
        let g = i64::from_str_radix(&hex[2..4], 16).ok()?;
        let b = i64::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Value::Array(vec![
            Value::Int(r),
            Value::Int(g),
            Value::Int(b),
        ]))
    })
}

#[test]
fn test_register_custom_handler() {
    let mut interp = Interpreter::new("UTC");
    interp.register_literal_handler(hex_color_handler());

    interp.run("0xFF0000").unwrap();
    assert_eq!(
        interp.stack_pop().unwrap(),
        Value::Array(vec![Value::Int(255), Value::Int(0), Value::Int(0)])
    );
}

#[test]
fn test_unregister_custom_handler() {
    let mut interp = Interpreter::new("UTC");
    let handler = hex_color_handler();
    interp.register_literal_handler(handler.clone());
    interp.run("0xFF0000").unwrap();
    interp.stack_pop().unwrap();

    interp.unregister_literal_handler(&handler);
    assert!(matches!(
        interp.run("0xFF0000").unwrap_err(),
        ForthicError::UnknownWord { word, .. } if word == "0xFF0000"
    ));
}

#[test]
fn test_later_handler_overrides_earlier() {
    let mut interp = Interpreter::new("UTC");
    interp.register_literal_handler(Rc::new(|s: &str| {
        (s == "7").then(|| Value::String("seven".to_string()))
    }));

    interp.run("7 8").unwrap();
    assert_eq!(interp.stack_pop().unwrap(), Value::Int(8));
    assert_eq!(
        interp.stack_pop().unwrap(),
        Value::String("seven".to_string())
    );
}

#[test]
fn test_defined_word_shadows_custom_literal() {
    let mut interp = Interpreter::new("UTC");
    interp.register_literal_handler(hex_color_handler());
    interp.run(": 0xFF0000 'shadowed' ; 0xFF0000").unwrap();

    assert_eq!(
        interp.stack_pop().unwrap(),
        Value::String("shadowed".to_string())
    );
}

#[test]
fn test_wildcard_date_uses_current_year() {
    use chrono::Datelike;
    let mut interp = Interpreter::new("UTC");
    interp.run("YYYY-01-15").unwrap();

    match interp.stack_pop().unwrap() {
        Value::Date(d) => {
            assert_eq!(d.year(), chrono::Utc::now().year());
            assert_eq!((d.month(), d.day()), (1, 15));
        }
        other => panic!("Expected Date, got {:?}", other),
    }
}

#[test]
fn test_bracketed_zone_literal_end_to_end() {
    use chrono::Timelike;
    let mut interp = Interpreter::new("UTC");
    interp.run("2024-06-05T10:15:00[Europe/London]").unwrap();

    match interp.stack_pop().unwrap() {
        Value::DateTime(dt) => {
            assert_eq!(dt.hour(), 10);
            assert_eq!(dt.timezone(), chrono_tz::Europe::London);
        }
        other => panic!("Expected DateTime, got {:?}", other),
    }
}
