// End-to-end interpreter scenarios driven through Interpreter::run

use forthic::prelude::*;
use std::rc::Rc;

fn run(code: &str) -> Interpreter {
    let mut interp = Interpreter::new("UTC");
    interp.run(code).unwrap();
    interp
}

#[test]
fn test_addition() {
    let mut interp = run("2 4 +");
    assert_eq!(interp.get_stack().len(), 1);
    assert_eq!(interp.stack_pop().unwrap(), Value::Int(6));
}

#[test]
fn test_definition_and_call() {
    let mut interp = run(": DBL 2 * ; 5 DBL");
    assert_eq!(interp.stack_pop().unwrap(), Value::Int(10));
}

#[test]
fn test_definition_error_carries_both_locations() {
    let mut interp = Interpreter::new("UTC");
    let err = interp.run(": BAD   +;\n1 BAD 2 *").unwrap_err();

    match err {
        ForthicError::WordExecution {
            message,
            call_location,
            definition_location,
            inner_error,
            ..
        } => {
            assert!(message.contains("BAD"));
            assert_eq!(call_location.unwrap().line, 2);
            assert_eq!(definition_location.unwrap().line, 1);
            assert!(matches!(*inner_error, ForthicError::StackUnderflow { .. }));
        }
        other => panic!("Expected WordExecution, got {:?}", other),
    }
}

#[test]
fn test_string_array() {
    let mut interp = run("[ 'a' 'b' 'c' ]");
    assert_eq!(
        interp.stack_pop().unwrap(),
        Value::Array(vec![
            Value::String("a".to_string()),
            Value::String("b".to_string()),
            Value::String("c".to_string()),
        ])
    );
}

#[test]
fn test_map_over_array() {
    let mut interp = run("[1 2 3] \"2 *\" MAP");
    assert_eq!(
        interp.stack_pop().unwrap(),
        Value::Array(vec![Value::Int(2), Value::Int(4), Value::Int(6)])
    );
}

#[test]
fn test_memo_executes_inner_once() {
    let mut interp = run(
        "['count'] VARIABLES 0 count ! \
         @: CACHED count @ 1 + count ! 1 ; \
         CACHED CACHED CACHED count @",
    );

    // Refresh counter ran once even though CACHED ran three times
    assert_eq!(interp.stack_pop().unwrap(), Value::Int(1));
    assert_eq!(interp.stack_pop().unwrap(), Value::Int(1));
    assert_eq!(interp.stack_pop().unwrap(), Value::Int(1));
    assert_eq!(interp.stack_pop().unwrap(), Value::Int(1));
    assert!(interp.get_stack().is_empty());
}

#[test]
fn test_memo_bang_refreshes() {
    let mut interp = run(
        "['n'] VARIABLES 10 n ! \
         @: CACHED n @ ; \
         CACHED POP 20 n ! CACHED 30 n ! CACHED! CACHED",
    );

    // CACHED! refreshed the cell to 30; the plain calls see the cache
    assert_eq!(interp.stack_pop().unwrap(), Value::Int(30));
    assert_eq!(interp.stack_pop().unwrap(), Value::Int(10));
    assert!(interp.get_stack().is_empty());
}

#[test]
fn test_memo_bang_at_refreshes_and_pushes() {
    let mut interp = run(
        "['n'] VARIABLES 1 n ! \
         @: CACHED n @ ; \
         CACHED 2 n ! CACHED!@",
    );

    assert_eq!(interp.stack_pop().unwrap(), Value::Int(2));
    assert_eq!(interp.stack_pop().unwrap(), Value::Int(1));
}

#[test]
fn test_interpret_word() {
    let mut interp = run("\"24\" INTERPRET");
    assert_eq!(interp.stack_pop().unwrap(), Value::Int(24));
}

#[test]
fn test_interpret_uses_definitions() {
    let mut interp = run(": TRIPLE 3 * ; \"5 TRIPLE\" INTERPRET");
    assert_eq!(interp.stack_pop().unwrap(), Value::Int(15));
}

#[test]
fn test_word_shadows_literal() {
    // A definition named 42 overrides the integer literal
    let mut interp = run(": 42 100 ; 42");
    assert_eq!(interp.stack_pop().unwrap(), Value::Int(100));
}

#[test]
fn test_newer_definition_shadows_older() {
    let mut interp = run(": W 1 ; : W 2 ; W");
    assert_eq!(interp.stack_pop().unwrap(), Value::Int(2));
}

#[test]
fn test_variables_store_fetch() {
    let mut interp = run("['x'] VARIABLES 42 x ! x @");
    assert_eq!(interp.stack_pop().unwrap(), Value::Int(42));
}

#[test]
fn test_variable_store_fetch_combined() {
    let mut interp = run("['x'] VARIABLES 7 x !@");
    assert_eq!(interp.stack_pop().unwrap(), Value::Int(7));
}

#[test]
fn test_dunder_variable_is_rejected() {
    let mut interp = Interpreter::new("UTC");
    let err = interp.run("['__secret'] VARIABLES").unwrap_err();
    assert!(matches!(err, ForthicError::InvalidVariableName { .. }));
}

#[test]
fn test_options_via_tilde_arrow() {
    let mut interp = run("[.with_key TRUE] ~>");
    match interp.stack_pop().unwrap() {
        Value::Options(options) => assert_eq!(options.get_bool("with_key"), Some(true)),
        other => panic!("Expected Options, got {:?}", other),
    }
}

#[test]
fn test_options_odd_arity_is_domain_error() {
    let mut interp = Interpreter::new("UTC");
    let err = interp.run("[.depth] ~>").unwrap_err();
    assert!(matches!(err, ForthicError::InvalidOptions { .. }));
}

#[test]
fn test_map_with_key_option() {
    let mut interp = run("[10 20 30] \"POP\" [.with_key TRUE] ~> MAP");
    // With with_key the index is pushed under the item; POP drops the item,
    // leaving the index as the mapped value
    assert_eq!(
        interp.stack_pop().unwrap(),
        Value::Array(vec![Value::Int(0), Value::Int(1), Value::Int(2)])
    );
}

#[test]
fn test_peek_bang_raises_intentional_stop() {
    let mut interp = Interpreter::new("UTC");
    let err = interp.run("42 PEEK!").unwrap_err();

    match err {
        ForthicError::IntentionalStop { message } => assert!(message.contains("42")),
        other => panic!("Expected IntentionalStop, got {:?}", other),
    }
}

#[test]
fn test_stack_bang_raises_intentional_stop() {
    let mut interp = Interpreter::new("UTC");
    let err = interp.run("1 2 STACK!").unwrap_err();
    assert!(matches!(err, ForthicError::IntentionalStop { .. }));
}

#[test]
fn test_intentional_stop_is_not_recovered() {
    let mut interp = Interpreter::new("UTC");
    interp.set_error_handler(Rc::new(|_interp, _error| Ok(())));

    let err = interp.run("42 PEEK!").unwrap_err();
    assert!(matches!(err, ForthicError::IntentionalStop { .. }));
}

#[test]
fn test_stack_conservation_of_builtins() {
    // Each declared stack effect consumes and produces exactly what it says
    let cases: &[(&str, usize)] = &[
        ("1 2 +", 1),       // ( a b -- sum )
        ("1 2 SWAP", 2),    // ( a b -- b a )
        ("1 DUP", 2),       // ( a -- a a )
        ("1 2 POP", 1),     // ( a -- )
        ("1 2 ==", 1),      // ( a b -- bool )
        ("[1 2] LENGTH", 1) // ( array -- n )
    ];

    for (code, expected_depth) in cases {
        let interp = run(code);
        assert_eq!(
            interp.get_stack().len(),
            *expected_depth,
            "stack depth after {:?}",
            code
        );
    }
}

#[test]
fn test_definitions_inside_module_block() {
    let mut interp = run("{util : SQUARE DUP * ; } {util 7 SQUARE }");
    assert_eq!(interp.stack_pop().unwrap(), Value::Int(49));
}

#[test]
fn test_module_words_not_visible_outside() {
    let mut interp = Interpreter::new("UTC");
    interp.run("{util : SQUARE DUP * ; }").unwrap();

    let err = interp.run("7 SQUARE").unwrap_err();
    assert!(matches!(err, ForthicError::UnknownWord { .. }));
}

#[test]
fn test_app_module_visible_from_module_scope() {
    // Words in the app module resolve through the module stack
    let mut interp = run(": TEN 10 ; {m TEN }");
    assert_eq!(interp.stack_pop().unwrap(), Value::Int(10));
}

#[test]
fn test_date_literal() {
    let mut interp = run("2024-06-05");
    match interp.stack_pop().unwrap() {
        Value::Date(d) => assert_eq!(d.to_string(), "2024-06-05"),
        other => panic!("Expected Date, got {:?}", other),
    }
}

#[test]
fn test_time_literal_with_meridiem_word() {
    use chrono::Timelike;
    let mut interp = run("2:30 PM");
    match interp.stack_pop().unwrap() {
        Value::Time(t) => assert_eq!((t.hour(), t.minute()), (14, 30)),
        other => panic!("Expected Time, got {:?}", other),
    }
}

#[test]
fn test_zoned_datetime_literal() {
    use chrono::Timelike;
    let mut interp = run("2024-06-05T10:15:00Z");
    match interp.stack_pop().unwrap() {
        Value::DateTime(dt) => assert_eq!(dt.hour(), 10),
        other => panic!("Expected DateTime, got {:?}", other),
    }
}

#[test]
fn test_triple_quote_string_end_to_end() {
    let mut interp = run("'''He said \"hi\"'''");
    assert_eq!(
        interp.stack_pop().unwrap(),
        Value::String("He said \"hi\"".to_string())
    );
}

#[test]
fn test_dot_symbol_pushes_string() {
    let mut interp = run(".field");
    assert_eq!(interp.stack_pop().unwrap(), Value::String("field".to_string()));
}

#[test]
fn test_run_module_code_wraps_errors() {
    let mut interp = Interpreter::new("UTC");
    let module = Rc::new(std::cell::RefCell::new(Module::new_with_source(
        "broken".to_string(),
        ": OPEN 42".to_string(),
    )));

    let err = interp.run_module_code(&module).unwrap_err();
    match err {
        ForthicError::Module {
            module_name,
            inner_error,
            ..
        } => {
            assert_eq!(module_name, "broken");
            assert!(matches!(*inner_error, ForthicError::MissingSemicolon { .. }));
        }
        other => panic!("Expected Module error, got {:?}", other),
    }
}
