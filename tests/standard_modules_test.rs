// Standard module word sets, exercised end-to-end through run()

use forthic::prelude::*;

fn run(code: &str) -> Interpreter {
    let mut interp = Interpreter::new("UTC");
    interp.run(code).unwrap();
    interp
}

fn top(code: &str) -> Value {
    run(code).stack_pop().unwrap()
}

// ===== math =====

#[test]
fn test_arithmetic() {
    assert_eq!(top("3 5 +"), Value::Int(8));
    assert_eq!(top("10 3 -"), Value::Int(7));
    assert_eq!(top("3 4 *"), Value::Int(12));
    assert_eq!(top("10 4 /"), Value::Float(2.5));
    assert_eq!(top("10 3 MOD"), Value::Int(1));
    // Remainder sign follows the dividend
    assert_eq!(top("-7 3 MOD"), Value::Int(-1));
}

#[test]
fn test_mixed_arithmetic_promotes_to_float() {
    assert_eq!(top("1 2.5 +"), Value::Float(3.5));
    assert_eq!(top("2.5 2 *"), Value::Float(5.0));
}

#[test]
fn test_plus_folds_array() {
    assert_eq!(top("[1 2 3] +"), Value::Int(6));
    assert_eq!(top("[2 3 4] *"), Value::Int(24));
}

#[test]
fn test_round_max_min() {
    assert_eq!(top("2.6 ROUND"), Value::Int(3));
    assert_eq!(top("3 7 MAX"), Value::Int(7));
    assert_eq!(top("3 7 MIN"), Value::Int(3));
}

// ===== boolean =====

#[test]
fn test_comparisons() {
    assert_eq!(top("1 1 =="), Value::Bool(true));
    assert_eq!(top("1 1.0 =="), Value::Bool(true));
    assert_eq!(top("1 2 !="), Value::Bool(true));
    assert_eq!(top("1 2 <"), Value::Bool(true));
    assert_eq!(top("2 2 <="), Value::Bool(true));
    assert_eq!(top("3 2 >"), Value::Bool(true));
    assert_eq!(top("'a' 'b' <"), Value::Bool(true));
}

#[test]
fn test_logic() {
    assert_eq!(top("TRUE FALSE AND"), Value::Bool(false));
    assert_eq!(top("TRUE FALSE OR"), Value::Bool(true));
    assert_eq!(top("FALSE NOT"), Value::Bool(true));
    assert_eq!(top("[TRUE TRUE TRUE] AND"), Value::Bool(true));
    assert_eq!(top("[FALSE FALSE] OR"), Value::Bool(false));
}

#[test]
fn test_membership() {
    assert_eq!(top("2 [1 2 3] IN"), Value::Bool(true));
    assert_eq!(top("9 [1 2 3] IN"), Value::Bool(false));
}

// ===== array =====

#[test]
fn test_array_access() {
    assert_eq!(top("[10 20 30] LENGTH"), Value::Int(3));
    assert_eq!(top("[10 20 30] 1 NTH"), Value::Int(20));
    assert_eq!(top("[10 20 30] 9 NTH"), Value::Null);
    assert_eq!(top("[10 20 30] LAST"), Value::Int(30));
    assert_eq!(top("'abc' LENGTH"), Value::Int(3));
}

#[test]
fn test_array_slicing() {
    assert_eq!(
        top("[1 2 3 4 5] 1 3 SLICE"),
        Value::Array(vec![Value::Int(2), Value::Int(3)])
    );
    assert_eq!(
        top("[1 2 3 4] 2 TAKE"),
        Value::Array(vec![Value::Int(1), Value::Int(2)])
    );
    assert_eq!(
        top("[1 2 3 4] 2 DROP"),
        Value::Array(vec![Value::Int(3), Value::Int(4)])
    );
}

#[test]
fn test_array_transforms() {
    assert_eq!(
        top("[1 2 3] REVERSE"),
        Value::Array(vec![Value::Int(3), Value::Int(2), Value::Int(1)])
    );
    assert_eq!(
        top("[[1 2] [3 [4]]] FLATTEN"),
        Value::Array(vec![
            Value::Int(1),
            Value::Int(2),
            Value::Int(3),
            Value::Int(4)
        ])
    );
    assert_eq!(
        top("[1 2 1 3 2] UNIQUE"),
        Value::Array(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
    );
}

#[test]
fn test_array_combining() {
    assert_eq!(
        top("[1 2] 3 APPEND"),
        Value::Array(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
    );
    assert_eq!(
        top("[1 2] ['a' 'b'] ZIP"),
        Value::Array(vec![
            Value::Array(vec![Value::Int(1), Value::String("a".to_string())]),
            Value::Array(vec![Value::Int(2), Value::String("b".to_string())]),
        ])
    );
    assert_eq!(
        top("0 3 RANGE"),
        Value::Array(vec![Value::Int(0), Value::Int(1), Value::Int(2)])
    );
}

#[test]
fn test_foreach_leaves_results_on_stack() {
    let interp = run("[1 2 3] \"10 *\" FOREACH");
    assert_eq!(
        interp.get_stack().items(),
        vec![Value::Int(10), Value::Int(20), Value::Int(30)]
    );
}

#[test]
fn test_map_over_record_preserves_keys() {
    let mut interp = run("[['a' 1] ['b' 2]] REC \"10 *\" MAP");
    match interp.stack_pop().unwrap() {
        Value::Record(rec) => {
            let keys: Vec<&String> = rec.keys().collect();
            assert_eq!(keys, vec!["a", "b"]);
            assert_eq!(rec["a"], Value::Int(10));
            assert_eq!(rec["b"], Value::Int(20));
        }
        other => panic!("Expected Record, got {:?}", other),
    }
}

// ===== record =====

#[test]
fn test_record_build_and_access() {
    assert_eq!(top("[['a' 1] ['b' 2]] REC 'b' REC@"), Value::Int(2));
    assert_eq!(top("[['a' 1]] REC 'missing' REC@"), Value::Null);
}

#[test]
fn test_record_nested_access() {
    assert_eq!(
        top("[['outer' [['inner' 42]] REC]] REC ['outer' 'inner'] REC@"),
        Value::Int(42)
    );
}

#[test]
fn test_record_store() {
    assert_eq!(top("[['a' 1]] REC 9 'b' <REC! 'b' REC@"), Value::Int(9));
}

#[test]
fn test_record_keys_in_insertion_order() {
    assert_eq!(
        top("[['z' 1] ['a' 2] ['m' 3]] REC KEYS"),
        Value::Array(vec![
            Value::String("z".to_string()),
            Value::String("a".to_string()),
            Value::String("m".to_string()),
        ])
    );
    assert_eq!(
        top("[['z' 1] ['a' 2]] REC VALUES"),
        Value::Array(vec![Value::Int(1), Value::Int(2)])
    );
}

// ===== string =====

#[test]
fn test_string_words() {
    assert_eq!(top("'foo' 'bar' CONCAT"), Value::String("foobar".to_string()));
    assert_eq!(
        top("['a' 'b' 'c'] CONCAT"),
        Value::String("abc".to_string())
    );
    assert_eq!(
        top("'a,b,c' ',' SPLIT"),
        Value::Array(vec![
            Value::String("a".to_string()),
            Value::String("b".to_string()),
            Value::String("c".to_string()),
        ])
    );
    assert_eq!(
        top("['a' 'b'] '-' JOIN"),
        Value::String("a-b".to_string())
    );
    assert_eq!(top("'HeLLo' LOWERCASE"), Value::String("hello".to_string()));
    assert_eq!(top("'hello' UPPERCASE"), Value::String("HELLO".to_string()));
    assert_eq!(top("'  x  ' STRIP"), Value::String("x".to_string()));
    assert_eq!(
        top("'a-b-c' '-' '+' REPLACE"),
        Value::String("a+b+c".to_string())
    );
    assert_eq!(top("42 >STR"), Value::String("42".to_string()));
}

#[test]
fn test_url_encoding() {
    assert_eq!(
        top("'a b&c' URL-ENCODE"),
        Value::String("a%20b%26c".to_string())
    );
    assert_eq!(
        top("'a%20b%26c' URL-DECODE"),
        Value::String("a b&c".to_string())
    );
}

// ===== json =====

#[test]
fn test_json_round_trip() {
    assert_eq!(
        top("'[1, 2, 3]' JSON>"),
        Value::Array(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
    );
    assert_eq!(
        top("[1 2 3] >JSON"),
        Value::String("[1,2,3]".to_string())
    );
}

#[test]
fn test_json_object_preserves_key_order() {
    assert_eq!(
        top("[['z' 1] ['a' 2]] REC >JSON"),
        Value::String("{\"z\":1,\"a\":2}".to_string())
    );
}

#[test]
fn test_json_prettify() {
    let pretty = top("'{\"a\":1}' JSON-PRETTIFY");
    match pretty {
        Value::String(s) => assert!(s.contains("\n")),
        other => panic!("Expected String, got {:?}", other),
    }
}

#[test]
fn test_json_invalid_input_yields_null() {
    assert_eq!(top("'not json' JSON>"), Value::Null);
}

// ===== datetime =====

#[test]
fn test_meridiem_words() {
    use chrono::Timelike;

    let value = top("9:30 PM");
    match value {
        Value::Time(t) => assert_eq!(t.hour(), 21),
        other => panic!("Expected Time, got {:?}", other),
    }

    let value = top("21:30 AM");
    match value {
        Value::Time(t) => assert_eq!(t.hour(), 9),
        other => panic!("Expected Time, got {:?}", other),
    }
}

#[test]
fn test_date_conversions() {
    assert_eq!(
        top("'2024-06-05' >DATE DATE>STR"),
        Value::String("2024-06-05".to_string())
    );
    assert_eq!(
        top("2024-06-05 2 +DAYS DATE>STR"),
        Value::String("2024-06-07".to_string())
    );
    assert_eq!(
        top("'14:30' >TIME TIME>STR"),
        Value::String("14:30".to_string())
    );
}

#[test]
fn test_today_pushes_date() {
    assert!(matches!(top("TODAY"), Value::Date(_)));
    assert!(matches!(top("NOW"), Value::Time(_)));
}

// ===== core =====

#[test]
fn test_core_stack_words() {
    let interp = run("1 2 SWAP");
    assert_eq!(
        interp.get_stack().items(),
        vec![Value::Int(2), Value::Int(1)]
    );

    assert_eq!(top("5 DUP +"), Value::Int(10));
}

#[test]
fn test_null_and_default() {
    assert_eq!(top("NULL 7 DEFAULT"), Value::Int(7));
    assert_eq!(top("3 7 DEFAULT"), Value::Int(3));
    assert_eq!(top("'' 'fallback' DEFAULT"), Value::String("fallback".to_string()));
}
