// tests/evaluator_tests.rs

use std::{sync::Arc, thread};

use jmespath_lang::evaluator::MAX_DEPTH;
use jmespath_lang::{
    CompiledExpression, EvalError, Evaluator, Expr, FunctionRegistry, ObjectOrder, Options,
    SearchError, Value, compile, search, search_with,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn eval(expr: &str, doc: serde_json::Value) -> Value {
    search(expr, &Value::from(doc)).unwrap()
}

fn v(doc: serde_json::Value) -> Value {
    Value::from(doc)
}

// ============================================================================
// Field access
// ============================================================================

#[test]
fn test_simple_field_access() {
    assert_eq!(eval("name", json!({"name": "John", "age": 30})), v(json!("John")));
}

#[test]
fn test_nested_access() {
    let doc = json!({"user": {"name": "Alice", "email": "alice@example.com"}});
    assert_eq!(eval("user.name", doc), v(json!("Alice")));
}

#[test]
fn test_missing_field_is_null() {
    assert_eq!(eval("a.b.c", json!({"a": {"x": 1}})), Value::Null);
    assert_eq!(eval("a.b", json!({"a": "string"})), Value::Null);
    assert_eq!(eval("a", json!([1, 2])), Value::Null);
}

#[test]
fn test_empty_expression_returns_input() {
    let doc = json!({"a": [1, 2]});
    assert_eq!(eval("", doc.clone()), v(doc));
}

#[test]
fn test_current_node() {
    assert_eq!(eval("@", json!(5)), Value::Integer(5));
    assert_eq!(eval("a | @", json!({"a": 5})), Value::Integer(5));
}

// ============================================================================
// Index and slice
// ============================================================================

#[test]
fn test_index() {
    let doc = json!({"a": [10, 20, 30]});
    assert_eq!(eval("a[0]", doc.clone()), Value::Integer(10));
    assert_eq!(eval("a[-1]", doc.clone()), Value::Integer(30));
    assert_eq!(eval("a[3]", doc.clone()), Value::Null);
    assert_eq!(eval("a[-4]", doc), Value::Null);
}

#[test]
fn test_index_on_non_array() {
    assert_eq!(eval("a[0]", json!({"a": {"0": 1}})), Value::Null);
}

#[test]
fn test_slices() {
    let doc = json!([0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
    let cases = vec![
        ("[0:3]", json!([0, 1, 2])),
        ("[:3]", json!([0, 1, 2])),
        ("[7:]", json!([7, 8, 9])),
        ("[-3:]", json!([7, 8, 9])),
        ("[::2]", json!([0, 2, 4, 6, 8])),
        ("[::-1]", json!([9, 8, 7, 6, 5, 4, 3, 2, 1, 0])),
        ("[8:2:-2]", json!([8, 6, 4])),
        ("[100:]", json!([])),
        ("[-100:2]", json!([0, 1])),
        ("[:-100:-1]", json!([9, 8, 7, 6, 5, 4, 3, 2, 1, 0])),
        ("[5:2]", json!([])),
    ];

    for (expr, expected) in cases {
        assert_eq!(eval(expr, doc.clone()), v(expected), "expr: {}", expr);
    }
}

#[test]
fn test_slice_projects() {
    let doc = json!({"a": [{"b": 1}, {"b": 2}, {"c": 3}, {"b": 4}]});
    assert_eq!(eval("a[1:].b", doc), v(json!([2, 4])));
}

#[test]
fn test_slice_on_non_array() {
    assert_eq!(eval("a[0:1]", json!({"a": "abc"})), Value::Null);
}

// ============================================================================
// Projections
// ============================================================================

#[test]
fn test_list_projection_drops_nulls() {
    let doc = json!({"people": [{"name": "a"}, {"age": 1}, {"name": "c"}]});
    assert_eq!(eval("people[*].name", doc), v(json!(["a", "c"])));
}

#[test]
fn test_projection_on_non_array() {
    assert_eq!(eval("a[*].b", json!({"a": {"b": 1}})), Value::Null);
    assert_eq!(eval("a.*.b", json!({"a": [1]})), Value::Null);
}

#[test]
fn test_object_projection_keeps_key_order() {
    let doc = json!({"ops": {"z": {"n": 1}, "a": {"n": 2}, "m": {"x": 3}}});
    assert_eq!(eval("ops.*.n", doc), v(json!([1, 2])));
}

#[test]
fn test_flatten() {
    let doc = json!({"a": [[1, 2], 3, [4, [5]]]});
    assert_eq!(eval("a[]", doc), v(json!([1, 2, 3, 4, [5]])));
}

#[test]
fn test_flatten_of_projection() {
    let doc = json!({"r": [{"i": [{"s": 1}, {"s": 2}]}, {"i": [{"s": 3}]}]});
    assert_eq!(eval("r[*].i[*].s", doc.clone()), v(json!([[1, 2], [3]])));
    assert_eq!(eval("r[].i[].s", doc), v(json!([1, 2, 3])));
}

#[test]
fn test_pipe_stops_projection() {
    let doc = json!({"a": [{"b": 1}, {"b": 2}]});
    assert_eq!(eval("a[*].b[0]", doc.clone()), v(json!([])));
    assert_eq!(eval("a[*].b | [0]", doc), Value::Integer(1));
}

#[test]
fn test_pipe_does_not_short_circuit() {
    assert_eq!(eval("missing | `1`", json!({})), Value::Integer(1));
}

// ============================================================================
// Filters and comparisons
// ============================================================================

#[test]
fn test_filter() {
    let doc = json!({"machines": [
        {"name": "a", "state": "running"},
        {"name": "b", "state": "stopped"},
        {"name": "c", "state": "running"}
    ]});
    assert_eq!(
        eval("machines[?state == 'running'].name", doc),
        v(json!(["a", "c"]))
    );
}

#[test]
fn test_filter_with_numbers() {
    let doc = json!([{"a": 1}, {"a": 2.5}, {"a": 3}, {"a": "4"}]);
    assert_eq!(eval("[?a > `2`].a", doc), v(json!([2.5, 3])));
}

#[test]
fn test_equality_is_deep() {
    let doc = json!({"a": {"x": [1, {"y": 2}]}, "b": {"x": [1.0, {"y": 2}]}});
    assert_eq!(eval("a == b", doc.clone()), Value::Boolean(true));
    assert_eq!(eval("a != b", doc), Value::Boolean(false));
}

#[test]
fn test_object_equality_ignores_key_order() {
    assert_eq!(
        eval("a == b", json!({"a": {"x": 1, "y": 2}, "b": {"y": 2, "x": 1}})),
        Value::Boolean(true)
    );
}

#[test]
fn test_ordering_between_incompatible_types_is_null() {
    let doc = json!({"s": "a", "n": 1, "b": true});
    assert_eq!(eval("s < n", doc.clone()), Value::Null);
    assert_eq!(eval("b > n", doc.clone()), Value::Null);
    assert_eq!(eval("s == n", doc), Value::Boolean(false));
}

#[test]
fn test_string_ordering() {
    assert_eq!(eval("a < b", json!({"a": "apple", "b": "banana"})), Value::Boolean(true));
}

// ============================================================================
// Logical operators
// ============================================================================

#[test]
fn test_or_returns_first_truthy_operand() {
    let doc = json!({"a": [], "b": "", "c": "x"});
    assert_eq!(eval("a || b || c", doc.clone()), v(json!("x")));
    assert_eq!(eval("a || b", doc), v(json!("")));
}

#[test]
fn test_and_returns_falsy_operand() {
    let doc = json!({"a": {}, "b": 2, "c": 3});
    assert_eq!(eval("a && b", doc.clone()), v(json!({})));
    assert_eq!(eval("b && c", doc), Value::Integer(3));
}

#[test]
fn test_not() {
    let doc = json!({"zero": 0, "empty": [], "t": true});
    assert_eq!(eval("!zero", doc.clone()), Value::Boolean(false));
    assert_eq!(eval("!empty", doc.clone()), Value::Boolean(true));
    assert_eq!(eval("!missing", doc.clone()), Value::Boolean(true));
    assert_eq!(eval("!!t", doc), Value::Boolean(true));
}

// ============================================================================
// Multi-select
// ============================================================================

#[test]
fn test_multi_select_list() {
    let doc = json!({"a": 1, "b": {"c": 2}});
    assert_eq!(eval("[a, b.c, missing]", doc), v(json!([1, 2, null])));
}

#[test]
fn test_multi_select_on_null_is_null() {
    assert_eq!(eval("missing.[a, b]", json!({})), Value::Null);
    assert_eq!(eval("missing.{a: a}", json!({})), Value::Null);
}

#[test]
fn test_multi_select_hash_order() {
    let doc = json!({"x": 1, "y": 2});
    let result = eval("{z: y, a: x}", doc);
    let keys: Vec<&String> = result.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["z", "a"]);
}

#[test]
fn test_multi_select_hash_sorted() {
    let options = Options::new().with_object_order(ObjectOrder::Sorted);
    let result = search_with("{z: y, a: x}", &v(json!({"x": 1, "y": 2})), &options).unwrap();
    let keys: Vec<&String> = result.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["a", "z"]);
}

#[test]
fn test_multi_select_hash_duplicate_key_takes_last_value() {
    let result = eval("{a: x, b: y, a: y}", json!({"x": 1, "y": 2}));
    assert_eq!(result, v(json!({"a": 2, "b": 2})));
    let keys: Vec<&String> = result.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["a", "b"]);
}

#[test]
fn test_hash_projection() {
    let doc = json!({"people": [{"n": "a", "x": 1}, {"n": "b", "x": 2}]});
    assert_eq!(
        eval("people[*].{name: n}", doc),
        v(json!([{"name": "a"}, {"name": "b"}]))
    );
}

// ============================================================================
// Literals and expression references
// ============================================================================

#[test]
fn test_literals() {
    assert_eq!(eval("`{\"a\": 1}`.a", json!(null)), Value::Integer(1));
    assert_eq!(eval("'raw'", json!(null)), v(json!("raw")));
}

#[test]
fn test_bare_expression_reference_is_null() {
    assert_eq!(eval("&a", json!({"a": 1})), Value::Null);
}

// ============================================================================
// Errors and limits
// ============================================================================

#[test]
fn test_search_reports_parse_errors() {
    assert!(matches!(
        search("a[", &Value::Null),
        Err(SearchError::Parse(_))
    ));
}

#[test]
fn test_unknown_function() {
    let err = search("nope(@)", &Value::Null).unwrap_err();
    assert_eq!(
        err,
        SearchError::Eval(EvalError::UnknownFunction {
            name: "nope".to_string()
        })
    );
    assert_eq!(err.to_string(), "Unknown function: nope()");
}

#[test]
fn test_depth_exceeded() {
    // The parser never builds a tree this deep, so assemble it by hand
    let deep = (0..MAX_DEPTH + 10).fold(Expr::Field("a".to_string()), |left, _| {
        Expr::SubExpression {
            left: Box::new(left),
            right: Box::new(Expr::Field("a".to_string())),
        }
    });
    let evaluator = Evaluator::new(FunctionRegistry::builtins());
    assert_eq!(
        evaluator.evaluate(&deep, &v(json!({}))),
        Err(EvalError::DepthExceeded { limit: MAX_DEPTH })
    );

    let short_chain = vec!["a"; 50].join(".");
    assert_eq!(search(&short_chain, &v(json!({}))).unwrap(), Value::Null);
}

// ============================================================================
// Compiled expressions
// ============================================================================

#[test]
fn test_compiled_expression_is_reusable() {
    let expr = compile("a.b").unwrap();
    assert_eq!(expr.as_str(), "a.b");
    assert_eq!(expr.to_string(), "a.b");
    assert_eq!(expr.evaluate(&v(json!({"a": {"b": 1}}))).unwrap(), Value::Integer(1));
    assert_eq!(expr.evaluate(&v(json!({"a": {"b": 2}}))).unwrap(), Value::Integer(2));
}

#[test]
fn test_compiled_expression_from_str() {
    let expr: CompiledExpression = "foo[0]".parse().unwrap();
    assert!(matches!(expr.ast(), Expr::IndexExpression { .. }));
    assert!("foo[".parse::<CompiledExpression>().is_err());
}

#[test]
fn test_evaluation_is_repeatable() {
    let expr = compile("sort_by(items, &k)[*].k").unwrap();
    let doc = v(json!({"items": [{"k": 3}, {"k": 1}, {"k": 2}]}));
    let first = expr.evaluate(&doc).unwrap();
    let second = expr.evaluate(&doc).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, v(json!([1, 2, 3])));
}

#[test]
fn test_compiled_expression_shared_across_threads() {
    let expr = Arc::new(compile("items[?v > `1`].v | sum(@)").unwrap());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let expr = Arc::clone(&expr);
            thread::spawn(move || {
                let doc = v(json!({"items": [{"v": 1}, {"v": 2}, {"v": i + 2}]}));
                expr.evaluate(&doc).unwrap()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), Value::Integer(2 + i as i64 + 2));
    }
}

#[test]
fn test_evaluator_directly() {
    let expr = jmespath_lang::parse("length(@)").unwrap();
    let evaluator = Evaluator::new(FunctionRegistry::builtins());
    assert_eq!(evaluator.evaluate(&expr, &v(json!("abc"))).unwrap(), Value::Integer(3));
}
