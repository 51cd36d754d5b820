// tests/function_tests.rs

use jmespath_lang::functions::{DataType, FunctionError, FunctionRegistry, Parameter, Signature};
use jmespath_lang::{EvalError, Options, SearchError, Value, search, search_with};
use pretty_assertions::assert_eq;
use serde_json::json;

fn eval(expr: &str, doc: serde_json::Value) -> Value {
    search(expr, &Value::from(doc)).unwrap()
}

fn eval_err(expr: &str, doc: serde_json::Value) -> FunctionError {
    match search(expr, &Value::from(doc)) {
        Err(SearchError::Eval(EvalError::Function(e))) => e,
        other => panic!("expected a function error for {}, got {:?}", expr, other),
    }
}

fn v(doc: serde_json::Value) -> Value {
    Value::from(doc)
}

fn numbers() -> Signature {
    Signature::new(vec![
        Parameter::new(&[DataType::Number]),
        Parameter::new(&[DataType::Number]),
    ])
}

// ============================================================================
// Numeric functions
// ============================================================================

#[test]
fn test_abs() {
    assert_eq!(eval("abs(`-3`)", json!(null)), Value::Integer(3));
    assert_eq!(eval("abs(`-1.5`)", json!(null)), Value::Float(1.5));
}

#[test]
fn test_ceil_and_floor() {
    assert_eq!(eval("ceil(`1.2`)", json!(null)), Value::Integer(2));
    assert_eq!(eval("floor(`1.8`)", json!(null)), Value::Integer(1));
    assert_eq!(eval("floor(`-1.2`)", json!(null)), Value::Integer(-2));
    assert_eq!(eval("ceil(`4`)", json!(null)), Value::Integer(4));
}

#[test]
fn test_sum_and_avg() {
    let doc = json!({"n": [1, 2, 3, 4]});
    assert_eq!(eval("sum(n)", doc.clone()), Value::Integer(10));
    assert_eq!(eval("avg(n)", doc), Value::Float(2.5));
    assert_eq!(eval("sum(`[]`)", json!(null)), Value::Integer(0));
    assert_eq!(eval("avg(`[]`)", json!(null)), Value::Null);
}

#[test]
fn test_sum_of_floats_is_exact() {
    assert_eq!(eval("sum(`[0.1, 0.2]`)", json!(null)), Value::Float(0.3));
}

#[test]
fn test_max_and_min() {
    let doc = json!({"n": [3, 10, -1], "s": ["b", "c", "a"]});
    assert_eq!(eval("max(n)", doc.clone()), Value::Integer(10));
    assert_eq!(eval("min(n)", doc.clone()), Value::Integer(-1));
    assert_eq!(eval("max(s)", doc.clone()), v(json!("c")));
    assert_eq!(eval("min(s)", doc), v(json!("a")));
    assert_eq!(eval("max(`[]`)", json!(null)), Value::Null);
}

#[test]
fn test_max_rejects_mixed_arrays() {
    let err = eval_err("max(`[1, \"a\"]`)", json!(null));
    assert_eq!(
        err,
        FunctionError::InvalidType {
            function: "max".to_string(),
            index: 0,
            expected: vec![DataType::ArrayNumber, DataType::ArrayString],
            actual: "array",
        }
    );
    assert_eq!(
        err.to_string(),
        "max() argument 0 must be array[number]|array[string], got array"
    );
}

// ============================================================================
// String functions
// ============================================================================

#[test]
fn test_contains() {
    assert_eq!(eval("contains('foobar', 'oba')", json!(null)), Value::Boolean(true));
    assert_eq!(eval("contains(`[1, 2]`, `2`)", json!(null)), Value::Boolean(true));
    assert_eq!(eval("contains(`[1, 2]`, '2')", json!(null)), Value::Boolean(false));
}

#[test]
fn test_starts_and_ends_with() {
    assert_eq!(eval("starts_with('hello', 'he')", json!(null)), Value::Boolean(true));
    assert_eq!(eval("ends_with('hello', 'lo')", json!(null)), Value::Boolean(true));
    assert_eq!(eval("ends_with('hello', 'he')", json!(null)), Value::Boolean(false));
}

#[test]
fn test_join() {
    let doc = json!({"parts": ["a", "b", "c"]});
    assert_eq!(eval("join(', ', parts)", doc), v(json!("a, b, c")));
    assert_eq!(eval("join('-', `[]`)", json!(null)), v(json!("")));
}

#[test]
fn test_length() {
    assert_eq!(eval("length('héllo')", json!(null)), Value::Integer(5));
    assert_eq!(eval("length(@)", json!([1, 2, 3])), Value::Integer(3));
    assert_eq!(eval("length(@)", json!({"a": 1})), Value::Integer(1));
}

#[test]
fn test_reverse() {
    assert_eq!(eval("reverse('abc')", json!(null)), v(json!("cba")));
    assert_eq!(eval("reverse(@)", json!([1, 2, 3])), v(json!([3, 2, 1])));
}

// ============================================================================
// Object functions
// ============================================================================

#[test]
fn test_keys_and_values() {
    let doc = json!({"b": 1, "a": 2});
    assert_eq!(eval("keys(@)", doc.clone()), v(json!(["b", "a"])));
    assert_eq!(eval("values(@)", doc), v(json!([1, 2])));
}

#[test]
fn test_merge() {
    let doc = json!({"a": {"x": 1, "y": 1}, "b": {"y": 2, "z": 3}});
    assert_eq!(eval("merge(a, b)", doc), v(json!({"x": 1, "y": 2, "z": 3})));
    assert_eq!(eval("merge(`{}`)", json!(null)), v(json!({})));
}

#[test]
fn test_merge_requires_an_argument() {
    let err = eval_err("merge()", json!(null));
    assert_eq!(err.to_string(), "merge() takes at least 1 argument(s), got 0");
}

#[test]
fn test_not_null() {
    let doc = json!({"b": 2});
    assert_eq!(eval("not_null(a, b, `3`)", doc.clone()), Value::Integer(2));
    assert_eq!(eval("not_null(a, c)", doc), Value::Null);
}

// ============================================================================
// Conversion functions
// ============================================================================

#[test]
fn test_to_array() {
    assert_eq!(eval("to_array(`1`)", json!(null)), v(json!([1])));
    assert_eq!(eval("to_array(`[1]`)", json!(null)), v(json!([1])));
}

#[test]
fn test_to_number() {
    assert_eq!(eval("to_number('42')", json!(null)), Value::Integer(42));
    assert_eq!(eval("to_number('1.5')", json!(null)), Value::Float(1.5));
    assert_eq!(eval("to_number('abc')", json!(null)), Value::Null);
    assert_eq!(eval("to_number(`true`)", json!(null)), Value::Null);
    assert_eq!(eval("to_number(`7`)", json!(null)), Value::Integer(7));
}

#[test]
fn test_to_string() {
    assert_eq!(eval("to_string('a')", json!(null)), v(json!("a")));
    assert_eq!(eval("to_string(`[1, \"b\"]`)", json!(null)), v(json!("[1,\"b\"]")));
    assert_eq!(eval("to_string(`null`)", json!(null)), v(json!("null")));
}

#[test]
fn test_type() {
    let cases = vec![
        ("`null`", "null"),
        ("`true`", "boolean"),
        ("`1.5`", "number"),
        ("'s'", "string"),
        ("`[]`", "array"),
        ("`{}`", "object"),
    ];
    for (arg, expected) in cases {
        let expr = format!("type({})", arg);
        assert_eq!(eval(&expr, json!(null)), v(json!(expected)), "expr: {}", expr);
    }
}

// ============================================================================
// Expression reference functions
// ============================================================================

#[test]
fn test_sort() {
    assert_eq!(eval("sort(@)", json!([3, 1, 2])), v(json!([1, 2, 3])));
    assert_eq!(eval("sort(@)", json!(["b", "a"])), v(json!(["a", "b"])));
}

#[test]
fn test_sort_by_is_stable() {
    let doc = json!([
        {"n": "a", "k": 2},
        {"n": "b", "k": 1},
        {"n": "c", "k": 2},
        {"n": "d", "k": 1}
    ]);
    assert_eq!(eval("sort_by(@, &k)[*].n", doc), v(json!(["b", "d", "a", "c"])));
}

#[test]
fn test_sort_by_rejects_mixed_keys() {
    let doc = json!([{"k": 1}, {"k": "a"}]);
    let err = eval_err("sort_by(@, &k)", doc);
    assert_eq!(
        err,
        FunctionError::InvalidType {
            function: "sort_by".to_string(),
            index: 1,
            expected: vec![DataType::Number],
            actual: "string",
        }
    );
}

#[test]
fn test_sort_by_rejects_null_keys() {
    let err = eval_err("sort_by(@, &missing)", json!([{"k": 1}]));
    assert!(matches!(err, FunctionError::InvalidType { actual: "null", .. }));
}

#[test]
fn test_max_by_and_min_by() {
    let doc = json!({"people": [
        {"name": "a", "age": 30},
        {"name": "b", "age": 50},
        {"name": "c", "age": 10}
    ]});
    assert_eq!(eval("max_by(people, &age).name", doc.clone()), v(json!("b")));
    assert_eq!(eval("min_by(people, &age).name", doc), v(json!("c")));
    assert_eq!(eval("max_by(`[]`, &age)", json!(null)), Value::Null);
}

#[test]
fn test_map_keeps_nulls() {
    let doc = json!([{"a": 1}, {"b": 2}, {"a": 3}]);
    assert_eq!(eval("map(&a, @)", doc), v(json!([1, null, 3])));
}

#[test]
fn test_expression_reference_required() {
    let err = eval_err("sort_by(@, k)", json!([{"k": 1}]));
    assert!(matches!(
        err,
        FunctionError::InvalidType {
            index: 1,
            actual: "null",
            ..
        }
    ));
}

#[test]
fn test_expression_reference_rejected_for_values() {
    let err = eval_err("length(&a)", json!({"a": "x"}));
    assert_eq!(err.to_string(), "length() argument 0 must be string|array|object, got expref");
}

// ============================================================================
// Dispatch errors
// ============================================================================

#[test]
fn test_arity_errors() {
    let err = eval_err("length(`1`, `2`)", json!(null));
    assert_eq!(
        err,
        FunctionError::Arity {
            function: "length".to_string(),
            expected: 1,
            actual: 2,
            variadic: false,
        }
    );
    assert_eq!(err.to_string(), "length() takes 1 argument(s), got 2");
}

#[test]
fn test_type_errors() {
    let err = eval_err("abs('a')", json!(null));
    assert_eq!(err.to_string(), "abs() argument 0 must be number, got string");
}

#[test]
fn test_arity_checked_before_arguments_are_evaluated() {
    // The unknown function inside would fail if it were evaluated
    let err = eval_err("abs(nope(@), `1`)", json!(null));
    assert!(matches!(err, FunctionError::Arity { .. }));
}

// ============================================================================
// Custom functions
// ============================================================================

fn custom_registry() -> FunctionRegistry {
    let mut registry = FunctionRegistry::with_builtins();
    registry
        .register("custom_add", numbers(), |args| {
            Ok(args[0].value().add(args[1].value()).unwrap_or(Value::Null))
        })
        .register("my_subtract", numbers(), |args| {
            Ok(args[0].value().subtract(args[1].value()).unwrap_or(Value::Null))
        });
    registry
}

#[test]
fn test_custom_functions() {
    let options = Options::new().with_functions(custom_registry());
    let empty = v(json!({}));

    assert_eq!(
        search_with("custom_add(`1`, `2`)", &empty, &options).unwrap(),
        Value::Integer(3)
    );
    assert_eq!(
        search_with("my_subtract(`10`, `3`)", &empty, &options).unwrap(),
        Value::Integer(7)
    );
    assert_eq!(
        search_with("length(`[1, 2]`)", &empty, &options).unwrap(),
        Value::Integer(2)
    );
}

#[test]
fn test_custom_functions_do_not_leak_into_builtins() {
    let _options = Options::new().with_functions(custom_registry());
    assert!(!FunctionRegistry::builtins().contains("custom_add"));
    assert_eq!(
        search("custom_add(`1`, `2`)", &Value::Null).unwrap_err(),
        SearchError::Eval(EvalError::UnknownFunction {
            name: "custom_add".to_string()
        })
    );
    assert_eq!(search("length(`[1, 2]`)", &v(json!({}))).unwrap(), Value::Integer(2));
}

#[test]
fn test_custom_signature_is_enforced() {
    let options = Options::new().with_functions(custom_registry());
    let err = search_with("custom_add('a', `2`)", &Value::Null, &options).unwrap_err();
    assert_eq!(err.to_string(), "custom_add() argument 0 must be number, got string");
}

#[test]
fn test_override_builtin_in_copy_only() {
    let mut registry = FunctionRegistry::with_builtins();
    registry.register(
        "length",
        Signature::new(vec![Parameter::any()]),
        |_args| Ok(Value::Integer(-1)),
    );
    let options = Options::new().with_functions(registry);

    assert_eq!(
        search_with("length(`[1]`)", &Value::Null, &options).unwrap(),
        Value::Integer(-1)
    );
    assert_eq!(search("length(`[1]`)", &Value::Null).unwrap(), Value::Integer(1));
}

#[test]
fn test_variadic_custom_function() {
    let mut registry = FunctionRegistry::new();
    registry.register(
        "count",
        Signature::variadic(vec![], Parameter::any()),
        |args| Ok(Value::Integer(args.len() as i64)),
    );
    let options = Options::new().with_functions(registry);
    assert_eq!(
        search_with("count(`1`, `2`, `3`)", &Value::Null, &options).unwrap(),
        Value::Integer(3)
    );
}

#[test]
fn test_registry_listing() {
    let builtins = FunctionRegistry::builtins();
    let names = builtins.names();
    assert!(names.windows(2).all(|w| w[0] < w[1]));
    assert!(names.contains(&"sort_by"));
    assert_eq!(builtins.len(), 26);
    assert!(FunctionRegistry::new().is_empty());
}
