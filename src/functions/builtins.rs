//! The built-in function library.
//!
//! Handlers receive arguments already checked against their signature, so
//! they only match the shapes the signature allows and fall back to Null
//! otherwise.

use std::cmp::Ordering;

use crate::{
    evaluator::EvalError,
    functions::{
        Argument, DataType as T, ExpressionRef, FunctionError, FunctionRegistry, NULL, Parameter,
        Signature,
    },
    output::to_json,
    value::{Map, Value},
};

type CallResult = Result<Value, EvalError>;

fn one(types: &[T]) -> Signature {
    Signature::new(vec![Parameter::new(types)])
}

fn two(first: &[T], second: &[T]) -> Signature {
    Signature::new(vec![Parameter::new(first), Parameter::new(second)])
}

pub(super) fn register_all(registry: &mut FunctionRegistry) {
    registry
        .register("abs", one(&[T::Number]), abs)
        .register("avg", one(&[T::ArrayNumber]), avg)
        .register("ceil", one(&[T::Number]), ceil)
        .register("contains", two(&[T::Array, T::String], &[T::Any]), contains)
        .register("ends_with", two(&[T::String], &[T::String]), ends_with)
        .register("floor", one(&[T::Number]), floor)
        .register("join", two(&[T::String], &[T::ArrayString]), join)
        .register("keys", one(&[T::Object]), keys)
        .register("length", one(&[T::String, T::Array, T::Object]), length)
        .register("map", two(&[T::ExpressionRef], &[T::Array]), map)
        .register("max", one(&[T::ArrayNumber, T::ArrayString]), max)
        .register("max_by", two(&[T::Array], &[T::ExpressionRef]), max_by)
        .register(
            "merge",
            Signature::variadic(vec![], Parameter::new(&[T::Object])),
            merge,
        )
        .register("min", one(&[T::ArrayNumber, T::ArrayString]), min)
        .register("min_by", two(&[T::Array], &[T::ExpressionRef]), min_by)
        .register("not_null", Signature::variadic(vec![], Parameter::any()), not_null)
        .register("reverse", one(&[T::Array, T::String]), reverse)
        .register("sort", one(&[T::ArrayNumber, T::ArrayString]), sort)
        .register("sort_by", two(&[T::Array], &[T::ExpressionRef]), sort_by)
        .register("starts_with", two(&[T::String], &[T::String]), starts_with)
        .register("sum", one(&[T::ArrayNumber]), sum)
        .register("to_array", one(&[T::Any]), to_array)
        .register("to_number", one(&[T::Any]), to_number)
        .register("to_string", one(&[T::Any]), to_string)
        .register("type", one(&[T::Any]), type_of)
        .register("values", one(&[T::Object]), values);
}

fn arg<'v>(args: &'v [Argument<'_>], index: usize) -> &'v Value {
    args.get(index).map_or(&NULL, Argument::value)
}

fn expression<'v, 'a>(
    function: &str,
    args: &'v [Argument<'a>],
    index: usize,
) -> Result<&'v ExpressionRef<'a>, EvalError> {
    args.get(index).and_then(Argument::expression).ok_or_else(|| {
        FunctionError::InvalidType {
            function: function.to_string(),
            index,
            expected: vec![T::ExpressionRef],
            actual: arg(args, index).type_name(),
        }
        .into()
    })
}

fn items<'v>(args: &'v [Argument<'_>], index: usize) -> &'v [Value] {
    arg(args, index)
        .as_array()
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Ordering for values that passed a number-or-string check
fn ordering(a: &Value, b: &Value) -> Ordering {
    a.compare(b).unwrap_or(Ordering::Equal)
}

fn abs(args: &[Argument<'_>]) -> CallResult {
    Ok(match arg(args, 0) {
        Value::Integer(n) => n
            .checked_abs()
            .map_or(Value::Float((*n as f64).abs()), Value::Integer),
        Value::Float(n) => Value::Float(n.abs()),
        _ => Value::Null,
    })
}

fn avg(args: &[Argument<'_>]) -> CallResult {
    let values = items(args, 0);
    if values.is_empty() {
        return Ok(Value::Null);
    }
    let total = sum_values(values);
    Ok(total
        .as_float()
        .map_or(Value::Null, |t| Value::Float(t / values.len() as f64)))
}

fn ceil(args: &[Argument<'_>]) -> CallResult {
    Ok(match arg(args, 0) {
        Value::Float(n) => Value::from_f64(n.ceil()),
        other => other.clone(),
    })
}

fn floor(args: &[Argument<'_>]) -> CallResult {
    Ok(match arg(args, 0) {
        Value::Float(n) => Value::from_f64(n.floor()),
        other => other.clone(),
    })
}

fn contains(args: &[Argument<'_>]) -> CallResult {
    let found = match (arg(args, 0), arg(args, 1)) {
        (Value::Array(values), search) => values.contains(search),
        (Value::String(s), Value::String(search)) => s.contains(search.as_str()),
        _ => false,
    };
    Ok(Value::Boolean(found))
}

fn starts_with(args: &[Argument<'_>]) -> CallResult {
    Ok(match (arg(args, 0), arg(args, 1)) {
        (Value::String(s), Value::String(prefix)) => Value::Boolean(s.starts_with(prefix.as_str())),
        _ => Value::Null,
    })
}

fn ends_with(args: &[Argument<'_>]) -> CallResult {
    Ok(match (arg(args, 0), arg(args, 1)) {
        (Value::String(s), Value::String(suffix)) => Value::Boolean(s.ends_with(suffix.as_str())),
        _ => Value::Null,
    })
}

fn join(args: &[Argument<'_>]) -> CallResult {
    let glue = arg(args, 0).as_str().unwrap_or_default();
    let parts: Vec<&str> = items(args, 1).iter().filter_map(Value::as_str).collect();
    Ok(Value::String(parts.join(glue)))
}

fn keys(args: &[Argument<'_>]) -> CallResult {
    Ok(match arg(args, 0) {
        Value::Object(obj) => Value::Array(obj.keys().cloned().map(Value::String).collect()),
        _ => Value::Null,
    })
}

fn values(args: &[Argument<'_>]) -> CallResult {
    Ok(match arg(args, 0) {
        Value::Object(obj) => Value::Array(obj.values().cloned().collect()),
        _ => Value::Null,
    })
}

fn length(args: &[Argument<'_>]) -> CallResult {
    let len = match arg(args, 0) {
        Value::String(s) => s.chars().count(),
        Value::Array(arr) => arr.len(),
        Value::Object(obj) => obj.len(),
        _ => return Ok(Value::Null),
    };
    Ok(Value::Integer(len as i64))
}

/// Unlike a projection, `map` keeps Null results.
fn map(args: &[Argument<'_>]) -> CallResult {
    let expr = expression("map", args, 0)?;
    let mapped = items(args, 1)
        .iter()
        .map(|item| expr.evaluate(item))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::Array(mapped))
}

fn max(args: &[Argument<'_>]) -> CallResult {
    Ok(items(args, 0)
        .iter()
        .max_by(|a, b| ordering(a, b))
        .cloned()
        .unwrap_or(Value::Null))
}

fn min(args: &[Argument<'_>]) -> CallResult {
    Ok(items(args, 0)
        .iter()
        .min_by(|a, b| ordering(a, b))
        .cloned()
        .unwrap_or(Value::Null))
}

/// Evaluates `&expr` against every element; the keys must be all numbers
/// or all strings, the first key deciding which.
fn sort_keys(function: &str, args: &[Argument<'_>]) -> Result<Vec<(Value, Value)>, EvalError> {
    let expr = expression(function, args, 1)?;
    let mut keyed = Vec::new();
    let mut required: Option<T> = None;

    for item in items(args, 0) {
        let key = expr.evaluate(item)?;
        let key_type = match &key {
            Value::Integer(_) | Value::Float(_) => T::Number,
            Value::String(_) => T::String,
            _ => T::Any,
        };
        let expected = match required {
            Some(t) => vec![t],
            None => vec![T::Number, T::String],
        };
        if key_type == T::Any || required.is_some_and(|t| t != key_type) {
            return Err(FunctionError::InvalidType {
                function: function.to_string(),
                index: 1,
                expected,
                actual: key.type_name(),
            }
            .into());
        }
        required = Some(key_type);
        keyed.push((key, item.clone()));
    }
    Ok(keyed)
}

fn max_by(args: &[Argument<'_>]) -> CallResult {
    Ok(sort_keys("max_by", args)?
        .into_iter()
        .max_by(|(a, _), (b, _)| ordering(a, b))
        .map_or(Value::Null, |(_, item)| item))
}

fn min_by(args: &[Argument<'_>]) -> CallResult {
    Ok(sort_keys("min_by", args)?
        .into_iter()
        .min_by(|(a, _), (b, _)| ordering(a, b))
        .map_or(Value::Null, |(_, item)| item))
}

fn sort(args: &[Argument<'_>]) -> CallResult {
    let mut sorted = items(args, 0).to_vec();
    sorted.sort_by(ordering);
    Ok(Value::Array(sorted))
}

/// Stable: elements with equal keys keep their input order.
fn sort_by(args: &[Argument<'_>]) -> CallResult {
    let mut keyed = sort_keys("sort_by", args)?;
    keyed.sort_by(|(a, _), (b, _)| ordering(a, b));
    Ok(Value::Array(keyed.into_iter().map(|(_, item)| item).collect()))
}

fn merge(args: &[Argument<'_>]) -> CallResult {
    let mut merged = Map::new();
    for argument in args {
        if let Value::Object(obj) = argument.value() {
            for (k, v) in obj {
                merged.insert(k.clone(), v.clone());
            }
        }
    }
    Ok(Value::Object(merged))
}

fn not_null(args: &[Argument<'_>]) -> CallResult {
    Ok(args
        .iter()
        .map(Argument::value)
        .find(|v| !v.is_null())
        .cloned()
        .unwrap_or(Value::Null))
}

fn reverse(args: &[Argument<'_>]) -> CallResult {
    Ok(match arg(args, 0) {
        Value::String(s) => Value::String(s.chars().rev().collect()),
        Value::Array(arr) => Value::Array(arr.iter().rev().cloned().collect()),
        _ => Value::Null,
    })
}

fn sum_values(values: &[Value]) -> Value {
    values
        .iter()
        .fold(Value::Integer(0), |total, v| total.add(v).unwrap_or(total))
}

fn sum(args: &[Argument<'_>]) -> CallResult {
    Ok(sum_values(items(args, 0)))
}

fn to_array(args: &[Argument<'_>]) -> CallResult {
    Ok(match arg(args, 0) {
        Value::Array(arr) => Value::Array(arr.clone()),
        other => Value::Array(vec![other.clone()]),
    })
}

fn to_number(args: &[Argument<'_>]) -> CallResult {
    Ok(match arg(args, 0) {
        n @ (Value::Integer(_) | Value::Float(_)) => n.clone(),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(n) = s.parse::<i64>() {
                Value::Integer(n)
            } else {
                match s.parse::<f64>() {
                    Ok(n) if n.is_finite() => Value::Float(n),
                    _ => Value::Null,
                }
            }
        }
        _ => Value::Null,
    })
}

fn to_string(args: &[Argument<'_>]) -> CallResult {
    Ok(match arg(args, 0) {
        Value::String(s) => Value::String(s.clone()),
        other => Value::String(to_json(other)),
    })
}

fn type_of(args: &[Argument<'_>]) -> CallResult {
    Ok(Value::String(arg(args, 0).type_name().to_string()))
}
