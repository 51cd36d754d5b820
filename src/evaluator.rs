use std::cell::Cell;

use thiserror::Error;

use crate::{
    ast::{Comparator, Expr},
    functions::{Argument, ExpressionRef, FunctionError, FunctionRegistry},
    value::{Map, Value},
};

/// Deepest nesting of evaluation steps before giving up
pub const MAX_DEPTH: usize = 256;

/// Errors that can occur during evaluation.
///
/// Missing fields, wrong container types and incomparable operands are not
/// errors; they evaluate to Null.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Wrong arity or argument type in a function call
    #[error(transparent)]
    Function(#[from] FunctionError),

    /// Call to a name missing from the function registry
    #[error("Unknown function: {name}()")]
    UnknownFunction { name: String },

    /// Expression nested too deeply to evaluate safely
    #[error("Evaluation nested deeper than {limit} levels")]
    DepthExceeded { limit: usize },
}

/// Key order of objects built by multi-select hashes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ObjectOrder {
    /// Keys in the order they are declared
    #[default]
    Insertion,
    /// Keys sorted lexicographically
    Sorted,
}

/// Tree-walking evaluator.
///
/// Holds the function registry and per-call state; build one per
/// evaluation. Compiled expressions are shared, evaluators are not.
pub struct Evaluator<'a> {
    functions: &'a FunctionRegistry,
    object_order: ObjectOrder,
    depth: Cell<usize>,
}

impl<'a> Evaluator<'a> {
    pub fn new(functions: &'a FunctionRegistry) -> Self {
        Evaluator {
            functions,
            object_order: ObjectOrder::default(),
            depth: Cell::new(0),
        }
    }

    pub fn with_object_order(mut self, object_order: ObjectOrder) -> Self {
        self.object_order = object_order;
        self
    }

    /// Evaluates `expr` with `current` as the current node.
    ///
    /// # Examples
    ///
    /// ```
    /// use jmespath_lang::{Evaluator, FunctionRegistry, Value, parser::parse};
    ///
    /// let expr = parse("a.b").unwrap();
    /// let doc = Value::from(serde_json::json!({"a": {"b": 42}}));
    ///
    /// let evaluator = Evaluator::new(FunctionRegistry::builtins());
    /// assert_eq!(evaluator.evaluate(&expr, &doc).unwrap(), Value::Integer(42));
    /// ```
    pub fn evaluate(&self, expr: &Expr, current: &Value) -> Result<Value, EvalError> {
        let depth = self.depth.get();
        if depth >= MAX_DEPTH {
            return Err(EvalError::DepthExceeded { limit: MAX_DEPTH });
        }
        self.depth.set(depth + 1);
        let result = self.eval_expr(expr, current);
        self.depth.set(depth);
        result
    }

    fn eval_expr(&self, expr: &Expr, current: &Value) -> Result<Value, EvalError> {
        match expr {
            Expr::Identity | Expr::CurrentNode => Ok(current.clone()),
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Field(name) => Ok(match current {
                Value::Object(map) => map.get(name).cloned().unwrap_or(Value::Null),
                _ => Value::Null,
            }),
            Expr::Index(index) => Ok(match current {
                Value::Array(items) => index_array(items, *index),
                _ => Value::Null,
            }),
            Expr::Slice { start, stop, step } => Ok(match current {
                Value::Array(items) => slice_array(items, *start, *stop, *step),
                _ => Value::Null,
            }),
            Expr::SubExpression { left, right } => {
                let base = self.evaluate(left, current)?;
                if base.is_null() {
                    return Ok(Value::Null);
                }
                self.evaluate(right, &base)
            }
            Expr::IndexExpression { left, right } | Expr::Pipe { left, right } => {
                let base = self.evaluate(left, current)?;
                self.evaluate(right, &base)
            }
            Expr::Flatten { child, projection } => match self.evaluate(child, current)? {
                Value::Array(items) => {
                    let mut merged = Vec::with_capacity(items.len());
                    for item in items {
                        match item {
                            Value::Array(inner) => merged.extend(inner),
                            other => merged.push(other),
                        }
                    }
                    self.project(merged, projection)
                }
                _ => Ok(Value::Null),
            },
            Expr::WildcardIndex { child, projection } => match self.evaluate(child, current)? {
                Value::Array(items) => self.project(items, projection),
                _ => Ok(Value::Null),
            },
            Expr::WildcardValues { child, projection } => match self.evaluate(child, current)? {
                Value::Object(map) => self.project(map.into_values(), projection),
                _ => Ok(Value::Null),
            },
            Expr::FilterProjection {
                child,
                predicate,
                projection,
            } => match self.evaluate(child, current)? {
                Value::Array(items) => {
                    let mut kept = Vec::new();
                    for item in items {
                        if self.evaluate(predicate, &item)?.is_truthy() {
                            kept.push(item);
                        }
                    }
                    self.project(kept, projection)
                }
                _ => Ok(Value::Null),
            },
            Expr::Or { left, right } => {
                let matched = self.evaluate(left, current)?;
                if matched.is_truthy() {
                    Ok(matched)
                } else {
                    self.evaluate(right, current)
                }
            }
            Expr::And { left, right } => {
                let matched = self.evaluate(left, current)?;
                if matched.is_truthy() {
                    self.evaluate(right, current)
                } else {
                    Ok(matched)
                }
            }
            Expr::Not(child) => Ok(Value::Boolean(!self.evaluate(child, current)?.is_truthy())),
            Expr::Comparator { op, left, right } => {
                let left = self.evaluate(left, current)?;
                let right = self.evaluate(right, current)?;
                Ok(compare(*op, &left, &right))
            }
            Expr::MultiSelectList(elements) => {
                if current.is_null() {
                    return Ok(Value::Null);
                }
                let mut collected = Vec::with_capacity(elements.len());
                for element in elements {
                    collected.push(self.evaluate(element, current)?);
                }
                Ok(Value::Array(collected))
            }
            Expr::MultiSelectHash(pairs) => {
                if current.is_null() {
                    return Ok(Value::Null);
                }
                // A repeated key keeps its first position and its last value
                let mut map = Map::with_capacity(pairs.len());
                for (key, expr) in pairs {
                    map.insert(key.clone(), self.evaluate(expr, current)?);
                }
                if self.object_order == ObjectOrder::Sorted {
                    map.sort_keys();
                }
                Ok(Value::Object(map))
            }
            Expr::Function { name, args } => self.call_function(name, args, current),
            // Only meaningful as a function argument
            Expr::ExpressionRef(_) => Ok(Value::Null),
        }
    }

    /// Applies `projection` to every element, dropping Null results.
    fn project(
        &self,
        items: impl IntoIterator<Item = Value>,
        projection: &Expr,
    ) -> Result<Value, EvalError> {
        let mut collected = Vec::new();
        for item in items {
            let value = self.evaluate(projection, &item)?;
            if !value.is_null() {
                collected.push(value);
            }
        }
        Ok(Value::Array(collected))
    }

    fn call_function(&self, name: &str, args: &[Expr], current: &Value) -> Result<Value, EvalError> {
        let function = self.functions.lookup(name)?;
        let signature = function.signature();
        signature.check_arity(name, args.len())?;

        let mut resolved = Vec::with_capacity(args.len());
        for arg in args {
            resolved.push(match arg {
                Expr::ExpressionRef(inner) => Argument::Expression(ExpressionRef::new(inner, self)),
                other => Argument::Value(self.evaluate(other, current)?),
            });
        }
        signature.check_types(name, &resolved)?;

        log::trace!("calling {}() with {} argument(s)", name, resolved.len());
        function.call(&resolved)
    }
}

fn compare(op: Comparator, left: &Value, right: &Value) -> Value {
    if !op.is_ordering() {
        return Value::Boolean((left == right) == (op == Comparator::Equal));
    }
    match left.compare(right) {
        Some(ordering) => Value::Boolean(op.holds(ordering)),
        None => Value::Null,
    }
}

fn index_array(items: &[Value], index: i64) -> Value {
    let len = items.len() as i64;
    let resolved = if index < 0 { index + len } else { index };
    if resolved < 0 {
        return Value::Null;
    }
    items.get(resolved as usize).cloned().unwrap_or(Value::Null)
}

/// Slices with Python semantics: bounds are clamped, negative values count
/// from the end, and a negative step walks backwards.
fn slice_array(items: &[Value], start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Value {
    let len = items.len() as i64;
    let step = step.unwrap_or(1);
    if step == 0 {
        return Value::Null;
    }

    let clamp = |bound: Option<i64>, default: i64| match bound {
        None => default,
        Some(b) if b < 0 => {
            let b = b + len;
            if b >= 0 {
                b
            } else if step < 0 {
                -1
            } else {
                0
            }
        }
        Some(b) if b >= len => {
            if step < 0 {
                len - 1
            } else {
                len
            }
        }
        Some(b) => b,
    };

    let (start, stop) = if step < 0 {
        (clamp(start, len - 1), clamp(stop, -1))
    } else {
        (clamp(start, 0), clamp(stop, len))
    };

    let mut result = Vec::new();
    let mut i = start;
    while (step > 0 && i < stop) || (step < 0 && i > stop) {
        if let Some(item) = items.get(i as usize) {
            result.push(item.clone());
        }
        match i.checked_add(step) {
            Some(next) => i = next,
            None => break,
        }
    }
    Value::Array(result)
}
