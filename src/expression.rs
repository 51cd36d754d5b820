//! Compiled expressions and the one-shot search entry points.
//!
//! A [`CompiledExpression`] is parsed once and can then be evaluated any
//! number of times, from any number of threads; each evaluation builds its
//! own [`Evaluator`].
//!
//! # Examples
//!
//! ```
//! use jmespath_lang::{compile, Value};
//! use serde_json::json;
//!
//! let expr = compile("people[?age > `20`].name").unwrap();
//! let doc = Value::from(json!({
//!     "people": [
//!         {"name": "a", "age": 10},
//!         {"name": "b", "age": 30}
//!     ]
//! }));
//!
//! assert_eq!(expr.evaluate(&doc).unwrap(), Value::from(json!(["b"])));
//! ```

use std::{fmt, str::FromStr, sync::Arc};

use thiserror::Error;

use crate::{
    ast::Expr,
    evaluator::{EvalError, Evaluator, ObjectOrder},
    functions::FunctionRegistry,
    parser::{ParseError, parse},
    value::Value,
};

/// Errors from a one-shot [`search`]: either stage can fail.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// Evaluation settings.
///
/// The default evaluates with the built-in functions and keeps
/// multi-select hash keys in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub object_order: ObjectOrder,
    pub functions: Option<Arc<FunctionRegistry>>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object_order(mut self, object_order: ObjectOrder) -> Self {
        self.object_order = object_order;
        self
    }

    /// Replaces the built-ins with `functions`. Start from
    /// [`FunctionRegistry::with_builtins`] to keep them available.
    pub fn with_functions(mut self, functions: impl Into<Arc<FunctionRegistry>>) -> Self {
        self.functions = Some(functions.into());
        self
    }

    /// The registry evaluation will consult
    pub fn registry(&self) -> &FunctionRegistry {
        match &self.functions {
            Some(functions) => functions,
            None => FunctionRegistry::builtins(),
        }
    }
}

/// A parsed expression together with its source text.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpression {
    text: String,
    ast: Expr,
}

impl CompiledExpression {
    pub fn new(text: &str) -> Result<Self, ParseError> {
        let ast = parse(text)?;
        log::debug!("compiled expression {:?}", text);
        Ok(CompiledExpression {
            text: text.to_string(),
            ast,
        })
    }

    pub fn ast(&self) -> &Expr {
        &self.ast
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Evaluates against `data` with default [`Options`].
    pub fn evaluate(&self, data: &Value) -> Result<Value, EvalError> {
        Evaluator::new(FunctionRegistry::builtins()).evaluate(&self.ast, data)
    }

    pub fn evaluate_with(&self, data: &Value, options: &Options) -> Result<Value, EvalError> {
        Evaluator::new(options.registry())
            .with_object_order(options.object_order)
            .evaluate(&self.ast, data)
    }
}

impl fmt::Display for CompiledExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for CompiledExpression {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CompiledExpression::new(s)
    }
}

/// Parses `text` into a reusable [`CompiledExpression`].
pub fn compile(text: &str) -> Result<CompiledExpression, ParseError> {
    CompiledExpression::new(text)
}

/// Compiles `text` and evaluates it against `data` in one step.
///
/// # Examples
///
/// ```
/// use jmespath_lang::{search, Value};
/// use serde_json::json;
///
/// let doc = Value::from(json!({"foo": {"bar": [1, 2, 3]}}));
/// assert_eq!(search("foo.bar[-1]", &doc).unwrap(), Value::Integer(3));
/// assert_eq!(search("foo.missing", &doc).unwrap(), Value::Null);
/// ```
pub fn search(text: &str, data: &Value) -> Result<Value, SearchError> {
    Ok(compile(text)?.evaluate(data)?)
}

pub fn search_with(text: &str, data: &Value, options: &Options) -> Result<Value, SearchError> {
    Ok(compile(text)?.evaluate_with(data, options)?)
}
