//! Function signatures, call arguments and the function registry.
//!
//! A [`FunctionRegistry`] maps names to a [`Signature`] and a handler. The
//! built-in library is registered once in a shared instance; extending it
//! means cloning that table and registering more entries on the copy:
//!
//! ```
//! use jmespath_lang::functions::{DataType, FunctionRegistry, Parameter, Signature};
//! use jmespath_lang::{Options, Value, search_with};
//!
//! let mut registry = FunctionRegistry::with_builtins();
//! registry.register(
//!     "double",
//!     Signature::new(vec![Parameter::new(&[DataType::Number])]),
//!     |args| {
//!         let n = args[0].value();
//!         Ok(n.add(n).unwrap_or(Value::Null))
//!     },
//! );
//!
//! let options = Options::new().with_functions(registry);
//! let result = search_with("double(`21`)", &Value::Null, &options).unwrap();
//! assert_eq!(result, Value::Integer(42));
//! ```

mod builtins;

use std::{collections::HashMap, fmt, sync::Arc};

use once_cell::sync::Lazy;
use thiserror::Error;

use crate::{
    ast::Expr,
    evaluator::{EvalError, Evaluator},
    value::Value,
};

static NULL: Value = Value::Null;

static BUILTINS: Lazy<FunctionRegistry> = Lazy::new(|| {
    let mut registry = FunctionRegistry::new();
    builtins::register_all(&mut registry);
    registry
});

/// Types a function parameter can accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Any value (but not an expression reference)
    Any,
    Number,
    String,
    Boolean,
    Array,
    Object,
    Null,
    /// `&expr` argument
    ExpressionRef,
    /// Array whose elements are all numbers
    ArrayNumber,
    /// Array whose elements are all strings
    ArrayString,
}

impl DataType {
    pub fn accepts(self, argument: &Argument<'_>) -> bool {
        match argument {
            Argument::Expression(_) => self == DataType::ExpressionRef,
            Argument::Value(value) => self.accepts_value(value),
        }
    }

    pub fn accepts_value(self, value: &Value) -> bool {
        match (self, value) {
            (DataType::Any, _) => true,
            (DataType::Number, v) => v.is_number(),
            (DataType::String, Value::String(_)) => true,
            (DataType::Boolean, Value::Boolean(_)) => true,
            (DataType::Array, Value::Array(_)) => true,
            (DataType::Object, Value::Object(_)) => true,
            (DataType::Null, Value::Null) => true,
            (DataType::ArrayNumber, Value::Array(items)) => items.iter().all(Value::is_number),
            (DataType::ArrayString, Value::Array(items)) => {
                items.iter().all(|item| matches!(item, Value::String(_)))
            }
            _ => false,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Any => "any",
            DataType::Number => "number",
            DataType::String => "string",
            DataType::Boolean => "boolean",
            DataType::Array => "array",
            DataType::Object => "object",
            DataType::Null => "null",
            DataType::ExpressionRef => "expref",
            DataType::ArrayNumber => "array[number]",
            DataType::ArrayString => "array[string]",
        };
        f.write_str(name)
    }
}

fn join_types(types: &[DataType]) -> String {
    types
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("|")
}

fn at_least(variadic: &bool) -> &'static str {
    if *variadic { "at least " } else { "" }
}

/// Errors raised by function dispatch when the arguments do not fit the
/// signature.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FunctionError {
    #[error("{function}() takes {}{expected} argument(s), got {actual}", at_least(.variadic))]
    Arity {
        function: String,
        expected: usize,
        actual: usize,
        variadic: bool,
    },

    /// `index` is the zero-based argument position
    #[error(
        "{function}() argument {index} must be {}, got {actual}",
        join_types(.expected)
    )]
    InvalidType {
        function: String,
        index: usize,
        expected: Vec<DataType>,
        actual: &'static str,
    },
}

/// One function parameter: the set of accepted types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    types: Vec<DataType>,
}

impl Parameter {
    pub fn new(types: &[DataType]) -> Self {
        Parameter {
            types: types.to_vec(),
        }
    }

    pub fn any() -> Self {
        Parameter::new(&[DataType::Any])
    }

    pub fn types(&self) -> &[DataType] {
        &self.types
    }

    pub fn accepts(&self, argument: &Argument<'_>) -> bool {
        self.types.iter().any(|t| t.accepts(argument))
    }
}

/// Declared parameters of a function.
///
/// When `variadic` is set the last parameter may repeat; it also has to
/// appear at least once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    params: Vec<Parameter>,
    variadic: bool,
}

impl Signature {
    pub fn new(params: Vec<Parameter>) -> Self {
        Signature {
            params,
            variadic: false,
        }
    }

    /// `params` followed by a repeatable `rest` parameter
    pub fn variadic(mut params: Vec<Parameter>, rest: Parameter) -> Self {
        params.push(rest);
        Signature {
            params,
            variadic: true,
        }
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    /// Parameter that argument `index` is checked against
    pub fn parameter(&self, index: usize) -> Option<&Parameter> {
        match self.params.get(index) {
            Some(param) => Some(param),
            None if self.variadic => self.params.last(),
            None => None,
        }
    }

    pub fn check_arity(&self, function: &str, actual: usize) -> Result<(), FunctionError> {
        let expected = self.params.len();
        let fits = if self.variadic {
            actual >= expected
        } else {
            actual == expected
        };
        if fits {
            Ok(())
        } else {
            Err(FunctionError::Arity {
                function: function.to_string(),
                expected,
                actual,
                variadic: self.variadic,
            })
        }
    }

    pub fn check_types(&self, function: &str, args: &[Argument<'_>]) -> Result<(), FunctionError> {
        for (index, arg) in args.iter().enumerate() {
            if let Some(param) = self.parameter(index)
                && !param.accepts(arg)
            {
                return Err(FunctionError::InvalidType {
                    function: function.to_string(),
                    index,
                    expected: param.types.clone(),
                    actual: arg.type_name(),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.params.iter().map(|p| join_types(&p.types)).collect();
        write!(f, "({}", params.join(", "))?;
        if self.variadic {
            write!(f, "...")?;
        }
        write!(f, ")")
    }
}

/// A deferred `&expr` argument, evaluated on demand by the handler.
#[derive(Clone, Copy)]
pub struct ExpressionRef<'a> {
    expr: &'a Expr,
    evaluator: &'a Evaluator<'a>,
}

impl<'a> ExpressionRef<'a> {
    pub(crate) fn new(expr: &'a Expr, evaluator: &'a Evaluator<'a>) -> Self {
        ExpressionRef { expr, evaluator }
    }

    pub fn expr(&self) -> &Expr {
        self.expr
    }

    /// Evaluates the referenced expression with `value` as current node.
    pub fn evaluate(&self, value: &Value) -> Result<Value, EvalError> {
        self.evaluator.evaluate(self.expr, value)
    }
}

impl fmt::Debug for ExpressionRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ExpressionRef").field(self.expr).finish()
    }
}

/// A resolved function argument.
#[derive(Debug, Clone)]
pub enum Argument<'a> {
    Value(Value),
    Expression(ExpressionRef<'a>),
}

impl<'a> Argument<'a> {
    /// The argument's value, Null for expression references
    pub fn value(&self) -> &Value {
        match self {
            Argument::Value(value) => value,
            Argument::Expression(_) => &NULL,
        }
    }

    pub fn expression(&self) -> Option<&ExpressionRef<'a>> {
        match self {
            Argument::Expression(expr) => Some(expr),
            Argument::Value(_) => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Argument::Value(value) => value.type_name(),
            Argument::Expression(_) => "expref",
        }
    }
}

type Handler = Arc<dyn for<'a, 'b> Fn(&'b [Argument<'a>]) -> Result<Value, EvalError> + Send + Sync>;

/// A registered function: its signature and handler.
#[derive(Clone)]
pub struct Function {
    signature: Signature,
    handler: Handler,
}

impl Function {
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Runs the handler. Arguments are expected to be checked already.
    pub fn call(&self, args: &[Argument<'_>]) -> Result<Value, EvalError> {
        (self.handler)(args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// Name to function table consulted by the evaluator.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Function>,
}

impl FunctionRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared registry holding the built-in functions
    pub fn builtins() -> &'static FunctionRegistry {
        &BUILTINS
    }

    /// Owned copy of the built-ins, ready to be extended
    pub fn with_builtins() -> Self {
        BUILTINS.clone()
    }

    /// Adds `name`, replacing any previous entry in this registry only.
    pub fn register<F>(&mut self, name: impl Into<String>, signature: Signature, handler: F) -> &mut Self
    where
        F: for<'a, 'b> Fn(&'b [Argument<'a>]) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.functions.contains_key(&name) {
            log::debug!("overriding function {}()", name);
        }
        self.functions.insert(
            name,
            Function {
                signature,
                handler: Arc::new(handler),
            },
        );
        self
    }

    pub fn get(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn lookup(&self, name: &str) -> Result<&Function, EvalError> {
        self.get(name).ok_or_else(|| EvalError::UnknownFunction {
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}
