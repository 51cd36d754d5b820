//! A JMESPath query engine over JSON values.
//!
//! Expressions are tokenized by the [`lexer`], turned into an [`Expr`] tree
//! by the [`parser`], and evaluated against a [`Value`] by the
//! [`evaluator`]. Most callers only need [`search`] or [`compile`]:
//!
//! ```
//! use jmespath_lang::{search, Value};
//! use serde_json::json;
//!
//! let doc = Value::from(json!({"locations": [
//!     {"name": "Seattle", "state": "WA"},
//!     {"name": "New York", "state": "NY"},
//!     {"name": "Bellevue", "state": "WA"}
//! ]}));
//!
//! let result = search("locations[?state == 'WA'].name | sort(@)", &doc).unwrap();
//! assert_eq!(result, Value::from(json!(["Bellevue", "Seattle"])));
//! ```

pub mod ast;
#[cfg(feature = "cli")]
pub mod cli;
pub mod evaluator;
pub mod expression;
pub mod functions;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod value;

pub use ast::{Comparator, Expr, Spanned, Token};
pub use evaluator::{EvalError, Evaluator, ObjectOrder};
pub use expression::{CompiledExpression, Options, SearchError, compile, search, search_with};
pub use functions::{
    Argument, DataType, ExpressionRef, Function, FunctionError, FunctionRegistry, Parameter,
    Signature,
};
pub use lexer::{LexError, Lexer, Position, tokenize};
pub use output::{to_json, to_json_pretty};
pub use parser::{ParseError, Parser, parse};
pub use value::Value;
