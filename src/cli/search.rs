//! Run expressions against JSON input

use super::CliError;
use crate::{Expr, Value, compile};

/// Options for the search command
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// The expression to evaluate
    pub expression: String,
    /// JSON input string
    pub input: Option<String>,
    /// Only parse, returning the syntax tree
    pub ast_only: bool,
}

/// Result of a search operation
#[derive(Debug)]
pub enum SearchResult {
    /// Parsed syntax tree (`ast_only`)
    Ast(Expr),
    /// Evaluation result
    Value(Value),
}

/// Parses the expression, then evaluates it against the JSON input unless
/// only the syntax tree was asked for.
pub fn execute_search(options: &SearchOptions) -> Result<SearchResult, CliError> {
    let compiled = compile(&options.expression)?;

    if options.ast_only {
        return Ok(SearchResult::Ast(compiled.ast().clone()));
    }

    let json_str = options.input.as_deref().ok_or(CliError::NoInput)?;
    let data: serde_json::Value = serde_json::from_str(json_str)?;

    let result = compiled.evaluate(&Value::from(data))?;
    Ok(SearchResult::Value(result))
}
