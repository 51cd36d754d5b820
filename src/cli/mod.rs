//! CLI support for jmespath-lang
//!
//! Provides programmatic access to the `jp` commands for embedding in
//! other tools.

mod functions;
mod search;

pub use functions::describe_functions;
pub use search::{SearchOptions, SearchResult, execute_search};

use std::io;

use thiserror::Error;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    /// Expression failed to parse
    #[error("Parse error: {0}")]
    Parse(#[from] crate::ParseError),

    /// Evaluation failed
    #[error("Evaluation error: {0}")]
    Eval(#[from] crate::EvalError),

    /// Input was not valid JSON
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// No input provided
    #[error("No input provided. Use --input, --filename or pipe JSON to stdin.")]
    NoInput,
}
