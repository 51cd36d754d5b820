//! # JMESPath - Abstract Syntax Tree
//!
//! This module defines the tokens and the Abstract Syntax Tree (AST) for
//! JMESPath expressions.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Expression nodes (fields, projections, functions, literals)
//! - **[operators]** - Comparison operators
//!
//! ## Core Concepts
//!
//! ### Projections
//!
//! `[*]`, `*`, `[]` and `[?...]` start a projection: whatever follows is
//! applied to every element and Null results are dropped.
//!
//! ```text
//! people[*].address.city
//! ```
//!
//! The parser stores the part after the projection as the node's
//! `projection` child, so `address.city` above is evaluated per element.
//!
//! ### Pipes
//!
//! A pipe stops the projection and hands the whole array to the right side:
//!
//! ```text
//! people[*].name | [0]
//! ```
//!
//! ### Null Propagation
//!
//! Missing fields, out-of-range indices and type mismatches evaluate to
//! `null` instead of failing.
pub mod expressions;
pub mod operators;
pub mod tokens;

pub use expressions::Expr;
pub use operators::Comparator;
pub use tokens::{Spanned, Token};
