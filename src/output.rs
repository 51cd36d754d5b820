//! JSON output for query results.
//!
//! Objects are written in their stored key order, so results built from a
//! parsed document keep the document's order, and multi-select hashes keep
//! the order they were declared in (or sorted, per
//! [`ObjectOrder`](crate::ObjectOrder)).
//!
//! # Examples
//!
//! ```
//! use jmespath_lang::Value;
//! use jmespath_lang::output::{to_json, to_json_pretty};
//! use serde_json::json;
//!
//! let value = Value::from(json!({"name": "Alice", "tags": ["a"]}));
//!
//! assert_eq!(to_json(&value), r#"{"name":"Alice","tags":["a"]}"#);
//! assert_eq!(
//!     to_json_pretty(&value),
//!     "{\n  \"name\": \"Alice\",\n  \"tags\": [\n    \"a\"\n  ]\n}"
//! );
//! ```

use crate::value::Value;

/// Converts a Value to compact JSON, with no whitespace between tokens.
///
/// Integers print without a fraction, floats keep one (`1.5`, `2.0`).
/// Non-finite floats have no JSON form and print as `null`.
pub fn to_json(value: &Value) -> String {
    // Value serialization cannot fail: every key is a string
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

/// Converts a Value to pretty-printed JSON with 2-space indentation.
pub fn to_json_pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
}
