//! Listing of available functions

use crate::FunctionRegistry;

/// One line per function, sorted by name: `name(signature)`.
pub fn describe_functions(registry: &FunctionRegistry) -> String {
    let mut out = String::new();
    for name in registry.names() {
        if let Some(function) = registry.get(name) {
            out.push_str(name);
            out.push_str(&function.signature().to_string());
            out.push('\n');
        }
    }
    out
}
