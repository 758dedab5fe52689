//! Truthiness and text conversion for render data.
//!
//! Template data is plain `serde_json::Value`. The runtime needs two questions
//! answered about a value: is it "empty enough" to print nothing, and what text
//! does it produce when printed.

use serde_json::Value;

/// Returns whether a value counts as true when deciding to print it.
///
/// `null`, `false`, zero and the empty string are falsy. Every other value is
/// truthy, including empty arrays and empty objects.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Converts a value into the text written to the output.
///
/// # Arguments
/// * `value` - Value to print
///
/// # Returns
/// * `String` - Strings verbatim, numbers and booleans in canonical form,
///   `null` as nothing, arrays as their comma separated elements and objects
///   as compact JSON
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => {
            items.iter().map(stringify).collect::<Vec<_>>().join(",")
        }
        Value::Object(_) => value.to_string(),
    }
}
