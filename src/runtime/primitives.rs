use super::template::CompiledTemplate;
use crate::helpers::HelperTable;
use crate::value::{is_truthy, stringify};
use log::warn;
use serde_json::Value;
use std::panic::{self, AssertUnwindSafe};

/// Converts `null` and empty sequences to an empty string.
///
/// Any other value is returned unchanged, to be printed by the caller.
pub fn guard(value: Value) -> Value {
    match value {
        Value::Null => Value::String(String::new()),
        Value::Array(items) if items.is_empty() => Value::String(String::new()),
        other => other,
    }
}

/// Iterates over a mapping or sequence, concatenating the callback output.
///
/// The callback receives `(key, index, total, value)`. Mappings are walked in
/// insertion order, sequences in index order with the decimal index as key.
/// Anything that is neither yields an empty string without calling `each`.
pub fn iter(
    collection: &Value,
    each: &mut dyn FnMut(&str, usize, usize, &Value) -> String,
) -> String {
    let mut output = String::new();
    match collection {
        Value::Object(map) => {
            let total = map.len();
            for (index, (key, value)) in map.iter().enumerate() {
                output.push_str(&each(key, index, total, value));
            }
        }
        Value::Array(items) => {
            let total = items.len();
            for (index, value) in items.iter().enumerate() {
                output.push_str(&each(&index.to_string(), index, total, value));
            }
        }
        _ => {}
    }
    output
}

/// Executes the helper registered under `name` with `context` as receiver.
///
/// Never fails. Unknown helpers, helpers returning an error, helpers that
/// panic and helpers returning a falsy value all produce an empty string.
///
/// # Arguments
/// * `context` - Receiver passed to the helper
/// * `helpers` - Table to look the helper up in
/// * `name` - Helper name
/// * `args` - Positional arguments
///
/// # Returns
/// * `String` - Printed helper output
pub fn helper(context: &Value, helpers: &HelperTable, name: &str, args: &[Value]) -> String {
    let Some(func) = helpers.get(name) else {
        return String::new();
    };

    match panic::catch_unwind(AssertUnwindSafe(|| func(context, args))) {
        Ok(Ok(out)) if is_truthy(&out) => stringify(&out),
        Ok(Ok(_)) => String::new(),
        Ok(Err(err)) => {
            warn!("Helper '{name}' failed: {err}");
            String::new()
        }
        Err(_) => {
            warn!("Helper '{name}' panicked");
            String::new()
        }
    }
}

/// Runs a compiled template once and returns its printed output.
///
/// The template is handed the helper table, the context and the three
/// primitives above; its result goes through [`guard`] before printing.
pub fn run(helpers: &HelperTable, context: &Value, template: &CompiledTemplate) -> String {
    let output = template.call(helpers, context, guard, iter, helper);
    stringify(&guard(output))
}
