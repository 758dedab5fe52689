use crate::helpers::HelperError;
use crate::value::{is_truthy, stringify};
use serde_json::Value;

/// Characters replaced by [`escape_html`] and their entities.
pub const ESCAPE_CHAR_MAP: &[(char, &str)] = &[
    ('&', "&amp;"),
    ('<', "&lt;"),
    ('>', "&gt;"),
    ('"', "&quot;"),
    ('\'', "&#x27;"),
    ('`', "&#x60;"),
    ('=', "&#x3D;"),
];

/// Replaces HTML-significant characters with their entities.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ESCAPE_CHAR_MAP.iter().find(|(special, _)| *special == ch) {
            Some((_, entity)) => out.push_str(entity),
            None => out.push(ch),
        }
    }
    out
}

/// The `__escape` helper every runtime starts with.
///
/// Escapes its first argument. A missing or `null` argument prints nothing,
/// other falsy values (`0`, `false`) print as themselves.
pub fn escape_helper(_this: &Value, args: &[Value]) -> Result<Value, HelperError> {
    let escaped = match args.first() {
        None | Some(Value::Null) => String::new(),
        Some(value) if !is_truthy(value) => stringify(value),
        Some(value) => escape_html(&stringify(value)),
    };
    Ok(Value::String(escaped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_escape_html_uses_every_map_entry() {
        for (special, entity) in ESCAPE_CHAR_MAP {
            assert_eq!(escape_html(&format!("a{special}b")), format!("a{entity}b"));
        }
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_escape_html_full_map() {
        assert_eq!(
            escape_html("<a>&\"'`="),
            "&lt;a&gt;&amp;&quot;&#x27;&#x60;&#x3D;"
        );
    }

    #[test]
    fn test_escape_html_matches_char_map() {
        for (ch, entity) in ESCAPE_CHAR_MAP {
            assert_eq!(escape_html(&ch.to_string()), *entity);
        }
    }

    #[test]
    fn test_escape_html_leaves_plain_text() {
        assert_eq!(escape_html("plain text ✓"), "plain text ✓");
    }

    #[test]
    fn test_escape_helper_nullish() {
        assert_eq!(escape_helper(&json!({}), &[]).unwrap(), json!(""));
        assert_eq!(escape_helper(&json!({}), &[json!(null)]).unwrap(), json!(""));
    }

    #[test]
    fn test_escape_helper_falsy_values_print_as_is() {
        assert_eq!(escape_helper(&json!({}), &[json!(0)]).unwrap(), json!("0"));
        assert_eq!(escape_helper(&json!({}), &[json!(false)]).unwrap(), json!("false"));
        assert_eq!(escape_helper(&json!({}), &[json!("")]).unwrap(), json!(""));
    }

    #[test]
    fn test_escape_helper_stringifies_non_strings() {
        assert_eq!(escape_helper(&json!({}), &[json!(42)]).unwrap(), json!("42"));
        assert_eq!(
            escape_helper(&json!({}), &[json!(["<", ">"])]).unwrap(),
            json!("&lt;,&gt;")
        );
    }
}
