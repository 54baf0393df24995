//! Parameter tag resolver
//!
//! Expression shape: `path[|filter]*`. The dotted path resolves against
//! the node's scope; the stringified value is HTML-escaped unless the
//! `raw` marker filter is present, then the remaining filters run left to
//! right.

use crate::error::{WeftError, WeftResult};
use crate::filters::{FilterRegistry, RAW_FILTER};
use crate::scope::Scope;
use crate::value::Value;

/// Resolve a parameter tag to its final output text
pub fn resolve(
    expression: &str,
    scope: &Scope,
    filters: &FilterRegistry,
    strict: bool,
) -> WeftResult<String> {
    let mut parts = expression.split('|');
    let path = parts.next().unwrap_or_default().trim();
    let filter_names: Vec<&str> = parts.map(str::trim).collect();

    let value = match scope.lookup_path(path) {
        Some(value) => value,
        None => {
            if strict {
                return Err(WeftError::missing_parameter(expression));
            }
            return Ok(String::new());
        }
    };

    // Placeholder kinds short-circuit before escaping and filters.
    match &value {
        Value::Null => return Ok(String::new()),
        Value::Function(_) | Value::Object(_) => return Ok(value.render_text()),
        Value::Array(_) => return Ok(value.render_text()),
        _ => {}
    }

    let mut escape = true;
    let mut pipeline = Vec::with_capacity(filter_names.len());
    for name in filter_names {
        let Some(filter) = filters.get(name) else {
            return Err(WeftError::unknown_filter(expression, name));
        };
        if name == RAW_FILTER {
            escape = false;
            continue;
        }
        pipeline.push(filter.clone());
    }

    let mut text = value.render_text();
    if escape {
        text = escape_html(&text);
    }
    for filter in pipeline {
        text = filter(&text);
    }
    Ok(text)
}

/// HTML-escape `<`, `>`, `"` and any `&` that does not already start an entity
pub fn escape_html(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for (pos, ch) in input.char_indices() {
        match ch {
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '&' => {
                if starts_entity(&input[pos + 1..]) {
                    output.push('&');
                } else {
                    output.push_str("&amp;");
                }
            }
            other => output.push(other),
        }
    }
    output
}

// True when the text after an ampersand reads like `\w+;`
fn starts_entity(rest: &str) -> bool {
    let mut seen_word = false;
    for ch in rest.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            seen_word = true;
            continue;
        }
        return seen_word && ch == ';';
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use std::sync::Arc;

    fn scope() -> Arc<Scope> {
        let mut vars = IndexMap::new();
        vars.insert("name".to_string(), Value::from("<b>Al</b>"));
        vars.insert("padded".to_string(), Value::from("  x  "));
        vars.insert("price".to_string(), Value::Int(1234567));
        vars.insert("nothing".to_string(), Value::Null);
        vars.insert("empty".to_string(), Value::Array(vec![]));
        vars.insert("list".to_string(), Value::Array(vec![Value::Int(1)]));
        vars.insert("obj".to_string(), Value::Object(IndexMap::new()));
        vars.insert("cb".to_string(), Value::Function("sample".to_string()));
        Scope::root(vars)
    }

    fn resolve_lenient(expression: &str) -> WeftResult<String> {
        resolve(expression, &scope(), &FilterRegistry::with_builtins(), false)
    }

    #[test]
    fn escapes_by_default() {
        assert_eq!(resolve_lenient("name").unwrap(), "&lt;b&gt;Al&lt;/b&gt;");
    }

    #[test]
    fn raw_disables_escaping() {
        assert_eq!(resolve_lenient("name|raw").unwrap(), "<b>Al</b>");
    }

    #[test]
    fn ampersand_entity_rule() {
        assert_eq!(escape_html("a & b"), "a &amp; b");
        assert_eq!(escape_html("a &amp; b"), "a &amp; b");
        assert_eq!(escape_html("\"q\""), "&quot;q&quot;");
    }

    #[test]
    fn filters_run_after_escaping() {
        assert_eq!(resolve_lenient("padded|trim").unwrap(), "x");
        assert_eq!(resolve_lenient("price|comma").unwrap(), "1,234,567");
    }

    #[test]
    fn unknown_filter_is_fatal() {
        let err = resolve_lenient("name|shout").unwrap_err();
        assert!(matches!(err, WeftError::UnknownFilter { .. }));
    }

    #[test]
    fn placeholder_values() {
        assert_eq!(resolve_lenient("nothing").unwrap(), "");
        assert_eq!(resolve_lenient("empty").unwrap(), "");
        assert_eq!(resolve_lenient("list").unwrap(), "[Array]");
        assert_eq!(resolve_lenient("obj").unwrap(), "[Object]");
        assert_eq!(resolve_lenient("cb").unwrap(), "[Function]");
    }

    #[test]
    fn missing_parameter_modes() {
        let filters = FilterRegistry::with_builtins();
        assert_eq!(
            resolve("missing.path", &scope(), &filters, false).unwrap(),
            ""
        );
        let err = resolve("missing.path", &scope(), &filters, true).unwrap_err();
        assert!(matches!(err, WeftError::MissingParameter(_)));
    }
}
