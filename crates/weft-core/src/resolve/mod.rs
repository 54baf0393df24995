//! Tag resolvers
//!
//! One resolver per tag kind. Each consumes the tag expression (and block
//! body, for block tags) and produces a [`Resolution`] telling the engine
//! what the tag node becomes: final text, more template to parse, or
//! nothing because child nodes were spliced instead.

pub mod cond;
pub mod for_loop;
pub mod func;
pub mod include;
pub mod param;

use crate::config::EngineConfig;
use crate::scope::Scope;

/// The tag kinds the engine knows how to resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// `INCLUDE file` — line tag
    Include,
    /// `IF expr … ELSE … /IF` — block tag
    If,
    /// `FOR var IN path … /FOR` — block tag
    For,
    /// `name(args…)` — callable invocation
    Func,
    /// `path|filter…` — parameter reference
    Param,
}

impl TagKind {
    /// Classify a trimmed tag expression by its leading keyword
    pub fn classify(expression: &str) -> TagKind {
        if expression.starts_with("INCLUDE ") {
            TagKind::Include
        } else if expression.starts_with("IF ") {
            TagKind::If
        } else if expression.starts_with("FOR ") {
            TagKind::For
        } else if expression.contains('(') {
            TagKind::Func
        } else {
            TagKind::Param
        }
    }

    /// The block keyword, for block-type kinds only
    pub fn block_keyword(&self) -> Option<&'static str> {
        match self {
            TagKind::If => Some("IF"),
            TagKind::For => Some("FOR"),
            _ => None,
        }
    }
}

/// What a resolver turned its tag node into
#[derive(Debug)]
pub enum Resolution {
    /// Final output text for the node
    Output(String),
    /// Replacement template text that still needs parsing
    Template(String),
    /// Node contributes nothing; any children were already spliced
    Done,
}

/// Resolve embedded `${path}` interpolation markers inside a tag expression
///
/// Scanned right to left so the innermost marker of a nested pair is
/// substituted first; the loop repeats until no marker remains, which lets
/// tag expressions be built from parameter values. A missing path becomes
/// the literal `null`. An unterminated marker is left as-is.
pub fn preprocess_expression(expression: &str, scope: &Scope, config: &EngineConfig) -> String {
    let mut expression = expression.to_string();
    while let Some(open) = expression.rfind(&config.interp_open) {
        let span_start = open + config.interp_open.len();
        let Some(close_rel) = expression[span_start..].find(&config.interp_close) else {
            break;
        };
        let close = span_start + close_rel;
        let path = expression[span_start..close].trim();
        let text = scope
            .lookup_path(path)
            .map(|value| value.interp_text())
            .unwrap_or_else(|| "null".to_string());
        expression = format!(
            "{}{}{}",
            &expression[..open],
            text,
            &expression[close + config.interp_close.len()..]
        );
    }
    expression
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use indexmap::IndexMap;
    use std::sync::Arc;

    fn scope() -> Arc<Scope> {
        let mut vars = IndexMap::new();
        vars.insert("limit".to_string(), Value::Int(5));
        vars.insert("key".to_string(), Value::from("limit"));
        let mut user = IndexMap::new();
        user.insert("name".to_string(), Value::from("Al"));
        vars.insert("user".to_string(), Value::Object(user));
        Scope::root(vars)
    }

    #[test]
    fn classify_by_keyword() {
        assert_eq!(TagKind::classify("INCLUDE head.tpl"), TagKind::Include);
        assert_eq!(TagKind::classify("IF flag"), TagKind::If);
        assert_eq!(TagKind::classify("FOR x IN items"), TagKind::For);
        assert_eq!(TagKind::classify("sample('a')"), TagKind::Func);
        assert_eq!(TagKind::classify("user.name|trim"), TagKind::Param);
        // keyword must be a prefix word, not a substring
        assert_eq!(TagKind::classify("IFFY"), TagKind::Param);
        assert_eq!(TagKind::classify("FORMAT"), TagKind::Param);
    }

    #[test]
    fn interpolation_substitutes_paths() {
        let config = EngineConfig::default();
        let s = scope();
        assert_eq!(
            preprocess_expression("count > ${limit}", &s, &config),
            "count > 5"
        );
        assert_eq!(
            preprocess_expression("${user.name}", &s, &config),
            "Al"
        );
    }

    #[test]
    fn missing_path_becomes_null() {
        let config = EngineConfig::default();
        assert_eq!(
            preprocess_expression("${missing}", &scope(), &config),
            "null"
        );
    }

    #[test]
    fn nested_markers_resolve_inner_first() {
        let config = EngineConfig::default();
        // ${${key}} -> ${limit} -> 5
        assert_eq!(preprocess_expression("${${key}}", &scope(), &config), "5");
    }

    #[test]
    fn unterminated_marker_is_left_alone() {
        let config = EngineConfig::default();
        assert_eq!(
            preprocess_expression("${limit", &scope(), &config),
            "${limit"
        );
    }
}
