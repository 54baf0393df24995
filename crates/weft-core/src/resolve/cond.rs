//! Conditional tag resolver
//!
//! The block body splits at its same-level `ELSE` marker; the expression
//! after the `IF` keyword evaluates to a boolean against the node's scope
//! and selects which branch gets queued for parsing.

use crate::config::EngineConfig;
use crate::error::{WeftError, WeftResult};
use crate::expr;
use crate::matcher;
use crate::scope::Scope;

/// Outcome of resolving a conditional tag
#[derive(Debug)]
pub struct Outcome {
    /// The chosen branch, to be parsed as the node's template
    pub template: String,
    /// Lenient-mode evaluation failure, if one occurred
    pub warning: Option<String>,
}

/// Resolve a conditional tag to its chosen branch
pub fn resolve(
    expression: &str,
    block: &str,
    scope: &Scope,
    strict: bool,
    config: &EngineConfig,
) -> WeftResult<Outcome> {
    let (true_branch, false_branch) = matcher::split_else(block, config)?;
    let condition = expression.strip_prefix("IF").unwrap_or(expression).trim();

    match expr::evaluate(condition, scope) {
        Ok(value) => Ok(Outcome {
            template: if value.is_truthy() {
                true_branch
            } else {
                false_branch
            },
            warning: None,
        }),
        Err(error) => {
            if strict {
                return Err(WeftError::eval(expression, error.to_string()));
            }
            Ok(Outcome {
                template: false_branch,
                warning: Some(format!("\"{expression}\" {error}")),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use indexmap::IndexMap;
    use std::sync::Arc;

    fn scope(flag: bool) -> Arc<Scope> {
        let mut vars = IndexMap::new();
        vars.insert("flag".to_string(), Value::Bool(flag));
        Scope::root(vars)
    }

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    #[test]
    fn picks_true_branch() {
        let outcome = resolve("IF flag", "Y[% ELSE %]N", &scope(true), false, &config()).unwrap();
        assert_eq!(outcome.template, "Y");
        assert!(outcome.warning.is_none());
    }

    #[test]
    fn picks_false_branch() {
        let outcome = resolve("IF flag", "Y[% ELSE %]N", &scope(false), false, &config()).unwrap();
        assert_eq!(outcome.template, "N");
    }

    #[test]
    fn missing_else_means_empty_false_branch() {
        let outcome = resolve("IF flag", "only", &scope(false), false, &config()).unwrap();
        assert_eq!(outcome.template, "");
    }

    #[test]
    fn lenient_failure_warns_and_picks_false() {
        let outcome = resolve("IF missing", "Y[% ELSE %]N", &scope(true), false, &config()).unwrap();
        assert_eq!(outcome.template, "N");
        let warning = outcome.warning.expect("warning recorded");
        assert!(warning.contains("IF missing"));
    }

    #[test]
    fn strict_failure_is_fatal() {
        let err = resolve("IF missing", "Y", &scope(true), true, &config()).unwrap_err();
        assert!(matches!(err, WeftError::Eval { .. }));
    }
}
