//! Function-call tag resolver
//!
//! Expression shape: `name(args…)`. The name must be a registered callable;
//! arguments are expressions evaluated against the node's scope, split on
//! top-level commas. Invocation is asynchronous and runs as a deferred job
//! while sibling nodes keep parsing.

use crate::error::{WeftError, WeftResult};
use crate::expr;
use crate::functions::{ContextHandle, FunctionRegistry, TemplateFunction};
use crate::resolve::Resolution;
use crate::scope::Scope;
use futures::future::BoxFuture;
use std::sync::Arc;

/// Parse the call expression and evaluate its arguments
///
/// Failures here (unknown function, bad syntax, unknown identifier in an
/// argument) follow the strict/lenient policy, which the engine applies to
/// the returned message.
pub fn prepare(
    expression: &str,
    scope: &Scope,
    functions: &FunctionRegistry,
) -> Result<(Arc<dyn TemplateFunction>, Vec<crate::value::Value>), String> {
    let Some(open) = expression.find('(') else {
        return Err("missing '(' in call expression".to_string());
    };
    if !expression.ends_with(')') {
        return Err("missing ')' in call expression".to_string());
    }
    let name = expression[..open].trim();
    let args_text = &expression[open + 1..expression.len() - 1];

    let Some(function) = functions.get(name) else {
        return Err(format!("function \"{name}\" is not registered"));
    };

    let mut args = Vec::new();
    for arg in split_args(args_text) {
        let value = expr::evaluate(&arg, scope).map_err(|e| e.to_string())?;
        args.push(value);
    }

    Ok((function.clone(), args))
}

/// Build the deferred invocation job for a prepared call
///
/// A callable-reported error is fatal regardless of strict mode.
pub fn job(
    expression: String,
    function: Arc<dyn TemplateFunction>,
    cx: ContextHandle,
    args: Vec<crate::value::Value>,
) -> BoxFuture<'static, WeftResult<Resolution>> {
    Box::pin(async move {
        match function.call(&cx, &args).await {
            Ok(text) => Ok(Resolution::Output(text)),
            Err(error) => Err(WeftError::function(expression, error.to_string())),
        }
    })
}

/// Split an argument list on top-level commas, respecting quotes and brackets
fn split_args(input: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for ch in input.chars() {
        if let Some(q) = quote {
            current.push(ch);
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' => {
                quote = Some(ch);
                current.push(ch);
            }
            '(' | '[' => {
                depth += 1;
                current.push(ch);
            }
            ')' | ']' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if depth == 0 => {
                args.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    if !current.trim().is_empty() {
        args.push(current.trim().to_string());
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use indexmap::IndexMap;
    use std::sync::Arc;

    fn scope() -> Arc<crate::scope::Scope> {
        let mut vars = IndexMap::new();
        vars.insert("name".to_string(), Value::from("Al"));
        vars.insert("count".to_string(), Value::Int(2));
        Scope::root(vars)
    }

    #[test]
    fn split_args_respects_quotes_and_brackets() {
        assert_eq!(split_args("1, 'a,b', x"), vec!["1", "'a,b'", "x"]);
        assert_eq!(split_args(""), Vec::<String>::new());
        assert_eq!(split_args("(1, 2), 3"), vec!["(1, 2)", "3"]);
    }

    #[test]
    fn prepare_evaluates_arguments() {
        let registry = FunctionRegistry::with_builtins();
        let (function, args) =
            prepare("sample(name, count + 1)", &scope(), &registry).unwrap();
        assert_eq!(function.name(), "sample");
        assert_eq!(args, vec![Value::from("Al"), Value::Int(3)]);
    }

    #[test]
    fn prepare_rejects_unknown_function() {
        let registry = FunctionRegistry::with_builtins();
        let err = prepare("nope(1)", &scope(), &registry).unwrap_err();
        assert!(err.contains("not registered"));
    }

    #[test]
    fn prepare_rejects_unknown_identifier() {
        let registry = FunctionRegistry::with_builtins();
        let err = prepare("sample(missing)", &scope(), &registry).unwrap_err();
        assert!(err.contains("unknown identifier"));
    }

    #[tokio::test]
    async fn job_reports_callable_errors_as_fatal() {
        use crate::functions::{FunctionError, null_context};
        use async_trait::async_trait;

        struct Failing;
        #[async_trait]
        impl TemplateFunction for Failing {
            fn name(&self) -> &str {
                "failing"
            }
            async fn call(
                &self,
                _cx: &ContextHandle,
                _args: &[Value],
            ) -> Result<String, FunctionError> {
                Err(FunctionError::ExecutionFailed("boom".to_string()))
            }
        }

        let outcome = job(
            "failing()".to_string(),
            Arc::new(Failing),
            null_context(),
            vec![],
        )
        .await;
        assert!(matches!(outcome, Err(WeftError::Function { .. })));
    }
}
