//! Callable extension registry
//!
//! Template functions are named callables invocable from function-call
//! tags. Each receives the opaque context handle the caller supplied to
//! `compile` plus the evaluated argument list, and must resolve exactly
//! once — in Rust terms, by returning from its async body. A returned
//! error is fatal for the whole compile regardless of strict mode.

use crate::value::Value;
use async_trait::async_trait;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Opaque context handle passed through to callable extensions
pub type ContextHandle = Arc<dyn Any + Send + Sync>;

/// A context handle carrying nothing
pub fn null_context() -> ContextHandle {
    Arc::new(())
}

/// Error type reported by callable extensions
#[derive(Debug, Error)]
pub enum FunctionError {
    /// Arguments did not match what the callable expects
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// The callable started but could not produce a result
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
}

/// Base trait for callable extensions
#[async_trait]
pub trait TemplateFunction: Send + Sync {
    /// Unique name the template refers to this callable by
    fn name(&self) -> &str;

    /// Invoke the callable with the evaluated tag arguments
    async fn call(&self, cx: &ContextHandle, args: &[Value]) -> Result<String, FunctionError>;
}

impl std::fmt::Debug for dyn TemplateFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateFunction")
            .field("name", &self.name())
            .finish()
    }
}

/// Registry of callable extensions
#[derive(Clone)]
pub struct FunctionRegistry {
    functions: HashMap<String, Arc<dyn TemplateFunction>>,
}

impl FunctionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// Create a registry holding the built-in functions
    ///
    /// Engine builtins are always present; caller registrations are merged
    /// on top and may shadow them.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(SampleFunction));
        registry
    }

    /// Register a callable
    pub fn register(&mut self, function: Arc<dyn TemplateFunction>) {
        let name = function.name().to_string();
        self.functions.insert(name, function);
    }

    /// Get a callable by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn TemplateFunction>> {
        self.functions.get(name)
    }

    /// Check if a callable is registered
    pub fn has(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Get all registered callable names
    pub fn names(&self) -> Vec<String> {
        self.functions.keys().cloned().collect()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Built-in `sample` function: echoes its first argument twice
struct SampleFunction;

#[async_trait]
impl TemplateFunction for SampleFunction {
    fn name(&self) -> &str {
        "sample"
    }

    async fn call(&self, _cx: &ContextHandle, args: &[Value]) -> Result<String, FunctionError> {
        let text = args.first().map(Value::interp_text).unwrap_or_default();
        Ok(format!("{text}{text}"))
    }
}
