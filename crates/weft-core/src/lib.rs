//! Weft core library
//!
//! An asynchronous text-template expansion engine: templates carry tagged
//! expressions (`[% name %]`, `[% IF … %]`, `[% FOR … %]`, `[% INCLUDE … %]`,
//! function calls) that resolve against a parameter scope, filter and
//! callable registries, and a template loader. Compilation builds a chain
//! of output nodes, resolves them — some asynchronously — and concatenates
//! the chain in creation order once every node has settled.

pub mod chain;
pub mod config;
pub mod engine;
pub mod error;
pub mod expr;
pub mod filters;
pub mod functions;
pub mod loader;
pub mod matcher;
pub mod resolve;
pub mod scanner;
pub mod scope;
pub mod value;

// Re-export commonly used types
pub use config::{EngineConfig, SourceEncoding};
pub use engine::{Engine, Rendered};
pub use error::{WeftError, WeftResult};
pub use filters::FilterRegistry;
pub use functions::{
    ContextHandle, FunctionError, FunctionRegistry, TemplateFunction, null_context,
};
pub use loader::{FsLoader, LoadError, MapLoader, TemplateLoader};
pub use scope::Scope;
pub use value::Value;
