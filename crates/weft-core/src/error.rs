//! Error types for the weft template engine

use thiserror::Error;

/// Result type alias for weft operations
pub type WeftResult<T> = Result<T, WeftError>;

/// Main error type for template compilation
///
/// Every variant is fatal: the first one raised latches the compile
/// operation and no result text is produced. Lenient-mode conditions that
/// are merely recorded as warnings never appear here.
#[derive(Error, Debug, Clone)]
pub enum WeftError {
    /// Top-level template could not be loaded
    #[error("Template error: {0}")]
    Template(String),

    /// Malformed template text (unclosed tag, unmatched block, exceeded scan budget)
    #[error("Parse error: {0}")]
    Parse(String),

    /// A parameter tag named a filter that is not registered
    #[error("Filter error: \"{expression}\" filter \"{filter}\" is not registered")]
    UnknownFilter { expression: String, filter: String },

    /// Strict mode: a parameter path did not resolve
    #[error("Parameter error: \"{0}\" does not exist")]
    MissingParameter(String),

    /// Strict mode: a tag expression failed to evaluate
    #[error("Evaluation error: \"{expression}\" {message}")]
    Eval { expression: String, message: String },

    /// A callable extension reported an error (fatal regardless of mode)
    #[error("Function error: \"{expression}\" {message}")]
    Function { expression: String, message: String },

    /// An included file could not be read
    #[error("Include error: \"{expression}\" cannot be read (template_dir={dir})")]
    Include { expression: String, dir: String },

    /// Engine configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl WeftError {
    /// Create a new template error
    pub fn template(message: impl Into<String>) -> Self {
        Self::Template(message.into())
    }

    /// Create a new parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new unknown-filter error
    pub fn unknown_filter(expression: impl Into<String>, filter: impl Into<String>) -> Self {
        Self::UnknownFilter {
            expression: expression.into(),
            filter: filter.into(),
        }
    }

    /// Create a new missing-parameter error
    pub fn missing_parameter(expression: impl Into<String>) -> Self {
        Self::MissingParameter(expression.into())
    }

    /// Create a new evaluation error
    pub fn eval(expression: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Eval {
            expression: expression.into(),
            message: message.into(),
        }
    }

    /// Create a new function error
    pub fn function(expression: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Function {
            expression: expression.into(),
            message: message.into(),
        }
    }

    /// Create a new include error
    pub fn include(expression: impl Into<String>, dir: impl Into<String>) -> Self {
        Self::Include {
            expression: expression.into(),
            dir: dir.into(),
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
