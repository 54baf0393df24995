//! Runtime parameter values
//!
//! The engine works on its own value type rather than raw JSON so that
//! object key order is preserved and function-typed parameters have a
//! representation. Conversion from `serde_json::Value` is lossless for
//! everything JSON can express.

use indexmap::IndexMap;

/// Placeholder emitted for function-typed parameter values
pub const FUNCTION_PLACEHOLDER: &str = "[Function]";
/// Placeholder emitted for non-empty array parameter values
pub const ARRAY_PLACEHOLDER: &str = "[Array]";
/// Placeholder emitted for object parameter values
pub const OBJECT_PLACEHOLDER: &str = "[Object]";

/// A parameter value visible to template tags
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Object(IndexMap<String, Value>),
    /// Reference to a registered callable, by name
    Function(String),
}

impl Value {
    /// Convert a JSON document into a template value
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Short type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) | Value::Float(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
        }
    }

    /// Truthiness for conditional evaluation
    ///
    /// `null`, `false`, `0` and `""` are falsy; arrays and objects are
    /// always truthy, even when empty.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) | Value::Function(_) => true,
        }
    }

    /// Stringification used by parameter tags
    ///
    /// Compound and function values collapse to fixed placeholder tokens;
    /// `null` and empty arrays collapse to empty text. Values are never
    /// auto-joined.
    pub fn render_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Function(_) => FUNCTION_PLACEHOLDER.to_string(),
            Value::Object(_) => OBJECT_PLACEHOLDER.to_string(),
            Value::Array(items) => {
                if items.is_empty() {
                    String::new()
                } else {
                    ARRAY_PLACEHOLDER.to_string()
                }
            }
            scalar => scalar.interp_text(),
        }
    }

    /// Stringification used by nested interpolation and concatenation
    ///
    /// Unlike [`Value::render_text`], `null` spells itself out so that a
    /// missing path inside a tag expression stays visible.
    pub fn interp_text(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::String(s) => s.clone(),
            Value::Array(_) => ARRAY_PLACEHOLDER.to_string(),
            Value::Object(_) => OBJECT_PLACEHOLDER.to_string(),
            Value::Function(_) => FUNCTION_PLACEHOLDER.to_string(),
        }
    }

    /// Numeric view of the value, if it has one
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Loose equality: numbers compare numerically across Int/Float,
    /// everything else compares structurally within its own kind.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self.as_number(), other.as_number()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }
}

fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
