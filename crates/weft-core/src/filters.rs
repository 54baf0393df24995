//! Filter registry
//!
//! Filters are named post-processing transforms applied to a parameter
//! tag's stringified value, left to right after HTML escaping. The `raw`
//! name is special: it is registered like any other filter but its
//! presence disables escaping.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

/// A registered filter body; input is always a string
pub type FilterFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Name of the escape-disabling marker filter
pub const RAW_FILTER: &str = "raw";

/// Registry of named filters
#[derive(Clone)]
pub struct FilterRegistry {
    filters: HashMap<String, FilterFn>,
}

impl FilterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            filters: HashMap::new(),
        }
    }

    /// Create a registry holding the built-in filters
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(RAW_FILTER, |value| value.to_string());
        registry.register("trim", |value| value.trim().to_string());
        registry.register("nl2br", |value| value.replace('\n', "<br />"));
        registry.register("nl2li", |value| {
            format!("<li>{}</li>", value.replace('\n', "</li><li>"))
        });
        registry.register("comma", comma);
        registry
    }

    /// Register a filter
    pub fn register<F>(&mut self, name: &str, filter: F)
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.filters.insert(name.to_string(), Arc::new(filter));
    }

    /// Get a filter by name
    pub fn get(&self, name: &str) -> Option<&FilterFn> {
        self.filters.get(name)
    }

    /// Check if a filter is registered
    pub fn has(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    /// Get all registered filter names
    pub fn names(&self) -> Vec<String> {
        self.filters.keys().cloned().collect()
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

lazy_static! {
    static ref COMMA_RE: Regex = Regex::new(r"^(-?\d+)(\d{3})").expect("valid comma regex");
}

/// Thousands separator over the leading digit run, negative-aware
fn comma(value: &str) -> String {
    let mut current = value.to_string();
    loop {
        let next = COMMA_RE.replace(&current, "$1,$2").into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}
