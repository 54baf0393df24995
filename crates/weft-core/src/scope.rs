//! Parameter scopes
//!
//! A scope holds its own bindings plus an optional reference to a parent
//! scope; lookups fall back upward, writes never touch the parent. Loop
//! bodies get a child scope carrying the loop variable and metadata so the
//! enclosing parameters stay visible but shadowed names win locally.

use crate::value::Value;
use indexmap::IndexMap;
use std::sync::Arc;

/// A variable scope visible to one chain node
#[derive(Debug)]
pub struct Scope {
    vars: IndexMap<String, Value>,
    parent: Option<Arc<Scope>>,
}

impl Scope {
    /// Create a root scope from a parameter mapping
    pub fn root(vars: IndexMap<String, Value>) -> Arc<Self> {
        Arc::new(Self { vars, parent: None })
    }

    /// Create a child scope overlaying `vars` on top of `parent`
    pub fn child(parent: Arc<Scope>, vars: IndexMap<String, Value>) -> Arc<Self> {
        Arc::new(Self {
            vars,
            parent: Some(parent),
        })
    }

    /// Look up a single name, walking up the parent chain
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars
            .get(name)
            .or_else(|| self.parent.as_ref().and_then(|p| p.get(name)))
    }

    /// Resolve a dotted path like `user.address.city`
    ///
    /// The first segment resolves through the scope chain; the rest walk
    /// object fields and numeric array indices. Any missing segment yields
    /// `None` — strictness policy belongs to the caller.
    pub fn lookup_path(&self, path: &str) -> Option<Value> {
        let mut segments = path.split('.').map(str::trim);
        let first = segments.next()?;
        if first.is_empty() {
            return None;
        }
        let mut current = self.get(first)?.clone();
        for segment in segments {
            current = match current {
                Value::Object(ref map) => map.get(segment)?.clone(),
                Value::Array(ref items) => {
                    let index: usize = segment.parse().ok()?;
                    items.get(index)?.clone()
                }
                _ => return None,
            };
        }
        Some(current)
    }
}
