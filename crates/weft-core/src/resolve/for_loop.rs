//! Loop tag resolver
//!
//! Expression shape: `FOR <var> IN <dotted.path>`. One sibling node is
//! spliced per collection element, in iteration order, each carrying a
//! child scope with the loop variable and a `loop` metadata record. The
//! loop node itself contributes no output.

use crate::chain::Chain;
use crate::error::{WeftError, WeftResult};
use crate::scope::Scope;
use crate::value::Value;
use indexmap::IndexMap;

/// Resolve a loop tag by splicing one child node per element
///
/// Returns the new child indices in iteration order so the engine can
/// schedule their parses.
pub fn resolve(chain: &mut Chain, node_idx: usize, strict: bool) -> WeftResult<Vec<usize>> {
    let expression = chain.node(node_idx).expression.clone();
    let block = chain.node(node_idx).block.clone();
    let scope = chain.node(node_idx).scope.clone();

    let spec = expression.strip_prefix("FOR").unwrap_or(&expression).trim();
    let Some((var_part, path_part)) = spec.split_once(" IN ") else {
        return Err(WeftError::parse(format!(
            "\"{expression}\" loop expression must contain the IN keyword"
        )));
    };
    let var_name = var_part.trim();
    let path = path_part.trim();

    let Some(collection) = scope.lookup_path(path) else {
        if strict {
            return Err(WeftError::missing_parameter(expression));
        }
        return Ok(Vec::new());
    };

    let elements: Vec<Value> = match collection {
        Value::Array(items) => items,
        Value::Object(map) => map.into_values().collect(),
        // Scalars iterate zero times
        _ => Vec::new(),
    };

    let total = elements.len();
    let mut children = Vec::with_capacity(total);
    let mut anchor = node_idx;
    for (index, element) in elements.into_iter().enumerate() {
        let mut meta = IndexMap::new();
        meta.insert("index".to_string(), Value::Int(index as i64));
        meta.insert("count".to_string(), Value::Int(index as i64 + 1));
        meta.insert("total".to_string(), Value::Int(total as i64));
        meta.insert("first".to_string(), Value::Bool(index == 0));
        meta.insert("last".to_string(), Value::Bool(index + 1 == total));

        let mut vars = IndexMap::new();
        vars.insert(var_name.to_string(), element);
        vars.insert("loop".to_string(), Value::Object(meta));

        let child_scope = Scope::child(scope.clone(), vars);
        let child = chain.push_after(anchor, block.clone(), child_scope);
        children.push(child);
        anchor = child;
    }

    tracing::debug!(node = node_idx, iterations = total, "loop unrolled");
    Ok(children)
}
