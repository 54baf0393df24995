//! Node chain
//!
//! The ordered sequence of output-producing units. Nodes live in an arena
//! and link to each other by index; head and tail sentinels bound the
//! sequence. The arena owns the state shared across nodes: the
//! outstanding-node counter and the accumulated warning list. Nodes are
//! never removed — the chain only grows until full resolution, then is
//! walked once.
//!
//! Invariants:
//! - link order equals final output order, set at creation time;
//! - `outstanding` equals the number of nodes not yet fully resolved;
//! - sentinels are never counted and contribute no output.

use crate::scope::Scope;
use crate::value::Value;
use indexmap::IndexMap;
use std::sync::Arc;

/// Index of the head sentinel
pub const HEAD: usize = 0;
/// Index of the tail sentinel
pub const TAIL: usize = 1;

/// One unit of the output-assembly sequence
#[derive(Debug)]
pub struct Node {
    /// Resolved text contributed by this node
    pub output: String,
    /// Remaining unparsed template text owned by this node
    pub template: String,
    /// Variable scope visible to this node
    pub scope: Arc<Scope>,
    /// Extracted tag expression, for tag nodes
    pub expression: String,
    /// Captured block body, for block-tag nodes
    pub block: String,
    next: usize,
    prev: usize,
}

impl Node {
    fn sentinel(scope: Arc<Scope>) -> Self {
        Self {
            output: String::new(),
            template: String::new(),
            scope,
            expression: String::new(),
            block: String::new(),
            next: TAIL,
            prev: HEAD,
        }
    }
}

/// Arena-backed node chain with shared completion state
#[derive(Debug)]
pub struct Chain {
    nodes: Vec<Node>,
    outstanding: usize,
    warnings: Vec<String>,
}

impl Chain {
    /// Create an empty chain holding only the sentinels
    pub fn new() -> Self {
        let empty = Scope::root(IndexMap::<String, Value>::new());
        let mut head = Node::sentinel(empty.clone());
        head.prev = HEAD;
        let mut tail = Node::sentinel(empty);
        tail.next = TAIL;
        Self {
            nodes: vec![head, tail],
            outstanding: 0,
            warnings: Vec::new(),
        }
    }

    /// Splice a new unresolved node immediately after `anchor`
    pub fn push_after(&mut self, anchor: usize, template: String, scope: Arc<Scope>) -> usize {
        self.push_tag_after(anchor, template, String::new(), String::new(), scope)
    }

    /// Splice a new tag node immediately after `anchor`
    pub fn push_tag_after(
        &mut self,
        anchor: usize,
        template: String,
        expression: String,
        block: String,
        scope: Arc<Scope>,
    ) -> usize {
        let idx = self.nodes.len();
        let next = self.nodes[anchor].next;
        self.nodes.push(Node {
            output: String::new(),
            template,
            scope,
            expression,
            block,
            next,
            prev: anchor,
        });
        self.nodes[anchor].next = idx;
        self.nodes[next].prev = idx;
        self.outstanding += 1;
        idx
    }

    /// Borrow a node
    pub fn node(&self, idx: usize) -> &Node {
        &self.nodes[idx]
    }

    /// Mutably borrow a node
    pub fn node_mut(&mut self, idx: usize) -> &mut Node {
        &mut self.nodes[idx]
    }

    /// Mark a node fully resolved
    pub fn close(&mut self, idx: usize) {
        debug_assert!(idx > TAIL, "sentinels are never closed");
        debug_assert!(self.outstanding > 0);
        self.outstanding -= 1;
        tracing::trace!(node = idx, outstanding = self.outstanding, "node closed");
    }

    /// Number of nodes not yet fully resolved
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Record a non-fatal warning
    pub fn warn(&mut self, message: String) {
        tracing::warn!(warning = %message, "template warning");
        self.warnings.push(message);
    }

    /// Take the accumulated warnings, in recording order
    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    /// Concatenate node outputs in link order, sentinels excluded
    pub fn assemble(&self) -> String {
        let mut output = String::new();
        let mut idx = self.nodes[HEAD].next;
        while idx != TAIL {
            output.push_str(&self.nodes[idx].output);
            idx = self.nodes[idx].next;
        }
        output
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> Arc<Scope> {
        Scope::root(IndexMap::new())
    }

    #[test]
    fn splice_preserves_link_order() {
        let mut chain = Chain::new();
        let a = chain.push_after(HEAD, String::new(), scope());
        let c = chain.push_after(a, String::new(), scope());
        // splicing after `a` lands between a and c
        let b = chain.push_after(a, String::new(), scope());

        chain.node_mut(a).output = "a".to_string();
        chain.node_mut(b).output = "b".to_string();
        chain.node_mut(c).output = "c".to_string();
        assert_eq!(chain.assemble(), "abc");
    }

    #[test]
    fn outstanding_counts_open_nodes() {
        let mut chain = Chain::new();
        let a = chain.push_after(HEAD, String::new(), scope());
        let b = chain.push_after(a, String::new(), scope());
        assert_eq!(chain.outstanding(), 2);
        chain.close(b);
        chain.close(a);
        assert_eq!(chain.outstanding(), 0);
    }

    #[test]
    fn warnings_keep_recording_order() {
        let mut chain = Chain::new();
        chain.warn("first".to_string());
        chain.warn("second".to_string());
        assert_eq!(chain.take_warnings(), vec!["first", "second"]);
    }

    #[test]
    fn empty_chain_assembles_empty() {
        assert_eq!(Chain::new().assemble(), "");
    }
}
