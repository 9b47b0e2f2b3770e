//! Ball-tree nodes and the append-only per-process node sink (spec §3, §4.9,
//! §9).
//!
//! Ids are assigned positionally from recursion structure, never from a
//! shared counter: a node with id `v` whose subtree holds `m` points gives
//! its left child `v + 1` and its right child `v + 2 * ceil(m/2)`. This is
//! what lets every rank and every task append nodes without any
//! coordination beyond the one lock protecting the sink itself (spec §5).
//! The sink is a plain `Vec` behind a `Mutex` rather than a singly-linked
//! list — the list is a design choice, not a requirement, and a `Vec`
//! gives the same append + in-order-traversal contract with none of the
//! pointer-chasing.

use std::sync::Mutex;

pub const NONE: i64 = -1;

/// One ball-tree node.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: i64,
    pub left_id: i64,
    pub right_id: i64,
    pub center: Vec<f64>,
    pub radius: f64,
}

impl Node {
    pub fn leaf(id: i64, center: Vec<f64>) -> Self {
        Node {
            id,
            left_id: NONE,
            right_id: NONE,
            center,
            radius: 0.0,
        }
    }

    pub fn internal(id: i64, left_id: i64, right_id: i64, center: Vec<f64>, radius: f64) -> Self {
        Node {
            id,
            left_id,
            right_id,
            center,
            radius,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left_id == NONE && self.right_id == NONE
    }
}

/// Append-only collection of completed tree nodes, local to one process.
/// The lock is held only for the duration of a single push.
#[derive(Default)]
pub struct NodeSink {
    nodes: Mutex<Vec<Node>>,
}

impl NodeSink {
    pub fn new() -> Self {
        NodeSink {
            nodes: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, node: Node) {
        self.nodes.lock().expect("node sink mutex poisoned").push(node);
    }

    /// Drains the sink, returning nodes in the order they were appended.
    pub fn into_vec(self) -> Vec<Node> {
        self.nodes.into_inner().expect("node sink mutex poisoned")
    }

    pub fn len(&self) -> usize {
        self.nodes.lock().expect("node sink mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_has_no_children() {
        let n = Node::leaf(3, vec![1.0, 2.0]);
        assert!(n.is_leaf());
        assert_eq!(n.radius, 0.0);
    }

    #[test]
    fn sink_preserves_append_order_under_concurrent_push() {
        let sink = NodeSink::new();
        rayon::scope(|s| {
            for i in 0..8 {
                let sink = &sink;
                s.spawn(move |_| sink.push(Node::leaf(i, vec![i as f64])));
            }
        });
        assert_eq!(sink.len(), 8);
    }
}
