//! Arena-backed binary tree.
//!
//! Nodes own their children through the arena; the `parent` link is a plain
//! index kept for navigation only and never decides what is reachable.

use std::io::{self, Write};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Clone, Debug)]
pub struct Node<T> {
    pub parent: Option<NodeId>,
    pub left: Option<NodeId>,
    pub right: Option<NodeId>,
    pub value: T,
}

#[derive(Clone, Debug)]
pub struct Tree<T> {
    nodes: Vec<Node<T>>,
    head: Option<NodeId>,
}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Self {
            nodes: vec![],
            head: None,
        }
    }
}

impl<T> Tree<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a node and points the children's parent links at it.
    pub fn make_node(&mut self, left: Option<NodeId>, right: Option<NodeId>, value: T) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            left,
            right,
            value,
        });
        for child in [left, right].into_iter().flatten() {
            self.nodes[child.0].parent = Some(id);
        }
        id
    }

    pub fn make_leaf(&mut self, value: T) -> NodeId {
        self.make_node(None, None, value)
    }

    pub fn set_left(&mut self, node: NodeId, child: Option<NodeId>) {
        self.nodes[node.0].left = child;
        if let Some(child) = child {
            self.nodes[child.0].parent = Some(node);
        }
    }

    pub fn set_right(&mut self, node: NodeId, child: Option<NodeId>) {
        self.nodes[node.0].right = child;
        if let Some(child) = child {
            self.nodes[child.0].parent = Some(node);
        }
    }

    pub fn clear_parent(&mut self, node: NodeId) {
        self.nodes[node.0].parent = None;
    }

    pub fn node(&self, id: NodeId) -> &Node<T> {
        &self.nodes[id.0]
    }

    #[cfg(test)]
    pub fn left(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].left
    }

    #[cfg(test)]
    pub fn right(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].right
    }

    #[cfg(test)]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn set_head(&mut self, head: NodeId) {
        self.nodes[head.0].parent = None;
        self.head = Some(head);
    }

    pub fn head(&self) -> Option<NodeId> {
        self.head
    }

    /// Pre-order walk from the head, left before right.
    pub fn walk(&self, mut visit: impl FnMut(NodeId, &Node<T>)) {
        let mut stack: Vec<NodeId> = self.head.into_iter().collect();
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            visit(id, node);
            stack.extend(node.right);
            stack.extend(node.left);
        }
    }

    /// Writes the reachable part of the tree as a Graphviz digraph.
    pub fn dump_dot<W, F>(&self, out: &mut W, mut label: F) -> io::Result<()>
    where
        W: Write,
        F: FnMut(&T) -> String,
    {
        writeln!(out, "digraph tree {{")?;
        writeln!(out, "    node [shape=record];")?;

        let mut edges = vec![];
        let mut result = Ok(());
        self.walk(|id, node| {
            if result.is_err() {
                return;
            }
            result = writeln!(
                out,
                "    node{} [label=\"{}\"];",
                id.0,
                escape_label(&label(&node.value))
            );
            if let Some(left) = node.left {
                edges.push((id, left, 'L'));
            }
            if let Some(right) = node.right {
                edges.push((id, right, 'R'));
            }
        });
        result?;

        for (from, to, side) in edges {
            writeln!(out, "    node{} -> node{} [label=\"{side}\"];", from.0, to.0)?;
        }
        writeln!(out, "}}")
    }
}

fn escape_label(label: &str) -> String {
    label.replace('"', "\\\"")
}
