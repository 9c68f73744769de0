use std::collections::HashMap;
use std::ops::{Index, IndexMut};

use failure::Error;
use petgraph::prelude::{Direction, EdgeRef, NodeIndex, StableGraph};

use crate::Node;

/// `Tree`
///
/// `Tree`s represent constituency trees and consist of `Node`s. The nodes are either
/// `Terminal`s or `NonTerminal`s. Nodes are stored in a graph, a node's parent is the
/// source of its single incoming edge. Edge weights hold the position of the child
/// among its siblings.
#[derive(Debug, Clone)]
pub struct Tree {
    graph: StableGraph<Node, usize>,
    root: NodeIndex,
}

impl Tree {
    /// Construct a tree consisting of `root`.
    pub fn new(root: Node) -> Self {
        let mut graph = StableGraph::new();
        let root = graph.add_node(root);
        Tree { graph, root }
    }

    pub(crate) fn from_graph(graph: StableGraph<Node, usize>, root: NodeIndex) -> Self {
        Tree { graph, root }
    }

    /// Get the index of the root of the tree.
    pub fn root(&self) -> NodeIndex {
        self.root
    }

    /// Returns whether `node` is the root.
    pub fn is_root(&self, node: NodeIndex) -> bool {
        self.root == node
    }

    /// Get the number of terminals in the tree.
    pub fn n_terminals(&self) -> usize {
        self.terminals().count()
    }

    /// Iterate over the nodes dominated by `node` in preorder, starting with `node`.
    pub fn preorder(&self, node: NodeIndex) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: vec![node],
        }
    }

    /// Get an iterator over the terminals from left to right.
    pub fn terminals<'a>(&'a self) -> impl Iterator<Item = NodeIndex> + 'a {
        self.preorder(self.root)
            .filter(move |&idx| self.graph[idx].is_terminal())
    }

    /// Get an iterator over the nonterminals in preorder.
    pub fn nonterminals<'a>(&'a self) -> impl Iterator<Item = NodeIndex> + 'a {
        self.preorder(self.root)
            .filter(move |&idx| !self.graph[idx].is_terminal())
    }

    /// Get the terminals dominated by `node` from left to right.
    ///
    /// A terminal dominates only itself.
    pub fn descendent_terminals<'a>(
        &'a self,
        node: NodeIndex,
    ) -> impl Iterator<Item = NodeIndex> + 'a {
        self.preorder(node)
            .filter(move |&idx| self.graph[idx].is_terminal())
    }

    /// Get the parent of a tree node.
    ///
    /// Returns `None` for the root or if `node` doesn't exist.
    pub fn parent(&self, node: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(node, Direction::Incoming)
            .next()
    }

    /// Get `node`'s children from left to right.
    pub fn children(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut children = self
            .graph
            .edges_directed(node, Direction::Outgoing)
            .map(|edge_ref| (*edge_ref.weight(), edge_ref.target()))
            .collect::<Vec<_>>();
        children.sort_by_key(|&(position, _)| position);
        children.into_iter().map(|(_, child)| child).collect()
    }

    /// Get an iterator over `node`'s siblings.
    pub fn siblings(&self, node: NodeIndex) -> Vec<NodeIndex> {
        match self.parent(node) {
            Some(parent) => self
                .children(parent)
                .into_iter()
                .filter(|&sibling| sibling != node)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Get an immutable reference to the underlying `StableGraph`.
    pub fn graph(&self) -> &StableGraph<Node, usize> {
        &self.graph
    }

    /// Append `node` as last child of `parent`.
    ///
    /// Returns the index of the inserted node, `Error` if `parent` is a terminal.
    pub fn add_child(&mut self, parent: NodeIndex, node: Node) -> Result<NodeIndex, Error> {
        let n_children = self.n_children(parent)?;
        self.insert_child(parent, n_children, node)
    }

    /// Insert `node` as child of `parent` at position `index`.
    ///
    /// Returns `Error` if `index` is out of bounds or `parent` is a terminal.
    pub fn insert_child(
        &mut self,
        parent: NodeIndex,
        index: usize,
        node: Node,
    ) -> Result<NodeIndex, Error> {
        let n_children = self.n_children(parent)?;
        if index > n_children {
            return Err(format_err!(
                "Cannot insert child at position {}, node '{}' has {} children",
                index,
                self.graph[parent],
                n_children
            ));
        }

        let shifted = self
            .graph
            .edges_directed(parent, Direction::Outgoing)
            .filter(|edge_ref| *edge_ref.weight() >= index)
            .map(|edge_ref| edge_ref.id())
            .collect::<Vec<_>>();
        for edge in shifted {
            self.graph[edge] += 1;
        }

        let idx = self.graph.add_node(node);
        self.graph.add_edge(parent, idx, index);
        Ok(idx)
    }

    /// Detach `child` and the nodes it dominates from `parent`.
    ///
    /// Returns the detached subtree, `Error` if `child` is not a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeIndex, child: NodeIndex) -> Result<Tree, Error> {
        let edge = self
            .graph
            .find_edge(parent, child)
            .ok_or_else(|| format_err!("Node is not a child of '{}'", self.graph[parent]))?;
        let position = self.graph[edge];

        let subtree = self.subtree(child);
        let removed = self.preorder(child).collect::<Vec<_>>();
        for node in removed {
            self.graph.remove_node(node);
        }

        let shifted = self
            .graph
            .edges_directed(parent, Direction::Outgoing)
            .filter(|edge_ref| *edge_ref.weight() > position)
            .map(|edge_ref| edge_ref.id())
            .collect::<Vec<_>>();
        for edge in shifted {
            self.graph[edge] -= 1;
        }

        Ok(subtree)
    }

    /// Copy the subtree rooted at `node`.
    pub fn subtree(&self, node: NodeIndex) -> Tree {
        let mut graph = StableGraph::new();
        let mut mapping = HashMap::new();
        for old in self.preorder(node) {
            let new = graph.add_node(self.graph[old].clone());
            mapping.insert(old, new);
            if old == node {
                continue;
            }
            if let Some(parent) = self.parent(old) {
                let edge = self
                    .graph
                    .find_edge(parent, old)
                    .map(|edge| self.graph[edge])
                    .unwrap_or(0);
                graph.add_edge(mapping[&parent], new, edge);
            }
        }
        Tree::from_graph(graph, mapping[&node])
    }

    /// 0-based position of the first token dominated by `node`.
    ///
    /// The position is derived from the token's `ID`. With `ignore_punct`, tokens
    /// whose part-of-speech starts with `"$"` are skipped.
    ///
    /// Returns `None` if `node` dominates no (non-punctuation) token or the `ID`
    /// is not numeric.
    pub fn start_index(&self, node: NodeIndex, ignore_punct: bool) -> Option<usize> {
        let first = self.covered_terminals(node, ignore_punct).next()?;
        self.token_index(first)
    }

    /// 0-based position of the last token dominated by `node`.
    ///
    /// See `start_index`.
    pub fn end_index(&self, node: NodeIndex, ignore_punct: bool) -> Option<usize> {
        let last = self.covered_terminals(node, ignore_punct).last()?;
        self.token_index(last)
    }

    /// Number tokens `"1"` to `"n"` from left to right.
    pub fn reindex_terminals(&mut self) {
        let terminals = self.terminals().collect::<Vec<_>>();
        for (idx, terminal) in terminals.into_iter().enumerate() {
            if let Some(terminal) = self.graph[terminal].terminal_mut() {
                terminal.token_mut().set_id((idx + 1).to_string());
            }
        }
    }

    fn covered_terminals<'a>(
        &'a self,
        node: NodeIndex,
        ignore_punct: bool,
    ) -> impl Iterator<Item = NodeIndex> + 'a {
        self.descendent_terminals(node).filter(move |&idx| {
            !ignore_punct
                || self.graph[idx]
                    .terminal()
                    .map(|t| !t.pos().starts_with('$'))
                    .unwrap_or(false)
        })
    }

    fn token_index(&self, terminal: NodeIndex) -> Option<usize> {
        self.graph[terminal]
            .terminal()?
            .token()
            .id()
            .parse::<usize>()
            .ok()?
            .checked_sub(1)
    }

    fn n_children(&self, node: NodeIndex) -> Result<usize, Error> {
        match self.graph.node_weight(node) {
            Some(Node::NonTerminal(_)) => Ok(self
                .graph
                .edges_directed(node, Direction::Outgoing)
                .count()),
            Some(Node::Terminal(t)) => Err(format_err!("Terminal '{}' cannot have children", t)),
            None => Err(format_err!("Node does not exist: {:?}", node)),
        }
    }

    fn subtree_eq(&self, node: NodeIndex, other: &Tree, other_node: NodeIndex) -> bool {
        if self[node] != other[other_node] {
            return false;
        }
        let children = self.children(node);
        let other_children = other.children(other_node);
        children.len() == other_children.len()
            && children
                .into_iter()
                .zip(other_children)
                .all(|(child, other_child)| self.subtree_eq(child, other, other_child))
    }
}

impl PartialEq for Tree {
    fn eq(&self, other: &Tree) -> bool {
        // cheap check first
        if self.graph.node_count() != other.graph.node_count() {
            return false;
        }
        self.subtree_eq(self.root, other, other.root)
    }
}

impl Index<NodeIndex> for Tree {
    type Output = Node;

    fn index(&self, index: NodeIndex) -> &<Self as Index<NodeIndex>>::Output {
        &self.graph[index]
    }
}

impl IndexMut<NodeIndex> for Tree {
    fn index_mut(&mut self, index: NodeIndex) -> &mut Node {
        &mut self.graph[index]
    }
}

/// Preorder traversal over a `Tree`, visiting children from left to right.
pub struct Preorder<'a> {
    tree: &'a Tree,
    stack: Vec<NodeIndex>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = NodeIndex;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(node).into_iter().rev());
        Some(node)
    }
}
