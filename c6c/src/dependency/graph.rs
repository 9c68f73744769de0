use petgraph::algo::tarjan_scc;
use petgraph::graph::DiGraph;

use crate::fields::EMPTY_VALUE;
use crate::Sentence;

/// Head of a token.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Head {
    /// Attached to the artificial root, `HEAD == "0"`.
    Root,
    /// Attached to the token at this position.
    Token(usize),
    /// No head, `HEAD` is `"_"` or points to a missing token.
    Unattached,
}

/// Dependency graph.
///
/// Tokens are identified by their position in the sentence. Dependents and
/// roots are kept in sentence order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DepGraph {
    heads: Vec<Head>,
    dependents: Vec<Vec<usize>>,
    roots: Vec<usize>,
}

impl DepGraph {
    /// Construct a graph with `n_tokens` unattached tokens.
    pub fn new(n_tokens: usize) -> Self {
        DepGraph {
            heads: vec![Head::Unattached; n_tokens],
            dependents: vec![Vec::new(); n_tokens],
            roots: Vec::new(),
        }
    }

    pub fn from_sentence(sentence: &Sentence) -> Self {
        let mut graph = DepGraph::new(sentence.len());
        for (idx, token) in sentence.iter().enumerate() {
            let head = match token.head() {
                "0" => Head::Root,
                head if head == EMPTY_VALUE => Head::Unattached,
                head => sentence
                    .position(head)
                    .map(Head::Token)
                    .unwrap_or(Head::Unattached),
            };
            graph.set_head(idx, head);
        }
        graph
    }

    pub fn len(&self) -> usize {
        self.heads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heads.is_empty()
    }

    /// Get the head of the token at `dependent`.
    pub fn head(&self, dependent: usize) -> Head {
        self.heads[dependent]
    }

    /// Get the dependents of the token at `head` in sentence order.
    pub fn dependents(&self, head: usize) -> &[usize] {
        &self.dependents[head]
    }

    /// Get the tokens attached to the root in sentence order.
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// Attach `dependent` to `head`.
    ///
    /// Returns the previous head.
    pub fn set_head(&mut self, dependent: usize, head: Head) -> Head {
        let old = self.heads[dependent];
        match old {
            Head::Root => self.roots.retain(|&idx| idx != dependent),
            Head::Token(old_head) => self.dependents[old_head].retain(|&idx| idx != dependent),
            Head::Unattached => (),
        }

        match head {
            Head::Root => insert_sorted(&mut self.roots, dependent),
            Head::Token(head) => insert_sorted(&mut self.dependents[head], dependent),
            Head::Unattached => (),
        }
        self.heads[dependent] = head;
        old
    }

    /// Returns whether the token at `idx` has a `HEAD` that is neither `"0"`,
    /// `"_"` nor the `ID` of a token in `sentence`.
    pub fn is_dangling(&self, sentence: &Sentence, idx: usize) -> bool {
        let head = sentence.tokens()[idx].head();
        self.heads[idx] == Head::Unattached && head != EMPTY_VALUE && head != "0"
    }

    /// Find the cycles in the graph.
    ///
    /// Each cycle is given as the sorted positions of its tokens, a token
    /// that is its own head forms a cycle on its own.
    pub fn cycles(&self) -> Vec<Vec<usize>> {
        let mut graph = DiGraph::<(), ()>::with_capacity(self.len(), self.len());
        let nodes = (0..self.len())
            .map(|_| graph.add_node(()))
            .collect::<Vec<_>>();
        for (dependent, head) in self.heads.iter().enumerate() {
            if let Head::Token(head) = *head {
                graph.add_edge(nodes[head], nodes[dependent], ());
            }
        }

        let mut cycles = tarjan_scc(&graph)
            .into_iter()
            .filter(|component| {
                let first = component[0].index();
                component.len() > 1 || self.heads[first] == Head::Token(first)
            })
            .map(|component| {
                let mut cycle = component
                    .into_iter()
                    .map(|node| node.index())
                    .collect::<Vec<_>>();
                cycle.sort();
                cycle
            })
            .collect::<Vec<_>>();
        cycles.sort();
        cycles
    }
}

fn insert_sorted(vec: &mut Vec<usize>, value: usize) {
    if let Err(idx) = vec.binary_search(&value) {
        vec.insert(idx, value);
    }
}
