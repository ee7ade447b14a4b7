//! Resource-Allocation Graph for single-instance deadlock detection
//!
//! Nodes are processes and resources. An edge `R -> P` means resource R is
//! allocated to process P; an edge `P -> R` means P is waiting for R. With one
//! instance per resource, any directed cycle is a deadlock.
//!
//! # How it works
//!
//! Nodes and their outgoing edges are kept in insertion order, so traversal and
//! the reported cycle are deterministic for a given input. Cycle search is an
//! iterative depth-first traversal with three colors:
//! - *White*: not visited yet
//! - *Gray*: on the current DFS path
//! - *Black*: fully explored, cannot lead to a cycle
//!
//! Reaching a Gray node closes a cycle. Each node and edge is visited once,
//! so the search is O(V + E).

use fxhash::{FxHashMap, FxHashSet};

/// Role of a node in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Process,
    Resource,
    /// Neither prefix matched; the node still takes part in cycle search
    Untyped,
}

impl NodeKind {
    /// Infer the role from an identifier: `P...` is a process, `R...` a resource
    pub fn infer(id: &str) -> Self {
        match id.chars().next() {
            Some('P') | Some('p') => NodeKind::Process,
            Some('R') | Some('r') => NodeKind::Resource,
            _ => NodeKind::Untyped,
        }
    }
}

/// Role of an edge, determined by its endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// Resource -> Process
    Allocation,
    /// Process -> Resource
    Request,
    /// Any other pairing
    Untyped,
}

impl EdgeKind {
    fn classify(from: NodeKind, to: NodeKind) -> Self {
        match (from, to) {
            (NodeKind::Resource, NodeKind::Process) => EdgeKind::Allocation,
            (NodeKind::Process, NodeKind::Resource) => EdgeKind::Request,
            _ => EdgeKind::Untyped,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Directed resource-allocation graph
#[derive(Debug, Clone, Default)]
pub struct ResourceAllocationGraph {
    /// Node identifiers in insertion order
    names: Vec<String>,
    /// Role of each node
    kinds: Vec<NodeKind>,
    /// Identifier to position in `names`
    index: FxHashMap<String, usize>,
    /// Outgoing neighbors per node, in insertion order
    edges: Vec<Vec<usize>>,
    /// Present edges, for de-duplication
    edge_set: FxHashSet<(usize, usize)>,
}

impl ResourceAllocationGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from bare identifiers, inferring node roles
    ///
    /// Edge endpoints missing from `nodes` are added on first use.
    pub fn from_parts<S: AsRef<str>>(nodes: &[S], edges: &[(S, S)]) -> Self {
        let mut graph = Self::new();
        for node in nodes {
            graph.add_node(node.as_ref());
        }
        for (from, to) in edges {
            graph.add_edge(from.as_ref(), to.as_ref());
        }
        graph
    }

    /// Add a node with an inferred role, returning its position
    pub fn add_node(&mut self, id: &str) -> usize {
        self.add_typed_node(id, NodeKind::infer(id))
    }

    /// Add a node with an explicit role, returning its position
    ///
    /// An existing node keeps the role it was first added with.
    pub fn add_typed_node(&mut self, id: &str, kind: NodeKind) -> usize {
        if let Some(&position) = self.index.get(id) {
            return position;
        }
        let position = self.names.len();
        self.names.push(id.to_string());
        self.kinds.push(kind);
        self.edges.push(Vec::new());
        self.index.insert(id.to_string(), position);
        position
    }

    /// Add a directed edge, adding missing endpoints with inferred roles
    ///
    /// Duplicate edges are ignored.
    pub fn add_edge(&mut self, from: &str, to: &str) -> EdgeKind {
        let from = self.add_node(from);
        let to = self.add_node(to);
        self.link(from, to)
    }

    /// Add an allocation edge `resource -> process`
    pub fn add_allocation(&mut self, resource: &str, process: &str) {
        let from = self.add_typed_node(resource, NodeKind::Resource);
        let to = self.add_typed_node(process, NodeKind::Process);
        self.link(from, to);
    }

    /// Add a request edge `process -> resource`
    pub fn add_request(&mut self, process: &str, resource: &str) {
        let from = self.add_typed_node(process, NodeKind::Process);
        let to = self.add_typed_node(resource, NodeKind::Resource);
        self.link(from, to);
    }

    fn link(&mut self, from: usize, to: usize) -> EdgeKind {
        if self.edge_set.insert((from, to)) {
            self.edges[from].push(to);
        }
        EdgeKind::classify(self.kinds[from], self.kinds[to])
    }

    pub fn node_count(&self) -> usize {
        self.names.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_set.len()
    }

    /// Role of a node, if present
    pub fn kind_of(&self, id: &str) -> Option<NodeKind> {
        self.index.get(id).map(|&position| self.kinds[position])
    }

    /// All edges as `(from, to, kind)` in insertion order
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, EdgeKind)> + '_ {
        self.edges.iter().enumerate().flat_map(move |(from, targets)| {
            targets.iter().map(move |&to| {
                (
                    self.names[from].as_str(),
                    self.names[to].as_str(),
                    EdgeKind::classify(self.kinds[from], self.kinds[to]),
                )
            })
        })
    }

    /// Whether the graph contains a directed cycle
    pub fn has_cycle(&self) -> bool {
        self.find_cycle().is_some()
    }

    /// Find the first directed cycle, if any
    ///
    /// # Returns
    /// * `Some(path)` - Node identifiers along the cycle, starting at the node
    ///   the back-edge points to; the edge from the last element back to the
    ///   first closes it
    /// * `None` - The graph is acyclic
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let mut color = vec![Color::White; self.names.len()];
        // DFS path: (node, index of next neighbor to try)
        let mut stack: Vec<(usize, usize)> = Vec::new();

        for root in 0..self.names.len() {
            if color[root] != Color::White {
                continue;
            }
            color[root] = Color::Gray;
            stack.push((root, 0));

            while let Some(top) = stack.last_mut() {
                let node = top.0;
                let Some(&neighbor) = self.edges[node].get(top.1) else {
                    color[node] = Color::Black;
                    stack.pop();
                    continue;
                };
                top.1 += 1;

                match color[neighbor] {
                    Color::White => {
                        color[neighbor] = Color::Gray;
                        stack.push((neighbor, 0));
                    }
                    Color::Gray => {
                        let start = stack
                            .iter()
                            .position(|&(n, _)| n == neighbor)
                            .unwrap_or(0);
                        return Some(
                            stack[start..]
                                .iter()
                                .map(|&(n, _)| self.names[n].clone())
                                .collect(),
                        );
                    }
                    Color::Black => {}
                }
            }
        }

        None
    }
}

/// Single-instance deadlock check over bare identifiers
///
/// # Returns
/// `true` if the graph built from `nodes` and `edges` contains a cycle
pub fn detect_cycle<S: AsRef<str>>(nodes: &[S], edges: &[(S, S)]) -> bool {
    ResourceAllocationGraph::from_parts(nodes, edges).has_cycle()
}
