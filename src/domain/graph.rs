//! Dependency graph
//!
//! A directed graph over [`Identifier`]s. An edge `a -> b` means "a depends
//! on b": `b` has to be processed before `a`. Nodes carry a payload of a
//! generic type and keep both directions of adjacency, so callers can walk
//! successors (dependencies) as well as predecessors (dependents).
//!
//! Misuse of the graph (a missing endpoint, a self-loop, a node added twice)
//! is a programming error and panics.
//!
//! [`DependencyGraph`] stores the nodes in a petgraph arena; [`FilteredGraph`]
//! is a view of the part of a graph reachable from a set of roots.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

use super::id::Identifier;

/// Operations shared by full graphs and filtered views
pub trait Graph<N> {
    /// Returns true if the node exists
    fn contains(&self, id: &Identifier) -> bool;

    /// Adds a node; the identifier must not be present yet
    fn add_node(&mut self, id: Identifier, data: N);

    /// Adds the edge `from -> to`
    ///
    /// Both nodes must exist and differ. Returns false if the edge already
    /// existed, in which case nothing changes.
    fn add_dependency(&mut self, from: &Identifier, to: &Identifier) -> bool;

    /// Returns the payload of a node; the node must exist
    fn node(&self, id: &Identifier) -> &N;

    /// Number of out-edges of a node
    fn out_degree(&self, id: &Identifier) -> usize;

    fn for_each_node(&self, f: &mut dyn FnMut(&Identifier, &N));

    /// Calls `f` for every node depending on `id`
    fn for_each_predecessor(&self, id: &Identifier, f: &mut dyn FnMut(&Identifier, &N));

    /// Calls `f` for every node `id` depends on
    fn for_each_successor(&self, id: &Identifier, f: &mut dyn FnMut(&Identifier, &N));
}

#[derive(Debug, Clone)]
struct GraphNode<N> {
    id: Identifier,
    data: N,
}

/// An in-memory dependency graph
#[derive(Debug, Clone)]
pub struct DependencyGraph<N> {
    /// The underlying directed graph
    graph: DiGraph<GraphNode<N>, ()>,

    /// Map from Identifier to node index
    node_map: HashMap<Identifier, NodeIndex>,
}

impl<N> Default for DependencyGraph<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> DependencyGraph<N> {
    /// Creates an empty dependency graph
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    /// Returns the number of nodes in the graph
    pub fn len(&self) -> usize {
        self.node_map.len()
    }

    /// Returns true if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.node_map.is_empty()
    }

    /// Returns the number of edges in the graph
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns every edge as a `(from, to)` pair
    pub fn edges(&self) -> Vec<(&Identifier, &Identifier)> {
        self.graph
            .raw_edges()
            .iter()
            .map(|edge| (&self.graph[edge.source()].id, &self.graph[edge.target()].id))
            .collect()
    }

    /// Returns the direct dependencies of a node
    pub fn dependencies(&self, id: &Identifier) -> Vec<Identifier> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Returns the direct dependents of a node (nodes that depend on it)
    pub fn dependents(&self, id: &Identifier) -> Vec<Identifier> {
        self.neighbors(id, Direction::Incoming)
    }

    /// Returns the payload of a node, if present
    pub fn get(&self, id: &Identifier) -> Option<&N> {
        self.node_map.get(id).map(|idx| &self.graph[*idx].data)
    }

    /// Returns the identifiers reachable from `roots` (roots included)
    pub fn reachable_from<'a>(&self, roots: impl IntoIterator<Item = &'a Identifier>) -> HashSet<Identifier> {
        let mut reached = HashSet::new();
        for root in roots {
            let start = self.index(root);
            let mut dfs = Dfs::new(&self.graph, start);
            while let Some(idx) = dfs.next(&self.graph) {
                reached.insert(self.graph[idx].id.clone());
            }
        }
        reached
    }

    fn index(&self, id: &Identifier) -> NodeIndex {
        match self.node_map.get(id) {
            Some(idx) => *idx,
            None => panic!("node {} is not in the graph", id),
        }
    }

    fn neighbors(&self, id: &Identifier, direction: Direction) -> Vec<Identifier> {
        let idx = match self.node_map.get(id) {
            Some(idx) => *idx,
            None => return vec![],
        };

        self.graph
            .neighbors_directed(idx, direction)
            .map(|n| self.graph[n].id.clone())
            .collect()
    }

    fn visit_neighbors(&self, id: &Identifier, direction: Direction, f: &mut dyn FnMut(&Identifier, &N)) {
        let idx = self.index(id);
        for n in self.graph.neighbors_directed(idx, direction) {
            let node = &self.graph[n];
            f(&node.id, &node.data);
        }
    }
}

impl<N> Graph<N> for DependencyGraph<N> {
    fn contains(&self, id: &Identifier) -> bool {
        self.node_map.contains_key(id)
    }

    fn add_node(&mut self, id: Identifier, data: N) {
        assert!(!self.node_map.contains_key(&id), "node {} is already in the graph", id);
        let idx = self.graph.add_node(GraphNode { id: id.clone(), data });
        self.node_map.insert(id, idx);
    }

    fn add_dependency(&mut self, from: &Identifier, to: &Identifier) -> bool {
        assert!(from != to, "self-dependency of {} is not allowed", from);

        let from_idx = self.index(from);
        let to_idx = self.index(to);

        if self.graph.contains_edge(from_idx, to_idx) {
            return false;
        }
        self.graph.add_edge(from_idx, to_idx, ());
        true
    }

    fn node(&self, id: &Identifier) -> &N {
        &self.graph[self.index(id)].data
    }

    fn out_degree(&self, id: &Identifier) -> usize {
        self.graph
            .neighbors_directed(self.index(id), Direction::Outgoing)
            .count()
    }

    fn for_each_node(&self, f: &mut dyn FnMut(&Identifier, &N)) {
        for node in self.graph.node_weights() {
            f(&node.id, &node.data);
        }
    }

    fn for_each_predecessor(&self, id: &Identifier, f: &mut dyn FnMut(&Identifier, &N)) {
        self.visit_neighbors(id, Direction::Incoming, f);
    }

    fn for_each_successor(&self, id: &Identifier, f: &mut dyn FnMut(&Identifier, &N)) {
        self.visit_neighbors(id, Direction::Outgoing, f);
    }
}

/// The subgraph reachable from a set of roots
///
/// The reachable set is computed once by depth-first search over
/// successors. Nodes and edges added through the view are written into the
/// base graph and become part of the view.
#[derive(Debug)]
pub struct FilteredGraph<'g, N> {
    base: &'g mut DependencyGraph<N>,
    nodes: HashSet<Identifier>,
}

impl<'g, N> FilteredGraph<'g, N> {
    pub fn new<'a>(base: &'g mut DependencyGraph<N>, roots: impl IntoIterator<Item = &'a Identifier>) -> Self {
        let nodes = base.reachable_from(roots);
        Self { base, nodes }
    }

    /// Returns the number of nodes in the view
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn check(&self, id: &Identifier) {
        assert!(self.nodes.contains(id), "node {} is not in the filtered graph", id);
    }
}

impl<N> Graph<N> for FilteredGraph<'_, N> {
    fn contains(&self, id: &Identifier) -> bool {
        self.nodes.contains(id)
    }

    fn add_node(&mut self, id: Identifier, data: N) {
        self.base.add_node(id.clone(), data);
        self.nodes.insert(id);
    }

    fn add_dependency(&mut self, from: &Identifier, to: &Identifier) -> bool {
        self.check(from);
        self.check(to);
        self.base.add_dependency(from, to)
    }

    fn node(&self, id: &Identifier) -> &N {
        self.check(id);
        self.base.node(id)
    }

    fn out_degree(&self, id: &Identifier) -> usize {
        self.check(id);
        let mut degree = 0;
        self.for_each_successor(id, &mut |_, _| degree += 1);
        degree
    }

    fn for_each_node(&self, f: &mut dyn FnMut(&Identifier, &N)) {
        for id in &self.nodes {
            f(id, self.base.node(id));
        }
    }

    fn for_each_predecessor(&self, id: &Identifier, f: &mut dyn FnMut(&Identifier, &N)) {
        let nodes = &self.nodes;
        self.base.for_each_predecessor(id, &mut |pred, data| {
            if nodes.contains(pred) {
                f(pred, data);
            }
        });
    }

    fn for_each_successor(&self, id: &Identifier, f: &mut dyn FnMut(&Identifier, &N)) {
        let nodes = &self.nodes;
        self.base.for_each_successor(id, &mut |succ, data| {
            if nodes.contains(succ) {
                f(succ, data);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> Identifier {
        Identifier::from(s)
    }

    fn graph_of(nodes: &[&str], edges: &[(&str, &str)]) -> DependencyGraph<String> {
        let mut graph = DependencyGraph::new();
        for n in nodes {
            graph.add_node(id(n), n.to_string());
        }
        for (from, to) in edges {
            graph.add_dependency(&id(from), &id(to));
        }
        graph
    }

    #[test]
    fn empty_graph() {
        let graph: DependencyGraph<()> = DependencyGraph::new();
        assert!(graph.is_empty());
        assert_eq!(graph.len(), 0);
    }

    #[test]
    fn add_nodes() {
        let graph = graph_of(&["a", "b"], &[]);

        assert_eq!(graph.len(), 2);
        assert!(graph.contains(&id("a")));
        assert!(!graph.contains(&id("c")));
        assert_eq!(graph.node(&id("b")), "b");
    }

    #[test]
    fn add_dependency_is_idempotent() {
        let mut graph = graph_of(&["a", "b"], &[]);

        assert!(graph.add_dependency(&id("a"), &id("b")));
        assert!(!graph.add_dependency(&id("a"), &id("b")));

        assert_eq!(graph.out_degree(&id("a")), 1);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.dependencies(&id("a")), vec![id("b")]);
        assert_eq!(graph.dependents(&id("b")), vec![id("a")]);
    }

    #[test]
    fn predecessors_and_successors() {
        let graph = graph_of(&["a", "b", "c"], &[("a", "c"), ("b", "c")]);

        let mut preds = Vec::new();
        graph.for_each_predecessor(&id("c"), &mut |p, _| preds.push(p.clone()));
        preds.sort();
        assert_eq!(preds, vec![id("a"), id("b")]);

        let mut succs = Vec::new();
        graph.for_each_successor(&id("a"), &mut |s, _| succs.push(s.clone()));
        assert_eq!(succs, vec![id("c")]);
    }

    #[test]
    #[should_panic(expected = "self-dependency")]
    fn self_dependency_rejected() {
        let mut graph = graph_of(&["a"], &[]);
        graph.add_dependency(&id("a"), &id("a"));
    }

    #[test]
    #[should_panic(expected = "not in the graph")]
    fn unknown_node_panics() {
        let mut graph = graph_of(&["a"], &[]);
        graph.add_dependency(&id("a"), &id("missing"));
    }

    #[test]
    #[should_panic(expected = "already in the graph")]
    fn duplicate_node_panics() {
        let mut graph = graph_of(&["a"], &[]);
        graph.add_node(id("a"), "again".to_string());
    }

    #[test]
    fn filtered_graph_keeps_reachable_nodes() {
        // top -> mid -> leaf, other -> leaf
        let mut graph = graph_of(
            &["top", "mid", "leaf", "other"],
            &[("top", "mid"), ("mid", "leaf"), ("other", "leaf")],
        );

        let view = FilteredGraph::new(&mut graph, [&id("mid")]);
        assert_eq!(view.len(), 2);
        assert!(view.contains(&id("mid")));
        assert!(view.contains(&id("leaf")));
        assert!(!view.contains(&id("top")));

        // predecessors outside of the view are hidden
        let mut preds = Vec::new();
        view.for_each_predecessor(&id("leaf"), &mut |p, _| preds.push(p.clone()));
        assert_eq!(preds, vec![id("mid")]);
        assert_eq!(view.out_degree(&id("mid")), 1);
    }

    #[test]
    fn filtered_graph_writes_through() {
        let mut graph = graph_of(&["a", "b"], &[("a", "b")]);
        {
            let mut view = FilteredGraph::new(&mut graph, [&id("a")]);
            view.add_node(id("c"), "c".to_string());
            assert!(view.add_dependency(&id("b"), &id("c")));
            assert_eq!(view.len(), 3);
        }
        assert_eq!(graph.dependencies(&id("b")), vec![id("c")]);
    }
}
