//! Incremental topological order
//!
//! The order is computed by cutting leaves: the caller repeatedly asks for a
//! node whose dependencies are all processed, processes it, and closes it.
//! Several leaves may be open at the same time, which is what a parallel
//! scheduler needs.
//!
//! Nodes are marked with three colors:
//! - White: not returned yet
//! - Grey: returned by [`TopologicalOrder::cut_leaf`], still being processed
//! - Black: closed by [`TopologicalOrder::close_leaf`]
//!
//! A node moves White → Grey → Black and never back. New nodes and edges
//! may be added while the order is in progress, as long as the edge starts
//! at a White node. White nodes wait in a binomial heap keyed by their live
//! out-degree (edges whose target is not Black yet).

use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;
use thiserror::Error;

use super::graph::Graph;
use super::heap::BinomialHeap;
use super::id::Identifier;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("Detected cycle in dependencies: {remaining} nodes can never become leaves")]
    CycleDetected { remaining: usize },
}

/// Processing state of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    White,
    Grey,
    Black,
}

#[derive(Debug, Clone, Copy)]
struct NodeState {
    color: Color,
    out_degree: usize,
}

/// A leaf handed out by [`TopologicalOrder::cut_leaf`]
///
/// The handle is consumed when the leaf is closed.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "an opened leaf has to be closed"]
pub struct OpenedLeaf {
    id: Identifier,
}

impl OpenedLeaf {
    pub fn id(&self) -> &Identifier {
        &self.id
    }
}

/// Leaf-cutting topological order over a graph
///
/// The order borrows the graph mutably: nodes and edges added through
/// [`TopologicalOrder::add_node`] and [`TopologicalOrder::add_dependency`]
/// land in the underlying graph.
#[derive(Debug)]
pub struct TopologicalOrder<'g, N, G: Graph<N>> {
    graph: &'g mut G,
    nodes: HashMap<Identifier, NodeState>,
    heap: BinomialHeap<usize, Identifier>,
    grey: HashSet<Identifier>,
    _data: PhantomData<fn() -> N>,
}

impl<'g, N, G: Graph<N>> TopologicalOrder<'g, N, G> {
    /// Starts an order over all nodes of the graph, all of them White
    pub fn new(graph: &'g mut G) -> Self {
        let mut initial = Vec::new();
        {
            let view: &G = graph;
            view.for_each_node(&mut |id, _| initial.push((id.clone(), view.out_degree(id))));
        }

        let mut order = Self {
            graph,
            nodes: HashMap::with_capacity(initial.len()),
            heap: BinomialHeap::new(),
            grey: HashSet::new(),
            _data: PhantomData,
        };
        for (id, out_degree) in initial {
            order.track(id, out_degree);
        }
        order
    }

    fn track(&mut self, id: Identifier, out_degree: usize) {
        self.nodes.insert(
            id.clone(),
            NodeState {
                color: Color::White,
                out_degree,
            },
        );
        self.heap.insert(id, out_degree);
    }

    fn state_mut(&mut self, id: &Identifier) -> &mut NodeState {
        match self.nodes.get_mut(id) {
            Some(state) => state,
            None => panic!("node {} is not in the order", id),
        }
    }

    /// Returns a leaf if one is ready
    ///
    /// `Ok(None)` means either that every node has been cut, or that no
    /// leaf is ready now but an open leaf may still unblock one. When no
    /// leaf is open and no White node is a leaf, the remaining nodes form a
    /// cycle and [`OrderError::CycleDetected`] is returned.
    pub fn cut_leaf(&mut self) -> Result<Option<OpenedLeaf>, OrderError> {
        let Some((&out_degree, _)) = self.heap.peek_min() else {
            return Ok(None);
        };

        if out_degree > 0 {
            if self.grey.is_empty() {
                return Err(OrderError::CycleDetected {
                    remaining: self.heap.len(),
                });
            }
            return Ok(None);
        }

        let Some((_, id)) = self.heap.poll_min() else {
            return Ok(None);
        };
        self.state_mut(&id).color = Color::Grey;
        self.grey.insert(id.clone());
        Ok(Some(OpenedLeaf { id }))
    }

    /// Closes an opened leaf
    ///
    /// The node becomes Black and every White node depending on it loses
    /// one live out-edge.
    pub fn close_leaf(&mut self, leaf: OpenedLeaf) {
        let state = self.state_mut(&leaf.id);
        assert!(state.color == Color::Grey, "leaf {} is not open", leaf.id);
        state.color = Color::Black;
        self.grey.remove(&leaf.id);

        let mut predecessors = Vec::new();
        self.graph
            .for_each_predecessor(&leaf.id, &mut |id, _| predecessors.push(id.clone()));

        for pred in predecessors {
            let state = self.state_mut(&pred);
            if state.color != Color::White {
                continue;
            }
            state.out_degree -= 1;
            let out_degree = state.out_degree;
            self.heap.update(&pred, out_degree);
        }
    }

    /// Cuts and immediately closes leaves until none is left
    ///
    /// Returns the nodes in the order they were closed.
    pub fn drain(&mut self) -> Result<Vec<Identifier>, OrderError> {
        let mut order = Vec::new();
        while let Some(leaf) = self.cut_leaf()? {
            order.push(leaf.id.clone());
            self.close_leaf(leaf);
        }
        Ok(order)
    }

    /// Returns the payload of an opened leaf
    pub fn data(&self, leaf: &OpenedLeaf) -> &N {
        self.graph.node(&leaf.id)
    }

    /// Returns true when every node is Black
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty() && self.grey.is_empty()
    }

    pub fn contains(&self, id: &Identifier) -> bool {
        self.graph.contains(id)
    }

    pub fn color(&self, id: &Identifier) -> Option<Color> {
        self.nodes.get(id).map(|state| state.color)
    }

    /// Returns the live out-degree of a node
    pub fn out_degree(&self, id: &Identifier) -> Option<usize> {
        self.nodes.get(id).map(|state| state.out_degree)
    }

    /// Adds a new White node to the graph and to the order
    pub fn add_node(&mut self, id: Identifier, data: N) {
        self.graph.add_node(id.clone(), data);
        let out_degree = self.graph.out_degree(&id);
        self.track(id, out_degree);
    }

    /// Adds the edge `from -> to` while the order is in progress
    ///
    /// `from` must still be White. The live out-degree of `from` grows only
    /// if `to` is not Black yet. Returns false if the edge already existed.
    pub fn add_dependency(&mut self, from: &Identifier, to: &Identifier) -> bool {
        let from_color = self.state_mut(from).color;
        assert!(
            from_color == Color::White,
            "cannot add a dependency from {} which is already {:?}",
            from,
            from_color
        );
        let to_color = self.state_mut(to).color;

        if !self.graph.add_dependency(from, to) {
            return false;
        }

        if to_color != Color::Black {
            let state = self.state_mut(from);
            state.out_degree += 1;
            let out_degree = state.out_degree;
            self.heap.update(from, out_degree);
        }
        true
    }
}
