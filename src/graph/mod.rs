//! The dependency graph of intermediate cipher state values.
//!
//! Nodes live in an arena and are addressed by a stable [`NodeId`]. Edges are stored in a
//! second arena and point from a later node (the *successor*) to an earlier node (the
//! *predecessor*) whose value can be computed once all its successors are known. Edges are
//! never removed structurally; pruning marks them dead, which keeps every [`EdgeId`] valid
//! and allows cheap snapshots of the live edge set.

mod builder;


pub use builder::{BuiltGraph, DependencyGraphBuilder};
use std::fmt;

/// A stable index of a [`StateNode`] in a [`DependencyGraph`].
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(usize);

/// A stable index of an [`Edge`] in a [`DependencyGraph`].
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl EdgeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// The position of a state value within a round, in the order the round function
/// computes them.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StateKind {
    /// Round input (before key mixing).
    Input,
    /// Round subkey cell mixed into the state.
    Subkey,
    /// State after key mixing.
    PostKeyMix,
    /// State after the cell permutation.
    Diffused,
}

impl StateKind {
    pub fn is_input(&self) -> bool {
        matches!(self, StateKind::Input)
    }

    pub fn is_subkey(&self) -> bool {
        matches!(self, StateKind::Subkey)
    }

    /// A short label used in logs and textual output.
    pub fn label(&self) -> &'static str {
        match self {
            StateKind::Input => "X",
            StateKind::Subkey => "STK",
            StateKind::PostKeyMix => "Z",
            StateKind::Diffused => "W",
        }
    }
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single cell of an intermediate cipher state.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StateNode {
    pub round: usize,
    pub kind: StateKind,
    pub cell: usize,
    /// Width of the cell in bits.
    pub bits: u32,
    /// The physical key cell of a [`StateKind::Subkey`] node.
    pub key: Option<usize>,
    predecessors: Vec<EdgeId>,
}

impl fmt::Display for StateNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.kind, self.round, self.cell)
    }
}

/// A dependency between two state nodes.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Edge {
    pub successor: NodeId,
    pub predecessor: NodeId,
}

/// A snapshot of which edges of a [`DependencyGraph`] are still live.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeMask(Vec<bool>);

impl EdgeMask {
    pub fn live_count(&self) -> usize {
        self.0.iter().filter(|it| **it).count()
    }
}

/// An arena of [`StateNode`] objects connected by prunable [`Edge`] objects.
#[derive(Clone, Default, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DependencyGraph {
    nodes: Vec<StateNode>,
    edges: Vec<Edge>,
    live: Vec<bool>,
    /// Number of edges ever created towards each node.
    incoming: Vec<usize>,
}

impl DependencyGraph {
    /// Create a new node without predecessors.
    pub fn add_node(
        &mut self,
        round: usize,
        kind: StateKind,
        cell: usize,
        bits: u32,
        key: Option<usize>,
    ) -> NodeId {
        self.nodes.push(StateNode {
            round,
            kind,
            cell,
            bits,
            key,
            predecessors: Vec::new(),
        });
        self.incoming.push(0);
        NodeId(self.nodes.len() - 1)
    }

    /// Make `successor` depend on `predecessor`.
    ///
    /// # Panics
    ///
    /// Panics if either node does not belong to this graph.
    pub fn add_edge(&mut self, successor: NodeId, predecessor: NodeId) -> EdgeId {
        let id = EdgeId(self.edges.len());
        self.edges.push(Edge {
            successor,
            predecessor,
        });
        self.live.push(true);
        self.nodes[successor.0].predecessors.push(id);
        self.incoming[predecessor.0] += 1;
        id
    }

    pub fn node(&self, id: NodeId) -> &StateNode {
        &self.nodes[id.0]
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.0]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn live_edge_count(&self) -> usize {
        self.live.iter().filter(|it| **it).count()
    }

    /// Iterate over all node identifiers in creation order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    /// The number of successors that referenced `id` when the graph was built.
    pub fn incoming_amount(&self, id: NodeId) -> usize {
        self.incoming[id.0]
    }

    pub fn is_live(&self, edge: EdgeId) -> bool {
        self.live[edge.0]
    }

    /// All predecessor edges of a node (live or pruned) in insertion order.
    pub fn predecessor_edges(&self, id: NodeId) -> &[EdgeId] {
        &self.nodes[id.0].predecessors
    }

    /// Live predecessor edges of a node in insertion order.
    pub fn live_predecessor_edges(&self, id: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.predecessor_edges(id)
            .iter()
            .copied()
            .filter(|it| self.is_live(*it))
    }

    /// Live predecessors of a node in insertion order.
    pub fn live_predecessors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.live_predecessor_edges(id)
            .map(|it| self.edges[it.0].predecessor)
    }

    /// The first live edge from `successor` to `predecessor`, if any.
    pub fn live_edge_between(&self, successor: NodeId, predecessor: NodeId) -> Option<EdgeId> {
        self.live_predecessor_edges(successor)
            .find(|it| self.edges[it.0].predecessor == predecessor)
    }

    /// Mark an edge as dead. Returns `false` if the edge was already pruned.
    pub fn prune(&mut self, edge: EdgeId) -> bool {
        std::mem::replace(&mut self.live[edge.0], false)
    }

    /// Capture the current set of live edges.
    pub fn edge_mask(&self) -> EdgeMask {
        EdgeMask(self.live.clone())
    }

    /// Restore a set of live edges captured by [`DependencyGraph::edge_mask`].
    ///
    /// # Panics
    ///
    /// Panics if the mask was taken from a graph with a different number of edges.
    pub fn restore(&mut self, mask: EdgeMask) {
        assert_eq!(mask.0.len(), self.edges.len());
        self.live = mask.0;
    }

    /// True if every edge points from a node to a node created before it.
    ///
    /// Since nodes are only ever connected to earlier nodes, this implies the graph
    /// is acyclic.
    pub fn is_topologically_ordered(&self) -> bool {
        self.edges.iter().all(|it| it.predecessor < it.successor)
    }
}
