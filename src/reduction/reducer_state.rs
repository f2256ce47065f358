use crate::graph::{BuiltGraph, DependencyGraph, EdgeMask, NodeId};
use crate::reduction::Reduction;
use std::collections::BTreeSet;

/// A frontier together with the live edges it was observed with.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReductionSnapshot {
    /// The pass which produced this frontier (zero for the initial frontier).
    pub pass: usize,
    pub frontier: BTreeSet<NodeId>,
    pub pending: BTreeSet<NodeId>,
    /// Nodes absorbed up to and including `pass`.
    pub reached: BTreeSet<NodeId>,
    pub mask: EdgeMask,
}

impl ReductionSnapshot {
    pub fn footprint(&self) -> usize {
        self.frontier.len() + self.pending.len()
    }
}

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReducerState {
    pub pass: usize,
    pub graph: DependencyGraph,
    pub frontier: BTreeSet<NodeId>,
    pub pending: BTreeSet<NodeId>,
    pub candidates: BTreeSet<NodeId>,
    pub reached: BTreeSet<NodeId>,
    /// The smallest state seen so far (ties are resolved in favor of later passes).
    pub best: ReductionSnapshot,
}

impl ReducerState {
    /// Start a reduction of `frontier` with the given pending tracked subkey nodes.
    pub fn new(
        graph: DependencyGraph,
        frontier: BTreeSet<NodeId>,
        pending: BTreeSet<NodeId>,
    ) -> ReducerState {
        ReducerState {
            pass: 0,
            best: ReductionSnapshot {
                pass: 0,
                frontier: frontier.clone(),
                pending: pending.clone(),
                reached: BTreeSet::new(),
                mask: graph.edge_mask(),
            },
            graph,
            frontier,
            pending,
            candidates: BTreeSet::new(),
            reached: BTreeSet::new(),
        }
    }

    /// Commit the best observed state and hand the graph over to the result.
    ///
    /// Passes after the best one leave no effect. Their pruned edges are restored and the
    /// nodes they absorbed are not reported. A candidate is kept only while it is a live
    /// predecessor of the committed frontier. Every committed frontier is walked by the
    /// pass that follows it, so none of its candidates is missing.
    pub(crate) fn finish(&mut self) -> Reduction {
        let best = self.best.clone();
        self.graph.restore(best.mask);
        let graph = &self.graph;
        let candidates = std::mem::take(&mut self.candidates)
            .into_iter()
            .filter(|it| !best.pending.contains(it))
            .filter(|it| {
                best.frontier
                    .iter()
                    .any(|node| graph.live_edge_between(*node, *it).is_some())
            })
            .collect();
        self.reached.clear();
        Reduction {
            graph: std::mem::take(&mut self.graph),
            frontier: best.frontier,
            pending: best.pending,
            candidates,
            reached: best.reached,
            passes: self.pass,
            committed_pass: best.pass,
        }
    }
}

impl From<BuiltGraph> for ReducerState {
    fn from(value: BuiltGraph) -> Self {
        ReducerState::new(value.graph, value.frontier, value.tracked)
    }
}

impl From<Reduction> for ReducerState {
    fn from(value: Reduction) -> Self {
        ReducerState::new(value.graph, value.frontier, value.pending)
    }
}
