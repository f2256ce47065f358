//! Fixed-point reduction of a frontier of resident state values.
//!
//! A single reduction *pass* walks the live predecessors of every frontier node and
//! decrements their reference counts. Once every successor of a predecessor has been
//! visited, the predecessor can be computed from the frontier and replaces its successors.
//! Subkey nodes that are not guessed in the current step block this replacement and are
//! reported as guess candidates instead.
//!
//! Passes are repeated until the frontier stops changing (or becomes empty). The state
//! with the smallest memory footprint seen over all passes is the one that is committed,
//! and the passes after it leave no trace in the result.
//!
//! # Example
//!
//! ```
//! use partial_sum_schedule::diffusion::Skinny;
//! use partial_sum_schedule::graph::DependencyGraphBuilder;
//! use partial_sum_schedule::reduction::{KeyUsage, Reducer, ReducerConfig, ReducerState};
//! use computation_process::Algorithm;
//!
//! let skinny = Skinny::n64();
//! let built = DependencyGraphBuilder::new(&skinny).build(0, 3, 0, 0).unwrap();
//! let config = ReducerConfig::new(KeyUsage::new(16, 1));
//! let reduction = Reducer::run(config, ReducerState::from(built)).unwrap();
//! assert!(!reduction.candidates.is_empty());
//! ```

use crate::graph::{DependencyGraph, NodeId};
use computation_process::Computation;
use std::collections::BTreeSet;

#[cfg(test)]
mod tests;

mod fixed_point;
mod reducer_config;
mod reducer_state;
mod visit_order;

pub use fixed_point::FixedPointPass;
pub use reducer_config::{KeyUsage, ReducerConfig};
pub use reducer_state::{ReducerState, ReductionSnapshot};
pub use visit_order::{Insertion, ReverseInsertion};

/// A helper alias which allows us to use [`ReductionComputation`] as shorthand for
/// `Computation<Context = ReducerConfig, State = ReducerState>`.
pub type ReductionComputation<STEP> = Computation<ReducerConfig, ReducerState, Reduction, STEP>;

/// The default reduction: predecessors are visited in reverse insertion order.
pub type Reducer = ReductionComputation<FixedPointPass<ReverseInsertion>>;

/// A reduction which visits predecessors in insertion order. The committed frontier
/// can differ from [`Reducer`], which is useful when studying how much the schedule
/// depends on this order.
pub type InsertionOrderReducer = ReductionComputation<FixedPointPass<Insertion>>;

/// Decides in which order the live predecessor edges of one frontier node are visited
/// during a reduction pass.
pub trait PredecessorOrder {
    /// Reorder the live predecessor edges of a node, given in insertion order.
    fn visit_order<T: Copy>(live: Vec<T>) -> Vec<T>;
}

/// The result of a reduction.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reduction {
    /// The graph with the committed edge mask.
    pub graph: DependencyGraph,
    /// The committed frontier.
    pub frontier: BTreeSet<NodeId>,
    /// Tracked subkey nodes that were not absorbed yet.
    pub pending: BTreeSet<NodeId>,
    /// Subkey nodes which block the committed frontier.
    pub candidates: BTreeSet<NodeId>,
    /// Nodes absorbed into a frontier up to the committed pass.
    pub reached: BTreeSet<NodeId>,
    /// Number of executed passes.
    pub passes: usize,
    /// The pass whose frontier was committed (zero if no pass improved on the input).
    pub committed_pass: usize,
}

impl Reduction {
    /// Memory footprint of the committed state, in cells.
    pub fn footprint(&self) -> usize {
        self.frontier.len() + self.pending.len()
    }
}
