use crate::diffusion::{DiffusionModel, Skinny};
use crate::graph::{BuiltGraph, DependencyGraph, DependencyGraphBuilder, NodeId};
use crate::params::{KeyCell, KeyGuessGroup};
use crate::simulation::Simulation;
use std::collections::{BTreeMap, BTreeSet};

/// Initialize env_logger for tests. Safe to call multiple times.
pub fn init_logger() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Trace)
        .is_test(true)
        .try_init();
}

/// Build a SKINNY-64 dependency graph, panicking on invalid parameters.
pub fn skinny_graph(
    start_round: usize,
    final_round: usize,
    balanced_cell: usize,
    tracked_key_cell: usize,
) -> BuiltGraph {
    DependencyGraphBuilder::new(&Skinny::n64())
        .build(start_round, final_round, balanced_cell, tracked_key_cell)
        .unwrap()
}

/// Sorted `(round, cell)` coordinates of a set of nodes.
pub fn coordinates(graph: &DependencyGraph, nodes: &BTreeSet<NodeId>) -> Vec<(usize, usize)> {
    let mut result: Vec<(usize, usize)> = nodes
        .iter()
        .map(|it| (graph.node(*it).round, graph.node(*it).cell))
        .collect();
    result.sort();
    result
}

/// Create a guess order where each group is given as a list of `(round, cell)` pairs.
///
/// # Example
///
/// `key_order(&[&[(3, 6)], &[(3, 0), (3, 7)]])` guesses one cell, then two cells.
pub fn key_order(groups: &[&[(usize, usize)]]) -> Vec<KeyGuessGroup> {
    groups
        .iter()
        .map(|group| {
            group
                .iter()
                .map(|(round, cell)| KeyCell::new(*round, *cell))
                .collect()
        })
        .collect()
}

/// Repeatedly guess all current candidates (as far as the key budget allows) until no
/// candidates are left. Returns the groups that were guessed.
pub fn greedy_order<M: DiffusionModel>(
    model: &M,
    simulation: &mut Simulation,
) -> Vec<KeyGuessGroup> {
    let mut order = Vec::new();
    loop {
        let mut used: BTreeMap<usize, usize> = BTreeMap::new();
        let group: KeyGuessGroup = simulation
            .candidates()
            .into_iter()
            .filter(|it| {
                let key = model.key_schedule(it.round)[it.cell];
                let count = used.entry(key).or_default();
                *count += 1;
                *count <= simulation.usage().remaining(key)
            })
            .collect();
        if group.is_empty() {
            return order;
        }
        simulation.advance(&group).unwrap();
        order.push(group);
    }
}
