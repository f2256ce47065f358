use crate::PartialSumError;
use crate::diffusion::{DiffusionModel, validate};
use crate::graph::{DependencyGraph, NodeId, StateKind};
use log::{debug, info};
use std::collections::BTreeSet;

/// The result of [`DependencyGraphBuilder::build`]: the graph together with the
/// starting frontier of a partial-sum simulation.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BuiltGraph {
    pub graph: DependencyGraph,
    /// `Input` nodes of round `final_round + 1` that depend on the balanced cell.
    pub frontier: BTreeSet<NodeId>,
    /// `Subkey` nodes that use the tracked key cell.
    pub tracked: BTreeSet<NodeId>,
}

/// Constructs the [`DependencyGraph`] of all state cells influenced by a single balanced
/// cell over a range of rounds.
pub struct DependencyGraphBuilder<'a, M: DiffusionModel> {
    model: &'a M,
}

impl<'a, M: DiffusionModel> DependencyGraphBuilder<'a, M> {
    pub fn new(model: &'a M) -> DependencyGraphBuilder<'a, M> {
        DependencyGraphBuilder { model }
    }

    /// Build the dependency graph of rounds `start_round..=final_round`, starting with
    /// a single active `Input` cell `balanced_cell` in `start_round`.
    ///
    /// Subkey nodes whose physical key cell is `tracked_key_cell` are reported separately;
    /// they are never guessed, but must stay resident until absorbed.
    pub fn build(
        &self,
        start_round: usize,
        final_round: usize,
        balanced_cell: usize,
        tracked_key_cell: usize,
    ) -> Result<BuiltGraph, PartialSumError> {
        let model = self.model;
        validate(model, final_round)?;

        let cells = model.cell_count();
        if start_round > final_round {
            return Err(PartialSumError::malformed(format!(
                "start round {} is after final round {}",
                start_round, final_round
            )));
        }
        if balanced_cell >= cells {
            return Err(PartialSumError::malformed(format!(
                "balanced cell {} is outside of the {}-cell state",
                balanced_cell, cells
            )));
        }
        if tracked_key_cell >= model.key_cell_count() {
            return Err(PartialSumError::malformed(format!(
                "tracked key cell {} is outside of the {}-cell key",
                tracked_key_cell,
                model.key_cell_count()
            )));
        }

        let bits = model.cell_bits();
        let mut graph = DependencyGraph::default();
        let mut tracked = BTreeSet::new();
        let mut current: Vec<Option<NodeId>> = vec![None; cells];
        current[balanced_cell] = Some(graph.add_node(
            start_round,
            StateKind::Input,
            balanced_cell,
            bits,
            None,
        ));

        for round in start_round..=final_round {
            let schedule = model.key_schedule(round);

            // Input -> Subkey (key-mixed cells only, the rest passes through).
            let mut keyed: Vec<Option<NodeId>> = vec![None; cells];
            for (cell, input) in current.iter().enumerate() {
                let Some(input) = *input else {
                    continue;
                };
                if cell >= model.keyed_cells() {
                    keyed[cell] = Some(input);
                    continue;
                }
                let key = schedule[cell];
                let subkey = graph.add_node(round, StateKind::Subkey, cell, bits, Some(key));
                graph.add_edge(subkey, input);
                if key == tracked_key_cell {
                    tracked.insert(subkey);
                }
                keyed[cell] = Some(subkey);
            }

            // Subkey -> PostKeyMix
            let mut mixed: Vec<Option<NodeId>> = vec![None; cells];
            for (cell, source) in keyed.iter().enumerate() {
                if let Some(source) = *source {
                    let node = graph.add_node(round, StateKind::PostKeyMix, cell, bits, None);
                    graph.add_edge(node, source);
                    mixed[cell] = Some(node);
                }
            }

            // PostKeyMix -> Diffused
            let mut diffused: Vec<Option<NodeId>> = vec![None; cells];
            for (cell, source) in model.permutation().iter().enumerate() {
                if let Some(source) = mixed[*source] {
                    let node = graph.add_node(round, StateKind::Diffused, cell, bits, None);
                    graph.add_edge(node, source);
                    diffused[cell] = Some(node);
                }
            }

            // Diffused -> Input of the next round
            let mut next: Vec<Option<NodeId>> = vec![None; cells];
            for (cell, source) in diffused.iter().enumerate() {
                let Some(source) = *source else {
                    continue;
                };
                for target in model.mixing_targets(cell) {
                    let input = match next[target] {
                        Some(input) => input,
                        None => {
                            let input =
                                graph.add_node(round + 1, StateKind::Input, target, bits, None);
                            next[target] = Some(input);
                            input
                        }
                    };
                    graph.add_edge(input, source);
                }
            }

            debug!(
                "[round:{}] {} active input cells after diffusion.",
                round,
                next.iter().flatten().count()
            );
            current = next;
        }

        if !graph.is_topologically_ordered() {
            return Err(PartialSumError::malformed(
                "an edge does not point to an earlier state node",
            ));
        }

        let frontier: BTreeSet<NodeId> = current.into_iter().flatten().collect();
        info!(
            "Built dependency graph for rounds {}..={} (nodes={}; edges={}; frontier={}; tracked={}).",
            start_round,
            final_round,
            graph.node_count(),
            graph.edge_count(),
            frontier.len(),
            tracked.len()
        );

        Ok(BuiltGraph {
            graph,
            frontier,
            tracked,
        })
    }
}
