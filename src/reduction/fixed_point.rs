use crate::graph::{EdgeId, NodeId};
use crate::reduction::{
    PredecessorOrder, ReducerConfig, ReducerState, Reduction, ReductionSnapshot,
};
use crate::{log_frontier, simple_type_name};
use cancel_this::{Cancellable, Cancelled, is_cancelled};
use computation_process::Incomplete::Suspended;
use computation_process::{Completable, ComputationStep};
use log::{debug, trace};
use std::collections::{BTreeSet, HashMap};
use std::marker::PhantomData;

/// A [`ComputationStep`] that performs one reduction pass per call and completes once
/// the frontier reaches a fixed point (or becomes empty).
pub struct FixedPointPass<O: PredecessorOrder>(PhantomData<O>);

impl<O: PredecessorOrder> ComputationStep<ReducerConfig, ReducerState, Reduction>
    for FixedPointPass<O>
{
    fn step(context: &ReducerConfig, state: &mut ReducerState) -> Completable<Reduction> {
        if state.pass >= context.max_passes {
            debug!(
                "[pass:{}] FixedPoint<{}> canceled (exceeded pass count).",
                state.pass,
                simple_type_name::<O>()
            );

            return Err(Cancelled::new("ReducerConfig::max_passes").into());
        } else {
            state.pass += 1;
        }

        let next = reduction_pass::<O>(context, state)?;

        if next.len() + state.pending.len() <= state.best.footprint() {
            state.best = ReductionSnapshot {
                pass: state.pass,
                frontier: next.clone(),
                pending: state.pending.clone(),
                reached: state.reached.clone(),
                mask: state.graph.edge_mask(),
            };
        }

        if next == state.frontier || next.is_empty() {
            debug!(
                "[pass:{}] FixedPoint<{}> finished; committing pass {} with ({}; pending={}).",
                state.pass,
                simple_type_name::<O>(),
                state.best.pass,
                log_frontier(&state.graph, &state.best.frontier),
                state.best.pending.len()
            );

            Ok(state.finish())
        } else {
            debug!(
                "[pass:{}] FixedPoint<{}> changed to ({}; pending={}).",
                state.pass,
                simple_type_name::<O>(),
                log_frontier(&state.graph, &next),
                state.pending.len()
            );

            state.frontier = next;
            Err(Suspended)
        }
    }
}

/// Compute the frontier that replaces `state.frontier` after one pass.
///
/// Prunes the consumed edges in `state.graph` and updates the pending, candidate and
/// reached sets along the way.
fn reduction_pass<O: PredecessorOrder>(
    context: &ReducerConfig,
    state: &mut ReducerState,
) -> Cancellable<BTreeSet<NodeId>> {
    let graph = &mut state.graph;

    let mut count: HashMap<NodeId, usize> = HashMap::new();
    for node in &state.frontier {
        for predecessor in graph.live_predecessors(*node) {
            count.insert(predecessor, graph.incoming_amount(predecessor));
        }
    }

    let mut next = BTreeSet::new();
    for node in state.frontier.iter().copied() {
        is_cancelled!()?;
        let live: Vec<EdgeId> = graph.live_predecessor_edges(node).collect();
        for edge in O::visit_order(live) {
            // Edges can be consumed while absorbing an earlier predecessor.
            if !graph.is_live(edge) {
                continue;
            }
            let predecessor = graph.edge(edge).predecessor;
            let Some(remaining) = count.get_mut(&predecessor) else {
                continue;
            };
            *remaining = remaining.saturating_sub(1);
            if *remaining > 0 {
                next.insert(node);
                continue;
            }

            let is_pending = state.pending.contains(&predecessor);
            let blocks = match graph.node(predecessor).key {
                Some(key) => {
                    !context.guessed.contains(&predecessor)
                        && context.usage.remaining(key) > 0
                        && !is_pending
                }
                None => false,
            };

            if blocks {
                next.insert(node);
                if state.candidates.insert(predecessor) {
                    trace!("Guess candidate {} exposed.", graph.node(predecessor));
                }
                continue;
            }

            if is_pending {
                state.pending.remove(&predecessor);
            }
            next.insert(predecessor);
            state.reached.insert(predecessor);
            graph.prune(edge);
            trace!(
                "Node {} absorbed through {}.",
                graph.node(predecessor),
                graph.node(node)
            );

            // Nodes that are already resident no longer need the absorbed value.
            let resident: Vec<NodeId> = next.iter().copied().collect();
            for other in resident {
                if let Some(shared) = graph.live_edge_between(other, predecessor) {
                    graph.prune(shared);
                    if graph.live_predecessor_edges(other).next().is_none() {
                        next.remove(&other);
                    }
                }
            }
        }
    }

    Ok(next)
}
