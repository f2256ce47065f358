use crate::graph::{DependencyGraph, NodeId};
use crate::reduction::{
    InsertionOrderReducer, KeyUsage, Reducer, ReducerConfig, ReducerState, Reduction,
};
use crate::test_utils::{coordinates, init_logger, skinny_graph};
use cancel_this::Cancellable;
use computation_process::{Algorithm, Computable, Stateful};
use std::collections::BTreeSet;

fn initial_reduction(tracked_key_cell: usize) -> Cancellable<Reduction> {
    let built = skinny_graph(0, 3, 0, tracked_key_cell);
    Reducer::run(KeyUsage::new(16, 1), built)
}

fn find(graph: &DependencyGraph, set: &BTreeSet<NodeId>, round: usize, cell: usize) -> NodeId {
    *set.iter()
        .find(|it| graph.node(**it).round == round && graph.node(**it).cell == cell)
        .unwrap()
}

#[test]
fn reduction_exposes_first_candidates() -> Cancellable<()> {
    init_logger();
    let reduction = initial_reduction(0)?;
    let graph = &reduction.graph;

    assert_eq!(reduction.frontier.len(), 7);
    assert_eq!(reduction.pending.len(), 1);
    assert_eq!(reduction.footprint(), 8);
    assert_eq!(reduction.passes, 4);
    assert_eq!(graph.live_edge_count(), 30);
    assert_eq!(
        coordinates(graph, &reduction.candidates),
        vec![(3, 0), (3, 6), (3, 7)]
    );
    assert!(
        reduction
            .candidates
            .iter()
            .all(|it| graph.node(*it).kind.is_subkey())
    );

    // The last round is stripped up to the post-key-mix values of the keyed cells.
    let frontier: Vec<String> = reduction
        .frontier
        .iter()
        .map(|it| graph.node(*it).to_string())
        .collect();
    let mut frontier_sorted = frontier.clone();
    frontier_sorted.sort();
    assert_eq!(
        frontier_sorted,
        vec!["X_3_10", "X_3_12", "X_3_14", "X_3_15", "Z_3_0", "Z_3_6", "Z_3_7"]
    );

    // Four new inputs of round 3 were computed.
    let inputs = reduction
        .reached
        .iter()
        .filter(|it| graph.node(**it).kind.is_input())
        .count();
    assert_eq!(inputs, 4);
    Ok(())
}

#[test]
fn tracked_subkey_stays_pending() -> Cancellable<()> {
    let tracked = initial_reduction(0)?;
    let untracked = initial_reduction(3)?;
    let graph = &tracked.graph;

    let pending: Vec<String> = tracked
        .pending
        .iter()
        .map(|it| graph.node(*it).to_string())
        .collect();
    assert_eq!(pending, vec!["STK_0_0"]);
    assert!(untracked.pending.is_empty());
    assert_eq!(untracked.frontier.len(), tracked.frontier.len());
    Ok(())
}

#[test]
fn reduction_is_idempotent() -> Cancellable<()> {
    init_logger();
    let first = initial_reduction(0)?;
    let frontier = first.frontier.clone();
    let pending = first.pending.clone();
    let mask = first.graph.edge_mask();

    let second = Reducer::run(KeyUsage::new(16, 1), first)?;
    assert_eq!(second.frontier, frontier);
    assert_eq!(second.pending, pending);
    assert_eq!(second.graph.edge_mask(), mask);
    assert_eq!(second.passes, 1);
    Ok(())
}

#[test]
fn reduction_never_adds_edges() -> Cancellable<()> {
    let built = skinny_graph(0, 4, 1, 0);
    let before: Vec<usize> = built
        .graph
        .node_ids()
        .map(|it| built.graph.live_predecessor_edges(it).count())
        .collect();
    let total = built.graph.live_edge_count();

    let mut reduction = Reducer::run(KeyUsage::new(16, 1), built)?;
    for _ in 0..3 {
        let after: Vec<usize> = reduction
            .graph
            .node_ids()
            .map(|it| reduction.graph.live_predecessor_edges(it).count())
            .collect();
        assert!(before.iter().zip(&after).all(|(b, a)| a <= b));
        assert!(reduction.graph.live_edge_count() <= total);

        let guessed = reduction.candidates.iter().copied().take(1).collect();
        let config = ReducerConfig::new(KeyUsage::new(16, 1)).with_guessed(guessed);
        reduction = Reducer::run(config, reduction)?;
    }
    Ok(())
}

#[test]
fn guessed_subkey_is_absorbed() -> Cancellable<()> {
    init_logger();
    let first = initial_reduction(0)?;
    let guessed = find(&first.graph, &first.candidates, 3, 6);
    let config = ReducerConfig::new(KeyUsage::new(16, 1)).with_guessed(BTreeSet::from([guessed]));

    let second = Reducer::run(config, first)?;
    assert_eq!(second.frontier.len(), 5);
    assert_eq!(second.pending.len(), 1);
    assert!(second.reached.contains(&guessed));
    assert!(!second.candidates.contains(&guessed));
    assert_eq!(
        coordinates(&second.graph, &second.candidates),
        vec![(2, 5), (3, 0), (3, 7)]
    );
    Ok(())
}

#[test]
fn exhausted_budget_reduces_everything() -> Cancellable<()> {
    let built = skinny_graph(0, 3, 0, 0);
    let reduction = Reducer::run(KeyUsage::new(16, 0), built)?;
    assert!(reduction.frontier.is_empty());
    assert!(reduction.pending.is_empty());
    assert!(reduction.candidates.is_empty());
    assert_eq!(reduction.graph.live_edge_count(), 0);
    assert_eq!(reduction.passes, 17);
    Ok(())
}

#[test]
fn insertion_order_reaches_a_fixed_point() -> Cancellable<()> {
    let built = skinny_graph(0, 3, 0, 0);
    let reduction = InsertionOrderReducer::run(KeyUsage::new(16, 1), built)?;
    assert_eq!(reduction.footprint(), 8);
    assert_eq!(
        coordinates(&reduction.graph, &reduction.candidates),
        vec![(3, 0), (3, 6), (3, 7)]
    );
    Ok(())
}

#[test]
fn pass_limit_cancels_reduction() {
    let built = skinny_graph(0, 3, 0, 0);
    let config = ReducerConfig::new(KeyUsage::new(16, 1)).with_max_passes(2);
    assert!(Reducer::run(config, built).is_err());
}

#[test]
fn reduction_can_be_stepped() {
    let built = skinny_graph(0, 3, 0, 0);
    let mut computation = <Reducer as Stateful<ReducerConfig, ReducerState>>::configure(
        KeyUsage::new(16, 1),
        built,
    );
    let reduction = loop {
        if let Ok(result) = computation.try_compute() {
            break result;
        }
    };
    assert_eq!(reduction.passes, 4);
    assert_eq!(reduction.footprint(), 8);
}

#[test]
fn key_usage_budget() {
    let mut usage = KeyUsage::new(4, 2);
    assert_eq!(usage.multiplicity(), 2);
    assert!(usage.consume(1));
    assert!(usage.consume(1));
    assert!(!usage.consume(1));
    assert_eq!(usage.remaining(1), 0);
    assert_eq!(usage.remaining(0), 2);
    assert_eq!(usage.remaining(10), 0);
    assert!(!usage.consume(10));
}

fn names(graph: &DependencyGraph, set: &BTreeSet<NodeId>) -> Vec<String> {
    let mut result: Vec<String> = set.iter().map(|it| graph.node(*it).to_string()).collect();
    result.sort();
    result
}

/// Rounds 0 to 4 with balanced cell 6: the footprint drops to 15 in pass 3, stays there in
/// pass 4, grows back to 16 and the fixed point is only reached in pass 8.
#[test]
fn smaller_intermediate_pass_is_committed() -> Cancellable<()> {
    init_logger();
    let built = skinny_graph(0, 4, 6, 0);
    assert_eq!(built.frontier.len() + built.tracked.len(), 18);

    let reduction = Reducer::run(KeyUsage::new(16, 1), built)?;
    let graph = &reduction.graph;
    assert_eq!(reduction.passes, 8);
    assert_eq!(reduction.committed_pass, 4);
    assert_eq!(reduction.footprint(), 15);
    assert_eq!(graph.live_edge_count(), 114);
    assert_eq!(
        names(graph, &reduction.frontier),
        vec![
            "X_4_10", "X_4_11", "X_4_12", "X_4_13", "X_4_14", "X_4_15", "X_4_4", "Z_4_0",
            "Z_4_1", "Z_4_2", "Z_4_3", "Z_4_5", "Z_4_6", "Z_4_7"
        ]
    );
    assert_eq!(names(graph, &reduction.pending), vec!["STK_2_2"]);

    // Subkey 3/0 is only exposed by the discarded passes.
    assert_eq!(
        coordinates(graph, &reduction.candidates),
        vec![(4, 0), (4, 1), (4, 2), (4, 3), (4, 5), (4, 6), (4, 7)]
    );
    for candidate in &reduction.candidates {
        assert!(
            reduction
                .frontier
                .iter()
                .any(|node| graph.live_edge_between(*node, *candidate).is_some())
        );
    }

    // Nothing that the committed frontier still has to compute counts as reached.
    let inputs = reduction
        .reached
        .iter()
        .filter(|it| graph.node(**it).kind.is_input())
        .count();
    assert_eq!(inputs, 7);
    for node in &reduction.frontier {
        assert!(graph.live_predecessors(*node).all(|it| !reduction.reached.contains(&it)));
    }
    Ok(())
}

#[test]
fn committed_intermediate_pass_is_a_fixed_point() -> Cancellable<()> {
    let first = Reducer::run(KeyUsage::new(16, 1), skinny_graph(0, 4, 6, 0))?;
    let frontier = first.frontier.clone();
    let pending = first.pending.clone();
    let candidates = first.candidates.clone();
    let mask = first.graph.edge_mask();

    let second = Reducer::run(KeyUsage::new(16, 1), first)?;
    assert_eq!(second.passes, 4);
    assert_eq!(second.frontier, frontier);
    assert_eq!(second.pending, pending);
    assert_eq!(second.candidates, candidates);
    assert_eq!(second.graph.edge_mask(), mask);
    Ok(())
}
