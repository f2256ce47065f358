use crate::graph::{DependencyGraph, NodeId};
use std::collections::BTreeSet;

#[cfg(test)]
mod test_utils;

pub mod bound;
pub mod cost;
pub mod diffusion;
mod error;
pub mod graph;
pub mod params;
pub mod reduction;
pub mod simulation;
pub mod trace;

pub use error::PartialSumError;

/// A utility method for printing useful metadata of a frontier.
fn log_frontier(graph: &DependencyGraph, frontier: &BTreeSet<NodeId>) -> String {
    format!(
        "nodes={}; inputs={}; live edges={}",
        frontier.len(),
        frontier
            .iter()
            .filter(|it| graph.node(**it).kind.is_input())
            .count(),
        graph.live_edge_count()
    )
}

/// Extract the "simple name" of a type argument at compile time.
///
/// In the future, this should be a `const fn`, but `type_name` and `unwrap_or` are not
/// yet stabilized as `const` functions (even thought they probably are).
fn simple_type_name<T>() -> &'static str {
    std::any::type_name::<T>().split("::").last().unwrap_or("?")
}
