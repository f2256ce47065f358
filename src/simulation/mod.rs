//! Step-by-step simulation of a partial-sum key recovery.
//!
//! A [`Simulation`] starts with a reduction that guesses nothing (step zero). Each further
//! step guesses one group of subkey cells, reduces the frontier again and accounts for the
//! costs of the step. Simulations are cheap to clone, so alternative guess orders can be
//! explored from a common prefix.
//!
//! # Example
//!
//! ```
//! use partial_sum_schedule::diffusion::Skinny;
//! use partial_sum_schedule::params::{AttackParameters, KeyCell};
//!
//! let order = vec![
//!     vec![KeyCell::new(3, 6)],
//!     vec![KeyCell::new(3, 0)],
//!     vec![KeyCell::new(3, 7)],
//!     vec![KeyCell::new(2, 5)],
//! ];
//! let parameters = AttackParameters::new(0, 3, 0, 0, 1).with_guess_order(order);
//! let trace = parameters.simulate(&Skinny::n64()).unwrap();
//! assert!(trace.summary.completed);
//! ```

mod simulation_config;


pub use simulation_config::SimulationConfig;

use crate::cost::{CostAccumulator, CostModel, CostSnapshot};
use crate::graph::{BuiltGraph, NodeId};
use crate::params::{KeyCell, KeyGuessGroup};
use crate::reduction::{KeyUsage, Reducer, ReducerConfig, ReducerState, Reduction};
use crate::trace::{CostSummary, LiveNode, Trace, TraceStep};
use crate::{PartialSumError, log_frontier};
use computation_process::Algorithm;
use log::info;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Debug)]
pub struct Simulation {
    /// The last committed reduction (graph, frontier, pending values and candidates).
    reduction: Reduction,
    usage: KeyUsage,
    costs: CostAccumulator,
    /// Input values that were computed at some point of this simulation.
    seen: BTreeSet<NodeId>,
    max_passes: usize,
    steps: Vec<TraceStep>,
}

impl Simulation {
    /// Start a simulation of the given graph and perform the initial reduction.
    pub fn new(
        built: BuiltGraph,
        costs: CostModel,
        usage: KeyUsage,
        config: SimulationConfig,
    ) -> Result<Simulation, PartialSumError> {
        let costs = match config.data_bound {
            Some(bound) => costs.with_data_bound(bound),
            None => costs,
        };
        let max_passes = config
            .max_passes
            .min(built.graph.node_count() + built.graph.edge_count() + 1);

        let mut seen = built.frontier.clone();
        let reduction = Reducer::run(
            ReducerConfig::new(usage.clone()).with_max_passes(max_passes),
            ReducerState::from(built),
        )?;
        let resolved = count_resolved(&reduction, &mut seen);
        let (costs, snapshot) = CostAccumulator::new(costs, reduction.footprint(), resolved);

        let mut simulation = Simulation {
            reduction,
            usage,
            costs,
            seen,
            max_passes,
            steps: Vec::new(),
        };
        let step = simulation.trace_step(Vec::new(), snapshot);
        info!(
            "[step:0] Initial reduction finished with ({}; pending={}; candidates={}).",
            log_frontier(&simulation.reduction.graph, &simulation.reduction.frontier),
            step.pending.len(),
            step.candidates.len()
        );
        simulation.steps.push(step);
        Ok(simulation)
    }

    /// Subkey cells that block the current frontier, ordered by round and cell.
    ///
    /// The guess budget of a step is consumed only after its reduction, so a candidate
    /// whose physical key cell was used up by that same step is still listed. Guessing it
    /// fails with [`PartialSumError::BudgetExceeded`]; see [`Simulation::usage`].
    pub fn candidates(&self) -> Vec<KeyCell> {
        let graph = &self.reduction.graph;
        let mut result: Vec<KeyCell> = self
            .reduction
            .candidates
            .iter()
            .map(|it| KeyCell::new(graph.node(*it).round, graph.node(*it).cell))
            .collect();
        result.sort();
        result
    }

    /// Remaining guess budget of every key cell.
    pub fn usage(&self) -> &KeyUsage {
        &self.usage
    }

    pub fn steps(&self) -> &[TraceStep] {
        &self.steps
    }

    /// True if no values remain resident.
    pub fn is_complete(&self) -> bool {
        self.reduction.frontier.is_empty() && self.reduction.pending.is_empty()
    }

    /// Guess one group of subkey cells and reduce the frontier.
    ///
    /// Every cell of the group must be a candidate exposed by the previous step, and no
    /// key cell can be guessed more often than its remaining budget allows. When an error
    /// is returned, the simulation stays in the state after the previous step.
    pub fn advance(&mut self, group: &[KeyCell]) -> Result<&TraceStep, PartialSumError> {
        let step = self.steps.len();
        let graph = &self.reduction.graph;

        let mut guessed = BTreeSet::new();
        let mut distinct = Vec::new();
        for key_cell in group {
            let node = self.reduction.candidates.iter().copied().find(|it| {
                let node = graph.node(*it);
                node.round == key_cell.round && node.cell == key_cell.cell
            });
            let Some(node) = node else {
                return Err(PartialSumError::GuessOrderMismatch {
                    step,
                    round: key_cell.round,
                    cell: key_cell.cell,
                });
            };
            if guessed.insert(node) {
                distinct.push(*key_cell);
            }
        }

        let mut per_key: BTreeMap<usize, usize> = BTreeMap::new();
        for node in &guessed {
            if let Some(key) = graph.node(*node).key {
                *per_key.entry(key).or_default() += 1;
            }
        }
        for (key, count) in &per_key {
            if *count > self.usage.remaining(*key) {
                return Err(PartialSumError::BudgetExceeded {
                    step,
                    key_cell: *key,
                    multiplicity: self.usage.multiplicity(),
                });
            }
        }

        let config = ReducerConfig::new(self.usage.clone())
            .with_guessed(guessed)
            .with_max_passes(self.max_passes);
        let state = ReducerState::new(
            self.reduction.graph.clone(),
            self.reduction.frontier.clone(),
            self.reduction.pending.clone(),
        );
        let reduction = Reducer::run(config, state)?;

        let resolved = count_resolved(&reduction, &mut self.seen);
        for (key, count) in per_key {
            for _ in 0..count {
                self.usage.consume(key);
            }
        }
        let snapshot = self
            .costs
            .record(distinct.len(), reduction.footprint(), resolved);
        self.reduction = reduction;

        let trace_step = self.trace_step(distinct, snapshot);
        info!(
            "[step:{}] Guessed {} subkey cell(s); reduced to ({}; pending={}; candidates={}; time=2^{:.2}).",
            step,
            trace_step.guessed.len(),
            log_frontier(&self.reduction.graph, &self.reduction.frontier),
            trace_step.pending.len(),
            trace_step.candidates.len(),
            trace_step.cost.total_time.log2()
        );
        self.steps.push(trace_step);
        Ok(&self.steps[step])
    }

    /// Guess all groups of `order` one after another and produce the final trace.
    pub fn run(mut self, order: &[KeyGuessGroup]) -> Result<Trace, PartialSumError> {
        for group in order {
            self.advance(group)?;
        }
        Ok(self.finish())
    }

    /// Produce the trace of all steps performed so far.
    pub fn finish(self) -> Trace {
        let total_time = self.costs.total_time();
        let summary = CostSummary {
            key_bits: self.costs.key_bits(),
            max_memory_bits: self.costs.max_memory_bits(),
            total_time,
            time_log2: (total_time > 0.0).then(|| total_time.log2()),
            completed: self.is_complete(),
        };
        info!(
            "Simulation finished after {} step(s) (keys=2^{}; memory=2^{}; time={}).",
            self.steps.len() - 1,
            summary.key_bits,
            summary.max_memory_bits,
            total_time
        );
        Trace {
            steps: self.steps,
            summary,
        }
    }

    fn trace_step(&self, guessed: Vec<KeyCell>, cost: CostSnapshot) -> TraceStep {
        let graph = &self.reduction.graph;
        let live = |nodes: &BTreeSet<NodeId>| {
            let mut result: Vec<LiveNode> = nodes
                .iter()
                .map(|it| LiveNode::from(graph.node(*it)))
                .collect();
            result.sort();
            result
        };
        TraceStep {
            step: self.steps.len(),
            guessed,
            frontier: live(&self.reduction.frontier),
            pending: live(&self.reduction.pending),
            candidates: self.candidates(),
            cost,
        }
    }
}

/// Count input values reached by a reduction that were never computed before, and
/// remember them.
fn count_resolved(reduction: &Reduction, seen: &mut BTreeSet<NodeId>) -> usize {
    reduction
        .reached
        .iter()
        .filter(|it| reduction.graph.node(**it).kind.is_input())
        .filter(|it| seen.insert(**it))
        .count()
}
