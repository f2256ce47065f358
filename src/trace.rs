//! Structured output of a simulation.
//!
//! The records here are plain data. They carry everything needed to render the recovery
//! steps (which values are resident, which keys are guessed, what each step costs), but
//! no rendering beyond a compact plain-text table.

use crate::cost::CostSnapshot;
use crate::graph::{StateKind, StateNode};
use crate::params::KeyCell;
use std::cmp::{Ordering, Reverse};
use std::fmt;

/// A resident state value, identified by its position in the cipher.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LiveNode {
    pub round: usize,
    pub kind: StateKind,
    pub cell: usize,
    pub key: Option<usize>,
}

impl LiveNode {
    fn sort_key(&self) -> (Reverse<usize>, Reverse<StateKind>, usize) {
        (Reverse(self.round), Reverse(self.kind), self.cell)
    }
}

/// Rendering order: latest round first, within a round the values computed last first,
/// then by cell.
impl Ord for LiveNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key()
            .cmp(&other.sort_key())
            .then(self.key.cmp(&other.key))
    }
}

impl PartialOrd for LiveNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<&StateNode> for LiveNode {
    fn from(value: &StateNode) -> Self {
        LiveNode {
            round: value.round,
            kind: value.kind,
            cell: value.cell,
            key: value.key,
        }
    }
}

/// One step of a simulation: the guessed group and the state after reducing it.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TraceStep {
    pub step: usize,
    /// Distinct key cells guessed in this step (empty for the initial reduction).
    pub guessed: Vec<KeyCell>,
    /// Resident values after this step, in rendering order.
    pub frontier: Vec<LiveNode>,
    /// Tracked subkey values that were not absorbed yet.
    pub pending: Vec<LiveNode>,
    /// Key cells that can be guessed in the next step.
    pub candidates: Vec<KeyCell>,
    pub cost: CostSnapshot,
}

/// Aggregate complexity of a whole simulation.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CostSummary {
    pub key_bits: u64,
    pub max_memory_bits: u64,
    pub total_time: f64,
    /// `log2(total_time)`, absent when no S-box was evaluated.
    pub time_log2: Option<f64>,
    /// True if the last step leaves no resident values.
    pub completed: bool,
}

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trace {
    pub steps: Vec<TraceStep>,
    pub summary: CostSummary,
}

/// Format values grouped by round and kind, e.g. `X_3[10, 12]; Z_3[0, 6]`.
pub fn format_nodes(nodes: &[LiveNode]) -> String {
    let mut sorted = nodes.to_vec();
    sorted.sort();
    let mut groups: Vec<(usize, StateKind, Vec<String>)> = Vec::new();
    for node in sorted {
        match groups.last_mut() {
            Some((round, kind, cells)) if *round == node.round && *kind == node.kind => {
                cells.push(node.cell.to_string());
            }
            _ => groups.push((node.round, node.kind, vec![node.cell.to_string()])),
        }
    }
    groups
        .into_iter()
        .map(|(round, kind, cells)| format!("{}_{}[{}]", kind, round, cells.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

fn format_keys(keys: &[KeyCell]) -> String {
    if keys.is_empty() {
        return "--".to_string();
    }
    let nodes: Vec<LiveNode> = keys
        .iter()
        .map(|it| LiveNode {
            round: it.round,
            kind: StateKind::Subkey,
            cell: it.cell,
            key: None,
        })
        .collect();
    format_nodes(&nodes)
}

impl fmt::Display for TraceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stored = format_nodes(&self.frontier);
        if !self.pending.is_empty() {
            if !stored.is_empty() {
                stored.push_str("; ");
            }
            stored.push_str(&format_nodes(&self.pending));
        }
        write!(
            f,
            "{:>4} | {:<24} | 2^{:<3} | 2^{:<3} | 2^{:<3} | 2^{:<3} | {}",
            self.step,
            format_keys(&self.guessed),
            self.cost.key_bits,
            self.cost.data_bits,
            self.cost.memory_bits,
            self.cost.time_bits,
            stored
        )
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>4} | {:<24} | {:<5} | {:<5} | {:<5} | {:<5} | Stored",
            "Step", "Guessed", "Keys", "Data", "Memo", "Time"
        )?;
        for step in &self.steps {
            writeln!(f, "{}", step)?;
        }
        let time = match self.summary.time_log2 {
            Some(bits) => format!("2^{:.2}", bits),
            None => "0".to_string(),
        };
        write!(
            f,
            "Sum: keys 2^{}, memory 2^{}, time {}{}",
            self.summary.key_bits,
            self.summary.max_memory_bits,
            time,
            if self.summary.completed {
                ""
            } else {
                " (incomplete)"
            }
        )
    }
}
