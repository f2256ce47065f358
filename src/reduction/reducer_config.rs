use crate::graph::NodeId;
use std::collections::BTreeSet;

/// Remaining guess budget of every physical key cell.
///
/// Each key cell can be guessed at most `multiplicity` times over a whole simulation
/// (once per independent tweakey word that has to be recovered).
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeyUsage {
    multiplicity: usize,
    remaining: Vec<usize>,
}

impl KeyUsage {
    /// A fresh budget of `multiplicity` guesses for each of `key_cells` cells.
    pub fn new(key_cells: usize, multiplicity: usize) -> KeyUsage {
        KeyUsage {
            multiplicity,
            remaining: vec![multiplicity; key_cells],
        }
    }

    pub fn multiplicity(&self) -> usize {
        self.multiplicity
    }

    /// Remaining guesses of a key cell (zero for unknown cells).
    pub fn remaining(&self, key_cell: usize) -> usize {
        self.remaining.get(key_cell).copied().unwrap_or(0)
    }

    /// Use up one guess of a key cell. Returns `false` when no budget is left.
    pub fn consume(&mut self, key_cell: usize) -> bool {
        match self.remaining.get_mut(key_cell) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

/// A "flat" configuration object of a single reduction.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReducerConfig {
    /// Subkey nodes that are guessed in the current step (default: empty). These never
    /// block the reduction.
    pub guessed: BTreeSet<NodeId>,
    /// Remaining guess budget. Subkey nodes of exhausted key cells never block the
    /// reduction.
    pub usage: KeyUsage,
    /// Cancel the procedure if it exceeds the specified number of passes (default:
    /// `usize::MAX`).
    pub max_passes: usize,
}

impl From<KeyUsage> for ReducerConfig {
    fn from(value: KeyUsage) -> Self {
        ReducerConfig::new(value)
    }
}

impl ReducerConfig {
    /// Create a new instance of [`ReducerConfig`] with no guessed subkeys.
    pub fn new(usage: KeyUsage) -> ReducerConfig {
        ReducerConfig {
            guessed: BTreeSet::new(),
            usage,
            max_passes: usize::MAX,
        }
    }

    /// Update the set of subkey nodes guessed in this step.
    pub fn with_guessed(mut self, guessed: BTreeSet<NodeId>) -> ReducerConfig {
        self.guessed = guessed;
        self
    }

    pub fn with_max_passes(mut self, max_passes: usize) -> ReducerConfig {
        self.max_passes = max_passes;
        self
    }
}
