use cancel_this::Cancelled;
use std::fmt;

/// Errors reported while building a dependency graph or simulating a guess order.
///
/// None of these is recoverable inside the engine: continuing after any of them would
/// produce a cost estimate that does not correspond to a valid attack.
#[derive(Debug)]
pub enum PartialSumError {
    /// The diffusion tables or the attack parameters do not describe a finite acyclic
    /// dependency structure.
    MalformedGraph { reason: String },
    /// A guess group names a subkey cell which the reduction did not expose as a candidate
    /// at this step. The externally computed order does not match the cipher.
    GuessOrderMismatch {
        step: usize,
        round: usize,
        cell: usize,
    },
    /// A key cell is guessed more often than its declared multiplicity allows.
    BudgetExceeded {
        step: usize,
        key_cell: usize,
        multiplicity: usize,
    },
    /// The reduction was cancelled, either cooperatively or because it exceeded its
    /// pass limit.
    Cancelled(Cancelled),
}

impl PartialSumError {
    pub(crate) fn malformed(reason: impl Into<String>) -> PartialSumError {
        PartialSumError::MalformedGraph {
            reason: reason.into(),
        }
    }
}

impl From<Cancelled> for PartialSumError {
    fn from(value: Cancelled) -> Self {
        PartialSumError::Cancelled(value)
    }
}

impl fmt::Display for PartialSumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartialSumError::MalformedGraph { reason } => {
                write!(f, "Malformed dependency graph: {}", reason)
            }
            PartialSumError::GuessOrderMismatch { step, round, cell } => {
                write!(
                    f,
                    "Step {}: subkey cell (round {}, cell {}) is not a guess candidate",
                    step, round, cell
                )
            }
            PartialSumError::BudgetExceeded {
                step,
                key_cell,
                multiplicity,
            } => {
                write!(
                    f,
                    "Step {}: key cell {} guessed more than {} time(s)",
                    step, key_cell, multiplicity
                )
            }
            PartialSumError::Cancelled(cancelled) => {
                write!(f, "Reduction cancelled: {}", cancelled)
            }
        }
    }
}

impl std::error::Error for PartialSumError {}
