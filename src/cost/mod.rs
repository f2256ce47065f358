//! Data, memory, key-guess and time accounting of a partial-sum schedule.
//!
//! All figures except time are kept as exponents (bits). The time of a step is the number
//! of S-box evaluations it performs, normalized to full cipher evaluations:
//! `2^(key + data) * resolved / (cells * rounds)`, where `resolved` counts state cells whose
//! S-box is evaluated for the first time in this step.

use crate::diffusion::DiffusionModel;


/// Converts frontier sizes and guessed key cells into cost figures.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CostModel {
    pub cell_bits: u32,
    pub cell_count: usize,
    /// Number of rounds of a full cipher evaluation (`final_round + 1`).
    pub rounds: usize,
    /// Upper bound on the data cost of one step, in bits.
    pub data_bound: u64,
}

impl CostModel {
    /// Cost model of an attack on `model` up to `final_round`, where `input_active` cells
    /// are active in the distinguisher input and key cells are guessed up to
    /// `multiplicity` times.
    ///
    /// The data bound is `cell_bits * (cell_count - input_active + multiplicity)`.
    pub fn new<M: DiffusionModel>(
        model: &M,
        final_round: usize,
        input_active: usize,
        multiplicity: usize,
    ) -> CostModel {
        let cells = (model.cell_count() + multiplicity).saturating_sub(input_active);
        CostModel {
            cell_bits: model.cell_bits(),
            cell_count: model.cell_count(),
            rounds: final_round + 1,
            data_bound: u64::from(model.cell_bits()) * cells as u64,
        }
    }

    pub fn with_data_bound(mut self, data_bound: u64) -> CostModel {
        self.data_bound = data_bound;
        self
    }

    /// Data cost of keeping `resident` cells in memory.
    pub fn data_bits(&self, resident: usize) -> u64 {
        self.data_bound
            .min(u64::from(self.cell_bits).saturating_mul(resident as u64))
    }

    /// Key cost of guessing `cells` key cells.
    pub fn key_bits(&self, cells: usize) -> u64 {
        u64::from(self.cell_bits) * cells as u64
    }

    /// Time of a step which evaluates `resolved` S-boxes for every combination of
    /// `key_bits + data_bits` bits.
    pub fn step_time(&self, key_bits: u64, data_bits: u64, resolved: usize) -> f64 {
        if resolved == 0 {
            return 0.0;
        }
        let exponent = i32::try_from(key_bits + data_bits).unwrap_or(i32::MAX);
        2f64.powi(exponent) * resolved as f64 / self.evaluation_cells() as f64
    }

    /// Binary logarithm of the fraction of a full evaluation performed per combination.
    pub fn unit_log2(&self, resolved: usize) -> Option<f64> {
        if resolved == 0 {
            None
        } else {
            Some((resolved as f64 / self.evaluation_cells() as f64).log2())
        }
    }

    fn evaluation_cells(&self) -> usize {
        (self.cell_count * self.rounds).max(1)
    }
}

/// Costs of a single simulation step.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CostSnapshot {
    /// Data cost after this step.
    pub data_bits: u64,
    /// Key bits guessed up to and including this step.
    pub key_bits: u64,
    /// Memory needed after this step (`key_bits + data_bits`).
    pub memory_bits: u64,
    /// Exponent of the number of combinations processed by this step.
    pub time_bits: u64,
    /// Number of state cells computed for the first time in this step.
    pub resolved: usize,
    pub step_time: f64,
    pub total_time: f64,
}

/// Running totals of one simulation.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CostAccumulator {
    model: CostModel,
    data_bits: u64,
    key_bits: u64,
    max_memory_bits: u64,
    total_time: f64,
}

impl CostAccumulator {
    /// Start accounting with the frontier produced by the initial (unguessed) reduction.
    pub fn new(model: CostModel, resident: usize, resolved: usize) -> (CostAccumulator, CostSnapshot) {
        let data_bits = model.data_bits(resident);
        let accumulator = CostAccumulator {
            model,
            data_bits,
            key_bits: 0,
            max_memory_bits: data_bits,
            total_time: 0.0,
        };
        let snapshot = CostSnapshot {
            data_bits,
            key_bits: 0,
            memory_bits: data_bits,
            time_bits: data_bits,
            resolved,
            step_time: 0.0,
            total_time: 0.0,
        };
        (accumulator, snapshot)
    }

    pub fn model(&self) -> &CostModel {
        &self.model
    }

    /// Account for a step guessing `guessed` key cells, after which `resident` cells stay
    /// in memory and `resolved` state cells were computed for the first time.
    pub fn record(&mut self, guessed: usize, resident: usize, resolved: usize) -> CostSnapshot {
        let data_before = self.data_bits;
        self.key_bits += self.model.key_bits(guessed);
        let step_time = self.model.step_time(self.key_bits, data_before, resolved);
        self.total_time += step_time;

        self.data_bits = self.model.data_bits(resident);
        let memory_bits = self.key_bits + self.data_bits;
        self.max_memory_bits = self.max_memory_bits.max(memory_bits);

        CostSnapshot {
            data_bits: self.data_bits,
            key_bits: self.key_bits,
            memory_bits,
            time_bits: self.key_bits + data_before,
            resolved,
            step_time,
            total_time: self.total_time,
        }
    }

    pub fn key_bits(&self) -> u64 {
        self.key_bits
    }

    pub fn max_memory_bits(&self) -> u64 {
        self.max_memory_bits
    }

    pub fn total_time(&self) -> f64 {
        self.total_time
    }
}
