//! Diffusion-layer and key-schedule descriptions of supported ciphers.
//!
//! A [`DiffusionModel`] captures only the parts of a round that matter for partial-sum
//! key recovery: which cells receive round-key material, how cells are permuted, how
//! the linear layer mixes them, and which physical key cell lands on which position in
//! each round. The non-linear layer is deliberately absent.
//!
//! Activity patterns are combined by logical OR. Two active cells mixed together are
//! treated as active, even if their contributions could cancel out.

mod skinny;


use crate::PartialSumError;
pub use skinny::Skinny;

/// Describes one round of the diffusion layer and the key schedule of a cipher.
///
/// The round function is modelled as `Input -(key mixing)-> PostKeyMix
/// -(permutation)-> Diffused -(mixing)-> Input of the next round`. Key material is added
/// to the first [`DiffusionModel::keyed_cells`] positions only.
pub trait DiffusionModel {
    /// Number of cells in the cipher state.
    fn cell_count(&self) -> usize;

    /// Number of leading state cells that receive round-key material.
    fn keyed_cells(&self) -> usize;

    /// Number of physical key cells that the key schedule permutes.
    fn key_cell_count(&self) -> usize;

    /// Width of a single cell in bits.
    fn cell_bits(&self) -> u32;

    /// Cell permutation: `Diffused[i] = PostKeyMix[permutation()[i]]`.
    fn permutation(&self) -> &[usize];

    /// The next-round `Input` cells that depend on the given `Diffused` cell.
    ///
    /// The order of the returned cells is the order in which dependency edges are created.
    fn mixing_targets(&self, cell: usize) -> Vec<usize>;

    /// The key-schedule permutation of the given round, mapping each state position to
    /// the physical key cell that is added there. Only the first
    /// [`DiffusionModel::keyed_cells`] entries are used.
    fn key_schedule(&self, round: usize) -> Vec<usize>;

    /// Number of `Diffused` cells an `Input` cell depends on.
    fn fan_in(&self, cell: usize) -> usize {
        (0..self.cell_count())
            .filter(|source| self.mixing_targets(*source).contains(&cell))
            .count()
    }

    /// Maximum number of output cells made dependent on one input cell by the mixing layer.
    fn branch_number(&self) -> usize {
        (0..self.cell_count())
            .map(|cell| self.mixing_targets(cell).len())
            .max()
            .unwrap_or(0)
    }

    /// Apply the cell permutation to an activity pattern.
    fn permute(&self, pattern: &[bool]) -> Vec<bool> {
        self.permutation().iter().map(|i| pattern[*i]).collect()
    }

    /// Apply the mixing layer to an activity pattern.
    fn mix(&self, pattern: &[bool]) -> Vec<bool> {
        let mut result = vec![false; self.cell_count()];
        for (cell, active) in pattern.iter().enumerate() {
            if *active {
                for target in self.mixing_targets(cell) {
                    result[target] = true;
                }
            }
        }
        result
    }

    /// Propagate an `Input` activity pattern of the given round to the `Input` pattern
    /// of the next round.
    fn diffuse(&self, _round: usize, pattern: &[bool]) -> Vec<bool> {
        self.mix(&self.permute(pattern))
    }
}

/// Check that the tables of a [`DiffusionModel`] describe a well-formed round function
/// for every round in `0..=final_round`.
pub fn validate<M: DiffusionModel>(model: &M, final_round: usize) -> Result<(), PartialSumError> {
    let cells = model.cell_count();
    if cells == 0 {
        return Err(PartialSumError::malformed("the state has no cells"));
    }
    if model.keyed_cells() > cells {
        return Err(PartialSumError::malformed(format!(
            "{} keyed cells exceed the state size {}",
            model.keyed_cells(),
            cells
        )));
    }

    if !is_permutation(model.permutation(), cells) {
        return Err(PartialSumError::malformed(format!(
            "cell permutation {:?} is not a permutation of {} cells",
            model.permutation(),
            cells
        )));
    }

    for cell in 0..cells {
        let targets = model.mixing_targets(cell);
        if let Some(target) = targets.iter().find(|it| **it >= cells) {
            return Err(PartialSumError::malformed(format!(
                "cell {} mixes into non-existent cell {}",
                cell, target
            )));
        }
        let mut unique = targets.clone();
        unique.sort_unstable();
        unique.dedup();
        if unique.len() != targets.len() {
            return Err(PartialSumError::malformed(format!(
                "cell {} mixes into {:?} more than once",
                cell, targets
            )));
        }
    }

    for round in 0..=final_round {
        let schedule = model.key_schedule(round);
        if !is_permutation(&schedule, model.key_cell_count()) {
            return Err(PartialSumError::malformed(format!(
                "key schedule of round {} is not a permutation of {} key cells",
                round,
                model.key_cell_count()
            )));
        }
        if schedule.len() < model.keyed_cells() {
            return Err(PartialSumError::malformed(format!(
                "key schedule of round {} covers fewer than {} keyed cells",
                round,
                model.keyed_cells()
            )));
        }
    }

    Ok(())
}

fn is_permutation(table: &[usize], size: usize) -> bool {
    let mut seen = vec![false; size];
    table.len() == size
        && table.iter().all(|it| {
            if *it < size && !seen[*it] {
                seen[*it] = true;
                true
            } else {
                false
            }
        })
}
