//! Forward analysis of which subkey cells a key recovery has to guess.
//!
//! When the key schedule reuses a physical key cell in several rounds, only `multiplicity`
//! of its occurrences need to be guessed: the remaining ones follow from the linear
//! schedule. The analysis walks the rounds from the last one backwards and classifies each
//! active subkey cell as required, interchangeable with one other occurrence, or free.
//! The resulting step count bounds the number of guess groups any solver needs to consider.

use crate::PartialSumError;
use crate::diffusion::{DiffusionModel, validate};
use crate::params::KeyCell;
use log::debug;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GuessBound {
    /// Subkey cells that must be guessed in any valid order.
    pub required: BTreeSet<KeyCell>,
    /// Pairs of occurrences of one key cell of which exactly one has to be guessed.
    pub pairs: Vec<[KeyCell; 2]>,
    /// An upper bound on the number of guess steps (one extra step for the initial
    /// reduction).
    pub max_steps: usize,
}

impl GuessBound {
    pub fn compute<M: DiffusionModel>(
        model: &M,
        start_round: usize,
        final_round: usize,
        balanced_cell: usize,
        tracked_key_cell: usize,
        multiplicity: usize,
    ) -> Result<GuessBound, PartialSumError> {
        validate(model, final_round)?;
        if start_round > final_round || balanced_cell >= model.cell_count() {
            return Err(PartialSumError::malformed(format!(
                "no balanced cell {} in rounds {}..={}",
                balanced_cell, start_round, final_round
            )));
        }
        if multiplicity == 0 {
            return Err(PartialSumError::malformed(
                "key cells must be guessable at least once",
            ));
        }

        let mut patterns = Vec::with_capacity(final_round - start_round + 1);
        let mut pattern = vec![false; model.cell_count()];
        pattern[balanced_cell] = true;
        for round in start_round..=final_round {
            let next = model.diffuse(round, &pattern);
            patterns.push(pattern);
            pattern = next;
        }

        let mut required = BTreeSet::new();
        let mut pairs = Vec::new();
        let mut seen: BTreeMap<usize, usize> = BTreeMap::new();
        let mut uncertain: BTreeMap<usize, Vec<KeyCell>> = BTreeMap::new();

        // The first round is covered by the distinguisher.
        for round in (start_round + 1..=final_round).rev() {
            let active = &patterns[round - start_round];
            let schedule = model.key_schedule(round);
            for cell in 0..model.keyed_cells() {
                let key = schedule[cell];
                if !active[cell] || key == tracked_key_cell {
                    continue;
                }
                let key_cell = KeyCell::new(round, cell);
                let count = seen.entry(key).or_default();
                *count += 1;
                if *count < multiplicity {
                    required.insert(key_cell);
                } else if *count == multiplicity {
                    uncertain.entry(key).or_default().push(key_cell);
                } else if *count == multiplicity + 1 {
                    let earlier = uncertain.entry(key).or_default();
                    if let Some(other) = earlier.last() {
                        pairs.push([*other, key_cell]);
                    }
                    earlier.push(key_cell);
                }
            }
        }

        // A single occurrence at the multiplicity limit has no alternative.
        for cells in uncertain.values() {
            if let [single] = cells.as_slice() {
                required.insert(*single);
            }
        }

        let max_steps = required.len() + pairs.len() + 1;
        debug!(
            "Guess bound for rounds {}..={}: {} required, {} interchangeable pair(s), at most {} step(s).",
            start_round,
            final_round,
            required.len(),
            pairs.len(),
            max_steps
        );
        Ok(GuessBound {
            required,
            pairs,
            max_steps,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::PartialSumError;
    use crate::bound::GuessBound;
    use crate::diffusion::Skinny;
    use crate::params::KeyCell;
    use std::collections::BTreeSet;

    fn cells(list: &[(usize, usize)]) -> BTreeSet<KeyCell> {
        list.iter().map(|(r, c)| KeyCell::new(*r, *c)).collect()
    }

    #[test]
    fn single_key_word_forms_pairs() -> Result<(), PartialSumError> {
        let bound = GuessBound::compute(&Skinny::n64(), 0, 3, 0, 0, 1)?;
        assert_eq!(bound.required, cells(&[(2, 5), (3, 0), (3, 7)]));
        assert_eq!(bound.pairs, vec![[KeyCell::new(3, 6), KeyCell::new(1, 4)]]);
        assert_eq!(bound.max_steps, 5);
        Ok(())
    }

    #[test]
    fn second_key_word_makes_pairs_required() -> Result<(), PartialSumError> {
        let bound = GuessBound::compute(&Skinny::n64(), 0, 3, 0, 0, 2)?;
        assert_eq!(
            bound.required,
            cells(&[(1, 4), (2, 5), (3, 0), (3, 6), (3, 7)])
        );
        assert!(bound.pairs.is_empty());
        assert_eq!(bound.max_steps, 6);
        Ok(())
    }

    #[test]
    fn other_balanced_cell() -> Result<(), PartialSumError> {
        let bound = GuessBound::compute(&Skinny::n64(), 0, 3, 3, 0, 1)?;
        assert_eq!(
            bound.required,
            cells(&[(1, 7), (2, 4), (3, 3), (3, 5), (3, 6)])
        );
        assert_eq!(bound.max_steps, 6);

        let longer = GuessBound::compute(&Skinny::n64(), 0, 6, 0, 0, 1)?;
        assert_eq!(longer.required.len(), 8);
        assert_eq!(longer.pairs.len(), 7);
        assert_eq!(longer.max_steps, 16);
        Ok(())
    }

    #[test]
    fn zero_multiplicity_is_rejected() {
        assert!(GuessBound::compute(&Skinny::n64(), 0, 3, 0, 0, 0).is_err());
        assert!(GuessBound::compute(&Skinny::n64(), 4, 3, 0, 0, 1).is_err());
    }
}
