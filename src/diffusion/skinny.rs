use crate::diffusion::DiffusionModel;

/// `ShiftRows` as a gather table: `Diffused[i] = PostKeyMix[SHIFT_ROWS[i]]`.
const SHIFT_ROWS: [usize; 16] = [0, 1, 2, 3, 7, 4, 5, 6, 10, 11, 8, 9, 13, 14, 15, 12];

/// Rows of the next-round state that depend on each row of the current state when
/// `MixColumns` is inverted (row `r` of the previous state feeds rows `MIX_ROWS[r]`).
const MIX_ROWS: [&[usize]; 4] = [&[1], &[1, 2, 3], &[1, 3], &[0, 3]];

/// Tweakey cell permutation `P_T`, applied once per round.
const TWEAKEY_PERMUTATION: [usize; 16] = [9, 15, 8, 13, 10, 14, 12, 11, 0, 1, 2, 3, 4, 5, 6, 7];

/// The SKINNY (and ForkSKINNY) family of tweakable block ciphers.
///
/// All variants share a `4x4` state; only the two top rows receive round tweakey material.
/// The variants differ in the cell width (4 bits for the 64-bit block, 8 bits for the
/// 128-bit block). The number of tweakey words (`TK1` to `TK3`) is not a property of the
/// diffusion layer; it is the guess multiplicity of a simulation.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Skinny {
    cell_bits: u32,
}

impl Default for Skinny {
    fn default() -> Self {
        Skinny::n64()
    }
}

impl Skinny {
    /// SKINNY-64: sixteen 4-bit cells.
    pub fn n64() -> Skinny {
        Skinny { cell_bits: 4 }
    }

    /// SKINNY-128: sixteen 8-bit cells.
    pub fn n128() -> Skinny {
        Skinny { cell_bits: 8 }
    }

    /// A SKINNY instance with an arbitrary cell width.
    pub fn with_cell_bits(cell_bits: u32) -> Skinny {
        Skinny { cell_bits }
    }
}

impl DiffusionModel for Skinny {
    fn cell_count(&self) -> usize {
        16
    }

    fn keyed_cells(&self) -> usize {
        8
    }

    fn key_cell_count(&self) -> usize {
        16
    }

    fn cell_bits(&self) -> u32 {
        self.cell_bits
    }

    fn permutation(&self) -> &[usize] {
        &SHIFT_ROWS
    }

    fn mixing_targets(&self, cell: usize) -> Vec<usize> {
        let (row, column) = (cell / 4, cell % 4);
        MIX_ROWS[row]
            .iter()
            .map(|target_row| target_row * 4 + column)
            .collect()
    }

    fn key_schedule(&self, round: usize) -> Vec<usize> {
        // Round keys are indexed from round zero, which uses the master tweakey as is.
        let mut schedule: Vec<usize> = (0..16).collect();
        for _ in 0..round {
            schedule = TWEAKEY_PERMUTATION.iter().map(|i| schedule[*i]).collect();
        }
        schedule
    }
}
