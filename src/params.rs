//! Attack parameters as produced by an external guess-order solver.
//!
//! With the `serde` feature, [`AttackParameters`] can be read directly from the JSON files
//! written by the solver front end, which uses the SKINNY terminology (`tweakey_setting`,
//! `tweakey_cell`, `keys`) and abbreviated key coordinates (`{"r": 3, "c": 6}`). Fields
//! that only matter to the solver (status, scale, cost) are ignored.

use crate::PartialSumError;
use crate::bound::GuessBound;
use crate::cost::CostModel;
use crate::diffusion::DiffusionModel;
use crate::graph::DependencyGraphBuilder;
use crate::reduction::KeyUsage;
use crate::simulation::{Simulation, SimulationConfig};
use crate::trace::Trace;
use std::fmt;

/// The coordinates of a subkey cell: the round in which it is mixed into the state and
/// the state cell it is mixed into.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeyCell {
    #[cfg_attr(feature = "serde", serde(alias = "r"))]
    pub round: usize,
    #[cfg_attr(feature = "serde", serde(alias = "c"))]
    pub cell: usize,
}

impl KeyCell {
    pub fn new(round: usize, cell: usize) -> KeyCell {
        KeyCell { round, cell }
    }
}

impl fmt::Display for KeyCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "STK_{}[{}]", self.round, self.cell)
    }
}

/// Subkey cells that are guessed together in one step.
pub type KeyGuessGroup = Vec<KeyCell>;

fn default_input_active() -> usize {
    1
}

/// A complete description of one partial-sum key recovery.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackParameters {
    pub start_round: usize,
    pub final_round: usize,
    /// The distinguisher output cell whose balance is exploited.
    pub balanced_cell: usize,
    /// The physical key cell under attacker control. Its subkeys are never guessed.
    #[cfg_attr(feature = "serde", serde(alias = "tweakey_cell"))]
    pub tracked_key_cell: usize,
    /// How many times each physical key cell may be guessed (the number of independent
    /// key words of the schedule).
    #[cfg_attr(feature = "serde", serde(alias = "tweakey_setting"))]
    pub multiplicity: usize,
    /// Number of active cells in the distinguisher input (default: 1).
    #[cfg_attr(feature = "serde", serde(default = "default_input_active"))]
    pub input_active: usize,
    #[cfg_attr(feature = "serde", serde(alias = "keys", default))]
    pub guess_order: Vec<KeyGuessGroup>,
}

impl AttackParameters {
    /// Parameters with an empty guess order and a single active input cell.
    pub fn new(
        start_round: usize,
        final_round: usize,
        balanced_cell: usize,
        tracked_key_cell: usize,
        multiplicity: usize,
    ) -> AttackParameters {
        AttackParameters {
            start_round,
            final_round,
            balanced_cell,
            tracked_key_cell,
            multiplicity,
            input_active: default_input_active(),
            guess_order: Vec::new(),
        }
    }

    pub fn with_guess_order(mut self, guess_order: Vec<KeyGuessGroup>) -> AttackParameters {
        self.guess_order = guess_order;
        self
    }

    /// Build the dependency graph of these parameters and perform the initial reduction.
    pub fn start<M: DiffusionModel>(
        &self,
        model: &M,
        config: SimulationConfig,
    ) -> Result<Simulation, PartialSumError> {
        let built = DependencyGraphBuilder::new(model).build(
            self.start_round,
            self.final_round,
            self.balanced_cell,
            self.tracked_key_cell,
        )?;
        let costs = CostModel::new(model, self.final_round, self.input_active, self.multiplicity);
        let usage = KeyUsage::new(model.key_cell_count(), self.multiplicity);
        Simulation::new(built, costs, usage, config)
    }

    /// Simulate the whole guess order with the default [`SimulationConfig`].
    pub fn simulate<M: DiffusionModel>(&self, model: &M) -> Result<Trace, PartialSumError> {
        self.start(model, SimulationConfig::new())?
            .run(&self.guess_order)
    }

    /// Compute the [`GuessBound`] of these parameters.
    pub fn bound<M: DiffusionModel>(&self, model: &M) -> Result<GuessBound, PartialSumError> {
        GuessBound::compute(
            model,
            self.start_round,
            self.final_round,
            self.balanced_cell,
            self.tracked_key_cell,
            self.multiplicity,
        )
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use crate::diffusion::Skinny;
    use crate::params::{AttackParameters, KeyCell};
    use crate::test_utils::init_logger;
    use test_generator::test_resources;

    #[test]
    fn solver_output_is_accepted() {
        let json = r#"{
            "tweakey_setting": 1,
            "final_round": 3,
            "start_round": 0,
            "tweakey_cell": 0,
            "balanced_cell": 0,
            "input_active": 1,
            "steps": null,
            "scale": 0,
            "cost": 24117248.0,
            "status": "OPTIMAL_SOLUTION",
            "keys": [[{"r": 3, "c": 6}], [{"r": 3, "c": 0}, {"r": 3, "c": 7}]]
        }"#;
        let parameters: AttackParameters = serde_json::from_str(json).unwrap();
        assert_eq!(parameters.multiplicity, 1);
        assert_eq!(parameters.tracked_key_cell, 0);
        assert_eq!(
            parameters.guess_order,
            vec![
                vec![KeyCell::new(3, 6)],
                vec![KeyCell::new(3, 0), KeyCell::new(3, 7)]
            ]
        );
    }

    #[test]
    fn input_active_defaults_to_one() {
        let json = r#"{
            "start_round": 0,
            "final_round": 3,
            "balanced_cell": 0,
            "tracked_key_cell": 0,
            "multiplicity": 2,
            "guess_order": []
        }"#;
        let parameters: AttackParameters = serde_json::from_str(json).unwrap();
        assert_eq!(parameters, AttackParameters::new(0, 3, 0, 0, 2));
    }

    /// Every stored guess order simulates to completion with its recorded reference cost.
    #[test_resources("./orders/*.json")]
    fn stored_order_reproduces_cost(path: &str) {
        init_logger();
        let json = std::fs::read_to_string(path).unwrap();
        let parameters: AttackParameters = serde_json::from_str(&json).unwrap();
        let recorded: serde_json::Value = serde_json::from_str(&json).unwrap();
        let reference = recorded["cost"].as_f64().unwrap();

        let trace = parameters.simulate(&Skinny::n64()).unwrap();
        assert!(trace.summary.completed, "{} leaves resident values", path);
        let error = (trace.summary.total_time - reference).abs() / reference;
        assert!(error < 1e-9, "{}: {} != {}", path, trace.summary.total_time, reference);
    }
}
